use std::collections::HashMap;

use crate::cine::error::CineError;
use crate::cine::signal::{LaneId, SampleSeries, Signal, SignalId};

/// Owns every loaded signal of both lanes.
///
/// Names are unique across the union of the two lanes. Per-lane display
/// order is kept by the lanes themselves; the store only knows which lane a
/// signal currently belongs to.
#[derive(Debug, Default)]
pub struct SampleStore {
    signals: HashMap<SignalId, Signal>,
    names: HashMap<String, SignalId>,
    next_id: u64,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        lane: LaneId,
        name: &str,
        series: SampleSeries,
        offset: f64,
    ) -> Result<SignalId, CineError> {
        let name = self.check_name(name)?;
        self.next_id += 1;
        let id = SignalId(self.next_id);
        self.names.insert(name.clone(), id);
        self.signals
            .insert(id, Signal::new(id, name, lane, series, offset));
        Ok(id)
    }

    pub fn remove(&mut self, id: SignalId) -> Result<Signal, CineError> {
        let signal = self
            .signals
            .remove(&id)
            .ok_or(CineError::UnknownSignal(id))?;
        self.names.remove(signal.name());
        Ok(signal)
    }

    pub fn rename(&mut self, id: SignalId, new_name: &str) -> Result<(), CineError> {
        let current = self
            .signals
            .get(&id)
            .ok_or(CineError::UnknownSignal(id))?
            .name()
            .to_owned();
        if current == new_name.trim() {
            return Ok(());
        }
        let new_name = self.check_name(new_name)?;
        self.names.remove(&current);
        self.names.insert(new_name.clone(), id);
        if let Some(signal) = self.signals.get_mut(&id) {
            signal.rename(new_name);
        }
        Ok(())
    }

    /// Reassigns `id` to lane `to` with a replacement display offset.
    pub fn move_lane(&mut self, id: SignalId, to: LaneId, offset: f64) -> Result<(), CineError> {
        let signal = self
            .signals
            .get_mut(&id)
            .ok_or(CineError::UnknownSignal(id))?;
        signal.relocate(to, offset);
        Ok(())
    }

    pub fn get(&self, id: SignalId) -> Option<&Signal> {
        self.signals.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: SignalId) -> Option<&mut Signal> {
        self.signals.get_mut(&id)
    }

    pub fn find(&self, name: &str) -> Option<SignalId> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// `Signal {n}` with `n` one past the number of loaded signals, skipping taken names.
    pub fn next_default_name(&self) -> String {
        let mut n = self.signals.len() + 1;
        loop {
            let candidate = format!("Signal {n}");
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn check_name(&self, name: &str) -> Result<String, CineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CineError::EmptyName);
        }
        if self.names.contains_key(name) {
            return Err(CineError::DuplicateSignalName(name.to_owned()));
        }
        Ok(name.to_owned())
    }
}
