use std::fmt;

use serde::Serialize;

use crate::cine::cursor::{RevealCursor, RevealStep};
use crate::cine::error::CineError;

/// One of the two independent playback lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LaneId {
    Left,
    Right,
}

impl LaneId {
    pub const ALL: [LaneId; 2] = [LaneId::Left, LaneId::Right];

    pub fn other(self) -> LaneId {
        match self {
            LaneId::Left => LaneId::Right,
            LaneId::Right => LaneId::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            LaneId::Left => 0,
            LaneId::Right => 1,
        }
    }

    /// Single-letter tag used in snapshot file names.
    pub fn tag(self) -> &'static str {
        match self {
            LaneId::Left => "L",
            LaneId::Right => "R",
        }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneId::Left => f.write_str("left"),
            LaneId::Right => f.write_str("right"),
        }
    }
}

/// Stable identity of a loaded signal; survives renames and lane moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(pub(crate) u64);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Validated (time, amplitude) series as delivered by a signal source.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleSeries {
    time: Vec<f64>,
    amplitude: Vec<f64>,
}

impl SampleSeries {
    pub fn new(time: Vec<f64>, amplitude: Vec<f64>) -> Result<Self, CineError> {
        if time.len() != amplitude.len() {
            return Err(CineError::DimensionMismatch {
                time: time.len(),
                amplitude: amplitude.len(),
            });
        }
        if time.is_empty() {
            return Err(CineError::EmptySeries);
        }
        if let Some(index) = time
            .iter()
            .zip(&amplitude)
            .position(|(t, a)| !t.is_finite() || !a.is_finite())
        {
            return Err(CineError::NonFiniteSample { index });
        }
        if let Some(index) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(CineError::NonMonotonicTime { index: index + 1 });
        }
        Ok(Self { time, amplitude })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn amplitude(&self) -> &[f64] {
        &self.amplitude
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always false; construction rejects empty series.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// What a single reveal tick did to a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealTick {
    /// Cursor value before the increment, when a sample was revealed.
    pub at: Option<usize>,
    /// The signal became finished during this tick.
    pub finished_now: bool,
}

#[derive(Clone, Debug)]
pub struct Signal {
    id: SignalId,
    name: String,
    lane: LaneId,
    series: SampleSeries,
    offset: f64,
    display: Vec<f64>, // amplitude - offset
    cursor: RevealCursor,
    finished: bool,
}

impl Signal {
    pub(crate) fn new(
        id: SignalId,
        name: String,
        lane: LaneId,
        series: SampleSeries,
        offset: f64,
    ) -> Self {
        let cursor = RevealCursor::new(series.len());
        let display = shifted(series.amplitude(), offset);
        Self {
            id,
            name,
            lane,
            series,
            offset,
            display,
            cursor,
            finished: false,
        }
    }

    pub fn id(&self) -> SignalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lane(&self) -> LaneId {
        self.lane
    }

    pub fn series(&self) -> &SampleSeries {
        &self.series
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn cursor(&self) -> usize {
        self.cursor.position()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Points currently on screen: revealed time samples and offset amplitudes.
    pub fn displayed(&self) -> (&[f64], &[f64]) {
        let range = self.cursor.revealed();
        (&self.series.time()[range.clone()], &self.display[range])
    }

    pub(crate) fn reveal(&mut self) -> RevealTick {
        match self.cursor.advance() {
            RevealStep::Revealed { at } => {
                let finished_now = !self.finished && self.cursor.is_exhausted();
                self.finished |= finished_now;
                RevealTick {
                    at: Some(at),
                    finished_now,
                }
            }
            RevealStep::Exhausted => {
                let finished_now = !self.finished;
                self.finished = true;
                RevealTick {
                    at: None,
                    finished_now,
                }
            }
        }
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    /// Re-creates the signal in `lane`: fresh cursor, new offset, same series.
    pub(crate) fn relocate(&mut self, lane: LaneId, offset: f64) {
        self.lane = lane;
        self.offset = offset;
        self.display = shifted(self.series.amplitude(), offset);
        self.cursor.reset();
        self.finished = false;
    }
}

fn shifted(amplitude: &[f64], offset: f64) -> Vec<f64> {
    amplitude.iter().map(|a| a - offset).collect()
}
