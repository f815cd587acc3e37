use log::{debug, info};

use crate::cine::error::CineError;
use crate::cine::lane::{Lane, LaneState};
use crate::cine::signal::LaneId;
use crate::cine::timer::Scheduler;

/// Couples both lanes into one transition while engaged.
///
/// Validation always runs over both lanes before anything is mutated, so a
/// refused linked operation leaves both lanes untouched.
#[derive(Debug, Default)]
pub struct LinkCoordinator {
    engaged: bool,
}

impl LinkCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Engaging while exactly one lane runs resumes the other one.
    pub fn set_engaged(&mut self, engaged: bool, lanes: &mut [Lane; 2], scheduler: &mut Scheduler) {
        if self.engaged == engaged {
            return;
        }
        self.engaged = engaged;
        info!("lane link {}", if engaged { "engaged" } else { "released" });
        if !engaged {
            return;
        }
        let [left, right] = lanes;
        match (left.is_running(), right.is_running()) {
            (true, false) => right.set_running(true, scheduler),
            (false, true) => left.set_running(true, scheduler),
            _ => {}
        }
    }

    /// Combined play/pause. The left lane decides the direction; each lane
    /// then drives its own timer kind (reveal or rewind).
    pub fn toggle_play_pause(&self, lanes: &mut [Lane; 2], scheduler: &mut Scheduler) {
        let running = !lanes[LaneId::Left.index()].is_running();
        debug!(
            "linked toggle: left {:?}, right {:?} -> running={running}",
            lanes[0].state(),
            lanes[1].state()
        );
        for lane in lanes.iter_mut() {
            lane.set_running(running, scheduler);
        }
    }

    pub fn check_stop(&self, lanes: &[Lane; 2]) -> Result<(), CineError> {
        Self::require_both_stopped(lanes)
    }

    pub fn check_rewind(&self, lanes: &[Lane; 2]) -> Result<(), CineError> {
        Self::require_both_stopped(lanes)
    }

    fn require_both_stopped(lanes: &[Lane; 2]) -> Result<(), CineError> {
        if lanes.iter().all(|lane| lane.state() == LaneState::Stopped) {
            Ok(())
        } else {
            Err(CineError::linked_refusal())
        }
    }
}
