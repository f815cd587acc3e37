use std::time::Duration;

use log::debug;

use crate::cine::error::CineError;
use crate::cine::offset::OffsetStacker;
use crate::cine::rewind::{RewindAnimator, RewindFrame};
use crate::cine::signal::{LaneId, SignalId};
use crate::cine::timer::{Scheduler, TaskHandle, TaskKind};

/// Playback state of a lane. Play flag, rewind mode and completion are
/// folded into one value so contradictory combinations cannot exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneState {
    /// No signals loaded. `armed` means the next load starts playing.
    Idle { armed: bool },
    Playing,
    Paused,
    /// Every member has been fully revealed.
    Stopped,
    /// The view window is being replayed; `running` mirrors play/pause.
    Rewinding { running: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayLabel {
    Play,
    Pause,
}

impl PlayLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayLabel::Play => "Play",
            PlayLabel::Pause => "Pause",
        }
    }
}

/// Which lane controls are currently usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneControls {
    pub play_label: PlayLabel,
    pub stop_enabled: bool,
    pub rewind_enabled: bool,
    pub move_enabled: bool,
}

#[derive(Debug)]
struct Member {
    signal: SignalId,
    timer: TaskHandle,
    finished: bool,
}

#[derive(Debug)]
struct RewindRun {
    animator: RewindAnimator,
    timer: TaskHandle,
}

/// One display lane: ordered members, their reveal timers, and the lane's
/// rewind timer. Only the lane creates, starts, stops or cancels them.
#[derive(Debug)]
pub struct Lane {
    id: LaneId,
    state: LaneState,
    members: Vec<Member>,
    speed: u32,
    rewind_factor: u32,
    stacker: OffsetStacker,
    rewind: Option<RewindRun>,
    move_enabled: bool,
}

impl Lane {
    pub fn new(id: LaneId, speed: u32, rewind_factor: u32, stacker: OffsetStacker) -> Self {
        Self {
            id,
            state: LaneState::Idle { armed: true },
            members: Vec::new(),
            speed,
            rewind_factor,
            stacker,
            rewind: None,
            move_enabled: true,
        }
    }

    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn state(&self) -> LaneState {
        self.state
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Member ids in display order.
    pub fn members(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.members.iter().map(|m| m.signal)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Derived completion flag: at least one member and all of them finished.
    pub fn is_finished(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(|m| m.finished)
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            LaneState::Playing | LaneState::Idle { armed: true } | LaneState::Rewinding { running: true }
        )
    }

    pub fn is_rewinding(&self) -> bool {
        matches!(self.state, LaneState::Rewinding { .. })
    }

    pub fn rewind_progress(&self) -> Option<f64> {
        self.rewind.as_ref().map(|r| r.animator.progress())
    }

    pub fn controls(&self) -> LaneControls {
        let stopped = self.state == LaneState::Stopped;
        LaneControls {
            play_label: if self.is_running() {
                PlayLabel::Pause
            } else {
                PlayLabel::Play
            },
            stop_enabled: stopped,
            rewind_enabled: stopped,
            move_enabled: self.move_enabled && !self.is_rewinding(),
        }
    }

    /// Join-time offset for the signal about to be admitted.
    pub fn join_offset(&self) -> f64 {
        self.stacker.join_offset(self.members.len() + 1)
    }

    pub fn next_move_offset(&mut self) -> f64 {
        self.stacker.next_move_offset()
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.speed))
    }

    pub fn rewind_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.speed) * u64::from(self.rewind_factor))
    }

    pub fn ensure_accepts_signals(&self) -> Result<(), CineError> {
        if self.is_rewinding() {
            return Err(CineError::InvalidLaneOperation(format!(
                "the {} lane is rewinding",
                self.id
            )));
        }
        Ok(())
    }

    pub fn ensure_move_out(&self) -> Result<(), CineError> {
        self.ensure_accepts_signals()?;
        if !self.move_enabled {
            return Err(CineError::InvalidLaneOperation(format!(
                "moving out of the {} lane is disabled until it is stopped",
                self.id
            )));
        }
        Ok(())
    }

    pub fn ensure_can_stop(&self) -> Result<(), CineError> {
        if self.state != LaneState::Stopped {
            return Err(CineError::InvalidLaneOperation(format!(
                "the {} lane can only be stopped once every signal is revealed",
                self.id
            )));
        }
        Ok(())
    }

    pub fn ensure_can_rewind(&self) -> Result<(), CineError> {
        if self.state != LaneState::Stopped {
            return Err(CineError::InvalidLaneOperation(format!(
                "the {} lane can only be rewound once every signal is revealed",
                self.id
            )));
        }
        Ok(())
    }

    /// Adds a member and gives it a reveal timer, started if the lane runs.
    pub fn admit(&mut self, signal: SignalId, scheduler: &mut Scheduler) {
        debug_assert!(!self.is_rewinding(), "signal admitted while rewinding");
        let timer = scheduler.create(TaskKind::Reveal(signal), self.reveal_interval());
        self.state = match self.state {
            LaneState::Playing | LaneState::Idle { armed: true } => {
                scheduler.start(&timer);
                LaneState::Playing
            }
            LaneState::Idle { armed: false } | LaneState::Paused | LaneState::Stopped => {
                LaneState::Paused
            }
            rewinding @ LaneState::Rewinding { .. } => rewinding,
        };
        self.members.push(Member {
            signal,
            timer,
            finished: false,
        });
        debug!("{} lane admitted {signal}, now {:?}", self.id, self.state);
    }

    /// Drops a member and cancels its timer. Returns false if absent.
    pub fn release(&mut self, signal: SignalId, scheduler: &mut Scheduler) -> bool {
        let Some(pos) = self.members.iter().position(|m| m.signal == signal) else {
            return false;
        };
        let member = self.members.remove(pos);
        scheduler.cancel(member.timer);
        self.reconcile();
        true
    }

    /// Records that `signal` revealed its last sample and silences its timer.
    pub fn mark_finished(&mut self, signal: SignalId, scheduler: &mut Scheduler) {
        if let Some(member) = self.members.iter_mut().find(|m| m.signal == signal) {
            member.finished = true;
            scheduler.stop(&member.timer);
        }
    }

    /// Moves a playing lane to `Stopped` once every member is finished.
    /// Returns true on that transition.
    pub fn refresh_completion(&mut self) -> bool {
        if self.state == LaneState::Playing && self.is_finished() {
            self.state = LaneState::Stopped;
            return true;
        }
        false
    }

    fn reconcile(&mut self) {
        if self.is_rewinding() {
            return;
        }
        if self.members.is_empty() {
            self.state = LaneState::Idle {
                armed: self.is_running(),
            };
            self.move_enabled = true;
        } else if self.is_finished() {
            if matches!(self.state, LaneState::Playing | LaneState::Paused) {
                self.state = LaneState::Stopped;
            }
        } else if self.state == LaneState::Stopped {
            self.state = LaneState::Paused;
        }
    }

    /// Resumes or pauses whatever timers the current mode uses.
    pub fn set_running(&mut self, running: bool, scheduler: &mut Scheduler) {
        self.state = match (self.state, running) {
            (LaneState::Playing, false) => {
                for member in &self.members {
                    scheduler.stop(&member.timer);
                }
                LaneState::Paused
            }
            (LaneState::Paused, true) => {
                for member in self.members.iter().filter(|m| !m.finished) {
                    scheduler.start(&member.timer);
                }
                LaneState::Playing
            }
            (LaneState::Rewinding { running: current }, wanted) if current != wanted => {
                if let Some(run) = &self.rewind {
                    if wanted {
                        scheduler.start(&run.timer);
                    } else {
                        scheduler.stop(&run.timer);
                    }
                }
                LaneState::Rewinding { running: wanted }
            }
            (LaneState::Idle { .. }, armed) => LaneState::Idle { armed },
            (state, _) => state,
        };
        debug!("{} lane running={running} -> {:?}", self.id, self.state);
    }

    pub fn toggle(&mut self, scheduler: &mut Scheduler) {
        let running = self.is_running();
        self.set_running(!running, scheduler);
    }

    /// Clears the lane after completion. Returns the ids that were members.
    ///
    /// The move-time offset counter survives; the join basis resets with the
    /// member list.
    pub fn stop(&mut self, scheduler: &mut Scheduler) -> Vec<SignalId> {
        if let Some(run) = self.rewind.take() {
            scheduler.cancel(run.timer);
        }
        let removed = self
            .members
            .drain(..)
            .map(|member| {
                scheduler.cancel(member.timer);
                member.signal
            })
            .collect();
        self.state = LaneState::Idle { armed: true };
        self.move_enabled = true;
        removed
    }

    pub fn begin_rewind(&mut self, animator: RewindAnimator, scheduler: &mut Scheduler) {
        if let Some(previous) = self.rewind.take() {
            scheduler.cancel(previous.timer);
        }
        let timer = scheduler.create(TaskKind::Rewind(self.id), self.rewind_interval());
        scheduler.start(&timer);
        self.rewind = Some(RewindRun { animator, timer });
        self.state = LaneState::Rewinding { running: true };
        self.move_enabled = false;
    }

    pub fn rewind_step(&mut self) -> Option<RewindFrame> {
        self.rewind.as_mut().map(|run| run.animator.step())
    }

    pub fn finish_rewind(&mut self, scheduler: &mut Scheduler) {
        if let Some(run) = self.rewind.take() {
            scheduler.cancel(run.timer);
        }
        self.state = LaneState::Stopped;
    }

    pub fn set_speed(&mut self, speed: u32, scheduler: &mut Scheduler) {
        self.speed = speed;
        let reveal = self.reveal_interval();
        for member in &self.members {
            scheduler.set_interval(&member.timer, reveal);
        }
        if let Some(run) = &self.rewind {
            scheduler.set_interval(&run.timer, self.rewind_interval());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cine::rewind::RewindSettings;

    fn lane() -> Lane {
        Lane::new(LaneId::Left, 10, 10, OffsetStacker::new(2.0, 10.0))
    }

    #[test]
    fn first_admit_starts_playing() {
        let mut scheduler = Scheduler::new();
        let mut lane = lane();
        assert_eq!(lane.controls().play_label, PlayLabel::Pause);
        assert_eq!(lane.join_offset(), 2.0);
        lane.admit(SignalId(1), &mut scheduler);
        assert_eq!(lane.state(), LaneState::Playing);
        assert_eq!(lane.join_offset(), 4.0);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn disarmed_idle_lane_admits_paused() {
        let mut scheduler = Scheduler::new();
        let mut lane = lane();
        lane.toggle(&mut scheduler);
        assert_eq!(lane.state(), LaneState::Idle { armed: false });
        lane.admit(SignalId(1), &mut scheduler);
        assert_eq!(lane.state(), LaneState::Paused);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn toggle_pauses_and_resumes_unfinished_members_only() {
        let mut scheduler = Scheduler::new();
        let mut lane = lane();
        lane.admit(SignalId(1), &mut scheduler);
        lane.admit(SignalId(2), &mut scheduler);
        lane.mark_finished(SignalId(1), &mut scheduler);
        lane.toggle(&mut scheduler);
        assert_eq!(lane.state(), LaneState::Paused);
        assert_eq!(scheduler.active_count(), 0);
        lane.toggle(&mut scheduler);
        assert_eq!(lane.state(), LaneState::Playing);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn completion_enables_stop_and_rewind() {
        let mut scheduler = Scheduler::new();
        let mut lane = lane();
        lane.admit(SignalId(1), &mut scheduler);
        assert!(!lane.refresh_completion());
        lane.mark_finished(SignalId(1), &mut scheduler);
        assert!(lane.refresh_completion());
        let controls = lane.controls();
        assert_eq!(controls.play_label, PlayLabel::Play);
        assert!(controls.stop_enabled && controls.rewind_enabled);
        // a stopped lane ignores play/pause
        lane.toggle(&mut scheduler);
        assert_eq!(lane.state(), LaneState::Stopped);
    }

    #[test]
    fn new_member_reopens_a_stopped_lane_paused() {
        let mut scheduler = Scheduler::new();
        let mut lane = lane();
        lane.admit(SignalId(1), &mut scheduler);
        lane.mark_finished(SignalId(1), &mut scheduler);
        lane.refresh_completion();
        lane.admit(SignalId(2), &mut scheduler);
        assert_eq!(lane.state(), LaneState::Paused);
        assert!(!lane.controls().stop_enabled);
        lane.release(SignalId(2), &mut scheduler);
        assert_eq!(lane.state(), LaneState::Stopped);
    }

    #[test]
    fn rewind_lifecycle_and_stop() {
        let mut scheduler = Scheduler::new();
        let mut lane = lane();
        lane.admit(SignalId(1), &mut scheduler);
        lane.mark_finished(SignalId(1), &mut scheduler);
        lane.refresh_completion();
        lane.ensure_can_rewind().unwrap();

        lane.begin_rewind(
            RewindAnimator::new(0.0, 1.0, RewindSettings::default()),
            &mut scheduler,
        );
        assert_eq!(lane.state(), LaneState::Rewinding { running: true });
        assert_eq!(lane.rewind_interval(), Duration::from_millis(100));
        let controls = lane.controls();
        assert!(!controls.stop_enabled && !controls.rewind_enabled && !controls.move_enabled);
        assert!(lane.ensure_accepts_signals().is_err());

        lane.toggle(&mut scheduler);
        assert_eq!(lane.state(), LaneState::Rewinding { running: false });
        assert_eq!(scheduler.active_count(), 0);
        lane.toggle(&mut scheduler);
        assert_eq!(scheduler.active_count(), 1);

        lane.finish_rewind(&mut scheduler);
        assert_eq!(lane.state(), LaneState::Stopped);
        assert!(!lane.controls().move_enabled);
        assert!(lane.ensure_move_out().is_err());

        let removed = lane.stop(&mut scheduler);
        assert_eq!(removed, vec![SignalId(1)]);
        assert_eq!(lane.state(), LaneState::Idle { armed: true });
        assert!(lane.controls().move_enabled);
        assert_eq!(lane.join_offset(), 2.0);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn stop_requires_completion() {
        let mut scheduler = Scheduler::new();
        let mut lane = lane();
        lane.admit(SignalId(1), &mut scheduler);
        assert!(matches!(
            lane.ensure_can_stop(),
            Err(CineError::InvalidLaneOperation(_))
        ));
    }
}
