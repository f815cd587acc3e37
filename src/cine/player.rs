use std::time::Duration;

use log::{debug, info, warn};

use crate::cine::error::CineError;
use crate::cine::lane::{Lane, LaneControls};
use crate::cine::link::LinkCoordinator;
use crate::cine::rewind::{RewindAnimator, RewindFrame};
use crate::cine::signal::{LaneId, SampleSeries, Signal, SignalId};
use crate::cine::stats::StatisticsTable;
use crate::cine::store::SampleStore;
use crate::cine::surface::RenderSurface;
use crate::cine::timer::{Scheduler, TaskKind};
use crate::cine::viewport::{page_range, Axis, ViewAdjust, ViewRange, ViewportWindower};
use crate::config::CineConfig;

/// Two-lane cine player.
///
/// Owns every signal, both lanes and the virtual clock; the render surface
/// only receives points and view ranges. Time moves exclusively through
/// [`CinePlayer::advance`], and each fired timer is handled to completion
/// before the next one is popped.
pub struct CinePlayer<S: RenderSurface> {
    config: CineConfig,
    store: SampleStore,
    lanes: [Lane; 2],
    scheduler: Scheduler,
    link: LinkCoordinator,
    windower: ViewportWindower,
    /// Last range computed by playback, before user adjustments.
    follow: [Option<ViewRange>; 2],
    adjust: [ViewAdjust; 2],
    surface: S,
}

impl<S: RenderSurface> CinePlayer<S> {
    pub fn new(config: CineConfig, surface: S) -> Self {
        let speed = config.playback.default_speed;
        let factor = config.rewind.interval_factor;
        let stacker = config.stacker();
        Self {
            lanes: LaneId::ALL.map(|id| Lane::new(id, speed, factor, stacker)),
            windower: config.windower(),
            config,
            store: SampleStore::new(),
            scheduler: Scheduler::new(),
            link: LinkCoordinator::new(),
            follow: [None; 2],
            adjust: [ViewAdjust::default(); 2],
            surface,
        }
    }

    pub fn config(&self) -> &CineConfig {
        &self.config
    }

    pub fn lane(&self, lane: LaneId) -> &Lane {
        &self.lanes[lane.index()]
    }

    pub fn controls(&self, lane: LaneId) -> LaneControls {
        self.lane(lane).controls()
    }

    pub fn signal(&self, id: SignalId) -> Option<&Signal> {
        self.store.get(id)
    }

    pub fn find(&self, name: &str) -> Option<SignalId> {
        self.store.find(name)
    }

    /// Members of `lane` in display order.
    pub fn signals_in(&self, lane: LaneId) -> Vec<&Signal> {
        self.lane(lane)
            .members()
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_engaged()
    }

    pub fn view_adjust(&self, lane: LaneId) -> &ViewAdjust {
        &self.adjust[lane.index()]
    }

    /// Scales the lane view about its center; `factor` below one zooms in.
    pub fn zoom(&mut self, lane: LaneId, factor: f64) -> Result<(), CineError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CineError::InvalidLaneOperation(format!(
                "zoom factor {factor} must be positive"
            )));
        }
        self.adjust[lane.index()].zoom_by(factor);
        debug!("{lane} lane zoom -> {}", self.adjust[lane.index()].zoom());
        self.refresh_view(lane);
        Ok(())
    }

    /// Shifts the lane view by a distance in data units.
    pub fn pan(&mut self, lane: LaneId, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.adjust[lane.index()].pan_by(dx, dy);
        self.refresh_view(lane);
    }

    /// Pins one axis of the lane view to a page of the displayed data.
    /// Does nothing while the lane shows no points.
    pub fn page(&mut self, lane: LaneId, axis: Axis, page: usize) {
        let extent = match axis {
            Axis::X => self.windower.lane_x_extent(self.signals_in(lane)),
            Axis::Y => self.windower.lane_y_range(self.signals_in(lane)),
        };
        let Some(extent) = extent else {
            debug!("{lane} lane paging ignored: nothing displayed");
            return;
        };
        self.adjust[lane.index()].pin(axis, page_range(extent, page));
        self.refresh_view(lane);
    }

    /// Drops zoom, pan and page choices so the lane follows playback again.
    pub fn reset_view(&mut self, lane: LaneId) {
        self.adjust[lane.index()] = ViewAdjust::default();
        self.refresh_view(lane);
    }

    /// Loads a series under the next free `Signal {n}` name.
    pub fn load(&mut self, lane: LaneId, series: SampleSeries) -> Result<SignalId, CineError> {
        let name = self.store.next_default_name();
        self.add_signal(lane, &name, series)
    }

    pub fn add_signal(
        &mut self,
        lane: LaneId,
        name: &str,
        series: SampleSeries,
    ) -> Result<SignalId, CineError> {
        let target = &mut self.lanes[lane.index()];
        target.ensure_accepts_signals()?;
        let offset = target.join_offset();
        let samples = series.len();
        let id = self.store.add(lane, name, series, offset)?;
        target.admit(id, &mut self.scheduler);
        info!(
            "loaded {id} `{}` into {lane} lane: {samples} samples, offset {offset}",
            name.trim()
        );
        Ok(id)
    }

    pub fn remove_signal(&mut self, id: SignalId) -> Result<(), CineError> {
        let lane = self
            .store
            .get(id)
            .ok_or(CineError::UnknownSignal(id))?
            .lane();
        let owner = &mut self.lanes[lane.index()];
        owner.ensure_accepts_signals()?;
        owner.release(id, &mut self.scheduler);
        let removed = self.store.remove(id)?;
        self.surface.remove_signal(lane, id);
        info!(
            "removed {id} `{}` from {lane} lane, now {:?}",
            removed.name(),
            owner.state()
        );
        Ok(())
    }

    pub fn rename_signal(&mut self, id: SignalId, name: &str) -> Result<(), CineError> {
        self.store.rename(id, name)?;
        let signal = self.store.get(id).ok_or(CineError::UnknownSignal(id))?;
        self.surface.relabel(signal.lane(), id, signal.name());
        info!("renamed {id} to `{}`", signal.name());
        Ok(())
    }

    /// Moves the selected signal of `from` into the other lane.
    ///
    /// The signal restarts from its first sample with the destination's next
    /// move-time offset. An empty selection does nothing.
    pub fn move_selected(
        &mut self,
        from: LaneId,
        selected: Option<SignalId>,
    ) -> Result<Option<SignalId>, CineError> {
        let Some(id) = selected else {
            debug!("move from {from} lane ignored: nothing selected");
            return Ok(None);
        };
        let signal = self.store.get(id).ok_or(CineError::UnknownSignal(id))?;
        if signal.lane() != from {
            return Err(CineError::InvalidLaneOperation(format!(
                "`{}` is not in the {from} lane",
                signal.name()
            )));
        }
        let to = from.other();
        self.lanes[from.index()].ensure_move_out()?;
        self.lanes[to.index()].ensure_accepts_signals()?;

        self.lanes[from.index()].release(id, &mut self.scheduler);
        self.surface.remove_signal(from, id);

        let destination = &mut self.lanes[to.index()];
        let offset = destination.next_move_offset();
        self.store.move_lane(id, to, offset)?;
        destination.admit(id, &mut self.scheduler);
        info!("moved {id} from {from} to {to} lane with offset {offset}");
        Ok(Some(id))
    }

    pub fn toggle_play_pause(&mut self, lane: LaneId) {
        if self.link.is_engaged() {
            self.link.toggle_play_pause(&mut self.lanes, &mut self.scheduler);
        } else {
            self.lanes[lane.index()].toggle(&mut self.scheduler);
        }
        info!("{lane} lane play/pause -> {:?}", self.lane(lane).state());
    }

    /// Clears a finished lane (both lanes while linked).
    pub fn stop(&mut self, lane: LaneId) -> Result<(), CineError> {
        let targets =
            self.transition_targets(lane, Lane::ensure_can_stop, LinkCoordinator::check_stop)?;
        for target in targets {
            let removed = self.lanes[target.index()].stop(&mut self.scheduler);
            for id in &removed {
                self.store.remove(*id)?;
            }
            self.surface.clear_lane(target);
            self.follow[target.index()] = None;
            self.adjust[target.index()] = ViewAdjust::default();
            info!("stopped {target} lane, cleared {} signal(s)", removed.len());
        }
        Ok(())
    }

    /// Replays the view window of a finished lane (both lanes while linked).
    pub fn rewind(&mut self, lane: LaneId) -> Result<(), CineError> {
        let targets =
            self.transition_targets(lane, Lane::ensure_can_rewind, LinkCoordinator::check_rewind)?;
        for target in targets {
            self.begin_rewind(target);
        }
        Ok(())
    }

    pub fn set_speed(&mut self, lane: LaneId, value: u32) -> Result<(), CineError> {
        let (min, max) = (self.config.playback.min_speed, self.config.playback.max_speed);
        if !(min..=max).contains(&value) {
            return Err(CineError::SpeedOutOfRange { value, min, max });
        }
        let targets = if self.link.is_engaged() {
            LaneId::ALL.to_vec()
        } else {
            vec![lane]
        };
        for target in targets {
            self.lanes[target.index()].set_speed(value, &mut self.scheduler);
            debug!("{target} lane speed -> {value} ms");
        }
        Ok(())
    }

    pub fn set_linked(&mut self, engaged: bool) {
        self.link
            .set_engaged(engaged, &mut self.lanes, &mut self.scheduler);
    }

    pub fn statistics(&self, lane: LaneId) -> Result<StatisticsTable, CineError> {
        let members = self
            .lane(lane)
            .members()
            .filter_map(|id| self.store.get(id))
            .map(|s| (s.name(), s.series()));
        StatisticsTable::compute(lane, members)
    }

    /// Runs every timer due within `elapsed`, one at a time, in due order.
    pub fn advance(&mut self, elapsed: Duration) {
        let deadline = self.scheduler.now() + elapsed;
        while let Some(kind) = self.scheduler.pop_due(deadline) {
            match kind {
                TaskKind::Reveal(id) => self.on_reveal_tick(id),
                TaskKind::Rewind(lane) => self.on_rewind_tick(lane),
            }
        }
        self.scheduler.settle(deadline);
    }

    /// Lanes a stop/rewind applies to, validated before anything changes.
    fn transition_targets(
        &self,
        lane: LaneId,
        check: fn(&Lane) -> Result<(), CineError>,
        linked_check: fn(&LinkCoordinator, &[Lane; 2]) -> Result<(), CineError>,
    ) -> Result<Vec<LaneId>, CineError> {
        if self.link.is_engaged() {
            linked_check(&self.link, &self.lanes)?;
            Ok(LaneId::ALL.to_vec())
        } else {
            check(self.lane(lane))?;
            Ok(vec![lane])
        }
    }

    fn begin_rewind(&mut self, lane: LaneId) {
        let (min_x, max_x) = self
            .windower
            .lane_x_extent(self.signals_in(lane))
            .unwrap_or((0.0, 0.0));
        let y = self.windower.lane_y_range(self.signals_in(lane));
        let animator = RewindAnimator::new(min_x, max_x, self.config.rewind_settings());
        let opening = animator.opening_window();
        self.lanes[lane.index()].begin_rewind(animator, &mut self.scheduler);
        self.adjust[lane.index()] = ViewAdjust::default();
        if let Some(y) = y {
            self.show_view(lane, ViewRange::new(opening, y));
        }
        info!("rewinding {lane} lane over x {min_x}..{max_x}");
    }

    fn show_view(&mut self, lane: LaneId, range: ViewRange) {
        self.follow[lane.index()] = Some(range);
        let shown = self.adjust[lane.index()].apply(range);
        self.surface.set_view_range(lane, shown);
    }

    fn refresh_view(&mut self, lane: LaneId) {
        if let Some(range) = self.follow[lane.index()] {
            self.show_view(lane, range);
        }
    }

    fn on_reveal_tick(&mut self, id: SignalId) {
        let Some(signal) = self.store.get_mut(id) else {
            warn!("reveal tick for unknown signal {id}");
            return;
        };
        let lane = signal.lane();
        let tick = signal.reveal();

        if let Some(at) = tick.at {
            if let Some(signal) = self.store.get(id) {
                let x = self.windower.reveal_x_range(signal.series().time(), at);
                let (xs, ys) = signal.displayed();
                self.surface.set_points(lane, id, signal.name(), xs, ys);
                let members = self.lanes[lane.index()]
                    .members()
                    .filter_map(|m| self.store.get(m));
                if let Some(y) = self.windower.lane_y_range(members) {
                    self.show_view(lane, ViewRange::new(x, y));
                }
            }
        }

        if tick.finished_now {
            let owner = &mut self.lanes[lane.index()];
            owner.mark_finished(id, &mut self.scheduler);
            debug!("{id} fully revealed");
            if owner.refresh_completion() {
                info!("{lane} lane finished");
            }
        }
    }

    fn on_rewind_tick(&mut self, lane: LaneId) {
        let Some(frame) = self.lanes[lane.index()].rewind_step() else {
            return;
        };
        match frame {
            RewindFrame::Window { x_min, x_max } => {
                let members = self.lanes[lane.index()]
                    .members()
                    .filter_map(|m| self.store.get(m));
                if let Some(y) = self.windower.lane_y_range(members) {
                    self.show_view(lane, ViewRange::new((x_min, x_max), y));
                }
            }
            RewindFrame::Done => {
                self.lanes[lane.index()].finish_rewind(&mut self.scheduler);
                info!("{lane} lane rewind finished");
            }
        }
    }
}
