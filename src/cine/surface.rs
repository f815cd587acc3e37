use crate::cine::signal::{LaneId, SignalId};
use crate::cine::viewport::ViewRange;

/// Passive canvas the player draws into. It never produces data.
pub trait RenderSurface {
    fn set_points(&mut self, lane: LaneId, signal: SignalId, name: &str, xs: &[f64], ys: &[f64]);
    fn set_view_range(&mut self, lane: LaneId, range: ViewRange);
    fn remove_signal(&mut self, lane: LaneId, signal: SignalId);
    fn relabel(&mut self, lane: LaneId, signal: SignalId, name: &str);
    fn clear_lane(&mut self, lane: LaneId);
}

/// One drawn line.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    pub signal: SignalId,
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

/// Everything visible in one lane.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaneFrame {
    pub traces: Vec<Trace>, // legend order
    pub view: Option<ViewRange>,
}

impl LaneFrame {
    pub fn point_count(&self) -> usize {
        self.traces.iter().map(|t| t.points.len()).sum()
    }
}

/// In-memory surface shared by the desktop front-end and snapshot rendering.
#[derive(Clone, Debug, Default)]
pub struct CanvasSurface {
    lanes: [LaneFrame; 2],
}

impl CanvasSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self, lane: LaneId) -> &LaneFrame {
        &self.lanes[lane.index()]
    }

    fn frame_mut(&mut self, lane: LaneId) -> &mut LaneFrame {
        &mut self.lanes[lane.index()]
    }
}

impl RenderSurface for CanvasSurface {
    fn set_points(&mut self, lane: LaneId, signal: SignalId, name: &str, xs: &[f64], ys: &[f64]) {
        let points = xs.iter().zip(ys).map(|(x, y)| [*x, *y]).collect();
        let frame = self.frame_mut(lane);
        match frame.traces.iter_mut().find(|t| t.signal == signal) {
            Some(trace) => trace.points = points,
            None => frame.traces.push(Trace {
                signal,
                name: name.to_owned(),
                points,
            }),
        }
    }

    fn set_view_range(&mut self, lane: LaneId, range: ViewRange) {
        self.frame_mut(lane).view = Some(range);
    }

    fn remove_signal(&mut self, lane: LaneId, signal: SignalId) {
        self.frame_mut(lane).traces.retain(|t| t.signal != signal);
    }

    fn relabel(&mut self, lane: LaneId, signal: SignalId, name: &str) {
        if let Some(trace) = self
            .frame_mut(lane)
            .traces
            .iter_mut()
            .find(|t| t.signal == signal)
        {
            trace.name = name.to_owned();
        }
    }

    fn clear_lane(&mut self, lane: LaneId) {
        *self.frame_mut(lane) = LaneFrame::default();
    }
}
