// src/cine/mod.rs
// 双通道回放核心：信号存储、揭示游标、通道状态机、联动与回卷
pub mod cursor;
pub mod error;
pub mod lane;
pub mod link;
pub mod offset;
pub mod player;
pub mod rewind;
pub mod signal;
pub mod stats;
pub mod store;
pub mod surface;
pub mod timer;
pub mod viewport;
// 公开导出常用类型，方便外部调用
pub use cursor::{RevealCursor, RevealStep};
pub use error::{CineError, LINKED_LANE_MESSAGE};
pub use lane::{Lane, LaneControls, LaneState, PlayLabel};
pub use link::LinkCoordinator;
pub use offset::OffsetStacker;
pub use player::CinePlayer;
pub use rewind::{RewindAnimator, RewindFrame, RewindSettings};
pub use signal::{LaneId, RevealTick, SampleSeries, Signal, SignalId};
pub use stats::{SignalStatistics, StatisticsTable};
pub use store::SampleStore;
pub use surface::{CanvasSurface, LaneFrame, RenderSurface, Trace};
pub use timer::{Scheduler, TaskHandle, TaskKind};
pub use viewport::{Axis, ViewAdjust, ViewRange, ViewportWindower, PAGE_COUNT, ZOOM_IN, ZOOM_OUT};
