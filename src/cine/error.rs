use std::path::PathBuf;

use thiserror::Error;

use crate::cine::signal::SignalId;

/// Message shown when a linked transition is refused because the peer lane is not eligible.
pub const LINKED_LANE_MESSAGE: &str =
    "This action is not available, You must uncheck the link checkbox first";

#[derive(Debug, Error)]
pub enum CineError {
    #[error("a signal named `{0}` is already loaded")]
    DuplicateSignalName(String),
    #[error("time/amplitude length mismatch: {time} time samples, {amplitude} amplitude samples")]
    DimensionMismatch { time: usize, amplitude: usize },
    #[error("signal series is empty")]
    EmptySeries,
    #[error("sample {index} is not a finite number")]
    NonFiniteSample { index: usize },
    #[error("time axis decreases at sample {index}")]
    NonMonotonicTime { index: usize },
    #[error("{0}")]
    InvalidLaneOperation(String),
    #[error("standard deviation of `{name}` is undefined for {samples} sample(s)")]
    StatisticsUndefined { name: String, samples: usize },
    #[error("unknown signal {0}")]
    UnknownSignal(SignalId),
    #[error("signal name must not be empty")]
    EmptyName,
    #[error("cine speed {value} outside {min}..={max}")]
    SpeedOutOfRange { value: u32, min: u32, max: u32 },
    #[error("signal file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse {} line {line}: {reason}", .path.display())]
    ParseFailure {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("failed to render snapshot: {0}")]
    Plot(String),
}

impl CineError {
    pub fn linked_refusal() -> Self {
        CineError::InvalidLaneOperation(LINKED_LANE_MESSAGE.to_owned())
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for CineError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        CineError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for CineError {
    fn from(value: image::ImageError) -> Self {
        CineError::Plot(value.to_string())
    }
}
