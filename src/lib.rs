// src/lib.rs
// 生物信号双通道回放库：核心状态机、信号读取、配置与报告
pub mod cine;
pub mod config;
pub mod report;
pub mod source;

pub use cine::{CineError, CinePlayer, LaneId, SampleSeries, SignalId};
pub use config::{load_config, CineConfig};
