// src/placement/mod.rs
//! Фаза размещения
//!
//! Старты игроков по секторам двух крупнейших континентов и целевые
//! количества чудес/ресурсов из метаданных хоста.

pub mod starts;
pub mod steps;

pub use starts::{assign_starts, StartInput, StartPosition, StartsConfig};
pub use steps::{AssignStartsStep, StartPlacement, ARTIFACT_STARTS};
