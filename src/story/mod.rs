// src/story/mod.rs
//! Нарративная фаза
//!
//! Оверлеи поверх готовой морфологии: стратегические коридоры. Публикация
//! строго однонаправленная — потребители читают артефакт, нарративный слой
//! не знает о них.

pub mod corridors;
pub mod steps;

pub use corridors::{Corridor, CorridorKind, CorridorOverlay, CorridorStrategy, Orientation};
pub use steps::{PlanCorridorsStep, ARTIFACT_CORRIDORS};
