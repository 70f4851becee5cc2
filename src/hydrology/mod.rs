// src/hydrology/mod.rs
//! Фаза гидрологии
//!
//! Атмосфера (температура, ветра, влага, осадки), криосфера и дренаж. Все
//! проходы — фиксированные по числу итераций функции над плоскими буферами.

pub mod climate;
pub mod cryosphere;
pub mod drainage;
pub mod steps;

pub use climate::{ZonalWinds, RAINFALL_BANDS};
pub use cryosphere::{Cryosphere, CryosphereConfig};
pub use drainage::{Drainage, DrainageConfig, RIVER_MAJOR, RIVER_MINOR, RIVER_NONE};
pub use steps::{
    Climate, ClimateBaselineStep, ClimateConfig, ComputeDrainageStep, CryosphereStep,
    ARTIFACT_CLIMATE, ARTIFACT_CRYOSPHERE, ARTIFACT_DRAINAGE,
};
