// src/morphology/mod.rs
//! Фаза морфологии
//!
//! Форма поверхности: суша с подгонкой уровня моря, горные пояса вдоль границ
//! плит и очистка береговой линии. Артефакты фазы читают гидрология, экология
//! и размещение.

pub mod coastlines;
pub mod landmass;
pub mod mountains;
pub mod steps;

pub use coastlines::{Coastline, CoastlineConfig};
pub use landmass::{Landmass, LandmassStrategy, SEA_LEVEL};
pub use mountains::{Relief, ReliefStrategy, RELIEF_FLAT, RELIEF_HILLS, RELIEF_MOUNTAIN};
pub use steps::{
    BuildLandmassStep, BuildMountainsStep, RefineCoastlinesStep, ARTIFACT_COASTLINE,
    ARTIFACT_LANDMASS, ARTIFACT_RELIEF,
};
