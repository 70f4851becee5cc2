// src/foundation/mod.rs
//! Фаза фундамента
//!
//! Физическая подложка карты: нерегулярная ячеистая сетка, кора, плиты и
//! тектонические скаляры. Артефакты фундамента неизменяемы после публикации;
//! морфология и дальнейшие фазы только читают их.

pub mod crust;
pub mod mesh;
pub mod plates;
pub mod steps;
pub mod tectonics;

pub use crust::{Crust, CRUST_CONTINENTAL, CRUST_OCEANIC};
pub use mesh::{Mesh, TileToCell};
pub use plates::{BoundaryKind, Directionality, PlateGraph};
pub use steps::{
    BuildMeshStep, ComputeCrustStep, ComputePlatesStep, ComputeTectonicsStep, ARTIFACT_CRUST,
    ARTIFACT_MESH, ARTIFACT_PLATES, ARTIFACT_TECTONICS, ARTIFACT_TILE_TO_CELL,
};
pub use tectonics::Tectonics;
