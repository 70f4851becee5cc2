// src/foundation/steps.rs
//! Шаги фазы фундамента
//!
//! Четыре шага публикуют артефакты, на которые опирается вся остальная
//! генерация: сетку с привязкой тайлов, кору, граф плит и тектонические
//! скаляры. Контракт записан в `StepSpec`, конфигурация — типизированными
//! структурами serde со значениями по умолчанию.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::MapContext;
use crate::error::{ConfigIssue, StepError};
use crate::foundation::crust::{assign_crust, Crust};
use crate::foundation::mesh::{build_mesh, cell_count_for, Mesh};
use crate::foundation::plates::{build_plates, Directionality, PlateGraph};
use crate::foundation::tectonics::derive_tectonics;
use crate::pipeline::step::{normalize_config_as, parse_config, Phase, Step, StepSpec};

/// Идентификаторы артефактов фундамента.
pub const ARTIFACT_MESH: &str = "foundation.mesh";
pub const ARTIFACT_TILE_TO_CELL: &str = "foundation.tileToCell";
pub const ARTIFACT_CRUST: &str = "foundation.crust";
pub const ARTIFACT_PLATES: &str = "foundation.plates";
pub const ARTIFACT_TECTONICS: &str = "foundation.tectonics";

// === foundation/build-mesh ===

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshConfig {
    /// Степень закона «ячейки от площади карты».
    pub cell_power: f64,
    pub cell_scale: f64,
    /// Количество итераций релаксации Ллойда.
    pub relaxation: u32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            cell_power: 0.85,
            cell_scale: 0.5,
            relaxation: 2,
        }
    }
}

pub struct BuildMeshStep;

static BUILD_MESH_SPEC: StepSpec = StepSpec {
    id: "foundation/build-mesh",
    phase: Phase::Foundation,
    requires: &[],
    provides: &["artifact:foundation.mesh", "artifact:foundation.tileToCell"],
};

impl Step for BuildMeshStep {
    fn spec(&self) -> &'static StepSpec {
        &BUILD_MESH_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<MeshConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: MeshConfig = parse_config(config)?;
        let cell_count = cell_count_for(ctx.dims, config.cell_power, config.cell_scale);
        let mut rng = ctx.rng.stream(BUILD_MESH_SPEC.id, "sites");
        let (mesh, tile_to_cell) =
            build_mesh(ctx.dims, ctx.wrap_x, cell_count, config.relaxation, &mut rng);
        log::debug!(
            "mesh: {} cells over {}x{}",
            mesh.cell_count,
            ctx.dims.width,
            ctx.dims.height
        );
        ctx.artifacts.publish(ARTIFACT_MESH, mesh)?;
        ctx.artifacts.publish(ARTIFACT_TILE_TO_CELL, tile_to_cell)?;
        Ok(())
    }
}

// === foundation/compute-crust ===

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrustConfig {
    /// Доля континентальной коры 0..1.
    pub continental_ratio: f64,
}

impl Default for CrustConfig {
    fn default() -> Self {
        Self {
            continental_ratio: 0.34,
        }
    }
}

pub struct ComputeCrustStep;

static COMPUTE_CRUST_SPEC: StepSpec = StepSpec {
    id: "foundation/compute-crust",
    phase: Phase::Foundation,
    requires: &["artifact:foundation.mesh"],
    provides: &["artifact:foundation.crust"],
};

impl Step for ComputeCrustStep {
    fn spec(&self) -> &'static StepSpec {
        &COMPUTE_CRUST_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<CrustConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: CrustConfig = parse_config(config)?;
        let crust = {
            let mesh = ctx.artifacts.get::<Mesh>(ARTIFACT_MESH)?;
            assign_crust(
                mesh,
                config.continental_ratio.clamp(0.0, 1.0),
                &ctx.rng,
                COMPUTE_CRUST_SPEC.id,
            )
        };
        ctx.artifacts.publish(ARTIFACT_CRUST, crust)?;
        Ok(())
    }
}

// === foundation/compute-plates ===

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatesConfig {
    pub plate_count: usize,
    /// Порог сближения, ниже которого граница считается трансформной.
    pub transform_threshold: f64,
    pub directionality: Directionality,
}

impl Default for PlatesConfig {
    fn default() -> Self {
        Self {
            plate_count: 8,
            transform_threshold: 0.08,
            directionality: Directionality::default(),
        }
    }
}

pub struct ComputePlatesStep;

static COMPUTE_PLATES_SPEC: StepSpec = StepSpec {
    id: "foundation/compute-plates",
    phase: Phase::Foundation,
    requires: &["artifact:foundation.mesh"],
    provides: &["artifact:foundation.plates"],
};

impl Step for ComputePlatesStep {
    fn spec(&self) -> &'static StepSpec {
        &COMPUTE_PLATES_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<PlatesConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: PlatesConfig = parse_config(config)?;
        let mut rng = ctx.rng.stream(COMPUTE_PLATES_SPEC.id, "plates");
        let plates = {
            let mesh = ctx.artifacts.get::<Mesh>(ARTIFACT_MESH)?;
            build_plates(
                mesh,
                config.plate_count,
                config.directionality,
                config.transform_threshold as f32,
                &mut rng,
            )
        };
        log::debug!(
            "plates: {} plates, {} boundary edges",
            plates.plate_count,
            plates.edges.len()
        );
        ctx.artifacts.publish(ARTIFACT_PLATES, plates)?;
        Ok(())
    }
}

// === foundation/compute-tectonics ===

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TectonicsConfig {
    /// Дальность влияния границы в ячейках.
    pub reach: u32,
    /// Экспонента затухания от границы.
    pub falloff: f64,
    pub volcanism_scale: f64,
}

impl Default for TectonicsConfig {
    fn default() -> Self {
        Self {
            reach: 3,
            falloff: 1.8,
            volcanism_scale: 1.0,
        }
    }
}

pub struct ComputeTectonicsStep;

static COMPUTE_TECTONICS_SPEC: StepSpec = StepSpec {
    id: "foundation/compute-tectonics",
    phase: Phase::Foundation,
    requires: &[
        "artifact:foundation.mesh",
        "artifact:foundation.crust",
        "artifact:foundation.plates",
    ],
    provides: &["artifact:foundation.tectonics"],
};

impl Step for ComputeTectonicsStep {
    fn spec(&self) -> &'static StepSpec {
        &COMPUTE_TECTONICS_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<TectonicsConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: TectonicsConfig = parse_config(config)?;
        let tectonics = {
            let mesh = ctx.artifacts.get::<Mesh>(ARTIFACT_MESH)?;
            let crust = ctx.artifacts.get::<Crust>(ARTIFACT_CRUST)?;
            let plates = ctx.artifacts.get::<PlateGraph>(ARTIFACT_PLATES)?;
            derive_tectonics(
                mesh,
                crust,
                plates,
                config.reach,
                config.falloff as f32,
                config.volcanism_scale as f32,
            )
        };
        ctx.artifacts.publish(ARTIFACT_TECTONICS, tectonics)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use crate::config::WorldParams;
    use crate::foundation::mesh::TileToCell;
    use serde_json::json;

    fn run_foundation(ctx: &mut MapContext<'_>) {
        for step in [
            &BuildMeshStep as &dyn Step,
            &ComputeCrustStep,
            &ComputePlatesStep,
            &ComputeTectonicsStep,
        ] {
            let config = step.normalize_config(&Value::Null).unwrap();
            step.run(ctx, &config).unwrap();
        }
    }

    #[test]
    fn foundation_steps_publish_all_artifacts() {
        let params = WorldParams::new(42, 40, 24);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let mut ctx = MapContext::new(&params, &mut adapter);
        run_foundation(&mut ctx);

        assert!(ctx.artifacts.contains(ARTIFACT_MESH));
        assert!(ctx.artifacts.contains(ARTIFACT_TILE_TO_CELL));
        assert!(ctx.artifacts.contains(ARTIFACT_CRUST));
        assert!(ctx.artifacts.contains(ARTIFACT_PLATES));
        assert!(ctx.artifacts.contains(ARTIFACT_TECTONICS));

        let tiles = ctx.artifacts.get::<TileToCell>(ARTIFACT_TILE_TO_CELL).unwrap();
        assert_eq!(tiles.0.len(), 40 * 24);
    }

    #[test]
    fn mesh_config_rejects_unknown_keys() {
        let raw = json!({ "cell_power": 0.9, "sites": 10 });
        let issues = BuildMeshStep.normalize_config(&raw).unwrap_err();
        assert!(issues.iter().any(|i| i.path == "/sites"));
    }

    #[test]
    fn directionality_defaults_are_filled() {
        let normalized = ComputePlatesStep.normalize_config(&Value::Null).unwrap();
        assert_eq!(normalized["directionality"]["cohesion"], json!(0.35));
        assert_eq!(normalized["plate_count"], json!(8));
    }
}
