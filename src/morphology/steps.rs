// src/morphology/steps.rs
//! Шаги фазы морфологии
//!
//! Три шага превращают фундамент в финальную форму поверхности: суша с уровнем
//! моря, горные пояса и очистка береговой линии. Каждый шаг зеркалит свои
//! изменения и в пер-тайловые поля контекста, и в хостовый адаптер.

use serde_json::Value;

use crate::adapter::TerrainType;
use crate::context::MapContext;
use crate::error::{ConfigIssue, StepError};
use crate::foundation::crust::Crust;
use crate::foundation::mesh::TileToCell;
use crate::foundation::plates::PlateGraph;
use crate::foundation::steps::{
    ARTIFACT_CRUST, ARTIFACT_PLATES, ARTIFACT_TECTONICS, ARTIFACT_TILE_TO_CELL,
};
use crate::foundation::tectonics::{project_to_tiles, Tectonics};
use crate::morphology::coastlines::{
    build_coastline, fill_ponds, seed_islands, Coastline, CoastlineConfig,
};
use crate::morphology::landmass::{landmass_op, Landmass, LandmassInput, LandmassStrategy, SEA_LEVEL};
use crate::morphology::mountains::{
    relief_op, Relief, ReliefInput, ReliefStrategy, RELIEF_HILLS, RELIEF_MOUNTAIN,
};
use crate::pipeline::step::{normalize_config_as, parse_config, Phase, Step, StepSpec};

/// Идентификаторы артефактов морфологии.
pub const ARTIFACT_LANDMASS: &str = "morphology.landmass";
pub const ARTIFACT_RELIEF: &str = "morphology.relief";
pub const ARTIFACT_COASTLINE: &str = "morphology.coastline";

/// Масштаб перевода нормированного рельефа в высоты хоста.
const ELEVATION_SCALE: f32 = 1000.0;

// === morphology/build-landmass ===

pub struct BuildLandmassStep;

static BUILD_LANDMASS_SPEC: StepSpec = StepSpec {
    id: "morphology/build-landmass",
    phase: Phase::Morphology,
    requires: &[
        "artifact:foundation.crust",
        "artifact:foundation.tectonics",
        "artifact:foundation.tileToCell",
    ],
    provides: &["artifact:morphology.landmass"],
};

impl Step for BuildLandmassStep {
    fn spec(&self) -> &'static StepSpec {
        &BUILD_LANDMASS_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<LandmassStrategy>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let strategy: LandmassStrategy = parse_config(config)?;
        let input = {
            let crust = ctx.artifacts.get::<Crust>(ARTIFACT_CRUST)?;
            let tectonics = ctx.artifacts.get::<Tectonics>(ARTIFACT_TECTONICS)?;
            let tiles = ctx.artifacts.get::<TileToCell>(ARTIFACT_TILE_TO_CELL)?;
            LandmassInput {
                dims: ctx.dims,
                wrap_x: ctx.wrap_x,
                noise_seed: ctx.rng.derive_seed(BUILD_LANDMASS_SPEC.id, "noise") as i32,
                crust_kind: tiles.0.iter().map(|&c| crust.kind[c as usize]).collect(),
                uplift: project_to_tiles(&tectonics.cumulative_uplift, &tiles.0),
            }
        };

        let landmass = landmass_op().run_validated(&strategy, &input)?;
        log::debug!("landmass: {:.1}% land", landmass.land_fraction * 100.0);

        for idx in 0..ctx.dims.size() {
            let (x, y) = ctx.dims.coords(idx);
            let land = landmass.land[idx];
            let elevation = ((landmass.elevation[idx] - SEA_LEVEL) * ELEVATION_SCALE).round() as i16;
            let terrain = if land != 0 {
                TerrainType::Flat
            } else {
                TerrainType::Ocean
            };
            ctx.fields.land[idx] = land;
            ctx.fields.elevation[idx] = elevation;
            ctx.fields.terrain[idx] = terrain as u8;
            ctx.adapter.set_terrain(x, y, terrain);
            ctx.adapter.set_elevation(x, y, i32::from(elevation));
        }

        ctx.artifacts.publish(ARTIFACT_LANDMASS, landmass)?;
        Ok(())
    }
}

// === morphology/build-mountains ===

pub struct BuildMountainsStep;

static BUILD_MOUNTAINS_SPEC: StepSpec = StepSpec {
    id: "morphology/build-mountains",
    phase: Phase::Morphology,
    requires: &[
        "artifact:morphology.landmass",
        "artifact:foundation.plates",
        "artifact:foundation.tectonics",
        "artifact:foundation.tileToCell",
    ],
    provides: &["artifact:morphology.relief"],
};

impl Step for BuildMountainsStep {
    fn spec(&self) -> &'static StepSpec {
        &BUILD_MOUNTAINS_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<ReliefStrategy>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let strategy: ReliefStrategy = parse_config(config)?;
        let input = {
            let landmass = ctx.artifacts.get::<Landmass>(ARTIFACT_LANDMASS)?;
            let plates = ctx.artifacts.get::<PlateGraph>(ARTIFACT_PLATES)?;
            let tectonics = ctx.artifacts.get::<Tectonics>(ARTIFACT_TECTONICS)?;
            let tiles = ctx.artifacts.get::<TileToCell>(ARTIFACT_TILE_TO_CELL)?;
            ReliefInput {
                dims: ctx.dims,
                wrap_x: ctx.wrap_x,
                noise_seed: ctx.rng.derive_seed(BUILD_MOUNTAINS_SPEC.id, "noise") as i32,
                land: landmass.land.clone(),
                boundary_strength: project_to_tiles(&plates.boundary_strength, &tiles.0),
                uplift: project_to_tiles(&tectonics.uplift, &tiles.0),
                shear: project_to_tiles(&tectonics.shear, &tiles.0),
                rift: project_to_tiles(&tectonics.rift, &tiles.0),
            }
        };

        let relief = relief_op().run_validated(&strategy, &input)?;

        for idx in 0..ctx.dims.size() {
            let (x, y) = ctx.dims.coords(idx);
            let (terrain, bump) = match relief.kind[idx] {
                k if k == RELIEF_MOUNTAIN => (TerrainType::Mountain, 300),
                k if k == RELIEF_HILLS => (TerrainType::Hills, 120),
                _ => continue,
            };
            ctx.fields.terrain[idx] = terrain as u8;
            ctx.fields.elevation[idx] = ctx.fields.elevation[idx].saturating_add(bump);
            ctx.adapter.set_terrain(x, y, terrain);
            ctx.adapter
                .set_elevation(x, y, i32::from(ctx.fields.elevation[idx]));
        }

        ctx.artifacts.publish(ARTIFACT_RELIEF, relief)?;
        Ok(())
    }
}

// === morphology/refine-coastlines ===

pub struct RefineCoastlinesStep;

static REFINE_COASTLINES_SPEC: StepSpec = StepSpec {
    id: "morphology/refine-coastlines",
    phase: Phase::Morphology,
    requires: &["artifact:morphology.landmass", "artifact:morphology.relief"],
    provides: &["artifact:morphology.coastline"],
};

impl Step for RefineCoastlinesStep {
    fn spec(&self) -> &'static StepSpec {
        &REFINE_COASTLINES_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<CoastlineConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: CoastlineConfig = parse_config(config)?;

        let mut land = ctx.fields.land.clone();
        let coastal_before = {
            let landmass = ctx.artifacts.get::<Landmass>(ARTIFACT_LANDMASS)?;
            landmass.coastal_distance.clone()
        };

        let mut rng = ctx.rng.stream(REFINE_COASTLINES_SPEC.id, "islands");
        let seeded = seed_islands(&mut land, &coastal_before, ctx.dims, &config, &mut rng);
        let ponds = if config.fill_ponds {
            fill_ponds(&mut land, ctx.dims, ctx.wrap_x)
        } else {
            0
        };

        // Новая суша (острова и заполненные пруды) становится равнинами
        for idx in 0..ctx.dims.size() {
            if land[idx] != 0 && ctx.fields.land[idx] == 0 {
                let (x, y) = ctx.dims.coords(idx);
                ctx.fields.land[idx] = 1;
                ctx.fields.terrain[idx] = TerrainType::Flat as u8;
                ctx.fields.elevation[idx] = 40;
                ctx.adapter.set_terrain(x, y, TerrainType::Flat);
                ctx.adapter.set_elevation(x, y, 40);
            }
        }

        let coastline = build_coastline(
            land,
            ctx.dims,
            ctx.wrap_x,
            config.shelf_width,
            seeded.len() as u32,
            ponds,
        );

        // Шельф: мелководье вдоль берега
        for idx in 0..ctx.dims.size() {
            if coastline.shallow[idx] != 0 {
                let (x, y) = ctx.dims.coords(idx);
                ctx.fields.terrain[idx] = TerrainType::Coast as u8;
                ctx.adapter.set_terrain(x, y, TerrainType::Coast);
            }
        }

        if coastline.land.iter().all(|&l| l == 0) {
            ctx.metrics.warn("coastline: map has no land tiles");
        }
        log::debug!(
            "coastline: {} islands seeded, {} ponds filled",
            coastline.islands_seeded,
            coastline.ponds_filled
        );

        ctx.artifacts.publish(ARTIFACT_COASTLINE, coastline)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{HostAdapter, MockAdapter};
    use crate::config::WorldParams;
    use crate::foundation::steps::{
        BuildMeshStep, ComputeCrustStep, ComputePlatesStep, ComputeTectonicsStep,
    };
    use serde_json::json;

    fn run_through_morphology(params: &WorldParams, adapter: &mut MockAdapter) {
        let mut ctx = MapContext::new(params, adapter);
        let steps: Vec<&dyn Step> = vec![
            &BuildMeshStep,
            &ComputeCrustStep,
            &ComputePlatesStep,
            &ComputeTectonicsStep,
            &BuildLandmassStep,
            &BuildMountainsStep,
            &RefineCoastlinesStep,
        ];
        for step in steps {
            let config = step.normalize_config(&Value::Null).unwrap();
            step.run(&mut ctx, &config).unwrap();
        }
    }

    #[test]
    fn morphology_mirrors_land_into_adapter() {
        let params = WorldParams::new(11, 40, 24);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        run_through_morphology(&params, &mut adapter);

        let mut land_tiles = 0;
        for y in 0..24 {
            for x in 0..40 {
                if !adapter.is_water(x, y) {
                    land_tiles += 1;
                }
            }
        }
        assert!(land_tiles > 0, "expected some land on the map");
    }

    #[test]
    fn coastline_config_rejects_unknown_keys() {
        let raw = json!({ "island_density": 0.1, "reefs": true });
        let issues = RefineCoastlinesStep.normalize_config(&raw).unwrap_err();
        assert!(issues.iter().any(|i| i.path == "/reefs"));
    }

    #[test]
    fn landmass_step_accepts_strategy_without_config() {
        let raw = json!({ "strategy": "fractal" });
        let normalized = BuildLandmassStep.normalize_config(&raw).unwrap();
        assert_eq!(normalized["strategy"], json!("fractal"));
        assert_eq!(normalized["config"]["octaves"], json!(5));
    }
}
