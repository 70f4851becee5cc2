// src/placement/steps.rs
//! Шаг размещения стартов
//!
//! Финальный шаг стандартного рецепта: старты игроков по континентам и
//! целевые количества чудес/ресурсов. Количества не симулируются — база
//! берётся из метаданных хоста, переопределения ложатся поверх поключево.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::MapContext;
use crate::ecology::biomes::BiomeMap;
use crate::ecology::steps::{ARTIFACT_BIOMES, ARTIFACT_FEATURES_APPLIED};
use crate::error::{ConfigIssue, StepError};
use crate::grid::distance_field;
use crate::hydrology::drainage::Drainage;
use crate::hydrology::steps::ARTIFACT_DRAINAGE;
use crate::morphology::coastlines::Coastline;
use crate::morphology::steps::ARTIFACT_COASTLINE;
use crate::pipeline::step::{normalize_config_as, parse_config, Phase, Step, StepSpec};
use crate::placement::starts::{assign_starts, StartInput, StartPosition, StartsConfig};

pub const ARTIFACT_STARTS: &str = "placement.starts";

/// Итог фазы размещения.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPlacement {
    pub starts: Vec<StartPosition>,
    /// Целевое количество природных чудес.
    pub natural_wonders: u32,
    /// Целевое количество стратегических ресурсов.
    pub resources: u32,
}

/// Переопределения целевых количеств: заданный ключ побеждает базу из
/// метаданных хоста, незаданный — оставляет её.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetOverrides {
    pub natural_wonders: Option<u32>,
    pub resources: Option<u32>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssignStartsConfig {
    pub starts: StartsConfig,
    pub targets: TargetOverrides,
}

pub struct AssignStartsStep;

static ASSIGN_STARTS_SPEC: StepSpec = StepSpec {
    id: "placement/assign-starts",
    phase: Phase::Placement,
    requires: &[
        "artifact:morphology.coastline",
        "artifact:ecology.biomes",
        "artifact:hydrology.drainage",
        "artifact:ecology.applied",
    ],
    provides: &["artifact:placement.starts"],
};

impl Step for AssignStartsStep {
    fn spec(&self) -> &'static StepSpec {
        &ASSIGN_STARTS_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<AssignStartsConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: AssignStartsConfig = parse_config(config)?;
        let info = ctx.adapter.map_info();

        let starts = {
            let coastline = ctx.artifacts.get::<Coastline>(ARTIFACT_COASTLINE)?;
            let biomes = ctx.artifacts.get::<BiomeMap>(ARTIFACT_BIOMES)?;
            let drainage = ctx.artifacts.get::<Drainage>(ARTIFACT_DRAINAGE)?;

            // Плодородности нужна дистанция до воды, а не до суши
            let water: Vec<u8> = coastline.land.iter().map(|&l| u8::from(l == 0)).collect();
            let input = StartInput {
                dims: ctx.dims,
                wrap_x: ctx.wrap_x,
                land: coastline.land.clone(),
                biome: biomes.data.iter().map(|b| b.code()).collect(),
                rainfall: ctx.fields.rainfall.clone(),
                river_class: drainage.river_class.clone(),
                coastal_distance: distance_field(&water, ctx.dims, ctx.wrap_x),
            };
            assign_starts(
                &input,
                &config.starts,
                info.players_landmass_1,
                info.players_landmass_2,
            )
        };

        let expected = info.players_landmass_1 + info.players_landmass_2;
        if (starts.len() as u32) < expected {
            ctx.metrics.warn(format!(
                "placement: {} starts assigned of {expected} requested",
                starts.len()
            ));
        }
        log::info!("placement: {} starts assigned", starts.len());

        let placement = StartPlacement {
            starts,
            natural_wonders: config.targets.natural_wonders.unwrap_or(info.natural_wonders),
            resources: config.targets.resources.unwrap_or(info.resources),
        };
        ctx.artifacts.publish(ARTIFACT_STARTS, placement)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{HostMapInfo, MockAdapter};
    use crate::config::WorldParams;
    use crate::ecology::biomes::{Biome, BiomeMap};
    use crate::ecology::steps::AppliedFeatures;
    use crate::grid::Dimensions;
    use crate::hydrology::drainage::RIVER_NONE;
    use crate::morphology::coastlines::build_coastline;

    fn seed_artifacts(ctx: &mut MapContext<'_>, land: Vec<u8>) {
        let dims = ctx.dims;
        let coastline = build_coastline(land.clone(), dims, ctx.wrap_x, 2, 0, 0);
        ctx.artifacts
            .publish(ARTIFACT_COASTLINE, coastline)
            .unwrap();
        let data = land
            .iter()
            .map(|&l| {
                if l != 0 {
                    Biome::Grassland
                } else {
                    Biome::Marine
                }
            })
            .collect();
        ctx.artifacts
            .publish(ARTIFACT_BIOMES, BiomeMap { dims, data })
            .unwrap();
        ctx.artifacts
            .publish(
                ARTIFACT_DRAINAGE,
                Drainage {
                    dims,
                    receiver: (0..dims.size() as u32).collect(),
                    discharge: vec![0.0; dims.size()],
                    river_class: vec![RIVER_NONE; dims.size()],
                },
            )
            .unwrap();
        ctx.artifacts
            .publish(ARTIFACT_FEATURES_APPLIED, AppliedFeatures::default())
            .unwrap();
    }

    fn two_continents(dims: Dimensions) -> Vec<u8> {
        let mut land = vec![0u8; dims.size()];
        for y in 1..dims.height - 1 {
            for x in 1..dims.width / 2 - 1 {
                land[dims.index(x, y)] = 1;
            }
            for x in dims.width / 2 + 1..dims.width - 1 {
                land[dims.index(x, y)] = 1;
            }
        }
        land
    }

    #[test]
    fn host_counts_flow_into_the_artifact() {
        let params = WorldParams::new(5, 24, 12);
        let info = HostMapInfo {
            players_landmass_1: 2,
            players_landmass_2: 2,
            natural_wonders: 7,
            resources: 30,
        };
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed).with_map_info(info);
        let mut ctx = MapContext::new(&params, &mut adapter);
        seed_artifacts(&mut ctx, two_continents(params.dimensions()));

        let config = AssignStartsStep.normalize_config(&Value::Null).unwrap();
        AssignStartsStep.run(&mut ctx, &config).unwrap();

        let placement = ctx
            .artifacts
            .get::<StartPlacement>(ARTIFACT_STARTS)
            .unwrap();
        assert_eq!(placement.starts.len(), 4);
        assert_eq!(placement.natural_wonders, 7);
        assert_eq!(placement.resources, 30);
    }

    #[test]
    fn target_overrides_win_key_by_key() {
        let params = WorldParams::new(5, 24, 12);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let mut ctx = MapContext::new(&params, &mut adapter);
        seed_artifacts(&mut ctx, two_continents(params.dimensions()));

        let raw = serde_json::json!({ "targets": { "natural_wonders": 9 } });
        let config = AssignStartsStep.normalize_config(&raw).unwrap();
        AssignStartsStep.run(&mut ctx, &config).unwrap();

        let placement = ctx
            .artifacts
            .get::<StartPlacement>(ARTIFACT_STARTS)
            .unwrap();
        // Переопределён только один ключ, второй остаётся базовым
        assert_eq!(placement.natural_wonders, 9);
        assert_eq!(placement.resources, HostMapInfo::default().resources);
    }

    #[test]
    fn all_water_map_warns_and_places_nobody() {
        let params = WorldParams::new(5, 12, 8);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let mut ctx = MapContext::new(&params, &mut adapter);
        seed_artifacts(&mut ctx, vec![0; params.dimensions().size()]);

        let config = AssignStartsStep.normalize_config(&Value::Null).unwrap();
        AssignStartsStep.run(&mut ctx, &config).unwrap();

        let placement = ctx
            .artifacts
            .get::<StartPlacement>(ARTIFACT_STARTS)
            .unwrap();
        assert!(placement.starts.is_empty());
        assert!(!ctx.metrics.warnings.is_empty());
    }
}
