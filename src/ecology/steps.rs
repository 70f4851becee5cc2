// src/ecology/steps.rs
//! Шаги фазы экологии
//!
//! Классификация биомов, затем план особенностей и отдельным шагом — его
//! применение через предикат легальности адаптера. Разрез между планом и
//! применением держит всю экологию тестируемой без хоста.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::MapContext;
use crate::ecology::biomes::{classify_biomes, effective_rainfall, BiomeConfig, BiomeMap};
use crate::ecology::features::{plan_features, FeatureConfig, FeatureInput, FeaturePlan};
use crate::error::{ConfigIssue, StepError};
use crate::hydrology::cryosphere::Cryosphere;
use crate::hydrology::drainage::Drainage;
use crate::hydrology::steps::{Climate, ARTIFACT_CLIMATE, ARTIFACT_CRYOSPHERE, ARTIFACT_DRAINAGE};
use crate::morphology::coastlines::Coastline;
use crate::morphology::steps::ARTIFACT_COASTLINE;
use crate::pipeline::step::{normalize_config_as, parse_config, Phase, Step, StepSpec};
use crate::story::corridors::CorridorOverlay;
use crate::story::steps::ARTIFACT_CORRIDORS;

/// Идентификаторы артефактов экологии.
pub const ARTIFACT_BIOMES: &str = "ecology.biomes";
pub const ARTIFACT_FEATURE_PLAN: &str = "ecology.features";
pub const ARTIFACT_FEATURES_APPLIED: &str = "ecology.applied";

// === ecology/classify-biomes ===

pub struct ClassifyBiomesStep;

static CLASSIFY_BIOMES_SPEC: StepSpec = StepSpec {
    id: "ecology/classify-biomes",
    phase: Phase::Ecology,
    requires: &[
        "artifact:morphology.coastline",
        "artifact:hydrology.climate",
        "artifact:hydrology.cryosphere",
        "artifact:story.corridors",
    ],
    provides: &["artifact:ecology.biomes"],
};

impl Step for ClassifyBiomesStep {
    fn spec(&self) -> &'static StepSpec {
        &CLASSIFY_BIOMES_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<BiomeConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: BiomeConfig = parse_config(config)?;
        let biomes = {
            let coastline = ctx.artifacts.get::<Coastline>(ARTIFACT_COASTLINE)?;
            let climate = ctx.artifacts.get::<Climate>(ARTIFACT_CLIMATE)?;
            let cryosphere = ctx.artifacts.get::<Cryosphere>(ARTIFACT_CRYOSPHERE)?;
            let overlay = ctx.artifacts.get::<CorridorOverlay>(ARTIFACT_CORRIDORS)?;

            let moisture = effective_rainfall(
                &climate.rainfall,
                &overlay.mask,
                ctx.dims,
                ctx.wrap_x,
                &config.corridor,
            );
            classify_biomes(
                ctx.dims,
                &cryosphere.temperature,
                &moisture,
                &cryosphere.aridity,
                &coastline.land,
                &config.thresholds,
            )
        };

        for idx in 0..ctx.dims.size() {
            let (x, y) = ctx.dims.coords(idx);
            let code = biomes.data[idx].code();
            ctx.fields.biome[idx] = code;
            ctx.adapter.set_biome(x, y, code);
        }

        ctx.artifacts.publish(ARTIFACT_BIOMES, biomes)?;
        Ok(())
    }
}

// === ecology/plan-features ===

pub struct PlanFeaturesStep;

static PLAN_FEATURES_SPEC: StepSpec = StepSpec {
    id: "ecology/plan-features",
    phase: Phase::Ecology,
    requires: &[
        "artifact:ecology.biomes",
        "artifact:hydrology.climate",
        "artifact:hydrology.cryosphere",
        "artifact:hydrology.drainage",
        "artifact:morphology.coastline",
    ],
    provides: &["artifact:ecology.features"],
};

impl Step for PlanFeaturesStep {
    fn spec(&self) -> &'static StepSpec {
        &PLAN_FEATURES_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<FeatureConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: FeatureConfig = parse_config(config)?;
        let plan = {
            let biomes = ctx.artifacts.get::<BiomeMap>(ARTIFACT_BIOMES)?;
            let climate = ctx.artifacts.get::<Climate>(ARTIFACT_CLIMATE)?;
            let cryosphere = ctx.artifacts.get::<Cryosphere>(ARTIFACT_CRYOSPHERE)?;
            let drainage = ctx.artifacts.get::<Drainage>(ARTIFACT_DRAINAGE)?;
            let coastline = ctx.artifacts.get::<Coastline>(ARTIFACT_COASTLINE)?;

            let input = FeatureInput {
                dims: ctx.dims,
                land: coastline.land.clone(),
                biome: biomes.data.iter().map(|b| b.code()).collect(),
                rainfall: climate.rainfall.clone(),
                temperature: cryosphere.temperature.clone(),
                river_class: drainage.river_class.clone(),
                sea_ice: cryosphere.sea_ice.clone(),
                shallow: coastline.shallow.clone(),
            };
            plan_features(&input, &config)
        };

        log::debug!("features: {} intents planned", plan.intents.len());
        ctx.artifacts.publish(ARTIFACT_FEATURE_PLAN, plan)?;
        Ok(())
    }
}

// === ecology/apply-features ===

/// Итог применения плана.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppliedFeatures {
    pub placed: u32,
    /// Намерения, отклонённые предикатом легальности хоста.
    pub rejected_illegal: u32,
    /// Намерения, не прошедшие розыгрыш веса.
    pub skipped_by_weight: u32,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplyFeaturesConfig {}

pub struct ApplyFeaturesStep;

static APPLY_FEATURES_SPEC: StepSpec = StepSpec {
    id: "ecology/apply-features",
    phase: Phase::Ecology,
    requires: &["artifact:ecology.features"],
    provides: &["artifact:ecology.applied"],
};

impl Step for ApplyFeaturesStep {
    fn spec(&self) -> &'static StepSpec {
        &APPLY_FEATURES_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<ApplyFeaturesConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let _: ApplyFeaturesConfig = parse_config(config)?;
        let intents = {
            let plan = ctx.artifacts.get::<FeaturePlan>(ARTIFACT_FEATURE_PLAN)?;
            plan.intents.clone()
        };

        let mut applied = AppliedFeatures::default();
        for intent in intents {
            let threshold = (intent.weight.clamp(0.0, 1.0) * 100.0) as u32;
            if ctx.adapter.random(100, "feature-roll") >= threshold {
                applied.skipped_by_weight += 1;
                continue;
            }
            if !ctx.adapter.can_place_feature(intent.x, intent.y, intent.feature) {
                applied.rejected_illegal += 1;
                continue;
            }
            ctx.adapter.set_feature(intent.x, intent.y, intent.feature);
            ctx.fields.feature[ctx.dims.index(intent.x, intent.y)] = intent.feature.code();
            applied.placed += 1;
        }

        log::debug!(
            "features: {} placed, {} illegal, {} skipped",
            applied.placed,
            applied.rejected_illegal,
            applied.skipped_by_weight
        );
        ctx.artifacts.publish(ARTIFACT_FEATURES_APPLIED, applied)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{FeatureType, MockAdapter};
    use crate::config::WorldParams;
    use crate::ecology::features::FeatureIntent;

    #[test]
    fn application_respects_host_legality() {
        let params = WorldParams::new(8, 4, 1);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let mut ctx = MapContext::new(&params, &mut adapter);

        // Лес на воде нелегален в заглушке, риф легален
        let plan = FeaturePlan {
            intents: vec![
                FeatureIntent {
                    x: 0,
                    y: 0,
                    feature: FeatureType::Forest,
                    weight: 1.0,
                },
                FeatureIntent {
                    x: 1,
                    y: 0,
                    feature: FeatureType::Reef,
                    weight: 1.0,
                },
            ],
        };
        ctx.artifacts.publish(ARTIFACT_FEATURE_PLAN, plan).unwrap();

        let config = ApplyFeaturesStep.normalize_config(&Value::Null).unwrap();
        ApplyFeaturesStep.run(&mut ctx, &config).unwrap();

        let applied = ctx
            .artifacts
            .get::<AppliedFeatures>(ARTIFACT_FEATURES_APPLIED)
            .unwrap();
        assert_eq!(applied.placed, 1);
        assert_eq!(applied.rejected_illegal, 1);
        assert_eq!(ctx.fields.feature[1], FeatureType::Reef.code());
        assert_eq!(ctx.fields.feature[0], -1);
    }

    #[test]
    fn zero_weight_intents_never_place() {
        let params = WorldParams::new(8, 2, 1);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let mut ctx = MapContext::new(&params, &mut adapter);
        let plan = FeaturePlan {
            intents: vec![FeatureIntent {
                x: 0,
                y: 0,
                feature: FeatureType::Reef,
                weight: 0.0,
            }],
        };
        ctx.artifacts.publish(ARTIFACT_FEATURE_PLAN, plan).unwrap();
        let config = ApplyFeaturesStep.normalize_config(&Value::Null).unwrap();
        ApplyFeaturesStep.run(&mut ctx, &config).unwrap();
        let applied = ctx
            .artifacts
            .get::<AppliedFeatures>(ARTIFACT_FEATURES_APPLIED)
            .unwrap();
        assert_eq!(applied.placed, 0);
        assert_eq!(applied.skipped_by_weight, 1);
    }
}
