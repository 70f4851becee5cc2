// src/recipes.rs
//! Стандартный реестр и рецепт
//!
//! Реестр регистрирует все встроенные шаги; стандартный рецепт перечисляет их
//! в порядке фаз. Грубые ручки параметров детерминированно превращаются в
//! переопределения конфигурации шагов, пользовательские переопределения ложатся
//! поверх поключево.

use serde_json::{json, Value};

use crate::config::WorldParams;
use crate::ecology::steps::{ApplyFeaturesStep, ClassifyBiomesStep, PlanFeaturesStep};
use crate::foundation::steps::{
    BuildMeshStep, ComputeCrustStep, ComputePlatesStep, ComputeTectonicsStep,
};
use crate::hydrology::steps::{ClimateBaselineStep, ComputeDrainageStep, CryosphereStep};
use crate::morphology::steps::{BuildLandmassStep, BuildMountainsStep, RefineCoastlinesStep};
use crate::pipeline::recipe::Recipe;
use crate::pipeline::registry::StepRegistry;
use crate::placement::steps::AssignStartsStep;
use crate::story::steps::PlanCorridorsStep;

/// Реестр всех встроенных шагов.
#[must_use]
pub fn standard_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry.register(Box::new(BuildMeshStep));
    registry.register(Box::new(ComputeCrustStep));
    registry.register(Box::new(ComputePlatesStep));
    registry.register(Box::new(ComputeTectonicsStep));
    registry.register(Box::new(BuildLandmassStep));
    registry.register(Box::new(BuildMountainsStep));
    registry.register(Box::new(RefineCoastlinesStep));
    registry.register(Box::new(ClimateBaselineStep));
    registry.register(Box::new(CryosphereStep));
    registry.register(Box::new(ComputeDrainageStep));
    registry.register(Box::new(PlanCorridorsStep));
    registry.register(Box::new(ClassifyBiomesStep));
    registry.register(Box::new(PlanFeaturesStep));
    registry.register(Box::new(ApplyFeaturesStep));
    registry.register(Box::new(AssignStartsStep));
    registry
}

/// Поверхностное слияние: ключ переопределения побеждает ключ базы целиком.
#[must_use]
fn merge_shallow(base: Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (base, Value::Null) => base,
        (Value::Object(mut base_map), Value::Object(over_map)) => {
            for (key, value) in over_map {
                base_map.insert(key.clone(), value.clone());
            }
            Value::Object(base_map)
        }
        (_, other) => other.clone(),
    }
}

fn step_config(params: &WorldParams, step_id: &str, base: Value) -> Value {
    match params.overrides.get(step_id) {
        Some(user) => merge_shallow(base, user),
        None => base,
    }
}

/// Стандартный рецепт в порядке фаз, с ручками и переопределениями.
#[must_use]
pub fn standard_recipe(params: &WorldParams) -> Recipe {
    let knobs = &params.knobs;

    let tectonics = json!({ "volcanism_scale": knobs.volcanism_scale() });
    let landmass = json!({
        "config": {
            "target_land_fraction": knobs.target_land_fraction(),
            "smooth_radius": knobs.smooth_radius(),
        }
    });

    let ids = [
        "foundation/build-mesh",
        "foundation/compute-crust",
        "foundation/compute-plates",
        "foundation/compute-tectonics",
        "morphology/build-landmass",
        "morphology/build-mountains",
        "morphology/refine-coastlines",
        "hydrology/climate-baseline",
        "hydrology/cryosphere",
        "hydrology/compute-drainage",
        "narrative/plan-corridors",
        "ecology/classify-biomes",
        "ecology/plan-features",
        "ecology/apply-features",
        "placement/assign-starts",
    ];

    let mut recipe = Recipe::new("standard");
    for id in ids {
        let base = match id {
            "foundation/compute-tectonics" => tectonics.clone(),
            "morphology/build-landmass" => landmass.clone(),
            _ => Value::Null,
        };
        recipe = recipe.step_with(id, step_config(params, id, base));
    }
    recipe
}
