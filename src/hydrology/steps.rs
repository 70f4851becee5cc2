// src/hydrology/steps.rs
//! Шаги фазы гидрологии
//!
//! Климатическая базовая линия (строгая последовательность атмосферных
//! проходов), криосфера с альбедной обратной связью и дренаж с классификацией
//! рек. Дренаж сознательно отделён от климата: ему нужны финальные высоты и
//! осадки, но не промежуточные атмосферные поля.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::MapContext;
use crate::error::{ConfigIssue, StepError};
use crate::grid::Dimensions;
use crate::hydrology::climate::{
    advect_moisture, evaporation, precipitation, thermal_state, zonal_winds, EvaporationConfig,
    MoistureConfig, PrecipitationConfig, ThermalConfig, WindConfig, ZonalWinds,
};
use crate::hydrology::cryosphere::{build_cryosphere, Cryosphere, CryosphereConfig};
use crate::hydrology::drainage::{compute_drainage, Drainage, DrainageConfig, RIVER_MAJOR, RIVER_MINOR};
use crate::morphology::coastlines::Coastline;
use crate::morphology::steps::ARTIFACT_COASTLINE;
use crate::pipeline::step::{normalize_config_as, parse_config, Phase, Step, StepSpec};

/// Идентификаторы артефактов гидрологии.
pub const ARTIFACT_CLIMATE: &str = "hydrology.climate";
pub const ARTIFACT_CRYOSPHERE: &str = "hydrology.cryosphere";
pub const ARTIFACT_DRAINAGE: &str = "hydrology.drainage";

/// Климатическое состояние карты после базовой линии.
#[derive(Debug, Clone, PartialEq)]
pub struct Climate {
    pub dims: Dimensions,
    pub temperature: Vec<f32>,
    /// Осадки 0..200 в единицах хоста.
    pub rainfall: Vec<u8>,
    pub moisture: Vec<f32>,
    pub winds: ZonalWinds,
}

// === hydrology/climate-baseline ===

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClimateConfig {
    pub thermal: ThermalConfig,
    pub wind: WindConfig,
    pub evaporation: EvaporationConfig,
    pub moisture: MoistureConfig,
    pub precipitation: PrecipitationConfig,
}

pub struct ClimateBaselineStep;

static CLIMATE_BASELINE_SPEC: StepSpec = StepSpec {
    id: "hydrology/climate-baseline",
    phase: Phase::Hydrology,
    requires: &["artifact:morphology.coastline"],
    provides: &["artifact:hydrology.climate"],
};

impl Step for ClimateBaselineStep {
    fn spec(&self) -> &'static StepSpec {
        &CLIMATE_BASELINE_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<ClimateConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: ClimateConfig = parse_config(config)?;
        let row_latitudes: Vec<f32> = (0..ctx.dims.height)
            .map(|y| ctx.latitude_of_row(y))
            .collect();

        let land = {
            let coastline = ctx.artifacts.get::<Coastline>(ARTIFACT_COASTLINE)?;
            coastline.land.clone()
        };

        // Порядок проходов фиксирован; каждый читает только результаты предыдущих
        let temperature = thermal_state(
            ctx.dims,
            &row_latitudes,
            &ctx.fields.elevation,
            &land,
            &config.thermal,
        );
        let mut wind_rng = ctx.rng.stream(CLIMATE_BASELINE_SPEC.id, "winds");
        let winds = zonal_winds(&row_latitudes, &config.wind, &mut wind_rng);
        let sources = evaporation(&temperature, &land, &config.evaporation);
        let moisture = advect_moisture(
            &sources,
            &winds,
            ctx.dims,
            ctx.wrap_x,
            &ctx.fields.elevation,
            &config.moisture,
        );
        let rainfall = precipitation(&moisture, ctx.dims, &row_latitudes, &config.precipitation);

        for idx in 0..ctx.dims.size() {
            let (x, y) = ctx.dims.coords(idx);
            ctx.fields.temperature[idx] = temperature[idx];
            ctx.fields.rainfall[idx] = rainfall[idx];
            ctx.adapter.set_rainfall(x, y, rainfall[idx]);
        }

        ctx.artifacts.publish(
            ARTIFACT_CLIMATE,
            Climate {
                dims: ctx.dims,
                temperature,
                rainfall,
                moisture,
                winds,
            },
        )?;
        Ok(())
    }
}

// === hydrology/cryosphere ===

pub struct CryosphereStep;

static CRYOSPHERE_SPEC: StepSpec = StepSpec {
    id: "hydrology/cryosphere",
    phase: Phase::Hydrology,
    requires: &["artifact:hydrology.climate", "artifact:morphology.coastline"],
    provides: &["artifact:hydrology.cryosphere"],
};

impl Step for CryosphereStep {
    fn spec(&self) -> &'static StepSpec {
        &CRYOSPHERE_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<CryosphereConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: CryosphereConfig = parse_config(config)?;
        let cryosphere = {
            let climate = ctx.artifacts.get::<Climate>(ARTIFACT_CLIMATE)?;
            let coastline = ctx.artifacts.get::<Coastline>(ARTIFACT_COASTLINE)?;
            build_cryosphere(
                ctx.dims,
                ctx.wrap_x,
                &climate.temperature,
                &climate.rainfall,
                &coastline.land,
                &config,
            )
        };

        // Поле температуры отражает переохлаждение обратной связью
        ctx.fields.temperature.copy_from_slice(&cryosphere.temperature);

        ctx.artifacts.publish(ARTIFACT_CRYOSPHERE, cryosphere)?;
        Ok(())
    }
}

// === hydrology/compute-drainage ===

pub struct ComputeDrainageStep;

static COMPUTE_DRAINAGE_SPEC: StepSpec = StepSpec {
    id: "hydrology/compute-drainage",
    phase: Phase::Hydrology,
    requires: &["artifact:hydrology.climate", "artifact:morphology.coastline"],
    provides: &["artifact:hydrology.drainage"],
};

impl Step for ComputeDrainageStep {
    fn spec(&self) -> &'static StepSpec {
        &COMPUTE_DRAINAGE_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<DrainageConfig>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let config: DrainageConfig = parse_config(config)?;
        let drainage = {
            let climate = ctx.artifacts.get::<Climate>(ARTIFACT_CLIMATE)?;
            let coastline = ctx.artifacts.get::<Coastline>(ARTIFACT_COASTLINE)?;
            compute_drainage(
                &ctx.fields.elevation,
                &climate.rainfall,
                &coastline.land,
                ctx.dims,
                ctx.wrap_x,
                &config,
            )
        };

        let major = drainage.river_class.iter().filter(|&&c| c == RIVER_MAJOR).count();
        let minor = drainage.river_class.iter().filter(|&&c| c == RIVER_MINOR).count();
        log::debug!("drainage: {major} major / {minor} minor river tiles");

        ctx.artifacts.publish(ARTIFACT_DRAINAGE, drainage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use crate::config::WorldParams;
    use crate::foundation::steps::{
        BuildMeshStep, ComputeCrustStep, ComputePlatesStep, ComputeTectonicsStep,
    };
    use crate::morphology::steps::{BuildLandmassStep, BuildMountainsStep, RefineCoastlinesStep};
    use serde_json::json;

    fn run_pipeline(params: &WorldParams, adapter: &mut MockAdapter) -> Vec<u8> {
        let mut ctx = MapContext::new(params, adapter);
        let steps: Vec<&dyn Step> = vec![
            &BuildMeshStep,
            &ComputeCrustStep,
            &ComputePlatesStep,
            &ComputeTectonicsStep,
            &BuildLandmassStep,
            &BuildMountainsStep,
            &RefineCoastlinesStep,
            &ClimateBaselineStep,
            &CryosphereStep,
            &ComputeDrainageStep,
        ];
        for step in steps {
            let config = step.normalize_config(&Value::Null).unwrap();
            step.run(&mut ctx, &config).unwrap();
        }
        ctx.fields.rainfall.clone()
    }

    #[test]
    fn climate_fills_rainfall_everywhere() {
        let params = WorldParams::new(3, 40, 24);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let rainfall = run_pipeline(&params, &mut adapter);
        assert_eq!(rainfall.len(), 40 * 24);
        assert!(rainfall.iter().any(|&r| r > 0));
        assert!(rainfall.iter().all(|&r| r <= 200));
    }

    #[test]
    fn climate_is_deterministic() {
        let params = WorldParams::new(3, 40, 24);
        let mut a = MockAdapter::new(params.dimensions(), params.seed);
        let mut b = MockAdapter::new(params.dimensions(), params.seed);
        assert_eq!(run_pipeline(&params, &mut a), run_pipeline(&params, &mut b));
    }

    #[test]
    fn climate_config_rejects_unknown_keys() {
        let raw = json!({ "thermal": { "equator_temp": 30.0, "typo": 1 } });
        let issues = ClimateBaselineStep.normalize_config(&raw).unwrap_err();
        assert!(issues.iter().any(|i| i.path == "/thermal/typo"));
    }

    #[test]
    fn drainage_defaults_compile() {
        let normalized = ComputeDrainageStep.normalize_config(&Value::Null).unwrap();
        assert_eq!(normalized["minor_percentile"], json!(0.85));
        assert_eq!(normalized["major_percentile"], json!(0.95));
    }
}
