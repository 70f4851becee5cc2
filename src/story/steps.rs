// src/story/steps.rs
//! Шаги нарративной фазы

use serde_json::Value;

use crate::context::MapContext;
use crate::error::{ConfigIssue, StepError};
use crate::morphology::coastlines::Coastline;
use crate::morphology::steps::ARTIFACT_COASTLINE;
use crate::pipeline::step::{normalize_config_as, parse_config, Phase, Step, StepSpec};
use crate::story::corridors::{corridor_op, CorridorInput, CorridorStrategy};

pub const ARTIFACT_CORRIDORS: &str = "story.corridors";

/// Метка фазы на оверлее.
const STAGE: &str = "narrative";

pub struct PlanCorridorsStep;

static PLAN_CORRIDORS_SPEC: StepSpec = StepSpec {
    id: "narrative/plan-corridors",
    phase: Phase::Narrative,
    requires: &["artifact:morphology.coastline"],
    provides: &["artifact:story.corridors"],
};

impl Step for PlanCorridorsStep {
    fn spec(&self) -> &'static StepSpec {
        &PLAN_CORRIDORS_SPEC
    }

    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
        normalize_config_as::<CorridorStrategy>(raw)
    }

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError> {
        let strategy: CorridorStrategy = parse_config(config)?;
        let input = {
            let coastline = ctx.artifacts.get::<Coastline>(ARTIFACT_COASTLINE)?;
            CorridorInput {
                dims: ctx.dims,
                wrap_x: ctx.wrap_x,
                land: coastline.land.clone(),
                stage: STAGE,
            }
        };

        let overlay = corridor_op().run_validated(&strategy, &input)?;
        log::debug!("corridors: {} planned", overlay.corridors.len());
        if overlay.corridors.is_empty() {
            ctx.metrics.warn("corridors: no corridors found on this map");
        }

        ctx.artifacts.publish(ARTIFACT_CORRIDORS, overlay)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use crate::config::WorldParams;
    use crate::morphology::coastlines::build_coastline;
    use crate::story::corridors::CorridorOverlay;

    #[test]
    fn all_water_map_yields_tagged_overlay() {
        // Карта 20×12 без суши: хотя бы один тайл морского пути обязан найтись
        let params = WorldParams::new(5, 20, 12);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let mut ctx = MapContext::new(&params, &mut adapter);
        let coastline = build_coastline(vec![0; 20 * 12], ctx.dims, true, 2, 0, 0);
        ctx.artifacts.publish(ARTIFACT_COASTLINE, coastline).unwrap();

        let config = PlanCorridorsStep.normalize_config(&Value::Null).unwrap();
        PlanCorridorsStep.run(&mut ctx, &config).unwrap();

        let overlay = ctx
            .artifacts
            .get::<CorridorOverlay>(ARTIFACT_CORRIDORS)
            .unwrap();
        assert!(overlay.mask.iter().any(|&m| m != 0));
        assert_eq!(overlay.stage, "narrative");
    }
}
