// src/pipeline/executor.rs
//! Исполнитель плана
//!
//! Запускает узлы скомпилированного плана строго по порядку, однопоточно и без
//! перекрытия шагов: поздние шаги читают артефакты, гарантированно полные лишь
//! после возврата `run` раннего шага. Падение шага фиксируется в результатах и
//! немедленно завершает прогон — частично сгенерированная карта хуже никакой.

use std::collections::BTreeSet;
use std::time::Instant;

use crate::context::MapContext;
use crate::error::{MapGenError, StepError};
use crate::pipeline::plan::ExecutionPlan;
use crate::pipeline::registry::StepRegistry;
use crate::pipeline::step::artifact_id;

/// Итог одного шага: успех/провал и длительность.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_id: String,
    pub success: bool,
    pub duration_ms: f64,
    pub error: Option<String>,
}

/// Отчёт прогона: результаты шагов и множество удовлетворённых тегов.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub step_results: Vec<StepResult>,
    pub satisfied: BTreeSet<String>,
}

/// Последовательный исполнитель скомпилированных планов.
pub struct Executor<'r> {
    registry: &'r StepRegistry,
}

impl<'r> Executor<'r> {
    #[must_use]
    pub fn new(registry: &'r StepRegistry) -> Self {
        Self { registry }
    }

    /// Исполняет план. Ошибка шага возвращается после записи его результата.
    pub fn execute(
        &self,
        ctx: &mut MapContext<'_>,
        plan: &ExecutionPlan,
    ) -> Result<RunReport, MapGenError> {
        let total = plan.nodes.len();
        let mut step_results = Vec::with_capacity(total);
        let mut satisfied: BTreeSet<String> = BTreeSet::new();

        ctx.metrics.reset();
        log::info!("run {} ({} steps)", plan.recipe_id, total);

        for (index, node) in plan.nodes.iter().enumerate() {
            // План скомпилирован из этого же реестра — шаг обязан существовать
            let step = self
                .registry
                .get(&node.step_id)
                .ok_or_else(|| MapGenError::Step {
                    step_id: node.step_id.clone(),
                    source: StepError::Failed("step disappeared from registry".into()),
                })?;

            log::info!("[{}/{}] start {}", index + 1, total, node.step_id);
            let t0 = Instant::now();

            match self.run_step(ctx, step, node, &mut satisfied) {
                Ok(()) => {
                    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;
                    log::info!(
                        "[{}/{}] ok {} ({duration_ms:.2}ms)",
                        index + 1,
                        total,
                        node.step_id
                    );
                    ctx.metrics.record_timing(&node.step_id, duration_ms);
                    step_results.push(StepResult {
                        step_id: node.step_id.clone(),
                        success: true,
                        duration_ms,
                        error: None,
                    });
                }
                Err(source) => {
                    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;
                    let message = source.to_string();
                    log::error!(
                        "[{}/{}] fail {} ({duration_ms:.2}ms): {message}",
                        index + 1,
                        total,
                        node.step_id
                    );
                    step_results.push(StepResult {
                        step_id: node.step_id.clone(),
                        success: false,
                        duration_ms,
                        error: Some(message),
                    });
                    return Err(MapGenError::Step {
                        step_id: node.step_id.clone(),
                        source,
                    });
                }
            }
        }

        Ok(RunReport {
            step_results,
            satisfied,
        })
    }

    fn run_step(
        &self,
        ctx: &mut MapContext<'_>,
        step: &dyn crate::pipeline::step::Step,
        node: &crate::pipeline::plan::PlanNode,
        satisfied: &mut BTreeSet<String>,
    ) -> Result<(), StepError> {
        step.run(ctx, &node.config)?;

        // Объявленный provides обязан быть действительно произведён:
        // артефактный тег — публикацией в хранилище.
        for &tag in step.spec().provides {
            if let Some(id) = artifact_id(tag) {
                if !ctx.artifacts.contains(id) {
                    return Err(StepError::UnsatisfiedProvides(tag.to_string()));
                }
            }
            satisfied.insert(tag.to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    use crate::adapter::MockAdapter;
    use crate::config::WorldParams;
    use crate::error::ConfigIssue;
    use crate::pipeline::recipe::Recipe;
    use crate::pipeline::step::{normalize_config_as, Phase, Step, StepSpec};

    #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct EmptyConfig {}

    struct ForgetfulStep;

    static FORGETFUL_SPEC: StepSpec = StepSpec {
        id: "test/forgetful",
        phase: Phase::Foundation,
        requires: &[],
        provides: &["artifact:test.promised"],
    };

    impl Step for ForgetfulStep {
        fn spec(&self) -> &'static StepSpec {
            &FORGETFUL_SPEC
        }
        fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
            normalize_config_as::<EmptyConfig>(raw)
        }
        fn run(&self, _ctx: &mut MapContext<'_>, _config: &Value) -> Result<(), StepError> {
            // Обещанный артефакт не публикуется
            Ok(())
        }
    }

    struct FailingStep;

    static FAILING_SPEC: StepSpec = StepSpec {
        id: "test/failing",
        phase: Phase::Foundation,
        requires: &[],
        provides: &[],
    };

    impl Step for FailingStep {
        fn spec(&self) -> &'static StepSpec {
            &FAILING_SPEC
        }
        fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
            normalize_config_as::<EmptyConfig>(raw)
        }
        fn run(&self, _ctx: &mut MapContext<'_>, _config: &Value) -> Result<(), StepError> {
            Err(StepError::Failed("boom".into()))
        }
    }

    fn run_single(step: Box<dyn Step>) -> Result<RunReport, MapGenError> {
        let id = step.spec().id;
        let mut registry = StepRegistry::default();
        registry.register(step);
        let recipe = Recipe::new("single").step(id);
        let plan = crate::pipeline::plan::compile(&recipe, &registry).unwrap();

        let params = WorldParams::new(1, 4, 3);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let mut ctx = MapContext::new(&params, &mut adapter);
        Executor::new(&registry).execute(&mut ctx, &plan)
    }

    #[test]
    fn unpublished_provides_fails_the_run() {
        let err = run_single(Box::new(ForgetfulStep)).unwrap_err();
        assert!(err.to_string().contains("test.promised"));
    }

    #[test]
    fn step_failure_aborts_with_step_id() {
        match run_single(Box::new(FailingStep)).unwrap_err() {
            MapGenError::Step { step_id, source } => {
                assert_eq!(step_id, "test/failing");
                assert!(source.to_string().contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
