// src/pipeline/plan.rs
//! Компилятор плана исполнения
//!
//! Превращает рецепт и реестр шагов в упорядоченный план или ошибку компиляции.
//! Теги `requires`/`provides` образуют граф зависимостей; топологическая
//! сортировка устойчива — при прочих равных сохраняется порядок рецепта, никогда
//! порядок хеш-таблицы. Конфигурация каждого шага нормализуется строго до
//! запуска: дефолты заполняются, неизвестные ключи отклоняются с точным путём.

use std::collections::{BTreeSet, HashMap};

use petgraph::graphmap::DiGraphMap;
use serde_json::Value;

use crate::error::CompileError;
use crate::pipeline::recipe::Recipe;
use crate::pipeline::registry::StepRegistry;
use crate::pipeline::step::Phase;

/// Узел скомпилированного плана: шаг с нормализованной конфигурацией.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub step_id: String,
    pub phase: Phase,
    pub config: Value,
}

/// Упорядоченный план, удовлетворяющий все зависимости рецепта.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub recipe_id: String,
    pub nodes: Vec<PlanNode>,
}

/// Компилирует рецепт. Структурные ошибки прерывают компиляцию сразу;
/// проблемы конфигурации одного шага собираются все вместе.
pub fn compile(recipe: &Recipe, registry: &StepRegistry) -> Result<ExecutionPlan, CompileError> {
    // === 1. Разрешение шагов ===
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut steps = Vec::with_capacity(recipe.steps.len());
    for step_ref in &recipe.steps {
        let step = registry
            .get(&step_ref.step_id)
            .ok_or_else(|| CompileError::UnknownStep(step_ref.step_id.clone()))?;
        if !seen.insert(step.spec().id) {
            return Err(CompileError::DuplicateStep(step_ref.step_id.clone()));
        }
        steps.push(step);
    }

    // === 2. Нормализация конфигураций ===
    let mut configs = Vec::with_capacity(steps.len());
    for (step, step_ref) in steps.iter().zip(&recipe.steps) {
        match step.normalize_config(&step_ref.config) {
            Ok(normalized) => configs.push(normalized),
            Err(issues) => {
                let step_id = step.spec().id;
                return Err(CompileError::InvalidConfig {
                    step_id: step_id.to_string(),
                    issues: issues
                        .into_iter()
                        .map(|mut issue| {
                            issue.path = format!("/steps/{step_id}/config{}", issue.path);
                            issue
                        })
                        .collect(),
                });
            }
        }
    }

    // === 3. Единственный поставщик на тег ===
    let mut provider_of: HashMap<&'static str, usize> = HashMap::new();
    for (i, step) in steps.iter().enumerate() {
        for &tag in step.spec().provides {
            if let Some(&first) = provider_of.get(tag) {
                return Err(CompileError::DuplicateProvider {
                    tag: tag.to_string(),
                    first: steps[first].spec().id.to_string(),
                    second: step.spec().id.to_string(),
                });
            }
            provider_of.insert(tag, i);
        }
    }

    // === 4. Рёбра поставщик → потребитель ===
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for i in 0..steps.len() {
        graph.add_node(i);
    }
    for (i, step) in steps.iter().enumerate() {
        for &tag in step.spec().requires {
            let Some(&provider) = provider_of.get(tag) else {
                return Err(CompileError::MissingProvider {
                    step_id: step.spec().id.to_string(),
                    tag: tag.to_string(),
                });
            };
            if provider == i {
                // Шаг требует собственный тег — зависимость неразрешима
                return Err(CompileError::Cycle(step.spec().id.to_string()));
            }
            graph.add_edge(provider, i, ());
        }
    }

    // === 5. Устойчивая топологическая сортировка (Кан) ===
    // Готовые узлы выбираются в порядке рецепта, а не в порядке итерации графа.
    let mut indegree = vec![0usize; steps.len()];
    for (_, to, ()) in graph.all_edges() {
        indegree[to] += 1;
    }
    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(steps.len());
    while let Some(&next) = ready.iter().next() {
        ready.remove(&next);
        order.push(next);
        for succ in graph.neighbors_directed(next, petgraph::Direction::Outgoing) {
            indegree[succ] -= 1;
            if indegree[succ] == 0 {
                ready.insert(succ);
            }
        }
    }

    if order.len() < steps.len() {
        let stuck = (0..steps.len())
            .find(|i| !order.contains(i))
            .map(|i| steps[i].spec().id.to_string())
            .unwrap_or_default();
        return Err(CompileError::Cycle(stuck));
    }

    let nodes = order
        .into_iter()
        .map(|i| PlanNode {
            step_id: steps[i].spec().id.to_string(),
            phase: steps[i].spec().phase,
            config: configs[i].clone(),
        })
        .collect();

    Ok(ExecutionPlan {
        recipe_id: recipe.id.clone(),
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::context::MapContext;
    use crate::error::{ConfigIssue, StepError};
    use crate::pipeline::step::{normalize_config_as, Step, StepSpec};

    #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct EmptyConfig {}

    struct TestStep(&'static StepSpec);

    impl Step for TestStep {
        fn spec(&self) -> &'static StepSpec {
            self.0
        }
        fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>> {
            normalize_config_as::<EmptyConfig>(raw)
        }
        fn run(&self, ctx: &mut MapContext<'_>, _config: &Value) -> Result<(), StepError> {
            for &tag in self.0.provides {
                if let Some(id) = crate::pipeline::step::artifact_id(tag) {
                    ctx.artifacts.publish(id, 0u8)?;
                }
            }
            Ok(())
        }
    }

    static SPEC_A: StepSpec = StepSpec {
        id: "test/a",
        phase: Phase::Foundation,
        requires: &[],
        provides: &["artifact:test.a"],
    };
    static SPEC_B: StepSpec = StepSpec {
        id: "test/b",
        phase: Phase::Foundation,
        requires: &["artifact:test.a"],
        provides: &["artifact:test.b"],
    };
    static SPEC_C: StepSpec = StepSpec {
        id: "test/c",
        phase: Phase::Foundation,
        requires: &["artifact:test.b"],
        provides: &[],
    };

    fn registry() -> StepRegistry {
        let mut registry = StepRegistry::new();
        registry.register(Box::new(TestStep(&SPEC_A)));
        registry.register(Box::new(TestStep(&SPEC_B)));
        registry.register(Box::new(TestStep(&SPEC_C)));
        registry
    }

    fn position(plan: &ExecutionPlan, id: &str) -> usize {
        plan.nodes.iter().position(|n| n.step_id == id).unwrap()
    }

    #[test]
    fn any_recipe_permutation_orders_dependencies() {
        let registry = registry();
        let permutations = [
            ["test/a", "test/b", "test/c"],
            ["test/c", "test/b", "test/a"],
            ["test/b", "test/c", "test/a"],
        ];
        for ids in permutations {
            let mut recipe = Recipe::new("perm");
            for id in ids {
                recipe = recipe.step(id);
            }
            let plan = compile(&recipe, &registry).unwrap();
            assert!(position(&plan, "test/a") < position(&plan, "test/b"));
            assert!(position(&plan, "test/b") < position(&plan, "test/c"));
        }
    }

    #[test]
    fn missing_provider_is_a_compile_error() {
        let registry = registry();
        let recipe = Recipe::new("partial").step("test/b");
        let err = compile(&recipe, &registry).unwrap_err();
        assert!(matches!(err, CompileError::MissingProvider { .. }));
    }

    #[test]
    fn unknown_step_is_a_compile_error() {
        let registry = registry();
        let recipe = Recipe::new("typo").step("test/z");
        assert!(matches!(
            compile(&recipe, &registry).unwrap_err(),
            CompileError::UnknownStep(_)
        ));
    }

    #[test]
    fn duplicate_step_is_a_compile_error() {
        let registry = registry();
        let recipe = Recipe::new("twice").step("test/a").step("test/a");
        assert!(matches!(
            compile(&recipe, &registry).unwrap_err(),
            CompileError::DuplicateStep(_)
        ));
    }

    #[test]
    fn config_issue_paths_carry_the_step_prefix() {
        let registry = registry();
        let recipe =
            Recipe::new("bad").step_with("test/a", json!({ "bogus": 1 }));
        let err = compile(&recipe, &registry).unwrap_err();
        assert!(err
            .to_string()
            .contains("/steps/test/a/config/bogus"));
    }
}
