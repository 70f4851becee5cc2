// src/lib.rs
//! # terraforge
//!
//! Детерминированный конвейер генерации карт для пошаговых стратегий.
//! Один и тот же сид и конфигурация дают побитово идентичную карту: высоты,
//! плиты, климат, биомы, реки, особенности и стартовые позиции.
//!
//! Конвейер собирается из шагов: рецепт перечисляет их, компилятор строит
//! зависимостно упорядоченный план и валидирует конфигурацию до запуска,
//! исполнитель ведёт прогон строго последовательно. Вся связь между шагами —
//! типизированные артефакты с публикацией не более одного раза.
//!
//! ## Пример
//! ```no_run
//! use terraforge::{generate, MockAdapter, WorldParams};
//!
//! let params = WorldParams::new(42, 84, 54);
//! let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
//! let result = generate(&params, &mut adapter).unwrap();
//! println!("{} стартов", result.starts.len());
//! ```

pub mod adapter;
pub mod config;
pub mod context;
pub mod ecology;
pub mod error;
pub mod foundation;
pub mod grid;
pub mod hydrology;
pub mod morphology;
pub mod noise;
pub mod pipeline;
pub mod placement;
pub mod preview;
pub mod recipes;
pub mod rng;
pub mod story;

pub use adapter::{FeatureType, HostAdapter, HostMapInfo, MockAdapter, TerrainType};
pub use config::{KnobPosture, Knobs, WorldParams};
pub use context::{MapContext, MapFields, Metrics};
pub use error::{CompileError, MapGenError, StepError};
pub use pipeline::{compile, Executor, Recipe, StepRegistry, StepResult};
pub use placement::{StartPosition, ARTIFACT_STARTS};
pub use recipes::{standard_recipe, standard_registry};

use placement::steps::StartPlacement;

/// Итог генерации: старты, целевые количества и результаты шагов.
#[derive(Debug, Clone)]
pub struct MapResult {
    pub starts: Vec<StartPosition>,
    pub natural_wonders: u32,
    pub resources: u32,
    pub step_results: Vec<StepResult>,
    /// Предупреждения диагностики (вырожденные карты и т.п.).
    pub warnings: Vec<String>,
}

/// Полный прогон стандартного рецепта.
///
/// Побочные эффекты пишутся в адаптер по ходу исполнения; явный результат —
/// список стартов и сводные количества.
pub fn generate(
    params: &WorldParams,
    adapter: &mut dyn HostAdapter,
) -> Result<MapResult, MapGenError> {
    let registry = standard_registry();
    let recipe = standard_recipe(params);
    let plan = compile(&recipe, &registry)?;

    let mut ctx = MapContext::new(params, adapter);
    let report = Executor::new(&registry).execute(&mut ctx, &plan)?;

    // Исполнитель проверил provides — артефакт размещения обязан существовать
    let placement = ctx
        .artifacts
        .get::<StartPlacement>(ARTIFACT_STARTS)
        .map_err(|source| MapGenError::Step {
            step_id: "placement/assign-starts".into(),
            source: source.into(),
        })?;

    Ok(MapResult {
        starts: placement.starts.clone(),
        natural_wonders: placement.natural_wonders,
        resources: placement.resources,
        step_results: report.step_results,
        warnings: ctx.metrics.warnings.clone(),
    })
}
