// src/pipeline/mod.rs
//! Движок конвейера
//!
//! Рецепт объявляет список шагов; компилятор превращает его в зависимостно
//! упорядоченный план над типизированными артефактами; исполнитель запускает
//! план строго последовательно. Контракты операций валидируют вход, выход и
//! конфигурацию каждого подключаемого алгоритма.

pub mod artifact;
pub mod executor;
pub mod op;
pub mod plan;
pub mod recipe;
pub mod registry;
pub mod step;

pub use artifact::ArtifactStore;
pub use executor::{Executor, RunReport, StepResult};
pub use plan::{compile, ExecutionPlan, PlanNode};
pub use recipe::{Recipe, StepRef};
pub use registry::StepRegistry;
pub use step::{artifact_id, Phase, Step, StepSpec};
