// src/error.rs
//! Ошибки генерации
//!
//! Три различимых вида ошибок конвейера:
//! - ошибки компиляции плана (неизвестные ключи конфигурации, неудовлетворённые
//!   зависимости) — генерация не начинается;
//! - нарушения контрактов операций (неверная форма буфера) — фатальные ошибки
//!   программиста, повтор не поможет;
//! - обращение к неопубликованному артефакту — отличимо от остальных, чтобы
//!   вызывающий видел разницу между «неправильный порядок рецепта» и «плохие данные».

use thiserror::Error;

/// Одна проблема валидации конфигурации с точным структурным путём
/// (например `/steps/mountains/config/thresholds/extra`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ошибка компиляции плана исполнения. План не создаётся, ни один шаг не запускается.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("step `{0}` is not registered")]
    UnknownStep(String),

    #[error("step `{0}` appears more than once in the recipe")]
    DuplicateStep(String),

    #[error("step `{step_id}` requires `{tag}`, but no step in the recipe provides it")]
    MissingProvider { step_id: String, tag: String },

    #[error("tag `{tag}` is provided by both `{first}` and `{second}`")]
    DuplicateProvider {
        tag: String,
        first: String,
        second: String,
    },

    #[error("dependency cycle involving step `{0}`")]
    Cycle(String),

    /// Все проблемы конфигурации одного шага собираются вместе перед отчётом.
    #[error("invalid config for step `{step_id}`: {}", format_issues(issues))]
    InvalidConfig {
        step_id: String,
        issues: Vec<ConfigIssue>,
    },
}

/// Нарушение контракта операции во время исполнения (неверная форма входа или выхода).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("op `{op}`: field `{field}` has length {actual}, expected {expected}")]
    ShapeMismatch {
        op: &'static str,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("op `{op}`: {message}")]
    Invalid { op: &'static str, message: String },
}

/// Ошибка обращения к хранилищу артефактов.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArtifactError {
    /// Шаг читает артефакт, который никто не опубликовал (неправильный порядок рецепта).
    #[error("artifact `{0}` was never published")]
    Missing(&'static str),

    /// Публикация допускается не более одного раза за прогон.
    #[error("artifact `{0}` was already published")]
    AlreadyPublished(&'static str),

    #[error("artifact `{0}` was published with a different type")]
    TypeMismatch(&'static str),
}

/// Ошибка исполнения одного шага. Конвейер не пытается достроить частичную карту:
/// упавший шаг делает весь прогон недействительным.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Шаг объявил `provides`, но не опубликовал соответствующий артефакт.
    #[error("declared provides `{0}` was not published")]
    UnsatisfiedProvides(String),

    #[error("{0}")]
    Failed(String),
}

/// Итоговая ошибка генерации карты.
#[derive(Debug, Error)]
pub enum MapGenError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("step `{step_id}` failed: {source}")]
    Step {
        step_id: String,
        #[source]
        source: StepError,
    },
}
