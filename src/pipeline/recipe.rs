// src/pipeline/recipe.rs
//! Рецепты
//!
//! Рецепт — упорядоченный список шагов одного прогона; каждая ссылка на шаг
//! может нести переопределения конфигурации поверх значений по умолчанию.

use serde_json::Value;

/// Ссылка на шаг внутри рецепта.
#[derive(Debug, Clone)]
pub struct StepRef {
    pub step_id: String,
    /// Переопределения конфигурации (JSON-объект); `Null` — без переопределений.
    pub config: Value,
}

/// Упорядоченный список шагов с переопределениями.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: String,
    pub steps: Vec<StepRef>,
}

impl Recipe {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Добавляет шаг с конфигурацией по умолчанию.
    #[must_use]
    pub fn step(mut self, step_id: impl Into<String>) -> Self {
        self.steps.push(StepRef {
            step_id: step_id.into(),
            config: Value::Null,
        });
        self
    }

    /// Добавляет шаг с переопределениями конфигурации.
    #[must_use]
    pub fn step_with(mut self, step_id: impl Into<String>, config: Value) -> Self {
        self.steps.push(StepRef {
            step_id: step_id.into(),
            config,
        });
        self
    }
}
