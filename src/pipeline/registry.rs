// src/pipeline/registry.rs
//! Реестр шагов

use std::collections::HashMap;

use crate::pipeline::step::Step;

/// Реестр всех известных шагов, из которых собираются рецепты.
#[derive(Default)]
pub struct StepRegistry {
    steps: HashMap<&'static str, Box<dyn Step>>,
}

impl StepRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует шаг. Повторная регистрация идентификатора — ошибка
    /// программиста при сборке реестра.
    pub fn register(&mut self, step: Box<dyn Step>) {
        let id = step.spec().id;
        let previous = self.steps.insert(id, step);
        debug_assert!(previous.is_none(), "step `{id}` registered twice");
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn Step> {
        self.steps.get(id).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
