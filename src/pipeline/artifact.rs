// src/pipeline/artifact.rs
//! Хранилище артефактов
//!
//! Артефакт — неизменяемое значение, опубликованное не более одного раза за
//! прогон под стабильным строковым идентификатором (`"foundation.mesh"`).
//! Потребители читают по типу; чтение неопубликованного идентификатора даёт
//! отличимую ошибку `ArtifactError::Missing`.

use std::any::Any;
use std::collections::HashMap;

use crate::error::ArtifactError;

/// Реестр опубликованных значений одного прогона.
#[derive(Default)]
pub struct ArtifactStore {
    map: HashMap<&'static str, Box<dyn Any>>,
}

impl ArtifactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Публикует значение. Повторная публикация того же идентификатора — ошибка.
    pub fn publish<T: 'static>(&mut self, id: &'static str, value: T) -> Result<(), ArtifactError> {
        if self.map.contains_key(id) {
            return Err(ArtifactError::AlreadyPublished(id));
        }
        self.map.insert(id, Box::new(value));
        Ok(())
    }

    /// Читает опубликованное значение по типу.
    pub fn get<T: 'static>(&self, id: &'static str) -> Result<&T, ArtifactError> {
        let boxed = self.map.get(id).ok_or(ArtifactError::Missing(id))?;
        boxed
            .downcast_ref::<T>()
            .ok_or(ArtifactError::TypeMismatch(id))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.map.keys().collect();
        ids.sort_unstable();
        f.debug_struct("ArtifactStore").field("ids", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_get() {
        let mut store = ArtifactStore::new();
        store.publish("test.numbers", vec![1u32, 2, 3]).unwrap();
        let v: &Vec<u32> = store.get("test.numbers").unwrap();
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn missing_artifact_is_distinguishable() {
        let store = ArtifactStore::new();
        let err = store.get::<u32>("test.absent").unwrap_err();
        assert_eq!(err, ArtifactError::Missing("test.absent"));
    }

    #[test]
    fn double_publish_is_rejected() {
        let mut store = ArtifactStore::new();
        store.publish("test.once", 1u32).unwrap();
        let err = store.publish("test.once", 2u32).unwrap_err();
        assert_eq!(err, ArtifactError::AlreadyPublished("test.once"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut store = ArtifactStore::new();
        store.publish("test.typed", 1u32).unwrap();
        let err = store.get::<f32>("test.typed").unwrap_err();
        assert_eq!(err, ArtifactError::TypeMismatch("test.typed"));
    }
}
