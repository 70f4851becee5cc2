// src/pipeline/step.rs
//! Шаги конвейера
//!
//! Шаг — единица работы конвейера: объявляет фазу, требуемые и производимые
//! теги (включая артефакты с префиксом `artifact:`), схему конфигурации и тело
//! `run`. Схема выражена типизированной структурой serde: `deny_unknown_fields`
//! отбрасывает опечатки, `default` заполняет объявленные значения по умолчанию.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::context::MapContext;
use crate::error::{ConfigIssue, StepError};

/// Фаза генерации. Стадии группируют шаги по фазам стандартного рецепта.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Foundation,
    Morphology,
    Hydrology,
    Narrative,
    Ecology,
    Placement,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Foundation => "foundation",
            Phase::Morphology => "morphology",
            Phase::Hydrology => "hydrology",
            Phase::Narrative => "narrative",
            Phase::Ecology => "ecology",
            Phase::Placement => "placement",
        };
        f.write_str(name)
    }
}

/// Префикс тегов, которые обозначают публикуемый артефакт.
pub const ARTIFACT_TAG_PREFIX: &str = "artifact:";

/// Идентификатор артефакта из тега, если тег артефактный.
#[must_use]
pub fn artifact_id(tag: &str) -> Option<&str> {
    tag.strip_prefix(ARTIFACT_TAG_PREFIX)
}

/// Декларативная часть контракта шага.
#[derive(Debug, Clone, Copy)]
pub struct StepSpec {
    pub id: &'static str,
    pub phase: Phase,
    pub requires: &'static [&'static str],
    pub provides: &'static [&'static str],
}

/// Исполняемый шаг конвейера.
pub trait Step {
    fn spec(&self) -> &'static StepSpec;

    /// Нормализует сырую конфигурацию против схемы шага: рекурсивно заполняет
    /// значения по умолчанию и отбрасывает неизвестные ключи. Пути проблем
    /// относительны конфигурации шага (`/thresholds/extra`).
    fn normalize_config(&self, raw: &Value) -> Result<Value, Vec<ConfigIssue>>;

    fn run(&self, ctx: &mut MapContext<'_>, config: &Value) -> Result<(), StepError>;
}

/// Нормализация против типизированной схемы `C`.
///
/// Неизвестные ключи собираются все разом обходом по форме значения по
/// умолчанию; конверторные ошибки добавляет serde. Успех — каноничное
/// JSON-значение с заполненными значениями по умолчанию.
pub fn normalize_config_as<C>(raw: &Value) -> Result<Value, Vec<ConfigIssue>>
where
    C: DeserializeOwned + Serialize + Default,
{
    let mut raw = match raw {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };

    let mut issues = Vec::new();
    let shape =
        serde_json::to_value(C::default()).unwrap_or(Value::Object(serde_json::Map::new()));
    fill_envelope_defaults(&mut raw, &shape);
    collect_unknown_keys(&raw, &shape, "", &mut issues);

    match serde_json::from_value::<C>(raw) {
        Ok(config) if issues.is_empty() => {
            // Обратная сериализация даёт нормализованную форму с дефолтами
            serde_json::to_value(&config).map_err(|e| {
                vec![ConfigIssue {
                    path: String::new(),
                    message: e.to_string(),
                }]
            })
        }
        Ok(_) => Err(issues),
        Err(e) => {
            let message = e.to_string();
            // Дубликаты про неизвестные поля обход уже собрал
            if issues.is_empty() || !message.starts_with("unknown field") {
                issues.push(ConfigIssue {
                    path: String::new(),
                    message,
                });
            }
            Err(issues)
        }
    }
}

/// Разворачивает нормализованную конфигурацию в типизированную структуру шага.
///
/// После компиляции плана это не может провалиться иначе как из-за ошибки
/// программиста, поэтому расхождение — `StepError::Failed`.
pub fn parse_config<C: DeserializeOwned>(config: &Value) -> Result<C, StepError> {
    serde_json::from_value(config.clone())
        .map_err(|e| StepError::Failed(format!("config deserialization failed: {e}")))
}

/// Дозаполняет конверты стратегий: пропущенный `strategy` берётся из значения
/// по умолчанию, пропущенный `config` становится пустым объектом (его поля
/// заполнит serde). Без этого выбор стратегии требовал бы писать `config: {}`.
fn fill_envelope_defaults(raw: &mut Value, shape: &Value) {
    let (Value::Object(raw_map), Value::Object(shape_map)) = (raw, shape) else {
        return;
    };

    if shape_map.contains_key("strategy") {
        if !raw_map.contains_key("strategy") {
            if let Some(default_strategy) = shape_map.get("strategy") {
                raw_map.insert("strategy".into(), default_strategy.clone());
            }
        }
        raw_map
            .entry("config")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        return;
    }

    for (key, value) in raw_map {
        if let Some(shape_value) = shape_map.get(key) {
            fill_envelope_defaults(value, shape_value);
        }
    }
}

/// Обход «сырое значение против формы по умолчанию»: каждый ключ, которого нет
/// в форме, — неизвестный. Узлы-конверты стратегий (`{strategy, config}`)
/// проверяются только на состав верхних ключей: содержимое `config` зависит от
/// выбранной стратегии и валидируется serde при десериализации варианта.
fn collect_unknown_keys(raw: &Value, shape: &Value, path: &str, issues: &mut Vec<ConfigIssue>) {
    let (Value::Object(raw_map), Value::Object(shape_map)) = (raw, shape) else {
        return;
    };

    if shape_map.contains_key("strategy") {
        for key in raw_map.keys() {
            if key != "strategy" && key != "config" {
                issues.push(ConfigIssue {
                    path: format!("{path}/{key}"),
                    message: "unknown key (expected `strategy` or `config`)".into(),
                });
            }
        }
        return;
    }

    for (key, value) in raw_map {
        match shape_map.get(key) {
            Some(shape_value) => {
                collect_unknown_keys(value, shape_value, &format!("{path}/{key}"), issues);
            }
            None => issues.push(ConfigIssue {
                path: format!("{path}/{key}"),
                message: "unknown key".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct Inner {
        gate: f64,
    }

    impl Default for Inner {
        fn default() -> Self {
            Self { gate: 0.35 }
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct Sample {
        thresholds: Inner,
        iterations: Option<u32>,
    }

    #[test]
    fn empty_config_fills_defaults() {
        let normalized = normalize_config_as::<Sample>(&Value::Null).unwrap();
        assert_eq!(normalized["thresholds"]["gate"], json!(0.35));
    }

    #[test]
    fn unknown_keys_are_collected_with_paths() {
        let raw = json!({
            "thresholds": { "gate": 0.5, "extra": 1 },
            "bogus": true,
        });
        let issues = normalize_config_as::<Sample>(&raw).unwrap_err();
        let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"/thresholds/extra"));
        assert!(paths.contains(&"/bogus"));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let raw = json!({ "thresholds": { "gate": 0.9 } });
        let normalized = normalize_config_as::<Sample>(&raw).unwrap();
        assert_eq!(normalized["thresholds"]["gate"], json!(0.9));
    }
}
