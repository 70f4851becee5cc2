// src/config.rs
//! Конфигурация генерации мира
//!
//! Этот модуль определяет внешнюю поверхность конфигурации:
//! - параметры прогона (сид, размеры, широтные границы, цилиндричность);
//! - грубые «ручки» (уровень моря, эрозия, вулканизм: low/normal/high),
//!   детерминированно преобразующиеся в тонкую конфигурацию стратегий;
//! - переопределения конфигурации отдельных шагов.
//!
//! Все структуры поддерживают сериализацию в TOML/JSON. Неизвестные ключи
//! отклоняются на этапе компиляции плана, у каждого листа есть значение по
//! умолчанию.

use std::collections::BTreeMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::grid::Dimensions;

/// Положение грубой ручки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KnobPosture {
    Low,
    #[default]
    Normal,
    High,
}

/// Грубые пользовательские ручки. Каждая детерминированно масштабирует
/// тонкую конфигурацию стратегий при сборке стандартного рецепта.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Knobs {
    pub sea_level: KnobPosture,
    pub erosion: KnobPosture,
    pub volcanism: KnobPosture,
}

impl Knobs {
    /// Целевая доля суши: низкий уровень моря обнажает больше суши.
    #[must_use]
    pub fn target_land_fraction(&self) -> f64 {
        match self.sea_level {
            KnobPosture::Low => 0.38,
            KnobPosture::Normal => 0.32,
            KnobPosture::High => 0.26,
        }
    }

    /// Радиус сглаживания рельефа: сильная эрозия — более гладкие бассейны.
    #[must_use]
    pub fn smooth_radius(&self) -> u32 {
        match self.erosion {
            KnobPosture::Low => 0,
            KnobPosture::Normal => 1,
            KnobPosture::High => 2,
        }
    }

    /// Множитель вулканической активности тектоники.
    #[must_use]
    pub fn volcanism_scale(&self) -> f64 {
        match self.volcanism {
            KnobPosture::Low => 0.6,
            KnobPosture::Normal => 1.0,
            KnobPosture::High => 1.5,
        }
    }
}

/// Широтные границы карты в градусах.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatitudeBounds {
    pub south: f64,
    pub north: f64,
}

impl Default for LatitudeBounds {
    fn default() -> Self {
        Self {
            south: -80.0,
            north: 80.0,
        }
    }
}

/// Основные параметры одного прогона генерации.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    pub seed: u64,

    /// Ширина карты в тайлах (по умолчанию 84)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота карты в тайлах (по умолчанию 54)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Цилиндрическая карта: X зацикливается (по умолчанию включено)
    #[serde(default = "default_wrap_x")]
    pub wrap_x: bool,

    /// Широтные границы (по умолчанию ±80°)
    #[serde(default)]
    pub latitude: LatitudeBounds,

    /// Грубые ручки генерации
    #[serde(default)]
    pub knobs: Knobs,

    /// Переопределения конфигурации шагов: идентификатор шага → JSON-объект.
    /// Применяются поверх значений, выведенных из ручек.
    #[serde(default)]
    pub overrides: BTreeMap<String, serde_json::Value>,
}

fn default_width() -> u32 {
    84
}
fn default_height() -> u32 {
    54
}
fn default_wrap_x() -> bool {
    true
}

impl WorldParams {
    #[must_use]
    pub fn new(seed: u64, width: u32, height: u32) -> Self {
        Self {
            seed,
            width,
            height,
            wrap_x: true,
            latitude: LatitudeBounds::default(),
            knobs: Knobs::default(),
            overrides: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Загружает параметры из TOML-файла.
    ///
    /// # Пример
    /// ```toml
    /// # world.toml
    /// seed = 42
    /// width = 84
    /// height = 54
    ///
    /// [knobs]
    /// sea_level = "high"
    /// ```
    pub fn from_toml_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        Ok(params)
    }
}

impl Default for WorldParams {
    fn default() -> Self {
        Self::new(0, default_width(), default_height())
    }
}
