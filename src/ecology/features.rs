// src/ecology/features.rs
//! Планирование особенностей
//!
//! Планирование отделено от применения: здесь только чистые функции, которые
//! по климату, биомам и рекам выдают взвешенные намерения `{x, y, feature,
//! weight}`. Легальность тайла проверяет отдельный шаг через предикат
//! адаптера — план можно тестировать вообще без хоста.

use serde::{Deserialize, Serialize};

use crate::adapter::FeatureType;
use crate::ecology::biomes::Biome;
use crate::grid::Dimensions;
use crate::hydrology::drainage::{RIVER_MAJOR, RIVER_MINOR};

/// Намерение поставить особенность с весом 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureIntent {
    pub x: u32,
    pub y: u32,
    pub feature: FeatureType,
    pub weight: f32,
}

/// План особенностей одной карты.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeaturePlan {
    pub intents: Vec<FeatureIntent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    /// Плотность лесов/тайги/джунглей 0..1.
    pub vegetation_density: f64,
    pub wetland_density: f64,
    pub reef_density: f64,
    /// Лёд ставится всюду, где есть морской лёд, если не приглушить.
    pub ice_density: f64,
    /// Температура воды, выше которой возможны рифы.
    pub reef_min_temp: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            vegetation_density: 0.6,
            wetland_density: 0.35,
            reef_density: 0.25,
            ice_density: 1.0,
            reef_min_temp: 14.0,
        }
    }
}

/// Вход планировщика: всё — плоские буферы, без адаптера и без контекста.
#[derive(Debug, Clone)]
pub struct FeatureInput {
    pub dims: Dimensions,
    pub land: Vec<u8>,
    pub biome: Vec<u8>,
    pub rainfall: Vec<u8>,
    pub temperature: Vec<f32>,
    pub river_class: Vec<u8>,
    pub sea_ice: Vec<u8>,
    pub shallow: Vec<u8>,
}

/// Растительность: лес по биому, вес — от влаги.
#[must_use]
pub fn plan_vegetation(input: &FeatureInput, cfg: &FeatureConfig) -> Vec<FeatureIntent> {
    let mut intents = Vec::new();
    let density = cfg.vegetation_density as f32;
    if density <= 0.0 {
        return intents;
    }
    for idx in 0..input.dims.size() {
        if input.land[idx] == 0 {
            continue;
        }
        let feature = match Biome::from_u8(input.biome[idx]) {
            Biome::TemperateForest => FeatureType::Forest,
            Biome::TropicalRainforest => FeatureType::Rainforest,
            Biome::Taiga => FeatureType::Taiga,
            _ => continue,
        };
        let (x, y) = input.dims.coords(idx);
        let wetness = f32::from(input.rainfall[idx]) / 200.0;
        intents.push(FeatureIntent {
            x,
            y,
            feature,
            weight: (density * (0.5 + wetness)).clamp(0.0, 1.0),
        });
    }
    intents
}

/// Влажные угодья: болота, поймы вдоль рек, оазисы в пустыне.
#[must_use]
pub fn plan_wetlands(input: &FeatureInput, cfg: &FeatureConfig) -> Vec<FeatureIntent> {
    let mut intents = Vec::new();
    let density = cfg.wetland_density as f32;
    if density <= 0.0 {
        return intents;
    }
    for idx in 0..input.dims.size() {
        if input.land[idx] == 0 {
            continue;
        }
        let (x, y) = input.dims.coords(idx);
        let biome = Biome::from_u8(input.biome[idx]);
        let on_river =
            input.river_class[idx] == RIVER_MINOR || input.river_class[idx] == RIVER_MAJOR;

        let intent = match biome {
            Biome::Swamp => Some((FeatureType::Marsh, density)),
            Biome::Desert if on_river => Some((FeatureType::Floodplain, density * 1.5)),
            Biome::Desert => Some((FeatureType::Oasis, density * 0.2)),
            Biome::Savanna | Biome::Grassland if on_river => {
                Some((FeatureType::Floodplain, density))
            }
            _ => None,
        };
        if let Some((feature, weight)) = intent {
            intents.push(FeatureIntent {
                x,
                y,
                feature,
                weight: weight.clamp(0.0, 1.0),
            });
        }
    }
    intents
}

/// Рифы на тёплом мелководье.
#[must_use]
pub fn plan_reefs(input: &FeatureInput, cfg: &FeatureConfig) -> Vec<FeatureIntent> {
    let mut intents = Vec::new();
    let density = cfg.reef_density as f32;
    if density <= 0.0 {
        return intents;
    }
    for idx in 0..input.dims.size() {
        if input.land[idx] != 0 || input.shallow[idx] == 0 {
            continue;
        }
        if f64::from(input.temperature[idx]) < cfg.reef_min_temp {
            continue;
        }
        let (x, y) = input.dims.coords(idx);
        intents.push(FeatureIntent {
            x,
            y,
            feature: FeatureType::Reef,
            weight: density,
        });
    }
    intents
}

/// Морской лёд поверх воды из криосферы.
#[must_use]
pub fn plan_ice(input: &FeatureInput, cfg: &FeatureConfig) -> Vec<FeatureIntent> {
    let mut intents = Vec::new();
    let density = cfg.ice_density as f32;
    if density <= 0.0 {
        return intents;
    }
    for idx in 0..input.dims.size() {
        if input.sea_ice[idx] == 0 {
            continue;
        }
        let (x, y) = input.dims.coords(idx);
        intents.push(FeatureIntent {
            x,
            y,
            feature: FeatureType::Ice,
            weight: density.clamp(0.0, 1.0),
        });
    }
    intents
}

/// Полный план: категории в фиксированном порядке.
#[must_use]
pub fn plan_features(input: &FeatureInput, cfg: &FeatureConfig) -> FeaturePlan {
    let mut intents = plan_vegetation(input, cfg);
    intents.extend(plan_wetlands(input, cfg));
    intents.extend(plan_reefs(input, cfg));
    intents.extend(plan_ice(input, cfg));
    FeaturePlan { intents }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::drainage::RIVER_NONE;

    fn input() -> FeatureInput {
        let dims = Dimensions::new(4, 1);
        FeatureInput {
            dims,
            land: vec![1, 1, 0, 0],
            biome: vec![
                Biome::TemperateForest.code(),
                Biome::Desert.code(),
                Biome::Marine.code(),
                Biome::Marine.code(),
            ],
            rainfall: vec![120, 10, 0, 0],
            temperature: vec![12.0, 30.0, 20.0, -10.0],
            river_class: vec![RIVER_NONE, RIVER_MINOR, RIVER_NONE, RIVER_NONE],
            sea_ice: vec![0, 0, 0, 1],
            shallow: vec![0, 0, 1, 1],
        }
    }

    #[test]
    fn vegetation_follows_biomes() {
        let intents = plan_vegetation(&input(), &FeatureConfig::default());
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].feature, FeatureType::Forest);
        assert_eq!(intents[0].x, 0);
    }

    #[test]
    fn river_in_desert_plans_a_floodplain() {
        let intents = plan_wetlands(&input(), &FeatureConfig::default());
        assert!(intents
            .iter()
            .any(|i| i.feature == FeatureType::Floodplain && i.x == 1));
    }

    #[test]
    fn reefs_require_warm_shallow_water() {
        let intents = plan_reefs(&input(), &FeatureConfig::default());
        // x=2 тёплое мелководье — риф; x=3 холодное — нет
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].x, 2);
    }

    #[test]
    fn ice_mirrors_the_cryosphere() {
        let intents = plan_ice(&input(), &FeatureConfig::default());
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].feature, FeatureType::Ice);
        assert_eq!(intents[0].x, 3);
    }

    #[test]
    fn weights_stay_in_range() {
        let plan = plan_features(&input(), &FeatureConfig::default());
        assert!(plan
            .intents
            .iter()
            .all(|i| (0.0..=1.0).contains(&i.weight)));
    }

    #[test]
    fn zero_density_disables_a_category() {
        let cfg = FeatureConfig {
            vegetation_density: 0.0,
            ..FeatureConfig::default()
        };
        assert!(plan_vegetation(&input(), &cfg).is_empty());
    }
}
