// src/ecology/biomes.rs
//! Классификация биомов
//!
//! Табличная классификация по температуре, эффективной влаге и засушливости:
//! фиксированный упорядоченный набор биомов, пороги — конфигурация. Поверх
//! таблицы — ограниченная нарративная поправка: суша рядом с коридорами
//! получает небольшой бонус влаги, зажатый сверху.

use serde::{Deserialize, Serialize};

use crate::grid::{distance_field, Dimensions};

/// Биом тайла. Номера стабильны — это и есть пер-тайловый код буфера.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Biome {
    Marine = 0,
    Ice = 1,
    Tundra = 2,
    Taiga = 3,
    TemperateForest = 4,
    Grassland = 5,
    Swamp = 6,
    Savanna = 7,
    Desert = 8,
    TropicalRainforest = 9,
}

impl Biome {
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Biome::Ice,
            2 => Biome::Tundra,
            3 => Biome::Taiga,
            4 => Biome::TemperateForest,
            5 => Biome::Grassland,
            6 => Biome::Swamp,
            7 => Biome::Savanna,
            8 => Biome::Desert,
            9 => Biome::TropicalRainforest,
            _ => Biome::Marine,
        }
    }

    #[must_use]
    pub fn to_rgb(self) -> [u8; 3] {
        match self {
            Biome::Marine => [0, 64, 128],
            Biome::Ice => [220, 220, 255],
            Biome::Tundra => [200, 220, 180],
            Biome::Taiga => [100, 150, 100],
            Biome::TemperateForest => [60, 120, 60],
            Biome::Grassland => [150, 200, 100],
            Biome::Swamp => [80, 100, 60],
            Biome::Savanna => [200, 180, 100],
            Biome::Desert => [200, 180, 120],
            Biome::TropicalRainforest => [30, 100, 30],
        }
    }
}

/// Пороговые таблицы классификации.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BiomeThresholds {
    /// Ниже — вечный лёд.
    pub ice_temp: f64,
    pub tundra_temp: f64,
    pub boreal_temp: f64,
    /// Ниже — умеренный пояс, выше — тропики.
    pub temperate_temp: f64,
    /// Осадки ниже — сухая ветвь таблицы.
    pub dry_rainfall: f64,
    /// Осадки выше — влажная ветвь (болота, дождевые леса).
    pub wet_rainfall: f64,
    /// Засушливость выше — пустыня независимо от осадков.
    pub desert_aridity: f64,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        Self {
            ice_temp: -8.0,
            tundra_temp: -2.0,
            boreal_temp: 6.0,
            temperate_temp: 17.0,
            dry_rainfall: 50.0,
            wet_rainfall: 100.0,
            desert_aridity: 0.62,
        }
    }
}

/// Нарративная поправка: бонус влаги возле коридоров, жёстко ограниченный.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorridorNudge {
    /// Дальность действия поправки в шагах BFS от коридора.
    pub range: u32,
    pub rainfall_bonus: f64,
}

impl Default for CorridorNudge {
    fn default() -> Self {
        Self {
            range: 2,
            rainfall_bonus: 10.0,
        }
    }
}

/// Верхняя граница нарративного бонуса влаги.
pub const MAX_CORRIDOR_BONUS: f32 = 25.0;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BiomeConfig {
    pub thresholds: BiomeThresholds,
    pub corridor: CorridorNudge,
}

/// Карта биомов.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeMap {
    pub dims: Dimensions,
    pub data: Vec<Biome>,
}

/// Классификация одного тайла по пороговым таблицам.
#[must_use]
pub fn classify_tile(
    temperature: f32,
    rainfall: f32,
    aridity: f32,
    is_land: bool,
    t: &BiomeThresholds,
) -> Biome {
    if !is_land {
        return Biome::Marine;
    }
    if f64::from(temperature) < t.ice_temp {
        return Biome::Ice;
    }
    if f64::from(temperature) < t.tundra_temp {
        return Biome::Tundra;
    }
    if f64::from(temperature) < t.boreal_temp {
        return if f64::from(rainfall) < t.dry_rainfall {
            Biome::Tundra
        } else {
            Biome::Taiga
        };
    }
    if f64::from(temperature) < t.temperate_temp {
        if f64::from(rainfall) < t.dry_rainfall {
            Biome::Grassland
        } else if f64::from(rainfall) < t.wet_rainfall {
            Biome::TemperateForest
        } else {
            Biome::Swamp
        }
    } else if f64::from(aridity) > t.desert_aridity || f64::from(rainfall) < t.dry_rainfall {
        Biome::Desert
    } else if f64::from(rainfall) < t.wet_rainfall {
        Biome::Savanna
    } else {
        Biome::TropicalRainforest
    }
}

/// Эффективная влага с нарративной поправкой возле коридоров.
///
/// Бонус линейно затухает с расстоянием и зажат константой сверху — поправка
/// обязана оставаться поправкой, а не вторым климатом.
#[must_use]
pub fn effective_rainfall(
    rainfall: &[u8],
    corridor_mask: &[u8],
    dims: Dimensions,
    wrap_x: bool,
    nudge: &CorridorNudge,
) -> Vec<f32> {
    let mut effective: Vec<f32> = rainfall.iter().map(|&r| f32::from(r)).collect();
    if nudge.range == 0 || nudge.rainfall_bonus <= 0.0 {
        return effective;
    }
    let distance = distance_field(corridor_mask, dims, wrap_x);
    let bonus = (nudge.rainfall_bonus as f32).min(MAX_CORRIDOR_BONUS);
    for idx in 0..dims.size() {
        let d = distance[idx];
        if d == u16::MAX || u32::from(d) > nudge.range {
            continue;
        }
        let falloff = 1.0 - f32::from(d) / (nudge.range + 1) as f32;
        effective[idx] += bonus * falloff;
    }
    effective
}

/// Полная классификация карты.
#[must_use]
pub fn classify_biomes(
    dims: Dimensions,
    temperature: &[f32],
    effective_rainfall: &[f32],
    aridity: &[f32],
    land: &[u8],
    thresholds: &BiomeThresholds,
) -> BiomeMap {
    let data = (0..dims.size())
        .map(|i| {
            classify_tile(
                temperature[i],
                effective_rainfall[i],
                aridity[i],
                land[i] != 0,
                thresholds,
            )
        })
        .collect();
    BiomeMap { dims, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> BiomeThresholds {
        BiomeThresholds::default()
    }

    #[test]
    fn water_is_always_marine() {
        assert_eq!(classify_tile(25.0, 150.0, 0.1, false, &t()), Biome::Marine);
    }

    #[test]
    fn temperature_orders_the_cold_biomes() {
        assert_eq!(classify_tile(-15.0, 80.0, 0.1, true, &t()), Biome::Ice);
        assert_eq!(classify_tile(-5.0, 80.0, 0.1, true, &t()), Biome::Tundra);
        assert_eq!(classify_tile(0.0, 80.0, 0.1, true, &t()), Biome::Taiga);
    }

    #[test]
    fn moisture_splits_the_temperate_belt() {
        assert_eq!(classify_tile(10.0, 30.0, 0.3, true, &t()), Biome::Grassland);
        assert_eq!(
            classify_tile(10.0, 80.0, 0.3, true, &t()),
            Biome::TemperateForest
        );
        assert_eq!(classify_tile(10.0, 150.0, 0.3, true, &t()), Biome::Swamp);
    }

    #[test]
    fn aridity_overrides_rainfall_in_the_tropics() {
        assert_eq!(classify_tile(25.0, 80.0, 0.8, true, &t()), Biome::Desert);
        assert_eq!(classify_tile(25.0, 80.0, 0.3, true, &t()), Biome::Savanna);
        assert_eq!(
            classify_tile(25.0, 150.0, 0.3, true, &t()),
            Biome::TropicalRainforest
        );
    }

    #[test]
    fn corridor_bonus_is_local_and_clamped() {
        let dims = Dimensions::new(6, 1);
        let rainfall = vec![50u8; 6];
        let mask = vec![1, 0, 0, 0, 0, 0];
        let nudge = CorridorNudge {
            range: 2,
            rainfall_bonus: 1000.0,
        };
        let eff = effective_rainfall(&rainfall, &mask, dims, false, &nudge);
        // Бонус зажат константой и затухает с расстоянием
        assert!(eff[0] <= 50.0 + MAX_CORRIDOR_BONUS);
        assert!(eff[1] < eff[0]);
        assert!(eff[2] < eff[1]);
        // Вне дальности — чистый климат
        assert!((eff[4] - 50.0).abs() < 1e-6);
        assert!((eff[5] - 50.0).abs() < 1e-6);
    }

    #[test]
    fn biome_codes_roundtrip() {
        for code in 0..10u8 {
            assert_eq!(Biome::from_u8(code).code(), code);
        }
    }
}
