// src/adapter.rs
//! Граница хостового движка
//!
//! Ядро никогда не обращается к движку напрямую — только через этот адаптер.
//! Интерфейс даёт тайловые чтения/записи, детерминированный `random(max, label)`
//! и метаданные карты. Благодаря границе весь конвейер тестируется без хоста
//! через `MockAdapter`.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::Dimensions;
use crate::rng::StreamRng;

/// Тип поверхности тайла в терминах хоста.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TerrainType {
    Ocean = 0,
    Coast = 1,
    Flat = 2,
    Hills = 3,
    Mountain = 4,
}

impl TerrainType {
    #[must_use]
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => TerrainType::Coast,
            2 => TerrainType::Flat,
            3 => TerrainType::Hills,
            4 => TerrainType::Mountain,
            _ => TerrainType::Ocean,
        }
    }

    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(self, TerrainType::Ocean | TerrainType::Coast)
    }
}

/// Особенность тайла (лес, риф, лёд и т.п.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    Forest,
    Rainforest,
    Taiga,
    Marsh,
    Floodplain,
    Oasis,
    Reef,
    Ice,
}

impl FeatureType {
    /// Числовой код для пер-тайлового буфера (`-1` — особенности нет).
    #[must_use]
    pub fn code(self) -> i16 {
        match self {
            FeatureType::Forest => 0,
            FeatureType::Rainforest => 1,
            FeatureType::Taiga => 2,
            FeatureType::Marsh => 3,
            FeatureType::Floodplain => 4,
            FeatureType::Oasis => 5,
            FeatureType::Reef => 6,
            FeatureType::Ice => 7,
        }
    }
}

/// Метаданные карты от хоста: целевые количества для фазы размещения.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HostMapInfo {
    /// Игроки на первом (западном) массиве суши.
    pub players_landmass_1: u32,
    /// Игроки на втором (восточном) массиве суши.
    pub players_landmass_2: u32,
    /// Базовое количество природных чудес (до переопределений).
    pub natural_wonders: u32,
    /// Базовая цель по стратегическим ресурсам.
    pub resources: u32,
}

impl Default for HostMapInfo {
    fn default() -> Self {
        Self {
            players_landmass_1: 4,
            players_landmass_2: 4,
            natural_wonders: 5,
            resources: 24,
        }
    }
}

/// Возможности хостового движка, доступные ядру.
pub trait HostAdapter {
    fn dims(&self) -> Dimensions;

    fn terrain(&self, x: u32, y: u32) -> TerrainType;
    fn is_water(&self, x: u32, y: u32) -> bool;
    fn elevation(&self, x: u32, y: u32) -> i32;

    fn set_terrain(&mut self, x: u32, y: u32, terrain: TerrainType);
    fn set_elevation(&mut self, x: u32, y: u32, elevation: i32);
    fn set_rainfall(&mut self, x: u32, y: u32, rainfall: u8);
    fn set_biome(&mut self, x: u32, y: u32, biome: u8);
    fn set_feature(&mut self, x: u32, y: u32, feature: FeatureType);

    /// Может ли тайл легально нести особенность — правила хоста.
    fn can_place_feature(&self, x: u32, y: u32, feature: FeatureType) -> bool;

    /// Детерминированный источник случайности хоста: метка плюс счётчик
    /// вызовов дают воспроизводимую последовательность.
    fn random(&mut self, max: u32, label: &str) -> u32;

    fn map_info(&self) -> HostMapInfo;
}

/// Адаптер-заглушка на собственных буферах — для тестов и CLI.
///
/// Стартовое состояние: сплошной океан, нулевые высоты.
pub struct MockAdapter {
    dims: Dimensions,
    terrain: Vec<u8>,
    elevation: Vec<i32>,
    rainfall: Vec<u8>,
    biome: Vec<u8>,
    feature: Vec<i16>,
    rng: StreamRng,
    call_counts: HashMap<String, u32>,
    info: HostMapInfo,
}

impl MockAdapter {
    #[must_use]
    pub fn new(dims: Dimensions, seed: u64) -> Self {
        let size = dims.size();
        Self {
            dims,
            terrain: vec![TerrainType::Ocean as u8; size],
            elevation: vec![0; size],
            rainfall: vec![0; size],
            biome: vec![0; size],
            feature: vec![-1; size],
            rng: StreamRng::new(seed),
            call_counts: HashMap::new(),
            info: HostMapInfo::default(),
        }
    }

    #[must_use]
    pub fn with_map_info(mut self, info: HostMapInfo) -> Self {
        self.info = info;
        self
    }

    #[must_use]
    pub fn rainfall(&self, x: u32, y: u32) -> u8 {
        self.rainfall[self.dims.index(x, y)]
    }

    #[must_use]
    pub fn biome(&self, x: u32, y: u32) -> u8 {
        self.biome[self.dims.index(x, y)]
    }

    #[must_use]
    pub fn feature(&self, x: u32, y: u32) -> i16 {
        self.feature[self.dims.index(x, y)]
    }
}

impl HostAdapter for MockAdapter {
    fn dims(&self) -> Dimensions {
        self.dims
    }

    fn terrain(&self, x: u32, y: u32) -> TerrainType {
        TerrainType::from_u8(self.terrain[self.dims.index(x, y)])
    }

    fn is_water(&self, x: u32, y: u32) -> bool {
        self.terrain(x, y).is_water()
    }

    fn elevation(&self, x: u32, y: u32) -> i32 {
        self.elevation[self.dims.index(x, y)]
    }

    fn set_terrain(&mut self, x: u32, y: u32, terrain: TerrainType) {
        let idx = self.dims.index(x, y);
        self.terrain[idx] = terrain as u8;
    }

    fn set_elevation(&mut self, x: u32, y: u32, elevation: i32) {
        let idx = self.dims.index(x, y);
        self.elevation[idx] = elevation;
    }

    fn set_rainfall(&mut self, x: u32, y: u32, rainfall: u8) {
        let idx = self.dims.index(x, y);
        self.rainfall[idx] = rainfall;
    }

    fn set_biome(&mut self, x: u32, y: u32, biome: u8) {
        let idx = self.dims.index(x, y);
        self.biome[idx] = biome;
    }

    fn set_feature(&mut self, x: u32, y: u32, feature: FeatureType) {
        let idx = self.dims.index(x, y);
        self.feature[idx] = feature.code();
    }

    fn can_place_feature(&self, x: u32, y: u32, feature: FeatureType) -> bool {
        // Правила заглушки: водные особенности — только на воде, прочие — на суше,
        // и тайл должен быть свободен.
        if self.feature(x, y) >= 0 {
            return false;
        }
        let water = self.is_water(x, y);
        match feature {
            FeatureType::Reef | FeatureType::Ice => water,
            _ => !water,
        }
    }

    fn random(&mut self, max: u32, label: &str) -> u32 {
        if max == 0 {
            return 0;
        }
        let count = self.call_counts.entry(label.to_string()).or_insert(0);
        let call = *count;
        *count += 1;
        let mut stream = self.rng.stream(label, &call.to_string());
        stream.gen_range(0..max)
    }

    fn map_info(&self) -> HostMapInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_starts_as_open_ocean() {
        let adapter = MockAdapter::new(Dimensions::new(4, 3), 1);
        for y in 0..3 {
            for x in 0..4 {
                assert!(adapter.is_water(x, y));
            }
        }
    }

    #[test]
    fn random_is_deterministic_per_label() {
        let mut a = MockAdapter::new(Dimensions::new(2, 2), 9);
        let mut b = MockAdapter::new(Dimensions::new(2, 2), 9);
        let seq_a: Vec<u32> = (0..8).map(|_| a.random(100, "test")).collect();
        let seq_b: Vec<u32> = (0..8).map(|_| b.random(100, "test")).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn feature_legality_follows_water_mask() {
        let mut adapter = MockAdapter::new(Dimensions::new(2, 1), 1);
        adapter.set_terrain(0, 0, TerrainType::Flat);
        assert!(adapter.can_place_feature(0, 0, FeatureType::Forest));
        assert!(!adapter.can_place_feature(0, 0, FeatureType::Reef));
        assert!(adapter.can_place_feature(1, 0, FeatureType::Ice));
        adapter.set_feature(1, 0, FeatureType::Ice);
        assert!(!adapter.can_place_feature(1, 0, FeatureType::Reef));
    }
}
