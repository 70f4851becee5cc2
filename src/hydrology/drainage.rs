// src/hydrology/drainage.rs
//! Сток и реки
//!
//! Детерминированный проход без итеративного решателя: каждому тайлу суши
//! выбирается приёмник по самому крутому спуску (8 соседей), затем сток
//! аккумулируется одним обратным проходом по убыванию высоты (редукция по
//! ориентированному ациклическому графу приёмников). Реки классифицируются
//! процентильными порогами по накопленному стоку с абсолютными полами.

use serde::{Deserialize, Serialize};

use crate::grid::{neighbor_index, Dimensions, DIRECTIONS_8};

pub const RIVER_NONE: u8 = 0;
pub const RIVER_MINOR: u8 = 1;
pub const RIVER_MAJOR: u8 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrainageConfig {
    pub minor_percentile: f64,
    pub major_percentile: f64,
    /// Абсолютный пол стока для малой реки.
    pub minor_floor: f64,
    pub major_floor: f64,
}

impl Default for DrainageConfig {
    fn default() -> Self {
        Self {
            minor_percentile: 0.85,
            major_percentile: 0.95,
            minor_floor: 2.0,
            major_floor: 4.0,
        }
    }
}

/// Результат дренажного прохода.
#[derive(Debug, Clone, PartialEq)]
pub struct Drainage {
    pub dims: Dimensions,
    /// Индекс приёмника; бессточный тайл указывает на себя.
    pub receiver: Vec<u32>,
    pub discharge: Vec<f32>,
    /// `RIVER_NONE` / `RIVER_MINOR` / `RIVER_MAJOR`.
    pub river_class: Vec<u8>,
}

/// Приёмник по самому крутому спуску. Вода — всегда собственный сток.
#[must_use]
pub fn compute_receivers(
    elevation: &[i16],
    land: &[u8],
    dims: Dimensions,
    wrap_x: bool,
) -> Vec<u32> {
    (0..dims.size())
        .map(|idx| {
            if land[idx] == 0 {
                return idx as u32;
            }
            let (x, y) = dims.coords(idx);
            let mut best = idx;
            let mut best_height = elevation[idx];
            for &(dx, dy) in &DIRECTIONS_8 {
                if let Some(nidx) = neighbor_index(dims, x, y, dx, dy, wrap_x) {
                    if elevation[nidx] < best_height {
                        best_height = elevation[nidx];
                        best = nidx;
                    }
                }
            }
            best as u32
        })
        .collect()
}

/// Аккумуляция стока: один проход по тайлам в порядке убывания высоты.
#[must_use]
pub fn accumulate_discharge(
    receiver: &[u32],
    elevation: &[i16],
    rainfall: &[u8],
    land: &[u8],
    dims: Dimensions,
) -> Vec<f32> {
    let size = dims.size();
    let mut discharge: Vec<f32> = (0..size)
        .map(|i| {
            if land[i] != 0 {
                f32::from(rainfall[i]) / 100.0
            } else {
                0.0
            }
        })
        .collect();

    // Стабильный порядок: по убыванию высоты, при равенстве — по индексу
    let mut order: Vec<usize> = (0..size).collect();
    order.sort_by_key(|&i| (std::cmp::Reverse(elevation[i]), i));

    for &idx in &order {
        let recv = receiver[idx] as usize;
        if recv != idx {
            discharge[recv] += discharge[idx];
        }
    }

    discharge
}

/// Процентильный порог по ближайшему рангу: `sorted[ceil(p*n) - 1]`.
fn nearest_rank(sorted: &[f32], percentile: f64) -> f32 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    let rank = (percentile * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// Классификация рек: процентильные пороги по стокам суши плюс абсолютные полы.
#[must_use]
pub fn classify_rivers(discharge: &[f32], land: &[u8], cfg: &DrainageConfig) -> Vec<u8> {
    let mut land_discharges: Vec<f32> = discharge
        .iter()
        .zip(land)
        .filter(|&(_, &l)| l != 0)
        .map(|(&d, _)| d)
        .collect();
    if land_discharges.is_empty() {
        return vec![RIVER_NONE; discharge.len()];
    }
    land_discharges.sort_by(|a, b| a.total_cmp(b));

    let minor_threshold = nearest_rank(&land_discharges, cfg.minor_percentile);
    let major_threshold = nearest_rank(&land_discharges, cfg.major_percentile);

    discharge
        .iter()
        .zip(land)
        .map(|(&d, &l)| {
            if l == 0 {
                RIVER_NONE
            } else if d >= major_threshold && d >= cfg.major_floor as f32 {
                RIVER_MAJOR
            } else if d >= minor_threshold && d >= cfg.minor_floor as f32 {
                RIVER_MINOR
            } else {
                RIVER_NONE
            }
        })
        .collect()
}

/// Полный дренажный проход.
#[must_use]
pub fn compute_drainage(
    elevation: &[i16],
    rainfall: &[u8],
    land: &[u8],
    dims: Dimensions,
    wrap_x: bool,
    cfg: &DrainageConfig,
) -> Drainage {
    let receiver = compute_receivers(elevation, land, dims, wrap_x);
    let discharge = accumulate_discharge(&receiver, elevation, rainfall, land, dims);
    let river_class = classify_rivers(&discharge, land, cfg);
    Drainage {
        dims,
        receiver,
        discharge,
        river_class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_accumulates_downhill() {
        // Полоса 3×1 с высотами [10, 5, 0] и равномерным дождём
        let dims = Dimensions::new(3, 1);
        let drainage = compute_drainage(
            &[10, 5, 0],
            &[100, 100, 100],
            &[1, 1, 1],
            dims,
            false,
            &DrainageConfig::default(),
        );
        assert!(drainage.discharge[2] >= drainage.discharge[0]);
        assert_eq!(drainage.receiver[0], 1);
        assert_eq!(drainage.receiver[1], 2);
        assert_eq!(drainage.receiver[2], 2, "lowest tile is its own sink");
    }

    #[test]
    fn river_percentiles_with_floors() {
        // Десять тайлов суши со стоками 0..9: вершина 5% — большая река,
        // следующий пояс — малая
        let discharge: Vec<f32> = (0..10).map(|d| d as f32).collect();
        let land = vec![1u8; 10];
        let classes = classify_rivers(&discharge, &land, &DrainageConfig::default());
        assert_eq!(classes[9], RIVER_MAJOR);
        assert_eq!(classes[8], RIVER_MINOR);
        for &c in &classes[..8] {
            assert_eq!(c, RIVER_NONE);
        }
    }

    #[test]
    fn floors_suppress_tiny_rivers() {
        let discharge = vec![0.0, 0.1, 0.2, 0.3];
        let land = vec![1u8; 4];
        let classes = classify_rivers(&discharge, &land, &DrainageConfig::default());
        // Проценты прошли бы, но абсолютные полы — нет
        assert!(classes.iter().all(|&c| c == RIVER_NONE));
    }

    #[test]
    fn water_tiles_never_carry_rivers() {
        let dims = Dimensions::new(2, 1);
        let drainage = compute_drainage(
            &[100, -50],
            &[200, 200],
            &[1, 0],
            dims,
            false,
            &DrainageConfig::default(),
        );
        assert_eq!(drainage.river_class[1], RIVER_NONE);
        // Сток суши утекает в водный приёмник
        assert_eq!(drainage.receiver[0], 1);
    }

    #[test]
    fn all_water_map_is_riverless() {
        let dims = Dimensions::new(4, 3);
        let size = dims.size();
        let drainage = compute_drainage(
            &vec![-100; size],
            &vec![100; size],
            &vec![0; size],
            dims,
            true,
            &DrainageConfig::default(),
        );
        assert!(drainage.river_class.iter().all(|&c| c == RIVER_NONE));
        assert!(drainage.discharge.iter().all(|&d| d == 0.0));
    }
}
