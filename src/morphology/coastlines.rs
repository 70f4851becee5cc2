// src/morphology/coastlines.rs
//! Очистка береговой линии
//!
//! Финальный морфологический проход: засев мелких островов в открытом океане,
//! заполнение одиночных «прудов» внутри суши и выделение шельфа — водных
//! тайлов в пределах прибрежной полосы. Работает на маске суши после гор,
//! чтобы острова оставались равнинными.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{distance_field, neighbor_index, Dimensions, DIRECTIONS_4};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoastlineConfig {
    /// Вероятность засева острова на подходящий океанский тайл 0..1.
    pub island_density: f64,
    /// Минимальное BFS-расстояние от берега для засева острова.
    pub min_ocean_distance: u32,
    /// Ширина шельфовой полосы в шагах от суши.
    pub shelf_width: u32,
    /// Превращать ли одиночные водные тайлы внутри суши в сушу.
    pub fill_ponds: bool,
}

impl Default for CoastlineConfig {
    fn default() -> Self {
        Self {
            island_density: 0.02,
            min_ocean_distance: 4,
            shelf_width: 2,
            fill_ponds: true,
        }
    }
}

/// Итог береговой фазы: финальная маска суши и производные от неё поля.
#[derive(Debug, Clone, PartialEq)]
pub struct Coastline {
    pub dims: Dimensions,
    pub land: Vec<u8>,
    /// Шаги BFS до ближайшей суши (0 на самой суше).
    pub coastal_distance: Vec<u16>,
    /// Маска шельфа: вода в пределах `shelf_width` шагов от суши.
    pub shallow: Vec<u8>,
    pub islands_seeded: u32,
    pub ponds_filled: u32,
}

/// Засевает острова в открытом океане. Возвращает индексы новых тайлов суши.
pub fn seed_islands(
    land: &mut [u8],
    coastal_distance: &[u16],
    dims: Dimensions,
    config: &CoastlineConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<usize> {
    let mut seeded = Vec::new();
    if config.island_density <= 0.0 {
        return seeded;
    }
    for idx in 0..dims.size() {
        if land[idx] != 0 {
            continue;
        }
        if u32::from(coastal_distance[idx]) < config.min_ocean_distance {
            continue;
        }
        if rng.gen_range(0.0..1.0) < config.island_density {
            land[idx] = 1;
            seeded.push(idx);
        }
    }
    seeded
}

/// Заполняет одиночные водные тайлы, все ортогональные соседи которых — суша.
pub fn fill_ponds(land: &mut [u8], dims: Dimensions, wrap_x: bool) -> u32 {
    let mut filled = 0;
    for idx in 0..dims.size() {
        if land[idx] != 0 {
            continue;
        }
        let (x, y) = dims.coords(idx);
        let enclosed = DIRECTIONS_4.iter().all(|&(dx, dy)| {
            neighbor_index(dims, x, y, dx, dy, wrap_x).map_or(true, |nidx| land[nidx] != 0)
        });
        if enclosed {
            land[idx] = 1;
            filled += 1;
        }
    }
    filled
}

/// Собирает финальный результат по обновлённой маске суши.
#[must_use]
pub fn build_coastline(
    land: Vec<u8>,
    dims: Dimensions,
    wrap_x: bool,
    shelf_width: u32,
    islands_seeded: u32,
    ponds_filled: u32,
) -> Coastline {
    let coastal_distance = distance_field(&land, dims, wrap_x);
    let shallow: Vec<u8> = coastal_distance
        .iter()
        .zip(&land)
        .map(|(&d, &l)| u8::from(l == 0 && u32::from(d) <= shelf_width))
        .collect();

    Coastline {
        dims,
        land,
        coastal_distance,
        shallow,
        islands_seeded,
        ponds_filled,
    }
}
