// src/morphology/landmass.rs
//! Выделение суши
//!
//! Суша — это рельеф 0..1 с порогом `SEA_LEVEL`: кора и тектоника лишь
//! формируют рельеф, а сам порог подгоняется перебором сдвига под целевую долю
//! суши. После порога считается маска суши и BFS-расстояние до береговой линии.
//! Операция чистая: весь вход — плоские буферы, никакого контекста.

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::foundation::crust::CRUST_CONTINENTAL;
use crate::grid::{distance_field, neighbor_index, smooth_field, Dimensions, DIRECTIONS_4};
use crate::noise::fractal_field;
use crate::pipeline::op::{expect_len, Operation, Strategy};

/// Уровень моря в нормированном рельефе.
pub const SEA_LEVEL: f32 = 0.5;

/// Вход операции: пер-тайловые проекции полей фундамента.
#[derive(Debug, Clone)]
pub struct LandmassInput {
    pub dims: Dimensions,
    pub wrap_x: bool,
    pub noise_seed: i32,
    /// Тип коры на тайл (0 — океаническая, 1 — континентальная).
    pub crust_kind: Vec<u8>,
    /// Тектонический подъём на тайл 0..1.
    pub uplift: Vec<f32>,
}

/// Результат выделения суши.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmass {
    pub dims: Dimensions,
    /// Рельеф 0..1, уровень моря — `SEA_LEVEL`.
    pub elevation: Vec<f32>,
    /// Маска суши: 1 — суша, 0 — вода.
    pub land: Vec<u8>,
    /// Шаги BFS до ближайшей береговой линии (`u16::MAX` — берега нет).
    pub coastal_distance: Vec<u16>,
    pub land_fraction: f32,
}

/// Стратегии выделения суши. Значение конфигурации и есть выбранная стратегия.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "config", rename_all = "kebab-case")]
pub enum LandmassStrategy {
    /// Рельеф от коры и тектоники: континентальная кора выше, подъём добавляет.
    Plate(PlateLandmass),
    /// Чисто фрактальный рельеф, кора игнорируется.
    Fractal(FractalLandmass),
}

impl Default for LandmassStrategy {
    fn default() -> Self {
        Self::Plate(PlateLandmass::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlateLandmass {
    pub target_land_fraction: f64,
    /// Базовая высота континентальной коры.
    pub continental_base: f64,
    pub oceanic_base: f64,
    pub uplift_weight: f64,
    pub noise_weight: f64,
    pub noise_frequency: f64,
    pub noise_octaves: u32,
    pub smooth_radius: u32,
}

impl Default for PlateLandmass {
    fn default() -> Self {
        Self {
            target_land_fraction: 0.32,
            continental_base: 0.62,
            oceanic_base: 0.36,
            uplift_weight: 0.22,
            noise_weight: 0.28,
            noise_frequency: 0.03,
            noise_octaves: 4,
            smooth_radius: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FractalLandmass {
    pub target_land_fraction: f64,
    pub frequency: f64,
    pub octaves: u32,
    /// Доля мелких островов 0..1; при нуле слой не накладывается.
    pub island_density: f64,
    pub smooth_radius: u32,
}

impl Default for FractalLandmass {
    fn default() -> Self {
        Self {
            target_land_fraction: 0.32,
            frequency: 0.005,
            octaves: 5,
            island_density: 0.0,
            smooth_radius: 1,
        }
    }
}

impl Strategy for LandmassStrategy {
    type Input = LandmassInput;
    type Output = Landmass;

    fn run(&self, input: &LandmassInput) -> Result<Landmass, ContractError> {
        let output = match self {
            LandmassStrategy::Plate(cfg) => run_plate(cfg, input),
            LandmassStrategy::Fractal(cfg) => run_fractal(cfg, input),
        };
        Ok(output)
    }
}

/// Контракт операции выделения суши.
#[must_use]
pub fn landmass_op() -> Operation<LandmassStrategy> {
    Operation {
        id: "morphology/landmass",
        check_input: |i| {
            let size = i.dims.size();
            expect_len("crust_kind", i.crust_kind.len(), size)?;
            expect_len("uplift", i.uplift.len(), size)
        },
        check_output: |o| {
            let size = o.dims.size();
            expect_len("elevation", o.elevation.len(), size)?;
            expect_len("land", o.land.len(), size)?;
            expect_len("coastal_distance", o.coastal_distance.len(), size)
        },
    }
}

fn run_plate(cfg: &PlateLandmass, input: &LandmassInput) -> Landmass {
    let noise = fractal_field(
        input.noise_seed,
        input.dims,
        input.wrap_x,
        cfg.noise_frequency as f32,
        cfg.noise_octaves as i32,
    );

    let data: Vec<f32> = (0..input.dims.size())
        .map(|i| {
            let base = if input.crust_kind[i] == CRUST_CONTINENTAL {
                cfg.continental_base as f32
            } else {
                cfg.oceanic_base as f32
            };
            base + input.uplift[i] * cfg.uplift_weight as f32
                + (noise[i] - 0.5) * cfg.noise_weight as f32
        })
        .collect();

    finalize(
        data,
        input,
        cfg.target_land_fraction as f32,
        cfg.smooth_radius as usize,
    )
}

fn run_fractal(cfg: &FractalLandmass, input: &LandmassInput) -> Landmass {
    let mut data = fractal_field(
        input.noise_seed,
        input.dims,
        input.wrap_x,
        cfg.frequency as f32,
        cfg.octaves as i32,
    );

    // Мягкое наложение островного слоя: сильнее проявляется в низинах
    if cfg.island_density > 0.1 {
        let islands = fractal_field(
            input.noise_seed.wrapping_add(2_000_000),
            input.dims,
            input.wrap_x,
            0.015,
            2,
        );
        for (h, iv) in data.iter_mut().zip(&islands) {
            *h += iv * cfg.island_density as f32 * 0.25;
        }
    }

    finalize(
        data,
        input,
        cfg.target_land_fraction as f32,
        cfg.smooth_radius as usize,
    )
}

/// Общий хвост обеих стратегий: сглаживание бассейнов, нормализация, подбор
/// сдвига под долю суши, маска суши и береговые расстояния.
fn finalize(
    mut data: Vec<f32>,
    input: &LandmassInput,
    target_land_fraction: f32,
    smooth_radius: usize,
) -> Landmass {
    let dims = input.dims;
    smooth_field(&mut data, dims, smooth_radius, input.wrap_x);

    // === 1. Нормализация в 0..1 ===
    let min_h = data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max_h = data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    if max_h > min_h {
        for h in &mut data {
            *h = (*h - min_h) / (max_h - min_h);
        }
    }

    // === 2. Подбор сдвига под долю суши ===
    let mut best_offset = 0.0;
    let mut best_diff = f32::INFINITY;
    for i in 0..100 {
        let offset = (i as f32) / 100.0 - 0.5;
        let land_count = data
            .iter()
            .filter(|&&h| (h + offset).clamp(0.0, 1.0) > SEA_LEVEL)
            .count();
        let land_ratio = land_count as f32 / data.len() as f32;
        let diff = (land_ratio - target_land_fraction).abs();
        if diff < best_diff {
            best_diff = diff;
            best_offset = offset;
        }
    }
    for h in &mut data {
        *h = (*h + best_offset).clamp(0.0, 1.0);
    }

    // === 3. Маска суши и береговая линия ===
    let land: Vec<u8> = data.iter().map(|&h| u8::from(h > SEA_LEVEL)).collect();
    let mut coast = vec![0u8; dims.size()];
    for idx in 0..dims.size() {
        let (x, y) = dims.coords(idx);
        let here = land[idx];
        for &(dx, dy) in &DIRECTIONS_4 {
            if let Some(nidx) = neighbor_index(dims, x, y, dx, dy, input.wrap_x) {
                if land[nidx] != here {
                    coast[idx] = 1;
                    break;
                }
            }
        }
    }
    let coastal_distance = distance_field(&coast, dims, input.wrap_x);
    let land_fraction = land.iter().filter(|&&l| l != 0).count() as f32 / land.len() as f32;

    Landmass {
        dims,
        elevation: data,
        land,
        coastal_distance,
        land_fraction,
    }
}
