// src/morphology/mountains.rs
//! Горы и холмы
//!
//! Взвешенная оценка рельефности на тайл: сила тектонической границы (с
//! воротами и экспонентой затухания), подъём, сдвиг, рифт и фрактальный шум.
//! Тайлы выше горного порога становятся горами, оставшиеся выше холмового —
//! холмами. Все пороги и веса — конфигурация стратегии, не константы.

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::grid::Dimensions;
use crate::noise::fractal_field;
use crate::pipeline::op::{expect_len, Operation, Strategy};

/// Класс рельефа на суше.
pub const RELIEF_FLAT: u8 = 0;
pub const RELIEF_HILLS: u8 = 1;
pub const RELIEF_MOUNTAIN: u8 = 2;

/// Вход операции: маска суши и тектонические поля, спроецированные на тайлы.
#[derive(Debug, Clone)]
pub struct ReliefInput {
    pub dims: Dimensions,
    pub wrap_x: bool,
    pub noise_seed: i32,
    pub land: Vec<u8>,
    pub boundary_strength: Vec<f32>,
    pub uplift: Vec<f32>,
    pub shear: Vec<f32>,
    pub rift: Vec<f32>,
}

/// Результат: оценка и класс рельефа. Вода всегда `RELIEF_FLAT` с нулевой оценкой.
#[derive(Debug, Clone, PartialEq)]
pub struct Relief {
    pub dims: Dimensions,
    pub score: Vec<f32>,
    pub kind: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "config", rename_all = "kebab-case")]
pub enum ReliefStrategy {
    /// Горные пояса вдоль границ плит.
    Belt(BeltRelief),
    /// Чисто шумовой рельеф без тектоники.
    Fractal(FractalRelief),
}

impl Default for ReliefStrategy {
    fn default() -> Self {
        Self::Belt(BeltRelief::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BeltRelief {
    /// Ворота: сила границы ниже не даёт поясного вклада вовсе.
    pub boundary_gate: f64,
    /// Экспонента затухания поясного вклада над воротами.
    pub falloff: f64,
    pub belt_weight: f64,
    pub uplift_weight: f64,
    pub shear_weight: f64,
    pub rift_weight: f64,
    pub noise_weight: f64,
    pub noise_frequency: f64,
    pub noise_octaves: u32,
    pub mountain_threshold: f64,
    pub hill_threshold: f64,
}

impl Default for BeltRelief {
    fn default() -> Self {
        Self {
            boundary_gate: 0.18,
            falloff: 1.6,
            belt_weight: 0.5,
            uplift_weight: 0.35,
            shear_weight: 0.12,
            rift_weight: 0.08,
            noise_weight: 0.22,
            noise_frequency: 0.05,
            noise_octaves: 3,
            mountain_threshold: 0.55,
            hill_threshold: 0.34,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FractalRelief {
    pub frequency: f64,
    pub octaves: u32,
    pub mountain_threshold: f64,
    pub hill_threshold: f64,
}

impl Default for FractalRelief {
    fn default() -> Self {
        Self {
            frequency: 0.02,
            octaves: 4,
            mountain_threshold: 0.72,
            hill_threshold: 0.55,
        }
    }
}

impl Strategy for ReliefStrategy {
    type Input = ReliefInput;
    type Output = Relief;

    fn run(&self, input: &ReliefInput) -> Result<Relief, ContractError> {
        let output = match self {
            ReliefStrategy::Belt(cfg) => run_belt(cfg, input),
            ReliefStrategy::Fractal(cfg) => run_fractal(cfg, input),
        };
        Ok(output)
    }
}

/// Контракт операции рельефа.
#[must_use]
pub fn relief_op() -> Operation<ReliefStrategy> {
    Operation {
        id: "morphology/relief",
        check_input: |i| {
            let size = i.dims.size();
            expect_len("land", i.land.len(), size)?;
            expect_len("boundary_strength", i.boundary_strength.len(), size)?;
            expect_len("uplift", i.uplift.len(), size)?;
            expect_len("shear", i.shear.len(), size)?;
            expect_len("rift", i.rift.len(), size)
        },
        check_output: |o| {
            let size = o.dims.size();
            expect_len("score", o.score.len(), size)?;
            expect_len("kind", o.kind.len(), size)
        },
    }
}

fn classify(score: &[f32], land: &[u8], mountain_threshold: f32, hill_threshold: f32) -> Vec<u8> {
    score
        .iter()
        .zip(land)
        .map(|(&s, &l)| {
            if l == 0 {
                RELIEF_FLAT
            } else if s >= mountain_threshold {
                RELIEF_MOUNTAIN
            } else if s >= hill_threshold {
                RELIEF_HILLS
            } else {
                RELIEF_FLAT
            }
        })
        .collect()
}

fn run_belt(cfg: &BeltRelief, input: &ReliefInput) -> Relief {
    let noise = fractal_field(
        input.noise_seed,
        input.dims,
        input.wrap_x,
        cfg.noise_frequency as f32,
        cfg.noise_octaves as i32,
    );
    let gate = cfg.boundary_gate as f32;

    let score: Vec<f32> = (0..input.dims.size())
        .map(|i| {
            if input.land[i] == 0 {
                return 0.0;
            }
            let strength = input.boundary_strength[i];
            let belt = if strength > gate && gate < 1.0 {
                ((strength - gate) / (1.0 - gate)).powf(cfg.falloff as f32)
            } else {
                0.0
            };
            let score = belt * cfg.belt_weight as f32
                + input.uplift[i] * cfg.uplift_weight as f32
                + input.shear[i] * cfg.shear_weight as f32
                + input.rift[i] * cfg.rift_weight as f32
                + noise[i] * cfg.noise_weight as f32;
            score.clamp(0.0, 1.0)
        })
        .collect();

    let kind = classify(
        &score,
        &input.land,
        cfg.mountain_threshold as f32,
        cfg.hill_threshold as f32,
    );
    Relief {
        dims: input.dims,
        score,
        kind,
    }
}

fn run_fractal(cfg: &FractalRelief, input: &ReliefInput) -> Relief {
    let noise = fractal_field(
        input.noise_seed,
        input.dims,
        input.wrap_x,
        cfg.frequency as f32,
        cfg.octaves as i32,
    );
    let score: Vec<f32> = noise
        .iter()
        .zip(&input.land)
        .map(|(&n, &l)| if l == 0 { 0.0 } else { n })
        .collect();
    let kind = classify(
        &score,
        &input.land,
        cfg.mountain_threshold as f32,
        cfg.hill_threshold as f32,
    );
    Relief {
        dims: input.dims,
        score,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(boundary: f32) -> ReliefInput {
        let dims = Dimensions::new(20, 12);
        let size = dims.size();
        ReliefInput {
            dims,
            wrap_x: true,
            noise_seed: 3,
            land: vec![1; size],
            boundary_strength: vec![boundary; size],
            uplift: vec![boundary; size],
            shear: vec![0.0; size],
            rift: vec![0.0; size],
        }
    }

    #[test]
    fn water_tiles_stay_flat() {
        let mut inp = input(1.0);
        inp.land = vec![0; inp.dims.size()];
        let out = relief_op()
            .run_validated(&ReliefStrategy::default(), &inp)
            .unwrap();
        assert!(out.kind.iter().all(|&k| k == RELIEF_FLAT));
        assert!(out.score.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn strong_boundaries_raise_mountains() {
        let strong = relief_op()
            .run_validated(&ReliefStrategy::default(), &input(1.0))
            .unwrap();
        let weak = relief_op()
            .run_validated(&ReliefStrategy::default(), &input(0.0))
            .unwrap();
        let mountains = |r: &Relief| r.kind.iter().filter(|&&k| k == RELIEF_MOUNTAIN).count();
        assert!(mountains(&strong) > mountains(&weak));
    }

    #[test]
    fn below_gate_contributes_nothing() {
        let cfg = BeltRelief {
            boundary_gate: 0.5,
            noise_weight: 0.0,
            uplift_weight: 0.0,
            ..BeltRelief::default()
        };
        let mut inp = input(0.4);
        inp.uplift = vec![0.0; inp.dims.size()];
        let out = relief_op()
            .run_validated(&ReliefStrategy::Belt(cfg), &inp)
            .unwrap();
        assert!(out.score.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn thresholds_split_hills_and_mountains() {
        let cfg = FractalRelief {
            mountain_threshold: 0.9,
            hill_threshold: 0.0,
            ..FractalRelief::default()
        };
        let out = relief_op()
            .run_validated(&ReliefStrategy::Fractal(cfg), &input(0.0))
            .unwrap();
        // При нулевом холмовом пороге вся суша минимум холмистая
        assert!(out.kind.iter().all(|&k| k != RELIEF_FLAT));
    }
}
