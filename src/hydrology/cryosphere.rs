// src/hydrology/cryosphere.rs
//! Криосфера и водный бюджет
//!
//! Снежный и ледовый покров по температуре и осадкам, альбедная обратная связь
//! (фиксированное число итераций дополнительного охлаждения, зажатого снизу) и
//! водный бюджет суши: потенциальная эвапотранспирация и индекс засушливости
//! `pet / (pet + precip + 1)`.

use serde::{Deserialize, Serialize};

use crate::grid::{neighbor_index, Dimensions, DIRECTIONS_8};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CryosphereConfig {
    /// Температура устойчивого снежного покрова на суше.
    pub snow_temp: f64,
    /// Температура морского льда.
    pub ice_temp: f64,
    /// Дополнительное охлаждение за итерацию при полном снежном окружении.
    pub albedo_cooling: f64,
    pub albedo_iterations: u32,
    /// Нижний предел температуры после обратной связи.
    pub min_temp: f64,
    pub pet_scale: f64,
}

impl Default for CryosphereConfig {
    fn default() -> Self {
        Self {
            snow_temp: -2.0,
            ice_temp: -4.0,
            albedo_cooling: 1.5,
            albedo_iterations: 2,
            min_temp: -35.0,
            pet_scale: 2.0,
        }
    }
}

/// Состояние криосферы и водного бюджета.
#[derive(Debug, Clone, PartialEq)]
pub struct Cryosphere {
    pub dims: Dimensions,
    /// Снег на суше.
    pub snow: Vec<u8>,
    /// Морской лёд.
    pub sea_ice: Vec<u8>,
    /// Температура после альбедной обратной связи.
    pub temperature: Vec<f32>,
    pub pet: Vec<f32>,
    pub aridity: Vec<f32>,
}

fn cover_masks(temperature: &[f32], land: &[u8], cfg: &CryosphereConfig) -> (Vec<u8>, Vec<u8>) {
    let snow = temperature
        .iter()
        .zip(land)
        .map(|(&t, &l)| u8::from(l != 0 && t <= cfg.snow_temp as f32))
        .collect();
    let ice = temperature
        .iter()
        .zip(land)
        .map(|(&t, &l)| u8::from(l == 0 && t <= cfg.ice_temp as f32))
        .collect();
    (snow, ice)
}

/// Строит криосферу: покров, альбедное переохлаждение и водный бюджет.
#[must_use]
pub fn build_cryosphere(
    dims: Dimensions,
    wrap_x: bool,
    temperature: &[f32],
    rainfall: &[u8],
    land: &[u8],
    cfg: &CryosphereConfig,
) -> Cryosphere {
    let size = dims.size();
    let mut temp = temperature.to_vec();
    let (mut snow, mut sea_ice) = cover_masks(&temp, land, cfg);

    // === 1. Альбедная обратная связь ===
    // Снег отражает свет и охлаждает окрестность; охлаждение зажато снизу,
    // чтобы связь не убегала.
    for _ in 0..cfg.albedo_iterations {
        let mut cooled = temp.clone();
        for idx in 0..size {
            let (x, y) = dims.coords(idx);
            let mut covered = u32::from(snow[idx] != 0 || sea_ice[idx] != 0);
            let mut total = 1u32;
            for &(dx, dy) in &DIRECTIONS_8 {
                if let Some(nidx) = neighbor_index(dims, x, y, dx, dy, wrap_x) {
                    covered += u32::from(snow[nidx] != 0 || sea_ice[nidx] != 0);
                    total += 1;
                }
            }
            let fraction = covered as f32 / total as f32;
            if fraction > 0.0 {
                cooled[idx] = (temp[idx] - cfg.albedo_cooling as f32 * fraction)
                    .max(cfg.min_temp as f32);
            }
        }
        temp = cooled;
        let masks = cover_masks(&temp, land, cfg);
        snow = masks.0;
        sea_ice = masks.1;
    }

    // === 2. Водный бюджет суши ===
    let pet: Vec<f32> = temp
        .iter()
        .map(|&t| t.max(0.0) * cfg.pet_scale as f32)
        .collect();
    let aridity: Vec<f32> = pet
        .iter()
        .zip(rainfall)
        .map(|(&p, &r)| p / (p + f32::from(r) + 1.0))
        .collect();

    Cryosphere {
        dims,
        snow,
        sea_ice,
        temperature: temp,
        pet,
        aridity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_land_gets_snow_cold_water_gets_ice() {
        let dims = Dimensions::new(2, 1);
        let cryo = build_cryosphere(
            dims,
            false,
            &[-10.0, -10.0],
            &[50, 50],
            &[1, 0],
            &CryosphereConfig::default(),
        );
        assert_eq!(cryo.snow, vec![1, 0]);
        assert_eq!(cryo.sea_ice, vec![0, 1]);
    }

    #[test]
    fn albedo_feedback_cools_but_is_clamped() {
        let dims = Dimensions::new(3, 1);
        let cfg = CryosphereConfig {
            min_temp: -12.0,
            albedo_iterations: 10,
            ..CryosphereConfig::default()
        };
        let cryo = build_cryosphere(dims, false, &[-10.0, -10.0, -10.0], &[0, 0, 0], &[1, 1, 1], &cfg);
        for &t in &cryo.temperature {
            assert!(t < -10.0, "feedback should cool below the start");
            assert!(t >= -12.0, "cooling must respect the clamp");
        }
    }

    #[test]
    fn aridity_follows_the_budget_formula() {
        let dims = Dimensions::new(1, 1);
        let cryo = build_cryosphere(
            dims,
            false,
            &[20.0],
            &[40],
            &[1],
            &CryosphereConfig::default(),
        );
        let pet = 20.0 * 2.0;
        let expected = pet / (pet + 40.0 + 1.0);
        assert!((cryo.aridity[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn warm_map_has_no_cover() {
        let dims = Dimensions::new(2, 2);
        let cryo = build_cryosphere(
            dims,
            true,
            &[20.0; 4],
            &[80; 4],
            &[1, 1, 0, 0],
            &CryosphereConfig::default(),
        );
        assert!(cryo.snow.iter().all(|&s| s == 0));
        assert!(cryo.sea_ice.iter().all(|&s| s == 0));
        assert_eq!(cryo.temperature, vec![20.0; 4]);
    }
}
