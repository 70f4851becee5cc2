// src/hydrology/climate.rs
//! Атмосферные проходы
//!
//! Строго упорядоченная последовательность тайловых проходов с фиксированным
//! числом итераций (никаких циклов до сходимости): широтные целевые осадки →
//! тепловое состояние → зональные ветра → испарение → перенос влаги против
//! ветра → осадки. Каждый проход — чистая функция над плоскими буферами,
//! пригодная для поштучного тестирования на маленьких сетках.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{neighbor_index, Dimensions};

/// Широтные пояса целевых осадков: (кромка пояса в градусах, цель 0..200).
pub const RAINFALL_BANDS: [(f32, f32); 6] = [
    (10.0, 120.0),
    (20.0, 104.0),
    (35.0, 75.0),
    (55.0, 70.0),
    (70.0, 60.0),
    (90.0, 45.0),
];

/// Целевые осадки для абсолютной широты с линейным переходом у кромок поясов.
#[must_use]
pub fn banded_rainfall_target(lat_abs: f32, transition: f32) -> f32 {
    for (i, &(edge, value)) in RAINFALL_BANDS.iter().enumerate() {
        if lat_abs <= edge {
            let next = RAINFALL_BANDS.get(i + 1).map_or(value, |b| b.1);
            let d = edge - lat_abs;
            if d >= transition || transition <= 0.0 {
                return value;
            }
            let t = d / transition;
            return next + (value - next) * t;
        }
    }
    RAINFALL_BANDS[RAINFALL_BANDS.len() - 1].1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThermalConfig {
    pub equator_temp: f64,
    pub pole_temp: f64,
    /// Падение температуры на километр высоты.
    pub lapse_per_km: f64,
    /// Континентальное охлаждение: суша холоднее океана на этой широте.
    pub land_cooling: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            equator_temp: 28.0,
            pole_temp: -18.0,
            lapse_per_km: 6.5,
            land_cooling: 2.0,
        }
    }
}

/// Температура поверхности: инсоляция по широте, высотный градиент,
/// континентальное охлаждение. `row_latitudes` — широта каждой строки.
#[must_use]
pub fn thermal_state(
    dims: Dimensions,
    row_latitudes: &[f32],
    elevation: &[i16],
    land: &[u8],
    cfg: &ThermalConfig,
) -> Vec<f32> {
    (0..dims.size())
        .map(|idx| {
            let (_, y) = dims.coords(idx);
            let lat_factor = (row_latitudes[y as usize] / 90.0).abs().clamp(0.0, 1.0);
            let insolation = cfg.equator_temp as f32
                + (cfg.pole_temp as f32 - cfg.equator_temp as f32) * lat_factor.powf(1.3);
            let lapse =
                cfg.lapse_per_km as f32 * f32::from(elevation[idx].max(0)) / 1000.0;
            let continental = if land[idx] != 0 {
                cfg.land_cooling as f32
            } else {
                0.0
            };
            insolation - lapse - continental
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindConfig {
    pub base_speed: f64,
    /// Количество струйных «прожилок» с усиленным ветром.
    pub jet_streaks: u32,
    pub jet_boost: f64,
    /// Амплитуда меридионального джиттера на строку.
    pub jitter: f64,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            base_speed: 1.0,
            jet_streaks: 2,
            jet_boost: 1.6,
            jitter: 0.15,
        }
    }
}

/// Зональные ветра по строкам: `u` — восточная компонента, `v` — северная.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalWinds {
    pub u: Vec<f32>,
    pub v: Vec<f32>,
}

/// Ветер по широтным поясам: пассаты (восток→запад) до 30°, западные ветра
/// 30..60°, полярные восточные дальше. Струи и джиттер разыгрываются из
/// помеченного под-потока.
#[must_use]
pub fn zonal_winds(row_latitudes: &[f32], cfg: &WindConfig, rng: &mut ChaCha8Rng) -> ZonalWinds {
    let height = row_latitudes.len();
    let mut u = Vec::with_capacity(height);
    let mut v = Vec::with_capacity(height);

    for &lat in row_latitudes {
        let lat_abs = lat.abs();
        let direction = if lat_abs < 30.0 {
            -1.0
        } else if lat_abs < 60.0 {
            1.0
        } else {
            -1.0
        };
        u.push(direction * cfg.base_speed as f32);
        let jitter = cfg.jitter as f32;
        v.push(if jitter > 0.0 {
            rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        });
    }

    // Струи: усиленные строки в поясе западных ветров
    let candidates: Vec<usize> = (0..height)
        .filter(|&y| {
            let a = row_latitudes[y].abs();
            (30.0..60.0).contains(&a)
        })
        .collect();
    if !candidates.is_empty() {
        for _ in 0..cfg.jet_streaks {
            let y = candidates[rng.gen_range(0..candidates.len())];
            u[y] *= cfg.jet_boost as f32;
        }
    }

    ZonalWinds { u, v }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaporationConfig {
    pub base: f64,
    /// Ниже этой температуры испарения нет.
    pub min_temp: f64,
    pub temp_scale: f64,
    /// Доля испарения с суши относительно воды.
    pub land_factor: f64,
}

impl Default for EvaporationConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            min_temp: 0.0,
            temp_scale: 30.0,
            land_factor: 0.35,
        }
    }
}

/// Источники влаги: вода испаряет в полную силу, суша — с понижающим фактором.
#[must_use]
pub fn evaporation(temperature: &[f32], land: &[u8], cfg: &EvaporationConfig) -> Vec<f32> {
    temperature
        .iter()
        .zip(land)
        .map(|(&t, &l)| {
            let warmth =
                ((t - cfg.min_temp as f32) / cfg.temp_scale as f32).clamp(0.0, 1.0);
            let surface = if l == 0 { 1.0 } else { cfg.land_factor as f32 };
            cfg.base as f32 * warmth * surface
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrographicConfig {
    /// Явное включение тени: пропуск прохода — осознанное решение, не откат.
    pub enabled: bool,
    /// Минимальный перепад высот против ветра, создающий барьер.
    pub barrier_delta: f64,
    /// Доля влаги, теряемая за барьером 0..1.
    pub shadow: f64,
}

impl Default for OrographicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            barrier_delta: 200.0,
            shadow: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoistureConfig {
    /// Фиксированное число итераций переноса.
    pub iterations: u32,
    /// Доля влаги, остающейся на месте за итерацию.
    pub retention: f64,
    /// Доля влаги, приходящей с наветренного тайла за итерацию.
    pub advection: f64,
    pub orographic: OrographicConfig,
}

impl Default for MoistureConfig {
    fn default() -> Self {
        Self {
            iterations: 6,
            retention: 0.55,
            advection: 0.45,
            orographic: OrographicConfig::default(),
        }
    }
}

/// Перенос влаги против ветра (полулагранжев, выборка с наветренной стороны).
///
/// Орографическая тень: если наветренный тайл выше текущего на порог барьера,
/// приходящая влага режется — хребет уже собрал её дождём.
#[must_use]
pub fn advect_moisture(
    sources: &[f32],
    winds: &ZonalWinds,
    dims: Dimensions,
    wrap_x: bool,
    elevation: &[i16],
    cfg: &MoistureConfig,
) -> Vec<f32> {
    let size = dims.size();
    let mut moisture = sources.to_vec();
    let retention = cfg.retention as f32;
    let advection = cfg.advection as f32;
    let barrier = cfg.orographic.barrier_delta as f32;
    let shadow = cfg.orographic.shadow as f32;

    for _ in 0..cfg.iterations {
        let mut next = vec![0.0f32; size];
        for idx in 0..size {
            let (x, y) = dims.coords(idx);
            let u = winds.u[y as usize];
            let v = winds.v[y as usize];
            // Воздух пришёл с наветренной стороны: смещение против ветра
            let dx = (-u).round() as i32;
            let dy = (-v).round() as i32;

            let incoming = match neighbor_index(dims, x, y, dx, dy, wrap_x) {
                Some(uidx) => {
                    let mut m = moisture[uidx];
                    if cfg.orographic.enabled
                        && f32::from(elevation[uidx]) - f32::from(elevation[idx]) > barrier
                    {
                        m *= 1.0 - shadow.clamp(0.0, 1.0);
                    }
                    m
                }
                None => moisture[idx],
            };
            next[idx] = moisture[idx] * retention + incoming * advection;
        }
        moisture = next;
    }

    moisture
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrecipitationConfig {
    /// Ширина перехода между широтными поясами в градусах.
    pub band_transition: f64,
    /// Базовая доля поясной цели, выпадающая даже без влаги.
    pub dry_floor: f64,
    pub moisture_gain: f64,
}

impl Default for PrecipitationConfig {
    fn default() -> Self {
        Self {
            band_transition: 4.0,
            dry_floor: 0.35,
            moisture_gain: 1.0,
        }
    }
}

/// Осадки 0..200: широтная цель, промасштабированная локальной влагой.
#[must_use]
pub fn precipitation(
    moisture: &[f32],
    dims: Dimensions,
    row_latitudes: &[f32],
    cfg: &PrecipitationConfig,
) -> Vec<u8> {
    (0..dims.size())
        .map(|idx| {
            let (_, y) = dims.coords(idx);
            let target = banded_rainfall_target(
                row_latitudes[y as usize].abs(),
                cfg.band_transition as f32,
            );
            let wetness = (moisture[idx] * cfg.moisture_gain as f32).clamp(0.0, 1.0);
            let floor = cfg.dry_floor as f32;
            let rain = target * (floor + (1.0 - floor) * wetness);
            rain.clamp(0.0, 200.0) as u8
        })
        .collect()
}
