// src/story/corridors.rs
//! Стратегические коридоры
//!
//! Нарративный слой поверх готовой морфологии: морские пути — длинные
//! непрерывные полосы открытой воды с достаточной перпендикулярной шириной,
//! и островные цепочки — вода между близкими кусками суши. Оверлей публикуется
//! однонаправленно: потребители (биомы, размещение) только читают его, сам
//! нарративный слой ничего не читает у них.

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::grid::{neighbor_index, Dimensions};
use crate::pipeline::op::{expect_len, Operation, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorridorKind {
    SeaLane,
    IslandHop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    EastWest,
    NorthSouth,
}

/// Один коридор: тайлы, вид и ориентация.
#[derive(Debug, Clone, PartialEq)]
pub struct Corridor {
    pub kind: CorridorKind,
    pub orientation: Orientation,
    pub tiles: Vec<u32>,
}

/// Оверлей коридоров с меткой породившей фазы.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorOverlay {
    pub dims: Dimensions,
    /// Маска тайлов, принадлежащих хотя бы одному коридору.
    pub mask: Vec<u8>,
    pub corridors: Vec<Corridor>,
    /// Фаза, опубликовавшая оверлей.
    pub stage: &'static str,
}

/// Вход операции планирования коридоров.
#[derive(Debug, Clone)]
pub struct CorridorInput {
    pub dims: Dimensions,
    pub wrap_x: bool,
    pub land: Vec<u8>,
    pub stage: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "config", rename_all = "kebab-case")]
pub enum CorridorStrategy {
    /// Морские пути вдоль длинных полос открытой воды.
    SeaLanes(SeaLanesConfig),
    /// Островные цепочки: вода, зажатая между близкими берегами.
    IslandHop(IslandHopConfig),
}

impl Default for CorridorStrategy {
    fn default() -> Self {
        Self::SeaLanes(SeaLanesConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeaLanesConfig {
    /// Минимальная длина водной полосы в тайлах.
    pub min_length: u32,
    /// Минимальная перпендикулярная ширина воды вдоль полосы.
    pub min_width: u32,
    /// Сколько лучших полос оставить на каждую ориентацию.
    pub max_lanes: u32,
}

impl Default for SeaLanesConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            min_width: 3,
            max_lanes: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IslandHopConfig {
    /// Максимальный прыжок: вода дальше этого от обоих берегов не годится.
    pub hop_range: u32,
}

impl Default for IslandHopConfig {
    fn default() -> Self {
        Self { hop_range: 3 }
    }
}

impl Strategy for CorridorStrategy {
    type Input = CorridorInput;
    type Output = CorridorOverlay;

    fn run(&self, input: &CorridorInput) -> Result<CorridorOverlay, ContractError> {
        let corridors = match self {
            CorridorStrategy::SeaLanes(cfg) => plan_sea_lanes(cfg, input),
            CorridorStrategy::IslandHop(cfg) => plan_island_hops(cfg, input),
        };

        let mut mask = vec![0u8; input.dims.size()];
        for corridor in &corridors {
            for &tile in &corridor.tiles {
                mask[tile as usize] = 1;
            }
        }

        Ok(CorridorOverlay {
            dims: input.dims,
            mask,
            corridors,
            stage: input.stage,
        })
    }
}

/// Контракт операции планирования коридоров.
#[must_use]
pub fn corridor_op() -> Operation<CorridorStrategy> {
    Operation {
        id: "story/corridors",
        check_input: |i| expect_len("land", i.land.len(), i.dims.size()),
        check_output: |o| expect_len("mask", o.mask.len(), o.dims.size()),
    }
}

/// Самая длинная непрерывная водная полоса строки `y` (с учётом шва).
/// Возвращает (стартовый X, длина).
fn longest_water_run(
    land: &[u8],
    dims: Dimensions,
    wrap_x: bool,
    y: u32,
    horizontal: bool,
) -> (u32, u32) {
    let extent = if horizontal { dims.width } else { dims.height };
    let at = |i: u32| {
        let idx = if horizontal {
            dims.index(i, y)
        } else {
            dims.index(y, i)
        };
        land[idx] == 0
    };

    let mut best_start = 0;
    let mut best_len = 0u32;
    let mut run_start = 0;
    let mut run_len = 0u32;
    // Вдоль шва полоса может продолжаться; проходим до двух длин
    let passes = if wrap_x && horizontal { extent * 2 } else { extent };
    for i in 0..passes {
        let wrapped = i % extent;
        if at(wrapped) {
            if run_len == 0 {
                run_start = wrapped;
            }
            run_len += 1;
            if run_len > best_len {
                best_len = run_len;
                best_start = run_start;
            }
            if run_len >= extent {
                break; // вся линия — вода
            }
        } else {
            run_len = 0;
        }
    }
    (best_start, best_len.min(extent))
}

/// Перпендикулярная ширина воды вокруг тайла: сколько подряд водных тайлов
/// по обе стороны, включая сам тайл.
fn perpendicular_water_width(
    land: &[u8],
    dims: Dimensions,
    wrap_x: bool,
    x: u32,
    y: u32,
    horizontal: bool,
) -> u32 {
    let (dx, dy) = if horizontal { (0, 1) } else { (1, 0) };
    let mut width = 1u32;
    for dir in [1i32, -1i32] {
        let mut step = 1i32;
        loop {
            match neighbor_index(dims, x, y, dx * dir * step, dy * dir * step, wrap_x) {
                Some(nidx) if land[nidx] == 0 => width += 1,
                _ => break,
            }
            step += 1;
        }
    }
    width
}

fn plan_sea_lanes(cfg: &SeaLanesConfig, input: &CorridorInput) -> Vec<Corridor> {
    let dims = input.dims;
    let mut corridors = Vec::new();

    for (horizontal, orientation, lines) in [
        (true, Orientation::EastWest, dims.height),
        (false, Orientation::NorthSouth, dims.width),
    ] {
        // Кандидаты: (длина, линия, старт), лучшие полосы каждой линии
        let mut candidates: Vec<(u32, u32, u32)> = Vec::new();
        for line in 0..lines {
            let (start, len) =
                longest_water_run(&input.land, dims, input.wrap_x, line, horizontal);
            if len >= cfg.min_length {
                candidates.push((len, line, start));
            }
        }
        candidates.sort_by_key(|&(len, line, _)| (std::cmp::Reverse(len), line));

        for &(len, line, start) in candidates.iter().take(cfg.max_lanes as usize) {
            let extent = if horizontal { dims.width } else { dims.height };
            let mut tiles = Vec::new();
            for offset in 0..len {
                let i = (start + offset) % extent;
                let (x, y) = if horizontal { (i, line) } else { (line, i) };
                if perpendicular_water_width(&input.land, dims, input.wrap_x, x, y, horizontal)
                    >= cfg.min_width
                {
                    tiles.push(dims.index(x, y) as u32);
                }
            }
            if !tiles.is_empty() {
                corridors.push(Corridor {
                    kind: CorridorKind::SeaLane,
                    orientation,
                    tiles,
                });
            }
        }
    }

    corridors
}

fn plan_island_hops(cfg: &IslandHopConfig, input: &CorridorInput) -> Vec<Corridor> {
    let dims = input.dims;
    let range = cfg.hop_range as i32;
    let mut tiles = Vec::new();

    // Вода между двумя берегами по горизонтали в пределах прыжка
    for idx in 0..dims.size() {
        if input.land[idx] != 0 {
            continue;
        }
        let (x, y) = dims.coords(idx);
        let mut west = false;
        let mut east = false;
        for step in 1..=range {
            if let Some(nidx) = neighbor_index(dims, x, y, -step, 0, input.wrap_x) {
                west |= input.land[nidx] != 0;
            }
            if let Some(nidx) = neighbor_index(dims, x, y, step, 0, input.wrap_x) {
                east |= input.land[nidx] != 0;
            }
        }
        if west && east {
            tiles.push(idx as u32);
        }
    }

    if tiles.is_empty() {
        Vec::new()
    } else {
        vec![Corridor {
            kind: CorridorKind::IslandHop,
            orientation: Orientation::EastWest,
            tiles,
        }]
    }
}
