// src/placement/starts.rs
//! Назначение стартовых позиций
//!
//! Два крупнейших массива суши становятся континентами 1 (западным) и 2
//! (восточным). Окно каждого континента режется на сектора, по одному на
//! игрока; в секторе выбирается тайл с максимальной плодородностью при
//! соблюдении минимальной дистанции между стартами. Всё — чистые функции
//! над плоскими буферами, хост здесь не нужен.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ecology::biomes::Biome;
use crate::grid::{neighbor_index, Dimensions, DIRECTIONS_4};
use crate::hydrology::drainage::{RIVER_MAJOR, RIVER_MINOR};

/// Стартовая позиция одного игрока.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPosition {
    pub x: u32,
    pub y: u32,
    /// Номер игрока, сквозной по обоим континентам.
    pub player: u32,
    /// Континент: 1 — западный, 2 — восточный.
    pub landmass: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartsConfig {
    /// Минимальная дистанция между стартами в тайлах (чебышёвская, с учётом шва).
    pub min_spacing: u32,
    /// Бонус плодородности за реку на тайле.
    pub river_bonus: f64,
    /// Бонус за близость к побережью.
    pub coastal_bonus: f64,
    /// Дальше этого от воды прибрежный бонус не действует.
    pub coastal_range: u32,
}

impl Default for StartsConfig {
    fn default() -> Self {
        Self {
            min_spacing: 6,
            river_bonus: 2.0,
            coastal_bonus: 1.5,
            coastal_range: 3,
        }
    }
}

/// Вход назначения стартов: плоские буферы финальной карты.
#[derive(Debug, Clone)]
pub struct StartInput {
    pub dims: Dimensions,
    pub wrap_x: bool,
    pub land: Vec<u8>,
    pub biome: Vec<u8>,
    pub rainfall: Vec<u8>,
    pub river_class: Vec<u8>,
    /// BFS-расстояние до ближайшей воды.
    pub coastal_distance: Vec<u16>,
}

/// Прямоугольное окно континента (без компенсации шва).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

/// Разметка связных компонент суши (4-связность, BFS).
///
/// Возвращает метки (`0` — вода) и размеры компонент по метке.
#[must_use]
pub fn label_components(land: &[u8], dims: Dimensions, wrap_x: bool) -> (Vec<u16>, Vec<usize>) {
    let size = dims.size();
    let mut labels = vec![0u16; size];
    let mut sizes = vec![0usize]; // метка 0 — вода
    let mut queue = VecDeque::new();

    for start in 0..size {
        if land[start] == 0 || labels[start] != 0 {
            continue;
        }
        let label = sizes.len() as u16;
        sizes.push(0);
        labels[start] = label;
        queue.push_back(start);

        while let Some(idx) = queue.pop_front() {
            sizes[label as usize] += 1;
            let (x, y) = dims.coords(idx);
            for &(dx, dy) in &DIRECTIONS_4 {
                if let Some(nidx) = neighbor_index(dims, x, y, dx, dy, wrap_x) {
                    if land[nidx] != 0 && labels[nidx] == 0 {
                        labels[nidx] = label;
                        queue.push_back(nidx);
                    }
                }
            }
        }
    }

    (labels, sizes)
}

/// Окно компоненты с данной меткой.
#[must_use]
pub fn component_window(labels: &[u16], dims: Dimensions, label: u16) -> Option<Window> {
    let mut window: Option<Window> = None;
    for idx in 0..dims.size() {
        if labels[idx] != label {
            continue;
        }
        let (x, y) = dims.coords(idx);
        window = Some(match window {
            None => Window {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            },
            Some(w) => Window {
                min_x: w.min_x.min(x),
                min_y: w.min_y.min(y),
                max_x: w.max_x.max(x),
                max_y: w.max_y.max(y),
            },
        });
    }
    window
}

/// Два крупнейших континента: западный первым (по левому краю окна).
#[must_use]
pub fn pick_continents(labels: &[u16], sizes: &[usize], dims: Dimensions) -> Vec<u16> {
    let mut order: Vec<u16> = (1..sizes.len() as u16).collect();
    order.sort_by_key(|&l| (std::cmp::Reverse(sizes[l as usize]), l));
    order.truncate(2);
    // Западный континент — первый
    order.sort_by_key(|&l| {
        component_window(labels, dims, l).map_or(u32::MAX, |w| w.min_x)
    });
    order
}

/// Плодородность тайла: осадки плюс бонусы рек и побережья, минус мёртвые биомы.
#[must_use]
pub fn fertility(input: &StartInput, cfg: &StartsConfig, idx: usize) -> f32 {
    if input.land[idx] == 0 {
        return f32::MIN;
    }
    let biome_base = match Biome::from_u8(input.biome[idx]) {
        Biome::Grassland | Biome::TemperateForest => 3.0,
        Biome::Savanna | Biome::TropicalRainforest => 2.0,
        Biome::Taiga | Biome::Swamp => 1.0,
        Biome::Tundra | Biome::Desert => 0.2,
        Biome::Ice | Biome::Marine => return f32::MIN,
    };
    let mut score = biome_base + f32::from(input.rainfall[idx]) / 100.0;
    if input.river_class[idx] == RIVER_MINOR || input.river_class[idx] == RIVER_MAJOR {
        score += cfg.river_bonus as f32;
    }
    if u32::from(input.coastal_distance[idx]) <= cfg.coastal_range {
        score += cfg.coastal_bonus as f32;
    }
    score
}

/// Чебышёвская дистанция между тайлами с учётом цилиндрического шва.
#[must_use]
pub fn tile_distance(dims: Dimensions, wrap_x: bool, a: (u32, u32), b: (u32, u32)) -> u32 {
    let mut dx = a.0.abs_diff(b.0);
    if wrap_x {
        dx = dx.min(dims.width - dx);
    }
    let dy = a.1.abs_diff(b.1);
    dx.max(dy)
}

fn sector_grid(players: u32) -> (u32, u32) {
    let cols = (players as f64).sqrt().ceil() as u32;
    let rows = players.div_ceil(cols);
    (cols, rows)
}

/// Старты одного континента: окно режется на сектора `cols x rows`, в каждом
/// выбирается лучший тайл компоненты. Пустой сектор получает лучший из
/// оставшихся тайлов компоненты.
fn assign_on_continent(
    input: &StartInput,
    cfg: &StartsConfig,
    labels: &[u16],
    label: u16,
    landmass: u8,
    players: u32,
    first_player: u32,
    taken: &mut Vec<(u32, u32)>,
) -> Vec<StartPosition> {
    let mut starts = Vec::new();
    if players == 0 {
        return starts;
    }
    let Some(window) = component_window(labels, input.dims, label) else {
        return starts;
    };

    let (cols, rows) = sector_grid(players);
    let span_x = window.max_x - window.min_x + 1;
    let span_y = window.max_y - window.min_y + 1;

    let sector_of = |x: u32, y: u32| -> u32 {
        let sx = ((x - window.min_x) * cols / span_x).min(cols - 1);
        let sy = ((y - window.min_y) * rows / span_y).min(rows - 1);
        sy * cols + sx
    };

    let mut spacing = cfg.min_spacing;
    let mut player = first_player;

    // При нехватке места дистанция ослабляется до нуля
    loop {
        for sector in 0..cols * rows {
            if starts.len() >= players as usize {
                break;
            }
            let mut best: Option<(f32, usize)> = None;
            for idx in 0..input.dims.size() {
                if labels[idx] != label {
                    continue;
                }
                let (x, y) = input.dims.coords(idx);
                if sector_of(x, y) != sector {
                    continue;
                }
                if taken.contains(&(x, y))
                    || taken
                        .iter()
                        .any(|&t| tile_distance(input.dims, input.wrap_x, t, (x, y)) < spacing)
                {
                    continue;
                }
                let score = fertility(input, cfg, idx);
                if score == f32::MIN {
                    continue;
                }
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, idx));
                }
            }
            if let Some((_, idx)) = best {
                let (x, y) = input.dims.coords(idx);
                taken.push((x, y));
                starts.push(StartPosition {
                    x,
                    y,
                    player,
                    landmass,
                });
                player += 1;
            }
        }
        if starts.len() >= players as usize || spacing == 0 {
            break;
        }
        spacing -= 1;
    }

    starts
}

/// Полное назначение стартов по двум крупнейшим континентам.
#[must_use]
pub fn assign_starts(
    input: &StartInput,
    cfg: &StartsConfig,
    players_landmass_1: u32,
    players_landmass_2: u32,
) -> Vec<StartPosition> {
    let (labels, sizes) = label_components(&input.land, input.dims, input.wrap_x);
    let continents = pick_continents(&labels, &sizes, input.dims);

    let mut taken = Vec::new();
    let mut starts = Vec::new();

    // Один континент принимает всех, если второго нет
    let counts = match continents.len() {
        0 => return starts,
        1 => vec![(continents[0], 1u8, players_landmass_1 + players_landmass_2)],
        _ => vec![
            (continents[0], 1u8, players_landmass_1),
            (continents[1], 2u8, players_landmass_2),
        ],
    };

    let mut next_player = 0;
    for (label, landmass, players) in counts {
        let assigned = assign_on_continent(
            input, cfg, &labels, label, landmass, players, next_player, &mut taken,
        );
        next_player += assigned.len() as u32;
        starts.extend(assigned);
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_island_input() -> StartInput {
        // Два острова 4x4 по краям карты 16x6, между ними океан
        let dims = Dimensions::new(16, 6);
        let mut land = vec![0u8; dims.size()];
        for y in 1..5 {
            for x in 1..5 {
                land[dims.index(x, y)] = 1;
            }
            for x in 11..15 {
                land[dims.index(x, y)] = 1;
            }
        }
        let coastal = crate::grid::distance_field(
            &land.iter().map(|&l| u8::from(l == 0)).collect::<Vec<_>>(),
            dims,
            false,
        );
        StartInput {
            dims,
            wrap_x: false,
            biome: land
                .iter()
                .map(|&l| {
                    if l != 0 {
                        Biome::Grassland.code()
                    } else {
                        Biome::Marine.code()
                    }
                })
                .collect(),
            rainfall: vec![80; dims.size()],
            river_class: vec![0; dims.size()],
            coastal_distance: coastal,
            land,
        }
    }

    #[test]
    fn components_are_labeled_and_sized() {
        let input = two_island_input();
        let (labels, sizes) = label_components(&input.land, input.dims, input.wrap_x);
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes[1], 16);
        assert_eq!(sizes[2], 16);
        assert_eq!(labels[input.dims.index(0, 0)], 0);
    }

    #[test]
    fn western_continent_comes_first() {
        let input = two_island_input();
        let (labels, sizes) = label_components(&input.land, input.dims, input.wrap_x);
        let continents = pick_continents(&labels, &sizes, input.dims);
        assert_eq!(continents.len(), 2);
        let west = component_window(&labels, input.dims, continents[0]).unwrap();
        let east = component_window(&labels, input.dims, continents[1]).unwrap();
        assert!(west.min_x < east.min_x);
    }

    #[test]
    fn each_landmass_gets_its_players() {
        let input = two_island_input();
        let starts = assign_starts(&input, &StartsConfig::default(), 2, 1);
        assert_eq!(starts.len(), 3);
        assert_eq!(starts.iter().filter(|s| s.landmass == 1).count(), 2);
        assert_eq!(starts.iter().filter(|s| s.landmass == 2).count(), 1);
        // Игроки пронумерованы сквозняком
        let players: Vec<u32> = starts.iter().map(|s| s.player).collect();
        assert_eq!(players, vec![0, 1, 2]);
    }

    #[test]
    fn starts_land_on_land() {
        let input = two_island_input();
        let starts = assign_starts(&input, &StartsConfig::default(), 2, 2);
        for s in &starts {
            assert_eq!(input.land[input.dims.index(s.x, s.y)], 1);
        }
    }

    #[test]
    fn spacing_is_respected_when_room_allows() {
        let input = two_island_input();
        let cfg = StartsConfig {
            min_spacing: 2,
            ..StartsConfig::default()
        };
        let starts = assign_starts(&input, &cfg, 2, 0);
        assert_eq!(starts.len(), 2);
        let a = (starts[0].x, starts[0].y);
        let b = (starts[1].x, starts[1].y);
        assert!(tile_distance(input.dims, input.wrap_x, a, b) >= 2);
    }

    #[test]
    fn rivers_raise_fertility() {
        let mut input = two_island_input();
        let cfg = StartsConfig::default();
        let idx = input.dims.index(2, 2);
        let dry = fertility(&input, &cfg, idx);
        input.river_class[idx] = RIVER_MINOR;
        let wet = fertility(&input, &cfg, idx);
        assert!(wet > dry);
    }

    #[test]
    fn single_continent_takes_everyone() {
        let dims = Dimensions::new(10, 6);
        let mut land = vec![0u8; dims.size()];
        for y in 1..5 {
            for x in 1..9 {
                land[dims.index(x, y)] = 1;
            }
        }
        let input = StartInput {
            dims,
            wrap_x: false,
            biome: land
                .iter()
                .map(|&l| {
                    if l != 0 {
                        Biome::Grassland.code()
                    } else {
                        Biome::Marine.code()
                    }
                })
                .collect(),
            rainfall: vec![80; dims.size()],
            river_class: vec![0; dims.size()],
            coastal_distance: vec![1; dims.size()],
            land,
        };
        let starts = assign_starts(&input, &StartsConfig::default(), 2, 2);
        assert_eq!(starts.len(), 4);
        assert!(starts.iter().all(|s| s.landmass == 1));
    }
}
