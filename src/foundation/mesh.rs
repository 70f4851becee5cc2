// src/foundation/mesh.rs
//! Нерегулярная ячеистая сетка
//!
//! Карта разбивается на `cell_count` ячеек вороного-подобным разбиением с
//! релаксацией Ллойда: случайные сайты, назначение тайлов ближайшему сайту,
//! сдвиг сайтов к центроидам, повтор. Результат — сайты, площади, CSR-список
//! смежности и привязка тайл → ячейка. Строится один раз за прогон и дальше
//! только читается.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::grid::{Dimensions, DIRECTIONS_4};

/// Ограничивающий прямоугольник сетки.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// Ячеистая сетка фундамента.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub cell_count: usize,
    pub site_x: Vec<f32>,
    pub site_y: Vec<f32>,
    /// Площадь ячейки в тайлах.
    pub area: Vec<u32>,
    /// CSR-смещения: соседи ячейки `c` — `adjacency[offsets[c]..offsets[c+1]]`.
    adjacency_offsets: Vec<u32>,
    adjacency: Vec<u32>,
    pub bbox: BoundingBox,
    pub wrap_x: bool,
}

impl Mesh {
    /// Соседние ячейки (по смежности тайловых границ).
    #[must_use]
    pub fn neighbors(&self, cell: usize) -> &[u32] {
        let from = self.adjacency_offsets[cell] as usize;
        let to = self.adjacency_offsets[cell + 1] as usize;
        &self.adjacency[from..to]
    }

    /// Разница по X с учётом цилиндричности (кратчайшая дуга).
    #[must_use]
    pub fn wrapped_dx(&self, from_x: f32, to_x: f32) -> f32 {
        let width = self.bbox.max_x - self.bbox.min_x;
        let mut dx = to_x - from_x;
        if self.wrap_x {
            if dx > width * 0.5 {
                dx -= width;
            } else if dx < -width * 0.5 {
                dx += width;
            }
        }
        dx
    }
}

/// Привязка тайлов к ячейкам сетки (длина `width*height`).
#[derive(Debug, Clone)]
pub struct TileToCell(pub Vec<u32>);

fn wrapped_dist_sq(dims: Dimensions, wrap_x: bool, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let width = dims.width as f32;
    let mut dx = (ax - bx).abs();
    if wrap_x {
        dx = dx.min(width - dx);
    }
    let dy = ay - by;
    dx * dx + dy * dy
}

/// Количество ячеек по степенному закону от площади карты, зажатое в допустимый диапазон.
#[must_use]
pub fn cell_count_for(dims: Dimensions, power: f64, scale: f64) -> usize {
    let area = dims.size() as f64;
    let raw = (scale * area.powf(power)).round() as usize;
    raw.clamp(1, dims.size())
}

/// Строит сетку с релаксацией Ллойда.
pub fn build_mesh(
    dims: Dimensions,
    wrap_x: bool,
    cell_count: usize,
    relaxation: u32,
    rng: &mut ChaCha8Rng,
) -> (Mesh, TileToCell) {
    let size = dims.size();
    let width = dims.width as f32;
    let height = dims.height as f32;
    let cell_count = cell_count.clamp(1, size);

    // === 1. Случайные сайты ===
    let mut site_x: Vec<f32> = (0..cell_count).map(|_| rng.gen_range(0.0..width)).collect();
    let mut site_y: Vec<f32> = (0..cell_count)
        .map(|_| rng.gen_range(0.0..height))
        .collect();

    let mut tile_to_cell = vec![0u32; size];

    // === 2. Итерации: назначение + сдвиг к центроидам ===
    for pass in 0..=relaxation {
        for idx in 0..size {
            let (x, y) = dims.coords(idx);
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            let mut best = 0usize;
            let mut best_d = f32::INFINITY;
            for c in 0..cell_count {
                let d = wrapped_dist_sq(dims, wrap_x, px, py, site_x[c], site_y[c]);
                if d < best_d {
                    best_d = d;
                    best = c;
                }
            }
            tile_to_cell[idx] = best as u32;
        }

        if pass == relaxation {
            break;
        }

        // Центроид в смещениях относительно сайта — корректно через шов
        let mut sum_dx = vec![0.0f32; cell_count];
        let mut sum_dy = vec![0.0f32; cell_count];
        let mut counts = vec![0u32; cell_count];
        for idx in 0..size {
            let c = tile_to_cell[idx] as usize;
            let (x, y) = dims.coords(idx);
            let px = x as f32 + 0.5;
            let mut dx = px - site_x[c];
            if wrap_x {
                if dx > width * 0.5 {
                    dx -= width;
                } else if dx < -width * 0.5 {
                    dx += width;
                }
            }
            sum_dx[c] += dx;
            sum_dy[c] += y as f32 + 0.5 - site_y[c];
            counts[c] += 1;
        }
        for c in 0..cell_count {
            if counts[c] == 0 {
                continue;
            }
            let n = counts[c] as f32;
            site_x[c] = (site_x[c] + sum_dx[c] / n).rem_euclid(width);
            site_y[c] = (site_y[c] + sum_dy[c] / n).clamp(0.0, height - 1.0);
        }
    }

    // === 3. Площади и смежность ===
    let mut area = vec![0u32; cell_count];
    for &c in &tile_to_cell {
        area[c as usize] += 1;
    }

    let mut neighbor_sets: Vec<std::collections::BTreeSet<u32>> =
        vec![std::collections::BTreeSet::new(); cell_count];
    for idx in 0..size {
        let (x, y) = dims.coords(idx);
        let a = tile_to_cell[idx];
        for &(dx, dy) in &DIRECTIONS_4 {
            if let Some(nidx) = crate::grid::neighbor_index(dims, x, y, dx, dy, wrap_x) {
                let b = tile_to_cell[nidx];
                if a != b {
                    neighbor_sets[a as usize].insert(b);
                }
            }
        }
    }

    let mut adjacency_offsets = Vec::with_capacity(cell_count + 1);
    let mut adjacency = Vec::new();
    adjacency_offsets.push(0u32);
    for set in &neighbor_sets {
        adjacency.extend(set.iter().copied());
        adjacency_offsets.push(adjacency.len() as u32);
    }

    let mesh = Mesh {
        cell_count,
        site_x,
        site_y,
        area,
        adjacency_offsets,
        adjacency,
        bbox: BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: width,
            max_y: height,
        },
        wrap_x,
    };

    (mesh, TileToCell(tile_to_cell))
}
