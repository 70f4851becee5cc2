// src/grid.rs
//! Примитивы тайловой сетки
//!
//! Все пер-тайловые буферы имеют длину `width*height` и индексируются построчно
//! (`y*width+x`). Карта цилиндрическая: X зацикливается (если включён wrap),
//! Y ограничен краями. Нарушение длины буфера — фатальная ошибка программиста,
//! её ловят контракты операций, а не этот модуль.

use serde::{Deserialize, Serialize};

/// Размеры карты в тайлах.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Количество тайлов (`width*height`).
    #[must_use]
    pub fn size(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    #[must_use]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    #[must_use]
    pub fn coords(&self, idx: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((idx % w) as u32, (idx / w) as u32)
    }

    /// Широта строки в градусах при линейной интерполяции от южной к северной границе.
    #[must_use]
    pub fn latitude_of_row(&self, y: u32, south: f32, north: f32) -> f32 {
        if self.height <= 1 {
            return (south + north) * 0.5;
        }
        // Строка 0 — север, последняя — юг
        let t = y as f32 / (self.height - 1) as f32;
        north + (south - north) * t
    }
}

/// Четыре ортогональных соседа.
pub const DIRECTIONS_4: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Восемь соседей, включая диагонали.
pub const DIRECTIONS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Индекс соседа со смещением `(dx, dy)`.
///
/// X зацикливаем через `rem_euclid` при `wrap_x`, Y ограничиваем (за краем — `None`).
#[must_use]
pub fn neighbor_index(
    dims: Dimensions,
    x: u32,
    y: u32,
    dx: i32,
    dy: i32,
    wrap_x: bool,
) -> Option<usize> {
    let width = dims.width as i32;
    let height = dims.height as i32;

    let nx = if wrap_x {
        (x as i32 + dx).rem_euclid(width)
    } else {
        let v = x as i32 + dx;
        if v < 0 || v >= width {
            return None;
        }
        v
    };

    let ny = y as i32 + dy;
    if ny < 0 || ny >= height {
        return None;
    }

    Some((ny as u32 * dims.width + nx as u32) as usize)
}

/// Сглаживание скользящим средним (двухпроходный box-blur).
///
/// Горизонтальный проход бесшовный по X (при `wrap_x`), вертикальный ограничен краями.
pub fn smooth_field(data: &mut [f32], dims: Dimensions, radius: usize, wrap_x: bool) {
    let width = dims.width as usize;
    let height = dims.height as usize;
    if radius == 0 || radius >= width || radius >= height {
        return;
    }

    let mut temp = vec![0.0; data.len()];
    let r = radius as i32;
    let count = (2 * r + 1) as f32;

    // 1. Горизонтальный проход
    for y in 0..height {
        let row = y * width;
        let mut window_sum = 0.0;

        for dx in -r..=r {
            let x = if wrap_x {
                dx.rem_euclid(width as i32) as usize
            } else {
                dx.clamp(0, width as i32 - 1) as usize
            };
            window_sum += data[row + x];
        }

        for x in 0..width {
            temp[row + x] = window_sum / count;

            // Сдвигаем окно: убираем левый тайл, добавляем правый
            let (left, right) = if wrap_x {
                (
                    (x as i32 - r).rem_euclid(width as i32) as usize,
                    (x as i32 + r + 1).rem_euclid(width as i32) as usize,
                )
            } else {
                (
                    (x as i32 - r).clamp(0, width as i32 - 1) as usize,
                    (x as i32 + r + 1).clamp(0, width as i32 - 1) as usize,
                )
            };
            window_sum = window_sum - data[row + left] + data[row + right];
        }
    }

    // 2. Вертикальный проход (границы зажимаем)
    for x in 0..width {
        let mut window_sum = 0.0;
        for dy in -r..=r {
            let y = dy.clamp(0, height as i32 - 1) as usize;
            window_sum += temp[y * width + x];
        }

        for y in 0..height {
            data[y * width + x] = window_sum / count;

            let top = (y as i32 - r).clamp(0, height as i32 - 1) as usize;
            let bottom = (y as i32 + r + 1).clamp(0, height as i32 - 1) as usize;
            window_sum = window_sum - temp[top * width + x] + temp[bottom * width + x];
        }
    }
}

/// Поле расстояний BFS от множества источников (4-связность).
///
/// Недостижимые тайлы получают `u16::MAX`. Источник — тайл с `sources[i] != 0`.
#[must_use]
pub fn distance_field(sources: &[u8], dims: Dimensions, wrap_x: bool) -> Vec<u16> {
    let size = dims.size();
    debug_assert_eq!(sources.len(), size);

    let mut distance = vec![u16::MAX; size];
    let mut queue = std::collections::VecDeque::new();

    for (i, &s) in sources.iter().enumerate() {
        if s != 0 {
            distance[i] = 0;
            queue.push_back(i);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let (x, y) = dims.coords(idx);
        let d = distance[idx];
        for &(dx, dy) in &DIRECTIONS_4 {
            if let Some(nidx) = neighbor_index(dims, x, y, dx, dy, wrap_x) {
                if distance[nidx] == u16::MAX {
                    distance[nidx] = d.saturating_add(1);
                    queue.push_back(nidx);
                }
            }
        }
    }

    distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        let dims = Dimensions::new(37, 19);
        for idx in [0usize, 36, 37, 702] {
            let (x, y) = dims.coords(idx);
            assert_eq!(dims.index(x, y), idx);
        }
    }

    #[test]
    fn wrap_x_neighbor_crosses_seam() {
        let dims = Dimensions::new(8, 4);
        assert_eq!(neighbor_index(dims, 0, 1, -1, 0, true), Some(dims.index(7, 1)));
        assert_eq!(neighbor_index(dims, 0, 1, -1, 0, false), None);
        // За верхним краем соседа нет независимо от wrap
        assert_eq!(neighbor_index(dims, 3, 0, 0, -1, true), None);
    }

    #[test]
    fn smooth_preserves_length_and_mean_of_uniform_field() {
        let dims = Dimensions::new(16, 8);
        let mut data = vec![0.5; dims.size()];
        smooth_field(&mut data, dims, 2, true);
        assert_eq!(data.len(), dims.size());
        for v in &data {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn distance_field_counts_steps_from_source() {
        let dims = Dimensions::new(5, 1);
        let mut sources = vec![0u8; dims.size()];
        sources[0] = 1;
        let dist = distance_field(&sources, dims, false);
        assert_eq!(dist, vec![0, 1, 2, 3, 4]);

        // С wrap путь через шов короче
        let dist_wrap = distance_field(&sources, dims, true);
        assert_eq!(dist_wrap, vec![0, 1, 2, 2, 1]);
    }
}
