// src/noise.rs
//! Фрактальный шум
//!
//! Обёртка над FastNoiseLite: поле значений 0..1 на тайловую сетку. При
//! включённом wrap поле бесшовно по долготе — шум выбирается в цилиндрических
//! координатах из 3D-пространства. Сид задаётся явно; внутри нет никакой
//! собственной случайности.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::grid::Dimensions;

/// Поле fBm-шума 0..1 размером `width*height`.
#[must_use]
pub fn fractal_field(
    seed: i32,
    dims: Dimensions,
    wrap_x: bool,
    frequency: f32,
    octaves: i32,
) -> Vec<f32> {
    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(seed));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(octaves));
    noise.set_frequency(Some(frequency));

    let width_f = dims.width as f32;
    let radius = width_f / (2.0 * std::f32::consts::PI);

    let sample = |i: usize| {
        let (x, y) = dims.coords(i);
        let value = if wrap_x {
            // Цилиндрические координаты: шов по долготе исчезает
            let angle = (x as f32 / width_f) * 2.0 * std::f32::consts::PI;
            noise.get_noise_3d(radius * angle.cos(), y as f32, radius * angle.sin())
        } else {
            noise.get_noise_2d(x as f32, y as f32)
        };
        (value + 1.0) * 0.5
    };

    #[cfg(feature = "parallel")]
    {
        (0..dims.size()).into_par_iter().map(sample).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..dims.size()).map(sample).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_is_normalized_and_sized() {
        let dims = Dimensions::new(37, 19);
        let field = fractal_field(7, dims, true, 0.05, 3);
        assert_eq!(field.len(), dims.size());
        assert!(field.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn same_seed_same_field() {
        let dims = Dimensions::new(16, 8);
        let a = fractal_field(42, dims, true, 0.05, 3);
        let b = fractal_field(42, dims, true, 0.05, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_changes_field() {
        let dims = Dimensions::new(16, 8);
        let a = fractal_field(1, dims, true, 0.05, 3);
        let b = fractal_field(2, dims, true, 0.05, 3);
        assert_ne!(a, b);
    }
}
