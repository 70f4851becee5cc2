// src/preview.rs
//! Превью-рендер слоёв карты
//!
//! Отладочные PNG для CLI: высоты в оттенках серого, биомы в палитре со
//! стартовыми позициями поверх. В сам конвейер рендер не входит — это
//! глазная диагностика результата.

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::ecology::biomes::Biome;
use crate::grid::Dimensions;
use crate::placement::starts::StartPosition;

/// Высоты в оттенках серого, нормированные по фактическому диапазону.
#[must_use]
pub fn elevation_image(dims: Dimensions, elevation: &[i16]) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let min = elevation.iter().copied().min().unwrap_or(0);
    let max = elevation.iter().copied().max().unwrap_or(0);
    let span = f32::from(max - min).max(1.0);

    let data = elevation
        .iter()
        .map(|&e| (f32::from(e - min) / span * 255.0) as u8)
        .collect();
    ImageBuffer::from_raw(dims.width, dims.height, data)
        .unwrap_or_else(|| ImageBuffer::new(dims.width, dims.height))
}

/// Биомы в палитре, старты — белыми кружками.
#[must_use]
pub fn biome_image(dims: Dimensions, biome: &[u8], starts: &[StartPosition]) -> RgbImage {
    let mut img = RgbImage::new(dims.width, dims.height);
    for (idx, &code) in biome.iter().enumerate() {
        let (x, y) = dims.coords(idx);
        img.put_pixel(x, y, Rgb(Biome::from_u8(code).to_rgb()));
    }
    for start in starts {
        draw_filled_circle_mut(&mut img, (start.x as i32, start.y as i32), 1, Rgb([255, 255, 255]));
    }
    img
}

pub fn save_elevation_png(
    dims: Dimensions,
    elevation: &[i16],
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    elevation_image(dims, elevation).save(path)?;
    Ok(())
}

pub fn save_biome_png(
    dims: Dimensions,
    biome: &[u8],
    starts: &[StartPosition],
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    biome_image(dims, biome, starts).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_spans_full_grayscale_range() {
        let dims = Dimensions::new(3, 1);
        let img = elevation_image(dims, &[-100, 0, 100]);
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn starts_are_drawn_over_biomes() {
        let dims = Dimensions::new(4, 4);
        let biome = vec![Biome::Marine.code(); dims.size()];
        let starts = [StartPosition {
            x: 2,
            y: 2,
            player: 0,
            landmass: 1,
        }];
        let img = biome_image(dims, &biome, &starts);
        assert_eq!(img.get_pixel(2, 2).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(0, 0).0, Biome::Marine.to_rgb());
    }
}
