// src/foundation/tectonics.rs
//! Тектонические скаляры
//!
//! Производные поля на ячейку: подъём, рифт, сдвиг, вулканизм, трещиноватость
//! и накопленный подъём. Каждый скаляр выводится из типа ближайшей границы и
//! расстояния до неё и зажимается в диапазон 0..1. Эти поля — только смещения
//! для морфологии; сами по себе они не решают «суша или вода».

use std::collections::VecDeque;

use crate::foundation::crust::Crust;
use crate::foundation::mesh::Mesh;
use crate::foundation::plates::{BoundaryKind, PlateGraph};

/// Тектонические поля на ячейку сетки.
#[derive(Debug, Clone)]
pub struct Tectonics {
    pub uplift: Vec<f32>,
    pub rift: Vec<f32>,
    pub shear: Vec<f32>,
    pub volcanism: Vec<f32>,
    pub fracture: Vec<f32>,
    pub cumulative_uplift: Vec<f32>,
    /// Расстояние до ближайшей границы в шагах BFS по ячейкам.
    pub boundary_distance: Vec<u16>,
}

/// Выводит тектонические скаляры из границ плит.
///
/// `reach` — дальность влияния границы в ячейках, `falloff` — экспонента
/// затухания, `volcanism_scale` — множитель ручки вулканизма.
#[must_use]
pub fn derive_tectonics(
    mesh: &Mesh,
    crust: &Crust,
    plates: &PlateGraph,
    reach: u32,
    falloff: f32,
    volcanism_scale: f32,
) -> Tectonics {
    let cells = mesh.cell_count;

    // === 1. BFS-расстояние до границы ===
    let mut distance = vec![u16::MAX; cells];
    let mut queue = VecDeque::new();
    for cell in 0..cells {
        if plates.boundary_kind[cell] != 0 {
            distance[cell] = 0;
            queue.push_back(cell);
        }
    }
    while let Some(cell) = queue.pop_front() {
        let d = distance[cell];
        for &n in mesh.neighbors(cell) {
            let n = n as usize;
            if distance[n] == u16::MAX {
                distance[n] = d.saturating_add(1);
                queue.push_back(n);
            }
        }
    }

    // Ближайший тип/сила границы распространяются вместе с волной BFS
    let mut near_kind = plates.boundary_kind.clone();
    let mut near_strength = plates.boundary_strength.clone();
    {
        let mut queue: VecDeque<usize> = (0..cells).filter(|&c| distance[c] == 0).collect();
        while let Some(cell) = queue.pop_front() {
            for &n in mesh.neighbors(cell) {
                let n = n as usize;
                if near_kind[n] == 0 && distance[n] == distance[cell].saturating_add(1) {
                    near_kind[n] = near_kind[cell];
                    near_strength[n] = near_strength[cell];
                    queue.push_back(n);
                }
            }
        }
    }

    // === 2. Скаляры с затуханием от границы ===
    let reach = reach.max(1) as f32;
    let mut uplift = vec![0.0f32; cells];
    let mut rift = vec![0.0f32; cells];
    let mut shear = vec![0.0f32; cells];
    let mut volcanism = vec![0.0f32; cells];
    let mut fracture = vec![0.0f32; cells];
    let mut cumulative = vec![0.0f32; cells];

    for cell in 0..cells {
        let d = if distance[cell] == u16::MAX {
            reach
        } else {
            distance[cell] as f32
        };
        let decay = (1.0 - d / reach).max(0.0).powf(falloff);
        if decay <= 0.0 {
            continue;
        }
        let strength = near_strength[cell] * decay;

        match near_kind[cell] {
            k if k == BoundaryKind::Convergent as u8 => {
                uplift[cell] = strength;
                shear[cell] = strength * 0.25;
            }
            k if k == BoundaryKind::Divergent as u8 => {
                rift[cell] = strength;
            }
            k if k == BoundaryKind::Transform as u8 => {
                shear[cell] = strength;
            }
            _ => {}
        }

        // Вулканизм: дуги над конвергенцией и рифтовые трещины
        volcanism[cell] =
            ((uplift[cell] * 0.7 + rift[cell] * 0.4) * volcanism_scale).clamp(0.0, 1.0);
        fracture[cell] = (shear[cell] * 0.6 + rift[cell] * 0.5).clamp(0.0, 1.0);

        // Старая кора успела накопить больше подъёма
        let age = crust.age[cell] as f32 / 255.0;
        cumulative[cell] = (uplift[cell] * (0.5 + 0.5 * age)).clamp(0.0, 1.0);

        uplift[cell] = uplift[cell].clamp(0.0, 1.0);
        rift[cell] = rift[cell].clamp(0.0, 1.0);
        shear[cell] = shear[cell].clamp(0.0, 1.0);
    }

    Tectonics {
        uplift,
        rift,
        shear,
        volcanism,
        fracture,
        cumulative_uplift: cumulative,
        boundary_distance: distance,
    }
}

/// Проецирует скаляр с ячеек на тайлы через привязку тайл → ячейка.
#[must_use]
pub fn project_to_tiles(values: &[f32], tile_to_cell: &[u32]) -> Vec<f32> {
    tile_to_cell.iter().map(|&c| values[c as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::crust::assign_crust;
    use crate::foundation::mesh::build_mesh;
    use crate::foundation::plates::{build_plates, Directionality};
    use crate::grid::Dimensions;
    use crate::rng::StreamRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn scalars_are_clamped_and_shaped() {
        let dims = Dimensions::new(40, 24);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let (mesh, _) = build_mesh(dims, true, 48, 1, &mut rng);
        let crust = assign_crust(&mesh, 0.4, &StreamRng::new(2), "s");
        let plates = build_plates(&mesh, 6, Directionality::default(), 0.08, &mut rng);
        let tect = derive_tectonics(&mesh, &crust, &plates, 3, 1.8, 1.0);

        assert_eq!(tect.uplift.len(), mesh.cell_count);
        for field in [
            &tect.uplift,
            &tect.rift,
            &tect.shear,
            &tect.volcanism,
            &tect.fracture,
            &tect.cumulative_uplift,
        ] {
            assert!(field.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn uplift_decays_away_from_boundary() {
        let dims = Dimensions::new(40, 24);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let (mesh, _) = build_mesh(dims, true, 48, 1, &mut rng);
        let crust = assign_crust(&mesh, 0.4, &StreamRng::new(2), "s");
        let plates = build_plates(&mesh, 6, Directionality::default(), 0.08, &mut rng);
        let tect = derive_tectonics(&mesh, &crust, &plates, 3, 1.8, 1.0);

        // Вне радиуса влияния подъёма нет
        for cell in 0..mesh.cell_count {
            if tect.boundary_distance[cell] >= 3 {
                assert_eq!(tect.uplift[cell], 0.0);
            }
        }
    }
}
