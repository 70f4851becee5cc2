// src/foundation/plates.rs
//! Плиты
//!
//! Кластеризует ячейки сетки в плиты (BFS от сидов по смежности), назначает
//! каждой плите вектор движения и классифицирует каждую границу плита-плита
//! как конвергентную, дивергентную или трансформную по относительному движению.

use std::collections::VecDeque;

use petgraph::graph::UnGraph;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::foundation::mesh::Mesh;

/// Классификация границы между плитами.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BoundaryKind {
    Convergent = 1,
    Divergent = 2,
    Transform = 3,
}

/// Направленность движения плит: насколько векторы тянутся к общей оси.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Directionality {
    /// Общая ось движения в градусах.
    pub primary_axis_deg: f64,
    /// Сила притяжения к оси: 0 — независимые углы, 1 — все вдоль оси.
    pub cohesion: f64,
    /// Джиттер угла в градусах, разыгрывается на плиту.
    pub angle_jitter_deg: f64,
}

impl Default for Directionality {
    fn default() -> Self {
        Self {
            primary_axis_deg: 0.0,
            cohesion: 0.35,
            angle_jitter_deg: 25.0,
        }
    }
}

/// Граница между парой ячеек соседних плит.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryEdge {
    pub cell_a: u32,
    pub cell_b: u32,
    pub kind: BoundaryKind,
    /// Сила взаимодействия 0..1 (скорость сближения/расхождения или сдвига).
    pub strength: f32,
}

/// Граф плит: принадлежность ячеек, движение плит и классифицированные границы.
#[derive(Debug, Clone)]
pub struct PlateGraph {
    pub plate_count: usize,
    pub plate_of_cell: Vec<u16>,
    pub motion_x: Vec<f32>,
    pub motion_y: Vec<f32>,
    /// Тип границы на ячейку: 0 — внутренняя, иначе `BoundaryKind as u8`.
    pub boundary_kind: Vec<u8>,
    /// Сила границы на ячейку 0..1.
    pub boundary_strength: Vec<f32>,
    pub edges: Vec<BoundaryEdge>,
    /// Связи на уровне плит: (плита A, плита B, преобладающий тип границы).
    pub plate_links: Vec<(u16, u16, BoundaryKind)>,
}

/// Кластеризация и классификация границ.
pub fn build_plates(
    mesh: &Mesh,
    plate_count: usize,
    directionality: Directionality,
    transform_threshold: f32,
    rng: &mut ChaCha8Rng,
) -> PlateGraph {
    let cells = mesh.cell_count;
    let plate_count = plate_count.clamp(1, cells);

    // === 1. Сиды плит ===
    let mut seeds = Vec::with_capacity(plate_count);
    let mut taken = vec![false; cells];
    while seeds.len() < plate_count {
        let c = rng.gen_range(0..cells);
        if !taken[c] {
            taken[c] = true;
            seeds.push(c);
        }
    }

    // === 2. Рост плит BFS от сидов ===
    let mut plate_of_cell = vec![u16::MAX; cells];
    let mut queue = VecDeque::new();
    for (plate, &seed) in seeds.iter().enumerate() {
        plate_of_cell[seed] = plate as u16;
        queue.push_back(seed);
    }
    while let Some(cell) = queue.pop_front() {
        let plate = plate_of_cell[cell];
        for &n in mesh.neighbors(cell) {
            let n = n as usize;
            if plate_of_cell[n] == u16::MAX {
                plate_of_cell[n] = plate;
                queue.push_back(n);
            }
        }
    }
    // Изолированные ячейки (сетка без смежности) прикрепляем к первой плите
    for p in &mut plate_of_cell {
        if *p == u16::MAX {
            *p = 0;
        }
    }

    // === 3. Движение плит: угол с притяжением к общей оси ===
    let axis = (directionality.primary_axis_deg as f32).to_radians();
    let cohesion = (directionality.cohesion as f32).clamp(0.0, 1.0);
    let jitter = directionality.angle_jitter_deg as f32;

    let mut motion_x = Vec::with_capacity(plate_count);
    let mut motion_y = Vec::with_capacity(plate_count);
    for _ in 0..plate_count {
        let free_angle = (rng.gen_range(0..360) as f32).to_radians();
        let jitter_angle = rng.gen_range(-jitter..=jitter).to_radians();
        // Смешение свободного угла и общей оси по когезии
        let angle = free_angle * (1.0 - cohesion) + (axis + jitter_angle) * cohesion;
        let speed = 0.5 + rng.gen_range(0..100) as f32 / 200.0; // 0.5..1.0
        motion_x.push(angle.cos() * speed);
        motion_y.push(angle.sin() * speed);
    }

    // === 4. Классификация границ ===
    let mut boundary_kind = vec![0u8; cells];
    let mut boundary_strength = vec![0.0f32; cells];
    let mut edges = Vec::new();
    let mut plate_graph: UnGraph<u16, [u32; 3]> = UnGraph::new_undirected();
    let nodes: Vec<_> = (0..plate_count)
        .map(|p| plate_graph.add_node(p as u16))
        .collect();

    for cell in 0..cells {
        for &n in mesh.neighbors(cell) {
            let n = n as usize;
            if n <= cell {
                continue; // каждую пару — один раз
            }
            let pa = plate_of_cell[cell] as usize;
            let pb = plate_of_cell[n] as usize;
            if pa == pb {
                continue;
            }

            // Нормаль границы: от ячейки A к ячейке B (через шов — кратчайшая)
            let dx = mesh.wrapped_dx(mesh.site_x[cell], mesh.site_x[n]);
            let dy = mesh.site_y[n] - mesh.site_y[cell];
            let len = (dx * dx + dy * dy).sqrt().max(1e-6);
            let (nx, ny) = (dx / len, dy / len);

            let rel_x = motion_x[pb] - motion_x[pa];
            let rel_y = motion_y[pb] - motion_y[pa];
            // Положительное сближение — плиты движутся навстречу
            let closing = -(rel_x * nx + rel_y * ny);
            let shear = (rel_x * -ny + rel_y * nx).abs();

            let (kind, strength) = if closing > transform_threshold {
                (BoundaryKind::Convergent, closing)
            } else if closing < -transform_threshold {
                (BoundaryKind::Divergent, -closing)
            } else {
                (BoundaryKind::Transform, shear)
            };
            let strength = strength.clamp(0.0, 2.0) * 0.5; // в 0..1

            edges.push(BoundaryEdge {
                cell_a: cell as u32,
                cell_b: n as u32,
                kind,
                strength,
            });

            for &c in &[cell, n] {
                // Конвергентная граница главенствует над прочими на ячейке
                let rank = |k: u8| match k {
                    1 => 3,
                    2 => 2,
                    3 => 1,
                    _ => 0,
                };
                if rank(kind as u8) > rank(boundary_kind[c])
                    || (boundary_kind[c] == kind as u8 && strength > boundary_strength[c])
                {
                    boundary_kind[c] = kind as u8;
                    boundary_strength[c] = boundary_strength[c].max(strength);
                }
            }

            // Счётчики типов на ребре плит
            let (na, nb) = (nodes[pa], nodes[pb]);
            let slot = match kind {
                BoundaryKind::Convergent => 0,
                BoundaryKind::Divergent => 1,
                BoundaryKind::Transform => 2,
            };
            if let Some(edge) = plate_graph.find_edge(na, nb) {
                plate_graph[edge][slot] += 1;
            } else {
                let mut counts = [0u32; 3];
                counts[slot] = 1;
                plate_graph.add_edge(na, nb, counts);
            }
        }
    }

    // Преобладающий тип на связь плит
    let mut plate_links = Vec::new();
    for edge in plate_graph.edge_indices() {
        let Some((a, b)) = plate_graph.edge_endpoints(edge) else {
            continue;
        };
        let counts = plate_graph[edge];
        let kind = if counts[0] >= counts[1] && counts[0] >= counts[2] {
            BoundaryKind::Convergent
        } else if counts[1] >= counts[2] {
            BoundaryKind::Divergent
        } else {
            BoundaryKind::Transform
        };
        plate_links.push((plate_graph[a], plate_graph[b], kind));
    }
    plate_links.sort_unstable_by_key(|&(a, b, _)| (a, b));

    PlateGraph {
        plate_count,
        plate_of_cell,
        motion_x,
        motion_y,
        boundary_kind,
        boundary_strength,
        edges,
        plate_links,
    }
}
