// src/foundation/crust.rs
//! Кора
//!
//! Каждой ячейке сетки назначается тип коры (континентальная/океаническая) и
//! байт возраста. Оба розыгрыша помечены меткой ячейки, поэтому результат не
//! зависит от порядка обхода. Кора сама по себе не решает «суша или вода» —
//! это делает уровень моря в морфологии; тектоника лишь смещает процессы.

use rand::Rng;

use crate::foundation::mesh::Mesh;
use crate::rng::StreamRng;

/// Тип коры ячейки.
pub const CRUST_OCEANIC: u8 = 0;
pub const CRUST_CONTINENTAL: u8 = 1;

/// Кора: тип и возраст на ячейку сетки.
#[derive(Debug, Clone)]
pub struct Crust {
    pub kind: Vec<u8>,
    pub age: Vec<u8>,
}

/// Разыгрывает кору: континентальная с вероятностью `continental_ratio`.
#[must_use]
pub fn assign_crust(mesh: &Mesh, continental_ratio: f64, rng: &StreamRng, step_id: &str) -> Crust {
    let mut kind = Vec::with_capacity(mesh.cell_count);
    let mut age = Vec::with_capacity(mesh.cell_count);

    for cell in 0..mesh.cell_count {
        let label = format!("cell-{cell}");
        let mut stream = rng.stream(step_id, &label);
        let roll: f64 = stream.gen_range(0.0..1.0);
        kind.push(if roll < continental_ratio {
            CRUST_CONTINENTAL
        } else {
            CRUST_OCEANIC
        });
        age.push(stream.gen_range(0..=255u32) as u8);
    }

    Crust { kind, age }
}
