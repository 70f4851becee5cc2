// src/context.rs
//! Контекст прогона
//!
//! Всё состояние одной генерации: размеры, сид, фабрика случайности,
//! пер-тайловые поля, хранилище артефактов, диагностика и рукоятка адаптера
//! хоста. Контекст создаётся заново на каждый прогон и выбрасывается после
//! завершения размещения. Дисциплина владения: артефакт пишет только шаг,
//! объявивший соответствующий `provides`; читают все, кто объявил `requires`.

use crate::adapter::HostAdapter;
use crate::config::WorldParams;
use crate::grid::Dimensions;
use crate::pipeline::artifact::ArtifactStore;
use crate::rng::StreamRng;

/// Пер-тайловые буферы полей, зеркалируемые в хостовый движок.
/// Все буферы имеют длину `width*height`.
#[derive(Debug, Clone)]
pub struct MapFields {
    pub elevation: Vec<i16>,
    pub terrain: Vec<u8>,
    /// Маска суши: 1 — суша, 0 — вода.
    pub land: Vec<u8>,
    /// Осадки 0..200 в единицах хоста.
    pub rainfall: Vec<u8>,
    /// Температура поверхности в °C.
    pub temperature: Vec<f32>,
    pub biome: Vec<u8>,
    /// Код особенности, `-1` — особенности нет.
    pub feature: Vec<i16>,
}

impl MapFields {
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        let size = dims.size();
        Self {
            elevation: vec![0; size],
            terrain: vec![0; size],
            land: vec![0; size],
            rainfall: vec![0; size],
            temperature: vec![0.0; size],
            biome: vec![0; size],
            feature: vec![-1; size],
        }
    }
}

/// Диагностика прогона: тайминги шагов и предупреждения.
/// Жизненный цикл привязан к прогону (`init`/`reset`), никаких глобальных
/// синглтонов.
#[derive(Debug, Default)]
pub struct Metrics {
    pub timings: Vec<(String, f64)>,
    pub warnings: Vec<String>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.timings.clear();
        self.warnings.clear();
    }

    pub fn record_timing(&mut self, step_id: &str, duration_ms: f64) {
        self.timings.push((step_id.to_string(), duration_ms));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Состояние одной генерации карты.
pub struct MapContext<'a> {
    pub dims: Dimensions,
    pub seed: u64,
    pub wrap_x: bool,
    /// Широтные границы (юг, север) в градусах.
    pub latitude: (f32, f32),
    pub rng: StreamRng,
    pub fields: MapFields,
    pub artifacts: ArtifactStore,
    pub metrics: Metrics,
    pub adapter: &'a mut dyn HostAdapter,
}

impl<'a> MapContext<'a> {
    #[must_use]
    pub fn new(params: &WorldParams, adapter: &'a mut dyn HostAdapter) -> Self {
        let dims = params.dimensions();
        Self {
            dims,
            seed: params.seed,
            wrap_x: params.wrap_x,
            latitude: (params.latitude.south as f32, params.latitude.north as f32),
            rng: StreamRng::new(params.seed),
            fields: MapFields::new(dims),
            artifacts: ArtifactStore::new(),
            metrics: Metrics::new(),
            adapter,
        }
    }

    /// Широта строки `y` в градусах.
    #[must_use]
    pub fn latitude_of_row(&self, y: u32) -> f32 {
        self.dims.latitude_of_row(y, self.latitude.0, self.latitude.1)
    }

    /// Абсолютная нормированная широта строки: 0 на экваторе, 1 на полюсе.
    #[must_use]
    pub fn latitude_factor(&self, y: u32) -> f32 {
        (self.latitude_of_row(y) / 90.0).abs().clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;

    #[test]
    fn fields_match_dimensions() {
        let params = WorldParams::new(1, 37, 19);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let ctx = MapContext::new(&params, &mut adapter);
        assert_eq!(ctx.fields.elevation.len(), 37 * 19);
        assert_eq!(ctx.fields.feature.len(), 37 * 19);
    }

    #[test]
    fn latitude_spans_bounds() {
        let params = WorldParams::new(1, 10, 5);
        let mut adapter = MockAdapter::new(params.dimensions(), params.seed);
        let ctx = MapContext::new(&params, &mut adapter);
        assert!((ctx.latitude_of_row(0) - 80.0).abs() < 1e-3);
        assert!((ctx.latitude_of_row(4) + 80.0).abs() < 1e-3);
        assert!((ctx.latitude_of_row(2)).abs() < 1e-3);
    }
}
