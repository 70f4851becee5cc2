// src/ecology/mod.rs
//! Фаза экологии
//!
//! Биомы по пороговым таблицам и особенности в два шага: чистое планирование
//! взвешенных намерений и применение через предикат легальности хоста.

pub mod biomes;
pub mod features;
pub mod steps;

pub use biomes::{Biome, BiomeConfig, BiomeMap};
pub use features::{FeatureConfig, FeatureIntent, FeaturePlan};
pub use steps::{
    AppliedFeatures, ApplyFeaturesStep, ClassifyBiomesStep, PlanFeaturesStep, ARTIFACT_BIOMES,
    ARTIFACT_FEATURES_APPLIED, ARTIFACT_FEATURE_PLAN,
};
