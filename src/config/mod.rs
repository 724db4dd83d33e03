// src/config/mod.rs

pub mod sea_config;

// Re-export main types for convenience
pub use sea_config::{SeaConfig, MuellerConfig, ProcessConfig, KangarooConfig, SeaStageConfig};
