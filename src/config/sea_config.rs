// src/config/sea_config.rs

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeaConfig {
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Rayon thread count for the Mueller stage; None uses a quarter of
    /// the cores.
    pub threads: Option<usize>,

    pub mueller: MuellerConfig,
    pub process: ProcessConfig,
    pub kangaroo: KangarooConfig,
    pub sea: SeaStageConfig,
}

/// Modular-polynomial generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuellerConfig {
    /// Primes whose s-parameter reaches this value are skipped. The
    /// default of 12 never skips (s is at most 6); lower it to 2, 3 or
    /// 6 to trade coverage for time and memory.
    pub skip: u32,
}

/// Raw-stream reduction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Scan downward instead of upward when the supplied modulus is
    /// composite.
    pub down: bool,
}

/// Kangaroo tuning. The defaults are empirical; tests shrink them to
/// exercise edge behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KangarooConfig {
    /// Kangaroos per herd (tame and wild each).
    pub herd: usize,
    /// Distinguished-point store capacity per side.
    pub store: usize,
    /// Cap on the distinguished-point mask width in bits.
    pub dp_bit_cap: u32,
    /// Seed for point selection and herd placement; None draws entropy.
    pub seed: Option<u64>,
}

/// SEA stage toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeaStageConfig {
    /// Widen the Atkin search past the single-candidate r = 2 subcase.
    /// Extra candidates are surfaced in logs but not used for the CRT.
    pub process_atkin: bool,
    /// Treat running out of modular polynomials as an error instead of
    /// falling through to a larger kangaroo interval.
    pub require_full_coverage: bool,
}

impl Default for SeaConfig {
    fn default() -> Self {
        SeaConfig {
            log_level: "info".to_string(),
            threads: None,
            mueller: MuellerConfig::default(),
            process: ProcessConfig::default(),
            kangaroo: KangarooConfig::default(),
            sea: SeaStageConfig::default(),
        }
    }
}

impl Default for MuellerConfig {
    fn default() -> Self {
        MuellerConfig { skip: 12 }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        ProcessConfig { down: false }
    }
}

impl Default for KangarooConfig {
    fn default() -> Self {
        KangarooConfig {
            herd: 5,
            store: 80,
            dp_bit_cap: 30,
            seed: None,
        }
    }
}

impl Default for SeaStageConfig {
    fn default() -> Self {
        SeaStageConfig {
            process_atkin: false,
            require_full_coverage: false,
        }
    }
}

impl SeaConfig {
    /// Load configuration with precedence: config file, then environment
    /// variables (SEA_ prefix), then defaults.
    pub fn load() -> Result<Self, ConfigError> {
        // threads and kangaroo.seed are Options; absent keys read as None
        let mut builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("mueller.skip", 12)?
            .set_default("process.down", false)?
            .set_default("kangaroo.herd", 5)?
            .set_default("kangaroo.store", 80)?
            .set_default("kangaroo.dp_bit_cap", 30)?
            .set_default("sea.process_atkin", false)?
            .set_default("sea.require_full_coverage", false)?;

        if Path::new("sea.toml").exists() {
            builder = builder.add_source(File::with_name("sea.toml"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SEA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SeaConfig::default();
        assert_eq!(c.mueller.skip, 12);
        assert_eq!(c.kangaroo.herd, 5);
        assert_eq!(c.kangaroo.store, 80);
        assert_eq!(c.kangaroo.dp_bit_cap, 30);
        assert!(!c.process.down);
        assert!(!c.sea.process_atkin);
    }
}
