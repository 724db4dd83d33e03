// src/core/session.rs

use std::path::{Path, PathBuf};

use log::info;
use num::bigint::Sign;
use num::{BigInt, BigUint};

use crate::config::SeaConfig;
use crate::core::error::{SeaError, SeaResult};
use crate::process::reduce_file;
use crate::sea::count_points;

/// The programmatic surface consumed by the C-ABI wrapper: a raw
/// modular-polynomial file is fixed at init, each order() call reduces
/// it for the requested prime and runs the count, and clear() drops the
/// scratch files.
pub struct SeaSession {
    raw: PathBuf,
    reduced: PathBuf,
    output: PathBuf,
    config: SeaConfig,
}

impl SeaSession {
    pub fn init<P: AsRef<Path>>(mueller_path: P, config: SeaConfig) -> SeaSession {
        let raw = mueller_path.as_ref().to_path_buf();
        let reduced = PathBuf::from(format!("{}.o", raw.display()));
        let output = PathBuf::from(format!("{}.x", raw.display()));
        SeaSession {
            raw,
            reduced,
            output,
            config,
        }
    }

    /// Count points for the curve given as little-endian byte buffers of
    /// equal length. The returned order is a buffer of the same length.
    /// Internal invariant failures surface as BadParams at this boundary.
    pub fn order(&self, p_le: &[u8], a_le: &[u8], b_le: &[u8]) -> SeaResult<Vec<u8>> {
        if p_le.len() != a_le.len() || p_le.len() != b_le.len() {
            return Err(SeaError::BadParams(
                "parameter buffers must share one length".into(),
            ));
        }
        let len = p_le.len();
        let p = BigInt::from(BigUint::from_bytes_le(p_le));
        let a = BigInt::from(BigUint::from_bytes_le(a_le));
        let b = BigInt::from(BigUint::from_bytes_le(b_le));

        let result = (|| {
            let p = reduce_file(&p, &self.raw, &self.reduced, self.config.process.down)?;
            info!("counting points over {}-bit prime", p.bits());
            count_points(&a, &b, &self.reduced, Some(&self.output), &self.config)
        })();

        match result {
            Ok(outcome) => {
                let (_, mut bytes) = outcome.order.to_bytes_le();
                if bytes.len() > len {
                    return Err(SeaError::BadParams(format!(
                        "order needs {} bytes, buffer holds {}",
                        bytes.len(),
                        len
                    )));
                }
                bytes.resize(len, 0);
                debug_assert_eq!(outcome.order.sign(), Sign::Plus);
                Ok(bytes)
            }
            Err(SeaError::SanityCheck(msg)) => Err(SeaError::BadParams(msg)),
            Err(e) => Err(e),
        }
    }

    pub fn clear(&self) -> SeaResult<()> {
        for path in [&self.reduced, &self.output] {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
