// src/core/error.rs

use std::io::Error as IoError;
use thiserror::Error;

/// Failure classes of the point-counting pipeline.
#[derive(Debug, Error)]
pub enum SeaError {
    /// Rejected curve or field parameters: composite or tiny modulus,
    /// vanishing discriminant, j-invariant 0 or 1728.
    #[error("bad parameters: {0}")]
    BadParams(String),

    /// Malformed raw or reduced modular-polynomial stream.
    #[error("bad modular polynomial file: {0}")]
    BadModularPolyFile(String),

    /// The supplied modular polynomials cannot push the CRT product past
    /// the kangaroo threshold. Only raised when full coverage is required;
    /// otherwise the stage warns and proceeds with a larger search.
    #[error("modular polynomial file exhausted before the CRT threshold")]
    InsufficientModularPolys,

    /// An internal arithmetic invariant failed. Fatal; the session
    /// boundary reports it upstream as BadParams.
    #[error("sanity check failed: {0}")]
    SanityCheck(String),

    #[error(transparent)]
    Io(#[from] IoError),
}

pub type SeaResult<T> = Result<T, SeaError>;
