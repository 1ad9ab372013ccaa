//! Numeric kernels used by the filter designer
//!
//! - [`complex`]: overflow-aware magnitude, square root and division on top of
//!   [`num_complex::Complex64`]
//! - [`elliptic`]: complete/incomplete elliptic integrals of the first kind,
//!   Jacobian elliptic functions and the nome-to-modulus theta series
//!
//! None of these functions keep state between calls. Domain and range failures
//! are returned as [`MathError`] values.

pub mod complex;
pub mod elliptic;

pub use complex::ComplexExt;
pub use elliptic::{ellik, ellpj, ellpk, jacobi_theta_by_nome, JacobiElliptic};

/// Machine epsilon for IEEE doubles (2^-53).
pub const MACHEP: f64 = 1.110_223_024_625_156_540_42e-16;

/// Largest finite double.
pub const MAXNUM: f64 = f64::MAX;

/// `10 / ln(10)`, converts a natural log of a power ratio to decibels.
pub const DECIBEL_FACTOR: f64 = 4.342_944_819_032_518_276_51;

/// Errors raised by the special-function kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("{function}: argument outside of domain")]
    Domain { function: &'static str },

    #[error("{function}: argument singularity")]
    Singularity { function: &'static str },

    #[error("{function}: overflow range error")]
    Overflow { function: &'static str },
}

/// Result type for the math kernels
pub type MathResult<T> = Result<T, MathError>;
