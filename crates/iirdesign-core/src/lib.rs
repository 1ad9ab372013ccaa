//! # IIR Filter Design
//!
//! Designs Butterworth, Chebyshev (type I) and elliptic (Cauer) recursive
//! filters in low pass, high pass, band pass and band stop form, for a given
//! sampling frequency.
//!
//! ## Overview
//!
//! - **Analog prototype**: poles (and for elliptic filters, zeros) of the
//!   normalised low pass prototype, from circle, ellipse or Jacobian
//!   elliptic functions
//! - **Bilinear transform**: pre-warped mapping into the z-plane, with the
//!   low pass to band pass/band stop transformation folded in
//! - **Expansion**: numerator/denominator polynomials and gain normalisation
//! - **Report**: quadratic factors with resonance data and a tabulated
//!   magnitude response
//!
//! ## Signal Flow
//!
//! ```text
//! FilterRequirements → s-plane roots → z-plane roots → H(z) → FilterDesign
//!                                                              ↓
//!                                                        BiquadCascade
//! ```
//!
//! ## Example
//!
//! ```rust
//! use iirdesign_core::prelude::*;
//!
//! let req = FilterRequirements::builder()
//!     .kind(FilterKind::Elliptic)
//!     .topology(FilterTopology::LowPass)
//!     .order(3)
//!     .passband_ripple_db(1.0)
//!     .stopband_db(-40.0)
//!     .sampling_frequency(8_000.0)
//!     .passband_edge(1_000.0)
//!     .build();
//!
//! let design = design_iir_filter(&req).unwrap();
//! assert!(design.stopband_edge.unwrap() > 1_000.0);
//!
//! let mut filter = BiquadCascade::from_design(&design);
//! let y = filter.process(1.0);
//! assert!(y.is_finite());
//! ```

pub mod cascade;
pub mod config;
pub mod design;
pub mod logging;
pub mod math;
pub mod types;

pub use cascade::{Biquad, BiquadCascade};
pub use config::{ConfigError, DesignConfig};
pub use design::{check_requirements, design_iir_filter};
pub use math::MathError;
pub use types::{
    BandEdges, DesignError, DesignResult, EdgePair, FilterDesign, FilterKind,
    FilterRequirements, FilterRequirementsBuilder, FilterTopology, QuadraticFactor,
    ResponsePoint,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cascade::BiquadCascade;
    pub use crate::design::design_iir_filter;
    pub use crate::types::{
        DesignError, DesignResult, FilterDesign, FilterKind, FilterRequirements,
        FilterTopology, QuadraticFactor, ResponsePoint,
    };
}
