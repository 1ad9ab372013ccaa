//! Core types for IIR filter design
//!
//! A design request is a [`FilterRequirements`] value; a successful design is a
//! [`FilterDesign`]. Everything in between is private to [`crate::design`].
//!
//! ## Frequency conventions
//!
//! All frequencies are in Hz and must lie strictly inside `(0, fs/2)`. For band
//! topologies the two pass band edges may be given in either order; the larger
//! one is always treated as the upper edge.
//!
//! ```text
//!   LowPass     |‾‾‾‾‾\____          HighPass   ____/‾‾‾‾‾|
//!               0    pb  sb  fs/2               0  sb  pb    fs/2
//!
//!   BandPass    ___/‾‾‾‾\___         BandStop   ‾‾‾\____/‾‾‾
//!               0  pb2  pb   fs/2               0  pb2  pb   fs/2
//! ```

use crate::math::MathError;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// Result type for design operations
pub type DesignResult<T> = Result<T, DesignError>;

/// Working-array capacity of the designer, in complex slots.
pub const STORAGE_CAPACITY: usize = 300;

/// Errors that can occur while designing a filter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DesignError {
    /// The requirements are inconsistent or out of range
    #[error("Invalid specification: {0}")]
    Configuration(String),

    /// The order needs more root storage than the designer provides
    #[error("storage arrays too small: order {order} needs {required} slots, capacity is {capacity}")]
    Capacity {
        order: usize,
        required: usize,
        capacity: usize,
    },

    /// A special function was evaluated outside of its domain
    #[error("Numeric domain error: {0}")]
    Numeric(#[from] MathError),
}

impl DesignError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        DesignError::Configuration(msg.into())
    }
}

/// Filter family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Maximally flat pass band
    Butterworth,
    /// Equiripple pass band, monotonic stop band
    Chebyshev,
    /// Equiripple pass band and stop band
    Elliptic,
}

impl FilterKind {
    /// Legacy numeric code (1, 2, 3)
    pub fn code(self) -> u32 {
        match self {
            FilterKind::Butterworth => 1,
            FilterKind::Chebyshev => 2,
            FilterKind::Elliptic => 3,
        }
    }

    /// Whether the pass band ripple parameter is used
    pub fn uses_ripple(self) -> bool {
        self != FilterKind::Butterworth
    }
}

impl TryFrom<u32> for FilterKind {
    type Error = DesignError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(FilterKind::Butterworth),
            2 => Ok(FilterKind::Chebyshev),
            3 => Ok(FilterKind::Elliptic),
            _ => Err(DesignError::config("unknown kind")),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Butterworth => write!(f, "Butterworth"),
            FilterKind::Chebyshev => write!(f, "Chebyshev"),
            FilterKind::Elliptic => write!(f, "Elliptic"),
        }
    }
}

/// Frequency-selective shape of the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTopology {
    LowPass,
    HighPass,
    BandPass,
    BandStop,
}

impl FilterTopology {
    /// Legacy numeric code: 1 = low pass, 2 = band pass, 3 = high pass,
    /// 4 = band stop.
    pub fn code(self) -> u32 {
        match self {
            FilterTopology::LowPass => 1,
            FilterTopology::BandPass => 2,
            FilterTopology::HighPass => 3,
            FilterTopology::BandStop => 4,
        }
    }

    /// Band pass or band stop (two pass band edges, doubled root count)
    pub fn is_band(self) -> bool {
        matches!(self, FilterTopology::BandPass | FilterTopology::BandStop)
    }

    /// High pass or band stop, designed through the `s -> 1/s` mapping
    pub fn is_inverted(self) -> bool {
        matches!(self, FilterTopology::HighPass | FilterTopology::BandStop)
    }
}

impl TryFrom<u32> for FilterTopology {
    type Error = DesignError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(FilterTopology::LowPass),
            2 => Ok(FilterTopology::BandPass),
            3 => Ok(FilterTopology::HighPass),
            4 => Ok(FilterTopology::BandStop),
            _ => Err(DesignError::config("unknown topology")),
        }
    }
}

impl fmt::Display for FilterTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTopology::LowPass => write!(f, "low pass"),
            FilterTopology::HighPass => write!(f, "high pass"),
            FilterTopology::BandPass => write!(f, "band pass"),
            FilterTopology::BandStop => write!(f, "band stop"),
        }
    }
}

/// Everything needed to design one filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequirements {
    pub kind: FilterKind,
    pub topology: FilterTopology,
    pub order: usize,
    /// Pass band ripple in dB (Chebyshev and elliptic only)
    #[serde(default)]
    pub passband_ripple_db: f64,
    /// Sampling frequency in Hz
    pub sampling_frequency: f64,
    /// Pass band edge in Hz
    pub passband_edge: f64,
    /// Second pass band edge in Hz (band pass and band stop only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passband_edge2: Option<f64>,
    /// Stop band edge in Hz (elliptic only, preferred over `stopband_db`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopband_edge: Option<f64>,
    /// Stop band attenuation as a negative dB value (elliptic only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopband_db: Option<f64>,
}

impl Default for FilterRequirements {
    fn default() -> Self {
        Self {
            kind: FilterKind::Butterworth,
            topology: FilterTopology::LowPass,
            order: 4,
            passband_ripple_db: 0.0,
            sampling_frequency: 44_100.0,
            passband_edge: 1_000.0,
            passband_edge2: None,
            stopband_edge: None,
            stopband_db: None,
        }
    }
}

impl FilterRequirements {
    /// Create a new builder for filter requirements
    pub fn builder() -> FilterRequirementsBuilder {
        FilterRequirementsBuilder::default()
    }

    /// Nyquist frequency in Hz
    pub fn nyquist_frequency(&self) -> f64 {
        0.5 * self.sampling_frequency
    }
}

/// Builder for [`FilterRequirements`]
///
/// Values are not checked here; [`crate::design_iir_filter`] rejects
/// inconsistent requirements.
#[derive(Debug, Default)]
pub struct FilterRequirementsBuilder {
    requirements: FilterRequirements,
}

impl FilterRequirementsBuilder {
    pub fn kind(mut self, kind: FilterKind) -> Self {
        self.requirements.kind = kind;
        self
    }

    pub fn topology(mut self, topology: FilterTopology) -> Self {
        self.requirements.topology = topology;
        self
    }

    pub fn order(mut self, order: usize) -> Self {
        self.requirements.order = order;
        self
    }

    pub fn passband_ripple_db(mut self, ripple_db: f64) -> Self {
        self.requirements.passband_ripple_db = ripple_db;
        self
    }

    pub fn sampling_frequency(mut self, fs: f64) -> Self {
        self.requirements.sampling_frequency = fs;
        self
    }

    pub fn passband_edge(mut self, hz: f64) -> Self {
        self.requirements.passband_edge = hz;
        self
    }

    pub fn passband_edge2(mut self, hz: f64) -> Self {
        self.requirements.passband_edge2 = Some(hz);
        self
    }

    /// Both pass band edges at once (order does not matter)
    pub fn passband(self, lower_hz: f64, upper_hz: f64) -> Self {
        self.passband_edge(upper_hz).passband_edge2(lower_hz)
    }

    pub fn stopband_edge(mut self, hz: f64) -> Self {
        self.requirements.stopband_edge = Some(hz);
        self
    }

    pub fn stopband_db(mut self, db: f64) -> Self {
        self.requirements.stopband_db = Some(db);
        self
    }

    pub fn build(self) -> FilterRequirements {
        self.requirements
    }
}

/// One first- or second-order factor of the transfer function.
///
/// The factor is `b0·z² + b1·z + b2` in positive powers of `z`, equivalently
/// `b0 + b1·z⁻¹ + b2·z⁻²`. Real roots give a first-order factor with `b2 == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticFactor {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    /// Resonant frequency in Hz (Nyquist for first-order factors)
    pub resonant_freq_hz: f64,
    /// Gain at resonance (at Nyquist for first-order factors)
    pub gain_at_resonance: f64,
    pub gain_at_dc: f64,
    /// Denominator factor if true, numerator factor otherwise
    pub is_pole: bool,
    /// The z-plane root this factor was built from (upper half plane)
    pub root: Complex64,
}

impl QuadraticFactor {
    pub fn is_first_order(&self) -> bool {
        self.b2 == 0.0
    }

    /// Coefficients of `z⁻⁰, z⁻¹, z⁻²`
    pub fn coefficients(&self) -> [f64; 3] {
        [self.b0, self.b1, self.b2]
    }
}

/// One row of the tabulated magnitude response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponsePoint {
    pub frequency_hz: f64,
    /// Magnitude in dB, `-999.99` where the magnitude vanishes
    pub gain_db: f64,
}

/// A band edge, or a pair of band edges for band topologies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgePair {
    /// Lower edge (band topologies only)
    pub lower: Option<f64>,
    pub upper: f64,
}

/// Pass and stop band edges as realised by an elliptic design
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandEdges {
    pub passband: EdgePair,
    pub stopband: EdgePair,
}

/// A finished filter design.
///
/// Coefficient index `k` belongs to `z⁻ᵏ`. The denominator is monic and the
/// numerator already includes [`FilterDesign::gain`]:
///
/// ```text
///          numerator[0] + numerator[1] z⁻¹ + ... + numerator[n] z⁻ⁿ
///   H(z) = --------------------------------------------------------
///                 1 + denominator[1] z⁻¹ + ... + denominator[n] z⁻ⁿ
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDesign {
    pub kind: FilterKind,
    pub topology: FilterTopology,
    pub order: usize,
    pub sampling_frequency: f64,
    pub nyquist_frequency: f64,
    pub denominator_coeffs: Vec<f64>,
    pub numerator_coeffs: Vec<f64>,
    pub gain: f64,
    /// Pole and zero factors, interleaved in root order
    pub biquads: Vec<QuadraticFactor>,
    pub response_table: Vec<ResponsePoint>,
    /// z-plane poles
    pub poles: Vec<Complex64>,
    /// z-plane zeros
    pub zeros: Vec<Complex64>,
    /// Given or derived stop band edge (elliptic only)
    pub stopband_edge: Option<f64>,
    /// Attenuation reached in the stop band, in dB (elliptic only)
    pub stopband_attenuation_db: Option<f64>,
    /// Realised band edges (elliptic only)
    pub band_edges: Option<BandEdges>,
}

impl FilterDesign {
    /// Number of z-plane poles (and zeros)
    pub fn degree(&self) -> usize {
        self.poles.len()
    }

    pub fn pole_factors(&self) -> impl Iterator<Item = &QuadraticFactor> {
        self.biquads.iter().filter(|q| q.is_pole)
    }

    pub fn zero_factors(&self) -> impl Iterator<Item = &QuadraticFactor> {
        self.biquads.iter().filter(|q| !q.is_pole)
    }
}
