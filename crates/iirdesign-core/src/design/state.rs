//! Working state threaded through the design stages

use crate::types::BandEdges;
use num_complex::Complex64;

/// Intermediate values of one design run.
///
/// Created by [`super::prepare::prepare`], filled in by the later stages and
/// dropped once the [`crate::FilterDesign`] has been assembled.
#[derive(Debug, Clone, Default)]
pub(crate) struct DesignState {
    /// Divisor applied to the gain (even-order Chebyshev/elliptic ripple offset)
    pub gain_scale: f64,
    /// Elliptic ripple parameter, or the Chebyshev one once poles are placed
    pub ripple_epsilon: f64,
    /// `10^(ripple_db / 20)` for Chebyshev designs
    pub chebyshev_phi: f64,
    pub nyquist_frequency: f64,
    /// Pre-warped analog bandwidth `tan(pi·bw/fs)`
    pub tan_angle_frequency: f64,
    pub stopband_edge: Option<f64>,
    pub wc: f64,
    pub wr: f64,
    /// Cosine of the band centre angle
    pub cgam: f64,
    pub chebyshev_band_cbp: f64,

    pub elliptic_k: f64,
    pub elliptic_u: f64,
    pub elliptic_m: f64,
    pub kk: f64,
    pub kpk: f64,
    pub stopband_attenuation_db: Option<f64>,
    pub band_edges: Option<BandEdges>,

    /// s-plane poles followed by zeros
    pub s_plane_roots: Vec<Complex64>,
    pub n_poles: usize,
    pub n_zeros: usize,

    /// z-plane poles followed by zeros
    pub z_plane_roots: Vec<Complex64>,
    pub n_solved_poles: usize,
}

impl DesignState {
    pub fn s_poles(&self) -> &[Complex64] {
        &self.s_plane_roots[..self.n_poles]
    }

    pub fn s_zeros(&self) -> &[Complex64] {
        &self.s_plane_roots[self.n_poles..self.n_poles + self.n_zeros]
    }

    pub fn z_poles(&self) -> &[Complex64] {
        &self.z_plane_roots[..self.n_solved_poles]
    }

    /// Valid once zero completion has run
    pub fn z_zeros(&self) -> &[Complex64] {
        &self.z_plane_roots[self.n_solved_poles..2 * self.n_solved_poles]
    }
}
