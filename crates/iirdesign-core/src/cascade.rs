//! Runnable biquad cascade for a finished design
//!
//! High-order transfer functions are numerically fragile in direct form, so a
//! [`FilterDesign`] is run as a chain of second-order sections built from its
//! quadratic factors. First-order factors are paired up into one section.
//!
//! ## Example
//!
//! ```rust
//! use iirdesign_core::prelude::*;
//!
//! let req = FilterRequirements::builder()
//!     .order(4)
//!     .sampling_frequency(8_000.0)
//!     .passband_edge(1_000.0)
//!     .build();
//! let design = design_iir_filter(&req).unwrap();
//!
//! let mut filter = BiquadCascade::from_design(&design);
//! let output = filter.process_block(&[1.0; 64]);
//! assert_eq!(output.len(), 64);
//! ```

use crate::types::{FilterDesign, QuadraticFactor};
use num_complex::Complex64;
use std::f64::consts::PI;

/// A single second-order section.
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
///
/// Runs in Direct Form II Transposed.
#[derive(Debug, Clone, PartialEq)]
pub struct Biquad {
    /// Numerator coefficients [b0, b1, b2]
    b: [f64; 3],
    /// Denominator coefficients [a1, a2] (a0 is 1)
    a: [f64; 2],
    state: [f64; 2],
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self {
            b,
            a,
            state: [0.0; 2],
        }
    }

    /// Pass-through section
    pub fn unity() -> Self {
        Self::new([1.0, 0.0, 0.0], [0.0, 0.0])
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b[0] * input + self.state[0];
        self.state[0] = self.b[1] * input - self.a[0] * output + self.state[1];
        self.state[1] = self.b[2] * input - self.a[1] * output;
        output
    }

    pub fn reset(&mut self) {
        self.state = [0.0; 2];
    }

    pub fn numerator(&self) -> &[f64; 3] {
        &self.b
    }

    pub fn denominator(&self) -> &[f64; 2] {
        &self.a
    }

    /// Poles inside the unit circle (stability triangle of `a1`, `a2`).
    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }

    fn response_at(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = 1.0 + z_inv * self.a[0] + z_inv2 * self.a[1];
        num / den
    }
}

/// Cascade of [`Biquad`] sections with an input gain.
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadCascade {
    sections: Vec<Biquad>,
    gain: f64,
    sample_rate: f64,
}

impl BiquadCascade {
    pub fn new(sections: Vec<Biquad>, gain: f64, sample_rate: f64) -> Self {
        Self {
            sections,
            gain,
            sample_rate,
        }
    }

    /// Pair up the pole and zero factors of `design` into sections.
    pub fn from_design(design: &FilterDesign) -> Self {
        let mut numerators = second_order_terms(design.zero_factors());
        let mut denominators = second_order_terms(design.pole_factors());

        let count = numerators.len().max(denominators.len());
        numerators.resize(count, [1.0, 0.0, 0.0]);
        denominators.resize(count, [1.0, 0.0, 0.0]);

        let sections = numerators
            .into_iter()
            .zip(denominators)
            .map(|(b, a)| Biquad::new(b, [a[1], a[2]]))
            .collect::<Vec<_>>();

        tracing::debug!(
            sections = sections.len(),
            gain = design.gain,
            "biquad cascade built"
        );
        Self::new(sections, design.gain, design.sampling_frequency)
    }

    pub fn process(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input * self.gain, |x, section| section.process(x))
    }

    pub fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&x| self.process(x)).collect()
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }

    /// Complex response H(e^jw) at `freq_hz`.
    pub fn frequency_response(&self, freq_hz: f64) -> Complex64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(self.gain, 0.0), |acc, s| acc * s.response_at(z_inv))
    }

    pub fn magnitude_response_db(&self, freq_hz: f64) -> f64 {
        20.0 * self.frequency_response(freq_hz).norm().log10()
    }
}

/// `[1, b1, b2]` per quadratic factor, with consecutive first-order factors
/// multiplied together.
fn second_order_terms<'a>(factors: impl Iterator<Item = &'a QuadraticFactor>) -> Vec<[f64; 3]> {
    let mut terms = Vec::new();
    let mut pending: Option<f64> = None;

    for q in factors {
        if !q.is_first_order() {
            terms.push([1.0, q.b1, q.b2]);
            continue;
        }
        match pending.take() {
            Some(p) => terms.push([1.0, p + q.b1, p * q.b1]),
            None => pending = Some(q.b1),
        }
    }
    if let Some(p) = pending {
        terms.push([1.0, p, 0.0]);
    }
    terms
}
