//! Stage 6: quadratic factors, response table and the text report

use super::polynomial::Expansion;
use super::state::DesignState;
use crate::math::{ComplexExt, MAXNUM};
use crate::types::{
    DesignResult, FilterDesign, FilterRequirements, QuadraticFactor, ResponsePoint,
};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;

/// Number of rows in [`FilterDesign::response_table`].
pub const RESPONSE_TABLE_POINTS: usize = 21;

/// dB value reported where the magnitude vanishes.
pub const SILENCE_DB: f64 = -999.99;

/// Imaginary parts at or below this are treated as real roots.
const REAL_ROOT_THRESHOLD: f64 = 1.0e-16;

pub(crate) fn build_design(
    req: &FilterRequirements,
    ds: &DesignState,
    expansion: Expansion,
) -> DesignResult<FilterDesign> {
    let fs = req.sampling_frequency;
    let poles = ds.z_poles().to_vec();
    let zeros = ds.z_zeros().to_vec();

    let biquads = factor_roots(&poles, &zeros, fs);

    let response_table = response_frequencies(ds.nyquist_frequency)
        .map(|f| {
            let magnitude = transfer_magnitude(&poles, &zeros, expansion.gain, fs, f)?;
            Ok(ResponsePoint {
                frequency_hz: f,
                gain_db: magnitude_db(magnitude),
            })
        })
        .collect::<DesignResult<Vec<_>>>()?;

    Ok(FilterDesign {
        kind: req.kind,
        topology: req.topology,
        order: req.order,
        sampling_frequency: fs,
        nyquist_frequency: ds.nyquist_frequency,
        denominator_coeffs: expansion.denominator,
        numerator_coeffs: expansion.numerator,
        gain: expansion.gain,
        biquads,
        response_table,
        poles,
        zeros,
        stopband_edge: ds.stopband_edge,
        stopband_attenuation_db: ds.stopband_attenuation_db,
        band_edges: ds.band_edges,
    })
}

/// Quadratic factors of all roots, pole and zero interleaved.
///
/// Roots with `|im| <= REAL_ROOT_THRESHOLD` count as real and each give a
/// first-order factor; of a complex pair only the upper root is factored.
fn factor_roots(poles: &[Complex64], zeros: &[Complex64], fs: f64) -> Vec<QuadraticFactor> {
    let factored = |r: &Complex64| r.im >= -REAL_ROOT_THRESHOLD;

    let mut biquads = Vec::with_capacity(poles.len() + zeros.len());
    for (pole, zero) in poles.iter().zip(zeros) {
        if factored(pole) {
            biquads.push(quadratic_factor(*pole, true, fs));
        }
        if factored(zero) {
            biquads.push(quadratic_factor(*zero, false, fs));
        }
    }
    biquads
}

/// Factor of a root in the upper half plane, together with its conjugate.
///
/// Resonance and DC gains are those of the zero form `z² + b1·z + b2`; poles
/// report the reciprocal.
pub fn quadratic_factor(root: Complex64, is_pole: bool, sampling_frequency: f64) -> QuadraticFactor {
    let (x, y) = (root.re, root.im);
    let (b1, b2) = if y > REAL_ROOT_THRESHOLD {
        (-2.0 * x, x * x + y * y)
    } else {
        (-x, 0.0)
    };

    let (f, mut g, mut g0) = if b2 != 0.0 {
        let r = b2.sqrt();
        let f = (PI / 2.0 - (-b1 / (2.0 * r)).clamp(-1.0, 1.0).asin()) * sampling_frequency
            / (2.0 * PI);
        let g = (1.0 + r).powi(2) - b1 * b1 / r;
        let g = (1.0 - r) * g.max(0.0).sqrt();
        (f, g, 1.0 + b1 + b2)
    } else {
        // First order: gains at Nyquist and DC
        (0.5 * sampling_frequency, 1.0 - b1, 1.0 + b1)
    };

    if is_pole {
        g = if g != 0.0 { 1.0 / g } else { MAXNUM };
        g0 = if g0 != 0.0 { 1.0 / g0 } else { MAXNUM };
    }

    QuadraticFactor {
        b0: 1.0,
        b1,
        b2,
        resonant_freq_hz: f,
        gain_at_resonance: g,
        gain_at_dc: g0,
        is_pole,
        root,
    }
}

/// Table frequencies: `i · (0.05·nyquist·21)/21` for `i = 0..21`, i.e. DC to
/// Nyquist in steps of `nyquist/20`.
pub fn response_frequencies(nyquist: f64) -> impl Iterator<Item = f64> {
    let limit = 0.05 * nyquist * RESPONSE_TABLE_POINTS as f64;
    let step = limit / RESPONSE_TABLE_POINTS as f64;
    (0..RESPONSE_TABLE_POINTS).map(move |i| i as f64 * step)
}

/// `|gain · Π(zero - x) / Π(pole - x)|` with `x = exp(j·2·pi·f/fs)`.
pub fn transfer_magnitude(
    poles: &[Complex64],
    zeros: &[Complex64],
    gain: f64,
    sampling_frequency: f64,
    frequency: f64,
) -> DesignResult<f64> {
    let x = Complex64::from_polar(1.0, 2.0 * PI * frequency / sampling_frequency);
    let one = Complex64::new(1.0, 0.0);

    let den = poles.iter().fold(one, |acc, &p| acc * (p - x));
    let num = zeros.iter().fold(one, |acc, &z| acc * (z - x));

    let w = num.checked_div(&den)? * gain;
    Ok(w.cabs())
}

/// Magnitude in dB, [`SILENCE_DB`] for a vanishing magnitude.
pub fn magnitude_db(magnitude: f64) -> f64 {
    if magnitude <= 0.0 {
        SILENCE_DB
    } else {
        20.0 * magnitude.log10()
    }
}

impl FilterDesign {
    /// Magnitude of the transfer function at `frequency` Hz.
    pub fn response(&self, frequency: f64) -> DesignResult<f64> {
        transfer_magnitude(
            &self.poles,
            &self.zeros,
            self.gain,
            self.sampling_frequency,
            frequency,
        )
    }

    /// Magnitude in dB at `frequency` Hz.
    pub fn response_db(&self, frequency: f64) -> DesignResult<f64> {
        self.response(frequency).map(magnitude_db)
    }
}

impl fmt::Display for FilterDesign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} filter, order {}, sampling frequency {} Hz",
            self.kind, self.topology, self.order, self.sampling_frequency
        )?;

        if let Some(edges) = &self.band_edges {
            match edges.passband.lower {
                Some(lower) => writeln!(f, "pass band {:.9E} {:.9E}", lower, edges.passband.upper)?,
                None => writeln!(f, "pass band {:.9E}", edges.passband.upper)?,
            }
            match edges.stopband.lower {
                Some(lower) => writeln!(f, "stop band {:.9E} {:.9E}", lower, edges.stopband.upper)?,
                None => writeln!(f, "stop band {:.9E}", edges.stopband.upper)?,
            }
        }
        if let Some(db) = self.stopband_attenuation_db {
            writeln!(f, "stop band attenuation {:.3} dB", db)?;
        }

        writeln!(f, "constant gain factor {:23.13E}", self.gain)?;
        writeln!(f, "z plane Denominator      Numerator")?;
        for (j, (d, n)) in self
            .denominator_coeffs
            .iter()
            .zip(&self.numerator_coeffs)
            .enumerate()
        {
            writeln!(f, "{:2} {:17.9E} {:17.9E}", j, d, n)?;
        }

        writeln!(f, "poles and zeros with corresponding quadratic factors")?;
        for q in &self.biquads {
            let label = if q.is_pole { "pole" } else { "zero" };
            writeln!(f, "{}  {:23.13E} {:23.13E}", label, q.root.re, q.root.im)?;
            writeln!(f, "q. f.")?;
            writeln!(f, "z**2 {:23.13E}", q.b2)?;
            writeln!(f, "z**1 {:23.13E}", q.b1)?;
            writeln!(
                f,
                "f0 {:16.8E}  gain {:12.4E}  DC gain {:12.4E}",
                q.resonant_freq_hz, q.gain_at_resonance, q.gain_at_dc
            )?;
            writeln!(f)?;
        }

        for point in &self.response_table {
            writeln!(f, "{:10.1}  {:10.2}", point.frequency_hz, point.gain_db)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_factor_complex_zero() {
        // Zero pair on the unit circle at fs/4
        let q = quadratic_factor(Complex64::new(0.0, 1.0), false, 8000.0);
        assert_eq!(q.b1, 0.0);
        assert_eq!(q.b2, 1.0);
        assert_relative_eq!(q.resonant_freq_hz, 2000.0, max_relative = 1e-12);
        assert_eq!(q.gain_at_resonance, 0.0);
        assert_eq!(q.gain_at_dc, 2.0);
        assert!(!q.is_first_order());
    }

    #[test]
    fn test_quadratic_factor_real_pole() {
        let q = quadratic_factor(Complex64::new(0.5, 0.0), true, 8000.0);
        assert!(q.is_first_order());
        assert_eq!(q.coefficients(), [1.0, -0.5, 0.0]);
        assert_eq!(q.resonant_freq_hz, 4000.0);
        // 1/(1 + 0.5) at Nyquist, 1/(1 - 0.5) at DC
        assert_relative_eq!(q.gain_at_resonance, 1.0 / 1.5);
        assert_relative_eq!(q.gain_at_dc, 2.0);
    }

    #[test]
    fn test_quadratic_factor_pole_on_dc() {
        // Vanishing DC gain of the zero form reports MAXNUM for a pole
        let q = quadratic_factor(Complex64::new(1.0, 0.0), true, 8000.0);
        assert_eq!(q.gain_at_dc, MAXNUM);
        assert_relative_eq!(q.gain_at_resonance, 0.5);
    }

    #[test]
    fn test_nearly_real_pair_factors_as_two_real_roots() {
        let poles = [Complex64::new(0.5, 1e-17), Complex64::new(0.5, -1e-17)];
        let zeros = [Complex64::new(-1.0, 0.0), Complex64::new(-1.0, 0.0)];
        let biquads = factor_roots(&poles, &zeros, 8000.0);

        assert_eq!(biquads.len(), 4);
        assert!(biquads.iter().all(|q| q.is_first_order()));
        // (1 - 0.5 z⁻¹)² = 1 - z⁻¹ + 0.25 z⁻²
        let pole_b1: Vec<f64> = biquads.iter().filter(|q| q.is_pole).map(|q| q.b1).collect();
        assert_eq!(pole_b1, vec![-0.5, -0.5]);
    }

    #[test]
    fn test_complex_pair_factors_once() {
        let p = Complex64::new(0.3, 0.4);
        let z = Complex64::new(-1.0, 0.0);
        let biquads = factor_roots(&[p, p.conj()], &[z, z], 8000.0);
        assert_eq!(biquads.iter().filter(|q| q.is_pole).count(), 1);
        assert_eq!(biquads.iter().filter(|q| !q.is_pole).count(), 2);
        let pole = biquads.iter().find(|q| q.is_pole).unwrap();
        assert_relative_eq!(pole.b1, -0.6, max_relative = 1e-15);
        assert_relative_eq!(pole.b2, 0.25, max_relative = 1e-15);
    }

    #[test]
    fn test_response_frequencies_grid() {
        // Legacy grid: 0.05·nyq·21 split in 21 steps, ending at Nyquist
        let freqs: Vec<f64> = response_frequencies(4000.0).collect();
        assert_eq!(freqs.len(), RESPONSE_TABLE_POINTS);
        assert_eq!(freqs[0], 0.0);
        assert_relative_eq!(freqs[1], 200.0, max_relative = 1e-12);
        assert_relative_eq!(freqs[20], 4000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_transfer_magnitude() {
        // Single zero at Nyquist, single pole at origin: |1 + z⁻¹|
        let poles = [Complex64::new(0.0, 0.0)];
        let zeros = [Complex64::new(-1.0, 0.0)];
        let dc = transfer_magnitude(&poles, &zeros, 1.0, 8000.0, 0.0).unwrap();
        assert_relative_eq!(dc, 2.0, max_relative = 1e-15);
        let quarter = transfer_magnitude(&poles, &zeros, 0.5, 8000.0, 2000.0).unwrap();
        assert_relative_eq!(quarter, 0.5 * 2f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_magnitude_db() {
        assert_eq!(magnitude_db(0.0), SILENCE_DB);
        assert_eq!(magnitude_db(-1.0), SILENCE_DB);
        assert_relative_eq!(magnitude_db(10.0), 20.0);
    }
}
