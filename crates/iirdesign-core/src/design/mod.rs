//! IIR filter design pipeline
//!
//! A design runs six stages in order, each reading and extending one
//! [`DesignState`](state::DesignState):
//!
//! ```text
//! FilterRequirements
//!   → prepare     check requirements, pre-warp edges, ripple constants
//!   → lambda      elliptic modulus, nome and pole argument (elliptic only)
//!   → splane      analog prototype poles/zeros
//!   → zplane      bilinear transform
//!   → polynomial  zero completion, expansion, gain
//!   → report      quadratic factors, response table
//! FilterDesign
//! ```
//!
//! The first failing stage ends the run; no partial design is returned.
//!
//! ## Example
//!
//! ```rust
//! use iirdesign_core::prelude::*;
//!
//! let req = FilterRequirements::builder()
//!     .kind(FilterKind::Butterworth)
//!     .topology(FilterTopology::LowPass)
//!     .order(4)
//!     .sampling_frequency(44_100.0)
//!     .passband_edge(1_000.0)
//!     .build();
//!
//! let design = design_iir_filter(&req).unwrap();
//! assert_eq!(design.denominator_coeffs.len(), 5);
//! ```

pub(crate) mod lambda;
pub(crate) mod polynomial;
pub mod prepare;
pub mod report;
pub(crate) mod splane;
pub(crate) mod state;
pub(crate) mod zplane;

pub use prepare::check_requirements;
pub use report::{magnitude_db, RESPONSE_TABLE_POINTS, SILENCE_DB};

use crate::types::{DesignResult, FilterDesign, FilterKind, FilterRequirements};

/// Design a Butterworth, Chebyshev or elliptic IIR filter.
///
/// Pure function of `req`: calling it twice with the same requirements gives
/// identical designs.
///
/// # Errors
///
/// - [`DesignError::Configuration`](crate::DesignError::Configuration) for
///   inconsistent or out-of-range requirements
/// - [`DesignError::Capacity`](crate::DesignError::Capacity) when the order is
///   too large for the root storage
/// - [`DesignError::Numeric`](crate::DesignError::Numeric) when a special
///   function fails
pub fn design_iir_filter(req: &FilterRequirements) -> DesignResult<FilterDesign> {
    tracing::debug!(
        kind = %req.kind,
        topology = %req.topology,
        order = req.order,
        sampling_frequency = req.sampling_frequency,
        passband_edge = req.passband_edge,
        "designing IIR filter"
    );

    let mut ds = prepare::prepare(req)?;
    if req.kind == FilterKind::Elliptic {
        lambda::find_elliptic_locations_in_lambda_plane(req, &mut ds)?;
    }
    splane::find_s_plane_poles_and_zeros(req, &mut ds)?;
    zplane::convert_s_plane_to_z_plane(req, &mut ds)?;
    let expansion = polynomial::z_plane_zeros_poles_to_numerator_denominator(req, &mut ds)?;
    let design = report::build_design(req, &ds, expansion)?;

    for q in &design.biquads {
        tracing::trace!(
            pole = q.is_pole,
            b1 = q.b1,
            b2 = q.b2,
            f0 = q.resonant_freq_hz,
            gain = q.gain_at_resonance,
            dc_gain = q.gain_at_dc,
            "quadratic factor"
        );
    }
    Ok(design)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::MathError;
    use crate::types::{DesignError, FilterTopology};
    use approx::assert_relative_eq;

    fn butterworth(topology: FilterTopology, order: usize) -> FilterRequirements {
        FilterRequirements::builder()
            .topology(topology)
            .order(order)
            .sampling_frequency(44_100.0)
            .passband_edge(1_000.0)
            .build()
    }

    fn chebyshev(topology: FilterTopology, order: usize, ripple: f64) -> FilterRequirements {
        FilterRequirements::builder()
            .kind(FilterKind::Chebyshev)
            .topology(topology)
            .order(order)
            .passband_ripple_db(ripple)
            .sampling_frequency(44_100.0)
            .passband_edge(2_000.0)
            .build()
    }

    fn polymul(a: &[f64], b: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; a.len() + b.len() - 1];
        for (i, x) in a.iter().enumerate() {
            for (j, y) in b.iter().enumerate() {
                out[i + j] += x * y;
            }
        }
        out
    }

    /// Multiply all quadratic factors back into (numerator, denominator).
    fn reconstruct(design: &FilterDesign) -> (Vec<f64>, Vec<f64>) {
        let mut num = vec![1.0];
        let mut den = vec![1.0];
        for q in &design.biquads {
            let factor: &[f64] = if q.is_first_order() {
                &[q.b0, q.b1]
            } else {
                &[q.b0, q.b1, q.b2]
            };
            if q.is_pole {
                den = polymul(&den, factor);
            } else {
                num = polymul(&num, factor);
            }
        }
        let num = num.into_iter().map(|c| c * design.gain).collect();
        (num, den)
    }

    fn assert_coeffs_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        let scale = expected.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a - e).abs() <= 1e-9 * scale,
                "coefficient {} differs from {} (scale {})",
                a,
                e,
                scale
            );
        }
    }

    fn all_topologies() -> Vec<FilterRequirements> {
        let mut reqs = Vec::new();
        for order in 1..=6 {
            for kind in [FilterKind::Butterworth, FilterKind::Chebyshev, FilterKind::Elliptic] {
                for topology in [
                    FilterTopology::LowPass,
                    FilterTopology::HighPass,
                    FilterTopology::BandPass,
                    FilterTopology::BandStop,
                ] {
                    let mut builder = FilterRequirements::builder()
                        .kind(kind)
                        .topology(topology)
                        .order(order)
                        .passband_ripple_db(1.0)
                        .sampling_frequency(8_000.0)
                        .passband_edge(1_000.0);
                    builder = match topology {
                        FilterTopology::LowPass => builder.stopband_edge(1_500.0),
                        FilterTopology::HighPass => builder.stopband_edge(700.0),
                        FilterTopology::BandPass => {
                            builder.passband(1_000.0, 1_500.0).stopband_edge(2_000.0)
                        }
                        FilterTopology::BandStop => {
                            builder.passband(800.0, 2_000.0).stopband_edge(1_200.0)
                        }
                    };
                    reqs.push(builder.build());
                }
            }
        }
        reqs
    }

    #[test]
    fn test_butterworth_lowpass_scenario() {
        let design = design_iir_filter(&butterworth(FilterTopology::LowPass, 4)).unwrap();
        assert_eq!(design.denominator_coeffs.len(), 5);
        assert_eq!(design.numerator_coeffs.len(), 5);
        assert!(design.gain > 0.0);
        assert_eq!(design.response_table.len(), RESPONSE_TABLE_POINTS);
        assert_eq!(design.response_table[0].frequency_hz, 0.0);
        assert!(design.response_table[0].gain_db.abs() < 0.1);
        assert_eq!(design.denominator_coeffs[0], 1.0);
    }

    #[test]
    fn test_butterworth_minus_3db_at_edge() {
        for order in 1..=8 {
            let lp = design_iir_filter(&butterworth(FilterTopology::LowPass, order)).unwrap();
            let dc = lp.response_db(0.0).unwrap();
            let edge = lp.response_db(1_000.0).unwrap();
            assert!((edge - dc + 3.0103).abs() < 0.1, "order {}: {} dB", order, edge - dc);

            let hp = design_iir_filter(&butterworth(FilterTopology::HighPass, order)).unwrap();
            let nyq = hp.response_db(22_050.0).unwrap();
            let edge = hp.response_db(1_000.0).unwrap();
            assert!((edge - nyq + 3.0103).abs() < 0.1, "order {}: {} dB", order, edge - nyq);
            assert_eq!(hp.response_db(0.0).unwrap(), SILENCE_DB);
        }
    }

    #[test]
    fn test_chebyshev_passband_ripple() {
        for &ripple in &[0.5, 1.0, 3.0] {
            for order in 3..=6 {
                let lp = design_iir_filter(&chebyshev(FilterTopology::LowPass, order, ripple)).unwrap();
                let (lo, hi) = extremes(&lp, 0.0, 2_000.0);
                assert!(hi.abs() < 0.05, "peak {} dB", hi);
                assert!((hi - lo - ripple).abs() < 0.05, "ripple {} dB", hi - lo);

                let hp = design_iir_filter(&chebyshev(FilterTopology::HighPass, order, ripple)).unwrap();
                let (lo, hi) = extremes(&hp, 2_000.0, 22_050.0);
                assert!((hi - lo - ripple).abs() < 0.05, "ripple {} dB", hi - lo);
            }
        }
    }

    fn extremes(design: &FilterDesign, from: f64, to: f64) -> (f64, f64) {
        let steps = 2_000;
        (0..=steps)
            .map(|i| from + (to - from) * i as f64 / steps as f64)
            .map(|f| design.response_db(f).unwrap())
            .fold((f64::MAX, f64::MIN), |(lo, hi), db| (lo.min(db), hi.max(db)))
    }

    #[test]
    fn test_chebyshev_even_order_dc() {
        let design = design_iir_filter(&chebyshev(FilterTopology::LowPass, 4, 1.0)).unwrap();
        assert_relative_eq!(design.response_db(0.0).unwrap(), -1.0, epsilon = 1e-9);

        let design = design_iir_filter(&chebyshev(FilterTopology::LowPass, 5, 1.0)).unwrap();
        assert_relative_eq!(design.response_db(0.0).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_elliptic_lowpass_scenario() {
        let req = FilterRequirements::builder()
            .kind(FilterKind::Elliptic)
            .order(3)
            .passband_ripple_db(1.0)
            .stopband_db(-40.0)
            .sampling_frequency(8_000.0)
            .passband_edge(1_000.0)
            .build();
        let design = design_iir_filter(&req).unwrap();

        let edge = design.stopband_edge.unwrap();
        assert!(edge > 1_000.0);
        assert!(-design.response_db(edge).unwrap() >= 39.5);
        assert_relative_eq!(design.stopband_attenuation_db.unwrap(), 40.0, epsilon = 1e-6);
        assert!(design.response_db(0.0).unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_elliptic_attenuation_at_explicit_edge() {
        for order in 2..=6 {
            for (topology, pb, sb) in [
                (FilterTopology::LowPass, 2_000.0, 3_000.0),
                (FilterTopology::HighPass, 3_000.0, 2_000.0),
            ] {
                let req = FilterRequirements::builder()
                    .kind(FilterKind::Elliptic)
                    .topology(topology)
                    .order(order)
                    .passband_ripple_db(0.5)
                    .sampling_frequency(44_100.0)
                    .passband_edge(pb)
                    .stopband_edge(sb)
                    .build();
                let design = design_iir_filter(&req).unwrap();
                let nominal = design.stopband_attenuation_db.unwrap();
                let at_edge = -design.response_db(sb).unwrap();
                assert!(at_edge >= nominal - 0.5, "{} < {}", at_edge, nominal);
            }
        }
    }

    #[test]
    fn test_coefficient_counts() {
        for req in all_topologies() {
            let design = design_iir_filter(&req).unwrap();
            let expected = if req.topology.is_band() { 2 * req.order + 1 } else { req.order + 1 };
            assert_eq!(design.denominator_coeffs.len(), expected, "{:?}", req);
            assert_eq!(design.numerator_coeffs.len(), expected, "{:?}", req);
            assert_eq!(design.degree() + 1, expected);
        }
    }

    #[test]
    fn test_biquad_reconstruction() {
        for req in all_topologies() {
            let design = design_iir_filter(&req).unwrap();
            let (num, den) = reconstruct(&design);
            assert_coeffs_close(&den, &design.denominator_coeffs);
            assert_coeffs_close(&num, &design.numerator_coeffs);
        }
    }

    #[test]
    fn test_stable_poles() {
        for req in all_topologies() {
            let design = design_iir_filter(&req).unwrap();
            assert!(design.poles.iter().all(|p| p.norm() < 1.0), "{:?}", req);
        }
    }

    #[test]
    fn test_order_one() {
        for kind in [FilterKind::Butterworth, FilterKind::Chebyshev] {
            let req = FilterRequirements::builder()
                .kind(kind)
                .passband_ripple_db(1.0)
                .order(1)
                .build();
            let design = design_iir_filter(&req).unwrap();
            assert_eq!(design.biquads.len(), 2);
            assert!(design.biquads.iter().all(|q| q.is_first_order()));
            assert_eq!(design.pole_factors().count(), 1);
            assert_eq!(design.zero_factors().count(), 1);
        }
    }

    #[test]
    fn test_idempotent() {
        for req in all_topologies().into_iter().step_by(7) {
            assert_eq!(design_iir_filter(&req).unwrap(), design_iir_filter(&req).unwrap());
        }
    }

    #[test]
    fn test_band_designs() {
        let bp = FilterRequirements::builder()
            .topology(FilterTopology::BandPass)
            .order(3)
            .sampling_frequency(8_000.0)
            .passband(1_000.0, 1_500.0)
            .build();
        let design = design_iir_filter(&bp).unwrap();
        let centre = (1_000.0_f64 * 1_500.0).sqrt();
        assert!(design.response_db(centre).unwrap() > -3.5);
        assert_eq!(design.response_db(0.0).unwrap(), SILENCE_DB);
        assert!(design.response_db(3_000.0).unwrap() < -20.0);

        let mut bs = bp.clone();
        bs.topology = FilterTopology::BandStop;
        let design = design_iir_filter(&bs).unwrap();
        assert!(design.response_db(0.0).unwrap().abs() < 1e-9);
        assert!(design.response_db(1_230.0).unwrap() < -20.0);
    }

    #[test]
    fn test_configuration_errors() {
        let mut req = butterworth(FilterTopology::LowPass, 0);
        assert!(matches!(design_iir_filter(&req), Err(DesignError::Configuration(_))));

        req.order = 4;
        req.passband_edge = 0.0;
        assert!(matches!(design_iir_filter(&req), Err(DesignError::Configuration(_))));

        req.passband_edge = 22_050.0;
        assert!(matches!(design_iir_filter(&req), Err(DesignError::Configuration(_))));

        let req = butterworth(FilterTopology::BandStop, 4);
        assert_eq!(
            design_iir_filter(&req),
            Err(DesignError::Configuration("passband_edge2 too small".to_string()))
        );
    }

    #[test]
    fn test_extreme_ripple_is_rejected() {
        let req = chebyshev(FilterTopology::LowPass, 4, f64::INFINITY);
        assert_eq!(
            design_iir_filter(&req),
            Err(DesignError::Configuration("passband_ripple_db too large".to_string()))
        );

        // Finite, but the ripple constants overflow
        let req = chebyshev(FilterTopology::LowPass, 4, 7_000.0);
        assert_eq!(
            design_iir_filter(&req),
            Err(DesignError::Numeric(MathError::Overflow { function: "expand" }))
        );
    }

    #[test]
    fn test_weak_stopband_attenuation_is_configuration_error() {
        let req = FilterRequirements::builder()
            .kind(FilterKind::Elliptic)
            .order(3)
            .passband_ripple_db(1.0)
            .stopband_db(-0.5)
            .sampling_frequency(8_000.0)
            .passband_edge(1_000.0)
            .build();
        assert!(matches!(design_iir_filter(&req), Err(DesignError::Configuration(_))));

        let mut req = req;
        req.stopband_db = Some(f64::NEG_INFINITY);
        assert!(matches!(design_iir_filter(&req), Err(DesignError::Configuration(_))));
    }

    #[test]
    fn test_capacity_error() {
        let req = butterworth(FilterTopology::LowPass, 200);
        assert!(matches!(design_iir_filter(&req), Err(DesignError::Capacity { .. })));
    }

    #[test]
    fn test_report_text() {
        let req = FilterRequirements::builder()
            .kind(FilterKind::Elliptic)
            .order(3)
            .passband_ripple_db(1.0)
            .stopband_db(-40.0)
            .sampling_frequency(8_000.0)
            .passband_edge(1_000.0)
            .build();
        let text = design_iir_filter(&req).unwrap().to_string();
        assert!(text.contains("constant gain factor"));
        assert!(text.contains("z plane Denominator      Numerator"));
        assert!(text.contains("pass band"));
        assert!(text.contains("stop band"));
        assert!(text.contains("q. f."));
        assert_eq!(text.lines().filter(|l| l.starts_with("pole  ")).count(), 2);
    }
}
