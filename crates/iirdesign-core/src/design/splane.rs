//! Stage 3: analog prototype poles and zeros
//!
//! Only the upper half plane is computed; conjugates are filled in by the
//! bilinear transform. Low pass prototypes are normalised to `wc = 1`.

use super::state::DesignState;
use crate::math::ellpj;
use crate::types::{DesignResult, FilterKind, FilterRequirements, FilterTopology};
use num_complex::Complex64;
use std::f64::consts::PI;

pub(crate) fn find_s_plane_poles_and_zeros(
    req: &FilterRequirements,
    ds: &mut DesignState,
) -> DesignResult<()> {
    let n = req.order;
    let n_poles = (n + 1) / 2;

    let (mut poles, mut zeros) = match req.kind {
        FilterKind::Butterworth => (circle_poles(n, 1.0, 1.0), Vec::new()),
        FilterKind::Chebyshev => {
            let (a, b) = chebyshev_radii(n, ds);
            (circle_poles(n, a, b), Vec::new())
        }
        FilterKind::Elliptic => elliptic_roots(n, ds)?,
    };

    if req.topology.is_inverted() {
        // s -> 1/s
        for root in poles.iter_mut().chain(zeros.iter_mut()) {
            *root = invert(*root);
        }

        let at_origin = match req.kind {
            FilterKind::Elliptic => n_poles.saturating_sub(zeros.len()),
            _ if req.topology == FilterTopology::BandStop => n_poles + n / 2,
            _ => n_poles,
        };
        zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(at_origin));
    }

    ds.n_poles = poles.len();
    ds.n_zeros = zeros.len();
    ds.s_plane_roots = poles;
    ds.s_plane_roots.extend(zeros);

    for (i, p) in ds.s_poles().iter().enumerate() {
        tracing::trace!(i, re = p.re, im = p.im, "s-plane pole");
    }
    for (i, z) in ds.s_zeros().iter().enumerate() {
        tracing::trace!(i, re = z.re, im = z.im, "s-plane zero");
    }
    Ok(())
}

/// `1/r` for a root already known to be nonzero, mirrored into the upper
/// half plane like every other root.
fn invert(r: Complex64) -> Complex64 {
    let mag2 = r.norm_sqr();
    if mag2 == 0.0 {
        return r;
    }
    Complex64::new(r.re / mag2, r.im / mag2)
}

/// Upper half plane poles on the ellipse `(-a cos t, b sin t)`.
///
/// Odd orders start with the real pole at `t = 0`, even orders at `pi/2n`.
fn circle_poles(n: usize, a: f64, b: f64) -> Vec<Complex64> {
    let step = PI / n as f64;
    let start = if n % 2 == 1 { 0.0 } else { step / 2.0 };
    (0..(n + 1) / 2)
        .map(|i| {
            let t = start + i as f64 * step;
            Complex64::new(-a * t.cos(), b * t.sin())
        })
        .collect()
}

/// Semi-axes of the Chebyshev pole ellipse.
///
/// With `eps² = phi² - 1`, `y = ((phi + 1)/eps)^(1/n)` gives
/// `a = sinh(asinh(1/eps)/n)`, `b = cosh(asinh(1/eps)/n)`.
fn chebyshev_radii(n: usize, ds: &mut DesignState) -> (f64, f64) {
    let phi = ds.chebyshev_phi;
    let eps = ((phi - 1.0) * (phi + 1.0)).sqrt();
    ds.ripple_epsilon = eps;

    let y = ((phi + 1.0) / eps).powf(1.0 / n as f64);
    let b = 0.5 * (y + 1.0 / y);
    let a = 0.5 * (y - 1.0 / y);
    tracing::trace!(ripple_epsilon = eps, a, b, "chebyshev ellipse");
    (a, b)
}

fn elliptic_roots(n: usize, ds: &DesignState) -> DesignResult<(Vec<Complex64>, Vec<Complex64>)> {
    let order = n as f64;
    let (wc, k, m, kk) = (ds.wc, ds.elliptic_k, ds.elliptic_m, ds.kk);

    let shift = ellpj(ds.elliptic_u, 1.0 - m)?;
    let (sn1, cn1, dn1) = (shift.sn, shift.cn, shift.dn);

    // Arguments K·(n-1-2i)/n, i = 0, 1, ...
    let argument = |i: usize| kk * (n - 1 - 2 * i) as f64 / order;

    let zeros = (0..n / 2)
        .map(|i| {
            let j = ellpj(argument(i), m)?;
            Ok(Complex64::new(0.0, wc / (k * j.sn)))
        })
        .collect::<DesignResult<Vec<_>>>()?;

    let poles = (0..(n + 1) / 2)
        .map(|i| {
            let j = ellpj(argument(i), m)?;
            let r = k * j.sn * sn1;
            let b = cn1 * cn1 + r * r;
            Ok(Complex64::new(
                -wc * j.cn * j.dn * sn1 * cn1 / b,
                wc * j.sn * dn1 / b,
            ))
        })
        .collect::<DesignResult<Vec<_>>>()?;

    Ok((poles, zeros))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{lambda, prepare::prepare};
    use approx::assert_relative_eq;

    fn placed(req: &FilterRequirements) -> DesignState {
        let mut ds = prepare(req).unwrap();
        if req.kind == FilterKind::Elliptic {
            lambda::find_elliptic_locations_in_lambda_plane(req, &mut ds).unwrap();
        }
        find_s_plane_poles_and_zeros(req, &mut ds).unwrap();
        ds
    }

    #[test]
    fn test_butterworth_unit_circle() {
        for order in 1..=7 {
            let req = FilterRequirements::builder().order(order).build();
            let ds = placed(&req);
            assert_eq!(ds.n_poles, (order + 1) / 2);
            assert_eq!(ds.n_zeros, 0);
            for p in ds.s_poles() {
                assert_relative_eq!(p.norm(), 1.0, max_relative = 1e-14);
                assert!(p.re < 0.0 && p.im >= 0.0);
            }
        }
    }

    #[test]
    fn test_butterworth_odd_order_real_pole() {
        let req = FilterRequirements::builder().order(3).build();
        let ds = placed(&req);
        assert_eq!(ds.s_poles()[0], Complex64::new(-1.0, 0.0));
        assert_relative_eq!(ds.s_poles()[1].arg(), 2.0 * PI / 3.0, max_relative = 1e-14);
    }

    #[test]
    fn test_chebyshev_ellipse() {
        let req = FilterRequirements::builder()
            .kind(FilterKind::Chebyshev)
            .order(4)
            .passband_ripple_db(1.0)
            .build();
        let ds = placed(&req);
        let eps = (10f64.powf(0.1) - 1.0).sqrt();
        assert_relative_eq!(ds.ripple_epsilon, eps, max_relative = 1e-12);

        let v = (1.0 / eps).asinh() / 4.0;
        for p in ds.s_poles() {
            let e = (p.re / v.sinh()).powi(2) + (p.im / v.cosh()).powi(2);
            assert_relative_eq!(e, 1.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_highpass_zeros_at_origin() {
        let req = FilterRequirements::builder()
            .topology(FilterTopology::HighPass)
            .order(5)
            .build();
        let ds = placed(&req);
        assert_eq!(ds.n_zeros, 3);
        assert!(ds.s_zeros().iter().all(|z| z.norm() == 0.0));
    }

    #[test]
    fn test_bandstop_zero_count() {
        let req = FilterRequirements::builder()
            .topology(FilterTopology::BandStop)
            .passband(1000.0, 2000.0)
            .order(5)
            .build();
        let ds = placed(&req);
        assert_eq!(ds.n_poles, 3);
        assert_eq!(ds.n_zeros, 5);
    }

    #[test]
    fn test_elliptic_zeros_on_imaginary_axis() {
        let req = FilterRequirements::builder()
            .kind(FilterKind::Elliptic)
            .order(5)
            .passband_ripple_db(0.5)
            .sampling_frequency(8000.0)
            .passband_edge(1000.0)
            .stopband_edge(1400.0)
            .build();
        let ds = placed(&req);
        assert_eq!(ds.n_poles, 3);
        assert_eq!(ds.n_zeros, 2);
        for z in ds.s_zeros() {
            assert_eq!(z.re, 0.0);
            // Beyond the stop band edge ratio
            assert!(z.im >= ds.wr * (1.0 - 1e-12));
        }
        for p in ds.s_poles() {
            assert!(p.re < 0.0);
        }
    }

    #[test]
    fn test_elliptic_highpass_pads_zeros() {
        let req = FilterRequirements::builder()
            .kind(FilterKind::Elliptic)
            .topology(FilterTopology::HighPass)
            .order(3)
            .passband_ripple_db(1.0)
            .sampling_frequency(8000.0)
            .passband_edge(1000.0)
            .stopband_edge(600.0)
            .build();
        let ds = placed(&req);
        assert_eq!(ds.n_zeros, ds.n_poles);
        assert_eq!(ds.s_zeros()[1], Complex64::new(0.0, 0.0));
    }
}
