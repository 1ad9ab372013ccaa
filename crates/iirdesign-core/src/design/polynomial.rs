//! Stage 5: root-to-polynomial expansion and gain normalisation

use super::state::DesignState;
use crate::math::MathError;
use crate::types::{DesignResult, FilterKind, FilterRequirements, FilterTopology};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Expanded transfer function, coefficients of `z⁻⁰ … z⁻ⁿ`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expansion {
    pub denominator: Vec<f64>,
    /// Already multiplied by `gain`
    pub numerator: Vec<f64>,
    pub gain: f64,
}

pub(crate) fn z_plane_zeros_poles_to_numerator_denominator(
    req: &FilterRequirements,
    ds: &mut DesignState,
) -> DesignResult<Expansion> {
    complete_zeros(req, ds);

    let denominator = expand(ds.z_poles());
    let numerator = expand(ds.z_zeros());

    let (an, pn) = evaluate_at_reference(req.topology, ds.cgam, &denominator, &numerator);
    let gain = if req.kind != FilterKind::Elliptic && pn == 0.0 {
        1.0
    } else if pn == 0.0 {
        return Err(MathError::Overflow { function: "gain" }.into());
    } else {
        an / (pn * ds.gain_scale)
    };
    tracing::debug!(an, pn, gain_scale = ds.gain_scale, gain, "constant gain factor");

    let finite = gain.is_finite()
        && denominator.iter().chain(&numerator).all(|c| c.is_finite());
    if !finite {
        return Err(MathError::Overflow { function: "expand" }.into());
    }

    let numerator = numerator.into_iter().map(|c| c * gain).collect();
    Ok(Expansion {
        denominator,
        numerator,
        gain,
    })
}

/// Fill the zero set up to one zero per pole.
///
/// Zeros that went to infinity in the analog prototype land at Nyquist
/// (`z = -1`) or DC (`z = +1`) depending on the topology.
fn complete_zeros(req: &FilterRequirements, ds: &mut DesignState) {
    let target = 2 * ds.n_solved_poles;
    let nyquist = Complex64::new(-1.0, 0.0);
    let dc = Complex64::new(1.0, 0.0);
    let added_from = ds.z_plane_roots.len();

    while ds.z_plane_roots.len() < target {
        match req.kind {
            FilterKind::Elliptic => {
                ds.z_plane_roots.push(nyquist);
                if req.topology.is_band() {
                    ds.z_plane_roots.push(dc);
                }
            }
            _ => {
                if req.topology != FilterTopology::HighPass {
                    ds.z_plane_roots.push(nyquist);
                }
                if matches!(req.topology, FilterTopology::BandPass | FilterTopology::HighPass) {
                    ds.z_plane_roots.push(dc);
                }
            }
        }
    }
    ds.z_plane_roots.truncate(target);

    tracing::trace!(
        added = ds.z_plane_roots.len().saturating_sub(added_from),
        "completed zeros"
    );
}

/// Coefficients of `Π (1 - root·z⁻¹)`, built one factor at a time.
///
/// Conjugate roots come in pairs, so only the real parts are kept.
fn expand(roots: &[Complex64]) -> Vec<f64> {
    let mut coeffs = vec![Complex64::new(0.0, 0.0); roots.len() + 1];
    coeffs[0] = Complex64::new(1.0, 0.0);

    for (j, &root) in roots.iter().enumerate() {
        for jh in (0..=j).rev() {
            coeffs[jh + 1] = coeffs[jh + 1] - root * coeffs[jh];
        }
    }

    coeffs.into_iter().map(|c| c.re).collect()
}

/// Denominator and numerator evaluated where the pass band gain is pinned:
/// `z = 1` for low pass and band stop, `z = -1` for high pass and the band
/// centre for band pass.
fn evaluate_at_reference(
    topology: FilterTopology,
    cgam: f64,
    denominator: &[f64],
    numerator: &[f64],
) -> (f64, f64) {
    let nsp = denominator.len() - 1;

    if topology != FilterTopology::BandPass {
        let a = if topology == FilterTopology::HighPass { -1.0 } else { 1.0 };
        let mut an = 1.0;
        let mut pn = 1.0;
        for j in 1..=nsp {
            an = a * an + denominator[j];
            pn = a * pn + numerator[j];
        }
        return (an, pn);
    }

    // Band centre: the polynomials are (anti)symmetric around the middle
    // coefficient, so only a cosine sum is needed.
    let gam = PI / 2.0 - cgam.clamp(-1.0, 1.0).asin();
    let mh = nsp / 2;
    let (mut an, mut pn, ai) = if mh > (nsp / 4) * 2 {
        (0.0, 0.0, 1.0)
    } else {
        (denominator[mh], numerator[mh], 0.0)
    };

    for j in 1..=mh {
        let cng = (gam * j as f64 - ai * PI / 2.0).cos();
        pn += cng * (numerator[mh + j] + (1.0 - 2.0 * ai) * numerator[mh - j]);
        an += cng * (denominator[mh + j] + (1.0 - 2.0 * ai) * denominator[mh - j]);
    }
    (an, pn)
}
