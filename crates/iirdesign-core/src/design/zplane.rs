//! Stage 4: bilinear transform
//!
//! Low pass and high pass roots map one to one,
//!
//! ```text
//!        1 + C·s
//!   z = ---------      C = tan(pi·bw/fs)
//!        1 - C·s
//! ```
//!
//! while band topologies solve `(1 - w·s) z² - 2·cgam·z + (1 + w·s) = 0` and
//! may produce two z-plane roots per s-plane root.

use super::state::DesignState;
use crate::math::ComplexExt;
use crate::types::{DesignResult, FilterKind, FilterRequirements};
use num_complex::Complex64;

pub(crate) fn convert_s_plane_to_z_plane(
    req: &FilterRequirements,
    ds: &mut DesignState,
) -> DesignResult<()> {
    let mapping = if req.topology.is_band() {
        let w = match req.kind {
            FilterKind::Chebyshev => ds.chebyshev_band_cbp,
            _ => ds.tan_angle_frequency,
        };
        Mapping::Band { w, cgam: ds.cgam }
    } else {
        let c = match req.kind {
            FilterKind::Elliptic => ds.tan_angle_frequency,
            _ => ds.wc,
        };
        Mapping::Edge { c }
    };

    let mut z = Vec::with_capacity(2 * ds.s_plane_roots.len() + 2);
    for &root in ds.s_poles() {
        mapping.push_roots(root, &mut z)?;
    }
    ds.n_solved_poles = z.len();
    for &root in ds.s_zeros() {
        mapping.push_roots(root, &mut z)?;
    }
    ds.z_plane_roots = z;

    for (i, p) in ds.z_poles().iter().enumerate() {
        tracing::trace!(i, re = p.re, im = p.im, "z-plane pole");
    }
    tracing::debug!(
        n_solved_poles = ds.n_solved_poles,
        n_mapped_zeros = ds.z_plane_roots.len() - ds.n_solved_poles,
        "bilinear transform done"
    );
    Ok(())
}

enum Mapping {
    Edge { c: f64 },
    Band { w: f64, cgam: f64 },
}

impl Mapping {
    fn push_roots(&self, r: Complex64, out: &mut Vec<Complex64>) -> DesignResult<()> {
        let one = Complex64::new(1.0, 0.0);
        match *self {
            Mapping::Edge { c } => {
                let cr = r * c;
                let z = (one + cr).checked_div(&(one - cr))?;
                out.push(z);
                if r.im != 0.0 {
                    out.push(z.conj());
                }
            }
            Mapping::Band { w, cgam } => {
                let cnum = r * w;
                let ca = (one - cnum) * 2.0;
                let cb = Complex64::new(2.0 * cgam, 0.0);
                // b² - 4ac with b = -2·cgam, a = 1 - cnum, c = 1 + cnum
                let disc = cb * cb - (one - cnum * cnum) * 4.0;
                let s = disc.csqrt()?;

                let first = (s + cb).checked_div(&ca)?;
                out.push(first);
                if first.im != 0.0 {
                    out.push(first.conj());
                }

                if r.im != 0.0 || first.im == 0.0 {
                    let second = (cb - s).checked_div(&ca)?;
                    out.push(second);
                    if second.im != 0.0 {
                        out.push(second.conj());
                    }
                }
            }
        }
        Ok(())
    }
}
