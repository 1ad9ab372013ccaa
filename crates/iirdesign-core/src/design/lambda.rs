//! Stage 2: elliptic parameters
//!
//! From the edge ratio `k = wc/wr` the order fixes the nome
//! `q = exp(-pi·n·K'(k)/K(k))` and with it the modulus `k1` that sets the
//! stop band attenuation. The pole argument `u` follows from the ripple.

use super::state::DesignState;
use crate::math::{ellik, ellpj, ellpk, jacobi_theta_by_nome, MathError};
use crate::types::{DesignResult, FilterRequirements};
use std::f64::consts::PI;

pub(crate) fn find_elliptic_locations_in_lambda_plane(
    req: &FilterRequirements,
    ds: &mut DesignState,
) -> DesignResult<()> {
    let order = req.order as f64;

    let k = ds.wc / ds.wr;
    if !(k < 1.0) {
        return Err(MathError::Domain {
            function: "find_elliptic_locations_in_lambda_plane",
        }
        .into());
    }
    let m = k * k;
    ds.elliptic_k = k;
    ds.elliptic_m = m;
    ds.kk = ellpk(1.0 - m)?;
    ds.kpk = ellpk(m)?;
    tracing::trace!(k, m, kk = ds.kk, kpk = ds.kpk, "elliptic modulus");

    let q = (-PI * order * ds.kpk / ds.kk).exp();
    let k1 = jacobi_theta_by_nome(q);
    let eps = ds.ripple_epsilon;
    let attenuation_db = 10.0 * ((eps / k1).powi(2) + 1.0).log10();
    ds.stopband_attenuation_db = Some(attenuation_db);

    let m1 = k1 * k1;
    let m1p = 1.0 - m1;
    let kk1 = ellpk(m1p)?;
    let kpk1 = ellpk(m1)?;

    // n = K(k)·K'(k1) / (K'(k)·K(k1)) must come back as the order
    let realised_order = ds.kk * kpk1 / (ds.kpk * kk1);
    tracing::debug!(
        nome = q,
        k1,
        stopband_attenuation_db = attenuation_db,
        realised_order,
        "elliptic location parameters"
    );

    // sn/cn at u must equal 1/eps
    let phi = (1.0 / eps).atan();
    let u = ellik(phi, m1p)?;
    let jac = ellpj(u, m1p)?;
    tracing::trace!(u, sn_over_cn = jac.sn / jac.cn, inv_eps = 1.0 / eps, "ripple argument");

    ds.elliptic_u = u * ds.kk / (order * kk1);
    Ok(())
}
