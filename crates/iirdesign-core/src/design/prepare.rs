//! Stage 1: requirement checks and pre-scaling
//!
//! Frequencies are pre-warped for the bilinear transform:
//!
//! ```text
//!   W_analog = tan(pi · f_digital / fs)
//! ```
//!
//! and band topologies are reduced to a low pass prototype with centre
//!
//! ```text
//!                    cos(pi (f_high + f_low) / fs)
//!   cos(w_centre) = ------------------------------
//!                    cos(pi (f_high - f_low) / fs)
//! ```

use super::state::DesignState;
use crate::math::{ellpk, jacobi_theta_by_nome, DECIBEL_FACTOR};
use crate::types::{
    BandEdges, DesignError, DesignResult, EdgePair, FilterKind, FilterRequirements,
    FilterTopology, STORAGE_CAPACITY,
};
use std::f64::consts::PI;

/// Reject requirements that cannot be designed, before any numeric work.
///
/// Stop band ordering for elliptic filters depends on the derived stop band
/// edge and is checked later, in [`prepare`].
pub fn check_requirements(req: &FilterRequirements) -> DesignResult<()> {
    if req.order == 0 {
        return Err(DesignError::config("order too small"));
    }

    let required = if req.topology.is_band() {
        4 * req.order + 2
    } else {
        2 * req.order + 2
    };
    if required > STORAGE_CAPACITY {
        return Err(DesignError::Capacity {
            order: req.order,
            required,
            capacity: STORAGE_CAPACITY,
        });
    }

    if req.kind.uses_ripple() {
        if !(req.passband_ripple_db > 0.0) {
            return Err(DesignError::config("passband_ripple_db too small"));
        }
        if !req.passband_ripple_db.is_finite() {
            return Err(DesignError::config("passband_ripple_db too large"));
        }
    }

    if !(req.sampling_frequency > 0.0) || !req.sampling_frequency.is_finite() {
        return Err(DesignError::config("sampling_frequency too small"));
    }
    let nyquist = req.nyquist_frequency();

    check_edge("passband_edge", req.passband_edge, nyquist)?;

    if req.topology.is_band() {
        let edge2 = req.passband_edge2.unwrap_or(0.0);
        check_edge("passband_edge2", edge2, nyquist)?;
        if edge2 == req.passband_edge {
            return Err(DesignError::config("need passband_edge != passband_edge2"));
        }
    }

    if req.kind == FilterKind::Elliptic {
        match req.stopband_edge.filter(|&edge| edge > 0.0) {
            Some(edge) => check_edge("stopband_edge", edge, nyquist)?,
            None => {
                let db = req
                    .stopband_db
                    .filter(|&db| db < 0.0)
                    .ok_or_else(|| DesignError::config("need stopband_db or stopband_edge"))?;
                if !db.is_finite() {
                    return Err(DesignError::config("stopband_db too small"));
                }
                // Attenuation must exceed the pass band ripple
                if -db <= req.passband_ripple_db {
                    return Err(DesignError::config("need -stopband_db > passband_ripple_db"));
                }
            }
        }
    }

    Ok(())
}

fn check_edge(name: &str, hz: f64, nyquist: f64) -> DesignResult<()> {
    if !(hz > 0.0) {
        return Err(DesignError::config(format!("{} too small", name)));
    }
    if hz >= nyquist {
        return Err(DesignError::config(format!("{} too high", name)));
    }
    Ok(())
}

/// Check the requirements and compute the scalars every later stage needs.
pub(crate) fn prepare(req: &FilterRequirements) -> DesignResult<DesignState> {
    check_requirements(req)?;

    let mut ds = DesignState {
        gain_scale: 1.0,
        ..Default::default()
    };
    let even = req.order % 2 == 0;

    match req.kind {
        FilterKind::Butterworth => {}
        FilterKind::Chebyshev => {
            // Ripple runs from 1 down to 1/phi
            let phi = (0.5 * req.passband_ripple_db / DECIBEL_FACTOR).exp();
            ds.chebyshev_phi = phi;
            ds.gain_scale = if even { phi } else { 1.0 };
        }
        FilterKind::Elliptic => {
            let e = (req.passband_ripple_db / DECIBEL_FACTOR).exp();
            ds.gain_scale = if even { e.sqrt() } else { 1.0 };
            ds.ripple_epsilon = (e - 1.0).sqrt();
        }
    }

    let fs = req.sampling_frequency;
    ds.nyquist_frequency = 0.5 * fs;

    let mut upper = req.passband_edge;
    let mut lower = if req.topology.is_band() {
        req.passband_edge2.unwrap_or(0.0)
    } else {
        0.0
    };
    if upper < lower {
        std::mem::swap(&mut upper, &mut lower);
    }

    let (band_width, high_edge) = if req.topology == FilterTopology::HighPass {
        (upper, ds.nyquist_frequency)
    } else {
        (upper - lower, upper)
    };

    let ang = band_width * PI / fs;
    let cang = ang.cos();
    ds.tan_angle_frequency = ang.sin() / cang;
    ds.cgam = ((high_edge + lower) * PI / fs).cos() / cang;

    match req.kind {
        FilterKind::Elliptic => prepare_elliptic(req, &mut ds, lower, upper)?,
        FilterKind::Chebyshev => {
            ds.wc = ds.tan_angle_frequency;
            let a = 2.0 * PI * upper / fs;
            ds.chebyshev_band_cbp = (ds.cgam - a.cos()) / a.sin();
        }
        FilterKind::Butterworth => {
            ds.wc = ds.tan_angle_frequency;
        }
    }

    tracing::debug!(
        gain_scale = ds.gain_scale,
        ripple_epsilon = ds.ripple_epsilon,
        nyquist_frequency = ds.nyquist_frequency,
        tan_angle_frequency = ds.tan_angle_frequency,
        stopband_edge = ds.stopband_edge.unwrap_or(0.0),
        wc = ds.wc,
        wr = ds.wr,
        cgam = ds.cgam,
        "design state prepared"
    );

    Ok(ds)
}

/// Settle the stop band edge and the edge ratio `wr` of an elliptic design.
fn prepare_elliptic(
    req: &FilterRequirements,
    ds: &mut DesignState,
    lower: f64,
    upper: f64,
) -> DesignResult<()> {
    let fs = req.sampling_frequency;
    let topology = req.topology;

    let stopband_edge = match req.stopband_edge.filter(|&edge| edge > 0.0) {
        Some(edge) => edge,
        None => {
            let db = req
                .stopband_db
                .filter(|&db| db < 0.0)
                .ok_or_else(|| DesignError::config("need stopband_db or stopband_edge"))?;
            derive_stopband_edge(req, ds, db)?
        }
    };

    if !(stopband_edge > 0.0) {
        return Err(DesignError::config("stopband_edge too small"));
    }
    if stopband_edge >= ds.nyquist_frequency {
        return Err(DesignError::config("stopband_edge too high"));
    }

    match topology {
        FilterTopology::LowPass if stopband_edge <= upper => {
            return Err(DesignError::config("need stopband_edge > passband_edge"));
        }
        FilterTopology::BandPass if stopband_edge >= lower && stopband_edge <= upper => {
            return Err(DesignError::config(
                "need stopband_edge < passband_edge or stopband_edge > passband_edge2",
            ));
        }
        FilterTopology::HighPass if stopband_edge >= upper => {
            return Err(DesignError::config("need stopband_edge < passband_edge"));
        }
        FilterTopology::BandStop if stopband_edge <= lower => {
            return Err(DesignError::config("need stopband_edge > passband_edge2"));
        }
        FilterTopology::BandStop if stopband_edge >= upper => {
            return Err(DesignError::config("need stopband_edge < passband_edge"));
        }
        _ => {}
    }
    ds.stopband_edge = Some(stopband_edge);

    let ang = stopband_edge * PI / fs;
    let (sang, cang) = ang.sin_cos();
    let mut wr = if topology.is_band() {
        let cos2 = cang * cang - sang * sang;
        let sin2 = 2.0 * cang * sang;
        (ds.cgam - cos2) / (sin2 * ds.tan_angle_frequency)
    } else {
        sang / (cang * ds.tan_angle_frequency)
    };
    if topology.is_inverted() {
        wr = 1.0 / wr;
    }
    ds.wr = wr.abs();

    ds.band_edges = Some(realised_band_edges(topology, ds, fs));
    ds.wc = 1.0;
    Ok(())
}

/// Stop band edge at which an elliptic filter of this order reaches
/// `stopband_db` (a negative dB value).
fn derive_stopband_edge(
    req: &FilterRequirements,
    ds: &mut DesignState,
    stopband_db: f64,
) -> DesignResult<f64> {
    let a = (-stopband_db / DECIBEL_FACTOR).exp();
    let mut m1 = ds.ripple_epsilon / (a - 1.0).sqrt();
    m1 *= m1;
    let m1p = 1.0 - m1;
    let kk1 = ellpk(m1p)?;
    let kpk1 = ellpk(m1)?;
    let q = (-PI * kpk1 / (req.order as f64 * kk1)).exp();
    let k1 = jacobi_theta_by_nome(q);

    ds.wr = if req.topology.is_inverted() { k1 } else { 1.0 / k1 };

    let fs = req.sampling_frequency;
    let edge = if req.topology.is_band() {
        let a = (ds.tan_angle_frequency * ds.wr).powi(2);
        let b = a * (1.0 - ds.cgam * ds.cgam) + a * a;
        let b = (ds.cgam + b.sqrt()) / (1.0 + a);
        (PI / 2.0 - b.asin()) * fs / (2.0 * PI)
    } else {
        (ds.tan_angle_frequency * ds.wr).atan() * fs / PI
    };

    tracing::debug!(stopband_db, stopband_edge = edge, "derived stop band edge");
    Ok(edge)
}

fn realised_band_edges(topology: FilterTopology, ds: &DesignState, fs: f64) -> BandEdges {
    let scale = if topology.is_inverted() { 1.0 / ds.wr } else { ds.wr };
    let edge = |y: f64| -> EdgePair {
        let a = ds.tan_angle_frequency * y;
        if topology.is_band() {
            let b = a.atan();
            let q = (1.0 + a * a - ds.cgam * ds.cgam).max(0.0).sqrt().atan2(ds.cgam);
            EdgePair {
                lower: Some((q - b) * ds.nyquist_frequency / PI),
                upper: (q + b) * ds.nyquist_frequency / PI,
            }
        } else {
            EdgePair {
                lower: None,
                upper: a.atan() * fs / PI,
            }
        }
    };

    let edges = BandEdges {
        passband: edge(1.0),
        stopband: edge(scale),
    };
    tracing::debug!(
        passband_lower = edges.passband.lower.unwrap_or(0.0),
        passband_upper = edges.passband.upper,
        stopband_lower = edges.stopband.lower.unwrap_or(0.0),
        stopband_upper = edges.stopband.upper,
        "band edges"
    );
    edges
}
