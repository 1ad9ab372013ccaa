//! Elliptic integrals and Jacobian elliptic functions
//!
//! Parameter convention: `m = k²`. [`ellpk`] takes the *complementary*
//! parameter `m1 = 1 - m`, which keeps full precision for `m` close to 1.

use super::{MathError, MathResult, MACHEP};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// `ln 4`
const LN_4: f64 = 1.386_294_361_119_890_618_8;

const ELLPK_P: [f64; 11] = [
    1.379_828_646_062_732_371_50e-4,
    2.280_257_240_058_755_673_85e-3,
    7.974_040_132_204_151_793_67e-3,
    9.858_213_790_212_260_087_14e-3,
    6.874_896_874_499_498_779_25e-3,
    6.189_010_336_376_876_132_29e-3,
    8.790_782_739_527_437_722_54e-3,
    1.493_804_489_168_052_527_18e-2,
    3.088_514_652_467_119_959_98e-2,
    9.657_359_028_116_901_265_35e-2,
    1.386_294_361_119_890_625_02e0,
];

const ELLPK_Q: [f64; 11] = [
    2.940_789_550_485_985_075_11e-5,
    9.141_847_238_659_172_265_71e-4,
    5.940_583_037_531_677_932_57e-3,
    1.548_505_166_497_623_993_35e-2,
    2.390_896_027_159_248_927_27e-2,
    3.012_047_152_276_040_469_88e-2,
    3.737_743_141_738_232_289_69e-2,
    4.882_803_475_709_982_392_32e-2,
    7.031_249_969_639_574_697_39e-2,
    1.249_999_999_998_708_200_58e-1,
    4.999_999_999_999_999_998_21e-1,
];

/// Jacobian elliptic functions of argument `u` and parameter `m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JacobiElliptic {
    pub sn: f64,
    pub cn: f64,
    pub dn: f64,
    /// Amplitude, `sn = sin(phi)`
    pub phi: f64,
}

/// Evaluate a polynomial given highest-order coefficient first (Horner).
pub fn polevl(x: f64, coef: &[f64]) -> f64 {
    let mut iter = coef.iter();
    let first = iter.next().copied().unwrap_or(0.0);
    iter.fold(first, |ans, &c| ans * x + c)
}

/// Complete elliptic integral of the first kind, `K(1 - m1)`.
///
/// `m1` must lie in `[0, 1]`. `m1 == 0` is the logarithmic singularity at
/// `m == 1`.
pub fn ellpk(m1: f64) -> MathResult<f64> {
    if !(0.0..=1.0).contains(&m1) {
        return Err(MathError::Domain { function: "ellpk" });
    }

    if m1 > MACHEP {
        return Ok(polevl(m1, &ELLPK_P) - m1.ln() * polevl(m1, &ELLPK_Q));
    }

    if m1 == 0.0 {
        return Err(MathError::Singularity { function: "ellpk" });
    }

    Ok(LN_4 - 0.5 * m1.ln())
}

/// Incomplete elliptic integral of the first kind, `F(phi | m)`.
///
/// Uses the descending Landen (AGM) transformation after reducing `phi` by
/// multiples of `pi/2`.
pub fn ellik(phi: f64, m: f64) -> MathResult<f64> {
    if m == 0.0 {
        return Ok(phi);
    }

    let a = 1.0 - m;
    if a == 0.0 {
        if phi.abs() >= FRAC_PI_2 {
            return Err(MathError::Singularity { function: "ellik" });
        }
        return Ok(((FRAC_PI_2 + phi) / 2.0).tan().ln());
    }

    let mut npio2 = (phi / FRAC_PI_2).floor() as i64;
    if npio2 & 1 != 0 {
        npio2 += 1;
    }

    let mut phi = phi;
    let mut complete = 0.0;
    if npio2 != 0 {
        complete = ellpk(a)?;
        phi -= npio2 as f64 * FRAC_PI_2;
    }

    let negative = phi < 0.0;
    phi = phi.abs();

    let mut b = a.sqrt();
    let mut t = phi.tan();

    if t.abs() > 10.0 {
        // Transform the amplitude
        let e = 1.0 / (b * t);
        if e.abs() < 10.0 {
            let e = e.atan();
            if npio2 == 0 {
                complete = ellpk(a)?;
            }
            let mut temp = complete - ellik(e, m)?;
            if negative {
                temp = -temp;
            }
            return Ok(temp + npio2 as f64 * complete);
        }
    }

    let mut a = 1.0;
    let mut c = m.sqrt();
    let mut d = 1.0;
    let mut period = 0_i64;

    while (c / a).abs() > MACHEP {
        let ratio = b / a;
        phi += (t * ratio).atan() + period as f64 * PI;
        period = ((phi + FRAC_PI_2) / PI) as i64;
        t = t * (1.0 + ratio) / (1.0 - ratio * t * t);
        c = (a - b) / 2.0;
        let gm = (a * b).sqrt();
        a = (a + b) / 2.0;
        b = gm;
        d += d;
    }

    let mut temp = (t.atan() + period as f64 * PI) / (d * a);
    if negative {
        temp = -temp;
    }
    Ok(temp + npio2 as f64 * complete)
}

/// Jacobian elliptic functions `sn`, `cn`, `dn` and the amplitude `phi`.
///
/// Near `m = 0` and `m = 1` closed-form approximations are used. Otherwise
/// the AGM scale is descended at most eight times; failing to converge by
/// then is reported as an overflow.
pub fn ellpj(u: f64, m: f64) -> MathResult<JacobiElliptic> {
    if !(0.0..=1.0).contains(&m) {
        return Err(MathError::Domain { function: "ellpj" });
    }

    if m < 1.0e-9 {
        let t = u.sin();
        let b = u.cos();
        let ai = 0.25 * m * (u - t * b);
        return Ok(JacobiElliptic {
            sn: t - ai * b,
            cn: b + ai * t,
            dn: 1.0 - 0.5 * m * t * t,
            phi: u - ai,
        });
    }

    if m >= 0.999_999_999_9 {
        let mut ai = 0.25 * (1.0 - m);
        let b = u.cosh();
        let t = u.tanh();
        let sech = 1.0 / b;
        let twon = b * u.sinh();
        let sn = t + ai * (twon - u) / (b * b);
        let phi = 2.0 * u.exp().atan() - FRAC_PI_2 + ai * (twon - u) / b;
        ai *= t * sech;
        return Ok(JacobiElliptic {
            sn,
            cn: sech - ai * (twon - u),
            dn: sech + ai * (twon + u),
            phi,
        });
    }

    let mut a = [0.0_f64; 9];
    let mut c = [0.0_f64; 9];
    a[0] = 1.0;
    c[0] = m.sqrt();
    let mut b = (1.0 - m).sqrt();
    let mut twon = 1.0;
    let mut i = 0;

    while (c[i] / a[i]).abs() > MACHEP {
        if i > 7 {
            return Err(MathError::Overflow { function: "ellpj" });
        }
        let ai = a[i];
        i += 1;
        c[i] = (ai - b) / 2.0;
        let t = (ai * b).sqrt();
        a[i] = (ai + b) / 2.0;
        b = t;
        twon *= 2.0;
    }

    // Backward recurrence
    let mut phi = twon * a[i] * u;
    let mut previous = phi;
    while i > 0 {
        let t = c[i] * phi.sin() / a[i];
        previous = phi;
        phi = (t.asin() + phi) / 2.0;
        i -= 1;
    }

    let t = phi.cos();
    Ok(JacobiElliptic {
        sn: phi.sin(),
        cn: t,
        dn: t / (phi - previous).cos(),
        phi,
    })
}

/// Modulus `k = sqrt(m)` from the nome `q` via Jacobi theta series:
///
/// ```text
///          ( 1 + 2 Σ q^(n²)        )²
/// k = 4√q ( ----------------------- )
///          ( 1 + Σ q^(n²+n)        )
/// ```
///
/// Terms are summed until both series contribute less than [`MACHEP`]
/// relative to their running total.
pub fn jacobi_theta_by_nome(q: f64) -> f64 {
    let mut a = 1.0;
    let mut b = 1.0;
    let mut r = 1.0;
    let mut p = q;

    loop {
        r *= p;
        a += 2.0 * r;
        let t1 = (r / a).abs();

        r *= p;
        b += r;
        p *= q;
        let t2 = (r / b).abs();

        if !(t1.max(t2) > MACHEP) {
            break;
        }
    }

    let ratio = b / a;
    4.0 * q.sqrt() * ratio * ratio
}
