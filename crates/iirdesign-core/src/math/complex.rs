//! Complex arithmetic with overflow handling
//!
//! Addition, subtraction and multiplication come straight from
//! [`Complex64`]'s operators. Magnitude, square root and division need more
//! care near the limits of the double range, so they live in [`ComplexExt`].

use super::{MathError, MathResult, MAXNUM};
use num_complex::Complex64;

/// Mantissa bits kept when one magnitude component dwarfs the other.
const PREC: i32 = 27;
const MAXEXP: i32 = 1024;
const MINEXP: i32 = -1077;

/// Extension methods for [`Complex64`] used throughout the designer.
pub trait ComplexExt: Sized {
    /// Magnitude computed with exponent rescaling, so that `re² + im²` can
    /// neither overflow nor underflow for representable inputs.
    fn cabs(&self) -> f64;

    /// Square root with non-negative imaginary part off the imaginary axis,
    /// refined by one Heron iteration.
    fn csqrt(&self) -> MathResult<Self>;

    /// Division that reports an overflow instead of producing `inf`/`NaN`.
    fn checked_div(&self, divisor: &Self) -> MathResult<Self>;
}

impl ComplexExt for Complex64 {
    fn cabs(&self) -> f64 {
        let (mut re, mut im) = (self.re, self.im);

        if re.is_infinite() || im.is_infinite() {
            return f64::INFINITY;
        }
        if re.is_nan() {
            return re;
        }
        if im.is_nan() {
            return im;
        }

        re = re.abs();
        im = im.abs();

        // Either component vanishing
        if re == 0.0 {
            return im;
        }
        if im == 0.0 {
            return re;
        }

        let (_, ex) = frexp(re);
        let (_, ey) = frexp(im);
        let e = ex - ey;
        if e > PREC {
            return re;
        }
        if e < -PREC {
            return im;
        }

        // Bring both components near 1
        let e = (ex + ey) >> 1;
        re = ldexp(re, -e);
        im = ldexp(im, -e);

        let b = (re * re + im * im).sqrt();
        let (_, ey) = frexp(b);
        let ey = ey + e;

        if ey > MAXEXP {
            tracing::warn!(exponent = ey, "complex magnitude overflows");
            return f64::INFINITY;
        }
        if ey < MINEXP {
            return 0.0;
        }

        ldexp(b, e)
    }

    fn csqrt(&self) -> MathResult<Self> {
        let (x, y) = (self.re, self.im);

        if y == 0.0 {
            return Ok(if x < 0.0 {
                Complex64::new(0.0, (-x).sqrt())
            } else {
                Complex64::new(x.sqrt(), 0.0)
            });
        }

        if x == 0.0 {
            let r = (0.5 * y.abs()).sqrt();
            return Ok(if y > 0.0 {
                Complex64::new(r, r)
            } else {
                Complex64::new(r, -r)
            });
        }

        // |y| << x: series avoids cancellation in |z| - x
        let r = self.cabs();
        let t = if y.abs() < 2.0e-4 * x.abs() && x > 0.0 {
            0.25 * y * (y / x)
        } else {
            0.5 * (r - x)
        };
        let r = t.sqrt();
        let q = Complex64::new(y / (2.0 * r), r);

        // Heron: w = (q + z/q) / 2
        let quotient = self.checked_div(&q)?;
        Ok((q + quotient) * 0.5)
    }

    fn checked_div(&self, divisor: &Self) -> MathResult<Self> {
        let (a, b) = (divisor.re, divisor.im);
        let y = a * a + b * b;
        let p = self.re * a + self.im * b;
        let q = self.im * a - self.re * b;

        if y < 1.0 && (y == 0.0 || p.abs() > MAXNUM * y || q.abs() > MAXNUM * y) {
            return Err(MathError::Overflow { function: "checked_div" });
        }

        Ok(Complex64::new(p / y, q / y))
    }
}

/// Split `x` into a mantissa in `[0.5, 1)` and a power of two.
fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    if biased == 0 {
        // Subnormal
        let (m, e) = frexp(x * 2f64.powi(54));
        return (m, e - 54);
    }
    let mantissa = f64::from_bits((bits & !(0x7ff_u64 << 52)) | (1022_u64 << 52));
    (mantissa, biased - 1022)
}

/// `x * 2^exp`, applied in two halves so the scale factor stays representable.
fn ldexp(x: f64, exp: i32) -> f64 {
    let half = exp / 2;
    x * 2f64.powi(half) * 2f64.powi(exp - half)
}
