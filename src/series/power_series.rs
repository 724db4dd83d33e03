// src/series/power_series.rs

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use num::{BigInt, One, Signed, Zero};

/// Truncated formal Laurent series over Z: dense coefficients from a
/// (possibly negative) base exponent. Every operation that can grow the
/// series takes the truncation precision `n` explicitly — coefficients at
/// exponents >= n are implicitly zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PowerSeries {
    base: i64,
    coeffs: Vec<BigInt>,
}

impl PowerSeries {
    pub fn new() -> Self {
        PowerSeries {
            base: 0,
            coeffs: Vec::new(),
        }
    }

    pub fn from_scalar(v: BigInt) -> Self {
        let mut s = PowerSeries::new();
        s.addterm(v, 0);
        s
    }

    /// Adds c * x^exp into the series.
    pub fn addterm(&mut self, c: BigInt, exp: i64) {
        if c.is_zero() {
            return;
        }
        if self.coeffs.is_empty() {
            self.base = exp;
            self.coeffs.push(c);
            return;
        }
        if exp < self.base {
            let pad = (self.base - exp) as usize;
            let mut v = Vec::with_capacity(pad + self.coeffs.len());
            v.push(c);
            v.extend(std::iter::repeat_with(BigInt::zero).take(pad - 1));
            v.append(&mut self.coeffs);
            self.coeffs = v;
            self.base = exp;
            return;
        }
        let idx = (exp - self.base) as usize;
        if idx >= self.coeffs.len() {
            self.coeffs.resize_with(idx + 1, BigInt::zero);
        }
        self.coeffs[idx] += c;
    }

    pub fn coeff(&self, exp: i64) -> BigInt {
        if exp < self.base {
            return BigInt::zero();
        }
        let idx = (exp - self.base) as usize;
        self.coeffs.get(idx).cloned().unwrap_or_else(BigInt::zero)
    }

    /// Smallest exponent with a non-zero coefficient; 0 for the zero series.
    pub fn first(&self) -> i64 {
        for (i, c) in self.coeffs.iter().enumerate() {
            if !c.is_zero() {
                return self.base + i as i64;
            }
        }
        0
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_zero())
    }

    fn last_exp(&self) -> i64 {
        self.base + self.coeffs.len() as i64 - 1
    }

    fn trim(&mut self) {
        while let Some(c) = self.coeffs.last() {
            if c.is_zero() {
                self.coeffs.pop();
            } else {
                break;
            }
        }
        let lead = self.coeffs.iter().take_while(|c| c.is_zero()).count();
        if lead > 0 {
            self.coeffs.drain(..lead);
            self.base += lead as i64;
        }
        if self.coeffs.is_empty() {
            self.base = 0;
        }
    }

    /// Drop all terms with exponent >= n.
    pub fn modxn(&mut self, n: i64) {
        if self.base >= n {
            self.coeffs.clear();
            self.base = 0;
            return;
        }
        let keep = (n - self.base) as usize;
        self.coeffs.truncate(keep);
        self.trim();
    }

    /// Multiply by x^{-k}: shifts every exponent down by k.
    pub fn divxn(&mut self, k: i64) {
        self.base -= k;
    }

    /// Multiply by the scalar v.
    pub fn scale(&self, v: &BigInt) -> PowerSeries {
        if v.is_zero() {
            return PowerSeries::new();
        }
        let mut out = self.clone();
        for c in &mut out.coeffs {
            *c *= v;
        }
        out
    }

    /// Divide every coefficient by the scalar v; division must be exact.
    pub fn scale_div_exact(&self, v: &BigInt) -> PowerSeries {
        let mut out = self.clone();
        for c in &mut out.coeffs {
            debug_assert!((&*c % v).is_zero(), "inexact scalar division");
            *c /= v;
        }
        out.trim();
        out
    }

    /// Product truncated at x^n.
    pub fn mul(&self, other: &PowerSeries, n: i64) -> PowerSeries {
        if self.is_zero() || other.is_zero() {
            return PowerSeries::new();
        }
        let base = self.base + other.base;
        let len = ((n - base).max(0) as usize).min(self.coeffs.len() + other.coeffs.len() - 1);
        if len == 0 {
            return PowerSeries::new();
        }
        let mut coeffs = vec![BigInt::zero(); len];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() || i >= len {
                continue;
            }
            let jmax = (len - i).min(other.coeffs.len());
            for (j, b) in other.coeffs[..jmax].iter().enumerate() {
                if !b.is_zero() {
                    coeffs[i + j] += a * b;
                }
            }
        }
        let mut out = PowerSeries { base, coeffs };
        out.trim();
        out
    }

    /// Quotient truncated at x^n. The divisor's leading (lowest-exponent)
    /// coefficient must be a unit of Z, so the long division stays exact.
    pub fn div(&self, other: &PowerSeries, n: i64) -> PowerSeries {
        assert!(!other.is_zero(), "power series division by zero");
        let mut d = other.clone();
        d.trim();
        let lead = d.coeffs[0].clone();
        assert!(
            lead.abs().is_one(),
            "divisor leading coefficient must be a unit"
        );

        let mut rem = self.clone();
        rem.trim();
        if rem.is_zero() {
            return PowerSeries::new();
        }

        let base = rem.base - d.base;
        let terms = (n - base).max(0) as usize;
        let mut coeffs = Vec::with_capacity(terms);
        // rem and d are aligned at their lowest exponents; walk upward.
        for k in 0..terms {
            let r = if k < rem.coeffs.len() {
                rem.coeffs[k].clone()
            } else {
                BigInt::zero()
            };
            let q = if lead.is_one() { r } else { -r };
            if !q.is_zero() {
                let upper = (terms - k).min(d.coeffs.len());
                for j in 0..upper {
                    let t = &q * &d.coeffs[j];
                    if k + j < rem.coeffs.len() {
                        rem.coeffs[k + j] -= t;
                    } else {
                        rem.coeffs.resize_with(k + j + 1, BigInt::zero);
                        rem.coeffs[k + j] -= t;
                    }
                }
            }
            coeffs.push(q);
        }
        let mut out = PowerSeries { base, coeffs };
        out.trim();
        out
    }

    /// Integer power, truncated at x^n.
    pub fn pow(&self, e: u32, n: i64) -> PowerSeries {
        let mut acc = PowerSeries::from_scalar(BigInt::one());
        if e == 0 {
            return acc;
        }
        let bits = 32 - e.leading_zeros();
        for i in (0..bits).rev() {
            acc = acc.mul(&acc, n);
            if (e >> i) & 1 == 1 {
                acc = acc.mul(self, n);
            }
        }
        acc
    }

    /// Substitute x^l for x: every exponent is multiplied by l.
    pub fn power(&self, l: i64) -> PowerSeries {
        let mut out = PowerSeries::new();
        for (i, c) in self.coeffs.iter().enumerate() {
            if !c.is_zero() {
                out.addterm(c.clone(), (self.base + i as i64) * l);
            }
        }
        out
    }

    pub fn terms(&self) -> impl Iterator<Item = (i64, &BigInt)> {
        self.coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(move |(i, c)| (self.base + i as i64, c))
    }
}

impl Default for PowerSeries {
    fn default() -> Self {
        PowerSeries::new()
    }
}

impl Add for &PowerSeries {
    type Output = PowerSeries;
    fn add(self, rhs: &PowerSeries) -> PowerSeries {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl AddAssign<&PowerSeries> for PowerSeries {
    fn add_assign(&mut self, rhs: &PowerSeries) {
        for (exp, c) in rhs.terms().map(|(e, c)| (e, c.clone())).collect::<Vec<_>>() {
            self.addterm(c, exp);
        }
        self.trim();
    }
}

impl Sub for &PowerSeries {
    type Output = PowerSeries;
    fn sub(self, rhs: &PowerSeries) -> PowerSeries {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl SubAssign<&PowerSeries> for PowerSeries {
    fn sub_assign(&mut self, rhs: &PowerSeries) {
        for (exp, c) in rhs.terms().map(|(e, c)| (e, c.clone())).collect::<Vec<_>>() {
            self.addterm(-c, exp);
        }
        self.trim();
    }
}

impl Neg for &PowerSeries {
    type Output = PowerSeries;
    fn neg(self) -> PowerSeries {
        let mut out = self.clone();
        for c in &mut out.coeffs {
            *c = -std::mem::take(c);
        }
        out
    }
}

impl Mul<&PowerSeries> for &BigInt {
    type Output = PowerSeries;
    fn mul(self, rhs: &PowerSeries) -> PowerSeries {
        rhs.scale(self)
    }
}

impl fmt::Display for PowerSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (exp, c) in self.terms() {
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            write!(f, "{}*x^{}", c, exp)?;
        }
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(terms: &[(i64, i64)]) -> PowerSeries {
        let mut s = PowerSeries::new();
        for &(c, e) in terms {
            s.addterm(BigInt::from(c), e);
        }
        s
    }

    #[test]
    fn test_addterm_and_first() {
        let s = series(&[(3, 2), (-1, -1), (5, 0)]);
        assert_eq!(s.first(), -1);
        assert_eq!(s.coeff(-1), BigInt::from(-1));
        assert_eq!(s.coeff(0), BigInt::from(5));
        assert_eq!(s.coeff(2), BigInt::from(3));
        assert_eq!(s.coeff(7), BigInt::zero());
    }

    #[test]
    fn test_mul_truncates() {
        // (1 + x) * (1 - x + x^2) = 1 + x^3
        let a = series(&[(1, 0), (1, 1)]);
        let b = series(&[(1, 0), (-1, 1), (1, 2)]);
        let c = a.mul(&b, 10);
        assert_eq!(c, series(&[(1, 0), (1, 3)]));
        let c = a.mul(&b, 3);
        assert_eq!(c, series(&[(1, 0)]));
    }

    #[test]
    fn test_div_geometric() {
        // 1 / (1 - x) = 1 + x + x^2 + ...
        let one = series(&[(1, 0)]);
        let d = series(&[(1, 0), (-1, 1)]);
        let q = one.div(&d, 5);
        assert_eq!(q, series(&[(1, 0), (1, 1), (1, 2), (1, 3), (1, 4)]));
        // and the inverse direction reproduces the dividend
        assert_eq!(q.mul(&d, 5), one);
    }

    #[test]
    fn test_div_with_offset() {
        // x^2 / x = x
        let a = series(&[(1, 2)]);
        let b = series(&[(1, 1)]);
        assert_eq!(a.div(&b, 10), series(&[(1, 1)]));
    }

    #[test]
    fn test_pow_and_power() {
        let a = series(&[(1, 0), (1, 1)]);
        let cube = a.pow(3, 10);
        assert_eq!(cube, series(&[(1, 0), (3, 1), (3, 2), (1, 3)]));
        let sub = cube.power(2);
        assert_eq!(sub, series(&[(1, 0), (3, 2), (3, 4), (1, 6)]));
    }

    #[test]
    fn test_divxn() {
        let mut a = series(&[(1, 0), (4, 3)]);
        a.divxn(2);
        assert_eq!(a.first(), -2);
        assert_eq!(a.coeff(1), BigInt::from(4));
    }
}
