// src/poly/poly.rs

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::rc::Rc;

use num::{BigUint, Zero};

use crate::field::fp::{Fp, FpCtx};

/// Threshold below which schoolbook multiplication beats the transform.
const FFT_CUTOFF: usize = 24;

/// Dense univariate polynomial over GF(p). Coefficients are Montgomery
/// residues, lowest degree first, with no trailing zeros.
#[derive(Clone)]
pub struct Poly {
    ctx: Rc<FpCtx>,
    coeffs: Vec<BigUint>,
}

impl Poly {
    pub fn zero(ctx: &Rc<FpCtx>) -> Poly {
        Poly {
            ctx: Rc::clone(ctx),
            coeffs: Vec::new(),
        }
    }

    pub fn one(ctx: &Rc<FpCtx>) -> Poly {
        Poly {
            ctx: Rc::clone(ctx),
            coeffs: vec![ctx.one_rep()],
        }
    }

    /// The monomial x.
    pub fn x(ctx: &Rc<FpCtx>) -> Poly {
        Poly {
            ctx: Rc::clone(ctx),
            coeffs: vec![BigUint::zero(), ctx.one_rep()],
        }
    }

    pub fn from_coeffs(ctx: &Rc<FpCtx>, coeffs: Vec<Fp>) -> Poly {
        let mut p = Poly {
            ctx: Rc::clone(ctx),
            coeffs: coeffs.into_iter().map(|c| c.into_rep()).collect(),
        };
        p.trim();
        p
    }

    pub(crate) fn from_reps(ctx: &Rc<FpCtx>, coeffs: Vec<BigUint>) -> Poly {
        let mut p = Poly {
            ctx: Rc::clone(ctx),
            coeffs,
        };
        p.trim();
        p
    }

    pub fn ctx(&self) -> &Rc<FpCtx> {
        &self.ctx
    }

    fn trim(&mut self) {
        while let Some(c) = self.coeffs.last() {
            if c.is_zero() {
                self.coeffs.pop();
            } else {
                break;
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0] == self.ctx.one_rep()
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn coeff(&self, i: usize) -> Fp {
        match self.coeffs.get(i) {
            Some(rep) => self.ctx.fp_from_rep(rep.clone()),
            None => self.ctx.fp(0),
        }
    }

    pub fn lead(&self) -> Fp {
        self.coeff(self.degree())
    }

    /// Constant coefficient; the Elkies factor extraction peels these off
    /// between shifts.
    pub fn const_coeff(&self) -> Fp {
        self.coeff(0)
    }

    /// Add c * x^exp.
    pub fn addterm(&mut self, c: Fp, exp: usize) {
        if c.is_zero() {
            return;
        }
        if exp >= self.coeffs.len() {
            self.coeffs.resize_with(exp + 1, BigUint::zero);
        }
        self.coeffs[exp] = self.ctx.addm(&self.coeffs[exp], c.rep());
        self.trim();
    }

    /// Truncate: keep terms of degree < n.
    pub fn modxn(&self, n: usize) -> Poly {
        let mut out = self.clone();
        out.coeffs.truncate(n);
        out.trim();
        out
    }

    /// Divide by x^n, discarding lower terms.
    pub fn divxn(&self, n: usize) -> Poly {
        if n >= self.coeffs.len() {
            return Poly::zero(&self.ctx);
        }
        Poly {
            ctx: Rc::clone(&self.ctx),
            coeffs: self.coeffs[n..].to_vec(),
        }
    }

    /// Multiply by x^n.
    pub fn mulxn(&self, n: usize) -> Poly {
        if self.is_zero() {
            return self.clone();
        }
        let mut coeffs = vec![BigUint::zero(); n];
        coeffs.extend_from_slice(&self.coeffs);
        Poly {
            ctx: Rc::clone(&self.ctx),
            coeffs,
        }
    }

    /// Coefficients reversed: x^d * f(1/x), for the Newton remainder trick.
    pub(crate) fn reverse(&self) -> Poly {
        let mut coeffs = self.coeffs.clone();
        coeffs.reverse();
        Poly::from_reps(&self.ctx, coeffs)
    }

    /// Reversal with respect to a fixed length: coefficient i of the
    /// result is coefficient len-1-i of self (zero-padded).
    pub(crate) fn reverse_len(&self, len: usize) -> Poly {
        let mut coeffs = self.coeffs.clone();
        coeffs.resize_with(len, BigUint::zero);
        coeffs.truncate(len);
        coeffs.reverse();
        Poly::from_reps(&self.ctx, coeffs)
    }

    pub fn mul_fp(&self, s: &Fp) -> Poly {
        if s.is_zero() || self.is_zero() {
            return Poly::zero(&self.ctx);
        }
        let coeffs = self
            .coeffs
            .iter()
            .map(|c| self.ctx.mulm(c, s.rep()))
            .collect();
        Poly {
            ctx: Rc::clone(&self.ctx),
            coeffs,
        }
    }

    pub fn make_monic(&self) -> Poly {
        if self.is_zero() {
            return self.clone();
        }
        let lead = self.lead();
        if lead.is_one() {
            return self.clone();
        }
        self.mul_fp(&lead.inv())
    }

    fn mul_schoolbook(&self, other: &Poly) -> Poly {
        let ctx = &self.ctx;
        let mut coeffs = vec![BigUint::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                if b.is_zero() {
                    continue;
                }
                let t = ctx.mulm(a, b);
                coeffs[i + j] = ctx.addm(&coeffs[i + j], &t);
            }
        }
        Poly::from_reps(ctx, coeffs)
    }

    fn mul_fft(&self, other: &Poly) -> Poly {
        let ctx = &self.ctx;
        let wide = ctx.with_fft(|plan| plan.convolve(&self.coeffs, &other.coeffs));
        let coeffs = wide.into_iter().map(|w| ctx.reduce_wide(w)).collect();
        Poly::from_reps(ctx, coeffs)
    }

    /// Euclidean division: returns (quotient, remainder).
    pub fn divrem(&self, divisor: &Poly) -> (Poly, Poly) {
        assert!(!divisor.is_zero(), "polynomial division by zero");
        if self.is_zero() || divisor.degree() > self.degree() {
            return (Poly::zero(&self.ctx), self.clone());
        }
        let ctx = &self.ctx;
        let dd = divisor.degree();
        let lead_inv = divisor.lead().inv();
        let mut rem = self.coeffs.clone();
        let mut quot = vec![BigUint::zero(); self.degree() - dd + 1];

        for i in (0..quot.len()).rev() {
            let top = ctx.mulm(&rem[dd + i], lead_inv.rep());
            if top.is_zero() {
                continue;
            }
            rem[dd + i] = BigUint::zero();
            for j in 0..dd {
                let t = ctx.mulm(&top, &divisor.coeffs[j]);
                rem[i + j] = ctx.subm(&rem[i + j], &t);
            }
            quot[i] = top;
        }
        rem.truncate(dd);
        (Poly::from_reps(ctx, quot), Poly::from_reps(ctx, rem))
    }

    pub fn rem(&self, divisor: &Poly) -> Poly {
        self.divrem(divisor).1
    }

    /// Monic greatest common divisor by the Euclidean remainder sequence.
    pub fn gcd(a: &Poly, b: &Poly) -> Poly {
        let mut f = a.clone();
        let mut g = b.clone();
        if g.degree() > f.degree() {
            std::mem::swap(&mut f, &mut g);
        }
        while !g.is_zero() {
            let r = f.rem(&g);
            f = std::mem::replace(&mut g, r);
        }
        f.make_monic()
    }

    pub fn eval(&self, x: &Fp) -> Fp {
        let ctx = &self.ctx;
        let mut acc = BigUint::zero();
        for c in self.coeffs.iter().rev() {
            acc = ctx.mulm(&acc, x.rep());
            acc = ctx.addm(&acc, c);
        }
        ctx.fp_from_rep(acc)
    }

    fn assert_same_ctx(&self, other: &Poly) {
        debug_assert!(
            Rc::ptr_eq(&self.ctx, &other.ctx),
            "mixed field contexts in polynomial arithmetic"
        );
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        self.assert_same_ctx(other);
        self.coeffs == other.coeffs
    }
}

impl Eq for Poly {}

impl<'a, 'b> Add<&'b Poly> for &'a Poly {
    type Output = Poly;
    fn add(self, rhs: &'b Poly) -> Poly {
        self.assert_same_ctx(rhs);
        let ctx = &self.ctx;
        let n = self.coeffs.len().max(rhs.coeffs.len());
        let mut coeffs = Vec::with_capacity(n);
        for i in 0..n {
            let a = self.coeffs.get(i);
            let b = rhs.coeffs.get(i);
            coeffs.push(match (a, b) {
                (Some(a), Some(b)) => ctx.addm(a, b),
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => unreachable!(),
            });
        }
        Poly::from_reps(ctx, coeffs)
    }
}

impl<'a, 'b> Sub<&'b Poly> for &'a Poly {
    type Output = Poly;
    fn sub(self, rhs: &'b Poly) -> Poly {
        self.assert_same_ctx(rhs);
        let ctx = &self.ctx;
        let n = self.coeffs.len().max(rhs.coeffs.len());
        let zero = BigUint::zero();
        let mut coeffs = Vec::with_capacity(n);
        for i in 0..n {
            let a = self.coeffs.get(i).unwrap_or(&zero);
            let b = rhs.coeffs.get(i).unwrap_or(&zero);
            coeffs.push(ctx.subm(a, b));
        }
        Poly::from_reps(ctx, coeffs)
    }
}

impl<'a> Neg for &'a Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        let coeffs = self.coeffs.iter().map(|c| self.ctx.negm(c)).collect();
        Poly::from_reps(&self.ctx, coeffs)
    }
}

impl<'a, 'b> Mul<&'b Poly> for &'a Poly {
    type Output = Poly;
    fn mul(self, rhs: &'b Poly) -> Poly {
        self.assert_same_ctx(rhs);
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero(&self.ctx);
        }
        if self.coeffs.len().min(rhs.coeffs.len()) <= FFT_CUTOFF {
            self.mul_schoolbook(rhs)
        } else {
            self.mul_fft(rhs)
        }
    }
}

impl fmt::Debug for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for i in (0..=self.degree()).rev() {
            let c = self.coeff(i);
            if c.is_zero() {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            write!(f, "{}*x^{}", c, i)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::BigInt;

    fn ctx() -> Rc<FpCtx> {
        FpCtx::new(&BigInt::from(1000003)).unwrap()
    }

    fn poly(ctx: &Rc<FpCtx>, coeffs: &[i64]) -> Poly {
        Poly::from_coeffs(ctx, coeffs.iter().map(|&c| ctx.fp(c)).collect())
    }

    #[test]
    fn test_mul_matches_schoolbook() {
        let ctx = ctx();
        // degrees straddling the FFT cutoff
        let a: Vec<i64> = (0..60).map(|i| (i * 7 + 3) % 1000).collect();
        let b: Vec<i64> = (0..45).map(|i| (i * 13 + 11) % 1000).collect();
        let pa = poly(&ctx, &a);
        let pb = poly(&ctx, &b);
        let fast = pa.mul_fft(&pb);
        let slow = pa.mul_schoolbook(&pb);
        assert_eq!(fast, slow);
        assert_eq!(fast.degree(), pa.degree() + pb.degree());
    }

    #[test]
    fn test_divrem_identity() {
        let ctx = ctx();
        let f = poly(&ctx, &[5, 0, 3, 2, 0, 7, 1]);
        let g = poly(&ctx, &[2, 1, 4]);
        let (q, r) = f.divrem(&g);
        assert!(r.degree() < g.degree());
        let back = &(&q * &g) + &r;
        assert_eq!(back, f);
    }

    #[test]
    fn test_gcd_of_common_factor() {
        let ctx = ctx();
        let common = poly(&ctx, &[1, 1]); // x + 1
        let f = &poly(&ctx, &[3, 1]) * &common;
        let g = &poly(&ctx, &[7, 0, 2]) * &common;
        let gcd = Poly::gcd(&f, &g);
        assert_eq!(gcd, common.make_monic());
    }

    #[test]
    fn test_gcd_coprime_is_one() {
        let ctx = ctx();
        let f = poly(&ctx, &[1, 1]);
        let g = poly(&ctx, &[2, 1]);
        assert!(Poly::gcd(&f, &g).is_one());
    }

    #[test]
    fn test_eval() {
        let ctx = ctx();
        let f = poly(&ctx, &[1, 2, 3]); // 1 + 2x + 3x^2
        assert_eq!(f.eval(&ctx.fp(5)).to_bigint(), BigInt::from(86));
    }

    #[test]
    fn test_shifts() {
        let ctx = ctx();
        let f = poly(&ctx, &[1, 2, 3, 4]);
        assert_eq!(f.modxn(2), poly(&ctx, &[1, 2]));
        assert_eq!(f.divxn(2), poly(&ctx, &[3, 4]));
        assert_eq!(f.mulxn(1), poly(&ctx, &[0, 1, 2, 3, 4]));
    }
}
