// src/field/fp.rs

use std::cell::RefCell;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use num::{BigInt, BigUint, Integer, One, Zero};

use crate::core::error::{SeaError, SeaResult};
use crate::field::fft::FftPlan;
use crate::integer_math::gcd::GCD;
use crate::integer_math::modular;
use crate::integer_math::primes::PrimeFactory;

/// Field context for GF(p). Owns the Montgomery constants and the FFT
/// plan cache; every `Fp` element carries a handle to its context, so
/// there is no process-global modulus.
pub struct FpCtx {
    p: BigUint,
    p_int: BigInt,
    r_bits: u64,
    r_mask: BigUint,
    n_prime: BigUint, // -p^{-1} mod 2^r_bits
    one_rep: BigUint, // R mod p
    r2: BigUint,      // R^2 mod p
    fft: RefCell<Option<FftPlan>>,
}

impl FpCtx {
    /// Validates p (prime, at least 5) and precomputes the Montgomery
    /// constants for R = 2^(64*ceil(bits/64)).
    pub fn new(p: &BigInt) -> SeaResult<Rc<FpCtx>> {
        if p < &BigInt::from(5) {
            return Err(SeaError::BadParams(format!("modulus {} is below 5", p)));
        }
        if !PrimeFactory::is_probable_prime(p) {
            return Err(SeaError::BadParams(format!("modulus {} is not prime", p)));
        }
        let pu = p.to_biguint().unwrap();
        let limbs = (pu.bits() + 63) / 64;
        let r_bits = limbs * 64;
        let r = BigUint::one() << r_bits;
        let r_mask = &r - 1u32;

        let p_inv = GCD::mod_inverse(p, &BigInt::from(r.clone()))
            .expect("odd modulus is invertible mod a power of two");
        let n_prime = (BigInt::from(r.clone()) - p_inv).to_biguint().unwrap() & &r_mask;

        let one_rep = &r % &pu;
        let r2 = (&one_rep * &one_rep) % &pu;

        Ok(Rc::new(FpCtx {
            p: pu,
            p_int: p.clone(),
            r_bits,
            r_mask,
            n_prime,
            one_rep,
            r2,
            fft: RefCell::new(None),
        }))
    }

    pub fn prime(&self) -> &BigUint {
        &self.p
    }

    pub fn prime_int(&self) -> &BigInt {
        &self.p_int
    }

    pub fn bits(&self) -> u64 {
        self.p.bits()
    }

    // Montgomery reduction: t < R*p  ->  t*R^{-1} mod p.
    fn redc(&self, t: BigUint) -> BigUint {
        let m = ((&t & &self.r_mask) * &self.n_prime) & &self.r_mask;
        let u = (t + m * &self.p) >> self.r_bits;
        if u >= self.p {
            u - &self.p
        } else {
            u
        }
    }

    // Residue-level arithmetic on Montgomery representatives. The dense
    // polynomial layer works on these directly.
    pub(crate) fn addm(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let s = a + b;
        if s >= self.p {
            s - &self.p
        } else {
            s
        }
    }

    pub(crate) fn subm(&self, a: &BigUint, b: &BigUint) -> BigUint {
        if a >= b {
            a - b
        } else {
            a + &self.p - b
        }
    }

    pub(crate) fn negm(&self, a: &BigUint) -> BigUint {
        if a.is_zero() {
            BigUint::zero()
        } else {
            &self.p - a
        }
    }

    pub(crate) fn mulm(&self, a: &BigUint, b: &BigUint) -> BigUint {
        self.redc(a * b)
    }

    pub(crate) fn to_mont(&self, v: &BigUint) -> BigUint {
        self.redc(v * &self.r2)
    }

    pub(crate) fn from_mont(&self, rep: &BigUint) -> BigUint {
        self.redc(rep.clone())
    }

    pub(crate) fn one_rep(&self) -> BigUint {
        self.one_rep.clone()
    }

    /// Fold a CRT-recombined convolution coefficient (a sum of products
    /// of Montgomery representatives, so carrying an extra factor of R)
    /// back to a single Montgomery representative.
    pub(crate) fn reduce_wide(&self, v: BigUint) -> BigUint {
        self.redc(v % &self.p)
    }

    pub fn fp(self: &Rc<Self>, v: i64) -> Fp {
        self.fp_from(&BigInt::from(v))
    }

    pub fn fp_from(self: &Rc<Self>, v: &BigInt) -> Fp {
        let reduced = v.mod_floor(&self.p_int).to_biguint().unwrap();
        Fp {
            ctx: Rc::clone(self),
            rep: self.to_mont(&reduced),
        }
    }

    pub fn fp_from_uint(self: &Rc<Self>, v: &BigUint) -> Fp {
        Fp {
            ctx: Rc::clone(self),
            rep: self.to_mont(&(v % &self.p)),
        }
    }

    pub(crate) fn fp_from_rep(self: &Rc<Self>, rep: BigUint) -> Fp {
        debug_assert!(rep < self.p);
        Fp {
            ctx: Rc::clone(self),
            rep,
        }
    }

    pub(crate) fn with_fft<R>(&self, f: impl FnOnce(&FftPlan) -> R) -> R {
        let mut slot = self.fft.borrow_mut();
        if slot.is_none() {
            *slot = Some(FftPlan::for_modulus_bits(self.p.bits()));
        }
        f(slot.as_ref().unwrap())
    }
}

impl fmt::Debug for FpCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FpCtx(p={})", self.p)
    }
}

/// An element of GF(p) in Montgomery form, tied to its field context.
#[derive(Clone)]
pub struct Fp {
    ctx: Rc<FpCtx>,
    rep: BigUint,
}

impl Fp {
    pub fn ctx(&self) -> &Rc<FpCtx> {
        &self.ctx
    }

    pub fn is_zero(&self) -> bool {
        self.rep.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.rep == self.ctx.one_rep
    }

    /// Canonical value in [0, p).
    pub fn value(&self) -> BigUint {
        self.ctx.from_mont(&self.rep)
    }

    pub fn to_bigint(&self) -> BigInt {
        BigInt::from(self.value())
    }

    pub(crate) fn rep(&self) -> &BigUint {
        &self.rep
    }

    pub(crate) fn into_rep(self) -> BigUint {
        self.rep
    }

    pub fn pow(&self, e: &BigUint) -> Fp {
        let mut acc = self.ctx.fp_from_rep(self.ctx.one_rep());
        for i in (0..e.bits()).rev() {
            acc = &acc * &acc;
            if e.bit(i) {
                acc = &acc * self;
            }
        }
        acc
    }

    pub fn try_inv(&self) -> Option<Fp> {
        if self.is_zero() {
            return None;
        }
        let inv = GCD::mod_inverse(&self.to_bigint(), self.ctx.prime_int())?;
        Some(self.ctx.fp_from(&inv))
    }

    pub fn inv(&self) -> Fp {
        self.try_inv().expect("division by zero in GF(p)")
    }

    /// Square root, if this element is a quadratic residue.
    pub fn sqrt(&self) -> Option<Fp> {
        let r = modular::sqrt_mod(&self.to_bigint(), self.ctx.prime_int())?;
        Some(self.ctx.fp_from(&r))
    }

    pub fn jacobi(&self) -> i32 {
        crate::integer_math::jacobi::Jacobi::symbol(&self.to_bigint(), self.ctx.prime_int())
    }

    fn assert_same_ctx(&self, other: &Fp) {
        debug_assert!(
            Rc::ptr_eq(&self.ctx, &other.ctx),
            "mixed field contexts in Fp arithmetic"
        );
    }
}

impl PartialEq for Fp {
    fn eq(&self, other: &Self) -> bool {
        self.assert_same_ctx(other);
        self.rep == other.rep
    }
}

impl Eq for Fp {}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl<'a, 'b> Add<&'b Fp> for &'a Fp {
    type Output = Fp;
    fn add(self, rhs: &'b Fp) -> Fp {
        self.assert_same_ctx(rhs);
        self.ctx.fp_from_rep(self.ctx.addm(&self.rep, &rhs.rep))
    }
}

impl<'a, 'b> Sub<&'b Fp> for &'a Fp {
    type Output = Fp;
    fn sub(self, rhs: &'b Fp) -> Fp {
        self.assert_same_ctx(rhs);
        self.ctx.fp_from_rep(self.ctx.subm(&self.rep, &rhs.rep))
    }
}

impl<'a, 'b> Mul<&'b Fp> for &'a Fp {
    type Output = Fp;
    fn mul(self, rhs: &'b Fp) -> Fp {
        self.assert_same_ctx(rhs);
        self.ctx.fp_from_rep(self.ctx.mulm(&self.rep, &rhs.rep))
    }
}

impl<'a, 'b> Div<&'b Fp> for &'a Fp {
    type Output = Fp;
    fn div(self, rhs: &'b Fp) -> Fp {
        self * &rhs.inv()
    }
}

impl<'a> Neg for &'a Fp {
    type Output = Fp;
    fn neg(self) -> Fp {
        self.ctx.fp_from_rep(self.ctx.negm(&self.rep))
    }
}

// Owned-operand forwarding, in the style the pack's curve crates generate
// with their macros.
macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<Fp> for Fp {
            type Output = Fp;
            fn $method(self, rhs: Fp) -> Fp {
                (&self).$method(&rhs)
            }
        }
        impl<'a> $trait<&'a Fp> for Fp {
            type Output = Fp;
            fn $method(self, rhs: &'a Fp) -> Fp {
                (&self).$method(rhs)
            }
        }
        impl<'a> $trait<Fp> for &'a Fp {
            type Output = Fp;
            fn $method(self, rhs: Fp) -> Fp {
                self.$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
forward_binop!(Div, div);

impl Neg for Fp {
    type Output = Fp;
    fn neg(self) -> Fp {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Rc<FpCtx> {
        FpCtx::new(&BigInt::from(2147483647i64)).unwrap()
    }

    #[test]
    fn test_rejects_bad_modulus() {
        assert!(FpCtx::new(&BigInt::from(4)).is_err());
        assert!(FpCtx::new(&BigInt::from(91)).is_err()); // 7 * 13
    }

    #[test]
    fn test_montgomery_roundtrip() {
        let ctx = ctx();
        for v in [0i64, 1, 2, 12345, 2147483646] {
            let x = ctx.fp(v);
            assert_eq!(x.to_bigint(), BigInt::from(v));
        }
        // negative values reduce into [0, p)
        assert_eq!(ctx.fp(-3).to_bigint(), BigInt::from(2147483644i64));
    }

    #[test]
    fn test_field_ops() {
        let ctx = ctx();
        let a = ctx.fp(1234567);
        let b = ctx.fp(7654321);
        assert_eq!((&a + &b).to_bigint(), BigInt::from(8888888));
        assert_eq!((&a * &b).to_bigint(), {
            let p = BigInt::from(2147483647i64);
            (BigInt::from(1234567) * BigInt::from(7654321)) % p
        });
        let inv = a.inv();
        assert!((&a * &inv).is_one());
        assert_eq!(&a - &a, ctx.fp(0));
        assert_eq!(-&a + &a, ctx.fp(0));
    }

    #[test]
    fn test_pow_fermat() {
        let ctx = ctx();
        let a = ctx.fp(987654321);
        let e = BigUint::from(2147483646u64);
        assert!(a.pow(&e).is_one());
    }

    #[test]
    fn test_sqrt() {
        let ctx = ctx();
        let a = ctx.fp(1234567);
        let sq = &a * &a;
        let r = sq.sqrt().unwrap();
        assert_eq!(&r * &r, sq);
    }
}
