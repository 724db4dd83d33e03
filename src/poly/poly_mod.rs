// src/poly/poly_mod.rs

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::rc::Rc;

use num::BigUint;

use crate::field::fp::{Fp, FpCtx};
use crate::poly::poly::Poly;

/// A fixed quotient ring Fp[x]/(M). Construction is the "setmod" of the
/// pipeline: the Newton inverse of the reversed modulus is precomputed
/// here, so every modulus-dependent table dies with its ring.
pub struct PolyModCtx {
    m: Poly,
    minv: Poly, // inverse of rev(M) mod x^deg(M)
}

impl PolyModCtx {
    pub fn new(m: Poly) -> Rc<PolyModCtx> {
        assert!(m.degree() >= 1, "polynomial modulus must have degree >= 1");
        let d = m.degree();
        let minv = newton_inverse(&m.reverse(), d.max(1));
        Rc::new(PolyModCtx { m, minv })
    }

    pub fn modulus(&self) -> &Poly {
        &self.m
    }

    pub fn degree(&self) -> usize {
        self.m.degree()
    }

    pub fn fp_ctx(&self) -> &Rc<FpCtx> {
        self.m.ctx()
    }

    /// Remainder of f modulo M via the precomputed reversed inverse.
    /// Valid for deg f <= 2*deg M - 2, which covers residue products.
    pub fn reduce(&self, f: &Poly) -> Poly {
        let d = self.m.degree();
        if f.is_zero() || f.degree() < d {
            return f.clone();
        }
        let k = f.degree() - d;
        debug_assert!(k + 1 <= self.minv_precision());
        let q_rev = (&f.reverse() * &self.minv).modxn(k + 1);
        let q = q_rev.reverse_len(k + 1);
        let r = f - &(&q * &self.m);
        debug_assert!(r.is_zero() || r.degree() < d);
        r.modxn(d)
    }

    fn minv_precision(&self) -> usize {
        self.m.degree().max(1)
    }

    pub fn embed(self: &Rc<Self>, f: Poly) -> PolyMod {
        let val = if f.degree() >= self.degree() && !f.is_zero() {
            // arbitrary-degree input falls back to long division
            f.rem(&self.m)
        } else {
            f
        };
        PolyMod {
            ctx: Rc::clone(self),
            val,
        }
    }

    pub fn zero(self: &Rc<Self>) -> PolyMod {
        PolyMod {
            ctx: Rc::clone(self),
            val: Poly::zero(self.fp_ctx()),
        }
    }

    pub fn one(self: &Rc<Self>) -> PolyMod {
        self.constant(self.fp_ctx().fp(1))
    }

    pub fn constant(self: &Rc<Self>, c: Fp) -> PolyMod {
        let mut val = Poly::zero(self.fp_ctx());
        val.addterm(c, 0);
        PolyMod {
            ctx: Rc::clone(self),
            val,
        }
    }

    pub fn x(self: &Rc<Self>) -> PolyMod {
        self.embed(Poly::x(self.fp_ctx()))
    }
}

/// Inverse of f modulo x^prec by Newton iteration; f must have an
/// invertible constant coefficient.
fn newton_inverse(f: &Poly, prec: usize) -> Poly {
    let ctx = f.ctx();
    let c0 = f.const_coeff();
    let mut g = Poly::zero(ctx);
    g.addterm(c0.inv(), 0);
    let mut have = 1usize;
    let two = {
        let mut t = Poly::zero(ctx);
        t.addterm(ctx.fp(2), 0);
        t
    };
    while have < prec {
        have = (have * 2).min(prec.next_power_of_two());
        let t = &two - &(&f.modxn(have) * &g).modxn(have);
        g = (&g * &t).modxn(have);
    }
    g.modxn(prec)
}

/// A residue in the active quotient ring.
#[derive(Clone)]
pub struct PolyMod {
    ctx: Rc<PolyModCtx>,
    val: Poly,
}

impl PolyMod {
    pub fn ctx(&self) -> &Rc<PolyModCtx> {
        &self.ctx
    }

    pub fn val(&self) -> &Poly {
        &self.val
    }

    pub fn into_val(self) -> Poly {
        self.val
    }

    pub fn is_zero(&self) -> bool {
        self.val.is_zero()
    }

    pub fn mul_fp(&self, s: &Fp) -> PolyMod {
        PolyMod {
            ctx: Rc::clone(&self.ctx),
            val: self.val.mul_fp(s),
        }
    }

    pub fn mul_small(&self, s: i64) -> PolyMod {
        self.mul_fp(&self.ctx.fp_ctx().fp(s))
    }

    /// Division by a field constant.
    pub fn div_fp(&self, s: &Fp) -> PolyMod {
        self.mul_fp(&s.inv())
    }

    pub fn square(&self) -> PolyMod {
        self * self
    }

    /// self^e by square-and-multiply in the quotient ring.
    pub fn pow(&self, e: &BigUint) -> PolyMod {
        let mut acc = self.ctx.one();
        for i in (0..e.bits()).rev() {
            acc = acc.square();
            if e.bit(i) {
                acc = &acc * self;
            }
        }
        acc
    }

    /// gcd of this residue's lift with the ring modulus, made monic.
    pub fn gcd_with_modulus(&self) -> Poly {
        Poly::gcd(&self.val, self.ctx.modulus())
    }

    fn assert_same_ctx(&self, other: &PolyMod) {
        debug_assert!(
            Rc::ptr_eq(&self.ctx, &other.ctx),
            "mixed quotient rings in PolyMod arithmetic"
        );
    }
}

/// f(g) mod M by Brent-Kung baby-step/giant-step: the coefficient list of
/// f is split into sqrt-size blocks, each evaluated with precomputed
/// powers of g, and the blocks combined by Horner in g^t.
pub fn compose(f: &PolyMod, g: &PolyMod) -> PolyMod {
    f.assert_same_ctx(g);
    let ring = f.ctx();
    let d = ring.degree();
    if f.val().is_zero() {
        return ring.zero();
    }
    let t = (d as f64).sqrt().ceil() as usize + 1;

    // baby steps: g^0 .. g^(t-1), and the giant stride g^t
    let mut baby = Vec::with_capacity(t);
    baby.push(ring.one());
    for j in 1..t {
        baby.push(&baby[j - 1] * g);
    }
    let giant = &baby[t - 1] * g;

    let deg_f = f.val().degree();
    let blocks = deg_f / t + 1;
    let mut acc = ring.zero();
    for i in (0..blocks).rev() {
        acc = &acc * &giant;
        let mut block = Poly::zero(ring.fp_ctx());
        for j in 0..t {
            let idx = i * t + j;
            if idx > deg_f {
                break;
            }
            let c = f.val().coeff(idx);
            if c.is_zero() {
                continue;
            }
            block = &block + &baby[j].val().mul_fp(&c);
        }
        acc = &acc + &ring.embed(block);
    }
    acc
}

impl PartialEq for PolyMod {
    fn eq(&self, other: &Self) -> bool {
        self.assert_same_ctx(other);
        self.val == other.val
    }
}

impl Eq for PolyMod {}

impl<'a, 'b> Add<&'b PolyMod> for &'a PolyMod {
    type Output = PolyMod;
    fn add(self, rhs: &'b PolyMod) -> PolyMod {
        self.assert_same_ctx(rhs);
        PolyMod {
            ctx: Rc::clone(&self.ctx),
            val: &self.val + &rhs.val,
        }
    }
}

impl<'a, 'b> Sub<&'b PolyMod> for &'a PolyMod {
    type Output = PolyMod;
    fn sub(self, rhs: &'b PolyMod) -> PolyMod {
        self.assert_same_ctx(rhs);
        PolyMod {
            ctx: Rc::clone(&self.ctx),
            val: &self.val - &rhs.val,
        }
    }
}

impl<'a, 'b> Mul<&'b PolyMod> for &'a PolyMod {
    type Output = PolyMod;
    fn mul(self, rhs: &'b PolyMod) -> PolyMod {
        self.assert_same_ctx(rhs);
        let prod = &self.val * &rhs.val;
        PolyMod {
            ctx: Rc::clone(&self.ctx),
            val: self.ctx.reduce(&prod),
        }
    }
}

impl<'a> Neg for &'a PolyMod {
    type Output = PolyMod;
    fn neg(self) -> PolyMod {
        PolyMod {
            ctx: Rc::clone(&self.ctx),
            val: -&self.val,
        }
    }
}

impl fmt::Debug for PolyMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (mod {:?})", self.val, self.ctx.m)
    }
}
