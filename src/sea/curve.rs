// src/sea/curve.rs
//
// Elliptic curve arithmetic over the active quotient ring. Points are
// projective triples of residues; the Y coordinate of every point is
// implicitly multiplied by y, and y^2 is substituted by the curve
// polynomial whenever it appears.

use crate::field::fp::Fp;
use crate::poly::poly_mod::PolyMod;

/// Curve constants plus the curve polynomial embedded in the active
/// ring. Rebuilt at every setmod.
pub struct CurveState {
    pub a: Fp,
    pub b: Fp,
    pub my2: PolyMod,
}

/// (X, Y, Z) := 2 * (X, Y, Z).
pub fn elliptic_dup(x: &mut PolyMod, y: &mut PolyMod, z: &mut PolyMod, s: &CurveState) {
    let w2 = &*z * &*z;
    let w3 = (&w2 * &w2).mul_fp(&s.a);
    let w1 = &*x * &*x;
    let w4 = &w1.mul_small(3) + &w3;
    *z = &*z * &y.mul_small(2);
    let w2 = &s.my2 * &(&*y * &*y);
    let w3 = (&*x * &w2).mul_small(4);
    let w1 = &w4 * &w4;
    *x = &w1 - &w3.mul_small(2);
    let mut w2 = &w2 * &w2;
    w2 = w2.mul_small(8);
    let w3 = &(&w3 - &*x) * &w4;
    *y = &w3 - &w2;
    // move the implied y from Z to Y
    *x = &*x * &s.my2;
    *y = &*y * &s.my2;
    *z = &*z * &s.my2;
}

/// (XT, YT, ZT) += (X, Y, 1). Falls into doubling when the points
/// coincide; a vanishing ZT signals the point at infinity.
pub fn elliptic_add(
    xt: &mut PolyMod,
    yt: &mut PolyMod,
    zt: &mut PolyMod,
    x: &PolyMod,
    y: &PolyMod,
    s: &CurveState,
) {
    let mut w1 = xt.clone();
    let mut w6 = &*zt * &*zt;
    let w4 = x * &w6;
    w1 = &w1 - &w4;

    let mut w2 = yt.clone();
    w6 = &w6 * &*zt;
    let w5 = y * &w6;
    w2 = &w2 - &w5;
    if w1.is_zero() {
        if w2.is_zero() {
            // should have doubled
            elliptic_dup(xt, yt, zt, s);
            return;
        }
        // point at infinity
        *zt = zt.ctx().zero();
        return;
    }

    let w4 = &w1 + &w4.mul_small(2);
    let w5 = &w2 + &w5.mul_small(2);

    *zt = &*zt * &w1;

    let mut w6 = &w1 * &w1;
    let w1 = &w1 * &w6;
    w6 = &w6 * &w4;
    let w4 = &s.my2 * &(&w2 * &w2);

    *xt = &w4 - &w6;

    let w6 = &w6 - &xt.mul_small(2);
    let w2 = &w2 * &w6;
    let w1 = &w1 * &w5;
    let w5 = &w2 - &w1;

    let half = s.a.ctx().fp(2).inv();
    *yt = w5.mul_fp(&half);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fp::FpCtx;
    use crate::poly::poly::Poly;
    use crate::poly::poly_mod::{PolyMod, PolyModCtx};
    use num::BigInt;
    use std::rc::Rc;

    // y^2 = x^3 + 2x + 1 over GF(199), with P = (1, 2):
    // 2P = (12, 34) and 3P = (30, 185).

    fn curve_state(ring: &Rc<PolyModCtx>, ctx: &Rc<FpCtx>) -> CurveState {
        let a = ctx.fp(2);
        let b = ctx.fp(1);
        let mut y2 = Poly::zero(ctx);
        y2.addterm(b.clone(), 0);
        y2.addterm(a.clone(), 1);
        y2.addterm(ctx.fp(1), 3);
        CurveState {
            a,
            b,
            my2: ring.embed(y2),
        }
    }

    #[test]
    fn test_torsion_point_annihilated_in_division_poly_ring() {
        let ctx = FpCtx::new(&BigInt::from(199)).unwrap();
        let a = ctx.fp(2);
        let b = ctx.fp(1);
        // psi_3 = 3x^4 + 6ax^2 + 12bx - a^2
        let mut psi3 = Poly::zero(&ctx);
        psi3.addterm(ctx.fp(3), 4);
        psi3.addterm(&ctx.fp(6) * &a, 2);
        psi3.addterm(&ctx.fp(12) * &b, 1);
        psi3.addterm(-&(&a * &a), 0);
        let ring = PolyModCtx::new(psi3);
        let s = curve_state(&ring, &ctx);

        // The generic point (x, y): X = x, Y = 1 (implied y), Z = 1.
        let x0 = ring.x();
        let y0 = ring.one();
        let mut x2 = x0.clone();
        let mut y2 = y0.clone();
        let mut z2 = ring.one();
        elliptic_dup(&mut x2, &mut y2, &mut z2, &s);
        assert!(!z2.is_zero());

        // 3 * (x, y) = O on the 3-torsion, so the Z coordinate must
        // vanish identically modulo psi_3.
        elliptic_add(&mut x2, &mut y2, &mut z2, &x0, &y0, &s);
        assert!(z2.is_zero());
    }

    #[test]
    fn test_projective_formulas_match_affine_points() {
        let ctx = FpCtx::new(&BigInt::from(199)).unwrap();
        // Modulus x - 1 pins the generic point to x = 1, so residues are
        // plain field values and the triples can be read off affinely.
        let mut m = Poly::zero(&ctx);
        m.addterm(ctx.fp(-1), 0);
        m.addterm(ctx.fp(1), 1);
        let ring = PolyModCtx::new(m);
        let s = curve_state(&ring, &ctx);
        let y_at_p = ctx.fp(2); // y-coordinate of P = (1, 2)

        let affine = |x: &PolyMod, y: &PolyMod, z: &PolyMod| -> (crate::field::fp::Fp, crate::field::fp::Fp) {
            let xv = x.val().const_coeff();
            let yv = y.val().const_coeff();
            let zv = z.val().const_coeff();
            let z2 = &zv * &zv;
            let z3 = &z2 * &zv;
            (&xv / &z2, &(&yv * &y_at_p) / &z3)
        };

        let mut x = ring.x();
        let mut y = ring.one();
        let mut z = ring.one();
        elliptic_dup(&mut x, &mut y, &mut z, &s);
        let (x2, y2) = affine(&x, &y, &z);
        assert_eq!(x2, ctx.fp(12));
        assert_eq!(y2, ctx.fp(34));

        elliptic_add(&mut x, &mut y, &mut z, &ring.x(), &ring.one(), &s);
        let (x3, y3) = affine(&x, &y, &z);
        assert_eq!(x3, ctx.fp(30));
        assert_eq!(y3, ctx.fp(185));
    }
}
