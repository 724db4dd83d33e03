// src/sea/schoof.rs
//
// Schoof's original method for the small primes and prime powers
// [3, 5, 7, 8, 9]: find tau with (X^{p^2}, Y^{p^2}) + k(X,Y) =
// tau (X^p, Y^p) in the ring modulo the division polynomial, reading
// k(X,Y) straight off the division-polynomial recurrence.

use std::rc::Rc;

use log::{info, warn};
use num::{BigInt, BigUint, Integer, ToPrimitive};

use crate::field::fp::{Fp, FpCtx};
use crate::poly::poly::Poly;
use crate::poly::poly_mod::{compose, PolyMod, PolyModCtx};
use crate::sea::curve::{elliptic_add, elliptic_dup, CurveState};

/// The small moduli handled by the original Schoof method. 8 and 9 are
/// prime powers so the accumulated moduli stay pairwise coprime.
pub const SMALL_MODULI: [u32; 5] = [3, 5, 7, 8, 9];

/// Largest entry of SMALL_MODULI; file primes at or below it are skipped.
pub const SCHOOF_LIMIT: u32 = 9;

/// Division polynomials psi_0 .. psi_max as plain polynomials, with Y^2
/// substituted by the curve equation throughout (Schoof 1985, p. 485).
pub fn division_polys(ctx: &Rc<FpCtx>, a: &Fp, b: &Fp, max: usize) -> Vec<Poly> {
    let y2 = curve_poly(ctx, a, b);
    let y4 = &y2 * &y2;

    let mut psi = vec![Poly::zero(ctx); max + 1];
    let mut sq = vec![Poly::zero(ctx); max + 1];
    let mut cb = vec![Poly::zero(ctx); max + 1];

    psi[1] = Poly::one(ctx);
    let mut two = Poly::zero(ctx);
    two.addterm(ctx.fp(2), 0);
    psi[2] = two;

    // psi_3 = 3x^4 + 6ax^2 + 12bx - a^2
    psi[3] = Poly::zero(ctx);
    psi[3].addterm(-&(a * a), 0);
    psi[3].addterm(&ctx.fp(12) * b, 1);
    psi[3].addterm(&ctx.fp(6) * a, 2);
    psi[3].addterm(ctx.fp(3), 4);

    // psi_4 = 4(x^6 + 5ax^4 + 20bx^3 - 5a^2x^2 - 4abx - 8b^2 - a^3)
    psi[4] = Poly::zero(ctx);
    psi[4].addterm(
        &ctx.fp(-4) * &(&(&ctx.fp(8) * &(b * b)) + &(&(a * a) * a)),
        0,
    );
    psi[4].addterm(&ctx.fp(-16) * &(a * b), 1);
    psi[4].addterm(&ctx.fp(-20) * &(a * a), 2);
    psi[4].addterm(&ctx.fp(80) * b, 3);
    psi[4].addterm(&ctx.fp(20) * a, 4);
    psi[4].addterm(ctx.fp(4), 6);

    for k in 1..=4.min(max) {
        sq[k] = &psi[k] * &psi[k];
        cb[k] = &sq[k] * &psi[k];
    }

    let half = ctx.fp(2).inv();
    for j in 5..=max {
        if j % 2 == 1 {
            let n = (j - 1) / 2;
            psi[j] = if n % 2 == 0 {
                &(&(&psi[n + 2] * &cb[n]) * &y4) - &(&cb[n + 1] * &psi[n - 1])
            } else {
                &(&psi[n + 2] * &cb[n]) - &(&y4 * &(&cb[n + 1] * &psi[n - 1]))
            };
        } else {
            let n = j / 2;
            let inner = &(&psi[n + 2] * &sq[n - 1]) - &(&psi[n - 2] * &sq[n + 1]);
            psi[j] = (&psi[n] * &inner).mul_fp(&half);
        }
        if j <= 1 + (max + 1) / 2 {
            // squares and cubes are only consumed by later recurrences
            sq[j] = &psi[j] * &psi[j];
            cb[j] = &sq[j] * &psi[j];
        }
    }
    psi
}

pub fn curve_poly(ctx: &Rc<FpCtx>, a: &Fp, b: &Fp) -> Poly {
    let mut y2 = Poly::zero(ctx);
    y2.addterm(b.clone(), 0);
    y2.addterm(a.clone(), 1);
    y2.addterm(ctx.fp(1), 3);
    y2
}

/// Trace residues for the small moduli. Returns (modulus, tau) pairs in
/// processing order; the mod-3 residue is diagnostic only and the caller
/// leaves it out of the CRT accumulator.
pub fn small_prime_traces(
    ctx: &Rc<FpCtx>,
    a: &Fp,
    b: &Fp,
    p: &BigInt,
) -> Vec<(u32, u32)> {
    let y2 = curve_poly(ctx, a, b);
    let y4 = &y2 * &y2;
    let psi = division_polys(ctx, a, b, 11);
    let p_uint: BigUint = p.to_biguint().unwrap();
    let half_exp: BigUint = ((p - BigInt::from(1)) / BigInt::from(2)).to_biguint().unwrap();

    let mut out = Vec::new();
    for &lp in SMALL_MODULI.iter() {
        let k = (p % lp).to_u32().unwrap() as usize;

        let ring = PolyModCtx::new(psi[lp as usize].clone());
        let my2 = ring.embed(y2.clone());
        let state = CurveState {
            a: a.clone(),
            b: b.clone(),
            my2: my2.clone(),
        };

        let xx = ring.x();
        let xp = xx.pow(&p_uint);
        let yp = my2.pow(&half_exp);
        let xpp = compose(&xp, &xp);
        let ypp = &yp * &compose(&yp, &xp);

        let quarter = ctx.fp(4).inv();
        let pk = ring.embed(psi[k].clone());
        let pk1 = ring.embed(psi[k + 1].clone());
        let pkm1 = ring.embed(psi[k - 1].clone());
        let pk2 = ring.embed(psi[k + 2].clone());
        let p2k = &pk * &pk;

        // k(X,Y) from the division polynomials, Schoof Prop. 2.2, in
        // projective form with the implied-y convention.
        let (mut xt, mut yt, mut zt);
        if k % 2 == 0 {
            xt = &(&(&xx * &my2) * &p2k) - &(&pkm1 * &pk1);
            yt = (&(&(&pk2 * &pkm1) * &pkm1)
                - &(&(&ring.embed(psi[k - 2].clone()) * &pk1) * &pk1))
                .mul_fp(&quarter);
            xt = &xt * &my2;
            yt = &yt * &my2;
            zt = &my2 * &pk;
        } else {
            xt = &(&xx * &p2k) - &(&my2 * &(&pkm1 * &pk1));
            yt = if k == 1 {
                (&(&(&pk2 * &pkm1) * &pkm1) + &(&pk1 * &pk1)).mul_fp(&quarter)
            } else {
                (&(&(&pk2 * &pkm1) * &pkm1)
                    - &(&(&ring.embed(psi[k - 2].clone()) * &pk1) * &pk1))
                    .mul_fp(&quarter)
            };
            zt = pk.clone();
        }

        elliptic_add(&mut xt, &mut yt, &mut zt, &xpp, &ypp, &state);

        info!("solving NP mod {}", lp);
        if zt.is_zero() {
            // (X^{p^2}, Y^{p^2}) = -k(X, Y): trace is zero mod lp
            out.push((lp, 0));
            log_residue(p, lp, 0);
            continue;
        }

        let mut xl = xp.clone();
        let mut yl = yp.clone();
        let mut zl = ring.one();
        let zt2 = &zt * &zt;
        let mut found = false;
        for tau in 1..=lp / 2 {
            let zl2 = &zl * &zl;
            if (&(&xt * &zl2) - &(&zt2 * &xl)).is_zero() {
                let tau = if (&(&(&yt * &zl2) * &zl) - &(&(&yl * &zt) * &zt2)).is_zero() {
                    tau
                } else {
                    // matched the doubled point: opposite sign
                    lp - tau
                };
                out.push((lp, tau));
                log_residue(p, lp, tau);
                found = true;
                break;
            }
            elliptic_add(&mut xl, &mut yl, &mut zl, &xp, &yp, &state);
        }
        if !found {
            warn!("no trace residue found mod {} - dropping it", lp);
        }
    }
    out
}

fn log_residue(p: &BigInt, lp: u32, tau: u32) {
    let np = (p + 1u32 - tau).mod_floor(&BigInt::from(lp));
    if np == BigInt::from(0) {
        info!("NP mod {} = 0 ***", lp);
    } else {
        info!("NP mod {} = {}", lp, np);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fp::FpCtx;

    #[test]
    fn test_division_poly_roots_are_torsion_x() {
        // Over GF(199), y^2 = x^3 + 2x + 1 has order 211 (prime), so no
        // 3-torsion points are rational and psi_3 has no roots with a
        // rational y. Use a curve with known small torsion instead:
        // y^2 = x^3 + x over GF(23): (0,0) is 2-torsion, so psi_2's
        // convention and psi_4 = psi_2 * (...) vanish appropriately.
        let ctx = FpCtx::new(&BigInt::from(23)).unwrap();
        let a = ctx.fp(1);
        let b = ctx.fp(0);
        let psi = division_polys(&ctx, &a, &b, 9);
        // psi_3(x) at a point of order 3: 3x^4 + 6x^2 - 1 over GF(23).
        // Brute-force: for each x with rhs a QR, check whether the point
        // has order 3 iff psi_3(x) = 0.
        let curve = crate::sea::point::Curve::new(&ctx, a.clone(), b.clone());
        for xv in 0..23i64 {
            let x = ctx.fp(xv);
            if let Some(pt) = curve.from_x(&x) {
                let triple = curve.mul(&BigInt::from(3), &pt);
                let is_3_torsion = triple.is_infinity();
                let psi3_zero = psi[3].eval(&x).is_zero();
                assert_eq!(is_3_torsion, psi3_zero, "x = {}", xv);
            }
        }
    }

    #[test]
    fn test_small_traces_match_brute_force_order() {
        // GF(199), y^2 = x^3 + 2x + 1; the chi-sum gives the exact order,
        // hence the exact trace, which every residue must match.
        let p = BigInt::from(199);
        let ctx = FpCtx::new(&p).unwrap();
        let a = ctx.fp(2);
        let b = ctx.fp(1);

        let mut count = BigInt::from(1); // infinity
        for xv in 0..199i64 {
            let x = ctx.fp(xv);
            let rhs = &(&(&x * &x) * &x) + &(&(&a * &x) + &b);
            if rhs.is_zero() {
                count += 1;
            } else if rhs.jacobi() == 1 {
                count += 2;
            }
        }
        let t: BigInt = &p + 1 - &count;

        let traces = small_prime_traces(&ctx, &a, &b, &p);
        assert_eq!(traces.len(), SMALL_MODULI.len());
        for (lp, tau) in traces {
            assert_eq!(
                BigInt::from(tau),
                t.mod_floor(&BigInt::from(lp)),
                "trace mod {}",
                lp
            );
        }
    }
}
