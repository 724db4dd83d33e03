// src/sea/elkies.rs
//
// Elkies primes: from a root g of G_l(X, j) recover the isogenous curve
// (Mueller's procedure), build the degree-(l-1)/2 factor of the division
// polynomial, and search for the eigenvalue lambda of Frobenius on the
// kernel, comparing y-coordinates only.

use std::rc::Rc;

use log::{info, warn};
use num::{BigInt, BigUint, ToPrimitive};

use crate::field::fp::{Fp, FpCtx};
use crate::integer_math::jacobi::Jacobi;
use crate::poly::poly::Poly;
use crate::poly::poly_mod::{PolyMod, PolyModCtx};
use crate::poly::poly_xy::PolyXY;
use crate::sea::schoof::curve_poly;

/// Base-curve invariants shared across the per-prime work.
pub struct CurveInvariants {
    pub a: Fp,
    pub b: Fp,
    pub j: Fp,
    pub e4b: Fp,   // -A/3
    pub e6b: Fp,   // -B/2
    pub delta: Fp, // (E4^3 - E6^2)/1728
}

impl CurveInvariants {
    pub fn new(ctx: &Rc<FpCtx>, a: &Fp, b: &Fp, j: &Fp) -> CurveInvariants {
        let e4b = -&(a / &ctx.fp(3));
        let e6b = -&(b / &ctx.fp(2));
        let delta = &(&(&(&e4b * &e4b) * &e4b) - &(&e6b * &e6b)) / &ctx.fp(1728);
        CurveInvariants {
            a: a.clone(),
            b: b.clone(),
            j: j.clone(),
            e4b,
            e6b,
            delta,
        }
    }
}

/// Coefficients c_k of Mueller's lemma 6.2 for a curve (a, b); index 0
/// is unused.
pub fn get_ck(ctx: &Rc<FpCtx>, terms: usize, a: &Fp, b: &Fp) -> Vec<Fp> {
    let mut c = vec![ctx.fp(0); terms + 1];
    if terms == 0 {
        return c;
    }
    c[1] = -&(a / &ctx.fp(5));
    if terms == 1 {
        return c;
    }
    c[2] = -&(b / &ctx.fp(7));
    for k in 3..=terms {
        let mut acc = ctx.fp(0);
        for h in 1..=k - 2 {
            acc = &acc + &(&c[h] * &c[k - 1 - h]);
        }
        let scale = &ctx.fp(3) / &ctx.fp(((k - 2) * (2 * k + 3)) as i64);
        c[k] = &acc * &scale;
    }
    c
}

/// Isogenous-curve parameters (a~, b~, p1) from the bivariate partials
/// of G_l at (g, j). None when a degenerate denominator turns up, which
/// the caller treats as a skipped prime.
#[allow(clippy::too_many_arguments)]
fn isogenous_params(
    ctx: &Rc<FpCtx>,
    inv: &CurveInvariants,
    mp: &PolyXY,
    g: &Fp,
    lp: u32,
    s: u32,
) -> Option<(Fp, Fp, Fp)> {
    let j = &inv.j;
    let el = ctx.fp(lp as i64);
    let s_fp = ctx.fp(s as i64);

    let dgx = mp.diff_dx();
    let dgy = mp.diff_dy();
    let dgxx = dgx.diff_dx();
    let dgxy = dgy.diff_dx();
    let dgyy = dgy.diff_dy();

    let eg = dgx.eval(g, j);
    let ej = dgy.eval(g, j);
    let exy = dgxy.eval(g, j);

    let dg = g * &eg;
    let dj = j * &ej;

    let el12 = el.pow(&BigUint::from(12u32));
    let deltal = &(&inv.delta * &g.pow(&BigUint::from(12 / s))) / &el12;

    let el2 = &el * &el;
    let el4 = &el2 * &el2;
    let el6 = &el4 * &el2;

    if dj.is_zero() {
        let e4bl = &inv.e4b / &el2;
        let atilde = &(&-&ctx.fp(3) * &el4) * &e4bl;
        let jl = &(&(&e4bl * &e4bl) * &e4bl) / &deltal;
        let root = (&(&jl - &ctx.fp(1728)) * &deltal).sqrt()?;
        let btilde = &(&ctx.fp(2) * &el6) * &root;
        let p1 = ctx.fp(0);
        return Some((atilde, btilde, p1));
    }

    let twelve = ctx.fp(12);
    let e2bs = &(&(&-&twelve * &inv.e6b) * &dj) / &(&(&s_fp * &inv.e4b) * &dg);

    let gd = &(&(&-&s_fp / &twelve) * &e2bs) * g;
    let jd = &(&(&-&inv.e4b * &inv.e4b) * &inv.e6b) / &inv.delta;
    let e0b = &inv.e6b / &(&inv.e4b * &e2bs);

    let dgd = &(&gd * &eg) + &(g * &(&(&gd * &dgxx.eval(g, j)) + &(&jd * &exy)));
    let djd = &(&jd * &ej) + &(j * &(&(&jd * &dgyy.eval(g, j)) + &(&gd * &exy)));

    let e0bd = &(&(&(&-&s_fp * &dgd) / &twelve) - &(&e0b * &djd)) / &dj;

    let e4b = &inv.e4b;
    let e6b = &inv.e6b;
    let mid = &(&(&(&twelve * &e0bd) / &e0b) + &(&(&ctx.fp(6) * &(e4b * e4b)) / e6b))
        - &(&(&ctx.fp(4) * e6b) / e4b);
    let e4bl = &(&(e4b - &(&e2bs * &mid)) + &(&e2bs * &e2bs)) / &el2;

    let jl = &(&(&e4bl * &e4bl) * &e4bl) / &deltal;
    if jl.is_zero() {
        return None;
    }
    let f = &el.pow(&BigUint::from(s)) / g;
    let fd = &(&(&s_fp * &e2bs) * &f) / &twelve;

    let dgs = dgx.eval(&f, &jl);
    let djs = dgy.eval(&f, &jl);
    if djs.is_zero() {
        return None;
    }

    let jld = &(&-&fd * &dgs) / &(&el * &djs);
    let e6bl = &(&-&e4bl * &jld) / &jl;

    let atilde = &(&-&ctx.fp(3) * &el4) * &e4bl;
    let btilde = &(&-&ctx.fp(2) * &el6) * &e6bl;
    let p1 = &(&-&el * &e2bs) / &ctx.fp(2);
    Some((atilde, btilde, p1))
}

/// The degree-(l-1)/2 factor F_l of the division polynomial, built from
/// the c_k of both curves with the substitution x = z^2 understood.
fn kernel_factor(
    ctx: &Rc<FpCtx>,
    inv: &CurveInvariants,
    atilde: &Fp,
    btilde: &Fp,
    p1: &Fp,
    lp: u32,
) -> Poly {
    let ld = ((lp - 1) / 2) as usize;
    let ld1 = ((lp - 3) / 2) as usize;

    let cf = get_ck(ctx, ld1, &inv.a, &inv.b);
    let cft = get_ck(ctx, ld1, atilde, btilde);

    // W_1 = 1 + sum c_k x^{k+1}; W_v = W_{v-1} * W_1 truncated, with an
    // understood multiplier x^{-v} on each.
    let mut wp: Vec<Poly> = Vec::with_capacity(ld + 1);
    wp.push(Poly::one(ctx)); // index 0 placeholder
    let mut w1 = Poly::one(ctx);
    for k in (1..=ld1).rev() {
        w1.addterm(cf[k].clone(), k + 1);
    }
    wp.push(w1.clone());
    for v in 2..=ld {
        let next = (&wp[v - 1] * &w1).modxn(ld + 1);
        wp.push(next);
    }

    // The integrand: lp*c_k - c~_k over (2k+1)(2k+2), plus the -p1 term.
    let lp_fp = ctx.fp(lp as i64);
    let mut y = Poly::zero(ctx);
    for k in (1..=ld1).rev() {
        let num = &(&lp_fp * &cf[k]) - &cft[k];
        let den = ctx.fp(((2 * k + 1) * (2 * k + 2)) as i64);
        y.addterm(&num / &den, k + 1);
    }
    y.addterm(-p1, 1);

    // H = sum_r (Y^r / r!), truncated; understood multiplier x^{-d}.
    let mut rf = ctx.fp(1);
    let mut h = Poly::one(ctx);
    let mut x = Poly::one(ctx);
    for r in 1..=ld {
        x = (&x * &y).modxn(ld + 1);
        rf = &rf * &ctx.fp(r as i64);
        h = &h + &x.mul_fp(&rf.inv());
    }

    // Express H in the W basis, leading coefficient first.
    let mut ad = ctx.fp(1);
    let mut fl = Poly::zero(ctx);
    fl.addterm(ad.clone(), ld);
    for v in (0..ld).rev() {
        h = &h - &wp[v + 1].mul_fp(&ad);
        h = h.divxn(1);
        ad = h.const_coeff();
        fl.addterm(ad.clone(), v);
    }
    fl
}

fn inv_mod_u64(a: u64, m: u64) -> u64 {
    // m is prime here; Fermat inverse keeps it branch-free
    let mut r = 1u64;
    let mut base = a % m;
    let mut e = m - 2;
    while e > 0 {
        if e & 1 == 1 {
            r = r * base % m;
        }
        base = base * base % m;
        e >>= 1;
    }
    r
}

/// Full Elkies treatment of one prime. Returns tau = t mod lp, or None
/// when the prime has to be skipped.
pub fn elkies_trace(
    ctx: &Rc<FpCtx>,
    inv: &CurveInvariants,
    mp: &PolyXY,
    g: &Fp,
    lp: u32,
    s: u32,
    discrim: i32,
    p: &BigInt,
) -> Option<u32> {
    let (atilde, btilde, p1) = match isogenous_params(ctx, inv, mp, g, lp, s) {
        Some(t) => t,
        None => {
            warn!("degenerate isogeny chain for prime {} - skipping", lp);
            return None;
        }
    };

    let fl = kernel_factor(ctx, inv, &atilde, &btilde, &p1, lp);
    if fl.degree() != ((lp - 1) / 2) as usize {
        warn!("kernel factor degenerated for prime {} - skipping", lp);
        return None;
    }

    let ring = PolyModCtx::new(fl);
    let y2 = curve_poly(ctx, &inv.a, &inv.b);
    let my2 = ring.embed(y2);
    let my4 = &my2 * &my2;

    // Only the y-coordinate of Frobenius is needed.
    let half_exp: BigUint = ((p - BigInt::from(1)) / BigInt::from(2)).to_biguint().unwrap();
    let yp = my2.pow(&half_exp);

    // Division polynomials modulo F_l, extended on demand.
    let ld = ((lp - 1) / 2) as usize;
    let cap = ld + 3;
    let mut pf: Vec<PolyMod> = vec![ring.zero(); cap.max(5)];
    let mut p2f: Vec<PolyMod> = vec![ring.zero(); cap.max(5)];
    let mut p3f: Vec<PolyMod> = vec![ring.zero(); cap.max(5)];
    pf[1] = ring.one();
    pf[2] = ring.one().mul_small(2);
    let psi = crate::sea::schoof::division_polys(ctx, &inv.a, &inv.b, 4);
    pf[3] = ring.embed(psi[3].clone());
    pf[4] = ring.embed(psi[4].clone());
    p2f[1] = ring.one();
    p3f[1] = ring.one();
    for k in 2..=4.min(cap - 1) {
        p2f[k] = &pf[k] * &pf[k];
        p3f[k] = &p2f[k] * &pf[k];
    }
    let mut lower = 5usize;

    let lp64 = lp as u64;
    let p_mod_lp = (p % lp).to_u64().unwrap();
    let quarter = ctx.fp(4).inv();
    let half = ctx.fp(2).inv();

    info!("solving NP mod {} (Elkies)", lp);
    for lambda in 1..=(lp64 - 1) / 2 {
        let tau = ((lambda + inv_mod_u64(lambda, lp64) * p_mod_lp) % lp64) as u32;
        let k = ((lp64 + (tau as u64) * (tau as u64) - (4 * p_mod_lp) % lp64) % lp64) as i64;
        if Jacobi::symbol_i64(k, lp64 as i64) != discrim {
            continue;
        }

        // Extend the division-polynomial ladder to lambda + 2.
        let need = (lambda + 2) as usize;
        for jj in lower..=need {
            if jj % 2 == 1 {
                let n = (jj - 1) / 2;
                pf[jj] = if n % 2 == 0 {
                    &(&(&pf[n + 2] * &p3f[n]) * &my4) - &(&p3f[n + 1] * &pf[n - 1])
                } else {
                    &(&pf[n + 2] * &p3f[n]) - &(&my4 * &(&p3f[n + 1] * &pf[n - 1]))
                };
            } else {
                let n = jj / 2;
                pf[jj] = (&pf[n]
                    * &(&(&pf[n + 2] * &p2f[n - 1]) - &(&pf[n - 2] * &p2f[n + 1])))
                    .mul_fp(&half);
            }
            p2f[jj] = &pf[jj] * &pf[jj];
            p3f[jj] = &p2f[jj] * &pf[jj];
        }
        if need + 1 > lower {
            lower = need + 1;
        }

        let lam = lambda as usize;
        let (ry, ty);
        if lambda % 2 == 0 {
            ry = (&(&pf[lam + 2] * &p2f[lam - 1]) - &(&pf[lam - 2] * &p2f[lam + 1]))
                .mul_fp(&quarter);
            ty = &(&my4 * &yp) * &p3f[lam];
        } else {
            ry = if lambda == 1 {
                (&(&pf[lam + 2] * &p2f[lam - 1]) + &p2f[lam + 1]).mul_fp(&quarter)
            } else {
                (&(&pf[lam + 2] * &p2f[lam - 1]) - &(&pf[lam - 2] * &p2f[lam + 1]))
                    .mul_fp(&quarter)
            };
            ty = &yp * &p3f[lam];
        }

        let res = if (&ty - &ry).is_zero() {
            1
        } else if (&ty + &ry).is_zero() {
            2
        } else {
            0
        };
        if res != 0 {
            let tau = if res == 2 { (lp - tau) % lp } else { tau };
            return Some(tau);
        }
    }
    warn!("no eigenvalue found for Elkies prime {} - skipping", lp);
    None
}
