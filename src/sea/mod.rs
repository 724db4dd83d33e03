// src/sea/mod.rs
//
// The point-counting stage: classify each small prime from the reduced
// modular-polynomial file as Elkies or Atkin, collect trace residues
// until the CRT product clears the kangaroo threshold, and let the herd
// finish the job.

pub mod atkin;
pub mod curve;
pub mod elkies;
pub mod kangaroo;
pub mod point;
pub mod schoof;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};
use num::integer::Roots;
use num::{BigInt, Integer, One, Zero};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::config::SeaConfig;
use crate::core::error::{SeaError, SeaResult};
use crate::field::fp::FpCtx;
use crate::integer_math::modular::chinese_remainder;
use crate::mueller::{s_parameter, to_hex};
use crate::poly::poly_mod::PolyModCtx;
use crate::poly::poly_xy::PolyXY;
use crate::process::TokenStream;
use crate::sea::elkies::CurveInvariants;
use crate::sea::point::{Curve, EcPoint};
use crate::sea::schoof::{curve_poly, small_prime_traces, SCHOOF_LIMIT};

/// Result of a completed count.
#[derive(Debug, Clone)]
pub struct SeaOutcome {
    pub p: BigInt,
    pub a: BigInt,
    pub b: BigInt,
    pub order: BigInt,
    /// A random point of the curve, useful when the order is prime.
    pub point: (BigInt, BigInt),
}

/// Count points on y^2 = x^3 + ax + b over the prime recorded in the
/// reduced modular-polynomial file.
pub fn count_points(
    a_in: &BigInt,
    b_in: &BigInt,
    reduced: &Path,
    outfile: Option<&Path>,
    cfg: &SeaConfig,
) -> SeaResult<SeaOutcome> {
    let mut toks = TokenStream::open(reduced)?;
    let p = toks.next_bigint()?;
    let pbits = p.bits();
    info!("P = {:x}", p);
    info!("P mod 24 = {}", &p % 24);
    info!("P is {} bits long", pbits);

    let ctx = FpCtx::new(&p)?;

    // Pre-processed bivariate modular polynomials, in file order.
    let mut polys: Vec<(u32, PolyXY)> = Vec::new();
    while let Some(l) = toks.try_next_u32()? {
        let mut gl = PolyXY::new(&ctx);
        loop {
            let c = toks.next_bigint()?;
            let nx = toks.next_u32()?;
            let ny = toks.next_u32()?;
            gl.addterm(ctx.fp_from(&c), nx, ny);
            if nx == 0 && ny == 0 {
                break;
            }
        }
        if let Some((prev, _)) = polys.last() {
            if l <= *prev {
                return Err(SeaError::BadModularPolyFile(format!(
                    "primes out of order: {} after {}",
                    l, prev
                )));
            }
        }
        polys.push((l, gl));
    }

    let a = ctx.fp_from(a_in);
    let b = ctx.fp_from(b_in);

    // Curve sanity: discriminant and j-invariant restrictions.
    let a3 = &(&a * &a) * &a;
    let b2 = &b * &b;
    let delta = &ctx.fp(-16) * &(&(&ctx.fp(4) * &a3) + &(&ctx.fp(27) * &b2));
    if delta.is_zero() {
        return Err(SeaError::BadParams(
            "singular curve: 4A^3 + 27B^2 = 0".into(),
        ));
    }
    let j = &(&ctx.fp(-1728 * 64) * &a3) / &delta;
    if j.is_zero() || j == ctx.fp(1728) {
        return Err(SeaError::BadParams(
            "j-invariant 0 or 1728 is not allowed".into(),
        ));
    }

    let y2 = curve_poly(&ctx, &a, &b);
    info!("counting the number of points (NP) on the curve");
    info!("y^2 = x^3 + {}x + {} mod {}", a, b, p);

    // NP mod 2: the trace is odd exactly when x^3 + ax + b has no root,
    // i.e. gcd(X^p - X, Y2) = 1.
    let p_uint = p.to_biguint().unwrap();
    {
        let ring = PolyModCtx::new(y2.clone());
        let xx = ring.x();
        let xp = xx.pow(&p_uint);
        let g = (&xp - &xx).gcd_with_modulus();
        let parity = if g.is_one() { 1 } else { 0 };
        info!("NP mod 2 = {}", (&p + BigInt::from(1) - BigInt::from(parity)).mod_floor(&BigInt::from(2)));
    }

    // Schoof's original method for the small moduli; 3 stays diagnostic.
    let mut crt: Vec<(BigInt, BigInt)> = Vec::new();
    let mut accum = BigInt::one();
    for (lp, tau) in small_prime_traces(&ctx, &a, &b, &p) {
        if lp >= 5 {
            crt.push((BigInt::from(lp), BigInt::from(tau)));
            accum *= lp;
        }
    }

    // How far the precomputed constraints must reach before the
    // kangaroos can take over.
    let kangaroo_work = if pbits <= 256 { 64u32 } else { 72 };
    let threshold = (&p >> kangaroo_work).sqrt();

    let invariants = CurveInvariants::new(&ctx, &a, &b, &j);
    let mut file_polys = polys.iter();
    while accum <= threshold {
        let (lp, gl) = match file_polys.next() {
            Some(entry) => (entry.0, &entry.1),
            None => {
                warn!("ran out of modular polynomials");
                if cfg.sea.require_full_coverage {
                    return Err(SeaError::InsufficientModularPolys);
                }
                break;
            }
        };
        if lp <= SCHOOF_LIMIT {
            continue;
        }

        let f = gl.eval_y(&j);
        if f.degree() != (lp + 1) as usize {
            warn!("modular polynomial for {} degenerates at this j - skipping", lp);
            continue;
        }
        let ring = PolyModCtx::new(f);
        let xx = ring.x();
        let xp = xx.pow(&p_uint);
        let g = (&xp - &xx).gcd_with_modulus();

        let tau = match g.degree() {
            0 if g.is_one() => {
                // Atkin prime: the kernel polynomial has no rational root
                atkin::atkin_trace(&xp, lp, &p, cfg.sea.process_atkin)
            }
            1 => {
                let root = -&g.coeff(0);
                elkies::elkies_trace(
                    &ctx,
                    &invariants,
                    gl,
                    &root,
                    lp,
                    s_parameter(lp),
                    0,
                    &p,
                )
            }
            2 => {
                let qb = g.coeff(1);
                let qc = g.coeff(0);
                let disc = &(&qb * &qb) - &(&ctx.fp(4) * &qc);
                match disc.sqrt() {
                    Some(rt) => {
                        let root = &(&-&qb - &rt) / &ctx.fp(2);
                        elkies::elkies_trace(
                            &ctx,
                            &invariants,
                            gl,
                            &root,
                            lp,
                            s_parameter(lp),
                            1,
                            &p,
                        )
                    }
                    None => {
                        warn!("kernel quadratic for {} has no root - skipping", lp);
                        None
                    }
                }
            }
            d if d == (lp + 1) as usize => {
                // every root rational: pathological, no constraint
                continue;
            }
            _ => {
                warn!("unexpected splitting degree {} for prime {}", g.degree(), lp);
                continue;
            }
        };

        if let Some(tau) = tau {
            log_residue(&p, lp, tau);
            crt.push((BigInt::from(lp), BigInt::from(tau)));
            accum *= lp;
        }
    }

    // Trace residue, then the order residue the kangaroos search around.
    let t_partial = chinese_remainder(&crt);
    let order_residue = (&p + BigInt::from(1) - t_partial).mod_floor(&accum);

    let curve = Curve::new(&ctx, a.clone(), b.clone());
    let nrp = kangaroo::kangaroo(&curve, &order_residue, &accum, &cfg.kangaroo)?;

    // A point to ship with the order; of prime order when NP is prime.
    let mut rng = match cfg.kangaroo.seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s.wrapping_add(1)),
        None => ChaCha20Rng::from_entropy(),
    };
    let pt = random_output_point(&curve, &mut rng);
    let (px, py) = match (pt.x(), pt.y()) {
        (Some(x), Some(y)) => (x.to_bigint(), y.to_bigint()),
        _ => (BigInt::zero(), BigInt::zero()),
    };

    if let Some(path) = outfile {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "{}", pbits)?;
        writeln!(w, "{}", to_hex(&p))?;
        writeln!(w, "{}", to_hex(a_in))?;
        writeln!(w, "{}", to_hex(b_in))?;
        writeln!(w, "{}", to_hex(&nrp))?;
        writeln!(w, "{}", to_hex(&px))?;
        writeln!(w, "{}", to_hex(&py))?;
        w.flush()?;
    }

    if p == nrp {
        warn!("curve is anomalous");
    } else {
        // MOV condition for curves of cryptographic interest
        let mut d = BigInt::one();
        for _ in 0..50 {
            d = (&d * &p).mod_floor(&nrp);
            if d.is_one() {
                warn!("curve fails the MOV condition");
                break;
            }
        }
    }

    Ok(SeaOutcome {
        p,
        a: a_in.clone(),
        b: b_in.clone(),
        order: nrp,
        point: (px, py),
    })
}

fn log_residue(p: &BigInt, lp: u32, tau: u32) {
    let np = (p + 1u32 - tau).mod_floor(&BigInt::from(lp));
    if np.is_zero() {
        info!("NP mod {} = 0 ***", lp);
    } else {
        info!("NP mod {} = {}", lp, np);
    }
}

fn random_output_point(curve: &Curve, rng: &mut ChaCha20Rng) -> EcPoint {
    use num::bigint::RandBigInt;
    let ctx = curve.ctx().clone();
    loop {
        let x = rng.gen_biguint_below(ctx.prime());
        if let Some(pt) = curve.from_x(&ctx.fp_from_uint(&x)) {
            return pt;
        }
    }
}
