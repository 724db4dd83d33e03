// src/mueller/mod.rs
//
// Modular-polynomial generation. For each odd prime l the coefficients
// of G_l(X, Y) fall out of power-series manipulation of the Klein
// j-invariant and the Dedekind eta function; the series work is the
// memory-dominant stage of the whole pipeline.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};
use num::{BigInt, One, Signed, Zero};
use rayon::prelude::*;

use crate::config::MuellerConfig;
use crate::core::error::{SeaError, SeaResult};
use crate::integer_math::primes::PrimeFactory;
use crate::series::modular_forms::{eta, klein_j};
use crate::series::power_series::PowerSeries;

/// One term of a raw (integer-coefficient) modular polynomial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTerm {
    pub c: BigInt,
    pub nx: u32,
    pub ny: u32,
}

/// G_l(X, Y) with integer coefficients, in emission order. The final
/// term always carries the (0, 0) power pair that terminates the
/// polynomial on disk.
#[derive(Clone, Debug)]
pub struct RawModularPoly {
    pub l: u32,
    pub terms: Vec<RawTerm>,
}

/// Smallest s with 12 | s(l-1); always one of 1, 2, 3, 6.
pub fn s_parameter(l: u32) -> u32 {
    let mut s = 1;
    while (s * (l - 1)) % 12 != 0 {
        s += 1;
    }
    s
}

/// Keep l times every l-th coefficient of z. Summing the conjugate
/// series cancels every other term, which is what makes the power sums
/// tractable.
fn phase(z: &PowerSeries, l: i64, n: i64) -> PowerSeries {
    let zf = z.first();
    let mut k = zf.div_euclid(l) * l;
    if k < zf {
        k += l;
    }
    let mut w = PowerSeries::new();
    let l_big = BigInt::from(l);
    while k < n {
        let c = z.coeff(k);
        if !c.is_zero() {
            w.addterm(&l_big * c, k);
        }
        k += l;
    }
    w
}

/// Modular polynomial for one prime l, following Mueller's construction.
pub fn mueller_pol(l: u32) -> SeaResult<RawModularPoly> {
    let s = s_parameter(l);
    let li = l as i64;
    let v = (s as i64) * (li - 1) / 12;
    let mut n = v + 2;

    // Klein j at working precision, then substitute x^l and widen.
    let klein = klein_j(n);
    n *= li;
    let klein = klein.power(li);

    // F_l(x) = (eta(x)/eta(x^l))^(2s) * x^(-v), and lhat = l^s / F_l(x^l).
    let z0 = eta(n);
    let mut y = z0.power(li);
    y.modxn(n);
    let one = PowerSeries::from_scalar(BigInt::one());
    let y = one.div(&y, n);
    let z = z0.mul(&y, n);
    let mut flt = z.pow(2 * s, n);
    flt.divxn(v);

    let w = BigInt::from(l).pow(s);
    let mut yl = flt.power(li);
    yl.modxn(n);
    let zlt = PowerSeries::from_scalar(w).div(&yl, n);

    // Power sums psi_i = phase(F_l^i, l) + lhat^i, i = 1 .. l+1.
    // f stays at full precision and is the big object here; everything
    // else lives on the compressed (multiple-of-l) support.
    let count = (l + 1) as usize;
    let mut ps: Vec<PowerSeries> = Vec::with_capacity(count + 1);
    ps.push(PowerSeries::new()); // index 0 unused
    let mut f = PowerSeries::from_scalar(BigInt::one());
    let mut zacc = PowerSeries::from_scalar(BigInt::one());
    for _ in 1..=count {
        f = f.mul(&flt, n);
        zacc = zacc.mul(&zlt, n);
        ps.push(&phase(&f, li, n) + &zacc);
    }
    drop(f);
    drop(zacc);
    drop(flt);

    // Newton's identities: c_i = -(1/i) sum_{j<=i} psi_j c_{i-j}.
    let mut c: Vec<PowerSeries> = Vec::with_capacity(count + 1);
    c.push(PowerSeries::from_scalar(BigInt::one()));
    for i in 1..=count {
        let mut acc = PowerSeries::new();
        for j in 1..=i {
            acc += &ps[j].mul(&c[i - j], n);
        }
        let acc = (-&acc).scale_div_exact(&BigInt::from(i as i64));
        c.push(acc);
    }
    drop(ps);

    // Powers of j(l*tau), the Y-side basis of the cancellation.
    let vu = v as usize;
    let mut jlt: Vec<PowerSeries> = Vec::with_capacity(vu + 1);
    jlt.push(PowerSeries::from_scalar(BigInt::one()));
    if vu >= 1 {
        jlt.push(klein.clone());
        for i in 2..=vu {
            jlt.push(jlt[i - 1].mul(&klein, n));
        }
    }

    // Express each c_i as a polynomial in j(l*tau) by cancelling the
    // leading negative exponent, emitting a term per cancellation.
    let mut terms = Vec::new();
    terms.push(RawTerm {
        c: BigInt::one(),
        nx: l + 1,
        ny: 0,
    });
    for i in 1..=count {
        let mut z = c[i].clone();
        while z.first() != 0 {
            let jpow = (-z.first() / li) as usize;
            if z.first() > 0 || jpow > vu {
                return Err(SeaError::SanityCheck(format!(
                    "stray exponent {} while reducing coefficient {} of G_{}",
                    z.first(),
                    i,
                    l
                )));
            }
            let cf = z.coeff(z.first());
            terms.push(RawTerm {
                c: cf.clone(),
                nx: l + 1 - i as u32,
                ny: jpow as u32,
            });
            z -= &jlt[jpow].scale(&cf);
        }
        let cf = z.coeff(0);
        terms.push(RawTerm {
            c: cf,
            nx: l + 1 - i as u32,
            ny: 0,
        });
        if !z.coeff(li).is_zero() {
            return Err(SeaError::SanityCheck(format!(
                "leading coefficient of G_{} failed to cancel at X^{}",
                l,
                l + 1 - i as u32
            )));
        }
    }

    Ok(RawModularPoly { l, terms })
}

/// Generate modular polynomials for every odd prime in [lo, hi] and
/// append them to the raw file. Primes whose s-parameter reaches the
/// configured skip threshold are left out, as are ranges past the sieve.
pub fn mueller_range(
    lo: u32,
    hi: u32,
    cfg: &MuellerConfig,
    out_path: &Path,
) -> SeaResult<usize> {
    if lo > hi || hi > 1000 {
        return Err(SeaError::BadParams(format!(
            "invalid mueller range [{}, {}]",
            lo, hi
        )));
    }

    let primes: Vec<u32> = PrimeFactory::odd_primes_in_range(lo, hi)
        .into_iter()
        .filter(|&p| {
            let s = s_parameter(p);
            if s >= cfg.skip {
                info!("skipping prime {} (s = {})", p, s);
                false
            } else {
                true
            }
        })
        .collect();

    if primes.is_empty() {
        warn!("no primes processed in the specified range");
        return Ok(0);
    }

    // Independent per prime; the serial emission order is restored by
    // collecting before writing.
    let results: Vec<SeaResult<RawModularPoly>> = primes
        .par_iter()
        .map(|&p| {
            let s = s_parameter(p);
            info!(
                "prime {} (s = {}), about {} bits per coefficient",
                p,
                s,
                32 * (1 + p * s / 6)
            );
            mueller_pol(p)
        })
        .collect();

    let file = OpenOptions::new().create(true).append(true).open(out_path)?;
    let mut w = BufWriter::new(file);
    let mut written = 0usize;
    for r in results {
        let poly = r?;
        write_raw_poly(&mut w, &poly)?;
        written += 1;
    }
    w.flush()?;
    info!("{} primes processed in the specified range", written);
    Ok(written)
}

pub fn write_raw_poly<W: Write>(w: &mut W, poly: &RawModularPoly) -> SeaResult<()> {
    writeln!(w, "{}", poly.l)?;
    for t in &poly.terms {
        writeln!(w, "{}", to_hex(&t.c))?;
        writeln!(w, "{}", t.nx)?;
        writeln!(w, "{}", t.ny)?;
    }
    Ok(())
}

/// Base-16 with sign, the stream's integer format.
pub fn to_hex(v: &BigInt) -> String {
    if v.is_negative() {
        format!("-{}", v.magnitude().to_str_radix(16))
    } else {
        v.magnitude().to_str_radix(16)
    }
}
