// src/sea/atkin.rs
//
// Atkin primes. Only the single-candidate subcase (r = 2 with tau = 0)
// feeds the CRT accumulator; with the wider search enabled the other
// candidate sets are derived and logged, which is the documented
// extension point for a full Atkin treatment.

use log::info;
use num::{BigInt, ToPrimitive};

use crate::integer_math::jacobi::Jacobi;
use crate::poly::poly_mod::{compose, PolyMod};

/// Multiplication in GF(lp^2) = GF(lp)[w]/(w^2 - qnr).
fn mulquad(p: u64, qnr: u64, x: u64, y: u64, a: u64, b: u64) -> (u64, u64) {
    let na = (a * x + b * y % p * qnr) % p;
    let nb = (a * y + b * x) % p;
    (na, nb)
}

fn powquad(p: u64, qnr: u64, x: u64, y: u64, e: u64) -> (u64, u64) {
    let (mut a, mut b) = (1u64, 0u64);
    let (mut x, mut y) = (x, y);
    let mut k = e;
    while k > 0 {
        if k & 1 == 1 {
            let t = mulquad(p, qnr, x, y, a, b);
            a = t.0;
            b = t.1;
        }
        k >>= 1;
        if k > 0 {
            let t = mulquad(p, qnr, x, y, x, y);
            x = t.0;
            y = t.1;
        }
    }
    (a, b)
}

/// Euler totient by trial gcd, ample for r <= lp + 1.
fn phi(n: u64) -> u64 {
    let mut r = 1;
    for i in 2..n {
        if gcd(i, n) == 1 {
            r += 1;
        }
    }
    r
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn inv_mod(a: u64, m: u64) -> u64 {
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

fn sqrt_mod_small(a: u64, p: u64) -> u64 {
    for t in 0..p {
        if t * t % p == a % p {
            return t;
        }
    }
    0
}

/// Classify an Atkin prime and extract the single-candidate constraint
/// when the splitting degree r = 2 pins tau to zero. `xp` is X^p in the
/// ring modulo G_l(x, j).
pub fn atkin_trace(
    xp: &PolyMod,
    lp: u32,
    p: &BigInt,
    process_all: bool,
) -> Option<u32> {
    if !process_all && lp > 100 {
        // large Atkin primes cost more than they constrain
        return None;
    }
    let ring = xp.ctx().clone();
    let xx = ring.x();
    let lp64 = lp as u64;
    let k = (p % lp).to_u64().unwrap() as i64;

    // Right-to-left power composition towards X^{p^r}, reusing the
    // composed squares across candidate r values.
    let mut u: Vec<PolyMod> = vec![xp.clone(), compose(xp, xp)];
    let max_r = if process_all { lp64 + 1 } else { 2 };
    let mut split_r = None;
    for r in 2..=max_r {
        if (lp64 + 1) % r != 0 {
            continue;
        }
        // Schoof Prop. 6.3 parity screen
        let v = Jacobi::symbol_i64(k, lp as i64);
        let jj = (lp64 + 1) / r;
        if jj % 2 == 0 && v == -1 {
            continue;
        }
        if jj % 2 == 1 && v == 1 {
            continue;
        }

        let mut c: Option<PolyMod> = None;
        let mut kk = r;
        let mut m = 0usize;
        loop {
            if kk % 2 != 0 {
                c = Some(match c {
                    None => u[m].clone(),
                    Some(c) => compose(&u[m], &c),
                });
            }
            kk /= 2;
            if kk == 0 {
                break;
            }
            m += 1;
            if m >= u.len() {
                let next = compose(&u[m - 1], &u[m - 1]);
                u.push(next);
            }
        }

        if (&c.unwrap() - &xx).is_zero() {
            split_r = Some(r);
            break;
        }
    }
    let r = split_r?;

    // Generator of GF(lp^2)* located by exhaustive order checks.
    let mut qnr = 2u64;
    while Jacobi::symbol_i64(qnr as i64, lp as i64) != -1 {
        qnr += 1;
    }
    let ord = lp64 * lp64 - 1;
    let gy = 1u64;
    let mut gx = 1u64;
    while gx < lp64 {
        let mut gen = true;
        for d in 2..=ord / 2 {
            if ord % d != 0 {
                continue;
            }
            if powquad(lp64, qnr, gx, gy, ord / d) == (1, 0) {
                gen = false;
                break;
            }
        }
        if gen {
            break;
        }
        gx += 1;
    }

    let mut candidates = 0u64;
    let k = k as u64;
    for m in 1..r {
        if m > 1 && gcd(m, r) != 1 {
            continue;
        }
        let (a, _b) = powquad(lp64, qnr, gx, gy, m * ord / r);
        let tau = (a + 1) % lp64 * k % lp64 * inv_mod(2, lp64) % lp64;
        if tau == 0 {
            // r must be 2: a unique trace residue, usable like Elkies
            info!("Atkin prime {} pins NP mod {} uniquely", lp, lp);
            return Some(0);
        } else if Jacobi::symbol_i64(tau as i64, lp as i64) == 1 {
            candidates += 2;
            let root = sqrt_mod_small(tau, lp64);
            let tau = 2 * root % lp64;
            info!(
                "Atkin prime {}: candidate traces +-{} (NP mod {} ambiguous)",
                lp, tau, lp
            );
            if candidates == phi(r) {
                break;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_field_arithmetic() {
        // GF(7^2) with w^2 = 3 (3 is a non-residue mod 7)
        assert_eq!(Jacobi::symbol_i64(3, 7), -1);
        // (1 + w)^2 = 1 + 3 + 2w = 4 + 2w
        assert_eq!(mulquad(7, 3, 1, 1, 1, 1), (4, 2));
        // multiplicative order of the full group is 48
        let (a, b) = powquad(7, 3, 1, 1, 48);
        assert_eq!((a, b), (1, 0));
    }

    #[test]
    fn test_phi() {
        assert_eq!(phi(2), 1);
        assert_eq!(phi(6), 2);
        assert_eq!(phi(10), 4);
    }
}
