// src/integer_math/modular.rs

use num::{BigInt, Integer, One, ToPrimitive, Zero};

use crate::integer_math::gcd::GCD;
use crate::integer_math::jacobi::Jacobi;

/// Square root of a modulo an odd prime p, if one exists.
/// p = 3 mod 4 is a single exponentiation; otherwise Tonelli-Shanks.
pub fn sqrt_mod(a: &BigInt, p: &BigInt) -> Option<BigInt> {
    let a = a.mod_floor(p);
    if a.is_zero() {
        return Some(BigInt::zero());
    }
    if Jacobi::symbol(&a, p) != 1 {
        return None;
    }

    if (p % 4u32).to_u32().unwrap() == 3 {
        let r = a.modpow(&((p + 1) / 4), p);
        return Some(r);
    }

    // Tonelli-Shanks: p - 1 = q * 2^s with q odd.
    let mut q: BigInt = p - 1;
    let mut s = 0u32;
    while q.is_even() {
        q /= 2;
        s += 1;
    }

    // Any quadratic non-residue serves as the generator seed.
    let mut z = BigInt::from(2);
    while Jacobi::symbol(&z, p) != -1 {
        z += 1;
    }

    let mut m = s;
    let mut c = z.modpow(&q, p);
    let mut t = a.modpow(&q, p);
    let mut r = a.modpow(&((&q + 1) / 2), p);

    while !t.is_one() {
        let mut i = 0u32;
        let mut t2 = t.clone();
        while !t2.is_one() {
            t2 = (&t2 * &t2).mod_floor(p);
            i += 1;
        }
        let b = c.modpow(&BigInt::from(2).pow(m - i - 1), p);
        m = i;
        c = (&b * &b).mod_floor(p);
        t = (&t * &c).mod_floor(p);
        r = (&r * &b).mod_floor(p);
    }
    Some(r)
}

/// Chinese remainder for pairwise coprime moduli: the unique residue
/// modulo the product that matches every (modulus, residue) pair.
pub fn chinese_remainder(congruences: &[(BigInt, BigInt)]) -> BigInt {
    let product: BigInt = congruences.iter().map(|(m, _)| m).product();
    let mut z = BigInt::zero();
    for (m, r) in congruences {
        let pj = &product / m;
        let aj = GCD::mod_inverse(&pj, m).expect("moduli must be pairwise coprime");
        z += r * aj * pj;
    }
    z.mod_floor(&product)
}
