// src/integer_math/gcd.rs

use num::{BigInt, Integer, One, Signed, Zero};

pub struct GCD;

impl GCD {
    pub fn find_lcm(numbers: &[BigInt]) -> BigInt {
        numbers.iter().fold(BigInt::one(), |acc, x| Self::find_lcm_pair(&acc, x))
    }

    pub fn find_lcm_pair(left: &BigInt, right: &BigInt) -> BigInt {
        let a = left.abs();
        let b = right.abs();
        &(&a * &b) / Self::find_gcd_pair(&a, &b)
    }

    pub fn find_gcd(numbers: &[BigInt]) -> BigInt {
        numbers.iter().fold(BigInt::zero(), |acc, x| Self::find_gcd_pair(&acc, x))
    }

    pub fn find_gcd_pair(left: &BigInt, right: &BigInt) -> BigInt {
        left.gcd(right)
    }

    pub fn are_coprime(numbers: &[BigInt]) -> bool {
        Self::find_gcd(numbers).is_one()
    }

    /// Extended Euclid: returns (g, x, y) with a*x + b*y = g = gcd(a, b).
    pub fn extended(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
        let (mut old_r, mut r) = (a.clone(), b.clone());
        let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
        let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

        while !r.is_zero() {
            let q = &old_r / &r;
            let tmp = &old_r - &q * &r;
            old_r = std::mem::replace(&mut r, tmp);
            let tmp = &old_s - &q * &s;
            old_s = std::mem::replace(&mut s, tmp);
            let tmp = &old_t - &q * &t;
            old_t = std::mem::replace(&mut t, tmp);
        }
        (old_r, old_s, old_t)
    }

    /// Inverse of a modulo m, when gcd(a, m) = 1.
    pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
        let (g, x, _) = Self::extended(&a.mod_floor(m), m);
        if !g.is_one() {
            return None;
        }
        Some(x.mod_floor(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_bezout() {
        let a = BigInt::from(240);
        let b = BigInt::from(46);
        let (g, x, y) = GCD::extended(&a, &b);
        assert_eq!(g, BigInt::from(2));
        assert_eq!(&a * &x + &b * &y, g);
    }

    #[test]
    fn test_mod_inverse() {
        let a = BigInt::from(3);
        let m = BigInt::from(2017);
        let inv = GCD::mod_inverse(&a, &m).unwrap();
        assert_eq!((&a * &inv).mod_floor(&m), BigInt::from(1));
        assert!(GCD::mod_inverse(&BigInt::from(6), &BigInt::from(9)).is_none());
    }
}
