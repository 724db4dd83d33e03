// src/integer_math/jacobi.rs

use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};

pub struct Jacobi;

impl Jacobi {
    /// Jacobi symbol (a | n) for odd n > 0. Returns 1, -1, or 0.
    pub fn symbol(a: &BigInt, n: &BigInt) -> i32 {
        if !n.is_positive() || n.is_even() {
            panic!("Jacobi symbol requires an odd positive modulus, got {}", n);
        }

        let mut a = a.mod_floor(n);
        let mut n = n.clone();
        let mut result = 1i32;

        while !a.is_zero() {
            while a.is_even() {
                a /= 2;
                let r = (&n % 8u32).to_u32().unwrap();
                if r == 3 || r == 5 {
                    result = -result;
                }
            }
            std::mem::swap(&mut a, &mut n);
            if (&a % 4u32).to_u32().unwrap() == 3 && (&n % 4u32).to_u32().unwrap() == 3 {
                result = -result;
            }
            a = a.mod_floor(&n);
        }

        if n.is_one() {
            result
        } else {
            0
        }
    }

    /// Jacobi symbol for small operands.
    pub fn symbol_i64(a: i64, n: i64) -> i32 {
        Self::symbol(&BigInt::from(a), &BigInt::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_against_euler_criterion() {
        // Odd primes: (a|p) must match a^((p-1)/2) mod p.
        for &p in &[3i64, 7, 11, 13, 101, 997] {
            for a in 0..p {
                let euler = BigInt::from(a).modpow(&BigInt::from((p - 1) / 2), &BigInt::from(p));
                let expect = if euler.is_zero() {
                    0
                } else if euler.is_one() {
                    1
                } else {
                    -1
                };
                assert_eq!(Jacobi::symbol_i64(a, p), expect, "a={} p={}", a, p);
            }
        }
    }

    #[test]
    fn test_symbol_composite_modulus() {
        // (2|15) = (2|3)(2|5) = (-1)(-1) = 1
        assert_eq!(Jacobi::symbol_i64(2, 15), 1);
        assert_eq!(Jacobi::symbol_i64(3, 15), 0);
    }
}
