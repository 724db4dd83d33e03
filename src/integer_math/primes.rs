// src/integer_math/primes.rs

use lazy_static::lazy_static;
use num::{BigInt, Integer, One, Zero};

/// Upper bound of the shared small-prime table. The kangaroo
/// factor-stripping and the Mueller range both stay below it.
pub const SIEVE_BOUND: u32 = 10_000;

lazy_static! {
    static ref SMALL_PRIMES: Vec<u32> = sieve_to(SIEVE_BOUND);
}

fn sieve_to(bound: u32) -> Vec<u32> {
    let bound = bound as usize;
    let mut composite = vec![false; bound + 1];
    let mut primes = Vec::new();
    for n in 2..=bound {
        if !composite[n] {
            primes.push(n as u32);
            let mut m = n * n;
            while m <= bound {
                composite[m] = true;
                m += n;
            }
        }
    }
    primes
}

pub struct PrimeFactory;

impl PrimeFactory {
    /// All primes below 10 000, smallest first.
    pub fn small_primes() -> &'static [u32] {
        &SMALL_PRIMES
    }

    /// Odd primes in [lo, hi].
    pub fn odd_primes_in_range(lo: u32, hi: u32) -> Vec<u32> {
        SMALL_PRIMES
            .iter()
            .copied()
            .filter(|&p| p > 2 && p >= lo && p <= hi)
            .collect()
    }

    /// Miller-Rabin with the first 40 sieve primes as witnesses, the
    /// strength required of field moduli.
    pub fn is_probable_prime(input: &BigInt) -> bool {
        if input < &BigInt::from(2) {
            return false;
        }
        for &w in &SMALL_PRIMES[..40] {
            let w = BigInt::from(w);
            if input == &w {
                return true;
            }
            if (input % &w).is_zero() {
                return false;
            }
        }

        let mut d: BigInt = input - 1;
        let mut s = 0u32;
        while d.is_even() {
            d /= 2;
            s += 1;
        }

        let input_minus_1: BigInt = input - 1;
        'witness: for &w in &SMALL_PRIMES[..40] {
            let mut x = BigInt::from(w).modpow(&d, input);
            if x.is_one() || x == input_minus_1 {
                continue;
            }
            for _ in 1..s {
                x = x.modpow(&BigInt::from(2), input);
                if x == input_minus_1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }

    pub fn next_prime(from: &BigInt) -> BigInt {
        let mut n: BigInt = from + 1;
        if n.is_even() {
            if n == BigInt::from(2) {
                return n;
            }
            n += 1;
        }
        while !Self::is_probable_prime(&n) {
            n += 2;
        }
        n
    }

    pub fn prev_prime(from: &BigInt) -> BigInt {
        let mut n: BigInt = from - 1;
        if n.is_even() {
            n -= 1;
        }
        while n > BigInt::from(1) && !Self::is_probable_prime(&n) {
            n -= 2;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sieve_endpoints() {
        let primes = PrimeFactory::small_primes();
        assert_eq!(primes[0], 2);
        assert_eq!(primes[1], 3);
        assert_eq!(*primes.last().unwrap(), 9973);
        assert_eq!(primes.len(), 1229);
    }

    #[test]
    fn test_is_probable_prime() {
        assert!(PrimeFactory::is_probable_prime(&BigInt::from(2)));
        assert!(PrimeFactory::is_probable_prime(&BigInt::from(2147483647i64)));
        assert!(PrimeFactory::is_probable_prime(
            &BigInt::from(2305843009213693951i64) // 2^61 - 1
        ));
        assert!(!PrimeFactory::is_probable_prime(&BigInt::from(1)));
        assert!(!PrimeFactory::is_probable_prime(&BigInt::from(3215031751i64)));
        // Carmichael number
        assert!(!PrimeFactory::is_probable_prime(&BigInt::from(561)));
    }

    #[test]
    fn test_next_prev_prime() {
        assert_eq!(PrimeFactory::next_prime(&BigInt::from(89)), BigInt::from(97));
        assert_eq!(PrimeFactory::prev_prime(&BigInt::from(97)), BigInt::from(89));
        let p256 = BigInt::from(2).pow(256);
        let q = PrimeFactory::next_prime(&p256);
        assert!(PrimeFactory::is_probable_prime(&q));
        assert!(q > p256);
    }
}
