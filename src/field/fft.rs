// src/field/fft.rs

use num::{BigUint, ToPrimitive, Zero};

/// log2 of the largest supported transform length.
const MAX_LOG: u32 = 27;

/// An NTT word prime q = c * 2^MAX_LOG + 1 together with an element of
/// multiplicative order 2^MAX_LOG.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FftPrime {
    pub q: u64,
    pub root: u64,
}

/// Convolution plan for one field context: enough word primes that their
/// product dominates every coefficient of an Fp convolution, i.e.
/// 2*bits(p) + MAX_LOG + 1 bits. Built once per context and owned by it.
pub(crate) struct FftPlan {
    primes: Vec<FftPrime>,
    // inv_prod[i] = (q_0 * ... * q_{i-1})^{-1} mod q_i, for Garner lifting
    inv_prod: Vec<u64>,
}

fn mulmod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

fn powmod(mut a: u64, mut e: u64, q: u64) -> u64 {
    let mut r = 1u64;
    a %= q;
    while e > 0 {
        if e & 1 == 1 {
            r = mulmod(r, a, q);
        }
        a = mulmod(a, a, q);
        e >>= 1;
    }
    r
}

// Deterministic Miller-Rabin for u64 operands.
fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &[2u64, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37] {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }
    let mut d = n - 1;
    let mut s = 0u32;
    while d & 1 == 0 {
        d >>= 1;
        s += 1;
    }
    'witness: for &a in &[2u64, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37] {
        let mut x = powmod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mulmod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

impl FftPlan {
    /// Chooses word primes whose product exceeds the worst-case
    /// convolution coefficient for a modulus of the given bit length.
    pub(crate) fn for_modulus_bits(p_bits: u64) -> FftPlan {
        let needed_bits = 2 * p_bits + MAX_LOG as u64 + 1;
        let mut primes = Vec::new();
        let mut have_bits = 0u64;
        // Scan candidates c * 2^27 + 1 downward from just below 2^62.
        let mut c: u64 = (1u64 << 35) - 1;
        while have_bits <= needed_bits {
            let q = (c << MAX_LOG) | 1;
            c -= 2;
            if !is_prime_u64(q) {
                continue;
            }
            primes.push(FftPrime {
                q,
                root: find_root_of_two_power_order(q),
            });
            have_bits += 61;
        }

        let mut inv_prod = vec![1u64; primes.len()];
        for i in 1..primes.len() {
            let qi = primes[i].q;
            let mut prod = 1u64;
            for fp in &primes[..i] {
                prod = mulmod(prod, fp.q % qi, qi);
            }
            inv_prod[i] = powmod(prod, qi - 2, qi);
        }

        FftPlan { primes, inv_prod }
    }

    /// Integer convolution of two residue vectors: result[k] =
    /// sum_{i+j=k} a[i]*b[j], exact, reconstructed by Garner's algorithm.
    pub(crate) fn convolve(&self, a: &[BigUint], b: &[BigUint]) -> Vec<BigUint> {
        let out_len = a.len() + b.len() - 1;
        let mut log = 0u32;
        while (1usize << log) < out_len {
            log += 1;
        }
        assert!(log <= MAX_LOG, "transform length 2^{} unsupported", log);
        let n = 1usize << log;

        let mut residues: Vec<Vec<u64>> = Vec::with_capacity(self.primes.len());
        for fp in &self.primes {
            let mut fa = residues_mod(a, fp.q, n);
            let mut fb = residues_mod(b, fp.q, n);
            ntt(&mut fa, fp, log, false);
            ntt(&mut fb, fp, log, false);
            for (x, y) in fa.iter_mut().zip(fb.iter()) {
                *x = mulmod(*x, *y, fp.q);
            }
            ntt(&mut fa, fp, log, true);
            fa.truncate(out_len);
            residues.push(fa);
        }

        // Garner: mixed-radix digits, then a BigUint Horner evaluation.
        let k = self.primes.len();
        let mut out = Vec::with_capacity(out_len);
        let mut digits = vec![0u64; k];
        for idx in 0..out_len {
            for i in 0..k {
                let qi = self.primes[i].q;
                // Evaluate the mixed-radix prefix modulo q_i.
                let mut e = 0u64;
                for j in (0..i).rev() {
                    e = mulmod(e, self.primes[j].q % qi, qi);
                    e = (e + digits[j] % qi) % qi;
                }
                let r = residues[i][idx];
                let diff = (r + qi - e) % qi;
                digits[i] = mulmod(diff, self.inv_prod[i], qi);
            }
            let mut v = BigUint::zero();
            for j in (0..k).rev() {
                v = v * self.primes[j].q + digits[j];
            }
            out.push(v);
        }
        out
    }
}

fn residues_mod(a: &[BigUint], q: u64, n: usize) -> Vec<u64> {
    let mut out = vec![0u64; n];
    for (i, c) in a.iter().enumerate() {
        out[i] = (c % q).to_u64().unwrap();
    }
    out
}

// An element of order exactly 2^MAX_LOG: x^((q-1)/2^MAX_LOG) works for
// any x that is not a 2^MAX_LOG-th power, checked by squaring short.
fn find_root_of_two_power_order(q: u64) -> u64 {
    let odd = (q - 1) >> MAX_LOG;
    let mut x = 2u64;
    loop {
        let r = powmod(x, odd, q);
        if powmod(r, 1u64 << (MAX_LOG - 1), q) != 1 {
            return r;
        }
        x += 1;
    }
}

fn ntt(a: &mut [u64], fp: &FftPrime, log: u32, invert: bool) {
    let n = a.len();
    let q = fp.q;

    // bit-reversal permutation
    for i in 1..n {
        let j = (i as u64).reverse_bits() as usize >> (64 - log);
        if i < j {
            a.swap(i, j);
        }
    }

    let mut w_len = powmod(fp.root, 1u64 << (MAX_LOG - log), q);
    if invert {
        w_len = powmod(w_len, q - 2, q);
    }
    // stage roots, highest order first
    let mut stage_roots = vec![0u64; log as usize];
    for s in (0..log as usize).rev() {
        stage_roots[s] = w_len;
        w_len = mulmod(w_len, w_len, q);
    }

    let mut len = 2usize;
    let mut stage = 0usize;
    while len <= n {
        let w = stage_roots[stage];
        let half = len / 2;
        let mut start = 0usize;
        while start < n {
            let mut wk = 1u64;
            for i in start..start + half {
                let u = a[i];
                let v = mulmod(a[i + half], wk, q);
                a[i] = if u + v >= q { u + v - q } else { u + v };
                a[i + half] = if u >= v { u - v } else { u + q - v };
                wk = mulmod(wk, w, q);
            }
            start += len;
        }
        len <<= 1;
        stage += 1;
    }

    if invert {
        let n_inv = powmod(n as u64, q - 2, q);
        for x in a.iter_mut() {
            *x = mulmod(*x, n_inv, q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::One;

    #[test]
    fn test_plan_primes_are_ntt_primes() {
        let plan = FftPlan::for_modulus_bits(256);
        assert!(plan.primes.len() >= 9);
        for fp in &plan.primes {
            assert!(is_prime_u64(fp.q));
            assert_eq!((fp.q - 1) % (1u64 << MAX_LOG), 0);
            assert_eq!(powmod(fp.root, 1u64 << MAX_LOG, fp.q), 1);
            assert_ne!(powmod(fp.root, 1u64 << (MAX_LOG - 1), fp.q), 1);
        }
    }

    #[test]
    fn test_convolution_small() {
        let plan = FftPlan::for_modulus_bits(31);
        let a: Vec<BigUint> = [1u32, 2, 3].iter().map(|&x| BigUint::from(x)).collect();
        let b: Vec<BigUint> = [4u32, 5].iter().map(|&x| BigUint::from(x)).collect();
        let c = plan.convolve(&a, &b);
        let expect: Vec<BigUint> = [4u32, 13, 22, 15].iter().map(|&x| BigUint::from(x)).collect();
        assert_eq!(c, expect);
    }

    #[test]
    fn test_convolution_matches_schoolbook_large_values() {
        let plan = FftPlan::for_modulus_bits(128);
        let base = BigUint::one() << 127u32;
        let a: Vec<BigUint> = (0..17u32).map(|i| &base - i - 1u32).collect();
        let b: Vec<BigUint> = (0..9u32).map(|i| &base - (3 * i) - 2u32).collect();
        let c = plan.convolve(&a, &b);
        let mut expect = vec![BigUint::zero(); a.len() + b.len() - 1];
        for (i, x) in a.iter().enumerate() {
            for (j, y) in b.iter().enumerate() {
                expect[i + j] += x * y;
            }
        }
        assert_eq!(c, expect);
    }
}
