// src/series/modular_forms.rs

use num::{BigInt, One};

use crate::series::power_series::PowerSeries;

/// Dedekind eta (without the q^{1/24} prefactor): the pentagonal-number
/// series sum_{k in Z} (-1)^k x^{k(3k-1)/2}, truncated at x^n.
pub fn eta(n: i64) -> PowerSeries {
    let mut s = PowerSeries::new();
    s.addterm(BigInt::one(), 0);
    let mut k = 1i64;
    loop {
        let e1 = k * (3 * k - 1) / 2;
        let e2 = k * (3 * k + 1) / 2;
        if e1 >= n && e2 >= n {
            break;
        }
        let sign = if k % 2 == 0 { BigInt::one() } else { -BigInt::one() };
        if e1 < n {
            s.addterm(sign.clone(), e1);
        }
        if e2 < n {
            s.addterm(sign, e2);
        }
        k += 1;
    }
    s
}

/// Klein j-invariant as a series in x = q:
/// j = (240 * sum_{m>=1} sigma_3(m) x^m + 1)^3 / eta(x)^24, shifted by
/// x^{-1} to stand in for the suppressed q^{1/24} factor of eta.
pub fn klein_j(n: i64) -> PowerSeries {
    let mut e4 = PowerSeries::new();
    // sigma_3 by divisor accumulation
    let mut sigma = vec![BigInt::from(0); n.max(1) as usize];
    for d in 1..n {
        let cube = BigInt::from(d) * d * d;
        let mut m = d;
        while m < n {
            sigma[m as usize] += &cube;
            m += d;
        }
    }
    for m in 1..n {
        e4.addterm(std::mem::take(&mut sigma[m as usize]), m);
    }
    let mut x = e4.scale(&BigInt::from(240));
    x.addterm(BigInt::one(), 0);
    let x = x.pow(3, n);

    let y = eta(n).pow(24, n);

    let mut j = x.div(&y, n);
    j.divxn(1);
    j
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eta_pentagonal_pattern() {
        let s = eta(30);
        // 1 - x - x^2 + x^5 + x^7 - x^12 - x^15 + x^22 + x^26
        for (exp, c) in [
            (0, 1),
            (1, -1),
            (2, -1),
            (5, 1),
            (7, 1),
            (12, -1),
            (15, -1),
            (22, 1),
            (26, 1),
        ] {
            assert_eq!(s.coeff(exp), BigInt::from(c), "exponent {}", exp);
        }
        for exp in [3, 4, 6, 8, 11, 13, 20, 25] {
            assert_eq!(s.coeff(exp), BigInt::from(0), "exponent {}", exp);
        }
    }

    #[test]
    fn test_klein_j_q_expansion() {
        // j(q) = q^-1 + 744 + 196884 q + 21493760 q^2 + ...
        let j = klein_j(5);
        assert_eq!(j.first(), -1);
        assert_eq!(j.coeff(-1), BigInt::one());
        assert_eq!(j.coeff(0), BigInt::from(744));
        assert_eq!(j.coeff(1), BigInt::from(196884));
        assert_eq!(j.coeff(2), BigInt::from(21493760i64));
    }
}
