// src/sea/point.rs
//
// Affine curve points over GF(p) for the kangaroo stage: single-point
// add/double/scalar-mul plus the batched herd advance that amortises the
// field inversions with Montgomery's trick.

use std::rc::Rc;

use num::{BigInt, Signed};

use crate::field::fp::{Fp, FpCtx};

/// The curve y^2 = x^3 + ax + b as used by the scalar point stage.
pub struct Curve {
    ctx: Rc<FpCtx>,
    pub a: Fp,
    pub b: Fp,
}

/// An affine point or the point at infinity.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EcPoint {
    coords: Option<(Fp, Fp)>,
}

impl EcPoint {
    pub fn infinity() -> EcPoint {
        EcPoint { coords: None }
    }

    pub fn new(x: Fp, y: Fp) -> EcPoint {
        EcPoint {
            coords: Some((x, y)),
        }
    }

    pub fn is_infinity(&self) -> bool {
        self.coords.is_none()
    }

    pub fn x(&self) -> Option<&Fp> {
        self.coords.as_ref().map(|(x, _)| x)
    }

    pub fn y(&self) -> Option<&Fp> {
        self.coords.as_ref().map(|(_, y)| y)
    }
}

impl Curve {
    pub fn new(ctx: &Rc<FpCtx>, a: Fp, b: Fp) -> Curve {
        Curve {
            ctx: Rc::clone(ctx),
            a,
            b,
        }
    }

    pub fn ctx(&self) -> &Rc<FpCtx> {
        &self.ctx
    }

    fn rhs(&self, x: &Fp) -> Fp {
        &(&(&(x * x) * x) + &(&self.a * x)) + &self.b
    }

    /// Lift an x-coordinate to a curve point, if x^3 + ax + b is a
    /// square. The square root chosen is deterministic in x.
    pub fn from_x(&self, x: &Fp) -> Option<EcPoint> {
        let y = self.rhs(x).sqrt()?;
        Some(EcPoint::new(x.clone(), y))
    }

    pub fn is_on_curve(&self, p: &EcPoint) -> bool {
        match &p.coords {
            None => true,
            Some((x, y)) => y * y == self.rhs(x),
        }
    }

    pub fn neg(&self, p: &EcPoint) -> EcPoint {
        match &p.coords {
            None => EcPoint::infinity(),
            Some((x, y)) => EcPoint::new(x.clone(), -y),
        }
    }

    pub fn double(&self, p: &EcPoint) -> EcPoint {
        let (x, y) = match &p.coords {
            None => return EcPoint::infinity(),
            Some(c) => c,
        };
        if y.is_zero() {
            return EcPoint::infinity();
        }
        let xx = x * x;
        let lam = &(&(&(&xx + &xx) + &xx) + &self.a) / &(y + y);
        self.chord(x, y, x, &lam)
    }

    pub fn add(&self, p: &EcPoint, q: &EcPoint) -> EcPoint {
        let (x1, y1) = match &p.coords {
            None => return q.clone(),
            Some(c) => c,
        };
        let (x2, y2) = match &q.coords {
            None => return p.clone(),
            Some(c) => c,
        };
        if x1 == x2 {
            if y1 == y2 {
                return self.double(p);
            }
            return EcPoint::infinity();
        }
        let lam = &(y2 - y1) / &(x2 - x1);
        self.chord(x1, y1, x2, &lam)
    }

    fn chord(&self, x1: &Fp, y1: &Fp, x2: &Fp, lam: &Fp) -> EcPoint {
        let x3 = &(&(lam * lam) - x1) - x2;
        let y3 = &(lam * &(x1 - &x3)) - y1;
        EcPoint::new(x3, y3)
    }

    /// Scalar multiplication by any signed integer.
    pub fn mul(&self, k: &BigInt, p: &EcPoint) -> EcPoint {
        if k.is_negative() {
            return self.mul(&-k, &self.neg(p));
        }
        let k = k.to_biguint().unwrap();
        let mut acc = EcPoint::infinity();
        for i in (0..k.bits()).rev() {
            acc = self.double(&acc);
            if k.bit(i) {
                acc = self.add(&acc, p);
            }
        }
        acc
    }

    /// acc[i] += delta[i] for the whole herd, sharing one inversion
    /// across every slope denominator.
    pub fn multi_add(&self, acc: &mut [EcPoint], delta: &[EcPoint]) {
        debug_assert_eq!(acc.len(), delta.len());

        // Gather the denominators of the regular chord/tangent cases;
        // degenerate cases fall back to single-point paths afterwards.
        let mut idx = Vec::with_capacity(acc.len());
        let mut denoms = Vec::with_capacity(acc.len());
        for (i, (p, q)) in acc.iter().zip(delta.iter()).enumerate() {
            match (&p.coords, &q.coords) {
                (Some((x1, y1)), Some((x2, y2))) => {
                    if x1 != x2 {
                        idx.push(i);
                        denoms.push(x2 - x1);
                    } else if y1 == y2 && !y1.is_zero() {
                        idx.push(i);
                        denoms.push(y1 + y2);
                    }
                    // else: vertical chord, handled below
                }
                _ => {}
            }
        }

        let invs = batch_invert(&denoms);

        let mut inv_iter = invs.into_iter();
        let mut fast = vec![false; acc.len()];
        for &i in &idx {
            fast[i] = true;
        }
        let mut it = idx.iter();
        let mut next_fast = it.next();
        for i in 0..acc.len() {
            if next_fast == Some(&i) {
                next_fast = it.next();
                let inv = inv_iter.next().unwrap();
                let (x1, y1) = acc[i].coords.clone().unwrap();
                let (x2, y2) = delta[i].coords.clone().unwrap();
                let lam = if x1 == x2 {
                    // tangent
                    let xx = &x1 * &x1;
                    &(&(&(&xx + &xx) + &xx) + &self.a) * &inv
                } else {
                    &(&y2 - &y1) * &inv
                };
                acc[i] = self.chord(&x1, &y1, &x2, &lam);
            } else if !fast[i] {
                acc[i] = self.add(&acc[i], &delta[i]);
            }
        }
    }
}

/// Montgomery's simultaneous inversion: n inversions for the price of
/// one plus 3(n-1) multiplications.
fn batch_invert(values: &[Fp]) -> Vec<Fp> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut prefix = Vec::with_capacity(values.len());
    let mut acc = values[0].clone();
    prefix.push(acc.clone());
    for v in &values[1..] {
        acc = &acc * v;
        prefix.push(acc.clone());
    }
    let mut inv_all = acc.inv();
    let mut out = vec![values[0].ctx().fp(0); values.len()];
    for i in (1..values.len()).rev() {
        out[i] = &inv_all * &prefix[i - 1];
        inv_all = &inv_all * &values[i];
    }
    out[0] = inv_all;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::BigInt;

    fn curve() -> Curve {
        let ctx = FpCtx::new(&BigInt::from(199)).unwrap();
        Curve::new(&ctx, ctx.fp(2), ctx.fp(1))
    }

    #[test]
    fn test_known_multiples() {
        let c = curve();
        let ctx = c.ctx().clone();
        let p = EcPoint::new(ctx.fp(1), ctx.fp(2));
        assert!(c.is_on_curve(&p));
        let p2 = c.double(&p);
        assert_eq!(p2, EcPoint::new(ctx.fp(12), ctx.fp(34)));
        let p3 = c.add(&p2, &p);
        assert_eq!(p3, EcPoint::new(ctx.fp(30), ctx.fp(185)));
        assert_eq!(c.mul(&BigInt::from(3), &p), p3);
    }

    #[test]
    fn test_add_inverse_is_infinity() {
        let c = curve();
        let p = c.from_x(&c.ctx().fp(1)).unwrap();
        let q = c.neg(&p);
        assert!(c.add(&p, &q).is_infinity());
    }

    #[test]
    fn test_order_annihilates_random_points() {
        // #E for y^2 = x^3 + 2x + 1 over GF(199) divides some N in the
        // Hasse window; find it by brute scalar search once, then check
        // a second point.
        let c = curve();
        let ctx = c.ctx().clone();
        let p = c.from_x(&ctx.fp(1)).unwrap();
        let mut order = None;
        for n in 172..=228 {
            if c.mul(&BigInt::from(n), &p).is_infinity() {
                order = Some(n);
                break;
            }
        }
        let n = order.expect("point order in Hasse window");
        let mut x = 2i64;
        let q = loop {
            if let Some(q) = c.from_x(&ctx.fp(x)) {
                break q;
            }
            x += 1;
        };
        // group exponent divides #E; a priori n might be only the point
        // order, so allow multiples inside the window
        let mut ok = false;
        let mut m = n;
        while m <= 228 {
            if c.mul(&BigInt::from(m), &q).is_infinity() {
                ok = true;
                break;
            }
            m += n;
        }
        assert!(ok);
    }

    #[test]
    fn test_multi_add_matches_serial() {
        let c = curve();
        let ctx = c.ctx().clone();
        let base = c.from_x(&ctx.fp(1)).unwrap();
        let mut acc: Vec<EcPoint> = (1..8)
            .map(|i| c.mul(&BigInt::from(i), &base))
            .collect();
        let delta: Vec<EcPoint> = (3..10)
            .map(|i| c.mul(&BigInt::from(i * 5), &base))
            .collect();
        let expect: Vec<EcPoint> = acc
            .iter()
            .zip(delta.iter())
            .map(|(a, d)| c.add(a, d))
            .collect();
        c.multi_add(&mut acc, &delta);
        assert_eq!(acc, expect);
    }
}
