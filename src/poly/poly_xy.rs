// src/poly/poly_xy.rs

use std::rc::Rc;

use num::BigUint;

use crate::field::fp::{Fp, FpCtx};
use crate::poly::poly::Poly;

/// Sparse bivariate polynomial over GF(p): a flat vector of
/// (coefficient, x-power, y-power) triples in insertion order. The
/// builder is append-only, which is all the modular-polynomial reader
/// needs.
#[derive(Clone)]
pub struct PolyXY {
    ctx: Rc<FpCtx>,
    terms: Vec<(Fp, u32, u32)>,
}

impl PolyXY {
    pub fn new(ctx: &Rc<FpCtx>) -> PolyXY {
        PolyXY {
            ctx: Rc::clone(ctx),
            terms: Vec::new(),
        }
    }

    pub fn addterm(&mut self, c: Fp, nx: u32, ny: u32) {
        if c.is_zero() {
            return;
        }
        self.terms.push((c, nx, ny));
    }

    pub fn terms(&self) -> &[(Fp, u32, u32)] {
        &self.terms
    }

    pub fn degree_x(&self) -> u32 {
        self.terms.iter().map(|&(_, nx, _)| nx).max().unwrap_or(0)
    }

    pub fn degree_y(&self) -> u32 {
        self.terms.iter().map(|&(_, _, ny)| ny).max().unwrap_or(0)
    }

    /// Partial derivative with respect to x.
    pub fn diff_dx(&self) -> PolyXY {
        let mut out = PolyXY::new(&self.ctx);
        for (c, nx, ny) in &self.terms {
            if *nx == 0 {
                continue;
            }
            let d = c * &self.ctx.fp(*nx as i64);
            if !d.is_zero() {
                out.terms.push((d, nx - 1, *ny));
            }
        }
        out
    }

    /// Partial derivative with respect to y.
    pub fn diff_dy(&self) -> PolyXY {
        let mut out = PolyXY::new(&self.ctx);
        for (c, nx, ny) in &self.terms {
            if *ny == 0 {
                continue;
            }
            let d = c * &self.ctx.fp(*ny as i64);
            if !d.is_zero() {
                out.terms.push((d, *nx, ny - 1));
            }
        }
        out
    }

    fn pow_table(&self, base: &Fp, max: u32) -> Vec<Fp> {
        let mut t = Vec::with_capacity(max as usize + 1);
        t.push(self.ctx.fp(1));
        for i in 1..=max {
            t.push(&t[i as usize - 1] * base);
        }
        t
    }

    /// Full evaluation F(x0, y0).
    pub fn eval(&self, x0: &Fp, y0: &Fp) -> Fp {
        let xs = self.pow_table(x0, self.degree_x());
        let ys = self.pow_table(y0, self.degree_y());
        let mut acc = self.ctx.fp(0);
        for (c, nx, ny) in &self.terms {
            acc = &acc + &(c * &xs[*nx as usize] * &ys[*ny as usize]);
        }
        acc
    }

    /// Partial evaluation at y = y0: the univariate polynomial in x.
    pub fn eval_y(&self, y0: &Fp) -> Poly {
        let ys = self.pow_table(y0, self.degree_y());
        let mut coeffs = vec![BigUint::from(0u32); self.degree_x() as usize + 1];
        let fp_ctx = &self.ctx;
        for (c, nx, ny) in &self.terms {
            let t = c * &ys[*ny as usize];
            coeffs[*nx as usize] = fp_ctx.addm(&coeffs[*nx as usize], t.rep());
        }
        Poly::from_reps(fp_ctx, coeffs)
    }
}
