// src/process/mod.rs
//
// Reduction of the raw modular-polynomial stream modulo a chosen prime.
// The reduced stream is what the SEA stage consumes.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use log::{info, warn};
use num::{BigInt, Integer, Num, Signed};

use crate::core::error::{SeaError, SeaResult};
use crate::integer_math::primes::PrimeFactory;
use crate::mueller::{to_hex, RawModularPoly, RawTerm};

/// Whitespace-separated token cursor over a whole stream. The on-disk
/// format is one token per line, but parsing is whitespace-agnostic.
pub struct TokenStream {
    toks: Vec<String>,
    pos: usize,
}

impl TokenStream {
    pub fn open(path: &Path) -> SeaResult<TokenStream> {
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        Ok(TokenStream {
            toks: buf.split_whitespace().map(str::to_owned).collect(),
            pos: 0,
        })
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn next(&mut self) -> Option<&str> {
        let t = self.toks.get(self.pos)?;
        self.pos += 1;
        Some(t)
    }

    /// Base-16 signed bigint token; EOF is an error here.
    pub fn next_bigint(&mut self) -> SeaResult<BigInt> {
        let t = self
            .next()
            .ok_or_else(|| SeaError::BadModularPolyFile("unexpected end of stream".into()))?;
        BigInt::from_str_radix(t, 16)
            .map_err(|_| SeaError::BadModularPolyFile(format!("bad base-16 integer '{}'", t)))
    }

    /// Decimal small-integer token (prime indices and powers).
    pub fn next_u32(&mut self) -> SeaResult<u32> {
        let t = self
            .next()
            .ok_or_else(|| SeaError::BadModularPolyFile("unexpected end of stream".into()))?;
        t.parse::<u32>()
            .map_err(|_| SeaError::BadModularPolyFile(format!("bad integer '{}'", t)))
    }

    /// Like next_u32, but None at a clean end of stream.
    pub fn try_next_u32(&mut self) -> SeaResult<Option<u32>> {
        if self.eof() {
            return Ok(None);
        }
        self.next_u32().map(Some)
    }
}

/// Ensure the working modulus is prime, scanning away from a composite
/// input. Returns the (possibly adjusted) prime.
pub fn adjust_prime(p: &BigInt, down: bool) -> SeaResult<BigInt> {
    if PrimeFactory::is_probable_prime(p) {
        return Ok(p.clone());
    }
    warn!("supplied modulus is not prime; scanning {}", if down { "down" } else { "up" });
    let adjusted = if down {
        PrimeFactory::prev_prime(p)
    } else {
        PrimeFactory::next_prime(p)
    };
    if adjusted < BigInt::from(5) {
        return Err(SeaError::BadParams(format!(
            "no usable prime at or below {}",
            p
        )));
    }
    let offset = &adjusted - p;
    if offset.is_negative() {
        info!("prime P = P-{}", -&offset);
    } else {
        info!("prime P = P+{}", offset);
    }
    info!("prime P = {}", adjusted);
    Ok(adjusted)
}

/// Reduce a raw stream file coefficient-by-coefficient modulo p, writing
/// the reduced stream. Returns the prime actually used.
pub fn reduce_file(p: &BigInt, raw: &Path, out: &Path, down: bool) -> SeaResult<BigInt> {
    let p = adjust_prime(p, down)?;
    info!("P mod 24 = {}", &p % 24);
    info!("P is {} bits long", p.bits());

    let mut toks = TokenStream::open(raw)?;
    let mut w = BufWriter::new(File::create(out)?);
    writeln!(w, "{}", to_hex(&p))?;

    while let Some(l) = toks.try_next_u32()? {
        writeln!(w, "{}", l)?;
        loop {
            let c = toks.next_bigint()?;
            let nx = toks.next_u32()?;
            let ny = toks.next_u32()?;
            let c = c.mod_floor(&p);
            writeln!(w, "{}", to_hex(&c))?;
            writeln!(w, "{}", nx)?;
            writeln!(w, "{}", ny)?;
            if nx == 0 && ny == 0 {
                break;
            }
        }
    }
    w.flush()?;
    Ok(p)
}

/// In-memory reduction of a single polynomial, used to cross-check the
/// file round trip.
pub fn reduce_poly(p: &BigInt, poly: &RawModularPoly) -> RawModularPoly {
    RawModularPoly {
        l: poly.l,
        terms: poly
            .terms
            .iter()
            .map(|t| RawTerm {
                c: t.c.mod_floor(p),
                nx: t.nx,
                ny: t.ny,
            })
            .collect(),
    }
}
