// src/sea/kangaroo.rs
//
// Pollard lambda finish: two herds of kangaroos hop through the Hasse
// interval in steps that are multiples of the CRT modulus, rendezvous on
// distinguished points, and the collision offset is the group order.
// Complexity O(sqrt(p)/sqrt(N)) curve additions for N the CRT modulus.

use log::{info, warn};
use num::bigint::RandBigInt;
use num::integer::Roots;
use num::{BigInt, Integer, One, ToPrimitive, Zero};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::config::KangarooConfig;
use crate::core::error::{SeaError, SeaResult};
use crate::integer_math::primes::PrimeFactory;
use crate::sea::point::{Curve, EcPoint};

fn x_of(p: &EcPoint) -> BigInt {
    match p.x() {
        Some(x) => x.to_bigint(),
        None => BigInt::zero(),
    }
}

fn random_point(curve: &Curve, rng: &mut ChaCha20Rng) -> EcPoint {
    let ctx = curve.ctx().clone();
    loop {
        let x = rng.gen_biguint_below(ctx.prime());
        if let Some(pt) = curve.from_x(&ctx.fp_from_uint(&x)) {
            return pt;
        }
    }
}

/// Search for #E given #E = order (mod ordermod), over a fresh random
/// point per attempt. Returns the order, restarting internally on store
/// overflow or low-order points.
pub fn kangaroo(
    curve: &Curve,
    order: &BigInt,
    ordermod: &BigInt,
    cfg: &KangarooConfig,
) -> SeaResult<BigInt> {
    let ctx = curve.ctx().clone();
    let p = ctx.prime_int().clone();
    let herd = cfg.herd;
    let mut rng = match cfg.seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s),
        None => ChaCha20Rng::from_entropy(),
    };

    let sqrt_p = p.sqrt();
    let lower: BigInt = &p + 1 - 2 * &sqrt_p - 3;
    let upper: BigInt = &p + 1 + 2 * &sqrt_p + 3;

    'restart: loop {
        let base = random_point(curve, &mut rng);

        let w: BigInt = 1 + (&upper - &lower) / ordermod;
        let leaps = w.sqrt();
        let mean: BigInt = BigInt::from(herd as u64) * &leaps / 2;
        let nbits = ((&leaps / BigInt::from(16)).bits() as u32).min(cfg.dp_bit_cap);
        let distinguished = BigInt::one() << nbits;

        // Distance table: 2^i * ordermod, sized so the expected jump
        // matches the ideal mean for the interval.
        let mut distance = Vec::new();
        let mut s = BigInt::one();
        let mut m = 1usize;
        loop {
            distance.push(&s * ordermod);
            s *= 2;
            if 2 * &s / BigInt::from(m as u64) > mean {
                break;
            }
            m += 1;
        }
        let mut table = Vec::with_capacity(m);
        table.push(curve.mul(ordermod, &base));
        for i in 1..m {
            let prev = table[i - 1].clone();
            table.push(curve.add(&prev, &prev));
        }

        let mut middle: BigInt = (&upper + &lower) / 2;
        if ordermod > &BigInt::one() {
            // middle must be congruent to the known residue
            let r = middle.mod_floor(ordermod);
            middle += ordermod + order - r;
        }

        let mut start = Vec::with_capacity(2 * herd);
        for i in 0..herd {
            start.push(&middle + 13 * ordermod * BigInt::from(i as u64)); // tame
        }
        for i in 0..herd {
            start.push(13 * ordermod * BigInt::from(i as u64)); // wild
        }

        let mut roos: Vec<EcPoint> = start.iter().map(|s| curve.mul(s, &base)).collect();
        let mut dist = vec![BigInt::zero(); 2 * herd];
        let mut jumps = vec![EcPoint::infinity(); 2 * herd];

        info!("releasing {} tame and {} wild kangaroos", herd, herd);

        // (point, travelled distance, owner index)
        let mut tame: Vec<(EcPoint, BigInt, usize)> = Vec::new();
        let mut wild: Vec<(EcPoint, BigInt, usize)> = Vec::new();
        let mut collision: Option<(usize, usize)> = None;
        let mut abort = false;

        'search: loop {
            for jj in 0..2 * herd {
                let side_tame = jj < herd;
                let xc = x_of(&roos[jj]);
                let i = (&xc % (m as u64)).to_usize().unwrap();

                if (&xc % &distinguished).is_zero() {
                    let (own, other) = if side_tame {
                        (&mut tame, &mut wild)
                    } else {
                        (&mut wild, &mut tame)
                    };
                    if own.len() >= cfg.store {
                        abort = true;
                        break 'search;
                    }
                    own.push((roos[jj].clone(), dist[jj].clone(), jj));
                    let me = own.len() - 1;
                    for (k, entry) in other.iter().enumerate() {
                        if entry.0 == roos[jj] {
                            collision = Some(if side_tame { (me, k) } else { (k, me) });
                            break;
                        }
                    }
                    if collision.is_some() {
                        break 'search;
                    }
                }
                dist[jj] += &distance[i];
                jumps[jj] = table[i].clone();
            }
            curve.multi_add(&mut roos, &jumps); // jump together
        }

        if abort {
            warn!("distinguished-point store filled before a collision - retrying");
            continue 'restart;
        }
        let (ct, cw) = collision.unwrap();
        let (_, tdist, towner) = &tame[ct];
        let (_, wdist, wowner) = &wild[cw];
        let nrp: BigInt = &start[*towner] - &start[*wowner] + tdist - wdist;

        if !curve.mul(&nrp, &base).is_infinity() {
            return Err(SeaError::SanityCheck(format!(
                "kangaroo collision offset {} does not annihilate the base point",
                nrp
            )));
        }
        if PrimeFactory::is_probable_prime(&nrp) {
            info!("NP = {}", nrp);
            info!("NP is prime");
            return Ok(nrp);
        }

        // The collision offset may be a multiple of the point order.
        // Strip small primes while the quotient still kills the point.
        let mut real_order = nrp.clone();
        let mut i = 0;
        let primes = PrimeFactory::small_primes();
        while i < primes.len() {
            let sp = BigInt::from(primes[i]);
            if (&real_order % &sp).is_zero() {
                let cand = &real_order / &sp;
                if curve.mul(&cand, &base).is_infinity() {
                    real_order = cand;
                    continue;
                }
            }
            i += 1;
        }
        if real_order <= 4 * &sqrt_p {
            info!("low-order point used - trying again");
            continue 'restart;
        }

        let mut residual = nrp.clone();
        for &sp in primes {
            let sp = BigInt::from(sp);
            while (&residual % &sp).is_zero() {
                residual /= &sp;
            }
        }
        if residual.is_one() {
            // every factor of the candidate was examined above
            info!("NP = {}", nrp);
            return Ok(nrp);
        }
        if PrimeFactory::is_probable_prime(&residual) {
            if curve.mul(&(&nrp / &residual), &base).is_infinity() {
                warn!("collision gave a proper multiple of the point order - trying again");
                continue 'restart;
            }
            info!("NP = {}", nrp);
            return Ok(nrp);
        }

        // The residual cofactor is composite; accept only if the
        // candidate kills a batch of random points.
        let mut bad = false;
        for _ in 0..10 {
            let q = random_point(curve, &mut rng);
            if !curve.mul(&nrp, &q).is_infinity() {
                bad = true;
                break;
            }
        }
        if bad {
            warn!("candidate order failed a random-point check - trying again");
            continue 'restart;
        }
        warn!("NP is composite and not ideal for cryptographic use");
        info!("NP = {} (probably)", nrp);
        return Ok(nrp);
    }
}
