// Mueller generation and raw-stream reduction, end to end through the
// on-disk format.

use num::{BigInt, Integer};
use tempfile::tempdir;

use sea::config::MuellerConfig;
use sea::mueller::{mueller_pol, mueller_range, RawModularPoly};
use sea::process::{reduce_file, reduce_poly, TokenStream};

fn read_reduced(path: &std::path::Path) -> (BigInt, Vec<RawModularPoly>) {
    let mut toks = TokenStream::open(path).unwrap();
    let p = toks.next_bigint().unwrap();
    let mut polys = Vec::new();
    while let Some(l) = toks.try_next_u32().unwrap() {
        let mut terms = Vec::new();
        loop {
            let c = toks.next_bigint().unwrap();
            let nx = toks.next_u32().unwrap();
            let ny = toks.next_u32().unwrap();
            terms.push(sea::mueller::RawTerm { c, nx, ny });
            if nx == 0 && ny == 0 {
                break;
            }
        }
        polys.push(RawModularPoly { l, terms });
    }
    (p, polys)
}

#[test]
fn test_range_write_then_reduce_round_trip() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("mueller.raw");
    let reduced = dir.path().join("mueller.pol");

    let cfg = MuellerConfig::default();
    let written = mueller_range(0, 12, &cfg, &raw).unwrap();
    assert_eq!(written, 4); // 3, 5, 7, 11

    let p = BigInt::from(10007);
    let used = reduce_file(&p, &raw, &reduced, false).unwrap();
    assert_eq!(used, p);

    let (file_p, file_polys) = read_reduced(&reduced);
    assert_eq!(file_p, p);
    assert_eq!(file_polys.len(), 4);

    // The file reduction must agree with reducing in memory.
    for (l, on_disk) in [3u32, 5, 7, 11].iter().zip(file_polys.iter()) {
        assert_eq!(*l, on_disk.l);
        let expect = reduce_poly(&p, &mueller_pol(*l).unwrap());
        assert_eq!(expect.terms.len(), on_disk.terms.len());
        for (a, b) in expect.terms.iter().zip(on_disk.terms.iter()) {
            assert_eq!(a.c, b.c);
            assert_eq!(a.nx, b.nx);
            assert_eq!(a.ny, b.ny);
        }
    }
}

#[test]
fn test_reduced_coefficients_in_range() {
    let p = BigInt::from(101);
    let g = reduce_poly(&p, &mueller_pol(5).unwrap());
    for t in &g.terms {
        assert!(t.c >= BigInt::from(0) && t.c < p);
        // and each coefficient matches a direct mod_floor
    }
    // spot value: the canonical G_5 constant 125 reduces to 24
    let constant = g
        .terms
        .iter()
        .filter(|t| t.nx == 0 && t.ny == 0)
        .map(|t| t.c.clone())
        .sum::<BigInt>()
        .mod_floor(&p);
    assert_eq!(constant, BigInt::from(24));
}

#[test]
fn test_skip_threshold_filters_high_s() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("mueller.raw");
    // s(3) = 6 and s(11) = 6 are skipped at threshold 6; 5 (s=3) and
    // 7 (s=2) survive.
    let cfg = MuellerConfig { skip: 6 };
    let written = mueller_range(0, 12, &cfg, &raw).unwrap();
    assert_eq!(written, 2);
    let mut toks = TokenStream::open(&raw).unwrap();
    assert_eq!(toks.next_u32().unwrap(), 5);
}

#[test]
fn test_appending_keeps_earlier_polynomials() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("mueller.raw");
    let cfg = MuellerConfig::default();
    mueller_range(0, 4, &cfg, &raw).unwrap();
    mueller_range(4, 8, &cfg, &raw).unwrap();

    let mut toks = TokenStream::open(&raw).unwrap();
    let mut seen = Vec::new();
    while let Some(l) = toks.try_next_u32().unwrap() {
        seen.push(l);
        loop {
            let _ = toks.next_bigint().unwrap();
            let nx = toks.next_u32().unwrap();
            let ny = toks.next_u32().unwrap();
            if nx == 0 && ny == 0 {
                break;
            }
        }
    }
    assert_eq!(seen, vec![3, 5, 7]);
}
