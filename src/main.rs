// src/main.rs

use env_logger::Env;
use log::{error, info};
use num::{BigInt, Num};
use std::path::Path;
use std::str::FromStr;

use sea::config::SeaConfig;
use sea::mueller::mueller_range;
use sea::process::reduce_file;
use sea::sea::count_points;

fn main() {
    // Load configuration first (before logging is initialized)
    let config = SeaConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config: {}. Using defaults.", e);
        SeaConfig::default()
    });

    let log_level = std::env::var("SEA_LOG_LEVEL").unwrap_or_else(|_| config.log_level.clone());
    env_logger::Builder::from_env(Env::default().filter_or("SEA_LOG_LEVEL", log_level)).init();

    let threads = config.threads.unwrap_or_else(|| {
        let total_cores = num_cpus::get();
        (total_cores / 4).max(1)
    });
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .expect("failed to configure thread pool");

    let args: Vec<String> = std::env::args().collect();
    let status = match args.get(1).map(String::as_str) {
        Some("mueller") => run_mueller(&args[2..], &config),
        Some("process") => run_process(&args[2..], &config),
        Some("count") => run_count(&args[2..], &config),
        _ => {
            usage(&args[0]);
            1
        }
    };
    std::process::exit(status);
}

fn usage(prog: &str) {
    eprintln!("Usage: {} mueller <lo> <hi> -o <raw-file>", prog);
    eprintln!("       {} process -f <prime> -i <raw-file> -o <reduced-file>", prog);
    eprintln!("       {} count -a <A> -b <B> -i <reduced-file> [-o <out-file>]", prog);
    eprintln!();
    eprintln!("Primes accept decimal or 0x-prefixed base 16.");
}

fn parse_bigint(s: &str) -> Option<BigInt> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        BigInt::from_str_radix(hex, 16).ok()
    } else {
        BigInt::from_str(s).ok()
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn run_mueller(args: &[String], config: &SeaConfig) -> i32 {
    let (lo, hi) = match (
        args.first().and_then(|s| s.parse().ok()),
        args.get(1).and_then(|s| s.parse().ok()),
    ) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            error!("mueller needs a numeric range");
            return 1;
        }
    };
    let out = match flag_value(args, "-o") {
        Some(o) => o,
        None => {
            error!("mueller needs -o <raw-file>");
            return 1;
        }
    };
    match mueller_range(lo, hi, &config.mueller, Path::new(out)) {
        Ok(n) => {
            info!("{} modular polynomials written to {}", n, out);
            0
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}

fn run_process(args: &[String], config: &SeaConfig) -> i32 {
    let p = match flag_value(args, "-f").and_then(parse_bigint) {
        Some(p) => p,
        None => {
            error!("process needs -f <prime>");
            return 1;
        }
    };
    let (input, output) = match (flag_value(args, "-i"), flag_value(args, "-o")) {
        (Some(i), Some(o)) => (i, o),
        _ => {
            error!("process needs -i <raw-file> and -o <reduced-file>");
            return 1;
        }
    };
    match reduce_file(&p, Path::new(input), Path::new(output), config.process.down) {
        Ok(p) => {
            info!("reduced stream for prime {} written to {}", p, output);
            0
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}

fn run_count(args: &[String], config: &SeaConfig) -> i32 {
    let (a, b) = match (
        flag_value(args, "-a").and_then(parse_bigint),
        flag_value(args, "-b").and_then(parse_bigint),
    ) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            error!("count needs -a <A> and -b <B>");
            return 1;
        }
    };
    let input = match flag_value(args, "-i") {
        Some(i) => i,
        None => {
            error!("count needs -i <reduced-file>");
            return 1;
        }
    };
    let out = flag_value(args, "-o").map(Path::new);
    match count_points(&a, &b, Path::new(input), out, config) {
        Ok(outcome) => {
            info!("NP = {}", outcome.order);
            0
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}
