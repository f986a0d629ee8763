//! WireGuard Vanity Key Search CLI
//!
//! Usage:
//!   wg-vanity -p AY/                 # Find a key whose public key starts with "AY/"
//!   wg-vanity -p cafe -w 8 -t 60     # 8 workers, give up after a minute
//!   wg-vanity -p AY/ --public KEY    # Blind mode: search from a public key
//!   wg-vanity add -o OFFSET < key    # Apply a found offset to a private key

use std::io;
use std::process;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use num_bigint::BigUint;

use wg_vanity::config::{AddConfig, Command, Config, SearchConfig};
use wg_vanity::{
    add_offset, decode_public, Keypair, PoolOptions, SearchOutcome, VanityResult, WorkerPool,
};

fn main() {
    let config = Config::parse();

    let exit_code = match config.command {
        Some(Command::Add(add)) => cmd_add(&add),
        None => cmd_search(&config.search),
    };
    process::exit(exit_code);
}

fn cmd_search(config: &SearchConfig) -> i32 {
    let prefix = match config.validate() {
        Ok(prefix) => prefix,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return 2;
        }
    };

    // Blind mode starts from a supplied public key; otherwise generate a
    // fresh keypair so the private side of every match can be printed.
    let (keypair, start) = if let Some(public) = &config.public {
        match decode_public(public) {
            Ok(point) => (None, point),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 2;
            }
        }
    } else {
        let keypair = Keypair::generate();
        let start = *keypair.public_point();
        (Some(keypair), start)
    };

    let quiet = config.offset_only;
    if !quiet {
        println!("WireGuard Vanity Key Search");
        println!("===========================");
        println!("Prefix:     {} ({} bits)", prefix.text(), prefix.bits());
        println!(
            "Difficulty: {} (~{} attempts per match)",
            prefix.difficulty_description(),
            format_number(prefix.estimated_attempts() as u64)
        );
        println!("Workers:    {}", config.worker_count());
        println!("Batch size: {}", config.batch_size);
        println!("Target:     {} key(s)", config.count);
        println!();
        println!("Searching... (Press Ctrl+C to stop)\n");
    }

    let mut pool = WorkerPool::new(
        start,
        prefix,
        PoolOptions {
            workers: config.worker_count(),
            batch_size: config.batch_size,
            limit: config.limit,
            matches: config.count,
        },
    );

    let stop_flag = pool.stop_flag_clone();
    ctrlc::set_handler(move || {
        stop_flag.store(true, std::sync::atomic::Ordering::Relaxed);
    })
    .expect("failed to set Ctrl-C handler");

    let started = Instant::now();
    let deadline = config.timeout.map(Duration::from_secs);
    let report_interval = Duration::from_secs(config.report_interval.max(1));

    let mut matches: Vec<VanityResult> = Vec::new();
    let outcome = loop {
        match pool.wait_for_result(report_interval) {
            Some(result) => {
                print_match(&result, keypair.as_ref(), matches.len() + 1, quiet);
                matches.push(result);
                if matches.len() >= config.count {
                    break SearchOutcome::Found;
                }
            }
            None => {
                if !quiet {
                    print_progress(&pool, started);
                }
            }
        }

        if deadline.is_some_and(|limit| started.elapsed() >= limit) {
            break finish(&pool, keypair.as_ref(), &mut matches, quiet, SearchOutcome::TimedOut);
        }
        if pool.is_stopped() {
            break finish(&pool, keypair.as_ref(), &mut matches, quiet, SearchOutcome::Cancelled);
        }
        if pool.workers_finished() {
            break finish(&pool, keypair.as_ref(), &mut matches, quiet, SearchOutcome::Exhausted);
        }
    };

    pool.shutdown();

    if !quiet {
        let elapsed = started.elapsed().as_secs_f64();
        let attempts = pool.total_attempts();
        println!();
        println!("--- Final Statistics ---");
        println!("Outcome:        {:?}", outcome);
        println!("Matches found:  {}", matches.len());
        println!("Total attempts: {}", format_number(attempts));
        println!("Time elapsed:   {:.2}s", elapsed);
        println!(
            "Average speed:  {}/s",
            format_number((attempts as f64 / elapsed.max(1e-9)) as u64)
        );
    }

    if matches.is_empty() {
        1
    } else {
        0
    }
}

/// Drain any last results and decide between a win and the given
/// terminal outcome.
fn finish(
    pool: &WorkerPool,
    keypair: Option<&Keypair>,
    matches: &mut Vec<VanityResult>,
    quiet: bool,
    otherwise: SearchOutcome,
) -> SearchOutcome {
    pool.stop();
    while let Some(result) = pool.try_recv() {
        print_match(&result, keypair, matches.len() + 1, quiet);
        matches.push(result);
    }
    if matches.is_empty() {
        otherwise
    } else {
        SearchOutcome::Found
    }
}

fn print_match(result: &VanityResult, keypair: Option<&Keypair>, index: usize, quiet: bool) {
    if quiet {
        println!("{}", result.offset);
        return;
    }

    let private = match keypair {
        Some(keypair) => {
            match add_offset(keypair.secret_bytes(), &result.offset, Some(&result.public_key)) {
                Ok(secret) => STANDARD.encode(secret),
                Err(e) => {
                    eprintln!("Warning: recovery failed: {}", e);
                    "-".to_string()
                }
            }
        }
        None => "-".to_string(),
    };

    println!("=== Match #{} ===", index);
    println!("Private: {}", private);
    println!("Public:  {}", result.public_key_base64());
    println!("Offset:  {}", result.offset);
    println!("Worker:  {}", result.worker_id);
    println!();
}

fn print_progress(pool: &WorkerPool, started: Instant) {
    println!(
        "[{:>5}s] {} attempts ({}/s)",
        started.elapsed().as_secs(),
        format_number(pool.total_attempts()),
        format_number(pool.attempts_per_second() as u64)
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn cmd_add(config: &AddConfig) -> i32 {
    let offset: BigUint = match config.offset.parse() {
        Ok(offset) => offset,
        Err(_) => {
            eprintln!("Error: offset must be a non-negative decimal integer");
            return 2;
        }
    };

    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        eprintln!("Error: failed to read private key from stdin");
        return 1;
    }

    let secret: [u8; 32] = match STANDARD
        .decode(line.trim())
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
    {
        Some(bytes) => bytes,
        None => {
            eprintln!("Error: invalid private key");
            return 1;
        }
    };

    match add_offset(&secret, &offset, None) {
        Ok(vanity) => {
            println!("{}", STANDARD.encode(vanity));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}
