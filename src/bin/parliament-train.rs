//! parliament-train - Train a ternary network on a two-input logic gate
//!
//! # Usage
//!
//! ```bash
//! # XOR with a hidden layer of 4 units
//! parliament-train --task xor --sizes 2,4,1
//!
//! # Reproducible run with a fixed background rate, saving the weights
//! parliament-train --task and --seed 7 --background 0.5 --save and.json
//!
//! # Start from a JSON trainer config, overriding the seed
//! parliament-train --config train.json --seed 3 -v
//! ```
//!
//! # Exit Codes
//!
//! - 0: Training finished with every truth-table row correct
//! - 1: Training finished but some rows are still wrong
//! - 2: Invalid arguments, bad config, or IO error

use parliament::{
    bit_pattern, Sample, ScheduleConfig, Seeding, SummaryObserver, TrainConfig, Trainer,
    VecSource,
};
use std::process::ExitCode;

/// Truth-table batch: every row trained each step
const ROWS: usize = 4;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let mut task = "xor".to_string();
    let mut config_path: Option<String> = None;
    let mut save_path: Option<String> = None;
    let mut sizes: Option<Vec<usize>> = None;
    let mut rate: Option<f64> = None;
    let mut background: Option<f64> = None;
    let mut steps: Option<usize> = None;
    let mut seed: Option<u64> = None;
    let mut seeding: Option<Seeding> = None;
    let mut verbose = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let parsed = match arg.as_str() {
            "-v" | "--verbose" => {
                verbose = true;
                Ok(())
            }
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--task" => value(&mut iter, arg).map(|v| task = v),
            "--config" => value(&mut iter, arg).map(|v| config_path = Some(v)),
            "--save" => value(&mut iter, arg).map(|v| save_path = Some(v)),
            "--sizes" => value(&mut iter, arg)
                .and_then(|v| parse_sizes(&v))
                .map(|v| sizes = Some(v)),
            "--rate" => parse_value(&mut iter, arg).map(|v| rate = Some(v)),
            "--background" => parse_value(&mut iter, arg).map(|v| background = Some(v)),
            "--steps" => parse_value(&mut iter, arg).map(|v| steps = Some(v)),
            "--seed" => parse_value(&mut iter, arg).map(|v| seed = Some(v)),
            "--seeding" => value(&mut iter, arg)
                .and_then(|v| parse_seeding(&v))
                .map(|v| seeding = Some(v)),
            _ => Err(format!("Unknown option: {}", arg)),
        };
        if let Err(msg) = parsed {
            eprintln!("Error: {}\n", msg);
            print_help();
            return ExitCode::from(2);
        }
    }

    let truth: fn(bool, bool) -> bool = match task.as_str() {
        "and" => |a, b| a && b,
        "or" => |a, b| a || b,
        "xor" => |a, b| a != b,
        "nand" => |a, b| !(a && b),
        other => {
            eprintln!("Error: Unknown task: {} (expected and, or, xor, nand)\n", other);
            print_help();
            return ExitCode::from(2);
        }
    };

    // Build config
    let mut config = match &config_path {
        Some(path) => match TrainConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return ExitCode::from(2);
            }
        },
        None => TrainConfig {
            sizes: vec![2, 4, 1],
            batch_size: ROWS,
            max_samples: ROWS * 20_000,
            schedule: ScheduleConfig::Exponential {
                initial: 4.0,
                time_constant: 3000.0,
            },
            ..Default::default()
        },
    };
    if let Some(sizes) = sizes {
        config.sizes = sizes;
    }
    if let Some(rate) = rate {
        config.rate = rate;
    }
    if let Some(background) = background {
        config.schedule = ScheduleConfig::Constant { background };
    }
    if let Some(steps) = steps {
        // a step fires every batch_size draws after the first
        config.max_samples = steps.saturating_add(1).saturating_mul(config.batch_size);
    }
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    if let Some(seeding) = seeding {
        config.seeding = seeding;
    }

    if config.sizes.first() != Some(&2) || config.sizes.last() != Some(&1) {
        eprintln!(
            "Error: logic gates need 2 inputs and 1 output, got sizes {:?}",
            config.sizes
        );
        return ExitCode::from(2);
    }

    let mut source = VecSource::new(
        (0..ROWS)
            .map(|row| {
                let input = bit_pattern(row, 2);
                let target = if truth(row & 1 == 1, row & 2 == 2) { 1 } else { -1 };
                Sample::new(input, vec![target])
            })
            .collect(),
    );

    let mut trainer = match Trainer::new(config) {
        Ok(trainer) => trainer,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut obs = SummaryObserver::new();
    let report = match trainer.run(&mut source, &mut obs) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: training failed: {}", e);
            return ExitCode::from(2);
        }
    };
    let eval = match trainer.evaluate(&mut source, &mut obs) {
        Ok(eval) => eval,
        Err(e) => {
            eprintln!("Error: evaluation failed: {}", e);
            return ExitCode::from(2);
        }
    };

    println!(
        "{}: {} steps, {} samples, {} epochs, {}",
        task,
        report.steps,
        report.samples_seen,
        report.epochs,
        if report.stalled { "stalled" } else { "budget exhausted" }
    );
    println!(
        "  last activity {}, background {:.6}",
        report.last_activity, report.final_background
    );
    println!("  exact {:.3} over {} rows", eval.exact, eval.samples);

    let histogram = trainer.network().summarize();
    println!(
        "  weights: {} neg, {} zero, {} pos (sparsity {:.3})",
        histogram.negative,
        histogram.zero,
        histogram.positive,
        histogram.sparsity()
    );

    for row in source.samples() {
        let output = match trainer.network().output(&row.input) {
            Ok(output) => output,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        };
        let marker = if output == row.target { "+" } else { "x" };
        println!(
            "  {} {:?} -> {:?} (want {:?})",
            marker, row.input, output, row.target
        );
    }

    if verbose {
        eprintln!();
        eprint!("{}", obs.dump());
    }

    if let Some(path) = &save_path {
        if let Err(e) = trainer.network().save(path) {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
        println!("  saved to {}", path);
    }

    if eval.exact == 1.0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn parse_value<'a, T: std::str::FromStr>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<T, String> {
    let raw = value(iter, flag)?;
    raw.parse()
        .map_err(|_| format!("Invalid value for {}: {}", flag, raw))
}

fn parse_sizes(raw: &str) -> Result<Vec<usize>, String> {
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|_| format!("Invalid layer size: {}", s))
        })
        .collect()
}

fn parse_seeding(raw: &str) -> Result<Seeding, String> {
    match raw {
        "zero-weight" => Ok(Seeding::ZeroWeight),
        "zero-signal" => Ok(Seeding::ZeroSignal),
        other => Err(format!("Unknown seeding policy: {}", other)),
    }
}

fn print_help() {
    eprintln!("parliament-train - Train a ternary network on a logic gate");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    parliament-train [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --task <GATE>          and, or, xor, nand (default xor)");
    eprintln!("    --sizes <LIST>         Layer widths, e.g. 2,4,1 (must start at 2, end at 1)");
    eprintln!("    --rate <R>             Base update rate");
    eprintln!("    --background <B>       Fixed background rate instead of the decaying one");
    eprintln!("    --steps <N>            Training step budget");
    eprintln!("    --seed <N>             RNG seed");
    eprintln!("    --seeding <POLICY>     zero-signal (default) or zero-weight");
    eprintln!("    --config <FILE>        Load a JSON trainer config");
    eprintln!("    --save <FILE>          Write the trained network snapshot");
    eprintln!("    -v, --verbose          Dump observation summaries");
    eprintln!("    -h, --help             Print this help message");
    eprintln!();
    eprintln!("EXIT CODES:");
    eprintln!("    0    Every truth-table row correct");
    eprintln!("    1    Some rows still wrong");
    eprintln!("    2    Invalid arguments, config, or IO error");
}
