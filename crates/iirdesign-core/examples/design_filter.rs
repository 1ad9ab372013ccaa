//! Design an IIR filter and print the report
//!
//! Run interactively (answers are read from stdin):
//!
//!     cargo run --example design_filter -p iirdesign-core
//!
//! or design a preset from the loaded configuration:
//!
//!     cargo run --example design_filter -p iirdesign-core -- anti_alias --json
//!
//! Kind codes: 1 Butterworth, 2 Chebyshev, 3 elliptic.
//! Topology codes: 1 low pass, 2 band pass, 3 high pass, 4 band stop.
//! For elliptic filters the last prompt takes either a stop band edge in Hz
//! (positive) or a stop band attenuation in dB (negative).

use iirdesign_core::logging::init_logging;
use iirdesign_core::prelude::*;
use iirdesign_core::DesignConfig;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let preset = args.iter().find(|a| !a.starts_with("--"));

    let config = match DesignConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    let req = match preset {
        Some(name) => match config.preset(name) {
            Ok(req) => req.clone(),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => match prompt_requirements() {
            Ok(Some(req)) => req,
            Ok(None) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Invalid specification: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    match design_iir_filter(&req) {
        Ok(design) if json => match serde_json::to_string_pretty(&design) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("failed to encode design: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Ok(design) => print!("{}", design),
        Err(DesignError::Configuration(msg)) => {
            eprintln!("Invalid specification: {}", msg);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// Ask for the requirements one value at a time; `None` on end of input.
fn prompt_requirements() -> Result<Option<FilterRequirements>, DesignError> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut read_value = |name: &str| -> Option<f64> {
        print!("{} ? ", name);
        io::stdout().flush().ok()?;
        let line = lines.next()?.ok()?;
        // Unparsable input counts as zero
        Some(line.trim().parse().unwrap_or(0.0))
    };

    macro_rules! ask {
        ($name:expr) => {
            match read_value($name) {
                Some(v) => v,
                None => return Ok(None),
            }
        };
    }

    let kind = FilterKind::try_from(ask!("kind") as u32)?;
    let topology = FilterTopology::try_from(ask!("type") as u32)?;
    let order = ask!("order").max(0.0) as usize;

    let mut builder = FilterRequirements::builder()
        .kind(kind)
        .topology(topology)
        .order(order);
    if kind.uses_ripple() {
        builder = builder.passband_ripple_db(ask!("passband_ripple_db"));
    }
    builder = builder
        .sampling_frequency(ask!("sampling_frequency"))
        .passband_edge(ask!("passband_edge"));
    if topology.is_band() {
        builder = builder.passband_edge2(ask!("passband_edge2"));
    }
    if kind == FilterKind::Elliptic {
        let value = ask!("stopband_edge or stopband_db");
        builder = if value > 0.0 {
            builder.stopband_edge(value)
        } else {
            builder.stopband_db(value)
        };
    }
    println!();

    Ok(Some(builder.build()))
}
