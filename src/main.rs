use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rdjson::{parse_with, ParseOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Parse a JSON file and print the resulting value.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Accept any JSON value as the document root instead of only an object.
    #[arg(long)]
    any_root: bool,

    /// Decode escape sequences such as `\n` and `\uXXXX` inside strings.
    #[arg(long)]
    decode_escapes: bool,

    /// Maximum nesting of objects and arrays.
    #[arg(long, value_name = "N", default_value_t = rdjson::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Path to the JSON file to parse.
    file: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let input = match fs::read_to_string(&args.file) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("Error reading {}: {err}", args.file.display());
            return ExitCode::FAILURE;
        }
    };
    debug!(path = %args.file.display(), bytes = input.len(), "read input");

    let options = ParseOptions::default()
        .with_any_root(args.any_root)
        .with_decode_escapes(args.decode_escapes)
        .with_max_depth(Some(args.max_depth));

    match parse_with(&input, &options) {
        Ok(value) => {
            println!("{value:#?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error parsing JSON: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
