//! Thin CLI front-end over the library: positional input/output, `--mode`,
//! `--validate`, `--threads`, and four exit codes. Everything else
//! (help theming, shell completions, config files, progress bars) is out
//! of scope.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use turbojson::error::{Error, ErrorHandler, Strategy, SEVERITY_WARNING};
use turbojson::{capability, tokenizer, ProcessingMode};

#[derive(Parser, Debug)]
#[command(name = "turbojson", about = "A three-mode JSON minifier")]
struct Cli {
    /// Input file, or "-" for stdin
    input: String,

    /// Output file, or "-" for stdout
    #[arg(default_value = "-")]
    output: String,

    /// eco | sport | turbo
    #[arg(long, default_value = "sport")]
    mode: String,

    /// Validate only; no output is written on success
    #[arg(long)]
    validate: bool,

    /// Worker count for turbo mode, 0 = auto
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_INVALID_JSON: u8 = 1;
const EXIT_FILE_NOT_FOUND: u8 = 2;
const EXIT_OTHER: u8 = 3;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(EXIT_OTHER)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let mode: ProcessingMode = cli
        .mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let input = match read_input(&cli.input) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            eprintln!("file not found: {}", cli.input);
            return Ok(EXIT_FILE_NOT_FOUND);
        }
        Err(err) => return Err(err.into()),
    };

    if cli.validate {
        return Ok(validate(&input));
    }

    let result = if cli.threads > 0 && mode == ProcessingMode::Turbo {
        turbo_with_threads(&input, cli.threads)
    } else {
        turbojson::minify(&input, mode)
    };

    match result {
        Ok(output) => {
            write_output(&cli.output, &output)?;
            Ok(EXIT_SUCCESS)
        }
        Err(Error::Invalid(ctx)) => {
            eprintln!("{ctx}");
            Ok(EXIT_INVALID_JSON)
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(EXIT_OTHER)
        }
    }
}

fn turbo_with_threads(input: &[u8], threads: usize) -> Result<Vec<u8>, Error> {
    let caps = capability::detect_capabilities();
    let topology = turbojson::topology::detect_numa();
    turbojson::modes::turbo::run(input, caps, &topology, threads)
}

/// `--validate`: run the tokenizer to completion and report every fault,
/// emitting no output on success.
fn validate(input: &[u8]) -> u8 {
    let mut handler = ErrorHandler::new(Strategy::SkipAndContinue, usize::MAX, SEVERITY_WARNING);
    match tokenizer::tokenize_all(input, tokenizer::DEFAULT_MAX_DEPTH, &mut handler) {
        Ok(_) => {
            let report = handler.accumulator().report();
            if report.total == 0 {
                EXIT_SUCCESS
            } else {
                for entry in handler.accumulator().entries() {
                    eprintln!("{entry}");
                }
                EXIT_INVALID_JSON
            }
        }
        Err(err) => {
            eprintln!("{err}");
            EXIT_INVALID_JSON
        }
    }
}

fn read_input(path: &str) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if path == "-" {
        io::stdin().read_to_end(&mut buf)?;
    } else {
        File::open(path)?.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn write_output(path: &str, bytes: &[u8]) -> io::Result<()> {
    if path == "-" {
        io::stdout().write_all(bytes)
    } else {
        File::create(path)?.write_all(bytes)
    }
}
