use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wavchunk::{DuplicatePolicy, ReaderOptions, WavReader};

/// Inspect and copy uncompressed WAVE files
#[derive(Parser, Debug)]
#[command(name = "wavchunk", version)]
struct Cli {
    /// Input file path
    input: PathBuf,

    /// Write a two-chunk copy of the input to this path
    #[arg(short, long)]
    copy: Option<PathBuf>,

    /// Print the first N samples of every channel
    #[arg(short, long, value_name = "N")]
    samples: Option<usize>,

    /// Fail on repeated chunk ids instead of keeping the last one
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            duplicate_policy: if self.strict {
                DuplicatePolicy::Reject
            } else {
                DuplicatePolicy::LastWins
            },
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Reading {}", cli.input.display());
    let file = std::fs::File::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let parsed = WavReader::with_options(file, cli.reader_options())
        .finish()
        .with_context(|| format!("failed to parse {}", cli.input.display()))?;

    println!("Chunks: {}", parsed.chunks());
    println!("{parsed}");

    if let Some(count) = cli.samples {
        let samples = parsed.samples();
        if !samples.is_decoded() {
            println!(
                "Bits per sample {} not decodable, samples are silent",
                parsed.format().bits_per_sample
            );
        }
        for (channel, values) in samples.matrix().channels().enumerate() {
            let shown = &values[..count.min(values.len())];
            println!("Channel {channel}: {shown:?}");
        }
    }

    if let Some(output) = &cli.copy {
        parsed
            .save(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("Wrote copy to {}", output.display());
    }

    Ok(())
}
