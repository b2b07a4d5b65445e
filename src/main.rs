//! # rapcol: Haplotype Assembly From Long Reads
//!
//! ## Usage
//! ```bash
//! # Weighted assembly with ambiguous-position marking
//! rapcol -i reads.wif -o haplotypes.txt
//!
//! # Unweighted, custom significance
//! rapcol -i reads.wif -o haplotypes.txt -u -e 0.03 -a 0.05
//!
//! # All-heterozygous variant with balanced corrections
//! rapcol -i reads.wif -o haplotypes.txt -A -b 0.25
//! ```

use std::time::Instant;

use tracing::info;

use rapcol::{AssemblyPipeline, Config, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber: stderr, `RUST_LOG`-controlled,
/// `info` by default
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let start = Instant::now();

    init_logging();
    let config = Config::parse_and_validate()?;

    info!("rapcol v0.1.0");
    info!(input = %config.input.display(), "reads");
    info!(output = %config.haplotypes.display(), "haplotypes");
    info!(
        error_rate = config.error_rate,
        alpha = config.alpha,
        discard_weights = config.discard_weights,
        all_heterozygous = config.all_heterozygous,
        unique = config.unique,
        balance_ratio = config.balance_ratio,
        "parameters"
    );

    let pipeline = AssemblyPipeline::new(config);
    pipeline.run()?;

    info!(elapsed_s = start.elapsed().as_secs_f64(), "done");
    Ok(())
}
