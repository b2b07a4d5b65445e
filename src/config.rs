//! # Configuration Logic
//!
//! CLI argument parsing and validation using clap derive.

use clap::Parser;
use std::path::PathBuf;

use crate::error::{RapcolError, Result};
use crate::model::dp::DpOptions;

/// rapcol: fast and memory-efficient haplotype assembly from long reads
#[derive(Parser, Debug, Clone)]
#[command(name = "rapcol")]
#[command(version = "0.1.0")]
#[command(about = "Fast and memory-efficient haplotype assembly from long reads", long_about = None)]
pub struct Config {
    /// File containing the input reads (in WIF format; .gz accepted)
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: PathBuf,

    /// File where the computed haplotypes will be written to
    #[arg(short = 'o', long, value_name = "FILE")]
    pub haplotypes: PathBuf,

    /// Discard weights (treat every observation as weight 1)
    #[arg(short = 'u', long)]
    pub discard_weights: bool,

    /// Do not mark ambiguous positions with Xs
    #[arg(short = 'x', long)]
    pub no_ambiguous: bool,

    /// Read error rate
    #[arg(short = 'e', long, default_value_t = 0.05, value_name = "RATE")]
    pub error_rate: f64,

    /// Significance of the per-column correction bound (smaller is stricter)
    #[arg(short = 'a', long, default_value_t = 0.01, value_name = "ALPHA")]
    pub alpha: f64,

    /// Disable homozygous transitions; every assembled column is
    /// heterozygous and input-homozygous columns bypass the solver
    #[arg(short = 'A', long)]
    pub all_heterozygous: bool,

    /// Process the input as a single block, even across coverage gaps
    #[arg(short = 'U', long)]
    pub unique: bool,

    /// Only consider corrections that keep at least this fraction of a
    /// column's reads on each haplotype (requires --all-heterozygous)
    #[arg(short = 'b', long, value_name = "RATIO")]
    pub balance_ratio: Option<f64>,
}

impl Config {
    /// Parse command line arguments and validate
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(RapcolError::config(format!(
                "input file not found: {:?}",
                self.input
            )));
        }

        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(RapcolError::config(
                "error-rate must be a value between 0.0 and 1.0",
            ));
        }

        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(RapcolError::config(
                "alpha must be a value between 0.0 and 1.0",
            ));
        }

        if let Some(ratio) = self.balance_ratio {
            if !(0.0..=0.5).contains(&ratio) {
                return Err(RapcolError::config(
                    "balance-ratio must be a value between 0.0 and 0.5",
                ));
            }
            if !self.all_heterozygous {
                return Err(RapcolError::config(
                    "balance-ratio requires --all-heterozygous",
                ));
            }
        }

        if self.haplotypes.is_dir() {
            return Err(RapcolError::config(format!(
                "'haplotypes' parameter cannot be a directory: {:?}",
                self.haplotypes
            )));
        }

        Ok(())
    }

    /// The engine switches implied by this configuration
    pub fn dp_options(&self) -> DpOptions {
        DpOptions {
            all_heterozygous: self.all_heterozygous,
            balance_ratio: self.balance_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(input: PathBuf) -> Config {
        Config {
            input,
            haplotypes: PathBuf::from("out.txt"),
            discard_weights: false,
            no_ambiguous: false,
            error_rate: 0.05,
            alpha: 0.01,
            all_heterozygous: false,
            unique: false,
            balance_ratio: None,
        }
    }

    fn existing_input() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn test_defaults_validate() {
        let input = existing_input();
        assert!(config(input.path().to_path_buf()).validate().is_ok());
    }

    #[test]
    fn test_out_of_range_parameters_rejected() {
        let input = existing_input();
        let mut c = config(input.path().to_path_buf());
        c.error_rate = 1.5;
        assert!(matches!(c.validate(), Err(RapcolError::Config { .. })));

        let mut c = config(input.path().to_path_buf());
        c.alpha = -0.1;
        assert!(matches!(c.validate(), Err(RapcolError::Config { .. })));

        let mut c = config(input.path().to_path_buf());
        c.all_heterozygous = true;
        c.balance_ratio = Some(0.7);
        assert!(matches!(c.validate(), Err(RapcolError::Config { .. })));
    }

    #[test]
    fn test_balance_ratio_requires_all_heterozygous() {
        let input = existing_input();
        let mut c = config(input.path().to_path_buf());
        c.balance_ratio = Some(0.3);
        assert!(matches!(c.validate(), Err(RapcolError::Config { .. })));

        c.all_heterozygous = true;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_missing_input_rejected() {
        let c = config(PathBuf::from("/does/not/exist.wif"));
        assert!(matches!(c.validate(), Err(RapcolError::Config { .. })));
    }
}
