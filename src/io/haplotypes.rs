//! # Haplotype Output
//!
//! Writes the two reconstructed haplotypes, one per line, over the
//! alphabet {0, 1} (plus X at ambiguous positions unless disabled).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;

/// Write the two haplotype strings to `path`
pub fn write_haplotypes(path: &Path, hap1: &str, hap2: &str) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{hap1}")?;
    writeln!(writer, "{hap2}")?;
    writer.flush()?;
    info!(path = %path.display(), length = hap1.len(), "haplotypes written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_writes_two_lines() {
        let file = NamedTempFile::new().unwrap();
        write_haplotypes(file.path(), "010X", "101X").unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "010X\n101X\n");
    }
}
