//! # WIF Input Parsing
//!
//! One read per line. Each line is a sequence of entries separated by
//! `:` tokens, closed by a `#` token and the read's mapping-quality
//! trailer:
//!
//! ```text
//! 60 A 1 32 : 61 C 0 30 : -- : 63 T 1 22 : # 27 : u
//! ```
//!
//! An entry is `<position> <nucleotide> <allele> <phred>` with allele
//! in {0, 1}; `--` marks a gap between entries of the same read. After
//! `#` come one or two integer mapping qualities (single- vs
//! paired-end), a `:`, and one or two `u` markers. The variant column
//! universe is the sorted set of distinct entry positions.
//!
//! Gzipped inputs (`.gz`) are decoded transparently.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::info;

use crate::data::column::Column;
use crate::data::entry::{Allele, Entry};
use crate::data::fragment::{Fragment, FragmentEntry};
use crate::data::MAX_COVERAGE;
use crate::error::{RapcolError, Result};

/// Parsed input: the column universe and all fragments, with entry
/// positions resolved to column indices
#[derive(Clone, Debug)]
pub struct WifReads {
    /// Sorted distinct variant positions (1-based, as in the input)
    pub positions: Vec<u32>,
    /// One fragment per input line, id = line order
    pub fragments: Vec<Fragment>,
}

impl WifReads {
    /// Number of variant columns
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.positions.len()
    }
}

/// A raw parsed entry, before positions are mapped to columns
struct RawEntry {
    position: u32,
    allele: Allele,
    weight: u32,
}

/// Read and parse a WIF file. `discard_weights` replaces every phred
/// score with 1.
pub fn read_wif(path: &Path, discard_weights: bool) -> Result<WifReads> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let reader = BufReader::new(reader);

    let mut raw: Vec<Vec<RawEntry>> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        raw.push(parse_line(&line, idx + 1, discard_weights)?);
    }

    let mut positions: Vec<u32> = raw
        .iter()
        .flat_map(|entries| entries.iter().map(|e| e.position))
        .collect();
    positions.sort_unstable();
    positions.dedup();

    let index: HashMap<u32, usize> = positions
        .iter()
        .enumerate()
        .map(|(i, &p)| (p, i))
        .collect();

    let fragments = raw
        .into_iter()
        .enumerate()
        .map(|(id, entries)| Fragment {
            id: id as u32,
            entries: entries
                .into_iter()
                .map(|e| FragmentEntry {
                    column: index[&e.position],
                    allele: e.allele,
                    weight: e.weight,
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    info!(
        reads = fragments.len(),
        columns = positions.len(),
        "input parsed"
    );

    Ok(WifReads {
        positions,
        fragments,
    })
}

/// Parse one read line into its entries
fn parse_line(line: &str, line_no: usize, discard_weights: bool) -> Result<Vec<RawEntry>> {
    let mut tokens = line.split_whitespace();
    let mut entries: Vec<RawEntry> = Vec::new();

    let expect_separator = |tok: Option<&str>| -> Result<()> {
        match tok {
            Some(":") => Ok(()),
            _ => Err(RapcolError::parse(line_no, "expected ':' separator")),
        }
    };

    loop {
        match tokens.next() {
            None => return Err(RapcolError::parse(line_no, "line has no terminator")),
            Some("#") => break,
            Some("--") => {
                expect_separator(tokens.next())?;
            }
            Some(pos_token) => {
                let position: u32 = pos_token.parse().map_err(|_| {
                    RapcolError::parse(line_no, format!("malformed position '{pos_token}'"))
                })?;
                if let Some(last) = entries.last() {
                    if position <= last.position {
                        return Err(RapcolError::parse(
                            line_no,
                            "entry positions must be strictly increasing",
                        ));
                    }
                }

                tokens
                    .next()
                    .ok_or_else(|| RapcolError::parse(line_no, "missing nucleotide field"))?;

                let allele = match tokens.next() {
                    Some("0") => Allele::Major,
                    Some("1") => Allele::Minor,
                    _ => {
                        return Err(RapcolError::parse(
                            line_no,
                            "allele must be equal to 0 or 1",
                        ))
                    }
                };

                let weight: u32 = match tokens.next() {
                    Some(tok) => tok.parse().map_err(|_| {
                        RapcolError::parse(line_no, format!("malformed phred score '{tok}'"))
                    })?,
                    None => return Err(RapcolError::parse(line_no, "missing phred score")),
                };

                entries.push(RawEntry {
                    position,
                    allele,
                    weight: if discard_weights { 1 } else { weight },
                });
                expect_separator(tokens.next())?;
            }
        }
    }

    if entries.is_empty() {
        return Err(RapcolError::parse(line_no, "read has no entries"));
    }

    // mapping-quality trailer: one or two integers, ':', matching 'u's
    let first_mapq = tokens
        .next()
        .ok_or_else(|| RapcolError::parse(line_no, "missing mapping quality"))?;
    first_mapq
        .parse::<u32>()
        .map_err(|_| RapcolError::parse(line_no, "malformed mapping quality"))?;

    let paired = match tokens.next() {
        Some(":") => false,
        Some(tok) => {
            tok.parse::<u32>()
                .map_err(|_| RapcolError::parse(line_no, "malformed mapping quality"))?;
            expect_separator(tokens.next())?;
            true
        }
        None => return Err(RapcolError::parse(line_no, "truncated trailer")),
    };

    let u_count = if paired { 2 } else { 1 };
    for _ in 0..u_count {
        match tokens.next() {
            Some("u") => {}
            _ => return Err(RapcolError::parse(line_no, "malformed trailer")),
        }
    }
    if tokens.next().is_some() {
        return Err(RapcolError::parse(line_no, "trailing tokens after trailer"));
    }

    Ok(entries)
}

/// Materialize every column of the universe from the fragments,
/// enforcing the coverage cap
pub fn build_columns(reads: &WifReads) -> Result<Vec<Column>> {
    let mut columns = vec![Column::new(); reads.num_cols()];
    for fragment in &reads.fragments {
        for entry in &fragment.entries {
            let column = &mut columns[entry.column];
            if column.coverage() == MAX_COVERAGE {
                return Err(RapcolError::Capacity {
                    column: entry.column + 1,
                    coverage: column.coverage() + 1,
                    limit: MAX_COVERAGE,
                });
            }
            column.push(Entry::new(fragment.id, entry.allele, entry.weight));
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_wif(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parses_single_end_read() {
        let file = write_wif("60 A 1 32 : 61 C 0 30 : # 27 : u\n");
        let reads = read_wif(file.path(), false).unwrap();
        assert_eq!(reads.positions, vec![60, 61]);
        assert_eq!(reads.fragments.len(), 1);
        let frag = &reads.fragments[0];
        assert_eq!(frag.entries.len(), 2);
        assert_eq!(frag.entries[0].column, 0);
        assert_eq!(frag.entries[0].allele, Allele::Minor);
        assert_eq!(frag.entries[0].weight, 32);
        assert_eq!(frag.entries[1].column, 1);
        assert_eq!(frag.entries[1].allele, Allele::Major);
    }

    #[test]
    fn test_parses_paired_end_read_with_gap() {
        let file = write_wif("10 A 0 5 : -- : 30 T 1 7 : # 27 37 : u u\n");
        let reads = read_wif(file.path(), false).unwrap();
        let frag = &reads.fragments[0];
        assert_eq!(reads.positions, vec![10, 30]);
        assert_eq!(frag.entries.len(), 2);
        assert_eq!(frag.span(), 2);
    }

    #[test]
    fn test_discard_weights_sets_all_to_one() {
        let file = write_wif("10 A 0 5 : 11 T 1 7 : # 27 : u\n");
        let reads = read_wif(file.path(), true).unwrap();
        assert!(reads.fragments[0].entries.iter().all(|e| e.weight == 1));
    }

    #[test]
    fn test_positions_are_sorted_across_reads() {
        let file = write_wif(
            "50 A 0 5 : 60 T 1 7 : # 27 : u\n\
             10 C 1 2 : 50 G 0 3 : # 30 : u\n",
        );
        let reads = read_wif(file.path(), false).unwrap();
        assert_eq!(reads.positions, vec![10, 50, 60]);
        // the second read's entries resolve through the shared universe
        assert_eq!(reads.fragments[1].entries[0].column, 0);
        assert_eq!(reads.fragments[1].entries[1].column, 1);
    }

    #[test]
    fn test_missing_terminator_is_rejected() {
        let file = write_wif("60 A 1 32 : 61 C 0 30\n");
        match read_wif(file.path(), false) {
            Err(RapcolError::Parse { line: 1, .. }) => {}
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_bad_allele_is_rejected() {
        let file = write_wif("60 A 2 32 : # 27 : u\n");
        match read_wif(file.path(), false) {
            Err(RapcolError::Parse { line: 1, message }) => {
                assert!(message.contains("allele"));
            }
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_columns_sorted_by_read_id_with_capacity_check() {
        let file = write_wif(
            "10 A 0 5 : 11 T 1 7 : # 27 : u\n\
             10 C 1 2 : # 30 : u\n",
        );
        let reads = read_wif(file.path(), false).unwrap();
        let columns = build_columns(&reads).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].coverage(), 2);
        assert_eq!(columns[0].entry(0).read_id, 0);
        assert_eq!(columns[0].entry(1).read_id, 1);
        assert_eq!(columns[1].coverage(), 1);
    }

    #[test]
    fn test_coverage_overflow_is_a_capacity_error() {
        let mut content = String::new();
        for _ in 0..(MAX_COVERAGE + 1) {
            content.push_str("10 A 0 5 : # 27 : u\n");
        }
        let file = write_wif(&content);
        let reads = read_wif(file.path(), false).unwrap();
        match build_columns(&reads) {
            Err(RapcolError::Capacity {
                column: 1,
                coverage,
                limit,
            }) => {
                assert_eq!(coverage, MAX_COVERAGE + 1);
                assert_eq!(limit, MAX_COVERAGE);
            }
            other => panic!("expected capacity error, got {:?}", other.map(|_| ())),
        }
    }
}
