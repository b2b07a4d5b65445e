//! # Assembly Pipeline
//!
//! Orchestrates a full run:
//! 1. Parse the WIF input into fragments and the column universe
//! 2. Materialize columns (coverage cap enforced)
//! 3. Partition the columns into blocks of transitively overlapping
//!    fragment spans (or keep one block with `--unique`)
//! 4. Per block: pre-scan shapes, run the DP forward pass, reconstruct
//!    the block's haplotype segment; under `--all-heterozygous`,
//!    trivially homozygous columns bypass the DP entirely
//! 5. Concatenate the segments, optionally mark ambiguous positions,
//!    and write the two haplotype lines

use std::ops::Range;

use bitvec::prelude::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::data::column::Column;
use crate::data::cost::Cost;
use crate::data::fragment::Fragment;
use crate::error::{RapcolError, Result};
use crate::io::{haplotypes, wif};
use crate::model::backtrace::reconstruct;
use crate::model::binomial::BinomialTable;
use crate::model::classify::{trivially_homozygous, KTable};
use crate::model::dp::DpEngine;
use crate::model::params::RunParams;
use crate::pipelines::ambiguous;

/// End-to-end haplotype assembly
pub struct AssemblyPipeline {
    config: Config,
}

impl AssemblyPipeline {
    /// Create a new pipeline from a validated configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the full assembly and write the output file
    pub fn run(&self) -> Result<()> {
        let reads = wif::read_wif(&self.config.input, self.config.discard_weights)?;
        if reads.num_cols() == 0 {
            info!("input holds no variant positions");
            return haplotypes::write_haplotypes(&self.config.haplotypes, "", "");
        }

        let columns = wif::build_columns(&reads)?;
        let binomial = BinomialTable::for_max_coverage();
        let ktable = KTable::new(&binomial, self.config.error_rate, self.config.alpha);

        let blocks = if self.config.unique {
            vec![0..columns.len()]
        } else {
            split_blocks(&reads.fragments, columns.len())
        };
        info!(blocks = blocks.len(), columns = columns.len(), "assembling");

        let mut hap1 = bitvec![0; columns.len()];
        let mut hap2 = bitvec![0; columns.len()];
        let mut total_cost = Cost::ZERO;

        for block in blocks {
            debug!(start = block.start, end = block.end, "solving block");
            let (seg1, seg2, cost) =
                self.solve_block(&columns[block.clone()], block.start, &ktable, &binomial)?;
            for (offset, (b1, b2)) in seg1.iter().zip(seg2.iter()).enumerate() {
                hap1.set(block.start + offset, *b1);
                hap2.set(block.start + offset, *b2);
            }
            total_cost += cost;
        }

        info!(cost = %total_cost, "optimal correction weight");

        let (out1, out2) = if self.config.no_ambiguous {
            (render(&hap1), render(&hap2))
        } else {
            ambiguous::mark(&reads.fragments, &hap1, &hap2)
        };

        haplotypes::write_haplotypes(&self.config.haplotypes, &out1, &out2)
    }

    /// Solve one block and return its haplotype segment and cost
    fn solve_block(
        &self,
        block_columns: &[Column],
        block_start: usize,
        ktable: &KTable,
        binomial: &BinomialTable,
    ) -> Result<(BitVec, BitVec, Cost)> {
        // under --all-heterozygous, columns that are homozygous in the
        // raw input never enter the DP
        let mut kept: Vec<usize> = Vec::with_capacity(block_columns.len());
        let mut skipped: Vec<Option<bool>> = vec![None; block_columns.len()];
        for (i, column) in block_columns.iter().enumerate() {
            let trivial = if self.config.all_heterozygous {
                trivially_homozygous(column)
            } else {
                None
            };
            match trivial {
                Some(allele) => skipped[i] = Some(allele),
                None => kept.push(i),
            }
        }

        let mut dp_columns = Vec::with_capacity(kept.len() + 1);
        dp_columns.push(Column::new());
        dp_columns.extend(kept.iter().map(|&i| block_columns[i].clone()));

        let params = RunParams::scan(
            &dp_columns,
            ktable,
            binomial,
            self.config.all_heterozygous,
        );
        let engine = DpEngine::new(
            &dp_columns,
            &params,
            ktable,
            binomial,
            self.config.dp_options(),
        );
        let outcome = engine.solve().map_err(|err| match err {
            // engine columns are run-local; report the 1-based input column
            RapcolError::Infeasible {
                column,
                coverage,
                k,
            } => RapcolError::Infeasible {
                column: block_start + kept[column - 1] + 1,
                coverage,
                k,
            },
            other => other,
        })?;
        debug!(cost = %outcome.opt_cost, "block solved");

        let (dp_hap1, dp_hap2) = reconstruct(&outcome);

        let mut seg1 = bitvec![0; block_columns.len()];
        let mut seg2 = bitvec![0; block_columns.len()];
        for (dp_index, &block_index) in kept.iter().enumerate() {
            seg1.set(block_index, dp_hap1[dp_index]);
            seg2.set(block_index, dp_hap2[dp_index]);
        }
        for (block_index, allele) in skipped.iter().enumerate() {
            if let Some(allele) = *allele {
                seg1.set(block_index, allele);
                seg2.set(block_index, allele);
            }
        }

        Ok((seg1, seg2, outcome.opt_cost))
    }
}

/// Partition the column range into blocks: maximal intervals covered by
/// transitively overlapping fragment spans. Every column carries at
/// least one fragment entry, so the blocks tile the whole range.
fn split_blocks(fragments: &[Fragment], num_columns: usize) -> Vec<Range<usize>> {
    let mut spans: Vec<(usize, usize)> = fragments
        .iter()
        .map(|f| (f.first_column(), f.last_column()))
        .collect();
    spans.sort_unstable();

    let mut blocks = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for (start, end) in spans {
        match current {
            Some((cur_start, cur_end)) if start <= cur_end => {
                current = Some((cur_start, cur_end.max(end)));
            }
            Some((cur_start, cur_end)) => {
                blocks.push(cur_start..cur_end + 1);
                current = Some((start, end));
            }
            None => current = Some((start, end)),
        }
    }
    if let Some((cur_start, cur_end)) = current {
        blocks.push(cur_start..cur_end + 1);
    }

    debug_assert_eq!(
        blocks.iter().map(|b| b.len()).sum::<usize>(),
        num_columns,
        "blocks must tile the column universe"
    );
    blocks
}

fn render(hap: &BitVec) -> String {
    hap.iter().map(|b| if *b { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::entry::Allele;
    use crate::data::fragment::FragmentEntry;

    fn fragment(id: u32, columns: Range<usize>) -> Fragment {
        Fragment {
            id,
            entries: columns
                .map(|column| FragmentEntry {
                    column,
                    allele: Allele::Major,
                    weight: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_overlapping_spans_merge_into_one_block() {
        let fragments = vec![fragment(0, 0..3), fragment(1, 2..5), fragment(2, 4..6)];
        assert_eq!(split_blocks(&fragments, 6), vec![0..6]);
    }

    #[test]
    fn test_disjoint_spans_split() {
        let fragments = vec![fragment(0, 0..2), fragment(1, 2..4)];
        assert_eq!(split_blocks(&fragments, 4), vec![0..2, 2..4]);
    }

    #[test]
    fn test_touching_spans_stay_together() {
        // fragment 1 starts on fragment 0's last column
        let fragments = vec![fragment(0, 0..3), fragment(1, 2..4)];
        assert_eq!(split_blocks(&fragments, 4), vec![0..4]);
    }
}
