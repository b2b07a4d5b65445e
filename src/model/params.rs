//! # Per-Run Parameter Pre-Scan
//!
//! Before a DP run starts, one pass over its column sequence fixes the
//! shapes of every fixed-size structure the engine allocates:
//!
//! - `max_l`: the look-ahead/look-behind bound. Starts from the longest
//!   fragment column span and is clamped to `max_cons_homo + 2`, where
//!   `max_cons_homo` is the longest run of consecutive columns that are
//!   homozygous-feasible and connected to the run's first column (the
//!   +2 accounts for a heterozygous anchor on each side of the run).
//! - `sum_successive_l[q]`: capacity of the prevision rows at distance
//!   q, the largest cumulative mask count any column pair at that
//!   distance can produce.
//! - `scheme[j][p]`: tight per-column backtrace row sizes, allocated up
//!   to the first homozygous-infeasible or disconnected successor.

use crate::data::column::Column;
use crate::model::binomial::BinomialTable;
use crate::model::classify::{classify, KTable};
use crate::model::intersection::active_common;

/// Structure sizes for one DP run
#[derive(Clone, Debug)]
pub struct RunParams {
    /// Number of columns, the leading synthetic empty column included
    pub num_cols: usize,
    /// Sliding-window reach; the window holds 2 * (max_l - 1) + 1 slots
    pub max_l: usize,
    /// Prevision row capacity per distance q (index 0 unused)
    pub sum_successive_l: Vec<usize>,
    /// Backtrace row sizes: scheme[j][p] masks at column j, offset p
    pub scheme: Vec<Vec<usize>>,
}

impl RunParams {
    /// Pre-scan a run's column sequence (`columns[0]` is the synthetic
    /// empty base column). `all_heterozygous` disables homozygous
    /// chaining, which collapses `max_l` to at most 2.
    pub fn scan(
        columns: &[Column],
        ktable: &KTable,
        binomial: &BinomialTable,
        all_heterozygous: bool,
    ) -> Self {
        let num_cols = columns.len();

        // longest fragment span, in columns of this run
        let mut first_seen: Vec<Option<usize>> = Vec::new();
        let mut span_l = 1usize;
        for (j, column) in columns.iter().enumerate() {
            for entry in column.entries() {
                let id = entry.read_id as usize;
                if first_seen.len() <= id {
                    first_seen.resize(id + 1, None);
                }
                match first_seen[id] {
                    None => first_seen[id] = Some(j),
                    Some(first) => span_l = span_l.max(j - first + 1),
                }
            }
        }

        let k: Vec<usize> = columns.iter().map(|c| ktable.k(c.coverage())).collect();
        let homo_ok: Vec<bool> = if all_heterozygous {
            vec![false; num_cols]
        } else {
            columns
                .iter()
                .map(|c| classify(c, ktable).homo.is_some())
                .collect()
        };

        // longest chain of homozygous-feasible successors connected to
        // their run's first column
        let mut max_cons_homo = 0usize;
        for i in 0..num_cols {
            let mut cons = 0usize;
            let mut y = 1usize;
            while y < span_l && i + y < num_cols {
                if homo_ok[i + y] && active_common(&columns[i], &columns[i + y]) != 0 {
                    cons += 1;
                } else {
                    break;
                }
                y += 1;
            }
            max_cons_homo = max_cons_homo.max(cons);
        }

        let max_l = span_l.min(max_cons_homo + 2).max(1);

        let mut sum_successive_l = vec![0usize; max_l];
        let mut scheme: Vec<Vec<usize>> = Vec::with_capacity(num_cols);
        for i in 0..num_cols {
            let mut row = vec![0usize];
            let mut open = true;
            let mut y = 1usize;
            while y < max_l && i + y < num_cols {
                let shared = active_common(&columns[i], &columns[i + y]);
                let count = binomial.cumulative(shared, k[i]) as usize;
                sum_successive_l[y] = sum_successive_l[y].max(count);

                if open {
                    row.push(count);
                    if !(homo_ok[i + y] && shared != 0) {
                        open = false;
                    }
                }
                y += 1;
            }
            scheme.push(row);
        }

        Self {
            num_cols,
            max_l,
            sum_successive_l,
            scheme,
        }
    }

    /// Window slot count for this run
    #[inline]
    pub fn window_size(&self) -> usize {
        2 * (self.max_l - 1) + 1
    }
}
