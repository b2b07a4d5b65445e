//! # Column-Wise Dynamic Programming Engine
//!
//! The forward pass of the wMEC solver. Columns are processed strictly
//! left to right through a sliding window of `2 * (max_l - 1) + 1`
//! slots; all per-slot state (the column itself, its k, its homozygous
//! fit, the intersections with every other slot) is rewritten in place
//! as the window advances.
//!
//! For every column j the engine considers the homozygous explanation
//! (when the column fits one within its k-bound) and every correction
//! mask of popcount <= k_j whose corrected column is genuinely
//! heterozygous. Mask costs `D[j, M]` combine three sources:
//!
//! - a prevision written by an earlier column q whose projected mask
//!   agrees with M on the shared reads (same haplotype labeling),
//! - the same with the complemented projection (swapped labeling),
//! - `OPT[j - q]` when a new block starts behind j.
//!
//! Runs of homozygous-feasible columns between q and j are absorbed as
//! a summed `cumulative_homo` rather than as separate DP states. After
//! `D[j, M]` is settled, the engine writes previsions for the columns
//! ahead of j and records the backtrace cell that produced the minimum.
//!
//! Costs saturate at `Cost::INFTY`; a column where neither branch
//! produces a finite cost aborts the run as infeasible.

use bitvec::prelude::*;
use tracing::{debug, info, trace};

use crate::data::column::Column;
use crate::data::cost::Cost;
use crate::data::mask::Mask;
use crate::error::{RapcolError, Result};
use crate::model::balanced::BalancedCombinations;
use crate::model::binomial::BinomialTable;
use crate::model::classify::{classify, KTable};
use crate::model::combinations::Combinations;
use crate::model::intersection::{active_common, Intersection};
use crate::model::params::RunParams;

/// Mask sources for the heterozygous branch
enum MaskEnumerator {
    Standard(Combinations),
    Balanced(BalancedCombinations),
}

impl Iterator for MaskEnumerator {
    type Item = Mask;

    #[inline]
    fn next(&mut self) -> Option<Mask> {
        match self {
            MaskEnumerator::Standard(it) => it.next(),
            MaskEnumerator::Balanced(it) => it.next(),
        }
    }
}

/// Engine behavior switches
#[derive(Clone, Copy, Debug, Default)]
pub struct DpOptions {
    /// Disable homozygous transitions entirely
    pub all_heterozygous: bool,
    /// Enumerate only balance-preserving masks (requires all_heterozygous)
    pub balance_ratio: Option<f64>,
}

/// One backtrace record: how the best cost reaching a column was formed
#[derive(Clone, Copy, Debug, Default)]
pub struct BtCell {
    /// Distance to the predecessor column (0 = unset)
    pub jump: u32,
    /// Rank of the projected mask consulted at the predecessor
    pub index: u32,
    /// Which haplotype labeling was chosen at this anchor
    pub swap: bool,
    /// Whether this anchor starts a new block
    pub new_block: bool,
}

/// Backtrace cells for every column, shaped by the pre-scanned scheme
#[derive(Debug)]
pub struct BacktraceTables {
    cells: Vec<Vec<Vec<BtCell>>>,
}

impl BacktraceTables {
    fn new(scheme: &[Vec<usize>]) -> Self {
        let cells = scheme
            .iter()
            .map(|row| row.iter().map(|&n| vec![BtCell::default(); n]).collect())
            .collect();
        Self { cells }
    }

    /// Cell for column `col`, offset `p`, mask rank `index`
    #[inline]
    pub fn get(&self, col: usize, p: usize, index: usize) -> BtCell {
        self.cells[col][p][index]
    }

    #[inline]
    fn set(&mut self, col: usize, p: usize, index: usize, cell: BtCell) {
        self.cells[col][p][index] = cell;
    }
}

/// Result of a forward pass, sufficient to reconstruct the haplotypes
#[derive(Debug)]
pub struct DpOutcome {
    /// Optimal total correction weight over the run
    pub opt_cost: Cost,
    /// Number of columns, synthetic base column included
    pub num_cols: usize,
    /// Per-column backtrace cells, indexed by (column, offset, rank)
    pub tables: BacktraceTables,
    /// Whether OPT chose the homozygous branch at each column
    pub is_homozygous: BitVec,
    /// The haplotype value a homozygous explanation assigns per column
    pub homo_allele: BitVec,
    /// The best heterozygous anchor recorded at each column
    pub best_het: Vec<BtCell>,
}

/// The sliding-window DP engine for one run
pub struct DpEngine<'a> {
    columns: &'a [Column],
    params: &'a RunParams,
    ktable: &'a KTable,
    binomial: &'a BinomialTable,
    options: DpOptions,

    // window rings, one entry per slot
    window: Vec<Column>,
    k_j: Vec<usize>,
    homo_cost: Vec<usize>,
    homo_weight: Vec<Cost>,
    head: usize,

    // intersections of the current column with the slots ahead/behind
    succ: Vec<Intersection>,
    pred: Vec<Intersection>,

    // prevision ring: [dest slot][distance q][mask rank]
    prevision: Vec<Vec<Vec<Cost>>>,
    prevision_head: usize,

    // OPT ring (max_l + 1 entries, so OPT[j - max_l] stays reachable)
    opt: Vec<Cost>,
    opt_head: usize,

    // persistent, column-indexed
    tables: BacktraceTables,
    is_homozygous: BitVec,
    homo_allele: BitVec,
    best_het: Vec<BtCell>,
}

/// Sentinel for "no homozygous fit" in the window rings
const NO_HOMO: usize = usize::MAX;

impl<'a> DpEngine<'a> {
    /// Set up the engine for a column sequence (`columns[0]` must be the
    /// synthetic empty base column) whose shapes were pre-scanned into
    /// `params`
    pub fn new(
        columns: &'a [Column],
        params: &'a RunParams,
        ktable: &'a KTable,
        binomial: &'a BinomialTable,
        options: DpOptions,
    ) -> Self {
        let win_size = params.window_size();
        let max_l = params.max_l;
        let num_cols = params.num_cols;

        let prevision = (0..max_l)
            .map(|_| {
                (0..max_l)
                    .map(|q| vec![Cost::INFTY; params.sum_successive_l[q]])
                    .collect()
            })
            .collect();

        Self {
            columns,
            params,
            ktable,
            binomial,
            options,
            window: vec![Column::new(); win_size],
            k_j: vec![0; win_size],
            homo_cost: vec![NO_HOMO; win_size],
            homo_weight: vec![Cost::INFTY; win_size],
            head: 0,
            succ: vec![Intersection::empty(); max_l],
            pred: vec![Intersection::empty(); max_l],
            prevision,
            prevision_head: 0,
            opt: vec![Cost::INFTY; max_l + 1],
            opt_head: 0,
            tables: BacktraceTables::new(&params.scheme),
            is_homozygous: bitvec![0; num_cols],
            homo_allele: bitvec![0; num_cols],
            best_het: vec![BtCell::default(); num_cols],
        }
    }

    #[inline]
    fn slot_ahead(&self, d: usize) -> usize {
        (self.head + d) % self.window.len()
    }

    #[inline]
    fn slot_behind(&self, d: usize) -> usize {
        (self.head + self.window.len() - d) % self.window.len()
    }

    #[inline]
    fn opt_behind(&self, d: usize) -> Cost {
        let len = self.opt.len();
        self.opt[(self.opt_head + len - d) % len]
    }

    /// Whether a homozygous run may pass through the column in `slot`
    #[inline]
    fn chainable(&self, slot: usize) -> bool {
        !self.options.all_heterozygous && self.homo_cost[slot] != NO_HOMO
    }

    /// Write a column and its derived state into a window slot,
    /// recording its homozygous allele under its absolute index
    fn insert(&mut self, slot: usize, col_index: usize) {
        let column = self
            .columns
            .get(col_index)
            .cloned()
            .unwrap_or_default();
        let info = classify(&column, self.ktable);

        self.k_j[slot] = info.k;
        match info.homo {
            Some(h) => {
                self.homo_cost[slot] = h.cost;
                self.homo_weight[slot] = h.weight;
                if col_index < self.params.num_cols {
                    self.homo_allele.set(col_index, h.allele);
                }
            }
            None => {
                self.homo_cost[slot] = NO_HOMO;
                self.homo_weight[slot] = Cost::INFTY;
            }
        }
        self.window[slot] = column;
    }

    /// Recompute the intersections of the current column with every
    /// other slot; past the first empty one, the rest are marked empty
    fn update_indexers(&mut self) {
        let max_l = self.params.max_l;
        for q in 1..max_l {
            let slot = self.slot_ahead(q);
            self.succ[q] = Intersection::compute(&self.window[self.head], &self.window[slot]);
            if self.succ[q].is_empty() {
                for p in q + 1..max_l {
                    self.succ[p].clear();
                }
                break;
            }
        }
        for q in 1..max_l {
            let slot = self.slot_behind(q);
            self.pred[q] = Intersection::compute(&self.window[self.head], &self.window[slot]);
            if self.pred[q].is_empty() {
                for p in q + 1..max_l {
                    self.pred[p].clear();
                }
                break;
            }
        }
    }

    /// The row that just became the farthest look-ahead destination is
    /// reset to INFTY, up to each writer column's cumulative mask count
    fn refresh_prevision_row(&mut self) {
        let max_l = self.params.max_l;
        let dest_row = (self.prevision_head + max_l - 1) % max_l;
        let dest_slot = self.slot_ahead(max_l - 1);

        for q in 1..max_l {
            let src_slot = self.slot_ahead(max_l - 1 - q);
            let shared = active_common(&self.window[src_slot], &self.window[dest_slot]);
            let count = self.binomial.cumulative(shared, self.k_j[src_slot]) as usize;
            self.prevision[dest_row][q][..count].fill(Cost::INFTY);
        }
    }

    /// Run the forward pass
    pub fn solve(mut self) -> Result<DpOutcome> {
        let max_l = self.params.max_l;
        let num_cols = self.params.num_cols;

        // place the base column and the first max_l - 1 real columns
        for l in 0..max_l {
            let slot = self.slot_ahead(l);
            self.insert(slot, l);
        }

        // base case: the empty column costs nothing
        self.opt[self.opt_head] = Cost::ZERO;
        debug!(step = 0, opt = %Cost::ZERO, "base case committed");

        for step in 1..num_cols {
            self.head = (self.head + 1) % self.window.len();
            let far_slot = self.slot_ahead(max_l - 1);
            self.insert(far_slot, step + max_l - 1);

            self.update_indexers();

            self.prevision_head = (self.prevision_head + 1) % max_l;
            self.refresh_prevision_row();

            self.opt_head = (self.opt_head + 1) % self.opt.len();
            self.opt[self.opt_head] = Cost::INFTY;

            let feasible = self.process_column(step);
            if !feasible {
                let column = &self.window[self.head];
                return Err(RapcolError::Infeasible {
                    column: step,
                    coverage: column.coverage(),
                    k: self.k_j[self.head],
                });
            }

            if step % 500 == 0 {
                info!(step, opt = %self.opt[self.opt_head], "progress");
            } else {
                debug!(step, opt = %self.opt[self.opt_head], "column committed");
            }
        }

        Ok(DpOutcome {
            opt_cost: self.opt[self.opt_head],
            num_cols,
            tables: self.tables,
            is_homozygous: self.is_homozygous,
            homo_allele: self.homo_allele,
            best_het: self.best_het,
        })
    }

    /// Evaluate both branches for the column at the window head.
    /// Returns whether any finite explanation was found.
    fn process_column(&mut self, step: usize) -> bool {
        let max_l = self.params.max_l;
        let cur = self.window[self.head].clone();
        let cov_j = cur.coverage();
        let k = self.k_j[self.head];
        let col_bits = cur.as_mask();
        let mut feasible = false;

        debug!(
            step,
            column = %col_bits.to_bit_string(cov_j),
            cov = cov_j,
            k,
            "evaluating column"
        );

        // homozygous branch first: OPT ties resolve in its favor
        if self.chainable(self.head) {
            let candidate = self.homo_weight[self.head] + self.opt_behind(1);
            if candidate < self.opt[self.opt_head] {
                self.opt[self.opt_head] = candidate;
                self.is_homozygous.set(step, true);
                feasible = true;
                debug!(step, cost = %candidate, "homozygous explanation");
            }
        }

        let enumerator = match self.options.balance_ratio {
            Some(ratio) => MaskEnumerator::Balanced(BalancedCombinations::new(
                cov_j, k, col_bits, ratio,
            )),
            None => MaskEnumerator::Standard(Combinations::cumulative(cov_j, k)),
        };

        let mut best_het_cost = Cost::INFTY;
        for mask in enumerator {
            let corrected = col_bits ^ mask;
            if !corrected.any() || corrected.count() == cov_j {
                continue;
            }
            trace!(mask = %mask.to_bit_string(cov_j), "mask");

            let weight_mask = Cost::new(cur.mask_weight(mask));
            let mut current_cost = Cost::INFTY;
            let mut cell = BtCell::default();

            // look-behind: consume previsions over homozygous-feasible runs
            let mut q = 1usize;
            let mut cumulative_homo = Cost::ZERO;
            let mut run_feasible = true;
            loop {
                if q > 1 {
                    run_feasible = self.chainable(self.slot_behind(q - 1));
                }
                if q >= max_l || self.pred[q].is_empty() || !run_feasible {
                    break;
                }

                let q_slot = self.slot_behind(q);
                let shared = self.pred[q].len();
                let transferred = self.pred[q].transfer(&cur, &self.window[q_slot], mask);

                for (mask_qj, swapped) in
                    [(transferred, false), (transferred.complement(shared), true)]
                {
                    if mask_qj.count() > self.k_j[q_slot] {
                        continue;
                    }
                    let index = self.binomial.cumulative_rank(mask_qj, shared) as usize;
                    let candidate = self.prevision[self.prevision_head][q][index]
                        + weight_mask
                        + cumulative_homo;
                    if candidate < current_cost {
                        current_cost = candidate;
                        feasible = true;
                        let inherited = self.tables.get(step - q, q, index);
                        cell = BtCell {
                            jump: q as u32,
                            index: index as u32,
                            swap: inherited.swap ^ swapped,
                            new_block: false,
                        };
                    }
                }

                q += 1;
                cumulative_homo += self.homo_weight[self.slot_behind(q - 1)];
            }

            // a new block may start where the look-behind ended
            if run_feasible {
                let candidate = self.opt_behind(q) + weight_mask + cumulative_homo;
                if candidate < current_cost {
                    current_cost = candidate;
                    feasible = true;
                    cell = BtCell {
                        jump: q as u32,
                        index: 0,
                        swap: false,
                        new_block: true,
                    };
                }
            }

            // previsions for the columns ahead: project this mask onto
            // the reads shared with each of them
            let mut p = 1usize;
            let mut forward_feasible = true;
            loop {
                if p > 1 {
                    forward_feasible = self.chainable(self.slot_ahead(p - 1));
                }
                if p >= max_l || self.succ[p].is_empty() || !forward_feasible {
                    break;
                }

                let projected = self.succ[p].project(mask);
                let shared = self.succ[p].len();
                let index = self.binomial.cumulative_rank(projected, shared) as usize;
                let dest_row = (self.prevision_head + p) % max_l;
                if current_cost < self.prevision[dest_row][p][index] {
                    self.prevision[dest_row][p][index] = current_cost;
                    self.tables.set(step, p, index, cell);
                }
                p += 1;
            }

            if current_cost < best_het_cost {
                best_het_cost = current_cost;
                self.best_het[step] = cell;
            }
            if current_cost < self.opt[self.opt_head] {
                self.opt[self.opt_head] = current_cost;
                self.is_homozygous.set(step, false);
                debug!(
                    step,
                    cost = %current_cost,
                    mask = %mask.to_bit_string(cov_j),
                    "heterozygous explanation"
                );
            }
        }

        feasible
    }
}
