//! # Column Classification
//!
//! Per-coverage correction caps and per-column homozygous fits.
//!
//! `k(cov)` is the smallest k such that the probability of more than k
//! sequencing errors among `cov` independent reads (per-read error rate
//! epsilon) is at most alpha. The values depend only on (epsilon,
//! alpha) and are precomputed once per run into a table.
//!
//! A column has a homozygous fit when flipping all of one allele's
//! entries stays within the k-bound; among feasible sides the one with
//! the smaller flip weight wins, and the surviving allele is what both
//! haplotypes take at that column.

use crate::data::column::Column;
use crate::data::cost::Cost;
use crate::data::entry::Allele;
use crate::data::{MAX_CORRECTIONS, MAX_COVERAGE};
use crate::model::binomial::BinomialTable;

/// Lookup table of per-coverage correction caps
#[derive(Clone, Debug)]
pub struct KTable {
    ks: Vec<usize>,
}

impl KTable {
    /// Precompute k(cov) for cov = 0..=MAX_COVERAGE from the cumulative
    /// binomial tail
    pub fn new(binomial: &BinomialTable, error_rate: f64, alpha: f64) -> Self {
        let mut ks = vec![0usize; MAX_COVERAGE + 1];
        for cov in 1..=MAX_COVERAGE {
            let mut k = 0usize;
            let mut cumulative = (1.0 - error_rate).powi(cov as i32);

            while !(1.0 - cumulative <= alpha) && k < cov {
                k += 1;
                cumulative += binomial.binomial(cov, k) as f64
                    * error_rate.powi(k as i32)
                    * (1.0 - error_rate).powi((cov - k) as i32);
            }

            ks[cov] = k.min(MAX_CORRECTIONS);
        }
        Self { ks }
    }

    /// Maximum permitted corrections at a column of the given coverage
    #[inline]
    pub fn k(&self, cov: usize) -> usize {
        self.ks[cov]
    }
}

/// A feasible homozygous explanation of a column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Homozygous {
    /// Number of entries flipped
    pub cost: usize,
    /// Total weight of the flipped entries
    pub weight: Cost,
    /// The allele both haplotypes take (false = 0, true = 1)
    pub allele: bool,
}

/// Derived per-column state consumed by the DP engine
#[derive(Clone, Debug)]
pub struct ColumnInfo {
    /// Number of active entries
    pub coverage: usize,
    /// k(coverage)
    pub k: usize,
    /// The homozygous fit, when one exists within the k-bound
    pub homo: Option<Homozygous>,
}

/// Classify a column: coverage, k, and the homozygous fit.
///
/// The all-minor flip (leaving allele 0) is tested first; the all-major
/// flip replaces it only when strictly lighter, so weight ties resolve
/// to the all-0 reading.
pub fn classify(column: &Column, ktable: &KTable) -> ColumnInfo {
    let mut count_major = 0usize;
    let mut weight_major = 0u32;
    let mut count_minor = 0usize;
    let mut weight_minor = 0u32;

    for entry in column.entries() {
        match entry.allele {
            Allele::Major => {
                count_major += 1;
                weight_major += entry.weight;
            }
            Allele::Minor => {
                count_minor += 1;
                weight_minor += entry.weight;
            }
        }
    }

    let coverage = column.coverage();
    let k = ktable.k(coverage);

    let mut homo = None;
    if count_minor <= k {
        homo = Some(Homozygous {
            cost: count_minor,
            weight: Cost::new(weight_minor),
            allele: false,
        });
    }
    if count_major <= k && homo.map_or(true, |h| Cost::new(weight_major) < h.weight) {
        homo = Some(Homozygous {
            cost: count_major,
            weight: Cost::new(weight_major),
            allele: true,
        });
    }

    ColumnInfo { coverage, k, homo }
}

/// Whether a column is homozygous in the raw input: one allele absent
/// among the entries carrying nonzero weight. Returns the unanimous
/// haplotype value. Used by the all-heterozygous variant to take such
/// columns out of the DP.
pub fn trivially_homozygous(column: &Column) -> Option<bool> {
    let mut saw_major = false;
    let mut saw_minor = false;
    for entry in column.entries() {
        if entry.weight == 0 {
            continue;
        }
        match entry.allele {
            Allele::Major => saw_major = true,
            Allele::Minor => saw_minor = true,
        }
    }
    match (saw_major, saw_minor) {
        (true, true) => None,
        (false, true) => Some(true),
        _ => Some(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::entry::Entry;

    fn ktable(error_rate: f64, alpha: f64) -> KTable {
        KTable::new(&BinomialTable::for_max_coverage(), error_rate, alpha)
    }

    fn column(alleles: &[(u32, u8, u32)]) -> Column {
        let mut col = Column::new();
        for &(id, allele, weight) in alleles {
            let allele = if allele == 0 { Allele::Major } else { Allele::Minor };
            col.push(Entry::new(id, allele, weight));
        }
        col
    }

    #[test]
    fn test_k_defaults() {
        // epsilon 0.05, alpha 0.01: the canonical parameterization
        let t = ktable(0.05, 0.01);
        assert_eq!(t.k(0), 0);
        assert_eq!(t.k(1), 1);
        assert_eq!(t.k(3), 1);
        assert_eq!(t.k(10), 3);
        // k grows with coverage and never exceeds it
        for cov in 1..=MAX_COVERAGE {
            assert!(t.k(cov) <= cov.min(MAX_CORRECTIONS));
            assert!(t.k(cov) >= t.k(cov - 1));
        }
    }

    #[test]
    fn test_zero_error_rate_forbids_corrections() {
        let t = ktable(0.0, 1.0);
        for cov in 0..=MAX_COVERAGE {
            assert_eq!(t.k(cov), 0);
        }
    }

    #[test]
    fn test_empty_column_is_homozygous_for_free() {
        let t = ktable(0.05, 0.01);
        let info = classify(&Column::new(), &t);
        assert_eq!(info.coverage, 0);
        assert_eq!(info.k, 0);
        let homo = info.homo.unwrap();
        assert_eq!(homo.cost, 0);
        assert_eq!(homo.weight, Cost::ZERO);
        assert!(!homo.allele);
    }

    #[test]
    fn test_homo_picks_lighter_feasible_side() {
        let t = ktable(0.05, 0.01);
        // 2 majors (weight 10) vs 1 minor (weight 3), k(3) = 1: only the
        // minor flip is feasible
        let info = classify(&column(&[(0, 0, 5), (1, 0, 5), (2, 1, 3)]), &t);
        let homo = info.homo.unwrap();
        assert_eq!(homo.cost, 1);
        assert_eq!(homo.weight, Cost::new(3));
        assert!(!homo.allele);

        // 1 major (weight 9) vs 1 minor (weight 2): both feasible, the
        // minor flip is lighter so the column reads all-0
        let info = classify(&column(&[(0, 0, 9), (1, 1, 2)]), &t);
        let homo = info.homo.unwrap();
        assert_eq!(homo.weight, Cost::new(2));
        assert!(!homo.allele);

        // reversed weights: the major flip wins and the column reads all-1
        let info = classify(&column(&[(0, 0, 2), (1, 1, 9)]), &t);
        let homo = info.homo.unwrap();
        assert_eq!(homo.weight, Cost::new(2));
        assert!(homo.allele);
    }

    #[test]
    fn test_balanced_wide_column_has_no_homo_fit() {
        let t = ktable(0.05, 0.01);
        // cov 10 split 5/5, k(10) = 3 < 5
        let entries: Vec<(u32, u8, u32)> =
            (0..10).map(|i| (i as u32, (i % 2) as u8, 1)).collect();
        let info = classify(&column(&entries), &t);
        assert!(info.homo.is_none());
    }

    #[test]
    fn test_trivially_homozygous_ignores_zero_weight() {
        assert_eq!(
            trivially_homozygous(&column(&[(0, 0, 5), (1, 0, 2)])),
            Some(false)
        );
        assert_eq!(
            trivially_homozygous(&column(&[(0, 1, 5), (1, 1, 2)])),
            Some(true)
        );
        assert_eq!(trivially_homozygous(&column(&[(0, 0, 5), (1, 1, 2)])), None);
        // the dissenting minor carries weight 0 and does not count
        assert_eq!(
            trivially_homozygous(&column(&[(0, 0, 5), (1, 1, 0)])),
            Some(false)
        );
    }
}
