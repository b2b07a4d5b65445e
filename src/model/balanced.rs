//! # Balance-Constrained Combination Enumeration
//!
//! Alternative mask enumerator for the all-heterozygous variant: only
//! masks whose application leaves *both* haplotype sides with at least
//! `ceil(n * ratio)` supporting reads are emitted. The column indices
//! are partitioned into 0-positions and 1-positions; for every split
//! `t = i + j` of the correction budget the cross-product of size-`i`
//! masks over the 0-positions and size-`j` masks over the 1-positions
//! is listed, subject to the balance threshold.
//!
//! Unlike [`Combinations`], the emission order here does not coincide
//! with cumulative ranks; ranks are always recomputed from the mask.

use crate::data::mask::Mask;
use crate::model::combinations::Combinations;

/// Iterator over balance-preserving correction masks
#[derive(Clone, Debug)]
pub struct BalancedCombinations {
    k: usize,
    /// Number of 0-positions / 1-positions in the column
    p0: usize,
    p1: usize,
    /// Minimum number of reads each corrected side must keep
    c_min: usize,
    /// Column index of each 0-position / 1-position
    map0: Vec<usize>,
    map1: Vec<usize>,
    /// Size-indexed caches of exact-size sub-combinations
    cache0: Vec<Option<Vec<Mask>>>,
    cache1: Vec<Option<Vec<Mask>>>,
    /// Enumeration counters: total size, 0-side size, cross-product cursors
    t: usize,
    i: usize,
    ii: usize,
    jj: usize,
}

impl BalancedCombinations {
    /// Set up enumeration for a column of `n` bits (`col` = minor-allele
    /// bits), a correction cap `k` and a balance ratio in [0, 0.5]
    pub fn new(n: usize, k: usize, col: Mask, ratio: f64) -> Self {
        let mut map0 = Vec::new();
        let mut map1 = Vec::new();
        for idx in 0..n {
            if col.test(idx) {
                map1.push(idx);
            } else {
                map0.push(idx);
            }
        }

        let p0 = map0.len();
        let p1 = map1.len();

        Self {
            k,
            p0,
            p1,
            c_min: (n as f64 * ratio).ceil() as usize,
            map0,
            map1,
            cache0: vec![None; p0 + 1],
            cache1: vec![None; p1 + 1],
            t: 0,
            i: 0,
            ii: 0,
            jj: 0,
        }
    }

    /// A mask flipping `i` zeros and `j` ones keeps both sides above the
    /// balance threshold
    fn balanced(&self, i: usize, j: usize) -> bool {
        let t = self.t;
        self.p0 - i + self.p1.min(t - i) >= self.c_min
            && self.p1 - j + self.p0.min(t - j) >= self.c_min
    }

    /// Compose the full-column mask from the two partition-local masks
    fn compose(&self, m0: Mask, m1: Mask) -> Mask {
        let mut mask = Mask::EMPTY;
        for pos in m0.ones() {
            mask.set(self.map0[pos]);
        }
        for pos in m1.ones() {
            mask.set(self.map1[pos]);
        }
        mask
    }
}

impl Iterator for BalancedCombinations {
    type Item = Mask;

    fn next(&mut self) -> Option<Mask> {
        loop {
            if self.t > self.k {
                return None;
            }
            if self.i > self.p0.min(self.t) {
                self.t += 1;
                self.i = 0;
                continue;
            }

            let j = self.t - self.i;
            if j > self.p1 || !self.balanced(self.i, j) {
                self.i += 1;
                self.ii = 0;
                self.jj = 0;
                continue;
            }

            let i = self.i;
            let p0 = self.p0;
            let p1 = self.p1;
            let c0 = self.cache0[i].get_or_insert_with(|| Combinations::exact(p0, i).collect());
            if self.ii >= c0.len() {
                self.i += 1;
                self.ii = 0;
                self.jj = 0;
                continue;
            }
            let m0 = c0[self.ii];

            let c1 = self.cache1[j].get_or_insert_with(|| Combinations::exact(p1, j).collect());
            if self.jj >= c1.len() {
                self.ii += 1;
                self.jj = 0;
                continue;
            }
            let m1 = c1[self.jj];
            self.jj += 1;

            return Some(self.compose(m0, m1));
        }
    }
}
