//! # Haplotype Reconstruction
//!
//! The backward walk over the tables recorded by the forward pass.
//! Starting from the last column: homozygous columns hand their
//! recorded allele to both haplotypes; a heterozygous anchor emits
//! (0,1) or (1,0) by its swap bit, fills the columns it jumped across
//! with their homozygous allele, and follows the inner backtrace until
//! a block boundary (or column 0) ends the segment.
//!
//! Column 0 is the synthetic base column, so column j writes haplotype
//! position j - 1; the result length is `num_cols - 1`.

use bitvec::prelude::*;

use crate::model::dp::DpOutcome;

/// Walk the backtrace and produce the two haplotypes
pub fn reconstruct(outcome: &DpOutcome) -> (BitVec, BitVec) {
    let len = outcome.num_cols - 1;
    let mut hap1 = bitvec![0; len];
    let mut hap2 = bitvec![0; len];

    let mut col = len;
    while col > 0 {
        while outcome.is_homozygous[col] {
            let allele = outcome.homo_allele[col];
            hap1.set(col - 1, allele);
            hap2.set(col - 1, allele);
            col -= 1;
            if col == 0 {
                return (hap1, hap2);
            }
        }

        let mut cell = outcome.best_het[col];
        loop {
            if cell.swap {
                hap1.set(col - 1, false);
                hap2.set(col - 1, true);
            } else {
                hap1.set(col - 1, true);
                hap2.set(col - 1, false);
            }

            // columns jumped across were absorbed as a homozygous run
            for _ in 0..cell.jump - 1 {
                col -= 1;
                let allele = outcome.homo_allele[col];
                hap1.set(col - 1, allele);
                hap2.set(col - 1, allele);
            }
            col -= 1;

            if cell.new_block || col == 0 {
                break;
            }
            cell = outcome
                .tables
                .get(col, cell.jump as usize, cell.index as usize);
        }
    }

    (hap1, hap2)
}
