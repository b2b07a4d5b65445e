//! # Ambiguous-Position Marking
//!
//! After assembly, every fragment is re-mapped to the haplotype it is
//! closer to under weighted mismatch distance (ties go to the first
//! haplotype). Per column and per haplotype, the alleles of the mapped
//! fragments are tallied; a position whose tally is tied (including
//! positions no mapped fragment covers) is masked with `X` in that
//! haplotype's output string.

use bitvec::prelude::*;
use tracing::info;

use crate::data::fragment::Fragment;

/// Render the haplotypes as strings with ambiguous positions marked
pub fn mark(fragments: &[Fragment], hap1: &BitSlice, hap2: &BitSlice) -> (String, String) {
    let len = hap1.len();
    let mut tally1 = vec![[0u32; 2]; len];
    let mut tally2 = vec![[0u32; 2]; len];
    let mut total_mismatch = 0u64;

    for fragment in fragments {
        let mut dist1 = 0u64;
        let mut dist2 = 0u64;
        for entry in &fragment.entries {
            if entry.allele.as_bit() != hap1[entry.column] {
                dist1 += entry.weight as u64;
            }
            if entry.allele.as_bit() != hap2[entry.column] {
                dist2 += entry.weight as u64;
            }
        }

        let tally = if dist1 <= dist2 {
            total_mismatch += dist1;
            &mut tally1
        } else {
            total_mismatch += dist2;
            &mut tally2
        };
        for entry in &fragment.entries {
            tally[entry.column][entry.allele.as_bit() as usize] += 1;
        }
    }

    info!(mismatches = total_mismatch, "fragment re-mapping complete");

    (render(hap1, &tally1, 1), render(hap2, &tally2, 2))
}

fn render(hap: &BitSlice, tally: &[[u32; 2]], which: usize) -> String {
    let mut marked = 0usize;
    let out: String = hap
        .iter()
        .zip(tally)
        .map(|(bit, counts)| {
            if counts[0] == counts[1] {
                marked += 1;
                'X'
            } else if *bit {
                '1'
            } else {
                '0'
            }
        })
        .collect();
    info!(haplotype = which, marked, "ambiguous positions");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::entry::Allele;
    use crate::data::fragment::FragmentEntry;

    fn fragment(id: u32, entries: &[(usize, u8, u32)]) -> Fragment {
        Fragment {
            id,
            entries: entries
                .iter()
                .map(|&(column, allele, weight)| FragmentEntry {
                    column,
                    allele: if allele == 0 { Allele::Major } else { Allele::Minor },
                    weight,
                })
                .collect(),
        }
    }

    #[test]
    fn test_supported_positions_keep_their_allele() {
        let fragments = vec![
            fragment(0, &[(0, 0, 5), (1, 0, 5)]),
            fragment(1, &[(0, 1, 5), (1, 1, 5)]),
        ];
        let hap1 = bitvec![0, 0];
        let hap2 = bitvec![1, 1];
        let (out1, out2) = mark(&fragments, &hap1, &hap2);
        assert_eq!(out1, "00");
        assert_eq!(out2, "11");
    }

    #[test]
    fn test_uncovered_haplotype_positions_become_x() {
        // both fragments map to haplotype 1 (exact matches); haplotype 2
        // ends with no support anywhere
        let fragments = vec![
            fragment(0, &[(0, 0, 5)]),
            fragment(1, &[(1, 0, 5)]),
        ];
        let hap1 = bitvec![0, 0];
        let hap2 = bitvec![0, 0];
        let (out1, out2) = mark(&fragments, &hap1, &hap2);
        assert_eq!(out1, "00");
        assert_eq!(out2, "XX");
    }

    #[test]
    fn test_tied_tally_becomes_x() {
        // two fragments both mapping to haplotype 1, disagreeing at
        // column 0 and agreeing at column 1
        let fragments = vec![
            fragment(0, &[(0, 0, 9), (1, 0, 9)]),
            fragment(1, &[(0, 1, 1), (1, 0, 1)]),
        ];
        let hap1 = bitvec![0, 0];
        let hap2 = bitvec![1, 1];
        let (out1, out2) = mark(&fragments, &hap1, &hap2);
        assert_eq!(out1, "X0");
        assert_eq!(out2, "XX");
    }
}
