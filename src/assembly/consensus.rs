//! Column-wise majority consensus over aligned fragments
//!
//! Gap symbols take no part in the vote. Ties go to the smallest byte, so the
//! result does not depend on fragment order.

use crate::core::data_structures::GAP;

/// Tally for one alignment column
pub struct ConsensusBuilder {
    counts: [u32; 256],
    depth: u32,
}

impl Default for ConsensusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusBuilder {
    pub fn new() -> Self {
        Self {
            counts: [0; 256],
            depth: 0,
        }
    }

    /// Count one base; gaps are ignored
    #[inline]
    pub fn add(&mut self, base: u8) {
        if base == GAP {
            return;
        }
        self.counts[base.to_ascii_uppercase() as usize] += 1;
        self.depth += 1;
    }

    /// Non-gap bases seen in this column
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Most frequent base, `None` when the column held only gaps
    pub fn winner(&self) -> Option<u8> {
        let mut best: Option<(u8, u32)> = None;
        for (base, &count) in self.counts.iter().enumerate() {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((base as u8, count));
            }
        }
        best.map(|(base, _)| base)
    }

    pub fn reset(&mut self) {
        self.counts = [0; 256];
        self.depth = 0;
    }
}

/// Majority consensus of column-aligned reads.
///
/// Reads may be ragged; a read only votes in columns it reaches. Columns with
/// no non-gap base produce no output character.
pub fn compute_consensus<S: AsRef<str>>(aligned_reads: &[S]) -> String {
    let width = aligned_reads
        .iter()
        .map(|r| r.as_ref().len())
        .max()
        .unwrap_or(0);

    let mut consensus = String::with_capacity(width);
    let mut column = ConsensusBuilder::new();

    for i in 0..width {
        column.reset();
        for read in aligned_reads {
            if let Some(&base) = read.as_ref().as_bytes().get(i) {
                column.add(base);
            }
        }
        if let Some(base) = column.winner() {
            consensus.push(base as char);
        }
    }

    consensus
}

/// Consensus over reads placed at column offsets, `width` columns wide.
///
/// Every column yields exactly one character; a column with no votes becomes
/// `N`, so positions stay aligned with the layout.
pub fn layout_consensus(placements: &[(usize, &str)], width: usize) -> String {
    let mut consensus = String::with_capacity(width);
    let mut column = ConsensusBuilder::new();

    for i in 0..width {
        column.reset();
        for &(offset, sequence) in placements {
            if i >= offset {
                if let Some(&base) = sequence.as_bytes().get(i - offset) {
                    column.add(base);
                }
            }
        }
        consensus.push(column.winner().unwrap_or(b'N') as char);
    }

    consensus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_reads() {
        let reads = vec!["ACGTACGT"; 5];
        assert_eq!(compute_consensus(&reads), "ACGTACGT");
    }

    #[test]
    fn test_majority_vote() {
        let reads = ["ACGT", "ACCT", "ACGT"];
        assert_eq!(compute_consensus(&reads), "ACGT");
    }

    #[test]
    fn test_ties_prefer_smallest_base() {
        assert_eq!(compute_consensus(&["T", "A"]), "A");
        assert_eq!(compute_consensus(&["A", "T"]), "A");
        assert_eq!(compute_consensus(&["G", "C", "G", "C"]), "C");
    }

    #[test]
    fn test_gaps_do_not_vote() {
        // Two gaps would outvote one base if they were counted
        let reads = ["A-G", "--G", "--G", "ACG"];
        assert_eq!(compute_consensus(&reads), "ACG");
        assert!(!compute_consensus(&["--", "-T"]).contains('-'));
        assert_eq!(compute_consensus(&["--", "-T"]), "T");
    }

    #[test]
    fn test_ragged_input() {
        let reads = ["ACGTAA", "AC", "ACGT"];
        assert_eq!(compute_consensus(&reads), "ACGTAA");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(compute_consensus(&["acgt", "ACGT"]), "ACGT");
    }

    #[test]
    fn test_empty_input() {
        let empty: [&str; 0] = [];
        assert_eq!(compute_consensus(&empty), "");
    }

    #[test]
    fn test_layout_consensus() {
        let placements = [(0, "ACGTAC"), (4, "ACGG"), (4, "ACTG"), (4, "ACGG")];
        assert_eq!(layout_consensus(&placements, 8), "ACGTACGG");
        assert_eq!(layout_consensus(&[(2, "AC")], 4), "NNAC");
    }
}
