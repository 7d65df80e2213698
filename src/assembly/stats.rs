//! Assembly summary metrics and per-position read coverage

use rayon::prelude::*;
use tracing::debug;

use crate::assembly::overlap::identity_at_least;
use crate::core::data_structures::{gc_content, AssemblyStats, Contig, CoverageProfile};
use crate::utils::configuration::PipelineError;

/// Length at which `numerator/denominator` of the total is reached when
/// walking `sorted_desc`, plus how many contigs it took.
fn nx(sorted_desc: &[usize], total: usize, numerator: usize, denominator: usize) -> (usize, usize) {
    let mut cumulative = 0usize;
    for (index, &length) in sorted_desc.iter().enumerate() {
        cumulative += length;
        if cumulative * denominator >= total * numerator {
            return (length, index + 1);
        }
    }
    (0, 0)
}

/// Length summary of a contig set. Empty input yields all-zero statistics.
pub fn calculate_stats(contig_lengths: &[usize], total_reads: usize) -> AssemblyStats {
    let mut lengths = contig_lengths.to_vec();
    lengths.sort_unstable_by(|a, b| b.cmp(a));

    let total_length: usize = lengths.iter().sum();
    if total_length == 0 {
        return AssemblyStats {
            total_reads,
            num_contigs: lengths.len(),
            ..AssemblyStats::default()
        };
    }

    let (n50, l50) = nx(&lengths, total_length, 1, 2);
    let (n90, _) = nx(&lengths, total_length, 9, 10);

    AssemblyStats {
        total_reads,
        num_contigs: lengths.len(),
        total_length,
        longest_contig: lengths[0],
        n50,
        n90,
        l50,
        gc_content: 0.0,
        mean_coverage: 0.0,
    }
}

impl AssemblyStats {
    /// Length statistics plus base composition and mean contig coverage
    pub fn from_contigs(contigs: &[Contig], total_reads: usize) -> Self {
        let lengths: Vec<usize> = contigs.iter().map(|c| c.length).collect();
        let mut stats = calculate_stats(&lengths, total_reads);
        if contigs.is_empty() {
            return stats;
        }

        let joined: String = contigs.iter().map(|c| c.sequence.as_str()).collect();
        stats.gc_content = gc_content(&joined);
        stats.mean_coverage =
            contigs.iter().map(|c| c.coverage).sum::<f64>() / contigs.len() as f64;
        stats
    }
}

/// Where a read landed on the reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadAlignment {
    pub ref_start: usize,
    pub ref_end: usize,
    pub read_start: usize,
    pub identity: f64,
}

impl ReadAlignment {
    pub fn span(&self) -> usize {
        self.ref_end - self.ref_start
    }
}

/// Ungapped read placement against a reference.
///
/// A read may sit inside the reference, hang off either end, or contain it
/// entirely. Among placements with at least `min_overlap` aligned bases and
/// identity at or above `min_identity`, the longest wins, then the most
/// identical, then the leftmost.
#[derive(Debug, Clone, Copy)]
pub struct CoverageCalculator {
    min_overlap: usize,
    min_identity: f64,
}

impl CoverageCalculator {
    pub fn new(min_overlap: usize, min_identity: f64) -> Result<Self, PipelineError> {
        if min_overlap < 1 {
            return Err(PipelineError::invalid("min_overlap", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&min_identity) {
            return Err(PipelineError::invalid(
                "min_identity",
                format!("must be within [0, 1], got {min_identity}"),
            ));
        }
        Ok(Self {
            min_overlap,
            min_identity,
        })
    }

    pub fn align(&self, reference: &str, read: &str) -> Option<ReadAlignment> {
        let reference = reference.as_bytes();
        let read = read.as_bytes();
        let (n, m) = (reference.len() as isize, read.len() as isize);
        let min_overlap = self.min_overlap as isize;
        if n < min_overlap || m < min_overlap {
            return None;
        }

        let mut best: Option<ReadAlignment> = None;
        for offset in -(m - min_overlap)..=(n - min_overlap) {
            let ref_start = offset.max(0) as usize;
            let ref_end = (offset + m).min(n) as usize;
            let span = ref_end - ref_start;
            if span < self.min_overlap {
                continue;
            }
            if let Some(current) = &best {
                if span < current.span() {
                    continue;
                }
            }

            let read_start = (ref_start as isize - offset) as usize;
            let Some(identity) = identity_at_least(
                &reference[ref_start..ref_end],
                &read[read_start..read_start + span],
                self.min_identity,
            ) else {
                continue;
            };

            let better = match &best {
                None => true,
                Some(current) => {
                    span > current.span() || (span == current.span() && identity > current.identity)
                }
            };
            if better {
                best = Some(ReadAlignment {
                    ref_start,
                    ref_end,
                    read_start,
                    identity,
                });
            }
        }
        best
    }

    /// Depth of aligned reads at every reference position
    pub fn calculate<S: AsRef<str> + Sync>(&self, reference: &str, reads: &[S]) -> CoverageProfile {
        let alignments: Vec<ReadAlignment> = reads
            .par_iter()
            .filter_map(|read| self.align(reference, read.as_ref()))
            .collect();

        let mut profile = CoverageProfile::zeroed(reference.len());
        for alignment in &alignments {
            for depth in &mut profile.depth[alignment.ref_start..alignment.ref_end] {
                *depth += 1;
            }
        }

        debug!(
            "Placed {} of {} reads on a {} bp reference",
            alignments.len(),
            reads.len(),
            reference.len()
        );
        profile
    }
}

/// Exact-match coverage of `reference` by `reads`
pub fn calculate_coverage<S: AsRef<str> + Sync>(
    reference: &str,
    reads: &[S],
    min_overlap: usize,
) -> CoverageProfile {
    let calculator = CoverageCalculator {
        min_overlap: min_overlap.max(1),
        min_identity: 1.0,
    };
    calculator.calculate(reference, reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_structures::ContigProvenance;

    #[test]
    fn test_n50_worked_example() {
        let stats = calculate_stats(&[14, 10, 5], 7);
        assert_eq!(stats.total_length, 29);
        assert_eq!(stats.longest_contig, 14);
        assert_eq!(stats.n50, 10);
        assert_eq!(stats.l50, 2);
        assert_eq!(stats.n90, 5);
        assert_eq!(stats.num_contigs, 3);
        assert_eq!(stats.total_reads, 7);
    }

    #[test]
    fn test_n50_order_independent() {
        assert_eq!(calculate_stats(&[5, 14, 10], 0).n50, 10);
        assert_eq!(calculate_stats(&[100], 0).n50, 100);
        assert_eq!(calculate_stats(&[10, 10], 0).n50, 10);
    }

    #[test]
    fn test_empty_stats() {
        let stats = calculate_stats(&[], 0);
        assert_eq!(stats, AssemblyStats::default());
    }

    #[test]
    fn test_from_contigs() {
        let contigs = vec![
            Contig::new(0, "GGCC".to_string(), 2.0, ContigProvenance::Reads(vec![0])),
            Contig::new(1, "AATT".to_string(), 4.0, ContigProvenance::Reads(vec![1])),
        ];
        let stats = AssemblyStats::from_contigs(&contigs, 2);
        assert_eq!(stats.total_length, 8);
        assert!((stats.gc_content - 0.5).abs() < 1e-9);
        assert!((stats.mean_coverage - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_interior_and_overhangs() {
        let reference = "AACCGGTTACGT";
        // interior, hanging off the right end, hanging off the left end, absent
        let reads = ["CCGGTT", "TTACGTGG", "GGAACC", "TTTTTT"];
        let profile = calculate_coverage(reference, &reads, 4);
        assert_eq!(profile.len(), reference.len());
        assert_eq!(profile.depth, vec![1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 1, 1]);
    }

    #[test]
    fn test_coverage_short_inputs() {
        let profile = calculate_coverage("ACGT", &["ACGT"], 5);
        assert_eq!(profile.depth, vec![0, 0, 0, 0]);

        let profile = calculate_coverage::<&str>("", &[], 3);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_read_longer_than_reference() {
        let profile = calculate_coverage("CGTA", &["AACGTAGG"], 3);
        assert_eq!(profile.depth, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_identity_tolerant_alignment() {
        let calculator = CoverageCalculator::new(6, 0.8).unwrap();
        let alignment = calculator.align("AAAACCGGTTAAAA", "CCGATT").unwrap();
        assert_eq!((alignment.ref_start, alignment.ref_end), (4, 10));
        assert!((alignment.identity - 5.0 / 6.0).abs() < 1e-9);
        assert!(CoverageCalculator::new(0, 1.0).is_err());
    }
}
