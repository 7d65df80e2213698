//! Suffix/prefix overlap detection between reads
//!
//! Overlaps are found by trying every length from the longest possible down
//! to the minimum and keeping the first that meets the identity threshold,
//! so the reported overlap is always the longest qualifying one.

use rayon::prelude::*;
use tracing::debug;

use crate::core::data_structures::{Overlap, Read, SequenceOverlap};
use crate::utils::configuration::{AssemblyParameters, PipelineError};

/// Fraction of equal positions between two equal-length sequences.
///
/// Two empty sequences are identical (1.0); sequences of different length
/// score 0.0 rather than being length-normalised. Comparison ignores case.
pub fn calculate_identity(seq_a: &str, seq_b: &str) -> f64 {
    if seq_a.len() != seq_b.len() {
        return 0.0;
    }
    if seq_a.is_empty() {
        return 1.0;
    }

    let matches = seq_a
        .bytes()
        .zip(seq_b.bytes())
        .filter(|(a, b)| a.eq_ignore_ascii_case(b))
        .count();

    matches as f64 / seq_a.len() as f64
}

/// Identity of two equal-length windows if it reaches `min_identity`.
/// Stops counting once too many mismatches have been seen.
pub(crate) fn identity_at_least(a: &[u8], b: &[u8], min_identity: f64) -> Option<f64> {
    debug_assert_eq!(a.len(), b.len());
    let length = a.len();
    if length == 0 {
        return Some(1.0);
    }

    let mismatch_budget = (1.0 - min_identity) * length as f64 + 1e-9;
    let mut mismatches = 0usize;
    for (x, y) in a.iter().zip(b) {
        if !x.eq_ignore_ascii_case(y) {
            mismatches += 1;
            if mismatches as f64 > mismatch_budget {
                return None;
            }
        }
    }

    let identity = (length - mismatches) as f64 / length as f64;
    (identity >= min_identity).then_some(identity)
}

#[derive(Debug, Clone, Copy)]
pub struct OverlapDetector {
    min_overlap: usize,
    min_identity: f64,
}

impl OverlapDetector {
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

    /// Detector for already-validated parameters
    pub fn from_parameters(params: &AssemblyParameters) -> Self {
        Self {
            min_overlap: params.min_overlap,
            min_identity: params.min_identity,
        }
    }

    pub fn min_overlap(&self) -> usize {
        self.min_overlap
    }

    pub fn min_identity(&self) -> f64 {
        self.min_identity
    }

    /// Longest suffix of `seq_a` matching a prefix of `seq_b`
    pub fn find_overlap(&self, seq_a: &str, seq_b: &str) -> Option<SequenceOverlap> {
        let a = seq_a.as_bytes();
        let b = seq_b.as_bytes();
        let longest = a.len().min(b.len());
        if longest < self.min_overlap {
            return None;
        }

        (self.min_overlap..=longest).rev().find_map(|length| {
            identity_at_least(&a[a.len() - length..], &b[..length], self.min_identity)
                .map(|identity| SequenceOverlap { length, identity })
        })
    }

    /// Best overlap for every ordered pair of distinct reads.
    ///
    /// `from`/`to` index into `reads`. Pairs are evaluated in parallel; the
    /// result is sorted by `(from, to)` so it never depends on scheduling.
    pub fn find_all_overlaps(&self, reads: &[Read]) -> Vec<Overlap> {
        let n = reads.len();
        let mut overlaps: Vec<Overlap> = (0..n)
            .into_par_iter()
            .flat_map_iter(|from| {
                (0..n).filter(move |&to| to != from).filter_map(move |to| {
                    self.find_overlap(&reads[from].sequence, &reads[to].sequence)
                        .map(|hit| Overlap {
                            from,
                            to,
                            length: hit.length,
                            identity: hit.identity,
                        })
                })
            })
            .collect();

        overlaps.sort_by_key(|o| (o.from, o.to));
        debug!("Found {} overlaps among {} reads", overlaps.len(), n);
        overlaps
    }
}

/// Longest qualifying suffix/prefix overlap. `min_overlap` below 1 is treated as 1.
pub fn find_overlap(
    seq_a: &str,
    seq_b: &str,
    min_overlap: usize,
    min_identity: f64,
) -> Option<SequenceOverlap> {
    OverlapDetector {
        min_overlap: min_overlap.max(1),
        min_identity,
    }
    .find_overlap(seq_a, seq_b)
}
