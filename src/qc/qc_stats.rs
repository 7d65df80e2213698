//! QC Statistics
//!
//! Counters accumulated while trimming and correcting reads ahead of assembly

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QCStats {
    pub reads_input: usize,
    pub reads_passed: usize,
    pub reads_discarded: usize,
    /// Reads without quality scores, passed through untouched
    pub reads_without_quality: usize,

    // Trimming stats
    pub bases_trimmed: usize,
    pub total_bases_before: usize,
    pub total_bases_after: usize,

    // Correction stats
    pub reads_corrected: usize,
    pub bases_corrected: usize,
}

impl QCStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read entering trimming
    pub fn record_input(&mut self, sequence_length: usize, has_quality: bool) {
        self.reads_input += 1;
        self.total_bases_before += sequence_length;
        if !has_quality {
            self.reads_without_quality += 1;
        }
    }

    /// Record a read that survived trimming with `trimmed_length` bases
    pub fn record_passed(&mut self, original_length: usize, trimmed_length: usize) {
        self.reads_passed += 1;
        self.bases_trimmed += original_length - trimmed_length;
        self.total_bases_after += trimmed_length;
    }

    pub fn record_discarded(&mut self, original_length: usize) {
        self.reads_discarded += 1;
        self.bases_trimmed += original_length;
    }

    pub fn record_correction(&mut self, substitutions: usize) {
        if substitutions > 0 {
            self.reads_corrected += 1;
            self.bases_corrected += substitutions;
        }
    }

    /// Fraction of input reads kept after trimming
    pub fn pass_rate(&self) -> f64 {
        if self.reads_input == 0 {
            0.0
        } else {
            self.reads_passed as f64 / self.reads_input as f64
        }
    }
}

impl fmt::Display for QCStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reads in, {} passed ({:.1}%), {} discarded, {} bases trimmed, {} bases corrected in {} reads",
            self.reads_input,
            self.reads_passed,
            self.pass_rate() * 100.0,
            self.reads_discarded,
            self.bases_trimmed,
            self.bases_corrected,
            self.reads_corrected
        )
    }
}
