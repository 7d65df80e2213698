//! Read Preprocessing Module
//!
//! Prepares raw reads for assembly:
//! - Quality-based end trimming
//! - Length filtering
//! - k-mer spectrum error correction
//! - QC statistics

pub mod error_correction;
pub mod qc_stats;
pub mod quality_filter;

pub use error_correction::{error_correct, ErrorCorrector, KmerFrequencyTable};
pub use qc_stats::QCStats;
pub use quality_filter::{quality_trim, QualityStats, QualityTrimmer};

use crate::core::data_structures::Read;
use crate::utils::configuration::{PipelineError, PreprocessingConfig};

/// Runs the configured trimming and correction steps in order
pub struct ReadPreprocessor {
    trimmer: Option<QualityTrimmer>,
    corrector: Option<ErrorCorrector>,
    stats: QCStats,
}

impl ReadPreprocessor {
    pub fn new(config: &PreprocessingConfig) -> Result<Self, PipelineError> {
        let corrector = match config.error_correction {
            Some(ref correction) => Some(ErrorCorrector::new(correction.clone())?),
            None => None,
        };

        Ok(Self {
            trimmer: config.quality_trim.clone().map(QualityTrimmer::new),
            corrector,
            stats: QCStats::new(),
        })
    }

    /// Trim, then correct. Produces new reads; the input is untouched.
    pub fn process(&mut self, reads: &[Read]) -> Vec<Read> {
        let trimmed = match self.trimmer {
            Some(ref trimmer) => trimmer.trim_reads_with_stats(reads, &mut self.stats),
            None => reads.to_vec(),
        };

        match self.corrector {
            Some(ref corrector) => corrector
                .correct_detailed(&trimmed)
                .into_iter()
                .map(|read| {
                    self.stats.record_correction(read.corrections.len());
                    read.into_read()
                })
                .collect(),
            None => trimmed,
        }
    }

    pub fn stats(&self) -> &QCStats {
        &self.stats
    }
}
