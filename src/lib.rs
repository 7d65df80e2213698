//! # ContigForge - Sequence Assembly Engine
//!
//! Turns a materialised set of short reads into contigs and scaffolds.
//! Reads are quality trimmed and k-mer corrected, assembled either by
//! overlap-layout-consensus or over a de Bruijn graph, optionally joined
//! into scaffolds from external link hints, and summarised with N50 and
//! per-position coverage.

pub mod assembly;
pub mod core;
pub mod pipeline;
pub mod qc;
pub mod utils;

// Re-export commonly used types at crate level
pub use crate::assembly::{
    assemble_debruijn, assemble_olc, calculate_coverage, calculate_identity, calculate_stats,
    compute_consensus, find_overlap, merge_contigs, scaffold, Assembler,
};
pub use crate::core::data_structures::*;
pub use crate::pipeline::{AssemblyPipeline, PipelineOutput};
pub use crate::qc::{error_correct, quality_trim, ReadPreprocessor};
pub use crate::utils::configuration::{
    AssemblyParameters, AssemblyStrategy, PipelineConfiguration, PipelineError,
};

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_result_type() -> Result<()> {
        let success: Result<i32> = Ok(42);
        let error: Result<i32> = Err(anyhow::anyhow!("test error"));

        assert_eq!(success?, 42);
        assert!(error.unwrap_err().to_string().contains("test error"));
        Ok(())
    }

    #[test]
    fn test_validation_error_downcasts() {
        let error: Error = AssemblyParameters::new(0, 21, 0).unwrap_err().into();
        match error.downcast_ref::<PipelineError>() {
            Some(PipelineError::ValidationError { field, .. }) => {
                assert_eq!(field, "assembly.min_overlap")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_module_exports() {
        let contig = Contig::new(
            1,
            "ATCGATCG".to_string(),
            10.0,
            ContigProvenance::Reads(vec![1, 2, 3]),
        );
        assert_eq!(contig.length, 8);

        let stats = calculate_stats(&[contig.length], 3);
        assert_eq!(stats.n50, 8);
    }
}
