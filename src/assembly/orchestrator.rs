//! Strategy dispatch for assembly runs
//!
//! [`Assembler`] validates its parameters once, runs either the overlap
//! graph or the k-mer graph assembler over the reads, and summarises the
//! result.

use anyhow::Result;
use tracing::info;

use super::debruijn::KmerGraphAssembler;
use super::olc::OverlapGraphAssembler;
use crate::core::data_structures::{AssemblyResult, AssemblyStats, Read};
use crate::utils::configuration::{AssemblyParameters, AssemblyStrategy};

#[derive(Debug, Clone)]
pub struct Assembler {
    params: AssemblyParameters,
    strategy: AssemblyStrategy,
}

impl Assembler {
    /// Rejects invalid parameters before any work is done
    pub fn new(params: AssemblyParameters, strategy: AssemblyStrategy) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, strategy })
    }

    pub fn params(&self) -> &AssemblyParameters {
        &self.params
    }

    pub fn strategy(&self) -> AssemblyStrategy {
        self.strategy
    }

    pub fn assemble(&self, reads: &[Read]) -> Result<AssemblyResult> {
        let result = match self.strategy {
            AssemblyStrategy::Olc => {
                OverlapGraphAssembler::new(self.params.clone())?.assemble(reads)?
            }
            AssemblyStrategy::DeBruijn => {
                KmerGraphAssembler::new(self.params.clone())?.assemble(reads)?
            }
        };

        let stats = Self::stats(&result);
        info!(
            "📊 {} contigs, {} bp total, longest {} bp, N50 {}",
            stats.num_contigs, stats.total_length, stats.longest_contig, stats.n50
        );

        Ok(result)
    }

    pub fn stats(result: &AssemblyResult) -> AssemblyStats {
        AssemblyStats::from_contigs(&result.contigs, result.total_reads)
    }
}

/// Overlap-layout-consensus assembly with the given parameters
pub fn assemble_olc(reads: &[Read], params: &AssemblyParameters) -> Result<AssemblyResult> {
    Assembler::new(params.clone(), AssemblyStrategy::Olc)?.assemble(reads)
}

/// de Bruijn assembly with the given parameters
pub fn assemble_debruijn(reads: &[Read], params: &AssemblyParameters) -> Result<AssemblyResult> {
    Assembler::new(params.clone(), AssemblyStrategy::DeBruijn)?.assemble(reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::configuration::PipelineError;

    fn reads(sequences: &[&str]) -> Vec<Read> {
        sequences
            .iter()
            .enumerate()
            .map(|(id, s)| Read::new(id, s))
            .collect()
    }

    #[test]
    fn test_end_to_end_olc_example() {
        let reads = reads(&["ACGTACGT", "ACGTACGTTTTT", "TTTTACGTACGT"]);
        let params = AssemblyParameters::new(4, 31, 0).unwrap();
        let result = assemble_olc(&reads, &params).unwrap();

        assert_eq!(result.total_reads, 3);
        assert!(result
            .contigs
            .iter()
            .any(|c| c.length >= 12 && c.sequence.contains("ACGTACGT")));
    }

    #[test]
    fn test_strategies_agree_on_simple_tiling() {
        let genome = "ATGGCGTACCTAGTTCAGGATCCG";
        let reads = reads(&[&genome[0..12], &genome[6..18], &genome[12..24]]);
        let params = AssemblyParameters::new(5, 5, 0).unwrap();

        let olc = assemble_olc(&reads, &params).unwrap();
        let dbg = assemble_debruijn(&reads, &params).unwrap();
        assert_eq!(olc.sequences(), vec![genome]);
        assert_eq!(dbg.sequences(), vec![genome]);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let params = AssemblyParameters {
            min_overlap: 0,
            min_identity: 1.0,
            kmer_size: 4,
            min_contig_length: 0,
        };
        let error = Assembler::new(params, AssemblyStrategy::Olc).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<PipelineError>(),
            Some(PipelineError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_empty_reads() {
        let params = AssemblyParameters::new(3, 3, 0).unwrap();
        let result = assemble_debruijn(&[], &params).unwrap();
        assert!(result.is_empty());
        assert_eq!(Assembler::stats(&result), AssemblyStats::default());
    }
}
