//! End-to-end assembly run
//!
//! Preprocess reads, assemble them with the configured strategy, scaffold
//! the contigs with any supplied links, then summarise. Every stage works on
//! fully materialised in-memory data.

use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::assembly::orchestrator::Assembler;
use crate::assembly::scaffold::ContigScaffolder;
use crate::core::data_structures::{AssemblyResult, AssemblyStats, Read, Scaffold, ScaffoldLink};
use crate::qc::{QCStats, ReadPreprocessor};
use crate::utils::configuration::{ConfigurationManager, PipelineConfiguration};

/// Everything a pipeline run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub result: AssemblyResult,
    pub scaffolds: Vec<Scaffold>,
    pub stats: AssemblyStats,
    pub qc_stats: QCStats,
}

pub struct AssemblyPipeline {
    config: PipelineConfiguration,
    assembler: Assembler,
    scaffolder: ContigScaffolder,
}

impl AssemblyPipeline {
    pub fn new(config: PipelineConfiguration) -> Result<Self> {
        config.validate()?;
        let assembler = Assembler::new(config.assembly.clone(), config.strategy)?;
        let scaffolder = ContigScaffolder::new(config.gap_char);

        Ok(Self {
            config,
            assembler,
            scaffolder,
        })
    }

    pub fn from_manager(manager: ConfigurationManager) -> Result<Self> {
        Self::new(manager.into_config())
    }

    pub fn config(&self) -> &PipelineConfiguration {
        &self.config
    }

    /// Run every stage over `reads`. `links` index into the contigs this run
    /// produces.
    #[instrument(skip_all, fields(reads = reads.len(), links = links.len()))]
    pub fn run(&self, reads: &[Read], links: &[ScaffoldLink]) -> Result<PipelineOutput> {
        let start = Instant::now();
        info!(
            "🚀 Starting {:?} pipeline on {} reads",
            self.config.strategy,
            reads.len()
        );

        let mut preprocessor = ReadPreprocessor::new(&self.config.preprocessing)?;
        let processed = preprocessor.process(reads);
        info!(
            "🧹 Preprocessing kept {} of {} reads",
            processed.len(),
            reads.len()
        );

        let mut result = self.assembler.assemble(&processed)?;
        // Report against the raw read count, not the post-filter count
        result.total_reads = reads.len();

        let scaffolds = self.scaffolder.scaffold_contigs(&result.contigs, links);
        let stats = Assembler::stats(&result);

        info!(
            "✅ Pipeline finished in {:.2?}: {} contigs, {} scaffolds",
            start.elapsed(),
            result.contigs.len(),
            scaffolds.len()
        );

        Ok(PipelineOutput {
            result,
            scaffolds,
            stats,
            qc_stats: preprocessor.stats().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::configuration::{
        AssemblyParameters, AssemblyStrategy, QualityTrimConfig,
    };

    fn config(strategy: AssemblyStrategy) -> PipelineConfiguration {
        let mut config = PipelineConfiguration::new(AssemblyParameters::new(4, 4, 0).unwrap());
        config.strategy = strategy;
        config
    }

    #[test]
    fn test_run_without_preprocessing() {
        let pipeline = AssemblyPipeline::new(config(AssemblyStrategy::Olc)).unwrap();
        let reads = vec![
            Read::new(0, "ACGTACGT"),
            Read::new(1, "ACGTACGTTTTT"),
            Read::new(2, "TTTTACGTACGT"),
        ];
        let output = pipeline.run(&reads, &[]).unwrap();

        assert_eq!(output.result.total_reads, 3);
        assert_eq!(output.scaffolds.len(), output.result.contigs.len());
        assert_eq!(output.stats.total_length, output.result.total_length);
        assert_eq!(output.qc_stats, QCStats::default());
    }

    #[test]
    fn test_trimming_feeds_assembly() {
        let mut config = config(AssemblyStrategy::DeBruijn);
        config.preprocessing.quality_trim = Some(QualityTrimConfig::new(20, 6));
        let pipeline = AssemblyPipeline::new(config).unwrap();

        let reads = vec![
            Read::with_quality(0, "GGACGTTAGC", b"!!IIIIIIII").unwrap(),
            Read::with_quality(1, "ACG", b"!!!").unwrap(),
        ];
        let output = pipeline.run(&reads, &[]).unwrap();

        assert_eq!(output.result.sequences(), vec!["ACGTTAGC"]);
        assert_eq!(output.result.total_reads, 2);
        assert_eq!(output.qc_stats.reads_discarded, 1);
        // Two bases trimmed from the first read plus the whole discarded read
        assert_eq!(output.qc_stats.bases_trimmed, 5);
    }

    #[test]
    fn test_invalid_gap_char() {
        let mut config = config(AssemblyStrategy::Olc);
        config.gap_char = ' ';
        assert!(AssemblyPipeline::new(config).is_err());
    }
}
