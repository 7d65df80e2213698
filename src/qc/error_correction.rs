//! k-mer spectrum error correction
//!
//! Every k-mer of every read is counted; a k-mer seen fewer than
//! `min_kmer_frequency` times is treated as carrying a sequencing error and is
//! replaced by its most frequent single-substitution neighbour, provided that
//! neighbour is itself solid. Substitutions never change read length.

use ahash::AHashMap;
use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::data_structures::{BaseCorrection, CorrectedRead, Read};
use crate::utils::configuration::{ErrorCorrectionConfig, PipelineError};

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// k-mer counts over one read set. Built per correction call and borrowed from
/// the reads it was counted over.
pub struct KmerFrequencyTable<'a> {
    k: usize,
    counts: AHashMap<&'a [u8], u32>,
}

impl<'a> KmerFrequencyTable<'a> {
    pub fn build(reads: &'a [Read], k: usize) -> Self {
        let counts = reads
            .par_iter()
            .fold(AHashMap::new, |mut counts: AHashMap<&'a [u8], u32>, read| {
                let bases = read.sequence.as_bytes();
                if k > 0 && bases.len() >= k {
                    for kmer in bases.windows(k) {
                        *counts.entry(kmer).or_insert(0) += 1;
                    }
                }
                counts
            })
            .reduce(AHashMap::new, |mut left, right| {
                for (kmer, count) in right {
                    *left.entry(kmer).or_insert(0) += count;
                }
                left
            });

        Self { k, counts }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn count(&self, kmer: &[u8]) -> u32 {
        self.counts.get(kmer).copied().unwrap_or(0)
    }

    /// Number of distinct k-mers
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

pub struct ErrorCorrector {
    config: ErrorCorrectionConfig,
}

impl ErrorCorrector {
    pub fn new(config: ErrorCorrectionConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ErrorCorrectionConfig {
        &self.config
    }

    /// Correct every read and keep a record of each substitution
    pub fn correct_detailed(&self, reads: &[Read]) -> Vec<CorrectedRead> {
        let table = KmerFrequencyTable::build(reads, self.config.kmer_size);
        debug!(
            "Counted {} distinct {}-mers over {} reads",
            table.len(),
            table.k(),
            reads.len()
        );

        let corrected: Vec<CorrectedRead> = reads
            .par_iter()
            .map(|read| self.correct_read(read, &table))
            .collect();

        let modified = corrected.iter().filter(|r| r.is_modified()).count();
        let substitutions: usize = corrected.iter().map(|r| r.corrections.len()).sum();
        info!(
            "Error correction: {} substitutions across {} of {} reads",
            substitutions,
            modified,
            reads.len()
        );

        corrected
    }

    pub fn correct_reads(&self, reads: &[Read]) -> Vec<Read> {
        self.correct_detailed(reads)
            .into_iter()
            .map(CorrectedRead::into_read)
            .collect()
    }

    /// Walk the read's k-mers left to right, repairing weak ones in place so
    /// later windows see earlier fixes.
    pub fn correct_read(&self, read: &Read, table: &KmerFrequencyTable<'_>) -> CorrectedRead {
        let k = self.config.kmer_size;
        let threshold = self.config.min_kmer_frequency;
        let mut bases = read.sequence.as_bytes().to_vec();
        let mut corrections = Vec::new();

        if bases.len() >= k {
            for start in 0..=bases.len() - k {
                let window = &bases[start..start + k];
                if table.count(window) >= threshold {
                    continue;
                }

                if let Some((offset, base, support)) = best_neighbor(window, table, threshold) {
                    let position = start + offset;
                    corrections.push(BaseCorrection {
                        position,
                        from: bases[position] as char,
                        to: base as char,
                        support,
                    });
                    bases[position] = base;
                }
            }
        }

        // Only ASCII bytes were swapped for ASCII bytes
        let corrected = String::from_utf8(bases).unwrap_or_else(|_| read.sequence.clone());

        CorrectedRead {
            id: read.id,
            original: read.sequence.clone(),
            corrected,
            corrections,
            quality: read.quality.clone(),
        }
    }
}

/// Highest-frequency single-substitution neighbour meeting `threshold`.
/// Ties keep the first candidate in (offset, A/C/G/T) order.
fn best_neighbor(
    kmer: &[u8],
    table: &KmerFrequencyTable<'_>,
    threshold: u32,
) -> Option<(usize, u8, u32)> {
    let mut candidate = kmer.to_vec();
    let mut best: Option<(usize, u8, u32)> = None;

    for offset in 0..candidate.len() {
        let original = candidate[offset];
        for &base in &BASES {
            if base == original {
                continue;
            }
            candidate[offset] = base;
            let count = table.count(&candidate);
            if count >= threshold && best.map_or(true, |(_, _, c)| count > c) {
                best = Some((offset, base, count));
            }
        }
        candidate[offset] = original;
    }

    best
}

/// Correct reads against their own k-mer spectrum
pub fn error_correct(
    reads: &[Read],
    kmer_size: usize,
    min_kmer_frequency: u32,
) -> Result<Vec<Read>> {
    let config = ErrorCorrectionConfig::new(kmer_size, min_kmer_frequency)?;
    let corrector = ErrorCorrector::new(config)?;
    Ok(corrector.correct_reads(reads))
}
