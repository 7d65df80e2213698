//! Quality-based read trimming
//!
//! Implements:
//! - End trimming of bases below a Phred threshold
//! - Length filtering after trimming
//! - Per-read quality summaries

use super::QCStats;
use crate::core::data_structures::Read;
use crate::utils::configuration::QualityTrimConfig;

/// Quality trimmer with a precomputed ASCII -> Phred lookup table
pub struct QualityTrimmer {
    pub config: QualityTrimConfig,
    quality_lookup: [u8; 256],
}

impl QualityTrimmer {
    pub fn new(config: QualityTrimConfig) -> Self {
        let mut quality_lookup = [0u8; 256];
        for (i, slot) in quality_lookup.iter_mut().enumerate() {
            *slot = (i as u8).saturating_sub(config.quality_offset);
        }

        Self {
            config,
            quality_lookup,
        }
    }

    #[inline(always)]
    fn decode(&self, quality: u8) -> u8 {
        self.quality_lookup[quality as usize]
    }

    /// Half-open range left after trimming low-quality bases from both ends.
    /// An all-low read yields an empty range.
    pub fn trim_bounds(&self, quality: &[u8]) -> (usize, usize) {
        let passes = |q: &u8| self.decode(*q) >= self.config.min_quality;

        let start = quality.iter().position(passes).unwrap_or(quality.len());
        let end = quality
            .iter()
            .rposition(passes)
            .map_or(start, |last| last + 1);

        (start, end)
    }

    /// Trim one read. `None` means the read was discarded; reads without
    /// quality scores come back unchanged.
    pub fn trim_read(&self, read: &Read) -> Option<Read> {
        let Some(ref quality) = read.quality else {
            return Some(read.clone());
        };

        let (start, end) = self.trim_bounds(quality);
        if end - start < self.config.min_length {
            return None;
        }

        Some(Read {
            id: read.id,
            sequence: read.sequence[start..end].to_string(),
            quality: Some(quality[start..end].to_vec()),
        })
    }

    pub fn trim_reads(&self, reads: &[Read]) -> Vec<Read> {
        let mut stats = QCStats::new();
        self.trim_reads_with_stats(reads, &mut stats)
    }

    pub fn trim_reads_with_stats(&self, reads: &[Read], stats: &mut QCStats) -> Vec<Read> {
        let mut kept = Vec::with_capacity(reads.len());

        for read in reads {
            stats.record_input(read.len(), read.has_quality());
            match self.trim_read(read) {
                Some(trimmed) => {
                    stats.record_passed(read.len(), trimmed.len());
                    kept.push(trimmed);
                }
                None => stats.record_discarded(read.len()),
            }
        }

        kept
    }

    /// Calculate quality statistics for a read (single pass plus one sort)
    pub fn quality_stats(&self, quality: &[u8]) -> QualityStats {
        if quality.is_empty() {
            return QualityStats::default();
        }

        let mut qualities: Vec<u8> = quality.iter().map(|&q| self.decode(q)).collect();

        let mut min = u8::MAX;
        let mut max = 0u8;
        let mut sum = 0u32;
        let mut q20_count = 0;
        let mut q30_count = 0;

        for &q in &qualities {
            min = min.min(q);
            max = max.max(q);
            sum += q as u32;
            if q >= 20 {
                q20_count += 1;
            }
            if q >= 30 {
                q30_count += 1;
            }
        }

        let n = qualities.len();
        qualities.sort_unstable();
        let median = if n % 2 == 0 {
            (qualities[n / 2 - 1] as f64 + qualities[n / 2] as f64) / 2.0
        } else {
            qualities[n / 2] as f64
        };

        QualityStats {
            min_quality: min,
            max_quality: max,
            mean_quality: sum as f64 / n as f64,
            median_quality: median,
            q20_percentage: (q20_count as f64 / n as f64) * 100.0,
            q30_percentage: (q30_count as f64 / n as f64) * 100.0,
        }
    }
}

/// Trim every read with Phred+33 qualities, dropping those left shorter than `min_length`
pub fn quality_trim(reads: &[Read], min_quality: u8, min_length: usize) -> Vec<Read> {
    QualityTrimmer::new(QualityTrimConfig::new(min_quality, min_length)).trim_reads(reads)
}

/// Quality statistics for a read
#[derive(Debug, Clone, Default)]
pub struct QualityStats {
    pub min_quality: u8,
    pub max_quality: u8,
    pub mean_quality: f64,
    pub median_quality: f64,
    pub q20_percentage: f64,
    pub q30_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trimmer(min_quality: u8, min_length: usize) -> QualityTrimmer {
        QualityTrimmer::new(QualityTrimConfig::new(min_quality, min_length))
    }

    #[test]
    fn test_trims_low_quality_ends() {
        // '!' = Q0, 'I' = Q40
        let read = Read::with_quality(0, "AAACGTACGTTT", b"!!!IIIIII!!!").unwrap();

        let trimmed = trimmer(20, 1).trim_read(&read).unwrap();
        assert_eq!(trimmed.sequence, "CGTACG");
        assert_eq!(trimmed.quality.as_deref(), Some(&b"IIIIII"[..]));
    }

    #[test]
    fn test_interior_low_quality_is_kept() {
        let read = Read::with_quality(0, "ACGTA", b"II!II").unwrap();
        let trimmed = trimmer(20, 1).trim_read(&read).unwrap();
        assert_eq!(trimmed.sequence, "ACGTA");
    }

    #[test]
    fn test_discards_short_reads() {
        let read = Read::with_quality(0, "ACGTACGT", b"!!!III!!").unwrap();
        assert!(trimmer(20, 4).trim_read(&read).is_none());
        assert_eq!(trimmer(20, 3).trim_read(&read).unwrap().sequence, "TAC");
    }

    #[test]
    fn test_all_low_quality_read_is_discarded() {
        let read = Read::with_quality(0, "ACGT", b"####").unwrap();
        assert_eq!(trimmer(20, 0).trim_bounds(b"####"), (4, 4));
        // min_length 0 keeps the empty remainder
        assert_eq!(trimmer(20, 0).trim_read(&read).unwrap().sequence, "");
        assert!(trimmer(20, 1).trim_read(&read).is_none());
    }

    #[test]
    fn test_reads_without_quality_pass_through() {
        let reads = vec![Read::new(0, "AC"), Read::new(1, "ACGTACGT")];
        let kept = quality_trim(&reads, 30, 50);
        assert_eq!(kept, reads);
    }

    #[test]
    fn test_trim_reads_with_stats() {
        let reads = vec![
            Read::with_quality(0, "ACGTAC", b"IIIIII").unwrap(),
            Read::with_quality(1, "ACGTAC", b"!IIII!").unwrap(),
            Read::with_quality(2, "ACGTAC", b"!!!!!I").unwrap(),
        ];
        let mut stats = QCStats::new();
        let kept = trimmer(20, 3).trim_reads_with_stats(&reads, &mut stats);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].sequence, "CGTA");
        assert_eq!(stats.reads_input, 3);
        assert_eq!(stats.reads_discarded, 1);
        assert_eq!(stats.bases_trimmed, 2 + 6);
    }

    #[test]
    fn test_quality_stats() {
        let filter = trimmer(20, 0);

        // Mixed quality: Q2, Q40, Q41
        let stats = filter.quality_stats(b"####IIIIJJJJ");
        assert_eq!(stats.min_quality, 2);
        assert_eq!(stats.max_quality, 41);
        assert!(stats.mean_quality > 20.0);
        assert!(stats.q20_percentage > 50.0);
        assert_eq!(stats.median_quality, 40.0);
    }
}
