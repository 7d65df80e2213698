//! Core data structures for the assembly engine
//!
//! Reads, overlaps, contigs, scaffolds and the summary values handed back to
//! callers. Graph working state lives inside the assemblers that own it.

use crate::utils::configuration::PipelineError;
use serde::{Deserialize, Serialize};

/// Gap symbol used in aligned layouts and ignored by consensus
pub const GAP: u8 = b'-';

/// Upper-case a raw nucleotide string.
///
/// Letters are upper-cased, `-` and `.` become the gap symbol and anything
/// outside ASCII becomes `N`, so every downstream byte offset is a valid
/// `str` boundary.
pub fn normalize_sequence(sequence: &str) -> String {
    sequence
        .chars()
        .map(|c| match c {
            '-' | '.' => GAP as char,
            c if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
            _ => 'N',
        })
        .collect()
}

/// True for the four assemblable bases
#[inline]
pub fn is_nucleotide(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

/// GC fraction over A/C/G/T bases only; unknown and gap symbols are ignored
pub fn gc_content(sequence: &str) -> f64 {
    let mut gc = 0usize;
    let mut counted = 0usize;
    for base in sequence.bytes() {
        match base.to_ascii_uppercase() {
            b'G' | b'C' => {
                gc += 1;
                counted += 1;
            }
            b'A' | b'T' => counted += 1,
            _ => {}
        }
    }

    if counted == 0 {
        0.0
    } else {
        gc as f64 / counted as f64
    }
}

/// A sequencing read, optionally carrying a Phred+33 quality string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Read {
    pub id: usize,
    pub sequence: String,
    pub quality: Option<Vec<u8>>,
}

impl Read {
    /// Read without quality scores
    pub fn new(id: usize, sequence: &str) -> Self {
        Self {
            id,
            sequence: normalize_sequence(sequence),
            quality: None,
        }
    }

    /// Read with a quality string, which must match the sequence length
    pub fn with_quality(
        id: usize,
        sequence: &str,
        quality: &[u8],
    ) -> Result<Self, PipelineError> {
        if sequence.chars().count() != quality.len() {
            return Err(PipelineError::InputError {
                message: format!(
                    "read {} has {} bases but {} quality values",
                    id,
                    sequence.chars().count(),
                    quality.len()
                ),
            });
        }

        Ok(Self {
            id,
            sequence: normalize_sequence(sequence),
            quality: Some(quality.to_vec()),
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn has_quality(&self) -> bool {
        self.quality.is_some()
    }
}

impl AsRef<str> for Read {
    fn as_ref(&self) -> &str {
        &self.sequence
    }
}

/// A read after k-mer error correction, with the substitutions applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectedRead {
    pub id: usize,
    pub original: String,
    pub corrected: String,
    pub corrections: Vec<BaseCorrection>,
    pub quality: Option<Vec<u8>>,
}

impl CorrectedRead {
    pub fn is_modified(&self) -> bool {
        !self.corrections.is_empty()
    }

    /// Drop the correction record and keep the corrected read
    pub fn into_read(self) -> Read {
        Read {
            id: self.id,
            sequence: self.corrected,
            quality: self.quality,
        }
    }
}

/// Single-base substitution made by the error corrector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCorrection {
    pub position: usize,
    pub from: char,
    pub to: char,
    /// Frequency of the replacement k-mer that justified the change
    pub support: u32,
}

/// Suffix/prefix overlap between two sequences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceOverlap {
    pub length: usize,
    pub identity: f64,
}

/// Overlap between two reads: the suffix of `from` aligns to the prefix of `to`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub from: usize,
    pub to: usize,
    pub length: usize,
    pub identity: f64,
}

/// Where a contig came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContigProvenance {
    /// Read indices in layout order (overlap assembly)
    Reads(Vec<usize>),
    /// Node indices of the walked k-mer graph path (de Bruijn assembly)
    KmerPath(Vec<usize>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contig {
    pub id: usize,
    pub sequence: String,
    pub length: usize,
    pub coverage: f64,
    pub provenance: ContigProvenance,
}

impl Contig {
    pub fn new(id: usize, sequence: String, coverage: f64, provenance: ContigProvenance) -> Self {
        let length = sequence.len();
        Self {
            id,
            sequence,
            length,
            coverage,
            provenance,
        }
    }
}

/// Contigs produced by one assembly run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyResult {
    pub contigs: Vec<Contig>,
    pub total_reads: usize,
    pub total_length: usize,
    pub longest_contig: usize,
}

impl AssemblyResult {
    pub fn new(contigs: Vec<Contig>, total_reads: usize) -> Self {
        let total_length = contigs.iter().map(|c| c.length).sum();
        let longest_contig = contigs.iter().map(|c| c.length).max().unwrap_or(0);
        Self {
            contigs,
            total_reads,
            total_length,
            longest_contig,
        }
    }

    pub fn sequences(&self) -> Vec<&str> {
        self.contigs.iter().map(|c| c.sequence.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }
}

/// Linking hint between two contigs, produced outside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldLink {
    pub from: usize,
    pub to: usize,
    pub gap_length: usize,
}

impl ScaffoldLink {
    pub fn new(from: usize, to: usize, gap_length: usize) -> Self {
        Self {
            from,
            to,
            gap_length,
        }
    }
}

/// Ordered contigs joined by gap-filler runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaffold {
    pub id: usize,
    pub contig_ids: Vec<usize>,
    /// Gap inserted after each contig except the last
    pub gap_lengths: Vec<usize>,
    pub sequence: String,
}

impl Scaffold {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn total_gap_length(&self) -> usize {
        self.gap_lengths.iter().sum()
    }
}

/// Per-position read depth over a reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageProfile {
    pub depth: Vec<u32>,
}

impl CoverageProfile {
    pub fn zeroed(length: usize) -> Self {
        Self {
            depth: vec![0; length],
        }
    }

    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    pub fn max_depth(&self) -> u32 {
        self.depth.iter().copied().max().unwrap_or(0)
    }

    pub fn mean_depth(&self) -> f64 {
        if self.depth.is_empty() {
            return 0.0;
        }
        self.depth.iter().map(|&d| d as f64).sum::<f64>() / self.depth.len() as f64
    }

    /// Fraction of positions covered by at least one read
    pub fn breadth(&self) -> f64 {
        if self.depth.is_empty() {
            return 0.0;
        }
        self.depth.iter().filter(|&&d| d > 0).count() as f64 / self.depth.len() as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub total_reads: usize,
    pub num_contigs: usize,
    pub total_length: usize,
    pub longest_contig: usize,
    pub n50: usize,
    pub n90: usize,
    pub l50: usize,
    pub gc_content: f64,
    pub mean_coverage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sequence() {
        assert_eq!(normalize_sequence("acgTn"), "ACGTN");
        assert_eq!(normalize_sequence("AC.G-T"), "AC-G-T");
        assert_eq!(normalize_sequence("AÇGT"), "ANGT");
    }

    #[test]
    fn test_gc_content() {
        assert_eq!(gc_content("ATCG"), 0.5);
        assert_eq!(gc_content("AAAA"), 0.0);
        assert_eq!(gc_content("CCGG"), 1.0);
        assert_eq!(gc_content(""), 0.0);
        // N and gaps are not counted
        assert_eq!(gc_content("GCNN--"), 1.0);
    }

    #[test]
    fn test_read_quality_length_mismatch() {
        assert!(Read::with_quality(0, "ACGT", b"IIII").is_ok());

        let err = Read::with_quality(1, "ACGT", b"III").unwrap_err();
        assert!(matches!(err, PipelineError::InputError { .. }));
    }

    #[test]
    fn test_assembly_result_totals() {
        let contigs = vec![
            Contig::new(0, "ACGTACGT".to_string(), 1.0, ContigProvenance::Reads(vec![0])),
            Contig::new(1, "ACG".to_string(), 1.0, ContigProvenance::Reads(vec![1])),
        ];
        let result = AssemblyResult::new(contigs, 5);

        assert_eq!(result.total_reads, 5);
        assert_eq!(result.total_length, 11);
        assert_eq!(result.longest_contig, 8);
        assert_eq!(result.sequences(), vec!["ACGTACGT", "ACG"]);
    }

    #[test]
    fn test_coverage_profile_summary() {
        let profile = CoverageProfile {
            depth: vec![0, 1, 2, 1],
        };
        assert_eq!(profile.max_depth(), 2);
        assert_eq!(profile.mean_depth(), 1.0);
        assert_eq!(profile.breadth(), 0.75);
        assert_eq!(CoverageProfile::zeroed(0).mean_depth(), 0.0);
    }
}
