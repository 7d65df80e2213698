pub mod data_structures;

// Re-export key types for assembly integration
pub use data_structures::{
    // Reads and correction records
    BaseCorrection,
    CorrectedRead,
    Read,
    // Overlaps
    Overlap,
    SequenceOverlap,
    // Assembly outputs
    AssemblyResult,
    AssemblyStats,
    Contig,
    ContigProvenance,
    CoverageProfile,
    Scaffold,
    ScaffoldLink,
    // Sequence helpers
    gc_content,
    is_nucleotide,
    normalize_sequence,
    GAP,
};
