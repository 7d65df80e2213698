//! Assembly modules
//!
//! Two strategies share one result type: overlap-layout-consensus over read
//! overlaps (`olc`) and simple-path extraction from a k-mer graph
//! (`debruijn`). Scaffolding and statistics work on either output.

pub mod consensus;
pub mod debruijn;
pub mod olc;
pub mod orchestrator;
pub mod overlap;
pub mod scaffold;
pub mod stats;

pub use consensus::{compute_consensus, layout_consensus, ConsensusBuilder};
pub use debruijn::{KmerEdge, KmerGraph, KmerGraphAssembler, KmerPath};
pub use olc::{merge_contigs, ContigGraph, OverlapGraphAssembler, Placement, ReadLayout};
pub use orchestrator::{assemble_debruijn, assemble_olc, Assembler};
pub use overlap::{calculate_identity, find_overlap, OverlapDetector};
pub use scaffold::{scaffold, ContigScaffolder};
pub use stats::{calculate_coverage, calculate_stats, CoverageCalculator, ReadAlignment};
