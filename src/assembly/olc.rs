//! Overlap-layout-consensus assembly
//!
//! Reads are nodes and overlaps are edges in a flat arena. Contigs are laid
//! out by greedy chain walking: start at a read no unused read points into,
//! repeatedly follow the best outgoing overlap to an unused read, then call
//! the consensus over the resulting layout. The walk is greedy and does not
//! search for an optimal tiling.

use anyhow::Result;
use tracing::{debug, info, instrument};

use super::consensus::layout_consensus;
use super::overlap::OverlapDetector;
use crate::core::data_structures::{AssemblyResult, Contig, ContigProvenance, Overlap, Read};
use crate::utils::configuration::{AssemblyParameters, PipelineError};

/// `contig_a + contig_b[overlap_length..]`.
///
/// An overlap of 0, or one longer than either sequence, falls back to plain
/// concatenation.
pub fn merge_contigs(contig_a: &str, contig_b: &str, overlap_length: usize) -> String {
    let mut merged = String::with_capacity(contig_a.len() + contig_b.len());
    merged.push_str(contig_a);

    if overlap_length == 0
        || overlap_length > contig_a.len()
        || overlap_length > contig_b.len()
        || !contig_b.is_char_boundary(overlap_length)
    {
        merged.push_str(contig_b);
    } else {
        merged.push_str(&contig_b[overlap_length..]);
    }

    merged
}

/// Directed overlap graph over read indices
#[derive(Debug, Clone)]
pub struct ContigGraph {
    edges: Vec<Overlap>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl ContigGraph {
    /// Index `overlaps` for `node_count` reads. Edges keep their input order,
    /// which is the tie-break order for the chain walk.
    pub fn from_overlaps(node_count: usize, overlaps: Vec<Overlap>) -> Self {
        let mut outgoing = vec![Vec::new(); node_count];
        let mut incoming = vec![Vec::new(); node_count];

        for (idx, edge) in overlaps.iter().enumerate() {
            outgoing[edge.from].push(idx);
            incoming[edge.to].push(idx);
        }

        Self {
            edges: overlaps,
            outgoing,
            incoming,
        }
    }

    pub fn node_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Overlap] {
        &self.edges
    }

    pub fn outgoing(&self, node: usize) -> impl Iterator<Item = &Overlap> + '_ {
        self.outgoing[node].iter().map(move |&e| &self.edges[e])
    }

    pub fn incoming(&self, node: usize) -> impl Iterator<Item = &Overlap> + '_ {
        self.incoming[node].iter().map(move |&e| &self.edges[e])
    }

    /// Highest-identity edge to an unused read, longer overlap second,
    /// earliest edge on a full tie
    fn best_successor(&self, node: usize, used: &[bool]) -> Option<&Overlap> {
        let mut best: Option<&Overlap> = None;
        for edge in self.outgoing(node).filter(|e| !used[e.to]) {
            let better = match best {
                None => true,
                Some(current) => {
                    edge.identity > current.identity
                        || (edge.identity == current.identity && edge.length > current.length)
                }
            };
            if better {
                best = Some(edge);
            }
        }
        best
    }
}

/// One read's position within a contig layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub read: usize,
    pub offset: usize,
}

/// Reads of one chain, in walk order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLayout {
    pub placements: Vec<Placement>,
    pub width: usize,
}

pub struct OverlapGraphAssembler {
    params: AssemblyParameters,
    detector: OverlapDetector,
}

impl OverlapGraphAssembler {
    pub fn new(params: AssemblyParameters) -> Result<Self, PipelineError> {
        params.validate()?;
        let detector = OverlapDetector::from_parameters(&params);
        Ok(Self { params, detector })
    }

    pub fn params(&self) -> &AssemblyParameters {
        &self.params
    }

    pub fn build_graph(&self, reads: &[Read]) -> ContigGraph {
        let overlaps = self.detector.find_all_overlaps(reads);
        ContigGraph::from_overlaps(reads.len(), overlaps)
    }

    /// Partition all reads into chains.
    ///
    /// Each read is used exactly once, so the walk is bounded by the read count.
    /// When every unused read still has an unused predecessor (a cycle), the
    /// lowest-index unused read starts the next chain. Empty reads are never
    /// placed.
    pub fn layout(&self, reads: &[Read], graph: &ContigGraph) -> Vec<ReadLayout> {
        let n = reads.len();
        let mut used: Vec<bool> = reads.iter().map(Read::is_empty).collect();
        let mut layouts = Vec::new();

        loop {
            let start = (0..n)
                .find(|&i| !used[i] && graph.incoming(i).all(|e| used[e.from]))
                .or_else(|| (0..n).find(|&i| !used[i]));
            let Some(start) = start else {
                break;
            };

            used[start] = true;
            let mut placements = vec![Placement {
                read: start,
                offset: 0,
            }];
            let mut width = reads[start].len();
            let mut current = start;

            while let Some(edge) = graph.best_successor(current, &used) {
                let next = edge.to;
                let offset = width - edge.length;
                used[next] = true;
                placements.push(Placement { read: next, offset });
                width = offset + reads[next].len();
                current = next;
            }

            layouts.push(ReadLayout { placements, width });
        }

        layouts
    }

    /// Assemble reads into contigs by overlap-layout-consensus
    #[instrument(skip_all, fields(reads = reads.len()))]
    pub fn assemble(&self, reads: &[Read]) -> Result<AssemblyResult> {
        info!(
            "🧬 OLC assembly of {} reads (min overlap {}, min identity {:.2})",
            reads.len(),
            self.params.min_overlap,
            self.params.min_identity
        );

        let graph = self.build_graph(reads);
        debug!(
            "Overlap graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let layouts = self.layout(reads, &graph);
        let mut contigs = Vec::with_capacity(layouts.len());

        for layout in &layouts {
            let sequence = self.layout_sequence(reads, layout);
            if sequence.len() < self.params.min_contig_length {
                continue;
            }

            let read_bases: usize = layout.placements.iter().map(|p| reads[p.read].len()).sum();
            let coverage = if sequence.is_empty() {
                0.0
            } else {
                read_bases as f64 / sequence.len() as f64
            };
            let read_ids = layout.placements.iter().map(|p| p.read).collect();

            contigs.push(Contig::new(
                contigs.len(),
                sequence,
                coverage,
                ContigProvenance::Reads(read_ids),
            ));
        }

        info!(
            "✅ OLC assembly complete: {} chains, {} contigs kept",
            layouts.len(),
            contigs.len()
        );

        Ok(AssemblyResult::new(contigs, reads.len()))
    }

    /// Merge the chain read by read, then let the consensus settle columns
    /// where overlapping reads disagree
    fn layout_sequence(&self, reads: &[Read], layout: &ReadLayout) -> String {
        let mut placements = layout.placements.iter();
        let Some(first) = placements.next() else {
            return String::new();
        };

        let mut merged = reads[first.read].sequence.clone();
        for placement in placements {
            let overlap = merged.len() - placement.offset;
            merged = merge_contigs(&merged, &reads[placement.read].sequence, overlap);
        }

        if layout.placements.len() == 1 || self.params.min_identity >= 1.0 {
            return merged;
        }

        let aligned: Vec<(usize, &str)> = layout
            .placements
            .iter()
            .map(|p| (p.offset, reads[p.read].sequence.as_str()))
            .collect();
        layout_consensus(&aligned, merged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reads(sequences: &[&str]) -> Vec<Read> {
        sequences
            .iter()
            .enumerate()
            .map(|(i, s)| Read::new(i, s))
            .collect()
    }

    fn assembler(
        min_overlap: usize,
        min_identity: f64,
        min_contig_length: usize,
    ) -> OverlapGraphAssembler {
        let params =
            AssemblyParameters::with_identity(min_overlap, min_identity, 4, min_contig_length)
                .unwrap();
        OverlapGraphAssembler::new(params).unwrap()
    }

    #[test]
    fn test_merge_contigs() {
        assert_eq!(merge_contigs("ACGTAC", "TACGG", 3), "ACGTACGG");
        assert_eq!(merge_contigs("ACGT", "TTTT", 0), "ACGTTTTT");
        // Overlap longer than either input falls back to concatenation
        assert_eq!(merge_contigs("ACG", "GTTTT", 4), "ACGGTTTT");
        assert_eq!(merge_contigs("ACGT", "CGT", 3), "ACGT");
    }

    #[test]
    fn test_empty_reads_produce_no_contigs() {
        let input = reads(&["", "ACGTACGT", ""]);
        let result = assembler(4, 1.0, 0).assemble(&input).unwrap();

        assert_eq!(result.sequences(), vec!["ACGTACGT"]);
        assert_eq!(result.contigs[0].provenance, ContigProvenance::Reads(vec![1]));
        assert_eq!(result.total_reads, 3);
    }

    #[test]
    fn test_fully_trimmed_read_is_not_a_contig() {
        let trimmed = crate::qc::quality_trim(
            &[Read::with_quality(0, "ACGT", b"####").unwrap()],
            20,
            0,
        );
        let result = assembler(4, 1.0, 0).assemble(&trimmed).unwrap();
        assert!(result.is_empty());
        assert!(result.contigs.iter().all(|c| c.length > 0));
    }

    #[test]
    fn test_cyclic_reads_assemble() {
        let input = reads(&["ACGTACGT", "ACGTACGTTTTT", "TTTTACGTACGT"]);
        let result = assembler(4, 1.0, 0).assemble(&input).unwrap();

        assert_eq!(result.total_reads, 3);
        assert!(result
            .contigs
            .iter()
            .any(|c| c.length >= 12 && c.sequence.contains("ACGTACGT")));
        assert_eq!(result.contigs[0].sequence, "ACGTACGTTTTTACGTACGT");
        assert_eq!(
            result.contigs[0].provenance,
            ContigProvenance::Reads(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_reconstructs_tiled_sequence() {
        let genome = "ATGGCGTACGATCGATTACGGCTAGCTAGGCTTACG";
        let input = reads(&[&genome[20..], &genome[..16], &genome[10..28]]);
        let result = assembler(5, 1.0, 0).assemble(&input).unwrap();

        assert_eq!(result.contigs.len(), 1);
        assert_eq!(result.contigs[0].sequence, genome);
        assert_eq!(result.longest_contig, genome.len());
    }

    #[test]
    fn test_unrelated_reads_are_singletons() {
        let input = reads(&["AAAAAAAA", "CCCCCCCC", "GGGGGGGG"]);
        let result = assembler(3, 1.0, 0).assemble(&input).unwrap();

        assert_eq!(result.sequences(), vec!["AAAAAAAA", "CCCCCCCC", "GGGGGGGG"]);
        assert_eq!(result.total_length, 24);
    }

    #[test]
    fn test_min_contig_length_filter() {
        let input = reads(&["ACGTTGCA", "GGG"]);
        let result = assembler(3, 1.0, 5).assemble(&input).unwrap();
        assert_eq!(result.sequences(), vec!["ACGTTGCA"]);
        assert_eq!(result.total_reads, 2);
    }

    #[test]
    fn test_consensus_resolves_mismatch() {
        // Reads 1 and 2 agree on 'C' where read 0 carries 'A'
        let input = reads(&["GGTTACGTAACG", "ACGTCACGTT", "ACGTCACGTTGG"]);
        let result = assembler(6, 0.8, 0).assemble(&input).unwrap();
        assert!(result
            .contigs
            .iter()
            .any(|c| c.sequence.contains("ACGTCACGTTGG")));
    }

    #[test]
    fn test_empty_input() {
        let result = assembler(3, 1.0, 0).assemble(&[]).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.total_length, 0);
        assert_eq!(result.longest_contig, 0);
    }

    #[test]
    fn test_layout_uses_every_read_once() {
        let input = reads(&["ACGTACGT", "ACGTACGTTTTT", "TTTTACGTACGT", "GGGG"]);
        let asm = assembler(4, 1.0, 0);
        let graph = asm.build_graph(&input);
        let layouts = asm.layout(&input, &graph);

        let mut seen: Vec<usize> = layouts
            .iter()
            .flat_map(|l| l.placements.iter().map(|p| p.read))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
