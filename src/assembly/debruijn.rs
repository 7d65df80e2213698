//! de Bruijn graph assembly
//!
//! Nodes are (k-1)-mers and edges are the k-mers observed in the reads, with
//! multiplicity counting repeat observations. Contigs are maximal
//! non-branching paths. Every edge is walked at most once, so traversal is
//! bounded by the edge count even when repeats close cycles; the price is
//! that a repeat may be split across several contigs.

use ahash::AHashMap;
use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::data_structures::{
    is_nucleotide, AssemblyResult, Contig, ContigProvenance, Read,
};
use crate::utils::configuration::{AssemblyParameters, PipelineError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerEdge {
    pub from: usize,
    pub to: usize,
    /// Final base of the k-mer, appended when the edge is walked
    pub last_base: u8,
    pub multiplicity: u32,
}

/// Arena-backed k-mer graph
#[derive(Debug, Clone)]
pub struct KmerGraph {
    k: usize,
    nodes: Vec<Vec<u8>>,
    node_index: AHashMap<Vec<u8>, usize>,
    edges: Vec<KmerEdge>,
    edge_index: AHashMap<Vec<u8>, usize>,
    outgoing: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

/// A walked path through the graph
#[derive(Debug, Clone, PartialEq)]
pub struct KmerPath {
    pub nodes: Vec<usize>,
    pub sequence: String,
    pub mean_multiplicity: f64,
}

impl KmerGraph {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            nodes: Vec::new(),
            node_index: AHashMap::new(),
            edges: Vec::new(),
            edge_index: AHashMap::new(),
            outgoing: Vec::new(),
            in_degree: Vec::new(),
        }
    }

    /// Graph of every k-mer in `reads`. k-mers containing anything other
    /// than A/C/G/T are skipped.
    pub fn from_reads(reads: &[Read], k: usize) -> Self {
        let mut graph = Self::new(k);
        if k == 0 {
            return graph;
        }

        for read in reads {
            let bases = read.sequence.as_bytes();
            if bases.len() < k {
                continue;
            }
            for kmer in bases.windows(k) {
                if kmer.iter().all(|&b| is_nucleotide(b)) {
                    graph.add_kmer(kmer);
                }
            }
        }

        graph
    }

    pub fn add_kmer(&mut self, kmer: &[u8]) {
        debug_assert_eq!(kmer.len(), self.k);

        if let Some(&edge) = self.edge_index.get(kmer) {
            self.edges[edge].multiplicity = self.edges[edge].multiplicity.saturating_add(1);
            return;
        }

        let from = self.intern(&kmer[..self.k - 1]);
        let to = self.intern(&kmer[1..]);
        let edge = self.edges.len();

        self.edges.push(KmerEdge {
            from,
            to,
            last_base: kmer[self.k - 1],
            multiplicity: 1,
        });
        self.edge_index.insert(kmer.to_vec(), edge);
        self.outgoing[from].push(edge);
        self.in_degree[to] += 1;
    }

    fn intern(&mut self, node: &[u8]) -> usize {
        if let Some(&idx) = self.node_index.get(node) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(node.to_vec());
        self.node_index.insert(node.to_vec(), idx);
        self.outgoing.push(Vec::new());
        self.in_degree.push(0);
        idx
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[KmerEdge] {
        &self.edges
    }

    pub fn node_sequence(&self, node: usize) -> &str {
        // Nodes are built from A/C/G/T only
        std::str::from_utf8(&self.nodes[node]).unwrap_or_default()
    }

    pub fn node_of(&self, sequence: &str) -> Option<usize> {
        self.node_index.get(sequence.as_bytes()).copied()
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.in_degree[node]
    }

    pub fn out_degree(&self, node: usize) -> usize {
        self.outgoing[node].len()
    }

    /// Multiplicity of a k-mer, 0 when it was never observed
    pub fn multiplicity(&self, kmer: &str) -> u32 {
        self.edge_index
            .get(kmer.as_bytes())
            .map_or(0, |&e| self.edges[e].multiplicity)
    }

    fn is_simple(&self, node: usize) -> bool {
        self.in_degree(node) == 1 && self.out_degree(node) == 1
    }

    /// All maximal non-branching paths.
    ///
    /// Paths start at branch points, sources and sinks in node order, each
    /// leaving edge in insertion order. Edges still unvisited afterwards
    /// belong to isolated cycles and are walked from the lowest edge index.
    pub fn extract_paths(&self) -> Vec<KmerPath> {
        let mut visited = vec![false; self.edges.len()];
        let mut paths = Vec::new();

        for node in 0..self.nodes.len() {
            if self.is_simple(node) {
                continue;
            }
            for &edge in &self.outgoing[node] {
                if !visited[edge] {
                    paths.push(self.walk(edge, &mut visited));
                }
            }
        }

        for edge in 0..self.edges.len() {
            if !visited[edge] {
                paths.push(self.walk(edge, &mut visited));
            }
        }

        paths
    }

    fn walk(&self, first_edge: usize, visited: &mut [bool]) -> KmerPath {
        let start = self.edges[first_edge].from;
        let mut sequence = self.node_sequence(start).to_string();
        let mut nodes = vec![start];
        let mut multiplicity_sum = 0u64;
        let mut steps = 0usize;
        let mut edge = first_edge;

        loop {
            visited[edge] = true;
            let current = &self.edges[edge];
            sequence.push(current.last_base as char);
            nodes.push(current.to);
            multiplicity_sum += current.multiplicity as u64;
            steps += 1;

            if !self.is_simple(current.to) {
                break;
            }
            let next = self.outgoing[current.to][0];
            if visited[next] {
                break;
            }
            edge = next;
        }

        KmerPath {
            nodes,
            sequence,
            mean_multiplicity: multiplicity_sum as f64 / steps as f64,
        }
    }
}

pub struct KmerGraphAssembler {
    params: AssemblyParameters,
}

impl KmerGraphAssembler {
    pub fn new(params: AssemblyParameters) -> Result<Self, PipelineError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &AssemblyParameters {
        &self.params
    }

    pub fn build_graph(&self, reads: &[Read]) -> KmerGraph {
        KmerGraph::from_reads(reads, self.params.kmer_size)
    }

    /// Assemble reads into contigs by walking unambiguous k-mer graph paths
    #[instrument(skip_all, fields(reads = reads.len(), k = self.params.kmer_size))]
    pub fn assemble(&self, reads: &[Read]) -> Result<AssemblyResult> {
        info!(
            "🧬 de Bruijn assembly of {} reads (k={})",
            reads.len(),
            self.params.kmer_size
        );

        let graph = self.build_graph(reads);
        debug!(
            "k-mer graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let paths = graph.extract_paths();
        let total_paths = paths.len();
        let contigs: Vec<Contig> = paths
            .into_iter()
            .filter(|path| path.sequence.len() >= self.params.min_contig_length)
            .enumerate()
            .map(|(id, path)| {
                Contig::new(
                    id,
                    path.sequence,
                    path.mean_multiplicity,
                    ContigProvenance::KmerPath(path.nodes),
                )
            })
            .collect();

        info!(
            "✅ de Bruijn assembly complete: {} paths, {} contigs kept",
            total_paths,
            contigs.len()
        );

        Ok(AssemblyResult::new(contigs, reads.len()))
    }
}
