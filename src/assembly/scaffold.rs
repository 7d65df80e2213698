//! Contig scaffolding from external link hints
//!
//! Links join contigs into ordered chains with a run of placeholder bases
//! standing in for each estimated gap. Conflicts resolve in link order: a
//! contig keeps the first successor and first predecessor it is given, and a
//! link that would close a cycle is dropped.

use tracing::{debug, warn};

use crate::core::data_structures::{Contig, Scaffold, ScaffoldLink};

pub struct ContigScaffolder {
    gap_char: char,
}

impl ContigScaffolder {
    pub fn new(gap_char: char) -> Self {
        Self { gap_char }
    }

    pub fn gap_char(&self) -> char {
        self.gap_char
    }

    pub fn scaffold_contigs(&self, contigs: &[Contig], links: &[ScaffoldLink]) -> Vec<Scaffold> {
        let sequences: Vec<&str> = contigs.iter().map(|c| c.sequence.as_str()).collect();
        self.scaffold(&sequences, links)
    }

    /// Join linked contigs. Scaffolds come out in the order of their first
    /// contig; unlinked contigs stay as single-contig scaffolds in place.
    pub fn scaffold<S: AsRef<str>>(&self, contigs: &[S], links: &[ScaffoldLink]) -> Vec<Scaffold> {
        let n = contigs.len();
        let mut successor: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut has_predecessor = vec![false; n];
        let mut accepted = 0usize;

        for link in links {
            if link.from >= n || link.to >= n {
                warn!(
                    "Skipping scaffold link {} -> {}: only {} contigs",
                    link.from, link.to, n
                );
                continue;
            }
            if link.from == link.to
                || successor[link.from].is_some()
                || has_predecessor[link.to]
                || Self::reaches(&successor, link.to, link.from)
            {
                debug!("Ignoring conflicting link {} -> {}", link.from, link.to);
                continue;
            }

            successor[link.from] = Some((link.to, link.gap_length));
            has_predecessor[link.to] = true;
            accepted += 1;
        }

        let mut scaffolds = Vec::new();
        for head in (0..n).filter(|&i| !has_predecessor[i]) {
            let mut contig_ids = vec![head];
            let mut gap_lengths = Vec::new();
            let mut sequence = contigs[head].as_ref().to_string();
            let mut current = head;

            while let Some((next, gap)) = successor[current] {
                sequence.extend(std::iter::repeat(self.gap_char).take(gap));
                sequence.push_str(contigs[next].as_ref());
                contig_ids.push(next);
                gap_lengths.push(gap);
                current = next;
            }

            scaffolds.push(Scaffold {
                id: scaffolds.len(),
                contig_ids,
                gap_lengths,
                sequence,
            });
        }

        debug!(
            "Scaffolded {} contigs into {} scaffolds using {} of {} links",
            n,
            scaffolds.len(),
            accepted,
            links.len()
        );

        scaffolds
    }

    /// Whether following successors from `start` arrives at `target`
    fn reaches(successor: &[Option<(usize, usize)>], start: usize, target: usize) -> bool {
        let mut current = start;
        // Accepted links never form a cycle, so this ends within n steps
        while let Some((next, _)) = successor[current] {
            if next == target {
                return true;
            }
            current = next;
        }
        false
    }
}

/// Join contigs using link hints, filling gaps with `gap_char`
pub fn scaffold<S: AsRef<str>>(
    contigs: &[S],
    links: &[ScaffoldLink],
    gap_char: char,
) -> Vec<Scaffold> {
    ContigScaffolder::new(gap_char).scaffold(contigs, links)
}
