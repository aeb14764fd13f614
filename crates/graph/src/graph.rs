//! Citation graph representation
//!
//! Directed view of a library: node indices follow library order, edges
//! point from the citing paper to the cited one.

use citagraph_common::{Library, Paper};
use std::collections::{HashMap, VecDeque};

/// Index of a node in a [`CitationGraph`]
pub type NodeIndex = usize;

/// In-memory citation graph borrowing from a library
pub struct CitationGraph<'a> {
    /// All nodes, in library order
    papers: Vec<&'a Paper>,

    /// Paper id -> node index
    index: HashMap<&'a str, NodeIndex>,

    /// Adjacency list: node -> nodes it cites
    outgoing: Vec<Vec<NodeIndex>>,

    /// Reverse adjacency: node -> nodes citing it
    incoming: Vec<Vec<NodeIndex>>,

    /// Edges in library order
    edges: Vec<(NodeIndex, NodeIndex)>,
}

impl<'a> CitationGraph<'a> {
    /// Build the graph for a library
    pub fn from_library(library: &'a Library) -> Self {
        let papers: Vec<&Paper> = library.papers().collect();
        let index: HashMap<&str, NodeIndex> = papers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.as_str(), i))
            .collect();

        let mut graph = Self {
            outgoing: vec![Vec::new(); papers.len()],
            incoming: vec![Vec::new(); papers.len()],
            edges: Vec::with_capacity(library.citation_count()),
            papers,
            index,
        };

        for citation in library.citations() {
            // The library guarantees both ends exist
            if let (Some(&citing), Some(&cited)) = (
                graph.index.get(citation.citing_id.as_str()),
                graph.index.get(citation.cited_id.as_str()),
            ) {
                graph.add_edge(citing, cited);
            }
        }

        graph
    }

    fn add_edge(&mut self, citing: NodeIndex, cited: NodeIndex) {
        self.outgoing[citing].push(cited);
        self.incoming[cited].push(citing);
        self.edges.push((citing, cited));
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.papers.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Paper at a node
    pub fn paper(&self, node: NodeIndex) -> &'a Paper {
        self.papers[node]
    }

    /// All papers in node order
    pub fn papers(&self) -> &[&'a Paper] {
        &self.papers
    }

    /// Node index of a paper id
    pub fn index_of(&self, paper_id: &str) -> Option<NodeIndex> {
        self.index.get(paper_id).copied()
    }

    pub fn edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.edges
    }

    /// Get papers cited by this paper
    pub fn references(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.outgoing[node]
    }

    /// Get papers citing this paper
    pub fn citations(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.incoming[node]
    }

    /// Get citation count (incoming edges)
    pub fn citation_count(&self, node: NodeIndex) -> usize {
        self.incoming[node].len()
    }

    /// Get reference count (outgoing edges)
    pub fn reference_count(&self, node: NodeIndex) -> usize {
        self.outgoing[node].len()
    }

    /// Whether two nodes share an edge in either direction
    pub fn is_adjacent(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.outgoing[a].contains(&b) || self.incoming[a].contains(&b)
    }

    /// Nodes sharing an edge with `node`, ignoring direction
    pub fn neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.outgoing[node]
            .iter()
            .chain(&self.incoming[node])
            .copied()
            .filter(|&n| n != node)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Hop distances from every node to every other, ignoring direction.
    ///
    /// Unreachable pairs are `None`.
    pub fn undirected_distances(&self) -> Vec<Vec<Option<usize>>> {
        let n = self.node_count();
        let adjacency: Vec<Vec<NodeIndex>> = (0..n).map(|i| self.neighbors(i)).collect();

        (0..n)
            .map(|source| {
                let mut dist = vec![None; n];
                dist[source] = Some(0);
                let mut queue = VecDeque::from([source]);

                while let Some(current) = queue.pop_front() {
                    let next = dist[current].map_or(0, |d| d + 1);
                    for &neighbor in &adjacency[current] {
                        if dist[neighbor].is_none() {
                            dist[neighbor] = Some(next);
                            queue.push_back(neighbor);
                        }
                    }
                }
                dist
            })
            .collect()
    }
}
