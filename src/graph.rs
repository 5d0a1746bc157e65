// src/graph.rs

use petgraph::graphmap::UnGraphMap;
use petgraph::visit::Bfs;

use crate::membership::ClusterMembershipMatrix;
use crate::overlaps::PairwiseOverlapMatrix;

/// Undirected weighted edge between two genome positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    /// Clusters in which both genomes have at least one amplicon.
    pub weight: u32,
}

/// Genome connectivity graph derived from the pairwise overlap matrix.
///
/// Nodes are genome positions in `genome_ids`; genomes without any
/// neighbour are removed once the edges are in.
#[derive(Debug, Clone)]
pub struct OverlapGraph {
    genome_ids: Vec<String>,
    graph: UnGraphMap<usize, u32>,
}

/// One connected group of genomes, rendered as a single subplot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub genome_ids: Vec<String>,
    /// Edges with genome positions local to `genome_ids`.
    pub edges: Vec<Edge>,
}

impl OverlapGraph {
    pub fn build(pairwise: &PairwiseOverlapMatrix, membership: &ClusterMembershipMatrix) -> Self {
        let ids = pairwise.genome_ids();
        let n = ids.len();
        let rows: Vec<Vec<u32>> = ids.iter().map(|g| membership.dense_row(g)).collect();

        let mut graph = UnGraphMap::with_capacity(n, 0);
        for a in 0..n {
            graph.add_node(a);
        }
        for a in 0..n {
            for b in (a + 1)..n {
                if pairwise.get(a, b) == 0 {
                    continue;
                }
                let weight = rows[a]
                    .iter()
                    .zip(&rows[b])
                    .filter(|&(&x, &y)| x > 0 && y > 0)
                    .count() as u32;
                if weight > 0 {
                    graph.add_edge(a, b, weight);
                }
            }
        }

        let isolates: Vec<usize> = graph
            .nodes()
            .filter(|&node| graph.neighbors(node).next().is_none())
            .collect();
        for node in isolates {
            graph.remove_node(node);
        }

        Self {
            genome_ids: ids.to_vec(),
            graph,
        }
    }

    /// Genomes left after isolate removal.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// All edges with `a < b`, ordered by `(a, b)`.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .graph
            .all_edges()
            .map(|(x, y, &weight)| Edge {
                a: x.min(y),
                b: x.max(y),
                weight,
            })
            .collect();
        edges.sort_unstable_by_key(|e| (e.a, e.b));
        edges
    }

    pub fn weight(&self, a: usize, b: usize) -> Option<u32> {
        self.graph.edge_weight(a, b).copied()
    }

    /// Connected components ordered by their first genome. Empty when the
    /// graph has no edges.
    pub fn components(&self) -> Vec<Component> {
        let mut nodes: Vec<usize> = self.graph.nodes().collect();
        nodes.sort_unstable();
        let edges = self.edges();

        let mut seen = vec![false; self.genome_ids.len()];
        let mut components = Vec::new();
        for start in nodes {
            if seen[start] {
                continue;
            }
            let mut members = Vec::new();
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(node) = bfs.next(&self.graph) {
                seen[node] = true;
                members.push(node);
            }
            members.sort_unstable();

            let local = |g: usize| members.binary_search(&g).ok();
            let component_edges = edges
                .iter()
                .filter_map(|e| {
                    Some(Edge {
                        a: local(e.a)?,
                        b: local(e.b)?,
                        weight: e.weight,
                    })
                })
                .collect();
            components.push(Component {
                genome_ids: members.iter().map(|&g| self.genome_ids[g].clone()).collect(),
                edges: component_edges,
            });
        }
        components
    }
}
