// src/overlaps.rs

use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};

use crate::membership::ClusterMembershipMatrix;
use crate::types::{ClusterRecord, GenomeSpeciesMap};

/// A genome must contribute more than this many amplicons to one cluster
/// for its species to count towards an overlap in that cluster.
pub const OVERLAP_MIN_AMPLICONS: u32 = 1;

/// Species combinations that collide in a cluster.
///
/// For each cluster index, take the genomes holding more than
/// [`OVERLAP_MIN_AMPLICONS`] amplicons there and map them to species. When
/// two or more species remain, their sorted names joined by `/` are
/// recorded. Results are in cluster order and may repeat.
pub fn species_overlap(
    matrix: &ClusterMembershipMatrix,
    cluster_count: usize,
    species: &GenomeSpeciesMap,
) -> Vec<String> {
    let mut combinations = Vec::new();
    for cluster in 0..cluster_count {
        let cluster_species: BTreeSet<&str> = matrix
            .genomes_in_cluster(cluster, OVERLAP_MIN_AMPLICONS)
            .filter_map(|g| species.get(g).map(String::as_str))
            .collect();
        if cluster_species.len() > 1 {
            combinations.push(cluster_species.into_iter().collect::<Vec<_>>().join("/"));
        }
    }
    combinations
}

/// Square genome x genome matrix: 1 when two genomes share any cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseOverlapMatrix {
    genome_ids: Vec<String>,
    cells: Vec<u8>,
}

impl PairwiseOverlapMatrix {
    /// Links every genome to all genomes found in any cluster it occupies.
    pub fn build(genome_ids: &[String], records: &[ClusterRecord]) -> Self {
        let n = genome_ids.len();
        let index: AHashMap<&str, usize> = genome_ids
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i))
            .collect();

        let mut cluster_members: AHashMap<usize, AHashSet<usize>> = AHashMap::new();
        let mut genome_clusters: Vec<AHashSet<usize>> = vec![AHashSet::new(); n];
        for record in records {
            if let Some(&g) = index.get(record.genome_id().as_str()) {
                cluster_members.entry(record.cluster).or_default().insert(g);
                genome_clusters[g].insert(record.cluster);
            }
        }

        let mut cells = vec![0u8; n * n];
        for (g, clusters) in genome_clusters.iter().enumerate() {
            for cluster in clusters {
                if let Some(members) = cluster_members.get(cluster) {
                    for &other in members {
                        cells[g * n + other] = 1;
                    }
                }
            }
        }

        Self {
            genome_ids: genome_ids.to_vec(),
            cells,
        }
    }

    pub fn genome_ids(&self) -> &[String] {
        &self.genome_ids
    }

    pub fn len(&self) -> usize {
        self.genome_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genome_ids.is_empty()
    }

    /// Entry by row/column position.
    pub fn get(&self, a: usize, b: usize) -> u8 {
        self.cells[a * self.len() + b]
    }

    pub fn row(&self, a: usize) -> &[u8] {
        let n = self.len();
        &self.cells[a * n..(a + 1) * n]
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|a| (a + 1..n).all(|b| self.get(a, b) == self.get(b, a)))
    }

    /// True when every pair of genomes overlaps.
    pub fn is_all_ones(&self) -> bool {
        self.cells.iter().all(|&c| c == 1)
    }
}
