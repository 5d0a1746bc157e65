// src/membership.rs

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::types::ClusterRecord;

/// Per-genome amplicon counts in each cluster, stored sparsely.
///
/// Rows keep the genome order they were built with; each row maps a
/// cluster index to the number of that genome's amplicons in it. Columns
/// run over `0..cluster_count` even when some indices never occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMembershipMatrix {
    genome_ids: Vec<String>,
    row_of: AHashMap<String, usize>,
    rows: Vec<BTreeMap<usize, u32>>,
    cluster_count: usize,
}

impl ClusterMembershipMatrix {
    /// Count every hit at `[genome_id][cluster]`. Genomes without hits get
    /// an empty (all-zero) row; hits from genomes not listed are ignored.
    pub fn build(genome_ids: &[String], records: &[ClusterRecord], cluster_count: usize) -> Self {
        let row_of: AHashMap<String, usize> = genome_ids
            .iter()
            .enumerate()
            .map(|(i, g)| (g.clone(), i))
            .collect();
        let mut rows = vec![BTreeMap::new(); genome_ids.len()];

        for record in records {
            if let Some(&row) = row_of.get(&record.genome_id()) {
                *rows[row].entry(record.cluster).or_insert(0) += 1;
            }
        }

        Self {
            genome_ids: genome_ids.to_vec(),
            row_of,
            rows,
            cluster_count,
        }
    }

    pub fn genome_ids(&self) -> &[String] {
        &self.genome_ids
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn len(&self) -> usize {
        self.genome_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genome_ids.is_empty()
    }

    pub fn count(&self, genome_id: &str, cluster: usize) -> u32 {
        self.row_of
            .get(genome_id)
            .and_then(|&row| self.rows[row].get(&cluster))
            .copied()
            .unwrap_or(0)
    }

    /// Nonzero `(cluster, count)` pairs of one genome, by cluster index.
    pub fn row(&self, genome_id: &str) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.row_of
            .get(genome_id)
            .into_iter()
            .flat_map(move |&row| self.rows[row].iter().map(|(&c, &n)| (c, n)))
    }

    /// Number of distinct clusters a genome's amplicons fall into.
    pub fn nonzero_clusters(&self, genome_id: &str) -> usize {
        self.row(genome_id).filter(|&(_, n)| n > 0).count()
    }

    pub fn amplicon_count(&self, genome_id: &str) -> u32 {
        self.row(genome_id).map(|(_, n)| n).sum()
    }

    /// Genomes whose amplicons span more than one cluster.
    pub fn multi_allele_count(&self) -> usize {
        self.genome_ids
            .iter()
            .filter(|g| self.nonzero_clusters(g) > 1)
            .count()
    }

    /// Genome ids with more than `threshold` amplicons in `cluster`.
    pub fn genomes_in_cluster(&self, cluster: usize, threshold: u32) -> impl Iterator<Item = &str> + '_ {
        self.genome_ids
            .iter()
            .zip(&self.rows)
            .filter(move |(_, row)| row.get(&cluster).copied().unwrap_or(0) > threshold)
            .map(|(g, _)| g.as_str())
    }

    /// Dense `cluster_count`-wide row, for exporters and renderers.
    pub fn dense_row(&self, genome_id: &str) -> Vec<u32> {
        let mut dense = vec![0; self.cluster_count];
        for (c, n) in self.row(genome_id) {
            dense[c] = n;
        }
        dense
    }

    pub fn to_dense(&self) -> Vec<Vec<u32>> {
        self.genome_ids.iter().map(|g| self.dense_row(g)).collect()
    }
}
