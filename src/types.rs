//src/types.rs

use ahash::AHashMap;
use std::fmt;

use crate::label::SequenceLabel;

/// genome_id -> species name (`"sp."` for unnamed genomes).
pub type GenomeSpeciesMap = AHashMap<String, String>;

/// Column 0 of a cluster table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `C` rows summarise a whole cluster and are dropped on parse.
    ClusterSummary,
    /// `S`: the first amplicon of a new cluster.
    Seed,
    /// Any other tag, normally `H`.
    Hit,
}

impl RecordKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "C" => RecordKind::ClusterSummary,
            "S" => RecordKind::Seed,
            _ => RecordKind::Hit,
        }
    }
}

/// One hit row of the clustering tool's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub kind: RecordKind,
    pub cluster: usize,
    pub label: SequenceLabel,
}

impl ClusterRecord {
    pub fn genome_id(&self) -> String {
        self.label.genome_id()
    }

    pub fn species(&self) -> &str {
        &self.label.species
    }
}

/// Genome-level counts for the whole downloaded set, independent of primer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenomeStats {
    pub genome_count: usize,
    pub named: usize,
    pub unnamed: usize,
    pub unique_species: usize,
}

/// Total Shannon diversity of a primer's amplicon alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diversity {
    Value(f64),
    Skipped,
}

impl fmt::Display for Diversity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diversity::Value(v) => write!(f, "{}", v),
            Diversity::Skipped => f.write_str("skipped"),
        }
    }
}

/// A structured representation of one overlap report.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapReport {
    pub genus: String,
    pub primer: String,
    pub downloaded: GenomeStats,
    pub amplify_count: usize,
    pub amplify_named_genomes: usize,
    pub amplify_unnamed_genomes: usize,
    pub amplify_unique_species: usize,
    pub multi_allele: usize,
    /// Species involved in at least one overlap, `"sp."` excluded, sorted.
    pub has_overlap: Vec<String>,
    /// Distinct overlap groups, longest first; each is a sorted species list.
    pub groups: Vec<Vec<String>>,
    pub diversity: Diversity,
    /// Genomes were supplied by the user rather than taxonomically labelled.
    pub user_genomes: bool,
    /// Every amplicon fell into one cluster.
    pub single_cluster: bool,
}
