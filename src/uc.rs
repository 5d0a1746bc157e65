// src/uc.rs

use std::path::Path;

use ahash::AHashSet;

use crate::error::{Result, RibdifError};
use crate::fasta::numbered_lines;
use crate::label::{is_named_species, SequenceLabel};
use crate::types::{ClusterRecord, GenomeSpeciesMap, RecordKind};

/// Column holding the cluster index.
const CLUSTER_COLUMN: usize = 1;
/// Column holding the query (amplicon) label.
const LABEL_COLUMN: usize = 8;
const MIN_FIELDS: usize = LABEL_COLUMN + 1;
/// Largest cluster index accepted from a table.
const MAX_CLUSTER_INDEX: usize = u32::MAX as usize;

/// A cleaned cluster table for one primer.
#[derive(Debug, Clone)]
pub struct ClusterTable {
    /// Distinct genome ids, in record order.
    pub genome_ids: Vec<String>,
    /// Hit rows sorted by (species, genome_id) with unnamed species last.
    pub records: Vec<ClusterRecord>,
    pub species: GenomeSpeciesMap,
    /// Highest cluster index seen plus one.
    pub cluster_count: usize,
}

impl ClusterTable {
    /// Rows that opened a cluster.
    pub fn seed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.kind == RecordKind::Seed)
            .count()
    }
}

/// Parses a clustering-tool table in the format:
/// ```text
/// <kind>\t<cluster>\t<len>\t<id>\t<strand>\t.\t.\t<cigar>\t<label>\t<target>
/// ```
/// `C` rows are dropped. A table with no hits is a zero-amplification
/// result for `primer`.
pub fn parse_cluster_table(path: &Path, primer: &str) -> Result<ClusterTable> {
    let mut records = Vec::new();

    for line in numbered_lines(path)? {
        let (line_no, line) = line?;
        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < MIN_FIELDS {
            return Err(RibdifError::format(
                path,
                line_no,
                format!("expected at least {} fields, found {}", MIN_FIELDS, parts.len()),
            ));
        }

        let kind = RecordKind::from_tag(parts[0].trim());
        if kind == RecordKind::ClusterSummary {
            continue;
        }

        let cluster: usize = parts[CLUSTER_COLUMN].trim().parse().map_err(|_| {
            RibdifError::format(
                path,
                line_no,
                format!("cluster index `{}` is not a non-negative integer", parts[CLUSTER_COLUMN]),
            )
        })?;
        if cluster > MAX_CLUSTER_INDEX {
            return Err(RibdifError::format(
                path,
                line_no,
                format!("cluster index {} is out of range", cluster),
            ));
        }
        let label = SequenceLabel::parse_amplicon(parts[LABEL_COLUMN])
            .map_err(|e| RibdifError::format(path, line_no, e.to_string()))?;

        records.push(ClusterRecord { kind, cluster, label });
    }

    if records.is_empty() {
        return Err(RibdifError::ZeroAmplification {
            primer: primer.to_string(),
            path: path.to_path_buf(),
        });
    }

    clean_records(path, records)
}

/// Order the hits, collect genome ids and the genome -> species map.
fn clean_records(path: &Path, mut records: Vec<ClusterRecord>) -> Result<ClusterTable> {
    // Stable: ties keep file order.
    records.sort_by_cached_key(|r| {
        (!is_named_species(r.species()), r.species().to_string(), r.genome_id())
    });

    let mut genome_ids = Vec::new();
    let mut seen = AHashSet::new();
    let mut species = GenomeSpeciesMap::new();
    let mut cluster_count = 0;

    for record in &records {
        let genome_id = record.genome_id();
        if let Some(known) = species.get(&genome_id) {
            if known != record.species() {
                return Err(RibdifError::format(
                    path,
                    0,
                    format!(
                        "genome {} is labelled both `{}` and `{}`",
                        genome_id,
                        known,
                        record.species()
                    ),
                ));
            }
        } else {
            species.insert(genome_id.clone(), record.species().to_string());
        }
        if seen.insert(genome_id.clone()) {
            genome_ids.push(genome_id);
        }
        let end = record.cluster.checked_add(1).ok_or_else(|| {
            RibdifError::format(path, 0, format!("cluster index {} is out of range", record.cluster))
        })?;
        cluster_count = cluster_count.max(end);
    }

    // Every clustered amplicon has a row, so indices stay below the row count.
    if cluster_count > records.len() {
        return Err(RibdifError::format(
            path,
            0,
            format!(
                "cluster index {} exceeds the {} clustered amplicons",
                cluster_count - 1,
                records.len()
            ),
        ));
    }

    Ok(ClusterTable {
        genome_ids,
        records,
        species,
        cluster_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn hit(kind: &str, cluster: usize, label: &str) -> String {
        format!("{kind}\t{cluster}\t250\t100.0\t+\t0\t0\t=\t{label}\t*\n")
    }

    fn write_table(rows: &[String]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bacillus-V4.uc");
        fs::write(&path, rows.concat()).unwrap();
        (dir, path)
    }

    #[test]
    fn drops_summaries_and_orders_unnamed_last() {
        let (_dir, path) = write_table(&[
            hit("S", 0, "GCF_3.1_NZ_C1.1_Bacillus_sp._1"),
            hit("H", 0, "GCF_2.1_NZ_B1.1_Bacillus_subtilis_168_1"),
            hit("S", 2, "GCF_1.1_NZ_A1.1_Bacillus_cereus_ATCC_1"),
            hit("H", 2, "GCF_2.1_NZ_B1.1_Bacillus_subtilis_168_2"),
            "C\t0\t2\t*\t*\t*\t*\t*\tGCF_3.1_NZ_C1.1_Bacillus_sp._1\t*\n".to_string(),
            "C\t2\t2\t*\t*\t*\t*\t*\tGCF_1.1_NZ_A1.1_Bacillus_cereus_ATCC_1\t*\n".to_string(),
        ]);

        let table = parse_cluster_table(&path, "V4").unwrap();
        assert_eq!(table.records.len(), 4);
        assert_eq!(table.genome_ids, vec!["GCF_1.1", "GCF_2.1", "GCF_3.1"]);
        assert_eq!(table.species["GCF_3.1"], "sp.");
        assert_eq!(table.species["GCF_1.1"], "cereus");
        // max index + 1, not the number of distinct clusters
        assert_eq!(table.cluster_count, 3);
    }

    #[test]
    fn unnamed_genomes_sort_after_named() {
        let (_dir, path) = write_table(&[
            hit("S", 0, "GCF_9.1_NZ_C1.1_Bacillus_sp._1"),
            hit("H", 0, "GCF_4.1_NZ_C1.1_Bacillus_sp._1"),
            hit("H", 0, "GCF_5.1_NZ_C1.1_Bacillus_anthracis_Ames_1"),
        ]);

        let table = parse_cluster_table(&path, "V4").unwrap();
        assert_eq!(table.genome_ids, vec!["GCF_5.1", "GCF_4.1", "GCF_9.1"]);
    }

    #[test]
    fn short_rows_are_format_errors() {
        let (_dir, path) = write_table(&["H\t0\t250\n".to_string()]);
        let err = parse_cluster_table(&path, "V4").unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn bad_cluster_index_is_a_format_error() {
        let (_dir, path) = write_table(&[hit("H", 0, "GCF_1.1_NZ_A1.1_Bacillus_cereus_1").replace("\t0\t", "\tx\t")]);
        let err = parse_cluster_table(&path, "V4").unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn only_summaries_means_zero_amplification() {
        let (_dir, path) = write_table(&[
            "C\t0\t2\t*\t*\t*\t*\t*\tGCF_3.1_NZ_C1.1_Bacillus_sp._1\t*\n".to_string(),
        ]);
        let err = parse_cluster_table(&path, "V4").unwrap_err();
        assert!(matches!(err, RibdifError::ZeroAmplification { ref primer, .. } if primer == "V4"));
    }

    #[test]
    fn missing_table_is_reported() {
        let err = parse_cluster_table(Path::new("/no/such/Bacillus-V4.uc"), "V4").unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn huge_cluster_index_is_a_format_error() {
        let (_dir, path) = write_table(&[hit("H", usize::MAX, "GCF_1.1_NZ_A1.1_Bacillus_cereus_1")]);
        let err = parse_cluster_table(&path, "V4").unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn cluster_index_beyond_row_count_is_a_format_error() {
        let (_dir, path) = write_table(&[
            hit("S", 0, "GCF_1.1_NZ_A1.1_Bacillus_cereus_1"),
            hit("S", 1_000_000, "GCF_2.1_NZ_B1.1_Bacillus_subtilis_1"),
        ]);
        let err = parse_cluster_table(&path, "V4").unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn counts_seed_rows() {
        let (_dir, path) = write_table(&[
            hit("S", 0, "GCF_1.1_NZ_A1.1_Bacillus_cereus_1"),
            hit("H", 0, "GCF_2.1_NZ_B1.1_Bacillus_subtilis_1"),
            hit("S", 1, "GCF_2.1_NZ_B1.1_Bacillus_subtilis_2"),
        ]);
        let table = parse_cluster_table(&path, "V4").unwrap();
        assert_eq!(table.seed_count(), 2);
        assert_eq!(table.records.iter().filter(|r| r.kind == RecordKind::Hit).count(), 1);
    }

    #[test]
    fn undecodable_label_names_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bacillus-V4.uc");
        let mut bytes = hit("S", 0, "GCF_1.1_NZ_A1.1_Bacillus_cereus_1").into_bytes();
        bytes.extend_from_slice(b"H\t0\t250\t100.0\t+\t0\t0\t=\tGCF_\xff\xfe_NZ\t*\n");
        fs::write(&path, bytes).unwrap();

        let err = parse_cluster_table(&path, "V4").unwrap_err();
        assert!(err.is_format_error());
        let msg = err.to_string();
        assert!(msg.contains("Bacillus-V4.uc"));
        assert!(msg.contains("line 2"));
    }
}
