// src/export.rs

use std::fs;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::error::Result;
use crate::graph::Component;
use crate::label::UNNAMED_SPECIES;
use crate::membership::ClusterMembershipMatrix;
use crate::overlaps::PairwiseOverlapMatrix;
use crate::types::GenomeSpeciesMap;

pub fn confusion_path(outdir: &Path, genus: &str, primer: &str) -> PathBuf {
    outdir.join(format!("{}-{}_confusion.csv", genus, primer))
}

pub fn membership_path(outdir: &Path, genus: &str, primer: &str) -> PathBuf {
    outdir.join(format!("{}-{}_clusters.csv", genus, primer))
}

pub fn components_path(outdir: &Path, genus: &str, primer: &str) -> PathBuf {
    outdir
        .join("figures")
        .join(format!("{}-{}_components.tsv", genus, primer))
}

fn species_of<'a>(species: &'a GenomeSpeciesMap, genome_id: &str) -> &'a str {
    species
        .get(genome_id)
        .map(String::as_str)
        .unwrap_or(UNNAMED_SPECIES)
}

/// Genome x genome overlap matrix, rows labelled by species.
pub fn write_confusion_csv(
    path: &Path,
    pairwise: &PairwiseOverlapMatrix,
    species: &GenomeSpeciesMap,
) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header = vec![""];
    header.extend(pairwise.genome_ids().iter().map(String::as_str));
    writer.write_record(&header)?;

    for (a, genome_id) in pairwise.genome_ids().iter().enumerate() {
        let mut record = vec![species_of(species, genome_id).to_string()];
        record.extend(pairwise.row(a).iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Dense membership matrix: one row per genome, one column per cluster.
pub fn write_membership_csv(
    path: &Path,
    membership: &ClusterMembershipMatrix,
    species: &GenomeSpeciesMap,
) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header = vec!["genome_id".to_string(), "species".to_string()];
    header.extend((0..membership.cluster_count()).map(|c| c.to_string()));
    writer.write_record(&header)?;

    for (genome_id, row) in membership.genome_ids().iter().zip(membership.to_dense()) {
        let mut record = vec![genome_id.clone(), species_of(species, genome_id).to_string()];
        record.extend(row.iter().map(|n| n.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Edge list of every connected component, for the graph renderer.
pub fn write_components_tsv(path: &Path, components: &[Component]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record(["component", "genome_a", "genome_b", "weight"])?;

    for (i, component) in components.iter().enumerate() {
        for edge in &component.edges {
            writer.write_record([
                i.to_string(),
                component.genome_ids[edge.a].clone(),
                component.genome_ids[edge.b].clone(),
                edge.weight.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
