// src/report.rs

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashSet;

use crate::error::Result;
use crate::label::{is_named_species, UNNAMED_SPECIES};
use crate::membership::ClusterMembershipMatrix;
use crate::types::{Diversity, GenomeSpeciesMap, GenomeStats, OverlapReport};

/// Run-level inputs to a report that do not come from the cluster table.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub genus: &'a str,
    pub primer: &'a str,
    pub downloaded: GenomeStats,
    pub diversity: Diversity,
    pub user_genomes: bool,
}

/// Aggregate one primer's overlap results into an [`OverlapReport`].
///
/// `combinations` is the raw output of
/// [`species_overlap`](crate::overlaps::species_overlap); duplicates are
/// collapsed here and groups are ordered longest first, ties alphabetical.
pub fn build_overlap_report(
    ctx: &ReportContext<'_>,
    combinations: &[String],
    species: &GenomeSpeciesMap,
    membership: &ClusterMembershipMatrix,
) -> OverlapReport {
    let amplify_count = membership.len();
    let amplify_named_genomes = membership
        .genome_ids()
        .iter()
        .filter(|g| species.get(g.as_str()).is_some_and(|s| is_named_species(s)))
        .count();
    let amplify_unique_species = membership
        .genome_ids()
        .iter()
        .filter_map(|g| species.get(g.as_str()))
        .filter(|s| is_named_species(s))
        .collect::<AHashSet<_>>()
        .len();

    let mut unique: Vec<&String> = combinations.iter().collect::<BTreeSet<_>>().into_iter().collect();
    unique.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let groups: Vec<Vec<String>> = unique
        .iter()
        .map(|c| c.split('/').map(str::to_string).collect())
        .collect();

    let has_overlap: Vec<String> = groups
        .iter()
        .flatten()
        .filter(|s| s.as_str() != UNNAMED_SPECIES)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    OverlapReport {
        genus: ctx.genus.to_string(),
        primer: ctx.primer.to_string(),
        downloaded: ctx.downloaded.clone(),
        amplify_count,
        amplify_named_genomes,
        amplify_unnamed_genomes: amplify_count - amplify_named_genomes,
        amplify_unique_species,
        multi_allele: membership.multi_allele_count(),
        has_overlap,
        groups,
        diversity: ctx.diversity,
        user_genomes: ctx.user_genomes,
        single_cluster: membership.cluster_count() == 1,
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl OverlapReport {
    pub fn multi_allele_percent(&self) -> f64 {
        percent(self.multi_allele, self.amplify_count)
    }

    /// Zero for user-supplied genomes, which carry no species labels.
    pub fn overlap_percent(&self) -> f64 {
        if self.user_genomes {
            0.0
        } else {
            percent(self.has_overlap.len(), self.amplify_unique_species)
        }
    }

    /// Generate the report text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let d = &self.downloaded;
        let name = &self.primer;

        writeln!(out, "Summary of {} differentiation by {} amplicons:\n", self.genus, name).unwrap();
        writeln!(out, "\tGenomes downloaded: {}", d.genome_count).unwrap();
        writeln!(out, "\t\tWith species name: {}", d.named).unwrap();
        writeln!(out, "\t\tWithout species name: {}", d.unnamed).unwrap();
        writeln!(out, "\t\tUnique species names: {}\n", d.unique_species).unwrap();

        writeln!(out, "\tGenomes amplified by {}: {}", name, self.amplify_count).unwrap();
        writeln!(out, "\t\tWith species name: {}", self.amplify_named_genomes).unwrap();
        writeln!(out, "\t\tWithout species name: {}", self.amplify_unnamed_genomes).unwrap();
        writeln!(out, "\t\tUnique species names: {}\n", self.amplify_unique_species).unwrap();

        writeln!(
            out,
            "\t{} of {} ({:.2}%) genomes that amplified have multiple alleles.",
            self.multi_allele,
            self.amplify_count,
            self.multi_allele_percent()
        )
        .unwrap();
        writeln!(
            out,
            "\t{} of {} ({:.2}%) species that experienced amplification have at least one overlap.",
            self.has_overlap.len(),
            self.amplify_unique_species,
            self.overlap_percent()
        )
        .unwrap();
        if self.single_cluster {
            writeln!(out, "\tAll amplicons fell into a single cluster: {} cannot differentiate.", name).unwrap();
        }
        writeln!(out, "\n\tTotal shannon diversity for {} is: {}\n", name, self.diversity).unwrap();

        for (i, group) in self.groups.iter().enumerate() {
            writeln!(out, "Group {}:\t{}", i, group.join(" / ")).unwrap();
        }
        out
    }
}

pub fn report_path(outdir: &Path, genus: &str, primer: &str) -> PathBuf {
    outdir.join(format!("{}_{}_overlap_report.txt", genus, primer))
}

/// Replace the report file for this genus/primer with `report`'s text.
pub fn write_overlap_report(outdir: &Path, report: &OverlapReport) -> Result<(PathBuf, String)> {
    let path = report_path(outdir, &report.genus, &report.primer);
    let text = report.to_text();
    fs::write(&path, &text)?;
    Ok((path, text))
}
