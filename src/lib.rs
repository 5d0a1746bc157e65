// src/lib.rs
pub mod amplicons;
pub mod census;
pub mod diversity;
pub mod error;
pub mod export;
pub mod fasta;
pub mod graph;
pub mod label;
pub mod membership;
pub mod overlaps;
pub mod primers;
pub mod report;
pub mod summary;
pub mod types;
pub mod uc;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::amplicons::{relabel_amplicons, AmpliconSummary};
use crate::census::GenomeCensus;
use crate::diversity::diversity_for;
use crate::error::Result;
use crate::export::{
    components_path, confusion_path, membership_path, write_components_tsv, write_confusion_csv,
    write_membership_csv,
};
use crate::graph::{Component, OverlapGraph};
use crate::membership::ClusterMembershipMatrix;
use crate::overlaps::{species_overlap, PairwiseOverlapMatrix};
use crate::primers::Primer;
use crate::report::{build_overlap_report, write_overlap_report, ReportContext};
use crate::summary::{genome_summary_path, summarise_genomes, write_genome_summary};
use crate::types::{GenomeStats, OverlapReport};
use crate::uc::{parse_cluster_table, ClusterTable};

/// Where one run reads its inputs and writes its outputs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub outdir: PathBuf,
    /// Genus, or `Genus_species` when a species was requested.
    pub genus: String,
    pub threads: usize,
    /// Genomes came from the user instead of a taxonomic download.
    pub user_genomes: bool,
    /// FASTA corpus used for genome-level counts.
    pub census_path: Option<PathBuf>,
    /// Taxonomic domain directory under `refseq/`.
    pub domain: String,
}

impl RunConfig {
    pub fn new<P: Into<PathBuf>>(outdir: P, genus: &str) -> Self {
        Self {
            outdir: outdir.into(),
            genus: normalise_genus(genus),
            threads: 1,
            user_genomes: false,
            census_path: None,
            domain: "bacteria".to_string(),
        }
    }

    fn amplicon_dir(&self) -> PathBuf {
        self.outdir.join("amplicons")
    }

    pub fn cluster_table_path(&self, primer: &str) -> PathBuf {
        self.amplicon_dir()
            .join(primer)
            .join(format!("{}-{}.uc", self.genus, primer))
    }

    pub fn alignment_path(&self, primer: &str) -> PathBuf {
        self.amplicon_dir()
            .join(primer)
            .join(format!("{}-{}.aln", self.genus, primer))
    }

    pub fn summary_path(&self, primer: &str) -> PathBuf {
        self.amplicon_dir().join(format!("{}-{}.summary", self.genus, primer))
    }

    pub fn raw_amplicons_path(&self, primer: &str) -> PathBuf {
        self.amplicon_dir()
            .join(format!("{}-{}.temp.amplicons", self.genus, primer))
    }

    pub fn amplicons_path(&self, primer: &str) -> PathBuf {
        self.amplicon_dir().join(format!("{}-{}.amplicons", self.genus, primer))
    }

    /// Per-genome download directory holding marker alignments and `ani/`.
    pub fn genome_dir(&self, genome_id: &str) -> PathBuf {
        self.outdir.join("refseq").join(&self.domain).join(genome_id)
    }

    pub fn genome_summary_path(&self) -> PathBuf {
        genome_summary_path(&self.outdir, &self.genus)
    }

    pub fn census_path(&self) -> PathBuf {
        self.census_path
            .clone()
            .unwrap_or_else(|| self.outdir.join("full").join(format!("{}.16S", self.genus)))
    }
}

/// `"Staphylococcus aureus"` -> `"Staphylococcus_aureus"`.
pub fn normalise_genus(genus: &str) -> String {
    genus.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Everything derived from one primer's cluster table.
pub struct PrimerAnalysis {
    pub primer: String,
    pub table: ClusterTable,
    pub membership: ClusterMembershipMatrix,
    /// Raw species combinations, in cluster order.
    pub combinations: Vec<String>,
    /// `None` when every amplicon fell into one cluster.
    pub pairwise: Option<PairwiseOverlapMatrix>,
    pub components: Vec<Component>,
    pub report: OverlapReport,
    pub report_path: PathBuf,
    pub report_text: String,
    /// Amplified genomes missing from the cluster table.
    pub filtered_genomes: Vec<String>,
}

impl PrimerAnalysis {
    pub fn is_single_cluster(&self) -> bool {
        self.pairwise.is_none()
    }

    /// Whether the graph renderer has anything to draw.
    pub fn has_graph(&self) -> bool {
        !self.components.is_empty()
    }
}

/// Run the overlap analysis for one primer and write its outputs.
pub fn analyse_primer(config: &RunConfig, primer: &str, downloaded: &GenomeStats) -> Result<PrimerAnalysis> {
    let genus = config.genus.as_str();
    let outdir = config.outdir.as_path();
    fs::create_dir_all(outdir)?;

    // 1. Parse the clustering output
    let table = parse_cluster_table(&config.cluster_table_path(primer), primer)?;
    log::info!(
        "{}: {} amplicons from {} genomes in {} clusters ({} seeds)",
        primer,
        table.records.len(),
        table.genome_ids.len(),
        table.cluster_count,
        table.seed_count()
    );

    // 2. Membership and species overlap
    let membership = ClusterMembershipMatrix::build(&table.genome_ids, &table.records, table.cluster_count);
    let combinations = species_overlap(&membership, table.cluster_count, &table.species);
    write_membership_csv(&membership_path(outdir, genus, primer), &membership, &table.species)?;

    // 3. Pairwise overlaps and the connectivity graph
    let (pairwise, components) = if table.cluster_count > 1 {
        let pairwise = PairwiseOverlapMatrix::build(&table.genome_ids, &table.records);
        write_confusion_csv(&confusion_path(outdir, genus, primer), &pairwise, &table.species)?;

        let components = OverlapGraph::build(&pairwise, &membership).components();
        if components.is_empty() {
            log::info!("{}: no genomes share a cluster, skipping graphs", primer);
            remove_stale(&components_path(outdir, genus, primer))?;
        } else {
            write_components_tsv(&components_path(outdir, genus, primer), &components)?;
        }
        (Some(pairwise), components)
    } else {
        log::warn!("{}: all amplicons fell into a single cluster", primer);
        remove_stale(&confusion_path(outdir, genus, primer))?;
        remove_stale(&components_path(outdir, genus, primer))?;
        (None, Vec::new())
    };

    // 4. Report
    let filtered_genomes = filtered_genomes(&config.summary_path(primer), &table)?;
    let ctx = ReportContext {
        genus,
        primer,
        downloaded: downloaded.clone(),
        diversity: diversity_for(&config.alignment_path(primer))?,
        user_genomes: config.user_genomes,
    };
    let report = build_overlap_report(&ctx, &combinations, &table.species, &membership);
    let (report_path, report_text) = write_overlap_report(outdir, &report)?;
    log::info!("{}", report_text);

    Ok(PrimerAnalysis {
        primer: primer.to_string(),
        table,
        membership,
        combinations,
        pairwise,
        components,
        report,
        report_path,
        report_text,
        filtered_genomes,
    })
}

/// Drop an export left by an earlier run that this run does not produce.
fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Genomes in the amplicon summary that never reached the cluster table.
fn filtered_genomes(summary_path: &Path, table: &ClusterTable) -> Result<Vec<String>> {
    if !summary_path.is_file() {
        return Ok(Vec::new());
    }
    let summary = AmpliconSummary::from_path(summary_path)?;
    let mut missing: Vec<String> = summary
        .genome_ids()
        .into_iter()
        .filter(|g| !table.species.contains_key(g))
        .collect();
    missing.sort();
    if !missing.is_empty() {
        log::debug!(
            "{} amplified genome(s) absent from the cluster table: {}",
            missing.len(),
            missing.join(", ")
        );
    }
    Ok(missing)
}

/// Genome-level counts for the run, read once and shared by all primers.
pub fn genome_stats(config: &RunConfig) -> Result<GenomeStats> {
    let census = GenomeCensus::from_fasta(config.census_path())?;
    let stats = census.stats();
    log::info!(
        "{} genomes ({} named, {} unnamed, {} species); {:.2}% carry several marker copies",
        stats.genome_count,
        stats.named,
        stats.unnamed,
        stats.unique_species,
        100.0 * census.multi_copy_fraction()
    );
    Ok(stats)
}

fn thread_pool(config: &RunConfig) -> Result<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.max(1))
        .build()?)
}

/// Write the per-genome summary table for the census corpus.
pub fn genome_summary(config: &RunConfig) -> Result<PathBuf> {
    let census = GenomeCensus::from_fasta(config.census_path())?;
    let rows = thread_pool(config)?.install(|| summarise_genomes(&census, |id| config.genome_dir(id)))?;

    fs::create_dir_all(&config.outdir)?;
    let path = config.genome_summary_path();
    write_genome_summary(&path, &rows)?;
    log::info!("Summary of {} genomes written to {}", rows.len(), path.display());
    Ok(path)
}

/// Analyse every primer on a pool of `config.threads` workers.
///
/// A failing primer leaves an `Err` in its slot; the others still run.
/// Results keep the order of `primers`.
pub fn analyse_primers(
    config: &RunConfig,
    primers: &[Primer],
) -> Result<Vec<(String, Result<PrimerAnalysis>)>> {
    let downloaded = genome_stats(config)?;
    let pool = thread_pool(config)?;

    let results: Vec<(String, Result<PrimerAnalysis>)> = pool.install(|| {
        primers
            .par_iter()
            .map(|p| {
                log::debug!("{}: forward {} reverse {}", p.name, p.forward, p.reverse);
                let result = analyse_primer(config, &p.name, &downloaded);
                if let Err(e) = &result {
                    log::error!("Primer {} failed: {}", p.name, e);
                }
                (p.name.clone(), result)
            })
            .collect()
    });
    Ok(results)
}

/// Rewrite a primer's raw amplicon headers to their origin sequences.
pub fn relabel_primer(config: &RunConfig, primer: &str) -> Result<usize> {
    let summary = AmpliconSummary::from_path(&config.summary_path(primer))?;
    let n = relabel_amplicons(
        &summary,
        &config.raw_amplicons_path(primer),
        &config.amplicons_path(primer),
    )?;
    log::info!("{}: relabelled {} amplicons", primer, n);
    Ok(n)
}
