// src/summary.rs

//! Per-genome summary table: marker copy number, spread of pairwise
//! mismatches between the genome's marker copies, and their total
//! diversity.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use rayon::prelude::*;

use crate::census::GenomeCensus;
use crate::diversity::shannon_diversity;
use crate::error::{Result, RibdifError};

/// Pairwise mismatch counts produced by the ANI collaborator.
pub const MISMATCH_TABLE: &str = "ANIm_similarity_errors.tab";
const ALIGNMENT_EXTENSION: &str = "16sAln";
const NOT_AVAILABLE: &str = "-";

const HEADER: [&str; 9] = [
    "GCF", "Genus", "Species", "#16S", "Mean", "SD", "Min", "Max", "TotalDiv",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MismatchStats {
    /// No mismatch table for this genome.
    Missing,
    Computed { mean: f64, sd: f64, min: f64, max: f64 },
}

impl MismatchStats {
    fn zero() -> Self {
        MismatchStats::Computed {
            mean: 0.0,
            sd: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }

    fn fields(&self) -> [String; 4] {
        match *self {
            MismatchStats::Missing => std::array::from_fn(|_| NOT_AVAILABLE.to_string()),
            MismatchStats::Computed { mean, sd, min, max } => [
                round2(mean).to_string(),
                round2(sd).to_string(),
                min.to_string(),
                max.to_string(),
            ],
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenomeSummaryRow {
    pub genome_id: String,
    pub genus: String,
    pub species: String,
    pub copies: u32,
    pub mismatch: MismatchStats,
    /// `None` when the genome has no marker alignment.
    pub total_diversity: Option<f64>,
}

pub fn genome_summary_path(outdir: &Path, genus: &str) -> PathBuf {
    outdir.join(format!("{}_16S_summary.tsv", genus))
}

/// Reads a square, tab-separated matrix with a header row and a leading
/// label column.
pub fn read_mismatch_matrix(path: &Path) -> Result<Vec<Vec<f64>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line_no = idx + 2;
        let values = record
            .iter()
            .skip(1)
            .map(|v| {
                v.trim().parse::<f64>().map_err(|_| {
                    RibdifError::format(path, line_no, format!("`{}` is not a number", v))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(values);
    }

    let n = rows.len();
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
        return Err(RibdifError::format(
            path,
            idx + 2,
            format!("expected {} values, found {}", n, row.len()),
        ));
    }
    Ok(rows)
}

/// Mean, sample SD, min and max over the upper triangle (diagonal
/// excluded). A matrix with at most one entry yields zeros.
pub fn mismatch_stats(matrix: &[Vec<f64>]) -> MismatchStats {
    if matrix.len() <= 1 {
        return MismatchStats::zero();
    }
    let upper: Vec<f64> = matrix
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().skip(i + 1).copied())
        .collect();
    let n = upper.len() as f64;
    let mean = upper.iter().sum::<f64>() / n;
    // a single pair has no spread
    let sd = if upper.len() > 1 {
        (upper.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    MismatchStats::Computed {
        mean,
        sd,
        min: upper.iter().copied().fold(f64::INFINITY, f64::min),
        max: upper.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn mismatch_for(genome_dir: &Path) -> Result<MismatchStats> {
    let path = genome_dir.join("ani").join(MISMATCH_TABLE);
    if !path.is_file() {
        return Ok(MismatchStats::Missing);
    }
    Ok(mismatch_stats(&read_mismatch_matrix(&path)?))
}

/// First `*.16sAln` file in `genome_dir`, by name.
fn find_alignment(genome_dir: &Path) -> Result<Option<PathBuf>> {
    if !genome_dir.is_dir() {
        return Ok(None);
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(genome_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == ALIGNMENT_EXTENSION) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().next())
}

/// One row per census genome, in census order. `genome_dir` maps a genome
/// id to the directory holding its alignment and `ani/` output.
pub fn summarise_genomes<F>(census: &GenomeCensus, genome_dir: F) -> Result<Vec<GenomeSummaryRow>>
where
    F: Fn(&str) -> PathBuf + Sync,
{
    census
        .genome_ids()
        .par_iter()
        .filter_map(|id| census.get(id).map(|entry| (id, entry)))
        .map(|(id, entry)| {
            let dir = genome_dir(id);
            let total_diversity = match find_alignment(&dir)? {
                Some(aln) => Some(shannon_diversity(&aln)?),
                None => None,
            };
            Ok(GenomeSummaryRow {
                genome_id: id.clone(),
                genus: entry.genus.clone(),
                species: entry.species.clone(),
                copies: entry.count,
                mismatch: mismatch_for(&dir)?,
                total_diversity,
            })
        })
        .collect()
}

pub fn write_genome_summary(path: &Path, rows: &[GenomeSummaryRow]) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record(HEADER)?;

    for row in rows {
        let [mean, sd, min, max] = row.mismatch.fields();
        writer.write_record([
            row.genome_id.clone(),
            row.genus.clone(),
            row.species.clone(),
            row.copies.to_string(),
            mean,
            sd,
            min,
            max,
            row.total_diversity
                .map(|d| d.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
