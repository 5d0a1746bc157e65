// src/amplicons.rs

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use ahash::{AHashMap, AHashSet};

use crate::error::{Result, RibdifError};
use crate::fasta::numbered_lines;
use crate::label::SequenceLabel;

const AMPLICON_PREFIX: &str = "amp_";

/// One row of the in-silico PCR summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmpliconSummaryRow {
    pub amp_id: String,
    pub sequence_id: String,
    pub position: Option<u64>,
    pub length: Option<u64>,
}

/// The amplicon summary, keyed by amplicon id.
#[derive(Debug, Clone, Default)]
pub struct AmpliconSummary {
    rows: Vec<AmpliconSummaryRow>,
    by_amp: AHashMap<String, usize>,
}

impl AmpliconSummary {
    /// Parses a summary table in the format:
    /// ```text
    /// AmpId\tSequenceId\tPositionInSequence\tLength\tMisc
    /// ```
    /// The header row is optional.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut summary = AmpliconSummary::default();

        for line in numbered_lines(path)? {
            let (line_no, line) = line?;
            if line.trim().is_empty() || line.starts_with("AmpId") {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() < 2 || fields[0].is_empty() || fields[1].is_empty() {
                return Err(RibdifError::format(
                    path,
                    line_no,
                    "expected at least AmpId and SequenceId columns",
                ));
            }
            let number = |i: usize| -> Result<Option<u64>> {
                match fields.get(i) {
                    None => Ok(None),
                    Some(v) => v.parse().map(Some).map_err(|_| {
                        RibdifError::format(path, line_no, format!("`{}` is not a number", v))
                    }),
                }
            };
            let row = AmpliconSummaryRow {
                amp_id: fields[0].to_string(),
                sequence_id: fields[1].to_string(),
                position: number(2)?,
                length: number(3)?,
            };
            if summary.by_amp.contains_key(&row.amp_id) {
                return Err(RibdifError::format(
                    path,
                    line_no,
                    format!("duplicate amplicon id {}", row.amp_id),
                ));
            }
            summary.by_amp.insert(row.amp_id.clone(), summary.rows.len());
            summary.rows.push(row);
        }
        Ok(summary)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[AmpliconSummaryRow] {
        &self.rows
    }

    pub fn sequence_id(&self, amp_id: &str) -> Option<&str> {
        self.by_amp
            .get(amp_id)
            .map(|&i| self.rows[i].sequence_id.as_str())
    }

    /// Genome ids of every amplified sequence. Rows whose sequence id does
    /// not follow the normalised header grammar are skipped.
    pub fn genome_ids(&self) -> AHashSet<String> {
        self.rows
            .iter()
            .filter_map(|r| SequenceLabel::parse_contig(&r.sequence_id).ok())
            .map(|l| l.genome_id())
            .collect()
    }
}

/// New header for an amplicon: `amp_<n>` -> `<sequence id>_<n>`.
pub fn relabel_header(summary: &AmpliconSummary, amp_id: &str) -> Option<String> {
    let number = amp_id.strip_prefix(AMPLICON_PREFIX)?;
    let sequence_id = summary.sequence_id(amp_id)?;
    Some(format!("{}_{}", sequence_id, number))
}

/// Writes `output` as a copy of `input` with every `>amp_<n>` header
/// rewritten to its origin sequence, then removes `input`. Returns the
/// number of headers rewritten.
pub fn relabel_amplicons(summary: &AmpliconSummary, input: &Path, output: &Path) -> Result<usize> {
    let lines = numbered_lines(input)?;
    let mut writer = BufWriter::new(File::create(output)?);
    let mut rewritten = 0;

    for line in lines {
        let (line_no, line) = line?;
        match line.strip_prefix('>') {
            Some(header) if header.trim().starts_with(AMPLICON_PREFIX) => {
                let amp_id = header.trim();
                let new_header = relabel_header(summary, amp_id).ok_or_else(|| {
                    RibdifError::format(
                        input,
                        line_no,
                        format!("amplicon {} is missing from the summary table", amp_id),
                    )
                })?;
                writeln!(writer, ">{}", new_header)?;
                rewritten += 1;
            }
            _ => writeln!(writer, "{}", line)?,
        }
    }
    writer.flush()?;
    drop(writer);

    fs::remove_file(input)?;
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SUMMARY: &str = "AmpId\tSequenceId\tPositionInSequence\tLength\tMisc\n\
        amp_1\tGCF_1.1_NZ_A1.1_Bacillus_cereus_ATCC\t120\t253\tAmpLen=253\n\
        amp_2\tGCF_1.1_NZ_A1.1_Bacillus_cereus_ATCC\t9120\t253\tAmpLen=253\n\
        amp_3\tGCF_2.1_NZ_B1.1_Bacillus_sp.\t40\t251\tAmpLen=251\n";

    #[test]
    fn parses_rows_and_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bacillus-V4.summary");
        fs::write(&path, SUMMARY).unwrap();

        let summary = AmpliconSummary::from_path(&path).unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.rows()[1].position, Some(9120));
        assert_eq!(summary.sequence_id("amp_3"), Some("GCF_2.1_NZ_B1.1_Bacillus_sp."));
        let mut genomes: Vec<_> = summary.genome_ids().into_iter().collect();
        genomes.sort();
        assert_eq!(genomes, vec!["GCF_1.1", "GCF_2.1"]);
    }

    #[test]
    fn rewrites_headers_into_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let summary_path = dir.path().join("Bacillus-V4.summary");
        let input = dir.path().join("Bacillus-V4.temp.amplicons");
        let output = dir.path().join("Bacillus-V4.amplicons");
        fs::write(&summary_path, SUMMARY).unwrap();
        fs::write(&input, ">amp_1\nACGT\n>amp_3\nACGA\n").unwrap();

        let summary = AmpliconSummary::from_path(&summary_path).unwrap();
        let n = relabel_amplicons(&summary, &input, &output).unwrap();

        assert_eq!(n, 2);
        assert!(!input.exists());
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            ">GCF_1.1_NZ_A1.1_Bacillus_cereus_ATCC_1\nACGT\n>GCF_2.1_NZ_B1.1_Bacillus_sp._3\nACGA\n"
        );
        // relabelled headers parse as amplicon labels
        let label = SequenceLabel::parse_amplicon("GCF_2.1_NZ_B1.1_Bacillus_sp._3").unwrap();
        assert_eq!(label.marker_index, Some(3));
    }

    #[test]
    fn unknown_amplicon_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let summary_path = dir.path().join("s.summary");
        let input = dir.path().join("in.amplicons");
        fs::write(&summary_path, SUMMARY).unwrap();
        fs::write(&input, ">amp_9\nACGT\n").unwrap();

        let summary = AmpliconSummary::from_path(&summary_path).unwrap();
        let err = relabel_amplicons(&summary, &input, &dir.path().join("out")).unwrap_err();
        assert!(err.is_format_error());
        assert!(input.exists());
    }

    #[test]
    fn short_summary_row_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.summary");
        fs::write(&path, "amp_1\n").unwrap();
        assert!(AmpliconSummary::from_path(&path).unwrap_err().is_format_error());
    }
}
