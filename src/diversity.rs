// src/diversity.rs

use std::path::Path;

use crate::error::{Result, RibdifError};
use crate::fasta::read_fasta_records;
use crate::types::Diversity;

/// Symbols counted per alignment column; anything else only adds to the
/// denominator.
const DIVERSITY_SYMBOLS: [u8; 5] = [b'A', b'G', b'C', b'T', b'-'];

/// Total Shannon diversity (natural log) summed over alignment columns.
pub fn shannon_diversity(path: &Path) -> Result<f64> {
    let records = read_fasta_records(path)?;
    let Some(first) = records.first() else {
        return Err(RibdifError::format(path, 0, "alignment has no sequences"));
    };
    let width = first.seq.len();
    if let Some(bad) = records.iter().find(|r| r.seq.len() != width) {
        return Err(RibdifError::format(
            path,
            0,
            format!(
                "aligned length of {} is {}, expected {}",
                bad.header,
                bad.seq.len(),
                width
            ),
        ));
    }

    let n_seqs = records.len() as f64;
    let mut total = 0.0;
    for col in 0..width {
        let mut counts = [0u32; DIVERSITY_SYMBOLS.len()];
        for rec in &records {
            let base = rec.seq.as_bytes()[col].to_ascii_uppercase();
            if let Some(i) = DIVERSITY_SYMBOLS.iter().position(|&s| s == base) {
                counts[i] += 1;
            }
        }
        total -= counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / n_seqs;
                p * p.ln()
            })
            .sum::<f64>();
    }
    Ok(total)
}

/// Diversity of an optional alignment; `Skipped` when it does not exist.
pub fn diversity_for(path: &Path) -> Result<Diversity> {
    if path.is_file() {
        Ok(Diversity::Value(shannon_diversity(path)?))
    } else {
        log::debug!("No alignment at {}, diversity skipped", path.display());
        Ok(Diversity::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;

    #[test]
    fn identical_sequences_have_zero_diversity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.aln");
        fs::write(&path, ">a\nACGT\n>b\nACGT\n").unwrap();
        assert_relative_eq!(shannon_diversity(&path).unwrap(), 0.0);
    }

    #[test]
    fn sums_column_entropy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.aln");
        // col 0: A/G -> ln 2; col 1: C/- -> ln 2; col 2: T/T -> 0
        fs::write(&path, ">a\nACT\n>b\nG-t\n").unwrap();
        assert_relative_eq!(
            shannon_diversity(&path).unwrap(),
            2.0 * std::f64::consts::LN_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn unknown_symbols_lower_probabilities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.aln");
        fs::write(&path, ">a\nA\n>b\nN\n").unwrap();
        // only p(A) = 0.5 contributes
        assert_relative_eq!(
            shannon_diversity(&path).unwrap(),
            0.5 * std::f64::consts::LN_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn ragged_alignment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.aln");
        fs::write(&path, ">a\nACGT\n>b\nAC\n").unwrap();
        assert!(shannon_diversity(&path).unwrap_err().is_format_error());
    }

    #[test]
    fn missing_alignment_is_skipped() {
        let d = diversity_for(Path::new("/no/such/alignment.aln")).unwrap();
        assert_eq!(d, Diversity::Skipped);
        assert_eq!(d.to_string(), "skipped");
    }
}
