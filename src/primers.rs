use std::path::Path;

use crate::error::{Result, RibdifError};
use crate::fasta::numbered_lines;

/// IUPAC nucleotide codes accepted in primer sequences.
const IUPAC_BASES: &[u8] = b"ACGTURYSWKMBDHVNI";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primer {
    pub name: String,
    pub forward: String,
    pub reverse: String,
}

/// Parses a primer file in the format:
/// ```text
/// <name>\t<forward>\t<reverse>
/// ```
pub fn parse_primer_file(path: &Path) -> Result<Vec<Primer>> {
    let mut primers = Vec::new();

    for line in numbered_lines(path)? {
        let (line_no, line) = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.trim().split('\t').map(str::trim).collect();
        if parts.len() < 3 || parts[..3].iter().any(|p| p.is_empty()) {
            return Err(RibdifError::format(
                path,
                line_no,
                "expected name, forward and reverse primer separated by tabs",
            ));
        }
        if let Some(bad) = parts[1..3]
            .iter()
            .find(|seq| !seq.bytes().all(|b| IUPAC_BASES.contains(&b.to_ascii_uppercase())))
        {
            return Err(RibdifError::format(
                path,
                line_no,
                format!("primer {} has non-IUPAC sequence `{}`", parts[0], bad),
            ));
        }
        primers.push(Primer {
            name: parts[0].to_string(),
            forward: parts[1].to_string(),
            reverse: parts[2].to_string(),
        });
    }

    if primers.is_empty() {
        return Err(RibdifError::EmptyPrimerFile {
            path: path.to_path_buf(),
        });
    }
    Ok(primers)
}
