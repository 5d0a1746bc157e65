// src/label.rs

//! Normalised sequence labels.
//!
//! Genome FASTA headers are rewritten upstream into a single `_`-delimited
//! token string:
//!
//! ```text
//! <acc-prefix>_<acc-number>_<contig-prefix>_<contig>_<genus>_<species>_<strain...>
//! ```
//!
//! Amplicon labels append the amplicon number as a final token. Every other
//! module consumes [`SequenceLabel`] and never re-splits the raw string.

use crate::error::LabelError;

/// Species token used for genomes without a species assignment.
pub const UNNAMED_SPECIES: &str = "sp.";

const CONTIG_MIN_TOKENS: usize = 6;
const AMPLICON_MIN_TOKENS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLabel {
    pub accession_prefix: String,
    pub accession_number: String,
    pub contig: String,
    pub genus: String,
    pub species: String,
    /// Strain tokens re-joined with `_`; empty when the header had none.
    pub strain: String,
    pub marker_index: Option<u32>,
}

impl SequenceLabel {
    /// Parse a contig/genome header (leading `>` is tolerated).
    pub fn parse_contig(header: &str) -> Result<Self, LabelError> {
        let label = header.trim().trim_start_matches('>');
        let tokens: Vec<&str> = label.split('_').collect();
        if tokens.len() < CONTIG_MIN_TOKENS {
            return Err(LabelError::TooFewTokens {
                label: label.to_string(),
                found: tokens.len(),
                expected: CONTIG_MIN_TOKENS,
            });
        }
        Ok(Self::from_tokens(&tokens, None))
    }

    /// Parse an amplicon label, whose last token is the amplicon number.
    pub fn parse_amplicon(label: &str) -> Result<Self, LabelError> {
        let label = label.trim().trim_start_matches('>');
        let tokens: Vec<&str> = label.split('_').collect();
        if tokens.len() < AMPLICON_MIN_TOKENS {
            return Err(LabelError::TooFewTokens {
                label: label.to_string(),
                found: tokens.len(),
                expected: AMPLICON_MIN_TOKENS,
            });
        }
        let (rest, last) = tokens.split_at(tokens.len() - 1);
        let last = last[0];
        let marker = last.parse::<u32>().map_err(|_| LabelError::BadMarkerIndex {
            label: label.to_string(),
            token: last.to_string(),
        })?;
        Ok(Self::from_tokens(rest, Some(marker)))
    }

    fn from_tokens(tokens: &[&str], marker_index: Option<u32>) -> Self {
        Self {
            accession_prefix: tokens[0].to_string(),
            accession_number: tokens[1].to_string(),
            contig: tokens[2..4].join("_"),
            genus: tokens[4].to_string(),
            species: tokens[5].to_string(),
            strain: tokens[6..].join("_"),
            marker_index,
        }
    }

    /// The first two tokens, e.g. `GCF_000005845.2`.
    pub fn genome_id(&self) -> String {
        format!("{}_{}", self.accession_prefix, self.accession_number)
    }

    pub fn is_named(&self) -> bool {
        self.species != UNNAMED_SPECIES
    }
}

/// True unless `species` is the unnamed sentinel.
pub fn is_named_species(species: &str) -> bool {
    species != UNNAMED_SPECIES
}
