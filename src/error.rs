// src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RibdifError>;

/// Errors raised while reading pipeline artifacts or writing reports.
#[derive(Debug, Error)]
pub enum RibdifError {
    /// A row, label or record does not match the expected schema.
    #[error("malformed {} (line {line}): {reason}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// An input artifact could not be opened at all.
    #[error("cannot open {}: {source}", path.display())]
    MissingInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cluster table holds no hit rows.
    #[error("primer {primer} produced no amplicons ({})", path.display())]
    ZeroAmplification { primer: String, path: PathBuf },

    #[error("primer file {} lists no primers", path.display())]
    EmptyPrimerFile { path: PathBuf },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl RibdifError {
    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        RibdifError::Format {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RibdifError::MissingInput {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by a malformed or absent input file.
    pub fn is_format_error(&self) -> bool {
        matches!(self, RibdifError::Format { .. } | RibdifError::MissingInput { .. })
    }
}

/// Why a sequence label could not be split into its named fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("label `{label}` has {found} `_` tokens, expected at least {expected}")]
    TooFewTokens {
        label: String,
        found: usize,
        expected: usize,
    },

    #[error("label `{label}` ends in `{token}`, not a marker index")]
    BadMarkerIndex { label: String, token: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_errors_name_the_file() {
        let err = RibdifError::format("amplicons/16S/Bacillus-16S.uc", 4, "expected 10 fields");
        assert!(err.is_format_error());
        let msg = err.to_string();
        assert!(msg.contains("Bacillus-16S.uc"));
        assert!(msg.contains("line 4"));
    }

    #[test]
    fn zero_amplification_is_not_a_format_error() {
        let err = RibdifError::ZeroAmplification {
            primer: "V3V4".into(),
            path: PathBuf::from("x.uc"),
        };
        assert!(!err.is_format_error());
        assert!(err.to_string().contains("V3V4"));
    }
}
