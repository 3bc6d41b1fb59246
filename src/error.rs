use thiserror::Error;

/// Result type used across circkit operations.
pub type Result<T> = std::result::Result<T, CircError>;

/// Errors raised while reading, validating, or transforming records.
#[derive(Debug, Error)]
pub enum CircError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to detect input compression: {0}")]
    Compression(#[from] niffler::Error),

    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    /// A row that does not have the columns or values its format requires.
    #[error("malformed record at line {line}: {msg}")]
    Malformed { line: usize, msg: String },

    /// A statistic was requested over an input without records.
    #[error("no records found in {0}")]
    NoData(String),

    #[error("chromosome {chrom} (line {line}) is not in the genome size table")]
    UnknownChrom { chrom: String, line: usize },

    #[error("unable to assign a strand to SAM flag {flag} (line {line}): {msg}")]
    UnclassifiableFlag { flag: String, line: usize, msg: String },

    #[error("{0} is neither a built-in assembly ({1}) nor a readable chrom.sizes file")]
    UnknownGenome(String, String),

    /// Invalid threshold or option values.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CircError {
    pub fn malformed(line: usize, msg: impl Into<String>) -> Self {
        CircError::Malformed {
            line,
            msg: msg.into(),
        }
    }

    /// Whether a per-row policy may skip this error instead of aborting.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            CircError::Malformed { .. } | CircError::UnknownChrom { .. }
        )
    }
}
