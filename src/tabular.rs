use crate::error::{CircError, Result};
use num_format::{Locale, ToFormattedString};
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnInvalid {
    /// Abort the whole operation with the row's error.
    #[default]
    Fail,
    /// Log a warning and drop the row.
    Skip,
}

impl OnInvalid {
    pub fn from_skip_flag(skip: bool) -> Self {
        if skip {
            OnInvalid::Skip
        } else {
            OnInvalid::Fail
        }
    }

    /// Resolve a per-row result: `Ok(None)` means the row was skipped.
    /// Errors that are not about a single row always propagate.
    pub fn apply<T>(&self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if *self == OnInvalid::Skip && e.is_row_error() => {
                log::warn!("skipping {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Split a tab separated line, requiring at least `min` columns.
/// # Example
/// ```
/// use circkit::tabular::split_fields;
/// let fields = split_fields("chr1\t10\t20\tname", 3, 1).unwrap();
/// assert_eq!(fields, vec!["chr1", "10", "20", "name"]);
/// assert!(split_fields("chr1\t10", 3, 7).is_err());
/// ```
pub fn split_fields(line: &str, min: usize, line_no: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < min {
        return Err(CircError::malformed(
            line_no,
            format!("expected at least {} columns, found {}", min, fields.len()),
        ));
    }
    Ok(fields)
}

/// Parse one column, naming it in the error.
pub fn parse_field<T: FromStr>(field: &str, name: &str, line_no: usize) -> Result<T>
where
    T::Err: fmt::Display,
{
    field.trim().parse::<T>().map_err(|e| {
        CircError::malformed(line_no, format!("invalid {} {:?}: {}", name, field, e))
    })
}

/// Iterate over the non-empty lines of a reader along with their 1-based line numbers.
pub fn numbered_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, String)>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(l) => {
                let l = l.trim_end_matches('\r').to_string();
                if l.trim().is_empty() {
                    None
                } else {
                    Some(Ok((idx + 1, l)))
                }
            }
            Err(e) => Some(Err(CircError::from(e))),
        })
}

/// Record counts reported by every filtering operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub read: usize,
    pub kept: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn dropped(&self) -> usize {
        self.read.saturating_sub(self.kept + self.skipped)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} records read, {} kept, {} dropped, {} skipped as invalid",
            self.read.to_formatted_string(&Locale::en),
            self.kept.to_formatted_string(&Locale::en),
            self.dropped().to_formatted_string(&Locale::en),
            self.skipped.to_formatted_string(&Locale::en),
        )
    }
}
