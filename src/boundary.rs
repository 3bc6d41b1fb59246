use crate::error::{CircError, Result};
use crate::genome::ChromSizes;
use crate::myio;
use crate::tabular::{numbered_lines, parse_field, split_fields, OnInvalid, Summary};
use std::fs;
use std::io::{BufRead, Write};

/// The leading coordinates of a BED-like row. Coordinates are signed so that
/// negative values from upstream tools can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRecord<'a> {
    pub chrom: &'a str,
    pub start: i64,
    pub end: i64,
}

impl<'a> BoundaryRecord<'a> {
    pub fn parse(line: &'a str, line_no: usize) -> Result<BoundaryRecord<'a>> {
        let t = split_fields(line, 3, line_no)?;
        Ok(BoundaryRecord {
            chrom: t[0],
            start: parse_field(t[1], "start", line_no)?,
            end: parse_field(t[2], "end", line_no)?,
        })
    }

    /// Both coordinates must be positive and strictly below the chromosome length.
    /// # Example
    /// ```
    /// use circkit::boundary::BoundaryRecord;
    /// let rec = |start, end| BoundaryRecord { chrom: "chr1", start, end };
    /// assert!(!rec(0, 100).within(1000));
    /// assert!(rec(1, 999).within(1000));
    /// assert!(!rec(1, 1000).within(1000));
    /// ```
    pub fn within(&self, chrom_len: u64) -> bool {
        let len = chrom_len as i64;
        self.start > 0 && self.end > 0 && self.start < len && self.end < len
    }
}

/// Drop rows whose coordinates fall outside their chromosome; other rows are
/// written unchanged.
pub fn clean_boundaries<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    genome: &ChromSizes,
    on_invalid: OnInvalid,
) -> Result<Summary> {
    let mut summary = Summary::default();
    for line in numbered_lines(reader) {
        let (line_no, line) = line?;
        if line.starts_with('#') || line.starts_with("track") || line.starts_with("browser") {
            writeln!(out, "{}", line)?;
            continue;
        }
        summary.read += 1;
        let checked = BoundaryRecord::parse(&line, line_no).and_then(|rec| {
            genome
                .get(rec.chrom)
                .map(|len| rec.within(len))
                .ok_or_else(|| CircError::UnknownChrom {
                    chrom: rec.chrom.to_string(),
                    line: line_no,
                })
        });
        match on_invalid.apply(checked)? {
            Some(true) => {
                writeln!(out, "{}", line)?;
                summary.kept += 1;
            }
            Some(false) => log::trace!("dropping out of bounds record at line {}", line_no),
            None => summary.skipped += 1,
        }
    }
    out.flush()?;
    Ok(summary)
}

/// Clean a file in place: the original is kept as `<path>.tmp` and the
/// cleaned rows replace `<path>`. A `.gz` file stays gzipped.
pub fn clean_boundaries_in_place(
    path: &str,
    genome: &ChromSizes,
    on_invalid: OnInvalid,
) -> Result<Summary> {
    let cleaned = match path.strip_suffix(".gz") {
        Some(base) => format!("{}.cleaned.gz", base),
        None => format!("{}.cleaned", path),
    };
    let backup = format!("{}.tmp", path);
    let summary = {
        let reader = myio::reader(path)?;
        let mut out = myio::writer(&cleaned)?;
        match clean_boundaries(reader, &mut out, genome, on_invalid) {
            Ok(summary) => summary,
            Err(e) => {
                drop(out);
                fs::remove_file(&cleaned)?;
                return Err(e);
            }
        }
    };
    fs::rename(path, &backup)?;
    fs::rename(&cleaned, path)?;
    log::info!("original rows kept in {}", backup);
    Ok(summary)
}
