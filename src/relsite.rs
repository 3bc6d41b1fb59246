use crate::error::{CircError, Result};
use crate::tabular::{numbered_lines, parse_field, split_fields, OnInvalid, Summary};
use bio_types::strand::Strand;
use std::io::{BufRead, Write};

/// An interval with a strand: chrom, start, end, strand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandedInterval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl StrandedInterval {
    pub fn parse(line: &str, line_no: usize) -> Result<StrandedInterval> {
        let t = split_fields(line, 4, line_no)?;
        let start = parse_field(t[1], "start", line_no)?;
        let end = parse_field(t[2], "end", line_no)?;
        if start > end {
            return Err(CircError::malformed(
                line_no,
                format!("start {} is after end {}", start, end),
            ));
        }
        let strand_char = t[3].trim().chars().next().unwrap_or('.');
        let strand = Strand::from_char(&strand_char)
            .map_err(|_| CircError::malformed(line_no, format!("invalid strand {:?}", t[3])))?;
        Ok(StrandedInterval {
            chrom: t[0].to_string(),
            start,
            end,
            strand,
        })
    }
}

/// A slice of an interval and its relative position from the 5' end.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeBin {
    pub start: u64,
    pub end: u64,
    pub position: f64,
}

/// Divide an interval into `bins` equal slices ordered 5' to 3'.
/// Intervals without a strand are ordered like `+`.
/// # Example
/// ```
/// use bio_types::strand::Strand;
/// use circkit::relsite::{relative_bins, StrandedInterval};
/// let iv = StrandedInterval { chrom: "chr1".into(), start: 100, end: 200, strand: Strand::Reverse };
/// let bins = relative_bins(&iv, 4);
/// assert_eq!((bins[0].start, bins[0].end), (175, 200));
/// assert_eq!((bins[3].start, bins[3].end), (100, 125));
/// assert_eq!(bins[2].position, 0.5);
/// ```
pub fn relative_bins(interval: &StrandedInterval, bins: usize) -> Vec<RelativeBin> {
    let step = (interval.end - interval.start) as f64 / bins as f64;
    let (start, end) = (interval.start as f64, interval.end as f64);
    (0..bins)
        .map(|i| {
            let i_f = i as f64;
            let (st, en) = match interval.strand {
                Strand::Reverse => (end - i_f * step - step, end - i_f * step),
                _ => (start + i_f * step, start + i_f * step + step),
            };
            RelativeBin {
                start: st as u64,
                end: en as u64,
                position: i_f / bins as f64,
            }
        })
        .collect()
}

/// Relative positions are always written as decimals, `0.0` included.
/// # Example
/// ```
/// use circkit::relsite::format_position;
/// assert_eq!(format_position(0.0), "0.0");
/// assert_eq!(format_position(0.25), "0.25");
/// ```
pub fn format_position(position: f64) -> String {
    if position.fract() == 0.0 {
        format!("{:.1}", position)
    } else {
        position.to_string()
    }
}

/// Write the relative bins of every interval.
pub fn write_relative_sites<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    bins: usize,
    on_invalid: OnInvalid,
) -> Result<Summary> {
    if bins == 0 {
        return Err(CircError::Config("number of bins must be greater than zero".to_string()));
    }
    let mut summary = Summary::default();
    for line in numbered_lines(reader) {
        let (line_no, line) = line?;
        if line.starts_with('#') {
            continue;
        }
        summary.read += 1;
        let interval = match on_invalid.apply(StrandedInterval::parse(&line, line_no))? {
            Some(interval) => interval,
            None => {
                summary.skipped += 1;
                continue;
            }
        };
        for bin in relative_bins(&interval, bins) {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                interval.chrom,
                bin.start,
                bin.end,
                interval.strand.strand_symbol(),
                format_position(bin.position)
            )?;
        }
        summary.kept += 1;
    }
    out.flush()?;
    Ok(summary)
}
