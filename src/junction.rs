use crate::error::{CircError, Result};
use crate::tabular::{numbered_lines, parse_field, split_fields, OnInvalid, Summary};
use std::io::{BufRead, Write};

/// Minimum number of columns for a junction record (up to `n_uniq`).
pub const JUNCTION_COLUMNS: usize = 7;

/// A back-splice junction record in the find_circ/CIRCexplorer BED layout:
/// chrom, start, end, name, n_reads, strand, n_uniq, then free-form columns.
/// Column 5 is not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionRecord {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
    pub strand: String,
    /// Uniquely mapped reads supporting the junction (column 7).
    pub n_uniq: u64,
    /// The original line, written back verbatim when the record is kept.
    pub line: String,
}

impl JunctionRecord {
    /// # Example
    /// ```
    /// use circkit::junction::JunctionRecord;
    /// let rec = JunctionRecord::parse("chr1\t100\t900\tcirc_1\t12\t+\t10\t40\t40", 1).unwrap();
    /// assert_eq!(rec.n_uniq, 10);
    /// assert_eq!(rec.end - rec.start, 800);
    /// assert_eq!((rec.name.as_str(), rec.strand.as_str()), ("circ_1", "+"));
    /// ```
    pub fn parse(line: &str, line_no: usize) -> Result<JunctionRecord> {
        let t = split_fields(line, JUNCTION_COLUMNS, line_no)?;
        Ok(JunctionRecord {
            chrom: t[0].to_string(),
            start: parse_field(t[1], "start", line_no)?,
            end: parse_field(t[2], "end", line_no)?,
            name: t[3].to_string(),
            strand: t[5].to_string(),
            n_uniq: parse_field(t[6], "junction read count", line_no)?,
            line: line.to_string(),
        })
    }
}

/// Thresholds for [`filter_junctions`].
#[derive(Debug, Clone, Copy)]
pub struct JunctionThresholds {
    /// Records must have strictly more junction reads than this.
    pub min_count: u64,
    /// Records must have strictly fewer junction reads than `fraction * max`.
    pub fraction: f64,
}

impl Default for JunctionThresholds {
    fn default() -> Self {
        JunctionThresholds {
            min_count: 1,
            fraction: 0.95,
        }
    }
}

impl JunctionThresholds {
    pub fn validate(&self) -> Result<()> {
        if !self.fraction.is_finite() || self.fraction <= 0.0 {
            return Err(CircError::Config(format!(
                "fraction of the maximum must be a positive number, got {}",
                self.fraction
            )));
        }
        Ok(())
    }

    /// Upper bound computed from the maximum junction count in the input.
    pub fn percent_cutoff(&self, max_count: u64) -> f64 {
        max_count as f64 * self.fraction
    }

    /// Both bounds are exclusive.
    /// # Example
    /// ```
    /// use circkit::junction::JunctionThresholds;
    /// let th = JunctionThresholds { min_count: 1, fraction: 0.95 };
    /// assert!(th.passes(50, 100));
    /// assert!(!th.passes(96, 100));
    /// assert!(!th.passes(95, 100));
    /// assert!(!th.passes(1, 100));
    /// ```
    pub fn passes(&self, count: u64, max_count: u64) -> bool {
        count > self.min_count && (count as f64) < self.percent_cutoff(max_count)
    }
}

/// Read every junction record, applying the invalid-row policy.
pub fn read_junctions<R: BufRead>(
    reader: R,
    on_invalid: OnInvalid,
    summary: &mut Summary,
) -> Result<Vec<JunctionRecord>> {
    let mut records = Vec::new();
    for line in numbered_lines(reader) {
        let (line_no, line) = line?;
        if line.starts_with('#') || line.starts_with("track") {
            continue;
        }
        summary.read += 1;
        match on_invalid.apply(JunctionRecord::parse(&line, line_no))? {
            Some(rec) => records.push(rec),
            None => summary.skipped += 1,
        }
    }
    Ok(records)
}

/// Maximum junction count. The input is expected to be sorted by descending
/// count, in which case this is the first record.
pub fn max_junction_count(records: &[JunctionRecord], source: &str) -> Result<u64> {
    let first = records
        .first()
        .ok_or_else(|| CircError::NoData(source.to_string()))?;
    let max = records.iter().map(|r| r.n_uniq).max().unwrap_or(first.n_uniq);
    if max != first.n_uniq {
        log::warn!(
            "{} is not sorted by descending junction count: first record has {} but the maximum is {}",
            source,
            first.n_uniq,
            max
        );
    }
    Ok(max)
}

/// Keep records whose junction count lies strictly between `min_count` and
/// `fraction * max_count`, writing kept lines unchanged.
pub fn filter_junctions<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    thresholds: &JunctionThresholds,
    on_invalid: OnInvalid,
    source: &str,
) -> Result<Summary> {
    thresholds.validate()?;
    let mut summary = Summary::default();
    let records = read_junctions(reader, on_invalid, &mut summary)?;
    let max_count = max_junction_count(&records, source)?;
    log::info!(
        "maximum junction count {}; keeping counts > {} and < {:.2}",
        max_count,
        thresholds.min_count,
        thresholds.percent_cutoff(max_count)
    );
    for rec in &records {
        if thresholds.passes(rec.n_uniq, max_count) {
            writeln!(out, "{}", rec.line)?;
            summary.kept += 1;
        } else {
            log::trace!(
                "dropping {} {}:{}-{}({}) with {} junction reads",
                rec.name,
                rec.chrom,
                rec.start,
                rec.end,
                rec.strand,
                rec.n_uniq
            );
        }
    }
    out.flush()?;
    Ok(summary)
}

/// Cumulative distribution of junction counts: for every cutoff
/// `max, max - step, ...` above zero, the number of records with a count
/// at or below the cutoff.
/// # Example
/// ```
/// use circkit::junction::junction_distribution;
/// let dist = junction_distribution(&[10, 7, 3, 3, 1], 3).unwrap();
/// assert_eq!(dist, vec![(10, 5), (7, 4), (4, 3), (1, 1)]);
/// ```
pub fn junction_distribution(counts: &[u64], step: u64) -> Result<Vec<(u64, usize)>> {
    if step == 0 {
        return Err(CircError::Config("step must be greater than zero".to_string()));
    }
    let max = *counts
        .iter()
        .max()
        .ok_or_else(|| CircError::NoData("junction counts".to_string()))?;
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();

    let mut dist = Vec::new();
    let mut cutoff = max;
    while cutoff > 0 {
        let n = sorted.partition_point(|&c| c <= cutoff);
        dist.push((cutoff, n));
        cutoff = cutoff.saturating_sub(step);
    }
    Ok(dist)
}

/// Write the junction count distribution as `cutoff\tn_records` rows.
pub fn write_distribution<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    step: u64,
    on_invalid: OnInvalid,
    source: &str,
) -> Result<Summary> {
    let mut summary = Summary::default();
    let records = read_junctions(reader, on_invalid, &mut summary)?;
    if records.is_empty() {
        return Err(CircError::NoData(source.to_string()));
    }
    let counts: Vec<u64> = records.iter().map(|r| r.n_uniq).collect();
    writeln!(out, "#cutoff\tn_records")?;
    for (cutoff, n) in junction_distribution(&counts, step)? {
        writeln!(out, "{}\t{}", cutoff, n)?;
        summary.kept += 1;
    }
    out.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junction_bed(counts: &[u64]) -> String {
        counts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "chr1\t{}\t{}\tcirc_{}\t{}\t+\t{}\t40\t40\tGTAG\tGTAG",
                    i * 1000,
                    i * 1000 + 500,
                    i,
                    c + 2,
                    c
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn run(counts: &[u64], th: JunctionThresholds) -> Result<(Vec<u64>, Summary)> {
        let input = junction_bed(counts);
        let mut out = Vec::new();
        let summary = filter_junctions(input.as_bytes(), &mut out, &th, OnInvalid::Fail, "test")?;
        let kept = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| JunctionRecord::parse(l, 0).unwrap().n_uniq)
            .collect();
        Ok((kept, summary))
    }

    #[test]
    fn test_percent_cutoff_is_exclusive() {
        let (kept, summary) = run(&[100, 96, 95, 94, 50, 2, 1, 0], JunctionThresholds::default()).unwrap();
        assert_eq!(kept, vec![94, 50, 2]);
        assert_eq!(summary.read, 8);
        assert_eq!(summary.kept, 3);
    }

    #[test]
    fn test_all_kept_counts_within_bounds() {
        let counts: Vec<u64> = (0..200).rev().map(|c| c * 3 % 211).collect();
        let th = JunctionThresholds {
            min_count: 5,
            fraction: 0.5,
        };
        let max = *counts.iter().max().unwrap();
        let (kept, _) = run(&counts, th).unwrap();
        assert!(!kept.is_empty());
        for c in &kept {
            assert!(*c > 5);
            assert!((*c as f64) < max as f64 * 0.5);
        }
        let expected = counts.iter().filter(|c| th.passes(**c, max)).count();
        assert_eq!(kept.len(), expected);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let mut out = Vec::new();
        let err = filter_junctions(
            "".as_bytes(),
            &mut out,
            &JunctionThresholds::default(),
            OnInvalid::Fail,
            "empty.bed",
        )
        .unwrap_err();
        assert!(matches!(err, CircError::NoData(_)));
    }

    #[test]
    fn test_bad_fraction_is_config_error() {
        let th = JunctionThresholds {
            min_count: 1,
            fraction: f64::NAN,
        };
        assert!(matches!(run(&[10], th), Err(CircError::Config(_))));
    }

    #[test]
    fn test_malformed_row_policy() {
        let input = format!("{}\nchr1\t5\t10\tbad\t3\t+\tmany\n", junction_bed(&[100, 50]));
        let mut out = Vec::new();
        let th = JunctionThresholds::default();
        let err = filter_junctions(input.as_bytes(), &mut out, &th, OnInvalid::Fail, "x").unwrap_err();
        assert!(matches!(err, CircError::Malformed { line: 3, .. }));

        let mut out = Vec::new();
        let summary = filter_junctions(input.as_bytes(), &mut out, &th, OnInvalid::Skip, "x").unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.kept, 1);
    }

    #[test]
    fn test_unsorted_input_uses_true_maximum() {
        let (kept, _) = run(&[50, 100, 80], JunctionThresholds::default()).unwrap();
        assert_eq!(kept, vec![50, 80]);
    }

    #[test]
    fn test_distribution_output() {
        let input = junction_bed(&[6, 4, 2]);
        let mut out = Vec::new();
        write_distribution(input.as_bytes(), &mut out, 2, OnInvalid::Fail, "x").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "#cutoff\tn_records\n6\t3\n4\t2\n2\t1\n");
    }

    #[test]
    fn test_distribution_requires_step() {
        assert!(junction_distribution(&[1, 2], 0).is_err());
        assert!(matches!(
            junction_distribution(&[], 1),
            Err(CircError::NoData(_))
        ));
    }
}
