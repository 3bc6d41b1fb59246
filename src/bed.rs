use crate::error::{CircError, Result};
use crate::tabular::{numbered_lines, parse_field, split_fields, OnInvalid, Summary};
use itertools::Itertools;
use std::io::{BufRead, Write};

const CHROM_START: usize = 1;
const CHROM_END: usize = 2;
const THICK_START: usize = 6;
const THICK_END: usize = 7;
const BLOCK_COUNT: usize = 9;
const BLOCK_SIZES: usize = 10;
const BLOCK_STARTS: usize = 11;

/// A BED12 row with its block structure parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bed12Record {
    pub fields: Vec<String>,
    pub start: u64,
    pub block_sizes: Vec<u64>,
    pub block_starts: Vec<u64>,
}

/// Parse a comma separated BED list; a trailing comma is allowed.
fn parse_list(field: &str, name: &str, line_no: usize) -> Result<Vec<u64>> {
    field
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_field(v, name, line_no))
        .collect()
}

impl Bed12Record {
    /// # Example
    /// ```
    /// use circkit::bed::Bed12Record;
    /// let rec = Bed12Record::parse(
    ///     "chr1\t100\t500\tcirc\t0\t+\t100\t500\t0\t2\t50,100,\t0,300,",
    ///     1,
    /// ).unwrap();
    /// assert_eq!(rec.block_sizes, vec![50, 100]);
    /// assert_eq!(rec.block_starts, vec![0, 300]);
    /// ```
    pub fn parse(line: &str, line_no: usize) -> Result<Bed12Record> {
        let t = split_fields(line, 12, line_no)?;
        let start = parse_field(t[CHROM_START], "chromStart", line_no)?;
        let count: usize = parse_field(t[BLOCK_COUNT], "blockCount", line_no)?;
        let block_sizes = parse_list(t[BLOCK_SIZES], "blockSizes", line_no)?;
        let block_starts = parse_list(t[BLOCK_STARTS], "blockStarts", line_no)?;
        if block_sizes.len() != count || block_starts.len() != count {
            return Err(CircError::malformed(
                line_no,
                format!(
                    "blockCount is {} but found {} sizes and {} starts",
                    count,
                    block_sizes.len(),
                    block_starts.len()
                ),
            ));
        }
        Ok(Bed12Record {
            fields: t.iter().map(|f| f.to_string()).collect(),
            start,
            block_sizes,
            block_starts,
        })
    }

    /// One single-block record per block longer than `min_block`.
    /// Single-block records are returned unchanged.
    pub fn split_blocks(&self, min_block: u64) -> Vec<Vec<String>> {
        if self.block_sizes.len() <= 1 {
            return vec![self.fields.clone()];
        }
        self.block_sizes
            .iter()
            .zip(self.block_starts.iter())
            .filter(|(size, _)| **size > min_block)
            .map(|(size, offset)| {
                let st = self.start + offset;
                let en = st + size;
                let mut fields = self.fields.clone();
                fields[CHROM_START] = st.to_string();
                fields[CHROM_END] = en.to_string();
                fields[THICK_START] = st.to_string();
                fields[THICK_END] = en.to_string();
                fields[BLOCK_COUNT] = "1".to_string();
                fields[BLOCK_SIZES] = size.to_string();
                fields[BLOCK_STARTS] = "0".to_string();
                fields
            })
            .collect()
    }
}

/// Split every multi-block BED12 record into single-block records.
pub fn split_bed_blocks<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    min_block: u64,
    on_invalid: OnInvalid,
) -> Result<Summary> {
    let mut summary = Summary::default();
    for line in numbered_lines(reader) {
        let (line_no, line) = line?;
        if line.starts_with('#') || line.starts_with("track") {
            writeln!(out, "{}", line)?;
            continue;
        }
        summary.read += 1;
        let rec = match on_invalid.apply(Bed12Record::parse(&line, line_no))? {
            Some(rec) => rec,
            None => {
                summary.skipped += 1;
                continue;
            }
        };
        let blocks = rec.split_blocks(min_block);
        if !blocks.is_empty() {
            summary.kept += 1;
        }
        for fields in blocks {
            writeln!(out, "{}", fields.iter().join("\t"))?;
        }
    }
    out.flush()?;
    Ok(summary)
}
