use crate::error::{CircError, Result};
use crate::tabular::{numbered_lines, parse_field, OnInvalid, Summary};
use itertools::Itertools;
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Column holding the transcript identifier.
pub const TRANSCRIPT_ID: &str = "t_id";

fn split_csv(line: &str) -> Vec<String> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').to_string())
        .collect()
}

/// One transcript row of an expression table.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub id: String,
    /// Values of the selected measure, in sample order.
    pub values: Vec<f64>,
}

/// A transcript expression table (ballgown `texpr` layout).
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionTable {
    pub samples: Vec<String>,
    pub transcripts: Vec<Transcript>,
}

/// Locate the `t_id` column and the `<measure>.<sample>` columns of a header.
/// # Example
/// ```
/// use circkit::expression::sample_columns;
/// let header = ["t_id", "chr", "cov.S1", "FPKM.S1", "cov.S2", "FPKM.S2"];
/// let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
/// let (id, samples) = sample_columns(&header, "FPKM").unwrap();
/// assert_eq!(id, 0);
/// assert_eq!(samples, vec![(3, "S1".to_string()), (5, "S2".to_string())]);
/// ```
pub fn sample_columns(header: &[String], measure: &str) -> Result<(usize, Vec<(usize, String)>)> {
    let id = header
        .iter()
        .position(|c| c == TRANSCRIPT_ID)
        .ok_or_else(|| CircError::malformed(1, format!("header has no {} column", TRANSCRIPT_ID)))?;
    let prefix = format!("{}.", measure);
    let samples: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, c)| c.strip_prefix(&prefix).map(|s| (idx, s.to_string())))
        .filter(|(_, s)| !s.is_empty())
        .collect();
    if samples.is_empty() {
        return Err(CircError::malformed(
            1,
            format!("header has no {}<sample> columns", prefix),
        ));
    }
    Ok((id, samples))
}

impl ExpressionTable {
    /// Parse a comma separated expression table for one measure (e.g. `FPKM`).
    pub fn parse<R: BufRead>(
        reader: R,
        measure: &str,
        on_invalid: OnInvalid,
        summary: &mut Summary,
    ) -> Result<ExpressionTable> {
        let mut lines = numbered_lines(reader);
        let header = match lines.next() {
            Some(line) => split_csv(&line?.1),
            None => return Err(CircError::NoData("expression table header".to_string())),
        };
        let (id_col, columns) = sample_columns(&header, measure)?;
        let needed = columns.iter().map(|(i, _)| *i).max().unwrap_or(0).max(id_col) + 1;

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut transcripts = Vec::new();
        for line in lines {
            let (line_no, line) = line?;
            summary.read += 1;
            let row = split_csv(&line);
            let parsed = if row.len() < needed {
                Err(CircError::malformed(
                    line_no,
                    format!("expected {} columns, found {}", header.len(), row.len()),
                ))
            } else {
                columns
                    .iter()
                    .map(|(idx, sample)| parse_field::<f64>(&row[*idx], sample, line_no))
                    .collect::<Result<Vec<f64>>>()
                    .map(|values| Transcript {
                        id: row[id_col].clone(),
                        values,
                    })
            };
            match on_invalid.apply(parsed)? {
                Some(t) => {
                    if let Some(first) = seen.insert(t.id.clone(), line_no) {
                        log::warn!("transcript {} repeated at lines {} and {}", t.id, first, line_no);
                    }
                    transcripts.push(t);
                }
                None => summary.skipped += 1,
            }
        }
        Ok(ExpressionTable {
            samples: columns.into_iter().map(|(_, s)| s).collect(),
            transcripts,
        })
    }

    /// Transcripts expressed at or above `cutoff` in every sample.
    pub fn expressed_in_all(&self, cutoff: f64) -> impl Iterator<Item = &Transcript> {
        self.transcripts
            .iter()
            .filter(move |t| t.values.iter().all(|v| *v >= cutoff))
    }
}

/// Write the transcripts that pass the cutoff in every sample as a tab
/// separated table of the selected measure.
pub fn filter_expression<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    measure: &str,
    cutoff: f64,
    on_invalid: OnInvalid,
) -> Result<Summary> {
    if !cutoff.is_finite() {
        return Err(CircError::Config(format!("cutoff must be finite, got {}", cutoff)));
    }
    let mut summary = Summary::default();
    let table = ExpressionTable::parse(reader, measure, on_invalid, &mut summary)?;
    log::info!("filtering samples: {}", table.samples.join(", "));
    writeln!(out, "{}\t{}", TRANSCRIPT_ID, table.samples.join("\t"))?;
    for t in table.expressed_in_all(cutoff) {
        writeln!(out, "{}\t{}", t.id, t.values.iter().join("\t"))?;
        summary.kept += 1;
    }
    out.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXPR: &str = "\"t_id\",\"chr\",\"strand\",\"start\",\"end\",\"t_name\",\"num_exons\",\"length\",\"gene_id\",\"gene_name\",\"cov.S1\",\"FPKM.S1\",\"cov.S2\",\"FPKM.S2\"\n\
        1,\"chr1\",\"+\",100,900,\"TCONS_1\",2,300,\"XLOC_1\",\".\",4.5,12.5,3.0,8\n\
        2,\"chr1\",\"-\",1000,1900,\"TCONS_2\",1,900,\"XLOC_2\",\".\",0.1,0,2.0,5.5\n\
        3,\"chr2\",\"+\",50,80,\"TCONS_3\",1,30,\"XLOC_3\",\".\",1,1,1,1\n";

    #[test]
    fn test_parse_samples_and_values() {
        let mut summary = Summary::default();
        let table = ExpressionTable::parse(TEXPR.as_bytes(), "FPKM", OnInvalid::Fail, &mut summary).unwrap();
        assert_eq!(table.samples, vec!["S1", "S2"]);
        assert_eq!(table.transcripts.len(), 3);
        assert_eq!(table.transcripts[0].id, "1");
        assert_eq!(table.transcripts[0].values, vec![12.5, 8.0]);
    }

    #[test]
    fn test_filter_requires_every_sample() {
        let mut out = Vec::new();
        let summary = filter_expression(TEXPR.as_bytes(), &mut out, "FPKM", 1.0, OnInvalid::Fail).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "t_id\tS1\tS2\n1\t12.5\t8\n3\t1\t1\n");
        assert_eq!(summary.kept, 2);

        let mut out = Vec::new();
        filter_expression(TEXPR.as_bytes(), &mut out, "cov", 3.0, OnInvalid::Fail).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "t_id\tS1\tS2\n1\t4.5\t3\n");
    }

    #[test]
    fn test_missing_measure_columns() {
        let mut out = Vec::new();
        let err = filter_expression(TEXPR.as_bytes(), &mut out, "TPM", 0.0, OnInvalid::Fail).unwrap_err();
        assert!(matches!(err, CircError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_empty_table() {
        let mut out = Vec::new();
        let err = filter_expression("".as_bytes(), &mut out, "FPKM", 0.0, OnInvalid::Fail).unwrap_err();
        assert!(matches!(err, CircError::NoData(_)));
    }

    #[test]
    fn test_non_numeric_value_policy() {
        let input = format!("{}4,\"chr3\",\"+\",1,2,\"T\",1,1,\"G\",\".\",1,NA,1,2\n", TEXPR);
        let mut out = Vec::new();
        let err = filter_expression(input.as_bytes(), &mut out, "FPKM", 0.0, OnInvalid::Fail).unwrap_err();
        assert!(matches!(err, CircError::Malformed { line: 5, .. }));
        let mut out = Vec::new();
        let summary = filter_expression(input.as_bytes(), &mut out, "FPKM", 0.0, OnInvalid::Skip).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.kept, 3);
    }
}
