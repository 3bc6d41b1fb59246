use crate::error::{CircError, Result};
use crate::tabular::{numbered_lines, parse_field, split_fields, OnInvalid, Summary};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::{max, min};
use std::io::{BufRead, Write};

lazy_static! {
    static ref EXON_NUMBER_RE: Regex = Regex::new(r"^(\s*)exon_number(\s|$)").unwrap();
}

const GTF_COLUMNS: usize = 9;
const FEATURE: usize = 2;
const START: usize = 3;
const END: usize = 4;
const ATTRIBUTES: usize = 8;

/// One classified line of a GTF stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GtfEntry {
    Comment(String),
    Transcript(Vec<String>),
    Child {
        fields: Vec<String>,
        start: u64,
        end: u64,
    },
}

impl GtfEntry {
    pub fn parse(line: &str, line_no: usize) -> Result<GtfEntry> {
        if line.starts_with('#') {
            return Ok(GtfEntry::Comment(line.to_string()));
        }
        let t = split_fields(line, GTF_COLUMNS, line_no)?;
        let fields: Vec<String> = t.iter().map(|f| f.to_string()).collect();
        if t[FEATURE] == "transcript" {
            return Ok(GtfEntry::Transcript(fields));
        }
        let start = parse_field(t[START], "start", line_no)?;
        let end = parse_field(t[END], "end", line_no)?;
        if start > end {
            return Err(CircError::malformed(
                line_no,
                format!("start {} is after end {}", start, end),
            ));
        }
        Ok(GtfEntry::Child { fields, start, end })
    }
}

/// Set the `exon_number` attribute of a GTF attribute column, appending it
/// when missing. Other attributes keep their order and spacing.
/// # Example
/// ```
/// use circkit::gtf::set_exon_number;
/// let attrs = r#"gene_id "g1"; transcript_id "t1"; exon_number "7";"#;
/// assert_eq!(
///     set_exon_number(attrs, 1),
///     r#"gene_id "g1"; transcript_id "t1"; exon_number "1";"#
/// );
/// assert_eq!(
///     set_exon_number(r#"gene_id "g1";"#, 2),
///     r#"gene_id "g1"; exon_number "2";"#
/// );
/// ```
pub fn set_exon_number(attributes: &str, exon_number: usize) -> String {
    let attributes = attributes.trim();
    let value = format!("exon_number \"{}\"", exon_number);
    if attributes.is_empty() {
        return format!("{};", value);
    }
    let mut parts: Vec<String> = attributes.split(';').map(|p| p.to_string()).collect();
    let mut found = false;
    for part in parts.iter_mut() {
        if let Some(caps) = EXON_NUMBER_RE.captures(part) {
            *part = format!("{}{}", &caps[1], value);
            found = true;
        }
    }
    if !found {
        let new_part = format!(" {}", value);
        match parts.last() {
            Some(last) if last.trim().is_empty() => {
                let idx = parts.len() - 1;
                parts.insert(idx, new_part);
            }
            _ => parts.push(new_part),
        }
    }
    parts.join(";")
}

/// Streaming rebuilder that rewrites each transcript to span its children
/// and renumbers the children's exons.
#[derive(Debug, Default)]
pub struct GtfRebuilder {
    transcript: Option<Vec<String>>,
    span: Option<(u64, u64)>,
    children: Vec<Vec<String>>,
    on_invalid: OnInvalid,
    pub summary: Summary,
    pub transcripts: usize,
}

impl GtfRebuilder {
    pub fn new(on_invalid: OnInvalid) -> GtfRebuilder {
        GtfRebuilder {
            on_invalid,
            ..Default::default()
        }
    }

    /// Process one input line.
    pub fn push<W: Write>(&mut self, line: &str, line_no: usize, out: &mut W) -> Result<()> {
        let entry = match self.on_invalid.apply(GtfEntry::parse(line, line_no))? {
            Some(entry) => entry,
            None => {
                self.summary.read += 1;
                self.summary.skipped += 1;
                return Ok(());
            }
        };
        match entry {
            GtfEntry::Comment(comment) => writeln!(out, "{}", comment)?,
            GtfEntry::Transcript(fields) => {
                self.summary.read += 1;
                self.flush(out)?;
                self.transcript = Some(fields);
            }
            GtfEntry::Child {
                mut fields,
                start,
                end,
            } => {
                self.summary.read += 1;
                if self.transcript.is_none() {
                    let orphan: Result<()> = Err(CircError::malformed(
                        line_no,
                        format!("{} feature before any transcript", fields[FEATURE]),
                    ));
                    self.on_invalid.apply(orphan)?;
                    self.summary.skipped += 1;
                    return Ok(());
                }
                self.span = Some(match self.span {
                    Some((st, en)) => (min(st, start), max(en, end)),
                    None => (start, end),
                });
                fields[ATTRIBUTES] = set_exon_number(&fields[ATTRIBUTES], self.children.len() + 1);
                self.children.push(fields);
            }
        }
        Ok(())
    }

    /// Write the current transcript group, if any.
    fn flush<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let mut header = match self.transcript.take() {
            Some(header) => header,
            None => return Ok(()),
        };
        match self.span.take() {
            Some((st, en)) => {
                header[START] = st.to_string();
                header[END] = en.to_string();
            }
            None => log::debug!(
                "transcript at {}:{}-{} has no child features; keeping its coordinates",
                header[0],
                header[START],
                header[END]
            ),
        }
        writeln!(out, "{}", header.iter().join("\t"))?;
        for child in self.children.drain(..) {
            writeln!(out, "{}", child.iter().join("\t"))?;
            self.summary.kept += 1;
        }
        self.summary.kept += 1;
        self.transcripts += 1;
        Ok(())
    }

    /// Flush the last transcript group at the end of input.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.flush(out)?;
        out.flush()?;
        Ok(())
    }
}

/// Rebuild a whole GTF stream.
/// # Example
/// ```
/// use circkit::gtf::rebuild_gtf;
/// use circkit::tabular::OnInvalid;
/// let gtf = "chr1\tcirc\ttranscript\t1\t2\t.\t+\t.\tgene_id \"g\"; transcript_id \"t\";\n\
///            chr1\tcirc\texon\t300\t400\t.\t+\t.\tgene_id \"g\"; transcript_id \"t\"; exon_number \"9\";\n\
///            chr1\tcirc\texon\t100\t200\t.\t+\t.\tgene_id \"g\"; transcript_id \"t\"; exon_number \"3\";\n";
/// let mut out = Vec::new();
/// rebuild_gtf(gtf.as_bytes(), &mut out, OnInvalid::Fail).unwrap();
/// let out = String::from_utf8(out).unwrap();
/// let lines: Vec<&str> = out.lines().collect();
/// assert!(lines[0].contains("transcript\t100\t400"));
/// assert!(lines[1].ends_with("exon_number \"1\";"));
/// assert!(lines[2].ends_with("exon_number \"2\";"));
/// ```
pub fn rebuild_gtf<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    on_invalid: OnInvalid,
) -> Result<GtfRebuilder> {
    let mut rebuilder = GtfRebuilder::new(on_invalid);
    for line in numbered_lines(reader) {
        let (line_no, line) = line?;
        rebuilder.push(&line, line_no, out)?;
    }
    rebuilder.finish(out)?;
    Ok(rebuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(kind: &str, st: u64, en: u64, tid: &str, exon: Option<usize>) -> String {
        let mut attrs = format!("gene_id \"{}\"; transcript_id \"{}\";", tid, tid);
        if let Some(n) = exon {
            attrs.push_str(&format!(" exon_number \"{}\";", n));
        }
        format!("chr2\tcircRNA\t{}\t{}\t{}\t.\t-\t.\t{}", kind, st, en, attrs)
    }

    fn rebuild(input: &str) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        rebuild_gtf(input.as_bytes(), &mut out, OnInvalid::Fail).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| l.split('\t').map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_groups_span_children_and_last_group_flushed() {
        let input = [
            "#!genome-build test".to_string(),
            feature("transcript", 1, 1, "a", None),
            feature("exon", 500, 600, "a", Some(4)),
            feature("exon", 50, 80, "a", Some(5)),
            feature("exon", 200, 700, "a", Some(6)),
            feature("transcript", 1, 1, "b", None),
            feature("exon", 1000, 1100, "b", Some(2)),
            feature("exon", 900, 950, "b", Some(1)),
        ]
        .join("\n");
        let rows = rebuild(&input);
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], vec!["#!genome-build test".to_string()]);
        assert_eq!(rows[1][START], "50");
        assert_eq!(rows[1][END], "700");
        assert_eq!(rows[5][FEATURE], "transcript");
        assert_eq!(rows[5][START], "900");
        assert_eq!(rows[5][END], "1100");

        let numbers: Vec<&str> = rows
            .iter()
            .filter(|r| r.len() == 9 && r[FEATURE] == "exon")
            .map(|r| r[ATTRIBUTES].rsplit("exon_number").next().unwrap())
            .collect();
        assert_eq!(numbers, vec![" \"1\";", " \"2\";", " \"3\";", " \"1\";", " \"2\";"]);
    }

    #[test]
    fn test_transcript_without_children_keeps_coordinates() {
        let input = format!(
            "{}\n{}\n{}",
            feature("transcript", 10, 20, "a", None),
            feature("transcript", 30, 40, "b", None),
            feature("exon", 35, 38, "b", None)
        );
        let rows = rebuild(&input);
        assert_eq!(rows[0][START], "10");
        assert_eq!(rows[0][END], "20");
        assert_eq!(rows[1][START], "35");
        assert!(rows[2][ATTRIBUTES].ends_with("exon_number \"1\";"));
    }

    #[test]
    fn test_child_before_transcript() {
        let input = format!(
            "{}\n{}\n{}",
            feature("exon", 5, 10, "x", Some(1)),
            feature("transcript", 1, 1, "a", None),
            feature("exon", 5, 10, "a", Some(1))
        );
        let mut out = Vec::new();
        let err = rebuild_gtf(input.as_bytes(), &mut out, OnInvalid::Fail).unwrap_err();
        assert!(matches!(err, CircError::Malformed { line: 1, .. }));

        let mut out = Vec::new();
        let rebuilder = rebuild_gtf(input.as_bytes(), &mut out, OnInvalid::Skip).unwrap();
        assert_eq!(rebuilder.summary.skipped, 1);
        assert_eq!(rebuilder.transcripts, 1);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let mut out = Vec::new();
        let err = rebuild_gtf("chr1\tx\texon\t1\n".as_bytes(), &mut out, OnInvalid::Fail).unwrap_err();
        assert!(matches!(err, CircError::Malformed { .. }));
    }

    #[test]
    fn test_set_exon_number_without_trailing_semicolon() {
        assert_eq!(
            set_exon_number("gene_id \"g\"; exon_number \"5\"", 3),
            "gene_id \"g\"; exon_number \"3\""
        );
        assert_eq!(set_exon_number("gene_id \"g\"", 1), "gene_id \"g\"; exon_number \"1\"");
        assert_eq!(set_exon_number("", 4), "exon_number \"4\";");
    }

    #[test]
    fn test_exon_number_key_prefix_is_not_matched() {
        assert_eq!(
            set_exon_number("exon_number_old \"5\";", 1),
            "exon_number_old \"5\"; exon_number \"1\";"
        );
    }
}
