use crate::error::{CircError, Result};
use crate::myio;
use crate::tabular::{numbered_lines, parse_field};
use itertools::Itertools;
use rust_htslib::bam::{self, Read};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Assemblies shipped with circkit as `chrom.sizes` resources.
const BUILTIN_GENOMES: &[(&str, &str)] = &[
    ("hg18", include_str!("../resources/genomes/hg18.chrom.sizes")),
    ("hg19", include_str!("../resources/genomes/hg19.chrom.sizes")),
    ("mm9", include_str!("../resources/genomes/mm9.chrom.sizes")),
];

/// Names of the built-in assemblies.
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_GENOMES.iter().map(|(name, _)| *name).collect()
}

/// Chromosome lengths of one genome assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromSizes {
    pub name: String,
    sizes: HashMap<String, u64>,
}

impl ChromSizes {
    /// Parse a two column `chrom.sizes` table. Extra columns are ignored.
    /// # Example
    /// ```
    /// use circkit::genome::ChromSizes;
    /// let sizes = ChromSizes::parse("chr1\t1000\n#comment\nchr2\t500\textra\n".as_bytes(), "toy").unwrap();
    /// assert_eq!(sizes.get("chr2"), Some(500));
    /// assert_eq!(sizes.len(), 2);
    /// ```
    pub fn parse<R: BufRead>(reader: R, name: &str) -> Result<ChromSizes> {
        let mut sizes = HashMap::new();
        for line in numbered_lines(reader) {
            let (line_no, line) = line?;
            if line.starts_with('#') {
                continue;
            }
            let t: Vec<&str> = line.split_whitespace().collect();
            if t.len() < 2 {
                return Err(CircError::malformed(
                    line_no,
                    "chrom.sizes rows need a name and a length",
                ));
            }
            let len: u64 = parse_field(t[1], "chromosome length", line_no)?;
            if sizes.insert(t[0].to_string(), len).is_some() {
                log::warn!("{} listed twice in {}; keeping the last length", t[0], name);
            }
        }
        Ok(ChromSizes {
            name: name.to_string(),
            sizes,
        })
    }

    /// One of the built-in assemblies, if `name` is known.
    pub fn builtin(name: &str) -> Option<Result<ChromSizes>> {
        BUILTIN_GENOMES
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(builtin, table)| ChromSizes::parse(table.as_bytes(), builtin))
    }

    pub fn from_file(path: &str) -> Result<ChromSizes> {
        ChromSizes::parse(myio::reader(path)?, path)
    }

    /// Resolve a genome given as a built-in assembly name or a `chrom.sizes` path.
    /// # Example
    /// ```
    /// use circkit::genome::ChromSizes;
    /// let hg19 = ChromSizes::load("hg19").unwrap();
    /// assert_eq!(hg19.get("chr1"), Some(249250621));
    /// assert!(ChromSizes::load("not-a-genome").is_err());
    /// ```
    pub fn load(genome: &str) -> Result<ChromSizes> {
        if let Some(sizes) = ChromSizes::builtin(genome) {
            return sizes;
        }
        if Path::new(genome).is_file() {
            return ChromSizes::from_file(genome);
        }
        Err(CircError::UnknownGenome(
            genome.to_string(),
            builtin_names().join(", "),
        ))
    }

    /// Read `@SQ` names and lengths from a SAM/BAM/CRAM header.
    pub fn from_alignment(path: &str) -> Result<ChromSizes> {
        let reader = if path == "-" {
            bam::Reader::from_stdin()?
        } else {
            bam::Reader::from_path(path)?
        };
        let header = reader.header();
        let mut sizes = HashMap::new();
        for tid in 0..header.target_count() {
            let name = String::from_utf8_lossy(header.tid2name(tid)).to_string();
            let len = header.target_len(tid).unwrap_or(0);
            sizes.insert(name, len);
        }
        if sizes.is_empty() {
            return Err(CircError::NoData(format!("@SQ header lines of {}", path)));
        }
        Ok(ChromSizes {
            name: path.to_string(),
            sizes,
        })
    }

    pub fn get(&self, chrom: &str) -> Option<u64> {
        self.sizes.get(chrom).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Chromosomes in natural order (chr2 before chr10).
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        self.sizes
            .iter()
            .map(|(name, len)| (name.as_str(), *len))
            .sorted_by(|a, b| natord::compare(a.0, b.0))
            .collect()
    }

    /// Write the table in `chrom.sizes` format.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        for (name, len) in self.sorted() {
            writeln!(out, "{}\t{}", name, len)?;
        }
        out.flush()?;
        Ok(())
    }
}
