use crate::error::{CircError, Result};
use crate::tabular::{numbered_lines, split_fields, OnInvalid, Summary};
use bio_types::strand::Strand;
use rust_htslib::htslib::{BAM_FREAD1, BAM_FREAD2, BAM_FREVERSE};
use std::io::{BufRead, Write};

/// Largest value representable by the 12 defined SAM flag bits.
const MAX_SAM_FLAG: u16 = 0xFFF;

/// Which read of a pair a record is. Unpaired reads count as the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mate {
    First,
    Second,
}

/// The two bits of a SAM flag that decide the strand of origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOrigin {
    pub mate: Mate,
    pub reverse: bool,
}

impl ReadOrigin {
    /// Decode a SAM flag.
    /// # Example
    /// ```
    /// use circkit::strand::{Mate, ReadOrigin};
    /// let origin = ReadOrigin::from_flag(83).unwrap();
    /// assert_eq!(origin.mate, Mate::First);
    /// assert!(origin.reverse);
    /// assert!(ReadOrigin::from_flag(0xC1).is_err());
    /// ```
    pub fn from_flag(flag: u16) -> std::result::Result<ReadOrigin, String> {
        if flag > MAX_SAM_FLAG {
            return Err(format!("flag exceeds the SAM range (max {})", MAX_SAM_FLAG));
        }
        let flag = flag as u32;
        let first = flag & BAM_FREAD1 != 0;
        let second = flag & BAM_FREAD2 != 0;
        if first && second {
            return Err("read is marked both first and second in pair".to_string());
        }
        Ok(ReadOrigin {
            mate: if second { Mate::Second } else { Mate::First },
            reverse: flag & BAM_FREVERSE != 0,
        })
    }

    /// Strand of the fragment: watson (`Forward`) or crick (`Reverse`).
    /// The second mate reports the opposite of its own orientation.
    pub fn strand(&self) -> Strand {
        match (self.mate, self.reverse) {
            (Mate::First, false) | (Mate::Second, true) => Strand::Forward,
            (Mate::First, true) | (Mate::Second, false) => Strand::Reverse,
        }
    }
}

/// Classify a SAM flag field as watson (`Forward`) or crick (`Reverse`).
/// # Example
/// ```
/// use bio_types::strand::Strand;
/// use circkit::strand::classify_flag;
/// assert_eq!(classify_flag("0", 1).unwrap(), Strand::Forward);
/// assert_eq!(classify_flag("16", 1).unwrap(), Strand::Reverse);
/// assert_eq!(classify_flag("147", 1).unwrap(), Strand::Forward);
/// assert!(classify_flag("abc", 1).is_err());
/// ```
pub fn classify_flag(flag: &str, line_no: usize) -> Result<Strand> {
    let unclassifiable = |msg: String| CircError::UnclassifiableFlag {
        flag: flag.to_string(),
        line: line_no,
        msg,
    };
    let value: u16 = flag
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| unclassifiable(e.to_string()))?;
    let origin = ReadOrigin::from_flag(value).map_err(unclassifiable)?;
    Ok(origin.strand())
}

/// Where watson and crick records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrandRouting {
    /// Send watson reads to the reverse output and crick reads to the forward
    /// output, as needed for dUTP (first-strand) libraries.
    pub swap: bool,
}

impl StrandRouting {
    /// `true` when a record of this strand belongs in the forward output.
    pub fn to_forward(&self, strand: Strand) -> bool {
        (strand == Strand::Forward) != self.swap
    }
}

/// Counts of records sent to each output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StrandCounts {
    pub forward: usize,
    pub reverse: usize,
    pub header: usize,
    pub summary: Summary,
}

/// Output file names for a strand split: `<prefix>.f.sam` and `<prefix>.r.sam`.
/// # Example
/// ```
/// use circkit::strand::output_names;
/// assert_eq!(
///     output_names("sample"),
///     ("sample.f.sam".to_string(), "sample.r.sam".to_string())
/// );
/// ```
pub fn output_names(prefix: &str) -> (String, String) {
    (format!("{}.f.sam", prefix), format!("{}.r.sam", prefix))
}

/// Default output prefix: the input path up to the first `.` of its file name.
pub fn default_prefix(input: &str) -> Option<String> {
    if input == "-" {
        return None;
    }
    let path = std::path::Path::new(input);
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next().filter(|s| !s.is_empty())?;
    Some(path.with_file_name(stem).to_string_lossy().to_string())
}

/// Split SAM text lines into forward and reverse outputs by strand of origin.
/// Header lines are copied to both outputs.
pub fn split_sam<R: BufRead, F: Write, V: Write>(
    reader: R,
    forward: &mut F,
    reverse: &mut V,
    routing: StrandRouting,
    on_invalid: OnInvalid,
) -> Result<StrandCounts> {
    let mut counts = StrandCounts::default();
    for line in numbered_lines(reader) {
        let (line_no, line) = line?;
        if line.starts_with('@') {
            writeln!(forward, "{}", line)?;
            writeln!(reverse, "{}", line)?;
            counts.header += 1;
            continue;
        }
        counts.summary.read += 1;
        let strand = split_fields(&line, 11, line_no)
            .and_then(|fields| classify_flag(fields[1], line_no));
        let strand = match on_invalid.apply(strand)? {
            Some(strand) => strand,
            None => {
                counts.summary.skipped += 1;
                continue;
            }
        };
        if routing.to_forward(strand) {
            writeln!(forward, "{}", line)?;
            counts.forward += 1;
        } else {
            writeln!(reverse, "{}", line)?;
            counts.reverse += 1;
        }
        counts.summary.kept += 1;
    }
    forward.flush()?;
    reverse.flush()?;
    Ok(counts)
}
