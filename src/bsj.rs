use crate::error::{CircError, Result};
use bio::io::fasta;
use std::io::{Read, Write};

/// How a circular sequence is turned into a linear reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsjMode {
    /// Full sequence followed by its first `flank` bases.
    Junction,
    /// Only the last `flank` bases followed by the first `flank` bases.
    Around,
}

/// Linear sequence spanning the back-splice junction of a circular sequence.
/// # Example
/// ```
/// use circkit::bsj::{bsj_sequence, BsjMode};
/// assert_eq!(bsj_sequence(b"ACGTTT", 2, BsjMode::Junction), b"ACGTTTAC".to_vec());
/// assert_eq!(bsj_sequence(b"ACGTTT", 2, BsjMode::Around), b"TTAC".to_vec());
/// assert_eq!(bsj_sequence(b"ACGT", 2, BsjMode::Around), b"ACGT".to_vec());
/// ```
pub fn bsj_sequence(seq: &[u8], flank: usize, mode: BsjMode) -> Vec<u8> {
    match mode {
        BsjMode::Junction => {
            // never duplicate the whole circle
            let n = flank.min(seq.len().saturating_sub(1));
            let mut out = Vec::with_capacity(seq.len() + n);
            out.extend_from_slice(seq);
            out.extend_from_slice(&seq[..n]);
            out
        }
        BsjMode::Around => {
            if seq.len() > 2 * flank {
                let mut out = Vec::with_capacity(2 * flank);
                out.extend_from_slice(&seq[seq.len() - flank..]);
                out.extend_from_slice(&seq[..flank]);
                out
            } else {
                seq.to_vec()
            }
        }
    }
}

/// Rewrite every fasta record into its back-splice junction reference.
pub fn write_bsj_reference<R: Read, W: Write>(
    reader: R,
    out: W,
    flank: usize,
    mode: BsjMode,
) -> Result<usize> {
    if flank == 0 {
        return Err(CircError::Config(
            "flank length must be greater than zero".to_string(),
        ));
    }
    let mut writer = fasta::Writer::new(out);
    let mut n = 0;
    for rec in fasta::Reader::new(reader).records() {
        let rec = rec?;
        let seq = bsj_sequence(rec.seq(), flank, mode);
        writer.write(rec.id(), rec.desc(), &seq)?;
        n += 1;
    }
    writer.flush()?;
    log::info!("wrote {} back-splice junction sequences", n);
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_junction_reference_keeps_headers() {
        let input = ">circ1 chr1:100-200\nACGT\nACGT\n>circ2\nGG\n";
        let mut out = Vec::new();
        let n = write_bsj_reference(input.as_bytes(), &mut out, 3, BsjMode::Junction).unwrap();
        assert_eq!(n, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ">circ1 chr1:100-200\nACGTACGTACG\n>circ2\nGGG\n");
    }

    #[test]
    fn test_around_reference() {
        let seq: Vec<u8> = (0..120).map(|i| b"ACGT"[i % 4]).collect();
        let out = bsj_sequence(&seq, 50, BsjMode::Around);
        assert_eq!(out.len(), 100);
        assert_eq!(&out[..50], &seq[70..]);
        assert_eq!(&out[50..], &seq[..50]);
    }

    #[test]
    fn test_single_base_and_empty() {
        assert_eq!(bsj_sequence(b"A", 50, BsjMode::Junction), b"A".to_vec());
        assert!(bsj_sequence(b"", 50, BsjMode::Junction).is_empty());
    }

    #[test]
    fn test_zero_flank_rejected() {
        let mut out = Vec::new();
        assert!(write_bsj_reference(">a\nAC\n".as_bytes(), &mut out, 0, BsjMode::Around).is_err());
    }
}
