use crate::error::Result;
use flate2::write;
use flate2::Compression;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

const BUFFER_SIZE: usize = 128 * 1024;
/// Bytes niffler needs to recognise a compression format.
const MAGIC_LEN: usize = 5;

/// Write normal or compressed files seamlessly.
/// Uses the presence of a `.gz` extension to decide, and `-` for stdout.
pub fn writer(filename: &str) -> Result<Box<dyn Write>> {
    if filename == "-" {
        return Ok(Box::new(BufWriter::with_capacity(
            BUFFER_SIZE,
            io::stdout(),
        )));
    }
    let path = Path::new(filename);
    let file = File::create(path)?;

    if path.extension() == Some(OsStr::new("gz")) {
        Ok(Box::new(BufWriter::with_capacity(
            BUFFER_SIZE,
            write::GzEncoder::new(file, Compression::default()),
        )))
    } else {
        Ok(Box::new(BufWriter::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Read normal or compressed files seamlessly.
/// Compression is sniffed from the content, so bgzipped stdin works too.
/// Inputs too short to carry a magic number are read as plain text.
pub fn reader(filename: &str) -> Result<Box<dyn BufRead>> {
    let mut raw: Box<dyn Read> = if filename == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(filename)?)
    };
    let mut head = Vec::with_capacity(MAGIC_LEN);
    raw.by_ref().take(MAGIC_LEN as u64).read_to_end(&mut head)?;
    let short = head.len() < MAGIC_LEN;
    let stream: Box<dyn Read> = Box::new(io::Cursor::new(head).chain(raw));
    if short {
        log::debug!("{} is too short to be compressed, reading as text", filename);
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stream)));
    }
    let (decoded, format) = niffler::get_reader(stream)?;
    log::debug!("{} opened with compression {:?}", filename, format);
    Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, decoded)))
}

/// Human readable label for an input or output path.
pub fn display_name(filename: &str) -> &str {
    if filename == "-" {
        "<stdin>"
    } else {
        filename
    }
}
