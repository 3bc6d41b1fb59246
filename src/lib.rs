//! # Command line interface for circkit
//! [circkit command line interface, subcommands, and options.](cli::Commands)
//! # README for circkit
#![doc = include_str!("../README.md")]
/// Split BED12 records into their blocks.
pub mod bed;
/// Drop records that fall outside their chromosome.
pub mod boundary;
/// Back-splice junction reference sequences.
pub mod bsj;
/// Command line interface for circkit.
pub mod cli;
/// Error types shared by every operation.
pub mod error;
/// Filter ballgown transcript expression tables.
pub mod expression;
/// Chromosome size tables.
pub mod genome;
/// Rebuild circRNA GTF files.
pub mod gtf;
/// Junction read count filtering and statistics.
pub mod junction;
/// Module for automatically reading a writing compressed or uncompressed files.
pub mod myio;
/// Relative positions along stranded intervals.
pub mod relsite;
/// Split SAM records by strand of origin.
pub mod strand;
/// Helpers for tab separated records.
pub mod tabular;
