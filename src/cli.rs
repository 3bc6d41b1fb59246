use clap::{AppSettings, CommandFactory, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    propagate_version = true,
    subcommand_required = true,
    infer_subcommands = true,
    arg_required_else_help = true,
    help_expected = true
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
pub struct Cli {
    /// Logging level [-v: Info, -vv: Debug, -vvv: Trace].
    #[clap(short, long, parse(from_occurrences), global = true, help_heading = "DEBUG")]
    pub verbose: usize,

    /// Skip malformed rows with a warning instead of stopping at the first one.
    #[clap(long, global = true)]
    pub skip_invalid: bool,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

///
/// This structure contains all the subcommands for circkit and their help descriptions.
///
/// Because of naming conventions for rust enums the commands names have
/// different capitalization than on the command line.
/// For example, the `JunctionFilter` enum is invoked using `circkit junction-filter`.
///
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter back-splice junctions by their junction read count (column 7).
    ///
    /// Keeps records whose count is strictly greater than <MIN_COUNT> and strictly
    /// less than <FRACTION> times the largest count in the file. The input is expected
    /// to be sorted by descending count.
    #[clap(visible_aliases = &["jf", "circ-filter"])]
    JunctionFilter {
        /// Junction BED file (find_circ/CIRCexplorer layout).
        #[clap(default_value = "-")]
        input: String,
        /// Output file.
        #[clap(short, long, default_value = "-")]
        output: String,
        /// Records must have more junction reads than this.
        #[clap(short, long, default_value_t = 1)]
        min_count: u64,
        /// Records must have fewer junction reads than this fraction of the maximum.
        #[clap(short, long, default_value_t = 0.95)]
        fraction: f64,
    },
    /// Cumulative distribution of junction read counts.
    ///
    /// For cutoffs descending from the maximum count by <STEP>, report how many
    /// records have a count at or below the cutoff.
    #[clap(visible_aliases = &["js"])]
    JunctionStats {
        /// Junction BED file (find_circ/CIRCexplorer layout).
        #[clap(default_value = "-")]
        input: String,
        /// Output file.
        #[clap(short, long, default_value = "-")]
        output: String,
        /// Distance between successive cutoffs.
        #[clap(short, long, default_value_t = 1)]
        step: u64,
    },
    /// Rebuild a circRNA GTF so each transcript spans its exons and exons are renumbered.
    #[clap(visible_aliases = &["gtf", "rg"])]
    RebuildGtf {
        /// Input GTF file.
        #[clap(default_value = "-")]
        input: String,
        /// Output file.
        #[clap(short, long, default_value = "-")]
        output: String,
    },
    /// Build back-splice junction reference sequences from a circRNA fasta.
    #[clap(visible_aliases = &["bsj"])]
    BsjRef {
        /// Fasta file of circular sequences.
        #[clap(default_value = "-")]
        input: String,
        /// Output fasta file.
        #[clap(short, long, default_value = "-")]
        output: String,
        /// Number of bases taken from each side of the junction.
        #[clap(short, long, default_value_t = 50)]
        flank: usize,
        /// Emit only the junction neighbourhood (last <FLANK> + first <FLANK> bases)
        /// instead of the full sequence followed by its first <FLANK> bases.
        #[clap(short, long)]
        around: bool,
    },
    /// Split a SAM file into watson (<PREFIX>.f.sam) and crick (<PREFIX>.r.sam) reads.
    #[clap(visible_aliases = &["ss"])]
    SplitStrand {
        /// Input SAM file (text).
        #[clap(default_value = "-")]
        input: String,
        /// Output prefix, defaults to the input name before its first `.`.
        #[clap(short, long)]
        prefix: Option<String>,
        /// Send watson reads to the .r.sam file and crick reads to the .f.sam file
        /// (dUTP / first-strand libraries).
        #[clap(short, long)]
        swap: bool,
    },
    /// Drop records whose coordinates are not within their chromosome.
    #[clap(visible_aliases = &["cb", "clean"])]
    CleanBoundary {
        /// BED-like input file.
        #[clap(default_value = "-")]
        input: String,
        /// Built-in assembly (hg18, hg19, mm9) or a chrom.sizes file.
        #[clap(short, long)]
        genome: String,
        /// Output file.
        #[clap(short, long, default_value = "-", conflicts_with = "in_place")]
        output: String,
        /// Replace the input with the cleaned rows, keeping the original as <INPUT>.tmp.
        #[clap(short, long)]
        in_place: bool,
    },
    /// Print chromosome sizes of a built-in assembly, a chrom.sizes file, or an alignment header.
    #[clap(visible_aliases = &["cs"])]
    ChromSizes {
        /// Built-in assembly (hg18, hg19, mm9) or a chrom.sizes file.
        #[clap(short, long, required_unless_present = "bam", conflicts_with = "bam")]
        genome: Option<String>,
        /// SAM/BAM/CRAM file whose @SQ header lines are used.
        #[clap(short, long)]
        bam: Option<String>,
        /// Output file.
        #[clap(short, long, default_value = "-")]
        output: String,
    },
    /// Split multi-block BED12 records into one record per block.
    #[clap(visible_aliases = &["sb"])]
    SplitBlocks {
        /// BED12 input file.
        #[clap(default_value = "-")]
        input: String,
        /// Output file.
        #[clap(short, long, default_value = "-")]
        output: String,
        /// Blocks must be longer than this to be reported.
        #[clap(short, long, default_value_t = 3)]
        min_block: u64,
    },
    /// Keep transcripts expressed in every sample of a ballgown expression table.
    #[clap(visible_aliases = &["ef"])]
    ExprFilter {
        /// Comma separated transcript expression table.
        #[clap(default_value = "-")]
        input: String,
        /// Output file.
        #[clap(short, long, default_value = "-")]
        output: String,
        /// Measure used to filter, columns are named <MEASURE>.<sample>.
        #[clap(short, long, default_value = "FPKM")]
        measure: String,
        /// Minimum value required in every sample.
        #[clap(short, long, default_value_t = 0.0)]
        cutoff: f64,
    },
    /// Split stranded intervals into equal bins labelled by relative position (5' to 3').
    #[clap(visible_aliases = &["rs"])]
    RelativeSites {
        /// Four column input: chrom, start, end, strand.
        #[clap(default_value = "-")]
        input: String,
        /// Output file.
        #[clap(short, long, default_value = "-")]
        output: String,
        /// Number of bins per interval.
        #[clap(short, long, default_value_t = 50)]
        bins: usize,
    },
}

pub fn make_cli_parse() -> Cli {
    Cli::parse()
}

pub fn make_cli_app() -> clap::Command<'static> {
    Cli::command()
}
