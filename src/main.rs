use anyhow::{Context, Result};
use circkit::bsj::BsjMode;
use circkit::cli::Commands;
use circkit::genome::ChromSizes;
use circkit::junction::JunctionThresholds;
use circkit::myio::display_name;
use circkit::strand::StrandRouting;
use circkit::tabular::OnInvalid;
use circkit::*;
use colored::Colorize;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::time::Instant;

fn main() -> Result<()> {
    parse_cli()
}

pub fn parse_cli() -> Result<()> {
    let pg_start = Instant::now();
    let args = cli::make_cli_parse();
    let matches = cli::make_cli_app().get_matches();
    let subcommand = matches.subcommand_name().unwrap_or("circkit").to_string();

    // set the logging level
    let min_log_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new()
        .target(Target::Stderr)
        .filter(None, min_log_level)
        .init();

    log::debug!("DEBUG logging enabled");
    log::trace!("TRACE logging enabled");

    let on_invalid = OnInvalid::from_skip_flag(args.skip_invalid);

    match &args.command {
        //
        // Run JunctionFilter
        //
        Some(Commands::JunctionFilter {
            input,
            output,
            min_count,
            fraction,
        }) => {
            let thresholds = JunctionThresholds {
                min_count: *min_count,
                fraction: *fraction,
            };
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            let summary = junction::filter_junctions(
                reader,
                &mut writer,
                &thresholds,
                on_invalid,
                display_name(input),
            )
            .with_context(|| format!("Failed to filter junctions in {}", display_name(input)))?;
            log::info!("{}", summary);
        }
        //
        // Run JunctionStats
        //
        Some(Commands::JunctionStats {
            input,
            output,
            step,
        }) => {
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            let summary =
                junction::write_distribution(reader, &mut writer, *step, on_invalid, display_name(input))
                    .with_context(|| format!("Failed to summarize {}", display_name(input)))?;
            log::info!("{} cutoffs reported from {} records", summary.kept, summary.read);
        }
        //
        // Run RebuildGtf
        //
        Some(Commands::RebuildGtf { input, output }) => {
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            let rebuilder = gtf::rebuild_gtf(reader, &mut writer, on_invalid)
                .with_context(|| format!("Failed to rebuild {}", display_name(input)))?;
            log::info!("{} transcripts rebuilt; {}", rebuilder.transcripts, rebuilder.summary);
        }
        //
        // Run BsjRef
        //
        Some(Commands::BsjRef {
            input,
            output,
            flank,
            around,
        }) => {
            let mode = if *around {
                BsjMode::Around
            } else {
                BsjMode::Junction
            };
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            bsj::write_bsj_reference(reader, writer, *flank, mode)
                .with_context(|| format!("Failed to build junction references from {}", display_name(input)))?;
        }
        //
        // Run SplitStrand
        //
        Some(Commands::SplitStrand {
            input,
            prefix,
            swap,
        }) => {
            let prefix = match prefix.clone().or_else(|| strand::default_prefix(input)) {
                Some(prefix) => prefix,
                None => anyhow::bail!("--prefix is required when reading SAM from stdin"),
            };
            let (f_name, r_name) = strand::output_names(&prefix);
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let mut forward = myio::writer(&f_name).with_context(|| format!("Failed to create {}", f_name))?;
            let mut reverse = myio::writer(&r_name).with_context(|| format!("Failed to create {}", r_name))?;
            let counts = strand::split_sam(
                reader,
                &mut forward,
                &mut reverse,
                StrandRouting { swap: *swap },
                on_invalid,
            )
            .with_context(|| format!("Failed to split {}", display_name(input)))?;
            log::info!(
                "{} reads to {}, {} reads to {}; {}",
                counts.forward,
                f_name,
                counts.reverse,
                r_name,
                counts.summary
            );
        }
        //
        // Run CleanBoundary
        //
        Some(Commands::CleanBoundary {
            input,
            genome,
            output,
            in_place,
        }) => {
            let sizes = ChromSizes::load(genome)?;
            log::info!("{} chromosome lengths loaded from {}", sizes.len(), sizes.name);
            let summary = if *in_place {
                if input == "-" {
                    anyhow::bail!("--in-place needs an input file, not stdin");
                }
                boundary::clean_boundaries_in_place(input, &sizes, on_invalid)
            } else {
                let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
                let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
                boundary::clean_boundaries(reader, &mut writer, &sizes, on_invalid)
            }
            .with_context(|| format!("Failed to clean {}", display_name(input)))?;
            log::info!("{}", summary);
        }
        //
        // Run ChromSizes
        //
        Some(Commands::ChromSizes {
            genome,
            bam,
            output,
        }) => {
            let sizes = match (genome, bam) {
                (Some(genome), _) => ChromSizes::load(genome)?,
                (None, Some(bam)) => ChromSizes::from_alignment(bam)
                    .with_context(|| format!("Failed to read the header of {}", display_name(bam)))?,
                (None, None) => anyhow::bail!("either --genome or --bam is required"),
            };
            let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            sizes.write(&mut writer)?;
        }
        //
        // Run SplitBlocks
        //
        Some(Commands::SplitBlocks {
            input,
            output,
            min_block,
        }) => {
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            let summary = bed::split_bed_blocks(reader, &mut writer, *min_block, on_invalid)
                .with_context(|| format!("Failed to split blocks in {}", display_name(input)))?;
            log::info!("{}", summary);
        }
        //
        // Run ExprFilter
        //
        Some(Commands::ExprFilter {
            input,
            output,
            measure,
            cutoff,
        }) => {
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            let summary = expression::filter_expression(reader, &mut writer, measure, *cutoff, on_invalid)
                .with_context(|| format!("Failed to filter expression in {}", display_name(input)))?;
            log::info!("{}", summary);
        }
        //
        // Run RelativeSites
        //
        Some(Commands::RelativeSites {
            input,
            output,
            bins,
        }) => {
            let reader = myio::reader(input).with_context(|| format!("Failed to open {}", input))?;
            let mut writer = myio::writer(output).with_context(|| format!("Failed to create {}", output))?;
            let summary = relsite::write_relative_sites(reader, &mut writer, *bins, on_invalid)
                .with_context(|| format!("Failed to bin {}", display_name(input)))?;
            log::info!("{}", summary);
        }
        //
        // no command opt
        //
        None => {}
    };

    let duration = pg_start.elapsed();
    log::info!(
        "{} done! Time elapsed: {}",
        subcommand.bright_green().bold(),
        format!("{:.2?}", duration).bright_yellow().bold()
    );
    Ok(())
}
