use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cptac_portal::cli::{Cli, Commands, HeatmapArgs, HistogramArgs, NormalizeArgs};
use cptac_portal::ctx::{Ctx, DatasetSpec, NormalizeConfig, PtmSpec};
use cptac_portal::dataset::SampleKeyOptions;
use cptac_portal::driver::{self, Workspace};
use cptac_portal::heatmap::{HeatmapConfig, HeatmapSummary, run_heatmap};
use cptac_portal::histogram::{HistogramConfig, HistogramSummary, run_histogram};
use cptac_portal::io;
use cptac_portal::pipeline::run_normalize;
use cptac_portal::refseq::{RefseqBuild, run_refseq};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Refseq(args) => {
            let build = run_refseq(&args.refseq_folder, &args.output_file)?;
            print_refseq_summary(&build, &args.output_file.display().to_string());
        }
        Commands::Normalize(args) => {
            let config = normalize_config(args)?;
            let ctx = run_normalize(config)?;
            print_summary(&ctx)?;
        }
        Commands::Heatmap(args) => {
            let cfg = heatmap_config(args);
            let summary = run_heatmap(&cfg)?;
            print_heatmap_summary(&summary, &cfg.output.display().to_string());
        }
        Commands::Histogram(args) => {
            let summary = run_histogram(&histogram_config(args))?;
            print_histogram_summary(&summary);
        }
        Commands::Run(args) => {
            let ws = Workspace::from_option(args.base_dir)?;
            let plan = driver::load_plan(&ws.resolve(&args.plan))?;
            let outcome = driver::run_plan(&plan, &ws)?;
            if let (Some(build), Some(step)) = (&outcome.refseq, &plan.refseq) {
                print_refseq_summary(build, &ws.resolve(&step.output).display().to_string());
            }
            for (cohort, step) in outcome.cohorts.iter().zip(&plan.cohorts) {
                print_summary(&cohort.ctx)?;
                if let (Some(summary), Some(h)) = (&cohort.heatmap, &step.heatmap) {
                    print_heatmap_summary(summary, &ws.resolve(&h.output).display().to_string());
                }
            }
        }
    }

    Ok(())
}

fn normalize_config(args: NormalizeArgs) -> Result<NormalizeConfig> {
    let mut config = NormalizeConfig::new(
        args.cancer_id,
        DatasetSpec {
            files: args.proteome_files,
            flavor: args.proteome_pipeline.into(),
        },
        args.annotation,
        args.output_file,
        args.meta_file,
    );
    config.ptm = PtmSpec::from_parts(
        args.ptm_files,
        args.ptm_pipeline.map(Into::into),
        args.ptm_prefixes,
    )?;
    config.summary_file = args.summary_file;
    config.report_path = args.report;
    config.reference_genome = args.reference_genome;
    config.fill = args.fill.into();
    config.sample_key = SampleKeyOptions {
        pattern: args.sample_regex,
        prefix: args.sample_prefix,
        delimiter: args.sample_delimiter,
    };
    Ok(config)
}

fn heatmap_config(args: HeatmapArgs) -> HeatmapConfig {
    let mut cfg = HeatmapConfig::new(args.input, args.subtypes, args.output);
    cfg.fill = args.fill.into();
    cfg.top_variable = args.top_variable;
    cfg.cell_width = args.cell_width;
    cfg.cell_height = args.cell_height;
    cfg.sample_regex = args.sample_regex;
    cfg.sample_prefix = args.sample_prefix;
    cfg.font = args.font;
    cfg
}

fn histogram_config(args: HistogramArgs) -> HistogramConfig {
    let mut cfg = HistogramConfig::new(args.input, args.title);
    cfg.output = args.output;
    cfg.bins = args.bins;
    cfg.x_max = args.x_max;
    cfg.sample_regex = args.sample_regex;
    cfg.sample_prefix = args.sample_prefix;
    cfg.font = args.font;
    cfg
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

fn print_refseq_summary(build: &RefseqBuild, output: &str) {
    println!("cptac-portal refseq ok");
    println!("files: {}", build.files.len());
    println!("records parsed: {}", build.parsed);
    println!("accessions written: {}", build.records.len());
    println!("duplicates replaced: {}", build.duplicates);
    println!("output: {}", output);
}

fn print_heatmap_summary(summary: &HeatmapSummary, output: &str) {
    println!("cptac-portal heatmap ok");
    println!("rows: {}", summary.rows);
    println!(
        "samples: {} ({} with subtype)",
        summary.samples, summary.mapped_samples
    );
    println!("image: {}x{} px", summary.width, summary.height);
    println!("output: {}", output);
}

fn print_histogram_summary(summary: &HistogramSummary) {
    println!("cptac-portal histogram ok");
    println!(
        "samples: {} ({} without values in range)",
        summary.samples, summary.empty_samples
    );
    println!("values plotted: {}", summary.values);
    println!("values above range: {}", summary.clipped);
    println!("image: {}x{} px", summary.width, summary.height);
    println!("output: {}", summary.output.display());
}
