use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::dataset::{FillPolicy, Flavor};

#[derive(Debug, Parser)]
#[command(
    name = "cptac-portal",
    version,
    about = "Prepare CPTAC proteomics tables for cancer genomics portal import"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the protein annotation table from RefSeq GenPept files
    Refseq(RefseqArgs),
    /// Normalize proteome (and PTM) tables into portal import format
    Normalize(NormalizeArgs),
    /// Render a clustered heatmap of a normalized table
    Heatmap(HeatmapArgs),
    /// Plot the per-sample distribution of positive values
    Histogram(HistogramArgs),
    /// Execute a JSON run plan
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RefseqArgs {
    #[arg(long, help = "Folder with *.gpff or *.gpff.gz files")]
    pub refseq_folder: PathBuf,

    #[arg(long)]
    pub output_file: PathBuf,
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub proteome_files: Vec<PathBuf>,

    #[arg(long, value_enum)]
    pub proteome_pipeline: FlavorArg,

    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub ptm_files: Vec<PathBuf>,

    #[arg(long, value_enum)]
    pub ptm_pipeline: Option<FlavorArg>,

    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1..,
        help = "One prefix per PTM file, e.g. P for phosphosites"
    )]
    pub ptm_prefixes: Vec<String>,

    #[arg(long, help = "Annotation table written by `refseq`")]
    pub annotation: PathBuf,

    #[arg(long)]
    pub output_file: PathBuf,

    #[arg(long)]
    pub meta_file: PathBuf,

    #[arg(long)]
    pub cancer_id: String,

    #[arg(long, help = "Override the sample header regex")]
    pub sample_regex: Option<String>,

    #[arg(long, help = "Override the prefix prepended to sample keys")]
    pub sample_prefix: Option<String>,

    #[arg(long, help = "Replace '-' in sample keys with this character")]
    pub sample_delimiter: Option<char>,

    #[arg(long, value_enum, default_value_t = FillArg::Blank)]
    pub fill: FillArg,

    #[arg(long, help = "Write per-gene PTM sums to this file")]
    pub summary_file: Option<PathBuf>,

    #[arg(long, help = "Write a JSON run report to this file")]
    pub report: Option<PathBuf>,

    #[arg(long)]
    pub reference_genome: Option<String>,
}

#[derive(Debug, Args)]
pub struct HeatmapArgs {
    #[arg(long, help = "Normalized table")]
    pub input: PathBuf,

    #[arg(long, help = "TSV with Sample and PAM50 columns")]
    pub subtypes: PathBuf,

    #[arg(long, help = "PNG output path")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = FillArg::Zero)]
    pub fill: FillArg,

    #[arg(long, help = "Keep only the N highest-variance rows")]
    pub top_variable: Option<usize>,

    #[arg(long, default_value_t = 12)]
    pub cell_width: usize,

    #[arg(long, default_value_t = 4)]
    pub cell_height: usize,

    #[arg(long)]
    pub sample_regex: Option<String>,

    #[arg(long)]
    pub sample_prefix: Option<String>,

    #[arg(long, env = "CPTAC_PORTAL_FONT", help = "TrueType font for labels")]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HistogramArgs {
    #[arg(short = 'i', long, help = "Normalized table")]
    pub input: PathBuf,

    #[arg(short = 't', long, help = "Plot title, e.g. \"Ovarian Proteome\"")]
    pub title: String,

    #[arg(long, help = "PNG output path (default: title without spaces + .png)")]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    pub bins: usize,

    #[arg(long, default_value_t = 3.0, help = "Upper end of the value axis")]
    pub x_max: f64,

    #[arg(long)]
    pub sample_regex: Option<String>,

    #[arg(long)]
    pub sample_prefix: Option<String>,

    #[arg(long, env = "CPTAC_PORTAL_FONT", help = "TrueType font for labels")]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "JSON run plan")]
    pub plan: PathBuf,

    #[arg(
        long,
        env = "CPTAC_PORTAL_HOME",
        help = "Base directory for relative plan paths (default: current directory)"
    )]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlavorArg {
    Itraq,
    PrecursorArea,
    Unlabeled,
    Labeled,
}

impl From<FlavorArg> for Flavor {
    fn from(arg: FlavorArg) -> Self {
        match arg {
            FlavorArg::Itraq => Flavor::Itraq,
            FlavorArg::PrecursorArea => Flavor::PrecursorArea,
            FlavorArg::Unlabeled => Flavor::Unlabeled,
            FlavorArg::Labeled => Flavor::Labeled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FillArg {
    Blank,
    Na,
    Zero,
}

impl From<FillArg> for FillPolicy {
    fn from(arg: FillArg) -> Self {
        match arg {
            FillArg::Blank => FillPolicy::Blank,
            FillArg::Na => FillPolicy::Na,
            FillArg::Zero => FillPolicy::Zero,
        }
    }
}
