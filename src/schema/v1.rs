use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::{FillPolicy, Flavor};

/// Driver input: one optional annotation build and the cohorts to normalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPlan {
    #[serde(default)]
    pub refseq: Option<RefseqStep>,
    #[serde(default)]
    pub cohorts: Vec<CohortPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefseqStep {
    pub folder: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CohortPlan {
    pub cancer_id: String,
    pub proteome_files: Vec<PathBuf>,
    pub proteome_pipeline: Flavor,
    #[serde(default)]
    pub ptm_files: Vec<PathBuf>,
    #[serde(default)]
    pub ptm_pipeline: Option<Flavor>,
    #[serde(default)]
    pub ptm_prefixes: Vec<String>,
    /// Defaults to the refseq step's output.
    #[serde(default)]
    pub annotation: Option<PathBuf>,
    pub output_file: PathBuf,
    pub meta_file: PathBuf,
    #[serde(default)]
    pub summary_file: Option<PathBuf>,
    #[serde(default)]
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub reference_genome: Option<String>,
    #[serde(default)]
    pub fill: FillPolicy,
    #[serde(default)]
    pub sample_regex: Option<String>,
    #[serde(default)]
    pub sample_prefix: Option<String>,
    #[serde(default)]
    pub sample_delimiter: Option<char>,
    #[serde(default)]
    pub heatmap: Option<HeatmapStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatmapStep {
    pub subtypes: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub top_variable: Option<usize>,
    /// Missing-cell handling for the plot; `zero` when unset.
    #[serde(default)]
    pub fill: Option<FillPolicy>,
    /// Sample column pattern of the normalized table; TCGA barcodes when unset.
    #[serde(default)]
    pub sample_regex: Option<String>,
    #[serde(default)]
    pub sample_prefix: Option<String>,
    #[serde(default)]
    pub cell_width: Option<usize>,
    #[serde(default)]
    pub cell_height: Option<usize>,
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSummary {
    pub file: String,
    pub flavor: Flavor,
    pub ptm_prefix: Option<String>,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_filtered: usize,
    pub rows_malformed: usize,
    pub duplicate_rows: usize,
    pub duplicate_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSummary {
    pub table: String,
    pub meta: String,
    pub ptm_summary: Option<String>,
    pub rows: usize,
    pub ptm_rows: usize,
    pub samples: usize,
    pub summary_genes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSummary {
    pub matched: usize,
    pub unmatched: usize,
    pub miss_policy: String,
    pub unmatched_examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeReportV1 {
    pub tool_version: String,
    pub cancer_id: String,
    pub fill: FillPolicy,
    pub inputs: Vec<InputSummary>,
    pub join: JoinSummary,
    pub output: OutputSummary,
    pub warnings: Vec<String>,
}
