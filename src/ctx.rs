use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::annotation::{AnnotationTable, NormalizedTable, ResolveStats};
use crate::dataset::{FillPolicy, Flavor, LoadReport, QuantTable, SampleKeyOptions};

#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub files: Vec<PathBuf>,
    pub flavor: Flavor,
}

#[derive(Debug, Clone)]
pub struct PtmSpec {
    pub files: Vec<PathBuf>,
    pub flavor: Flavor,
    pub prefixes: Vec<String>,
}

impl PtmSpec {
    /// PTM processing needs files, flavor and prefixes together; any other
    /// partial combination is rejected.
    pub fn from_parts(
        files: Vec<PathBuf>,
        flavor: Option<Flavor>,
        prefixes: Vec<String>,
    ) -> Result<Option<Self>> {
        match (files.is_empty(), flavor, prefixes.is_empty()) {
            (true, None, true) => Ok(None),
            (false, Some(flavor), false) => Ok(Some(Self {
                files,
                flavor,
                prefixes,
            })),
            _ => bail!(
                "PTM processing requires --ptm-files, --ptm-pipeline and --ptm-prefixes together"
            ),
        }
    }
}

/// Everything one normalize invocation needs; no step reads global state.
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub cancer_id: String,
    pub proteome: DatasetSpec,
    pub ptm: Option<PtmSpec>,
    pub annotation_path: PathBuf,
    pub output_file: PathBuf,
    pub meta_file: PathBuf,
    pub summary_file: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub reference_genome: Option<String>,
    pub fill: FillPolicy,
    pub sample_key: SampleKeyOptions,
}

impl NormalizeConfig {
    pub fn new(
        cancer_id: impl Into<String>,
        proteome: DatasetSpec,
        annotation_path: PathBuf,
        output_file: PathBuf,
        meta_file: PathBuf,
    ) -> Self {
        Self {
            cancer_id: cancer_id.into(),
            proteome,
            ptm: None,
            annotation_path,
            output_file,
            meta_file,
            summary_file: None,
            report_path: None,
            reference_genome: None,
            fill: FillPolicy::default(),
            sample_key: SampleKeyOptions::default(),
        }
    }
}

#[derive(Debug)]
pub struct LoadedDataset {
    pub path: PathBuf,
    pub ptm_prefix: Option<String>,
    pub table: Option<QuantTable>,
    pub report: LoadReport,
}

#[derive(Debug)]
pub struct Ctx {
    pub config: NormalizeConfig,
    pub tool_version: String,
    pub annotation: Option<AnnotationTable>,
    pub datasets: Vec<LoadedDataset>,
    pub merged: Option<QuantTable>,
    pub normalized: Option<NormalizedTable>,
    pub resolve_stats: ResolveStats,
    pub summary_genes: Option<usize>,
    pub warnings: Vec<String>,
}

impl Ctx {
    pub fn new(config: NormalizeConfig, tool_version: &str) -> Self {
        Self {
            config,
            tool_version: tool_version.to_string(),
            annotation: None,
            datasets: Vec::new(),
            merged: None,
            normalized: None,
            resolve_stats: ResolveStats::default(),
            summary_genes: None,
            warnings: Vec::new(),
        }
    }

    /// Input files in processing order with their PTM prefix.
    pub fn inputs(&self) -> Vec<(PathBuf, Flavor, Option<String>)> {
        let mut out: Vec<(PathBuf, Flavor, Option<String>)> = self
            .config
            .proteome
            .files
            .iter()
            .map(|f| (f.clone(), self.config.proteome.flavor, None))
            .collect();
        if let Some(ptm) = &self.config.ptm {
            for (f, p) in ptm.files.iter().zip(&ptm.prefixes) {
                out.push((f.clone(), ptm.flavor, Some(p.clone())));
            }
        }
        out
    }
}
