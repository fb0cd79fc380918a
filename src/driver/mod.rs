//! Ordered execution of a JSON run plan: annotation build, then each
//! cohort's normalize and optional heatmap. The first failure aborts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::ctx::{Ctx, DatasetSpec, NormalizeConfig, PtmSpec};
use crate::dataset::SampleKeyOptions;
use crate::heatmap::{HeatmapConfig, HeatmapSummary, run_heatmap};
use crate::pipeline::run_normalize;
use crate::refseq::{RefseqBuild, run_refseq};
use crate::schema::v1::{CohortPlan, HeatmapStep, RunPlan};

/// Base directory for relative plan paths.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub base: PathBuf,
}

impl Workspace {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// `--base-dir` (or `CPTAC_PORTAL_HOME`, filled in by clap) else the cwd.
    pub fn from_option(base: Option<PathBuf>) -> Result<Self> {
        match base {
            Some(b) => Ok(Self::new(b)),
            None => Ok(Self::new(
                std::env::current_dir().context("failed to read current directory")?,
            )),
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    fn resolve_all(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths.iter().map(|p| self.resolve(p)).collect()
    }
}

pub fn load_plan(path: &Path) -> Result<RunPlan> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open run plan {}", path.display()))?;
    let plan: RunPlan = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("failed to parse run plan {}", path.display()))?;
    if plan.refseq.is_none() && plan.cohorts.is_empty() {
        bail!("run plan {} has no steps", path.display());
    }
    Ok(plan)
}

pub struct CohortOutcome {
    pub ctx: Ctx,
    pub heatmap: Option<HeatmapSummary>,
}

pub struct RunOutcome {
    pub refseq: Option<RefseqBuild>,
    pub cohorts: Vec<CohortOutcome>,
}

pub fn run_plan(plan: &RunPlan, ws: &Workspace) -> Result<RunOutcome> {
    let mut default_annotation = None;
    let refseq = match &plan.refseq {
        Some(step) => {
            let folder = ws.resolve(&step.folder);
            let output = ws.resolve(&step.output);
            let build = run_refseq(&folder, &output).context("refseq step failed")?;
            default_annotation = Some(output);
            Some(build)
        }
        None => None,
    };

    let mut cohorts = Vec::with_capacity(plan.cohorts.len());
    for (i, cohort) in plan.cohorts.iter().enumerate() {
        info!(cohort = i, cancer_id = %cohort.cancer_id, "cohort started");
        let config = cohort_config(cohort, ws, default_annotation.as_deref())?;
        let ctx = run_normalize(config)
            .with_context(|| format!("normalize failed for cohort {}", cohort.cancer_id))?;

        let heatmap = match &cohort.heatmap {
            Some(step) => {
                let cfg = heatmap_config(cohort, step, ws);
                let summary = run_heatmap(&cfg)
                    .with_context(|| format!("heatmap failed for cohort {}", cohort.cancer_id))?;
                Some(summary)
            }
            None => None,
        };
        cohorts.push(CohortOutcome { ctx, heatmap });
    }

    Ok(RunOutcome { refseq, cohorts })
}

fn cohort_config(
    cohort: &CohortPlan,
    ws: &Workspace,
    default_annotation: Option<&Path>,
) -> Result<NormalizeConfig> {
    let annotation = match (&cohort.annotation, default_annotation) {
        (Some(p), _) => ws.resolve(p),
        (None, Some(p)) => p.to_path_buf(),
        (None, None) => bail!(
            "cohort {} has no annotation and the plan has no refseq step",
            cohort.cancer_id
        ),
    };

    let mut config = NormalizeConfig::new(
        cohort.cancer_id.clone(),
        DatasetSpec {
            files: ws.resolve_all(&cohort.proteome_files),
            flavor: cohort.proteome_pipeline,
        },
        annotation,
        ws.resolve(&cohort.output_file),
        ws.resolve(&cohort.meta_file),
    );
    config.ptm = PtmSpec::from_parts(
        ws.resolve_all(&cohort.ptm_files),
        cohort.ptm_pipeline,
        cohort.ptm_prefixes.clone(),
    )?;
    config.summary_file = cohort.summary_file.as_ref().map(|p| ws.resolve(p));
    config.report_path = cohort.report.as_ref().map(|p| ws.resolve(p));
    config.reference_genome = cohort.reference_genome.clone();
    config.fill = cohort.fill;
    config.sample_key = SampleKeyOptions {
        pattern: cohort.sample_regex.clone(),
        prefix: cohort.sample_prefix.clone(),
        delimiter: cohort.sample_delimiter,
    };
    Ok(config)
}

fn heatmap_config(cohort: &CohortPlan, step: &HeatmapStep, ws: &Workspace) -> HeatmapConfig {
    let mut cfg = HeatmapConfig::new(
        ws.resolve(&cohort.output_file),
        ws.resolve(&step.subtypes),
        ws.resolve(&step.output),
    );
    cfg.top_variable = step.top_variable;
    if let Some(fill) = step.fill {
        cfg.fill = fill;
    }
    if let Some(w) = step.cell_width {
        cfg.cell_width = w;
    }
    if let Some(h) = step.cell_height {
        cfg.cell_height = h;
    }
    cfg.sample_regex = step.sample_regex.clone();
    cfg.sample_prefix = step.sample_prefix.clone();
    cfg.font = step.font.as_ref().map(|p| ws.resolve(p));
    cfg
}
