use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::tsv_writer::PtmSummary;
use crate::io::{StagedWrites, json_writer, meta, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage5Output;

impl Stage5Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Output {
    fn name(&self) -> &'static str {
        "stage5_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let table = ctx.normalized.as_ref().context("normalized table missing")?;
        let config = &ctx.config;

        let summary = match &config.summary_file {
            Some(path) => {
                let summary = PtmSummary::from_table(table)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                Some((path, summary))
            }
            None => None,
        };
        ctx.summary_genes = summary.as_ref().map(|(_, s)| s.genes.len());
        let report = match &ctx.config.report_path {
            Some(_) => Some(json_writer::build_report(ctx)?),
            None => None,
        };

        let mut out = StagedWrites::new();
        tsv_writer::write_normalized_tsv(&mut out, &config.output_file, table, config.fill)?;
        let text = meta::meta_text(
            &config.cancer_id,
            &config.output_file,
            config.proteome.flavor.format(),
            config.reference_genome.as_deref(),
        );
        meta::write_meta(&mut out, &config.meta_file, &text)?;
        if let Some((path, summary)) = &summary {
            tsv_writer::write_ptm_summary_tsv(&mut out, path, summary)?;
        }
        if let (Some(path), Some(report)) = (&config.report_path, &report) {
            json_writer::write_json(&mut out, path, report)?;
        }
        let files = out.len();
        out.commit()?;

        info!(
            output = %ctx.config.output_file.display(),
            meta = %ctx.config.meta_file.display(),
            files,
            "stage5_output_ready"
        );
        Ok(())
    }
}
