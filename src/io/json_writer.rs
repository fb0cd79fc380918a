use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::io::StagedWrites;
use crate::schema::v1::{InputSummary, JoinSummary, NormalizeReportV1, OutputSummary};

pub const MISS_POLICY: &str = "retain_empty_symbol";

pub fn build_report(ctx: &Ctx) -> Result<NormalizeReportV1> {
    let table = ctx
        .normalized
        .as_ref()
        .context("normalized table missing")?;

    let inputs = ctx
        .inputs()
        .into_iter()
        .zip(&ctx.datasets)
        .map(|((path, flavor, _), ds)| InputSummary {
            file: path.display().to_string(),
            flavor,
            ptm_prefix: ds.ptm_prefix.clone(),
            rows_read: ds.report.rows_read,
            rows_kept: ds.report.rows_kept,
            rows_filtered: ds.report.rows_filtered,
            rows_malformed: ds.report.rows_malformed,
            duplicate_rows: ds.report.duplicate_rows,
            duplicate_samples: ds.report.duplicate_samples,
        })
        .collect::<Vec<_>>();

    let stats = &ctx.resolve_stats;
    Ok(NormalizeReportV1 {
        tool_version: ctx.tool_version.clone(),
        cancer_id: ctx.config.cancer_id.clone(),
        fill: ctx.config.fill,
        inputs,
        join: JoinSummary {
            matched: stats.matched,
            unmatched: stats.unmatched,
            miss_policy: MISS_POLICY.to_string(),
            unmatched_examples: stats.unmatched_examples.clone(),
        },
        output: OutputSummary {
            table: ctx.config.output_file.display().to_string(),
            meta: ctx.config.meta_file.display().to_string(),
            ptm_summary: ctx
                .config
                .summary_file
                .as_ref()
                .map(|p| p.display().to_string()),
            rows: table.rows.len(),
            ptm_rows: table.rows.iter().filter(|r| r.ptm).count(),
            samples: table.samples.len(),
            summary_genes: ctx.summary_genes,
        },
        warnings: ctx.warnings.clone(),
    })
}

pub fn write_json(out: &mut StagedWrites, path: &Path, report: &NormalizeReportV1) -> Result<()> {
    out.stage(path, |w| {
        serde_json::to_writer_pretty(&mut *w, report)?;
        Ok(())
    })
}
