use anyhow::{Context, Result};

use crate::ctx::Ctx;

pub fn format_summary(ctx: &Ctx) -> Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    let table = ctx
        .normalized
        .as_ref()
        .context("normalized table missing")?;
    let ptm_rows = table.rows.iter().filter(|r| r.ptm).count();
    let stats = &ctx.resolve_stats;

    let mut out = String::new();
    out.push_str(&format!("cptac-portal v{}\n", version));
    out.push_str(&format!(
        "Cohort: {} ({} input files)\n",
        ctx.config.cancer_id,
        ctx.datasets.len()
    ));
    out.push_str(&format!(
        "Rows: {} ({} proteome, {} PTM), samples: {}\n",
        table.rows.len(),
        table.rows.len() - ptm_rows,
        ptm_rows,
        table.samples.len()
    ));
    out.push_str(&format!(
        "Annotation: {} matched, {} unmatched\n",
        stats.matched, stats.unmatched
    ));
    out.push_str(&format!("Output: {}\n", ctx.config.output_file.display()));
    if let Some(genes) = ctx.summary_genes {
        out.push_str(&format!("PTM summary: {} genes\n", genes));
    }
    Ok(out)
}
