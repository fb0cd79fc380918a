use anyhow::{Context, Result, bail};

use crate::annotation::resolve_table;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage4Annotate;

impl Stage4Annotate {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Annotate {
    fn name(&self) -> &'static str {
        "stage4_annotate"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let annotation = ctx.annotation.as_ref().context("annotation table missing")?;
        let merged = ctx.merged.take().context("merged table missing")?;
        let (table, stats) = resolve_table(merged, annotation)?;
        if table.rows.is_empty() {
            bail!("no rows left after the annotation join");
        }
        if stats.unmatched > 0 {
            ctx.warnings.push(format!(
                "{} row(s) had no annotation match and were kept with an empty Hugo_Symbol (e.g. {})",
                stats.unmatched,
                stats.unmatched_examples.join(", ")
            ));
        }
        ctx.resolve_stats = stats;
        ctx.normalized = Some(table);
        Ok(())
    }
}
