use anyhow::{Result, bail};
use tracing::info;

use crate::ctx::Ctx;
use crate::dataset::{QuantTable, merge_tables, stack_tables};
use crate::pipeline::Stage;

/// Merges files that share a PTM prefix (proteome files form one group),
/// then stacks the groups: proteome first, PTM groups in first-seen order.
pub struct Stage3Merge;

impl Stage3Merge {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Merge {
    fn name(&self) -> &'static str {
        "stage3_merge"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut groups: Vec<(Option<String>, Vec<QuantTable>)> = Vec::new();
        for ds in ctx.datasets.iter_mut() {
            let Some(table) = ds.table.take() else {
                continue;
            };
            match groups.iter_mut().find(|(p, _)| *p == ds.ptm_prefix) {
                Some((_, tables)) => tables.push(table),
                None => groups.push((ds.ptm_prefix.clone(), vec![table])),
            }
        }
        if groups.is_empty() {
            bail!("no datasets loaded");
        }
        // Proteome group first.
        groups.sort_by_key(|(p, _)| p.is_some());

        let mut merged = Vec::with_capacity(groups.len());
        for (prefix, tables) in groups {
            let (table, warnings) = merge_tables(tables)?;
            if table.n_rows() == 0 {
                bail!(
                    "{} produced no rows after merging",
                    prefix.map_or("proteome".to_string(), |p| format!("PTM group '{}'", p))
                );
            }
            ctx.warnings.extend(warnings);
            merged.push(table);
        }

        let table = stack_tables(merged);
        info!(
            rows = table.n_rows(),
            samples = table.n_samples(),
            "datasets_combined"
        );
        ctx.merged = Some(table);
        Ok(())
    }
}
