use anyhow::Result;

use crate::ctx::{Ctx, LoadedDataset};
use crate::dataset::load_dataset;
use crate::pipeline::Stage;

pub struct Stage2Load;

impl Stage2Load {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Load {
    fn name(&self) -> &'static str {
        "stage2_load"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        for (path, flavor, prefix) in ctx.inputs() {
            let key = ctx.config.sample_key.build(flavor.format())?;
            let (table, report) = load_dataset(&path, flavor, prefix.as_deref(), &key)?;
            ctx.warnings.extend(report.warnings.iter().cloned());
            ctx.datasets.push(LoadedDataset {
                path,
                ptm_prefix: prefix,
                table: Some(table),
                report,
            });
        }
        Ok(())
    }
}
