use anyhow::Result;

use crate::annotation::load_annotation_tsv;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage1Annotation;

impl Stage1Annotation {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Annotation {
    fn name(&self) -> &'static str {
        "stage1_annotation"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let (table, warnings) = load_annotation_tsv(&ctx.config.annotation_path)?;
        ctx.warnings.extend(warnings);
        ctx.annotation = Some(table);
        Ok(())
    }
}
