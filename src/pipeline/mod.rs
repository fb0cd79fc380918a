use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::{Ctx, NormalizeConfig};

pub mod stage0_validate;
pub mod stage1_annotation;
pub mod stage2_load;
pub mod stage3_merge;
pub mod stage4_annotate;
pub mod stage5_output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The full normalize sequence: validate, annotation, load, merge, join,
    /// output.
    pub fn normalize() -> Self {
        Self::new(vec![
            Box::new(stage0_validate::Stage0Validate::new()),
            Box::new(stage1_annotation::Stage1Annotation::new()),
            Box::new(stage2_load::Stage2Load::new()),
            Box::new(stage3_merge::Stage3Merge::new()),
            Box::new(stage4_annotate::Stage4Annotate::new()),
            Box::new(stage5_output::Stage5Output::new()),
        ])
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        info!(cancer_id = %ctx.config.cancer_id, "normalize started");
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}

pub fn run_normalize(config: NormalizeConfig) -> Result<Ctx> {
    let mut ctx = Ctx::new(config, env!("CARGO_PKG_VERSION"));
    Pipeline::normalize().run(&mut ctx)?;
    Ok(ctx)
}
