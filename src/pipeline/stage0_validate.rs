use anyhow::{Result, bail};
use tracing::info;

use crate::annotation::site::validate_prefix;
use crate::ctx::Ctx;
use crate::pipeline::Stage;

/// Checks every input up front so a bad invocation never leaves output
/// behind.
pub struct Stage0Validate;

impl Stage0Validate {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Validate {
    fn name(&self) -> &'static str {
        "stage0_validate"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let config = &ctx.config;
        if config.cancer_id.trim().is_empty() {
            bail!("cancer id must not be empty");
        }
        if config.proteome.files.is_empty() {
            bail!("at least one proteome file is required");
        }
        if let Some(ptm) = &config.ptm {
            if ptm.files.len() != ptm.prefixes.len() {
                bail!(
                    "{} PTM files but {} PTM prefixes",
                    ptm.files.len(),
                    ptm.prefixes.len()
                );
            }
            for prefix in &ptm.prefixes {
                validate_prefix(prefix)?;
            }
        }

        let mut missing = Vec::new();
        if !config.annotation_path.is_file() {
            missing.push(config.annotation_path.display().to_string());
        }
        for (path, _, _) in ctx.inputs() {
            if !path.is_file() {
                missing.push(path.display().to_string());
            }
        }
        if !missing.is_empty() {
            bail!("missing input file(s): {}", missing.join(", "));
        }

        let outputs = [
            Some(&config.output_file),
            Some(&config.meta_file),
            config.summary_file.as_ref(),
            config.report_path.as_ref(),
        ];
        for out in outputs.into_iter().flatten() {
            if ctx.inputs().iter().any(|(p, _, _)| p == out) || *out == config.annotation_path {
                bail!("output {} would overwrite an input", out.display());
            }
        }

        info!(
            inputs = ctx.inputs().len(),
            annotation = %config.annotation_path.display(),
            "inputs_validated"
        );
        Ok(())
    }
}
