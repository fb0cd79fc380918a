use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::dataset::flavor::SourceFormat;

pub const CDAP_PATTERN: &str = r"([A-Z0-9]{2}-[A-Z0-9]{4}-[A-Z0-9]{2})[A-Z0-9\-]+";
pub const CDAP_PREFIX: &str = "TCGA-";
pub const MAXQUANT_PATTERN: &str = r"[A-Za-z0-9\s]+";
pub const BARCODE_PATTERN: &str = r"TCGA-([A-Z0-9]{2}-[A-Z0-9]{4}-[A-Z0-9]{2})";
pub const BARCODE_PREFIX: &str = "TCGA-";

/// Rewrites a raw sample label into the canonical join key: capture group 1
/// (or the whole match), optional `-` replacement, then a literal prefix.
#[derive(Debug, Clone)]
pub struct SampleKey {
    pattern: String,
    full: Regex,
    anchored: Regex,
    prefix: String,
    delimiter: Option<char>,
}

impl SampleKey {
    pub fn new(pattern: &str, prefix: &str, delimiter: Option<char>) -> Result<Self> {
        let full = Regex::new(&format!("^(?:{})$", pattern))
            .with_context(|| format!("invalid sample regex '{}'", pattern))?;
        let anchored = Regex::new(&format!("^(?:{})", pattern))
            .with_context(|| format!("invalid sample regex '{}'", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            full,
            anchored,
            prefix: prefix.to_string(),
            delimiter,
        })
    }

    pub fn barcode_default() -> Result<Self> {
        Self::new(BARCODE_PATTERN, BARCODE_PREFIX, None)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Key for a header core that must match the pattern in full.
    pub fn canonical_full(&self, core: &str) -> Option<String> {
        self.full.captures(core).map(|caps| self.build(&caps))
    }

    /// Key for a barcode matched from its start; trailing text is ignored.
    pub fn canonical(&self, barcode: &str) -> Option<String> {
        self.anchored.captures(barcode).map(|caps| self.build(&caps))
    }

    fn build(&self, caps: &Captures<'_>) -> String {
        let matched = caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let body = match self.delimiter {
            Some(d) => matched.replace('-', &d.to_string()),
            None => matched.to_string(),
        };
        format!("{}{}", self.prefix, body)
    }
}

/// User overrides; unset fields fall back to the per-format defaults.
#[derive(Debug, Clone, Default)]
pub struct SampleKeyOptions {
    pub pattern: Option<String>,
    pub prefix: Option<String>,
    pub delimiter: Option<char>,
}

impl SampleKeyOptions {
    pub fn build(&self, format: SourceFormat) -> Result<SampleKey> {
        let (pattern, prefix) = match format {
            SourceFormat::Cdap => (CDAP_PATTERN, CDAP_PREFIX),
            SourceFormat::MaxQuant => (MAXQUANT_PATTERN, ""),
        };
        SampleKey::new(
            self.pattern.as_deref().unwrap_or(pattern),
            self.prefix.as_deref().unwrap_or(prefix),
            self.delimiter,
        )
    }
}
