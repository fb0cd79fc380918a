pub mod flavor;
pub mod merge;
pub mod reader;
pub mod sample_key;

use serde::{Deserialize, Serialize};

pub use flavor::{ColumnRule, Flavor, SourceFormat};
pub use merge::{merge_tables, stack_tables};
pub use reader::{LoadReport, load_dataset};
pub use sample_key::{SampleKey, SampleKeyOptions};

/// Merge key of a quantification row. PTM rows carry the prefix of the file
/// they were read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub raw_id: String,
    pub ptm_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuantTable {
    pub source: String,
    pub samples: Vec<String>,
    pub rows: Vec<RowKey>,
    /// Row-major; every row has `samples.len()` cells.
    pub values: Vec<Vec<Option<f64>>>,
}

impl QuantTable {
    pub fn new(source: impl Into<String>, samples: Vec<String>) -> Self {
        Self {
            source: source.into(),
            samples,
            rows: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn push_row(&mut self, key: RowKey, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.samples.len());
        self.rows.push(key);
        self.values.push(values);
    }
}

/// How missing cells are written (normalizer) or used (heatmap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    #[default]
    Blank,
    Na,
    Zero,
}

impl FillPolicy {
    pub fn fill(self, value: Option<f64>) -> Option<f64> {
        match (self, value) {
            (FillPolicy::Zero, None) => Some(0.0),
            _ => value,
        }
    }

    pub fn render(self, value: Option<f64>) -> String {
        match value {
            Some(v) => format_value(v),
            None => match self {
                FillPolicy::Blank => String::new(),
                FillPolicy::Na => "NA".to_string(),
                FillPolicy::Zero => "0".to_string(),
            },
        }
    }
}

/// Shortest round-trip rendering so repeated runs are byte-identical.
pub fn format_value(v: f64) -> String {
    if v == 0.0 {
        // Collapse -0.
        return "0".to_string();
    }
    format!("{}", v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_policy_rendering() {
        assert_eq!(FillPolicy::Blank.render(None), "");
        assert_eq!(FillPolicy::Na.render(None), "NA");
        assert_eq!(FillPolicy::Zero.render(None), "0");
        assert_eq!(FillPolicy::Blank.render(Some(1.5)), "1.5");
        assert_eq!(FillPolicy::Zero.fill(None), Some(0.0));
        assert_eq!(FillPolicy::Blank.fill(None), None);
    }
}
