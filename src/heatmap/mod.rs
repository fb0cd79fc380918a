pub mod cluster;
pub mod render;
pub mod subtype;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::dataset::{FillPolicy, SampleKey};
use crate::dataset::sample_key::{BARCODE_PATTERN, BARCODE_PREFIX};
use crate::io::tsv_reader;
use crate::math::stats::variance;

use cluster::ward_linkage;
use render::HeatmapPlot;
use subtype::load_subtypes;

const LABEL_COLUMN: &str = "Composite.Element.REF";

#[derive(Debug, Clone)]
pub struct HeatmapConfig {
    pub input: PathBuf,
    pub subtypes: PathBuf,
    pub output: PathBuf,
    pub fill: FillPolicy,
    pub top_variable: Option<usize>,
    pub cell_width: usize,
    pub cell_height: usize,
    pub sample_regex: Option<String>,
    pub sample_prefix: Option<String>,
    /// TrueType font for labels; system fonts are tried when unset.
    pub font: Option<PathBuf>,
}

impl HeatmapConfig {
    pub fn new(input: PathBuf, subtypes: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            subtypes,
            output,
            fill: FillPolicy::Zero,
            top_variable: None,
            cell_width: 12,
            cell_height: 4,
            sample_regex: None,
            sample_prefix: None,
            font: None,
        }
    }

    pub fn sample_key(&self) -> Result<SampleKey> {
        SampleKey::new(
            self.sample_regex.as_deref().unwrap_or(BARCODE_PATTERN),
            self.sample_prefix.as_deref().unwrap_or(BARCODE_PREFIX),
            None,
        )
    }
}

#[derive(Debug, Clone)]
pub struct HeatmapMatrix {
    pub labels: Vec<String>,
    pub samples: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone)]
pub struct HeatmapSummary {
    pub rows: usize,
    pub samples: usize,
    pub mapped_samples: usize,
    pub width: usize,
    pub height: usize,
}

/// Reads a normalized table; columns the key rejects are not samples.
pub fn load_matrix(path: &Path, key: &SampleKey) -> Result<HeatmapMatrix> {
    let source = path.display().to_string();
    let mut reader =
        tsv_reader(path).with_context(|| format!("failed to read heatmap input {}", source))?;
    let headers = reader.headers()?.clone();
    let label_col = headers
        .iter()
        .position(|h| h.trim() == LABEL_COLUMN)
        .unwrap_or(0);

    let mut columns = Vec::new();
    let mut samples = Vec::new();
    for (i, h) in headers.iter().enumerate() {
        if i == label_col {
            continue;
        }
        if let Some(k) = key.canonical(h.trim()) {
            columns.push(i);
            samples.push(k);
        }
    }
    if samples.is_empty() {
        bail!(
            "{}: no column matches sample pattern '{}'",
            source,
            key.pattern()
        );
    }

    let mut labels = Vec::new();
    let mut values = Vec::new();
    let mut unparsed = 0usize;
    for result in reader.records() {
        let record = result.with_context(|| format!("failed to read {}", source))?;
        let label = record.get(label_col).unwrap_or("").trim().to_string();
        let row: Vec<Option<f64>> = columns
            .iter()
            .map(|&c| {
                let cell = record.get(c).unwrap_or("").trim();
                if cell.is_empty() || cell == "NA" {
                    return None;
                }
                match cell.parse::<f64>() {
                    Ok(v) if v.is_finite() => Some(v),
                    _ => {
                        unparsed += 1;
                        None
                    }
                }
            })
            .collect();
        labels.push(label);
        values.push(row);
    }
    if unparsed > 0 {
        warn!(file = %source, cells = unparsed, "non_numeric_cells_treated_as_missing");
    }
    if labels.is_empty() {
        bail!("{}: no data rows", source);
    }

    Ok(HeatmapMatrix {
        labels,
        samples,
        values,
    })
}

/// Indices of the `n` highest-variance rows, in their original order.
pub fn top_variable_rows(values: &[Vec<Option<f64>>], n: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let present: Vec<f64> = row.iter().flatten().copied().collect();
            (i, variance(&present))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut keep: Vec<usize> = scored.into_iter().take(n).map(|(i, _)| i).collect();
    keep.sort_unstable();
    keep
}

pub fn run_heatmap(cfg: &HeatmapConfig) -> Result<HeatmapSummary> {
    for (what, path) in [("input", &cfg.input), ("subtypes", &cfg.subtypes)] {
        if !path.is_file() {
            bail!("heatmap {} not found: {}", what, path.display());
        }
    }
    let key = cfg.sample_key()?;
    let mut matrix = load_matrix(&cfg.input, &key)?;
    let subtypes = load_subtypes(&cfg.subtypes, &key)?;

    if let Some(n) = cfg.top_variable {
        if n == 0 {
            bail!("--top-variable must be positive");
        }
        if n < matrix.values.len() {
            let keep = top_variable_rows(&matrix.values, n);
            matrix.labels = keep.iter().map(|&i| matrix.labels[i].clone()).collect();
            matrix.values = keep.iter().map(|&i| matrix.values[i].clone()).collect();
        }
    }

    let filled: Vec<Vec<Option<f64>>> = matrix
        .values
        .iter()
        .map(|row| row.iter().map(|&v| cfg.fill.fill(v)).collect())
        .collect();
    let n_rows = filled.len();
    let n_cols = matrix.samples.len();

    // Cells left missing by the fill policy count as zero for distances.
    let row_points: Vec<Vec<f64>> = filled
        .iter()
        .map(|row| row.iter().map(|v| v.unwrap_or(0.0)).collect())
        .collect();
    let col_points: Vec<Vec<f64>> = (0..n_cols)
        .map(|c| row_points.iter().map(|row| row[c]).collect())
        .collect();

    let row_tree = ward_linkage(&row_points);
    let col_tree = ward_linkage(&col_points);
    let row_order = row_tree.leaf_order();
    let col_order = col_tree.leaf_order();

    let cells: Vec<Vec<Option<f64>>> = row_order
        .iter()
        .map(|&r| col_order.iter().map(|&c| filled[r][c]).collect())
        .collect();
    let col_colors: Vec<_> = col_order
        .iter()
        .map(|&c| subtypes.color(&matrix.samples[c]))
        .collect();
    let mapped_samples = matrix
        .samples
        .iter()
        .filter(|s| subtypes.subtype(s).is_some())
        .count();
    if mapped_samples < n_cols {
        warn!(
            unmapped = n_cols - mapped_samples,
            samples = n_cols,
            "samples_without_subtype"
        );
    }

    let row_labels: Vec<String> = row_order.iter().map(|&r| matrix.labels[r].clone()).collect();
    let col_labels: Vec<String> = col_order.iter().map(|&c| matrix.samples[c].clone()).collect();
    let bitmap = render::render(&HeatmapPlot {
        cells: &cells,
        row_tree: &row_tree,
        col_tree: &col_tree,
        row_order: &row_order,
        col_order: &col_order,
        row_labels: &row_labels,
        col_labels: &col_labels,
        col_colors: &col_colors,
        cell_width: cfg.cell_width,
        cell_height: cfg.cell_height,
        font: cfg.font.as_deref(),
    })?;
    bitmap.write_png(&cfg.output)?;

    info!(
        output = %cfg.output.display(),
        rows = n_rows,
        samples = n_cols,
        mapped = mapped_samples,
        width = bitmap.width,
        height = bitmap.height,
        "heatmap_written"
    );

    Ok(HeatmapSummary {
        rows: n_rows,
        samples: n_cols,
        mapped_samples,
        width: bitmap.width,
        height: bitmap.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_variable_keeps_original_order() {
        let values = vec![
            vec![Some(1.0), Some(1.0)],
            vec![Some(0.0), Some(10.0)],
            vec![Some(0.0), Some(2.0)],
            vec![None, None],
        ];
        assert_eq!(top_variable_rows(&values, 2), vec![1, 2]);
    }
}
