use std::collections::HashMap;

use anyhow::{Result, bail};
use tracing::info;

use crate::dataset::{QuantTable, RowKey};

/// Outer-joins tables of one cohort on their row keys. Sample columns are
/// concatenated in table order; a sample present in several tables is
/// averaged over its non-missing values.
///
/// Every table after the first must share at least one row key with the rows
/// merged so far, otherwise the inputs are not the same cohort.
pub fn merge_tables(tables: Vec<QuantTable>) -> Result<(QuantTable, Vec<String>)> {
    let mut warnings = Vec::new();
    let mut iter = tables.into_iter();
    let Some(first) = iter.next() else {
        bail!("no tables to merge");
    };
    let rest: Vec<QuantTable> = iter.collect();
    if rest.is_empty() {
        return Ok((first, warnings));
    }

    let mut samples: Vec<String> = Vec::new();
    let mut sample_index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<RowKey> = Vec::new();
    let mut row_index: HashMap<RowKey, usize> = HashMap::new();
    let mut sums: Vec<Vec<f64>> = Vec::new();
    let mut counts: Vec<Vec<u32>> = Vec::new();
    let mut sources = Vec::new();

    for (t_idx, table) in std::iter::once(first).chain(rest).enumerate() {
        if t_idx > 0 && !table.rows.iter().any(|k| row_index.contains_key(k)) {
            bail!(
                "{} shares no row identifiers with {}; inputs do not describe the same cohort",
                table.source,
                sources.join(",")
            );
        }

        let mut slot_map = Vec::with_capacity(table.n_samples());
        for sample in &table.samples {
            let slot = match sample_index.get(sample) {
                Some(&slot) => {
                    warnings.push(format!(
                        "sample {} appears in several inputs ({}); values averaged",
                        sample, table.source
                    ));
                    slot
                }
                None => {
                    sample_index.insert(sample.clone(), samples.len());
                    samples.push(sample.clone());
                    for (s, c) in sums.iter_mut().zip(counts.iter_mut()) {
                        s.push(0.0);
                        c.push(0);
                    }
                    samples.len() - 1
                }
            };
            slot_map.push(slot);
        }

        for (key, values) in table.rows.into_iter().zip(table.values) {
            let r = match row_index.get(&key) {
                Some(&r) => r,
                None => {
                    row_index.insert(key.clone(), rows.len());
                    rows.push(key);
                    sums.push(vec![0.0; samples.len()]);
                    counts.push(vec![0; samples.len()]);
                    rows.len() - 1
                }
            };
            for (value, &slot) in values.into_iter().zip(&slot_map) {
                if let Some(v) = value {
                    sums[r][slot] += v;
                    counts[r][slot] += 1;
                }
            }
        }
        sources.push(table.source);
    }

    let mut merged = QuantTable::new(sources.join(","), samples);
    for ((key, s), c) in rows.into_iter().zip(sums).zip(counts) {
        let values = s
            .into_iter()
            .zip(c)
            .map(|(sum, n)| if n == 0 { None } else { Some(sum / n as f64) })
            .collect();
        merged.push_row(key, values);
    }

    info!(
        inputs = sources.len(),
        rows = merged.n_rows(),
        samples = merged.n_samples(),
        "tables_merged"
    );
    Ok((merged, warnings))
}

/// Vertically concatenates tables (proteome rows, then PTM groups). Sample
/// columns are the union in first-seen order; absent cells are missing.
pub fn stack_tables(tables: Vec<QuantTable>) -> QuantTable {
    let mut samples: Vec<String> = Vec::new();
    let mut sample_index: HashMap<String, usize> = HashMap::new();
    for table in &tables {
        for sample in &table.samples {
            if !sample_index.contains_key(sample) {
                sample_index.insert(sample.clone(), samples.len());
                samples.push(sample.clone());
            }
        }
    }

    let source = tables
        .iter()
        .map(|t| t.source.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let mut out = QuantTable::new(source, samples);
    for table in tables {
        let slot_map: Vec<usize> = table.samples.iter().map(|s| sample_index[s]).collect();
        for (key, values) in table.rows.into_iter().zip(table.values) {
            let mut row = vec![None; out.n_samples()];
            for (value, &slot) in values.into_iter().zip(&slot_map) {
                row[slot] = value;
            }
            out.push_row(key, row);
        }
    }
    out
}
