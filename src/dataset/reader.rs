use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use tracing::{info, warn};

use crate::dataset::flavor::{ColumnRule, Flavor, SourceFormat};
use crate::dataset::sample_key::SampleKey;
use crate::dataset::{QuantTable, RowKey};
use crate::io::tsv_reader;
use crate::math::stats::nan_mean;

const CDAP_SUMMARY_ROWS: [&str; 3] = ["Mean", "Median", "StdDev"];
const MAXQUANT_Q_VALUE_MAX: f64 = 0.05;
const MAXQUANT_LOCALIZATION_MIN: f64 = 0.75;

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_filtered: usize,
    pub rows_malformed: usize,
    pub duplicate_rows: usize,
    pub duplicate_samples: usize,
    pub warnings: Vec<String>,
}

enum RowOutcome {
    Keep(String),
    Filtered,
    Malformed(String),
}

/// Where the row identifier of a given export lives and which rows to drop.
enum RowSource {
    Cdap,
    MaxQuantProteome {
        protein_ids: usize,
        gene_names: usize,
        q_value: usize,
    },
    MaxQuantPtm {
        protein: usize,
        amino_acid: usize,
        positions: usize,
        gene_names: usize,
        localization: usize,
    },
}

impl RowSource {
    fn detect(format: SourceFormat, ptm: bool, headers: &StringRecord, source: &str) -> Result<Self> {
        let col = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("{}: missing required column '{}'", source, name))
        };
        match (format, ptm) {
            (SourceFormat::Cdap, _) => Ok(RowSource::Cdap),
            (SourceFormat::MaxQuant, false) => Ok(RowSource::MaxQuantProteome {
                protein_ids: col("Protein IDs")?,
                gene_names: col("Gene names")?,
                q_value: col("Q-value")?,
            }),
            (SourceFormat::MaxQuant, true) => Ok(RowSource::MaxQuantPtm {
                protein: col("Protein")?,
                amino_acid: col("Amino acid")?,
                positions: col("Positions within proteins")?,
                gene_names: col("Gene names")?,
                localization: col("Localization prob")?,
            }),
        }
    }

    fn extract(&self, record: &StringRecord) -> RowOutcome {
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        match *self {
            RowSource::Cdap => {
                let id = field(0);
                if id.is_empty() {
                    RowOutcome::Malformed("empty row identifier".to_string())
                } else if CDAP_SUMMARY_ROWS.contains(&id) {
                    RowOutcome::Filtered
                } else {
                    RowOutcome::Keep(id.to_string())
                }
            }
            RowSource::MaxQuantProteome {
                protein_ids,
                gene_names,
                q_value,
            } => {
                if is_decoy_or_contaminant(field(protein_ids)) {
                    return RowOutcome::Filtered;
                }
                let Some(gene) = first_entry(field(gene_names)) else {
                    return RowOutcome::Filtered;
                };
                match field(q_value).parse::<f64>() {
                    Ok(q) if q < MAXQUANT_Q_VALUE_MAX => RowOutcome::Keep(gene.to_string()),
                    _ => RowOutcome::Filtered,
                }
            }
            RowSource::MaxQuantPtm {
                protein,
                amino_acid,
                positions,
                gene_names,
                localization,
            } => {
                if is_decoy_or_contaminant(field(protein)) {
                    return RowOutcome::Filtered;
                }
                let Some(gene) = first_entry(field(gene_names)) else {
                    return RowOutcome::Filtered;
                };
                match field(localization).parse::<f64>() {
                    Ok(p) if p > MAXQUANT_LOCALIZATION_MIN => {}
                    _ => return RowOutcome::Filtered,
                }
                let aa = field(amino_acid);
                let Some(pos) = first_entry(field(positions)) else {
                    return RowOutcome::Malformed("missing site position".to_string());
                };
                if aa.is_empty() {
                    return RowOutcome::Malformed("missing site amino acid".to_string());
                }
                RowOutcome::Keep(format!("{}:{}{}", gene, aa, pos))
            }
        }
    }
}

fn is_decoy_or_contaminant(protein: &str) -> bool {
    protein.is_empty() || protein.contains("REV") || protein.contains("CON")
}

fn first_entry(field: &str) -> Option<&str> {
    field.split(';').next().map(str::trim).filter(|s| !s.is_empty())
}

/// Parses one quantitative cell. Blank and NA-like cells are missing; any
/// other non-numeric text is an error.
fn parse_cell(raw: &str, rule: &ColumnRule) -> Result<Option<f64>, String> {
    let s = raw.trim();
    if s.is_empty() || matches!(s, "NA" | "NaN" | "nan" | "#N/A" | "N/A" | "null") {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(rule.apply(v)),
        Err(_) => Err(format!("non-numeric value '{}'", s)),
    }
}

/// Reads one raw export and keeps only the sample columns selected by the
/// flavor's column rule, keyed by their canonical sample id.
pub fn load_dataset(
    path: &Path,
    flavor: Flavor,
    ptm_prefix: Option<&str>,
    key: &SampleKey,
) -> Result<(QuantTable, LoadReport)> {
    let source = path.display().to_string();
    let rule = flavor.rule();
    let mut reader = tsv_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", source))?
        .clone();
    if headers.is_empty() {
        bail!("{}: empty header", source);
    }

    let row_source = RowSource::detect(rule.format, ptm_prefix.is_some(), &headers, &source)?;

    let mut report = LoadReport::default();
    let mut samples: Vec<String> = Vec::new();
    let mut sample_index: HashMap<String, usize> = HashMap::new();
    // (column, sample slot)
    let mut slots: Vec<(usize, usize)> = Vec::new();
    for (col, name) in headers.iter().enumerate() {
        let Some(core) = rule.sample_core(name) else {
            continue;
        };
        let Some(sample) = key.canonical_full(core) else {
            continue;
        };
        let slot = match sample_index.get(&sample) {
            Some(&slot) => {
                report.duplicate_samples += 1;
                report.warnings.push(format!(
                    "{}: column '{}' duplicates sample {}; values averaged",
                    source, name, sample
                ));
                slot
            }
            None => {
                sample_index.insert(sample.clone(), samples.len());
                samples.push(sample);
                samples.len() - 1
            }
        };
        slots.push((col, slot));
    }
    if samples.is_empty() {
        bail!(
            "{}: no sample columns matched flavor '{}' with pattern {}",
            source,
            flavor.name(),
            key.pattern()
        );
    }

    let mut table = QuantTable::new(source.clone(), samples);
    let mut seen: HashSet<String> = HashSet::new();
    let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); table.n_samples()];

    for (idx, result) in reader.records().enumerate() {
        let line_no = idx + 2;
        report.rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(err) => {
                skip_malformed(&mut report, &source, line_no, &err.to_string());
                continue;
            }
        };
        if record.len() != headers.len() {
            let reason = format!("expected {} fields, found {}", headers.len(), record.len());
            skip_malformed(&mut report, &source, line_no, &reason);
            continue;
        }

        let raw_id = match row_source.extract(&record) {
            RowOutcome::Keep(id) => id,
            RowOutcome::Filtered => {
                report.rows_filtered += 1;
                continue;
            }
            RowOutcome::Malformed(reason) => {
                skip_malformed(&mut report, &source, line_no, &reason);
                continue;
            }
        };
        if ptm_prefix.is_some() && !has_site(&raw_id) {
            let reason = format!("PTM identifier '{}' has no site", raw_id);
            skip_malformed(&mut report, &source, line_no, &reason);
            continue;
        }

        for c in cells.iter_mut() {
            c.clear();
        }
        let mut bad_cell = None;
        for &(col, slot) in &slots {
            match parse_cell(record.get(col).unwrap_or(""), rule) {
                Ok(v) => cells[slot].push(v),
                Err(reason) => {
                    bad_cell = Some(reason);
                    break;
                }
            }
        }
        if let Some(reason) = bad_cell {
            skip_malformed(&mut report, &source, line_no, &reason);
            continue;
        }

        // First occurrence wins for duplicate identifiers.
        if !seen.insert(raw_id.clone()) {
            report.duplicate_rows += 1;
            report.warnings.push(format!(
                "{}:{} duplicate row identifier '{}' (kept first)",
                source, line_no, raw_id
            ));
            continue;
        }

        let values = cells.iter().map(|c| nan_mean(c)).collect();
        table.push_row(
            RowKey {
                raw_id,
                ptm_prefix: ptm_prefix.map(str::to_string),
            },
            values,
        );
        report.rows_kept += 1;
    }

    if report.rows_malformed > 0 {
        report.warnings.push(format!(
            "{}: skipped {} malformed row(s)",
            source, report.rows_malformed
        ));
    }

    info!(
        file = %source,
        flavor = flavor.name(),
        rows = report.rows_kept,
        samples = table.n_samples(),
        filtered = report.rows_filtered,
        malformed = report.rows_malformed,
        "dataset_loaded"
    );
    Ok((table, report))
}

fn has_site(raw_id: &str) -> bool {
    raw_id
        .split_once(':')
        .map(|(acc, site)| !acc.is_empty() && !site.trim().is_empty())
        .unwrap_or(false)
}

fn skip_malformed(report: &mut LoadReport, source: &str, line_no: usize, reason: &str) {
    warn!(file = %source, line = line_no, reason, "malformed row skipped");
    report.rows_malformed += 1;
}
