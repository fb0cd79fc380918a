use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Result, bail};

use crate::annotation::{ANNOTATION_HEADER, AnnotationRecord, NormalizedTable};
use crate::dataset::{FillPolicy, format_value};
use crate::io::{StagedWrites, write_atomic};
use crate::math::stats::nan_sum;

pub const NORMALIZED_ID_COLUMNS: [&str; 3] =
    ["Composite.Element.REF", "Hugo_Symbol", "Entrez_Gene_Id"];

pub fn write_annotation_tsv(path: &Path, records: &[AnnotationRecord]) -> Result<()> {
    write_atomic(path, |w| {
        writeln!(w, "{}", ANNOTATION_HEADER.join("\t"))?;
        for r in records {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}",
                clean(&r.protein),
                clean(&r.mrna),
                clean(&r.gene),
                clean(&r.entrez),
                clean(&r.description)
            )?;
        }
        Ok(())
    })
}

pub fn write_normalized_tsv(
    out: &mut StagedWrites,
    path: &Path,
    table: &NormalizedTable,
    fill: FillPolicy,
) -> Result<()> {
    if table.rows.is_empty() {
        bail!("refusing to write empty table to {}", path.display());
    }
    out.stage(path, |w| {
        write!(w, "{}", NORMALIZED_ID_COLUMNS.join("\t"))?;
        for sample in &table.samples {
            write!(w, "\t{}", sample)?;
        }
        writeln!(w)?;
        for row in &table.rows {
            ensure_len(row.values.len(), table.samples.len(), &row.composite)?;
            write!(w, "{}\t{}\t{}", row.composite, row.hugo, row.entrez)?;
            for v in &row.values {
                write!(w, "\t{}", fill.render(*v))?;
            }
            writeln!(w)?;
        }
        Ok(())
    })
}

/// Per-gene sums of the PTM rows of a normalized table.
#[derive(Debug, Clone)]
pub struct PtmSummary {
    pub samples: Vec<String>,
    pub genes: BTreeMap<String, Vec<f64>>,
}

impl PtmSummary {
    /// Rows without a symbol are left out. Fails when nothing is left, so
    /// callers can check before writing any output.
    pub fn from_table(table: &NormalizedTable) -> Result<Self> {
        let mut by_gene: BTreeMap<&str, Vec<Vec<Option<f64>>>> = BTreeMap::new();
        for row in table.rows.iter().filter(|r| r.ptm && !r.hugo.is_empty()) {
            let cols = by_gene
                .entry(row.hugo.as_str())
                .or_insert_with(|| vec![Vec::new(); table.samples.len()]);
            for (c, v) in cols.iter_mut().zip(&row.values) {
                c.push(*v);
            }
        }
        if by_gene.is_empty() {
            bail!("no annotated PTM rows to summarise");
        }
        let genes = by_gene
            .into_iter()
            .map(|(gene, cols)| (gene.to_string(), cols.iter().map(|c| nan_sum(c)).collect()))
            .collect();
        Ok(Self {
            samples: table.samples.clone(),
            genes,
        })
    }
}

pub fn write_ptm_summary_tsv(
    out: &mut StagedWrites,
    path: &Path,
    summary: &PtmSummary,
) -> Result<()> {
    out.stage(path, |w| {
        write!(w, "Hugo_Symbol")?;
        for sample in &summary.samples {
            write!(w, "\t{}", sample)?;
        }
        writeln!(w)?;
        for (gene, sums) in &summary.genes {
            write!(w, "{}", gene)?;
            for v in sums {
                write!(w, "\t{}", format_value(*v))?;
            }
            writeln!(w)?;
        }
        Ok(())
    })
}

fn clean(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

fn ensure_len(got: usize, expected: usize, name: &str) -> Result<()> {
    if got != expected {
        bail!("{} length mismatch: {} != {}", name, got, expected);
    }
    Ok(())
}
