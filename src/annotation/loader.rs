use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::annotation::{AnnotationRecord, AnnotationTable};
use crate::io::tsv_reader;

/// Loads an annotation table written by the `refseq` command. Only the
/// `Protein` and `Gene` columns are required. The table is a hard dependency,
/// so any malformed line aborts.
pub fn load_annotation_tsv(path: &Path) -> Result<(AnnotationTable, Vec<String>)> {
    let source = path.display().to_string();
    let mut reader = tsv_reader(path)
        .with_context(|| format!("failed to read annotation table {}", source))?;
    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let Some(protein_col) = find("Protein") else {
        bail!("{}: annotation table has no 'Protein' column", source);
    };
    let Some(gene_col) = find("Gene") else {
        bail!("{}: annotation table has no 'Gene' column", source);
    };
    let mrna_col = find("mRNA");
    let entrez_col = find("Entrez");
    let description_col = find("Description");

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line_no = idx + 2;
        let record = result.with_context(|| format!("{}:{} unreadable line", source, line_no))?;
        if record.len() != headers.len() {
            bail!(
                "{}:{} malformed TSV (expected {} columns, found {})",
                source,
                line_no,
                headers.len(),
                record.len()
            );
        }
        let get = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty() && *s != "NA")
                .unwrap_or("")
                .to_string()
        };
        let protein = get(Some(protein_col));
        if protein.is_empty() {
            bail!("{}:{} empty protein accession", source, line_no);
        }
        records.push(AnnotationRecord {
            protein,
            mrna: get(mrna_col),
            gene: get(Some(gene_col)),
            entrez: get(entrez_col),
            description: get(description_col),
        });
    }

    let (table, warnings) = AnnotationTable::from_records(records);
    if table.is_empty() {
        bail!("{}: annotation table is empty", source);
    }
    info!(file = %source, records = table.len(), "annotation_loaded");
    Ok((table, warnings))
}
