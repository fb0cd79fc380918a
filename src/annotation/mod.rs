mod loader;
mod resolve;
pub mod site;

use std::collections::HashMap;

pub use loader::load_annotation_tsv;
pub use resolve::{NormalizedRow, NormalizedTable, ResolveStats, resolve_table};

pub const ANNOTATION_HEADER: [&str; 5] = ["Protein", "mRNA", "Gene", "Entrez", "Description"];

/// One RefSeq protein. `protein` is the versionless accession and the unique
/// key; empty strings mean the field was absent from the source record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub protein: String,
    pub mrna: String,
    pub gene: String,
    pub entrez: String,
    pub description: String,
}

/// Read-only identifier lookup built from annotation records.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    records: Vec<AnnotationRecord>,
    by_protein: HashMap<String, usize>,
    by_mrna: HashMap<String, usize>,
    by_gene: HashMap<String, usize>,
}

impl AnnotationTable {
    /// Indexes records; for every key the first record wins. Returns
    /// warnings for repeated protein accessions.
    pub fn from_records(records: Vec<AnnotationRecord>) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut by_protein = HashMap::new();
        let mut by_mrna = HashMap::new();
        let mut by_gene = HashMap::new();
        for (i, rec) in records.iter().enumerate() {
            if let Some(first) = by_protein.get(&rec.protein) {
                warnings.push(format!(
                    "duplicate protein accession '{}' at row {} (kept first at row {})",
                    rec.protein,
                    i + 1,
                    first + 1
                ));
                continue;
            }
            by_protein.insert(rec.protein.clone(), i);
            if !rec.mrna.is_empty() {
                by_mrna.entry(rec.mrna.clone()).or_insert(i);
            }
            if !rec.gene.is_empty() {
                by_gene.entry(rec.gene.clone()).or_insert(i);
            }
        }
        (
            Self {
                records,
                by_protein,
                by_mrna,
                by_gene,
            },
            warnings,
        )
    }

    pub fn len(&self) -> usize {
        self.by_protein.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_protein.is_empty()
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    /// Resolves a protein accession, a transcript accession or a gene symbol,
    /// in that order. Accession versions are ignored.
    pub fn lookup(&self, id: &str) -> Option<&AnnotationRecord> {
        let stripped = strip_version(id);
        self.by_protein
            .get(stripped)
            .or_else(|| self.by_mrna.get(stripped))
            .or_else(|| self.by_gene.get(id))
            .or_else(|| self.by_gene.get(stripped))
            .map(|&i| &self.records[i])
    }
}

/// `NP_000005.3` -> `NP_000005`.
pub fn strip_version(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(protein: &str, mrna: &str, gene: &str) -> AnnotationRecord {
        AnnotationRecord {
            protein: protein.to_string(),
            mrna: mrna.to_string(),
            gene: gene.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn lookup_order_and_versions() {
        let (table, warnings) = AnnotationTable::from_records(vec![
            rec("NP_1", "NM_1", "BRCA1"),
            rec("NP_2", "NM_2", "TP53"),
        ]);
        assert!(warnings.is_empty());
        assert_eq!(table.lookup("NP_1.4").unwrap().gene, "BRCA1");
        assert_eq!(table.lookup("NM_2.1").unwrap().gene, "TP53");
        assert_eq!(table.lookup("TP53").unwrap().protein, "NP_2");
        assert!(table.lookup("NP_3").is_none());
    }

    #[test]
    fn duplicate_protein_keeps_first() {
        let (table, warnings) =
            AnnotationTable::from_records(vec![rec("NP_1", "", "A"), rec("NP_1", "", "B")]);
        assert_eq!(table.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(table.lookup("NP_1").unwrap().gene, "A");
    }
}
