use std::fs;

use tempfile::TempDir;

use cptac_portal::annotation::{AnnotationRecord, AnnotationTable, load_annotation_tsv};

fn record(protein: &str, mrna: &str, gene: &str) -> AnnotationRecord {
    AnnotationRecord {
        protein: protein.to_string(),
        mrna: mrna.to_string(),
        gene: gene.to_string(),
        entrez: String::new(),
        description: String::new(),
    }
}

#[test]
fn lookup_by_protein_mrna_and_symbol() {
    let (table, warnings) = AnnotationTable::from_records(vec![
        record("NP_000005", "NM_000014", "A2M"),
        record("NP_000007", "NM_000016", "ACADM"),
    ]);
    assert!(warnings.is_empty());
    assert_eq!(table.lookup("NP_000005.3").unwrap().gene, "A2M");
    assert_eq!(table.lookup("NM_000016.2").unwrap().gene, "ACADM");
    assert_eq!(table.lookup("ACADM").unwrap().protein, "NP_000007");
    assert!(table.lookup("NP_999999").is_none());
}

#[test]
fn loader_keeps_first_duplicate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annotation.tsv");
    fs::write(
        &path,
        "Protein\tmRNA\tGene\tEntrez\tDescription\n\
NP_1\tNM_1\tBRCA1\t672\tfirst\n\
NP_1\tNM_9\tOTHER\t1\tsecond\n",
    )
    .unwrap();
    let (table, warnings) = load_annotation_tsv(&path).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(warnings.len(), 1);
    assert_eq!(table.lookup("NP_1").unwrap().gene, "BRCA1");
}

#[test]
fn loader_rejects_missing_columns_and_ragged_lines() {
    let dir = TempDir::new().unwrap();
    let no_gene = dir.path().join("no_gene.tsv");
    fs::write(&no_gene, "Protein\tmRNA\nNP_1\tNM_1\n").unwrap();
    assert!(load_annotation_tsv(&no_gene).is_err());

    let ragged = dir.path().join("ragged.tsv");
    fs::write(&ragged, "Protein\tmRNA\tGene\nNP_1\tNM_1\n").unwrap();
    assert!(load_annotation_tsv(&ragged).is_err());
}
