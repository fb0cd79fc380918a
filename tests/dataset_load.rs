use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use cptac_portal::dataset::{
    Flavor, QuantTable, SampleKey, SampleKeyOptions, SourceFormat, load_dataset,
};

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn cdap_key() -> SampleKey {
    SampleKeyOptions::default().build(SourceFormat::Cdap).unwrap()
}

fn row(table: &QuantTable, id: &str) -> Vec<Option<f64>> {
    let i = table.rows.iter().position(|k| k.raw_id == id).unwrap();
    table.values[i].clone()
}

#[test]
fn sample_keys_are_canonical() {
    let key = cdap_key();
    assert_eq!(
        key.canonical_full("AB-1234-01A").as_deref(),
        Some("TCGA-AB-1234-01")
    );
    let barcode = SampleKey::barcode_default().unwrap();
    assert_eq!(
        barcode.canonical("TCGA-AB-1234-01A").as_deref(),
        Some("TCGA-AB-1234-01")
    );
    assert_eq!(barcode.canonical("Composite.Element.REF"), None);

    let dotted = SampleKeyOptions {
        delimiter: Some('.'),
        ..Default::default()
    }
    .build(SourceFormat::Cdap)
    .unwrap();
    assert_eq!(
        dotted.canonical_full("AB-1234-01A").as_deref(),
        Some("TCGA-AB.1234.01")
    );
}

#[test]
fn invalid_sample_regex_is_an_error() {
    assert!(SampleKey::new("([A-Z", "", None).is_err());
}

#[test]
fn itraq_selects_log_ratio_columns_and_drops_summary_rows() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "brca.itraq.tsv",
        "Gene\tAB-1234-01A Log Ratio\tAB-1234-01A Unshared Log Ratio\tCD-5678-01A Log Ratio\tNCBIGeneID\n\
NP_1.1\t1.5\t9\t-0.5\t672\n\
Mean\t0\t0\t0\t\n\
NP_2.1\tNA\t9\t2\t675\n",
    );
    let (table, report) = load_dataset(&path, Flavor::Itraq, None, &cdap_key()).unwrap();
    assert_eq!(table.samples, vec!["TCGA-AB-1234-01", "TCGA-CD-5678-01"]);
    assert_eq!(table.n_rows(), 2);
    assert_eq!(report.rows_filtered, 1);
    assert_eq!(row(&table, "NP_1.1"), vec![Some(1.5), Some(-0.5)]);
    assert_eq!(row(&table, "NP_2.1"), vec![None, Some(2.0)]);
}

#[test]
fn precursor_area_is_log2_transformed() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "area.tsv",
        "Gene\tAB-1234-01A Area\tCD-5678-01A Area\nNP_1\t8\t0\n",
    );
    let (table, _) = load_dataset(&path, Flavor::PrecursorArea, None, &cdap_key()).unwrap();
    assert_eq!(row(&table, "NP_1"), vec![Some(3.0), None]);
}

#[test]
fn malformed_rows_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "bad.tsv",
        "Gene\tAB-1234-01A Log Ratio\tCD-5678-01A Log Ratio\n\
NP_1\t1\t2\n\
NP_2\t1\n\
NP_3\tabc\t2\n\
NP_1\t7\t7\n\
NP_4\t3\t4\n",
    );
    let (table, report) = load_dataset(&path, Flavor::Itraq, None, &cdap_key()).unwrap();
    assert_eq!(report.rows_read, 5);
    assert_eq!(report.rows_malformed, 2);
    assert_eq!(report.duplicate_rows, 1);
    let ids: Vec<_> = table.rows.iter().map(|k| k.raw_id.as_str()).collect();
    assert_eq!(ids, vec!["NP_1", "NP_4"]);
    assert_eq!(row(&table, "NP_1"), vec![Some(1.0), Some(2.0)]);
}

#[test]
fn duplicate_sample_columns_are_averaged() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "dup.tsv",
        "Gene\tAB-1234-01A Log Ratio\tAB-1234-01B Log Ratio\nNP_1\t1\t3\n",
    );
    let (table, report) = load_dataset(&path, Flavor::Itraq, None, &cdap_key()).unwrap();
    assert_eq!(table.samples, vec!["TCGA-AB-1234-01"]);
    assert_eq!(report.duplicate_samples, 1);
    assert_eq!(row(&table, "NP_1"), vec![Some(2.0)]);
}

#[test]
fn no_matching_sample_columns_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "none.tsv", "Gene\tfoo\tbar\nNP_1\t1\t2\n");
    assert!(load_dataset(&path, Flavor::Itraq, None, &cdap_key()).is_err());
}

#[test]
fn cdap_ptm_rows_need_a_site() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "phospho.tsv",
        "Phosphosite\tAB-1234-01A Log Ratio\n\
NP_1.1:s12\t0.5\n\
NP_1.1\t0.7\n",
    );
    let (table, report) = load_dataset(&path, Flavor::Itraq, Some("P"), &cdap_key()).unwrap();
    assert_eq!(table.n_rows(), 1);
    assert_eq!(table.rows[0].ptm_prefix.as_deref(), Some("P"));
    assert_eq!(report.rows_malformed, 1);
}

#[test]
fn maxquant_proteome_filters() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "proteinGroups.txt",
        "Protein IDs\tGene names\tQ-value\tIntensity BRCA01\tIntensity BRCA02\n\
P38398\tBRCA1;BRCA1P1\t0.001\t100\t200\n\
REV__P1\tX\t0.001\t1\t1\n\
CON__P2\tY\t0.001\t1\t1\n\
P3\t\t0.001\t1\t1\n\
P4\tTP53\t0.2\t1\t1\n",
    );
    let key = SampleKeyOptions::default()
        .build(SourceFormat::MaxQuant)
        .unwrap();
    let (table, report) = load_dataset(&path, Flavor::Unlabeled, None, &key).unwrap();
    assert_eq!(table.samples, vec!["BRCA01", "BRCA02"]);
    assert_eq!(report.rows_filtered, 4);
    assert_eq!(table.rows[0].raw_id, "BRCA1");
    assert_eq!(table.values[0], vec![Some(100.0), Some(200.0)]);
}

#[test]
fn maxquant_sites_filter_on_localization() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "Phospho (STY)Sites.txt",
        "Protein\tAmino acid\tPositions within proteins\tGene names\tLocalization prob\tReporter intensity 1\n\
P38398\tS\t1524;1530\tBRCA1\t0.99\t5\n\
P04637\tT\t18\tTP53\t0.5\t6\n",
    );
    let key = SampleKeyOptions::default()
        .build(SourceFormat::MaxQuant)
        .unwrap();
    let (table, report) = load_dataset(&path, Flavor::Labeled, Some("P"), &key).unwrap();
    assert_eq!(table.n_rows(), 1);
    assert_eq!(table.rows[0].raw_id, "BRCA1:S1524");
    assert_eq!(report.rows_filtered, 1);
}
