use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use assert_cmd::Command;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use cptac_portal::refseq::{build_annotation, parse_gpff, run_refseq};

fn gpff_record(version: &str, mrna: &str, gene: &str, gene_id: &str, definition: &str) -> String {
    let acc = version.split('.').next().unwrap();
    let lines = [
        format!("LOCUS       {}               1474 aa            linear   PRI 27-MAR-2016", acc),
        format!("DEFINITION  {} [Homo", definition),
        "            sapiens].".to_string(),
        format!("ACCESSION   {}", acc),
        format!("VERSION     {}", version),
        format!("DBSOURCE    REFSEQ: accession {}", mrna),
        "FEATURES             Location/Qualifiers".to_string(),
        "     Protein         1..1474".to_string(),
        format!("                     /product=\"{}\"", definition),
        "     CDS             1..1474".to_string(),
        format!("                     /gene=\"{}\"", gene),
        format!("                     /db_xref=\"GeneID:{}\"", gene_id),
        "//".to_string(),
    ];
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

const HEADER: &str = "Protein\tmRNA\tGene\tEntrez\tDescription";

#[test]
fn parses_core_fields() {
    let text = gpff_record(
        "NP_000005.3",
        "NM_000014.6",
        "A2M",
        "2",
        "alpha-2-macroglobulin isoform a precursor",
    );
    let records = parse_gpff(Cursor::new(text), "mem").unwrap();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.protein, "NP_000005");
    assert_eq!(r.mrna, "NM_000014");
    assert_eq!(r.gene, "A2M");
    assert_eq!(r.entrez, "2");
    assert_eq!(r.description, "alpha-2-macroglobulin isoform a precursor");
}

#[test]
fn record_without_version_is_fatal() {
    let text = "LOCUS       NP_1\nDEFINITION  thing.\n//\n";
    let err = parse_gpff(Cursor::new(text), "mem").unwrap_err();
    assert!(format!("{:#}", err).contains("VERSION"));
}

#[test]
fn unterminated_record_is_fatal() {
    let mut text = gpff_record("NP_000005.3", "NM_000014.6", "A2M", "2", "a");
    text.push_str("LOCUS       NP_000006\nVERSION     NP_000006.1\n");
    assert!(parse_gpff(Cursor::new(text), "mem").is_err());
}

#[test]
fn unquoted_gene_is_fatal() {
    let text = gpff_record("NP_000005.3", "NM_000014.6", "A2M", "2", "a").replace("\"A2M\"", "A2M");
    assert!(parse_gpff(Cursor::new(text), "mem").is_err());
}

#[test]
fn duplicate_accession_last_record_wins() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.gpff"),
        gpff_record("NP_000005.2", "NM_000014.5", "OLD", "2", "old")
            + &gpff_record("NP_000007.1", "NM_000016.1", "ACADM", "34", "acyl"),
    )
    .unwrap();
    fs::write(
        dir.path().join("b.gpff"),
        gpff_record("NP_000005.3", "NM_000014.6", "A2M", "2", "new"),
    )
    .unwrap();

    let build = build_annotation(dir.path()).unwrap();
    assert_eq!(build.parsed, 3);
    assert_eq!(build.duplicates, 1);
    let proteins: Vec<_> = build.records.iter().map(|r| r.protein.as_str()).collect();
    assert_eq!(proteins, vec!["NP_000005", "NP_000007"]);
    assert_eq!(build.records[0].gene, "A2M");
    assert_eq!(build.records[0].description, "new");
}

#[test]
fn reads_gzipped_files() {
    let dir = TempDir::new().unwrap();
    let text = gpff_record("NP_000005.3", "NM_000014.6", "A2M", "2", "a");
    let file = fs::File::create(dir.path().join("human.1.protein.gpff.gz")).unwrap();
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();

    let out = dir.path().join("out").join("annotation.tsv");
    let build = run_refseq(dir.path(), &out).unwrap();
    assert_eq!(build.records.len(), 1);
    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written, format!("{}\nNP_000005\tNM_000014\tA2M\t2\ta\n", HEADER));
}

#[test]
fn empty_folder_is_fatal() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("annotation.tsv");
    assert!(run_refseq(dir.path(), &out).is_err());
    assert!(!out.exists());
}

fn write_folder(dir: &Path) {
    fs::write(
        dir.join("human.gpff"),
        gpff_record("NP_000005.3", "NM_000014.6", "A2M", "2", "alpha"),
    )
    .unwrap();
}

#[test]
fn refseq_command_writes_table() {
    let dir = TempDir::new().unwrap();
    write_folder(dir.path());
    let out = dir.path().join("annotation.tsv");

    let mut cmd = Command::cargo_bin("cptac-portal").unwrap();
    cmd.arg("refseq")
        .arg("--refseq-folder")
        .arg(dir.path())
        .arg("--output-file")
        .arg(&out);
    cmd.assert().success();

    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(HEADER));
    assert_eq!(lines.next(), Some("NP_000005\tNM_000014\tA2M\t2\talpha"));
    assert_eq!(lines.next(), None);
}
