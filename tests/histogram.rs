use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

use cptac_portal::histogram::{HistogramConfig, run_histogram};

const TABLE: &str = "Composite.Element.REF\tHugo_Symbol\tEntrez_Gene_Id\tTCGA-AB-1234-01\tTCGA-CD-5678-01\tnot_a_sample\n\
BRCA1|BRCA1\tBRCA1\t672\t0.5\t1.5\t9\n\
TP53|TP53\tTP53\t7157\t-2\t2.5\t9\n\
ERBB2|ERBB2\tERBB2\t2064\t4\t\t9\n\
EGFR|EGFR\tEGFR\t1956\t1.1\t0\t9\n";

fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let table = dir.path().join("data_proteomics.txt");
    fs::write(&table, TABLE).unwrap();
    (dir, table)
}

fn png_size(path: &Path) -> (u32, u32) {
    let decoder = png::Decoder::new(BufReader::new(fs::File::open(path).unwrap()));
    let reader = decoder.read_info().unwrap();
    let info = reader.info();
    (info.width, info.height)
}

#[test]
fn positive_values_per_sample_are_plotted() {
    let (dir, table) = fixture();
    let output = dir.path().join("plots").join("dist.png");
    let mut cfg = HistogramConfig::new(table, "Breast Proteome");
    cfg.output = Some(output.clone());
    let summary = run_histogram(&cfg).unwrap();

    assert_eq!(summary.samples, 2);
    // 0.5, 1.1 and 1.5, 2.5; the 4 is above the default range.
    assert_eq!(summary.values, 4);
    assert_eq!(summary.clipped, 1);
    assert_eq!(summary.empty_samples, 0);
    assert_eq!(summary.output, output);
    assert_eq!(
        png_size(&output),
        (summary.width as u32, summary.height as u32)
    );
}

#[test]
fn wider_range_keeps_every_value() {
    let (dir, table) = fixture();
    let mut cfg = HistogramConfig::new(table, "x");
    cfg.output = Some(dir.path().join("wide.png"));
    cfg.x_max = 5.0;
    cfg.bins = 10;
    let summary = run_histogram(&cfg).unwrap();
    assert_eq!(summary.values, 5);
    assert_eq!(summary.clipped, 0);
}

#[test]
fn invalid_settings_write_nothing() {
    let (dir, table) = fixture();
    let output = dir.path().join("bad.png");
    let mut cfg = HistogramConfig::new(table.clone(), "x");
    cfg.output = Some(output.clone());
    cfg.bins = 0;
    assert!(run_histogram(&cfg).is_err());
    cfg.bins = 10;
    cfg.x_max = -1.0;
    assert!(run_histogram(&cfg).is_err());
    cfg.x_max = 3.0;
    cfg.sample_regex = Some("BRCA[0-9]+".to_string());
    let err = run_histogram(&cfg).unwrap_err();
    assert!(err.to_string().contains("no column matches"));
    assert!(!output.exists());
}

#[test]
fn histogram_command_names_output_after_title() {
    let (dir, table) = fixture();
    let mut cmd = Command::cargo_bin("cptac-portal").unwrap();
    cmd.current_dir(dir.path())
        .arg("histogram")
        .arg("-i")
        .arg(&table)
        .args(["-t", "Ovarian Proteome", "--bins", "20"]);
    cmd.assert().success();
    assert!(dir.path().join("OvarianProteome.png").is_file());
}
