use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::json;
use tempfile::TempDir;

use cptac_portal::driver::{Workspace, load_plan, run_plan};

const GPFF: &str = "LOCUS       NP_000001               100 aa            linear   PRI 01-JAN-2016\n\
DEFINITION  breast cancer type 1 susceptibility protein [Homo sapiens].\n\
VERSION     NP_000001.1\n\
DBSOURCE    REFSEQ: accession NM_000001.1\n\
FEATURES             Location/Qualifiers\n\
//\n";

fn write_inputs(base: &Path) {
    fs::create_dir_all(base.join("refseq")).unwrap();
    fs::create_dir_all(base.join("cdap")).unwrap();
    let gpff = GPFF.replace(
        "FEATURES             Location/Qualifiers\n",
        "FEATURES             Location/Qualifiers\n                     /gene=\"BRCA1\"\n                     /db_xref=\"GeneID:672\"\n",
    );
    fs::write(base.join("refseq").join("human.gpff"), gpff).unwrap();
    fs::write(
        base.join("cdap").join("proteome.tsv"),
        "Gene\tAB-1234-01A Log Ratio\tCD-5678-01A Log Ratio\tEF-9012-01A Log Ratio\n\
NP_000001.1\t1\t2\t0\n\
NP_000003.1\t3\t4\t1\n",
    )
    .unwrap();
    fs::write(
        base.join("subtypes.tsv"),
        "Sample\tPAM50\nTCGA-AB-1234-01\tHer2\nTCGA-CD-5678-01\tLumB\n",
    )
    .unwrap();
}

fn plan() -> serde_json::Value {
    json!({
        "refseq": { "folder": "refseq", "output": "work/annotation.tsv" },
        "cohorts": [{
            "cancer_id": "brca_cptac_2016",
            "proteome_files": ["cdap/proteome.tsv"],
            "proteome_pipeline": "itraq",
            "output_file": "portal/data_proteomics.txt",
            "meta_file": "portal/meta_proteomics.txt",
            "report": "portal/report.json",
            "heatmap": { "subtypes": "subtypes.tsv", "output": "portal/heatmap.png" }
        }]
    })
}

#[test]
fn plan_runs_all_steps_in_order() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let plan_path = dir.path().join("plan.json");
    fs::write(&plan_path, plan().to_string()).unwrap();

    let plan = load_plan(&plan_path).unwrap();
    let outcome = run_plan(&plan, &Workspace::new(dir.path().to_path_buf())).unwrap();
    assert_eq!(outcome.refseq.as_ref().unwrap().records.len(), 1);
    assert_eq!(outcome.cohorts.len(), 1);
    assert_eq!(outcome.cohorts[0].heatmap.as_ref().unwrap().samples, 3);

    let data = fs::read_to_string(dir.path().join("portal/data_proteomics.txt")).unwrap();
    assert!(data.contains("BRCA1|BRCA1\tBRCA1\t672\t1\t2\t0\n"));
    assert!(data.contains("NP_000003|NP_000003\t\t\t3\t4\t1\n"));
    assert!(dir.path().join("portal/heatmap.png").is_file());
    assert!(dir.path().join("work/annotation.tsv").is_file());
}

#[test]
fn unknown_plan_fields_are_rejected() {
    let dir = TempDir::new().unwrap();
    let plan_path = dir.path().join("plan.json");
    fs::write(&plan_path, r#"{"cohorts": [], "threads": 4}"#).unwrap();
    assert!(load_plan(&plan_path).is_err());
}

#[test]
fn failing_cohort_stops_the_run() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let mut plan = plan();
    let second = plan["cohorts"][0].clone();
    plan["cohorts"][0]["proteome_files"] = json!(["cdap/missing.tsv"]);
    plan["cohorts"][0]["output_file"] = json!("portal/first.txt");
    plan["cohorts"].as_array_mut().unwrap().push(second);
    let plan_path = dir.path().join("plan.json");
    fs::write(&plan_path, plan.to_string()).unwrap();

    let plan = load_plan(&plan_path).unwrap();
    assert!(run_plan(&plan, &Workspace::new(dir.path().to_path_buf())).is_err());
    assert!(!dir.path().join("portal/first.txt").exists());
    assert!(!dir.path().join("portal/data_proteomics.txt").exists());
}

#[test]
fn run_command_resolves_paths_from_env_base_dir() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::write(dir.path().join("plan.json"), plan().to_string()).unwrap();

    let mut cmd = Command::cargo_bin("cptac-portal").unwrap();
    cmd.env("CPTAC_PORTAL_HOME", dir.path())
        .args(["run", "--plan", "plan.json"]);
    cmd.assert().success();
    assert!(dir.path().join("portal/report.json").is_file());
    assert!(dir.path().join("portal/heatmap.png").is_file());
}

fn maxquant_plan(heatmap: serde_json::Value) -> serde_json::Value {
    json!({
        "cohorts": [{
            "cancer_id": "brca_maxquant",
            "proteome_files": ["maxquant/proteinGroups.txt"],
            "proteome_pipeline": "unlabeled",
            "annotation": "annotation.tsv",
            "output_file": "portal/data_protein_quantification.txt",
            "meta_file": "portal/meta_protein_quantification.txt",
            "heatmap": heatmap
        }]
    })
}

fn write_maxquant_inputs(base: &Path) {
    fs::create_dir_all(base.join("maxquant")).unwrap();
    fs::write(
        base.join("annotation.tsv"),
        "Protein\tmRNA\tGene\tEntrez\tDescription\nNP_000001\tNM_000001\tBRCA1\t672\tbrca1\n",
    )
    .unwrap();
    fs::write(
        base.join("maxquant").join("proteinGroups.txt"),
        "Protein IDs\tGene names\tQ-value\tIntensity BRCA01\tIntensity BRCA02\tIntensity BRCA03\n\
P38398\tBRCA1\t0.001\t100\t200\t50\n\
P04637\tTP53\t0.001\t10\t\t30\n\
P00533\tEGFR\t0.001\t7\t70\t700\n",
    )
    .unwrap();
    fs::write(
        base.join("subtypes.tsv"),
        "Sample\tPAM50\nBRCA01\tBasal\nBRCA03\tLumA\n",
    )
    .unwrap();
}

#[test]
fn heatmap_step_takes_cohort_sample_pattern() {
    let dir = TempDir::new().unwrap();
    write_maxquant_inputs(dir.path());
    let ws = Workspace::new(dir.path().to_path_buf());
    let plan_path = dir.path().join("plan.json");

    let default_key = maxquant_plan(json!({ "subtypes": "subtypes.tsv", "output": "portal/default.png" }));
    fs::write(&plan_path, default_key.to_string()).unwrap();
    let err = run_plan(&load_plan(&plan_path).unwrap(), &ws)
        .err()
        .expect("barcode key cannot match MaxQuant samples");
    assert!(format!("{:#}", err).contains("no column matches sample pattern"));
    assert!(!dir.path().join("portal/default.png").exists());

    let custom = maxquant_plan(json!({
        "subtypes": "subtypes.tsv",
        "output": "portal/heatmap.png",
        "sample_regex": "BRCA[0-9]+",
        "sample_prefix": "",
        "fill": "blank",
        "cell_width": 5,
        "cell_height": 7
    }));
    fs::write(&plan_path, custom.to_string()).unwrap();
    let outcome = run_plan(&load_plan(&plan_path).unwrap(), &ws).unwrap();
    let summary = outcome.cohorts[0].heatmap.as_ref().unwrap();
    assert_eq!(summary.samples, 3);
    assert_eq!(summary.mapped_samples, 2);
    assert_eq!(summary.rows, 3);
    assert!(dir.path().join("portal/heatmap.png").is_file());
}

#[test]
fn heatmap_step_rejects_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let plan_path = dir.path().join("plan.json");
    let plan = maxquant_plan(json!({ "subtypes": "s.tsv", "output": "h.png", "colour": "red" }));
    fs::write(&plan_path, plan.to_string()).unwrap();
    assert!(load_plan(&plan_path).is_err());
}
