mod parser;

use std::collections::HashMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::annotation::AnnotationRecord;
use crate::io::{open_maybe_gz, tsv_writer};

pub use parser::parse_gpff;

#[derive(Debug, Clone, Default)]
pub struct RefseqBuild {
    pub files: Vec<PathBuf>,
    pub records: Vec<AnnotationRecord>,
    pub parsed: usize,
    pub duplicates: usize,
}

/// `*.gpff` and `*.gpff.gz` files in `folder`, sorted by path.
pub fn discover_gpff(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("failed to list RefSeq folder {}", folder.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if path.is_file() && (name.ends_with(".gpff") || name.ends_with(".gpff.gz")) {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        bail!("no .gpff files found in {}", folder.display());
    }
    Ok(files)
}

/// Parses every GenPept file in `folder` into one record per accession.
/// A repeated accession replaces the earlier record in place (last wins).
pub fn build_annotation(folder: &Path) -> Result<RefseqBuild> {
    let files = discover_gpff(folder)?;
    let mut build = RefseqBuild::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in &files {
        let reader = BufReader::new(open_maybe_gz(path)?);
        let parsed = parse_gpff(reader, &path.display().to_string())?;
        info!(file = %path.display(), records = parsed.len(), "refseq_file_parsed");
        build.parsed += parsed.len();
        for rec in parsed {
            match index.get(&rec.protein) {
                Some(&i) => {
                    build.duplicates += 1;
                    build.records[i] = rec;
                }
                None => {
                    index.insert(rec.protein.clone(), build.records.len());
                    build.records.push(rec);
                }
            }
        }
    }

    if build.duplicates > 0 {
        warn!(
            duplicates = build.duplicates,
            "repeated protein accessions replaced by their last record"
        );
    }
    build.files = files;
    Ok(build)
}

pub fn run_refseq(folder: &Path, output: &Path) -> Result<RefseqBuild> {
    let build = build_annotation(folder)?;
    if build.records.is_empty() {
        bail!("no RefSeq records parsed from {}", folder.display());
    }
    tsv_writer::write_annotation_tsv(output, &build.records)?;
    info!(
        output = %output.display(),
        records = build.records.len(),
        "annotation_table_written"
    );
    Ok(build)
}
