use std::io::BufRead;

use anyhow::{Context, Result, bail};

use crate::annotation::{AnnotationRecord, strip_version};

/// Parses GenPept (`.gpff`) flat-file records terminated by `//` lines.
///
/// Fails on the first malformed record: a record without `VERSION`, a
/// `/gene=` qualifier without a quoted value, or text after the last `//`.
pub fn parse_gpff<R: BufRead>(reader: R, source: &str) -> Result<Vec<AnnotationRecord>> {
    let mut records = Vec::new();
    let mut block = RecordBuilder::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("{}:{} unreadable line", source, line_no))?;
        if line.trim() == "//" {
            if let Some(rec) = block.finish(source)? {
                records.push(rec);
            }
            block = RecordBuilder::default();
            continue;
        }
        block
            .push(&line, line_no)
            .with_context(|| format!("{}:{} malformed record", source, line_no))?;
    }

    if block.has_content {
        bail!(
            "{}:{} record is not terminated by '//'",
            source,
            block.start_line
        );
    }
    Ok(records)
}

#[derive(Default)]
struct RecordBuilder {
    start_line: usize,
    has_content: bool,
    in_definition: bool,
    protein: Option<String>,
    mrna: Option<String>,
    gene: Option<String>,
    entrez: Option<String>,
    definition: String,
}

impl RecordBuilder {
    fn push(&mut self, line: &str, line_no: usize) -> Result<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if !self.has_content {
            self.has_content = true;
            self.start_line = line_no;
        }

        // Continuation lines of a header keyword are indented.
        if self.in_definition && line.starts_with(' ') {
            self.definition.push(' ');
            self.definition.push_str(trimmed);
            return Ok(());
        }
        self.in_definition = false;

        if let Some(rest) = line.strip_prefix("DEFINITION") {
            self.definition = rest.trim().to_string();
            self.in_definition = true;
        } else if line.starts_with("VERSION") {
            let acc = trimmed
                .split_whitespace()
                .nth(1)
                .context("VERSION line without accession")?;
            self.protein = Some(strip_version(acc).to_string());
        } else if line.starts_with("DBSOURCE") {
            if let Some(acc) = trimmed.split_whitespace().last() {
                self.mrna = Some(strip_version(acc).to_string());
            }
        } else if let Some(value) = trimmed.strip_prefix("/gene=") {
            let symbol = quoted(value).context("/gene qualifier without quoted value")?;
            if self.gene.is_none() {
                self.gene = Some(symbol.to_string());
            }
        } else if let Some(value) = trimmed.strip_prefix("/db_xref=\"GeneID:") {
            let id = value.trim_end_matches('"');
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                bail!("GeneID cross-reference '{}' is not numeric", id);
            }
            if self.entrez.is_none() {
                self.entrez = Some(id.to_string());
            }
        }
        Ok(())
    }

    fn finish(self, source: &str) -> Result<Option<AnnotationRecord>> {
        if !self.has_content {
            return Ok(None);
        }
        let Some(protein) = self.protein else {
            bail!(
                "{}:{} record has no VERSION accession",
                source,
                self.start_line
            );
        };
        Ok(Some(AnnotationRecord {
            protein,
            mrna: self.mrna.unwrap_or_default(),
            gene: self.gene.unwrap_or_default(),
            entrez: self.entrez.unwrap_or_default(),
            description: clean_definition(&self.definition),
        }))
    }
}

fn quoted(value: &str) -> Option<&str> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    if inner.is_empty() { None } else { Some(inner) }
}

/// Drops the trailing period and the `[Organism]` tag.
fn clean_definition(raw: &str) -> String {
    let mut text = raw.trim().trim_end_matches('.').trim_end();
    if text.ends_with(']') {
        if let Some(open) = text.rfind('[') {
            text = text[..open].trim_end();
        }
    }
    text.to_string()
}
