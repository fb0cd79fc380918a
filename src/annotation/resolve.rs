use anyhow::{Result, bail};
use tracing::info;

use crate::annotation::site::format_site;
use crate::annotation::{AnnotationTable, strip_version};
use crate::dataset::QuantTable;

const MISS_EXAMPLES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub composite: String,
    /// Empty when the identifier had no annotation match.
    pub hugo: String,
    pub entrez: String,
    pub ptm: bool,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub samples: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

#[derive(Debug, Clone, Default)]
pub struct ResolveStats {
    pub matched: usize,
    pub unmatched: usize,
    pub unmatched_examples: Vec<String>,
}

/// Attaches gene symbols to every row. Unmatched rows are retained with an
/// empty symbol; the lookup accession stands in for the symbol inside the
/// composite id so rows stay distinguishable.
pub fn resolve_table(
    table: QuantTable,
    annotation: &AnnotationTable,
) -> Result<(NormalizedTable, ResolveStats)> {
    let mut stats = ResolveStats::default();
    let mut rows = Vec::with_capacity(table.n_rows());

    for (key, values) in table.rows.into_iter().zip(table.values) {
        let (lookup_id, site) = match &key.ptm_prefix {
            Some(_) => match key.raw_id.split_once(':') {
                Some((acc, site)) => (acc, Some(site)),
                None => bail!("PTM identifier '{}' has no site", key.raw_id),
            },
            None => (key.raw_id.as_str(), None),
        };

        let hit = annotation.lookup(lookup_id).filter(|r| !r.gene.is_empty());
        let (label, hugo, entrez) = match hit {
            Some(rec) => {
                stats.matched += 1;
                (rec.gene.clone(), rec.gene.clone(), rec.entrez.clone())
            }
            None => {
                stats.unmatched += 1;
                if stats.unmatched_examples.len() < MISS_EXAMPLES {
                    stats.unmatched_examples.push(key.raw_id.clone());
                }
                (strip_version(lookup_id).to_string(), String::new(), String::new())
            }
        };

        let composite = match (&key.ptm_prefix, site) {
            (Some(prefix), Some(site)) => {
                let Some(site) = format_site(site) else {
                    bail!("PTM identifier '{}' has an empty site", key.raw_id);
                };
                format!("{0}|{0}_{1}{2}", label, prefix, site)
            }
            _ => format!("{0}|{0}", label),
        };

        rows.push(NormalizedRow {
            composite,
            hugo,
            entrez,
            ptm: key.ptm_prefix.is_some(),
            values,
        });
    }

    info!(
        matched = stats.matched,
        unmatched = stats.unmatched,
        "annotation_joined"
    );
    Ok((
        NormalizedTable {
            samples: table.samples,
            rows,
        },
        stats,
    ))
}
