use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::dataset::SampleKey;
use crate::io::tsv_reader;

pub type Rgb = [u8; 3];

pub const UNMAPPED_COLOR: Rgb = [0xD9, 0xD9, 0xD9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtype {
    Basal,
    Her2,
    LumA,
    LumB,
}

impl Subtype {
    pub const ALL: [Subtype; 4] = [Subtype::Basal, Subtype::Her2, Subtype::LumA, Subtype::LumB];

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Basal" => Some(Subtype::Basal),
            "Her2" => Some(Subtype::Her2),
            "LumA" => Some(Subtype::LumA),
            "LumB" => Some(Subtype::LumB),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Subtype::Basal => "Basal",
            Subtype::Her2 => "Her2",
            Subtype::LumA => "LumA",
            Subtype::LumB => "LumB",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Subtype::Basal => [0xE4, 0x1A, 0x1C],
            Subtype::Her2 => [0xFF, 0x7F, 0x00],
            Subtype::LumA => [0x37, 0x7E, 0xB8],
            Subtype::LumB => [0x4D, 0xAF, 0x4A],
        }
    }
}

/// Exact sample key -> PAM50 label; unknown labels are stored as `None`.
#[derive(Debug, Clone, Default)]
pub struct SubtypeMap {
    labels: HashMap<String, Option<Subtype>>,
}

impl SubtypeMap {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let labels = pairs
            .into_iter()
            .map(|(s, l)| (s.as_ref().trim().to_string(), Subtype::parse(l.as_ref())))
            .collect();
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn subtype(&self, sample: &str) -> Option<Subtype> {
        self.labels.get(sample).copied().flatten()
    }

    pub fn color(&self, sample: &str) -> Rgb {
        self.subtype(sample).map_or(UNMAPPED_COLOR, Subtype::color)
    }
}

/// Sample ids are canonicalized with `key`; ids it rejects are kept verbatim.
pub fn load_subtypes(path: &Path, key: &SampleKey) -> Result<SubtypeMap> {
    let source = path.display().to_string();
    let mut reader =
        tsv_reader(path).with_context(|| format!("failed to read subtype table {}", source))?;
    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (Some(sample_col), Some(label_col)) = (find("Sample"), find("PAM50")) else {
        bail!("{}: subtype table needs 'Sample' and 'PAM50' columns", source);
    };

    let mut pairs = Vec::new();
    for result in reader.records() {
        let record = result?;
        let sample = record.get(sample_col).unwrap_or("").trim();
        let label = record.get(label_col).unwrap_or("").to_string();
        if sample.is_empty() {
            continue;
        }
        let sample = key.canonical(sample).unwrap_or_else(|| sample.to_string());
        pairs.push((sample, label));
    }
    let map = SubtypeMap::from_pairs(pairs);
    info!(file = %source, samples = map.len(), "subtypes_loaded");
    Ok(map)
}
