use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Cdap,
    MaxQuant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    Identity,
    Log2,
}

/// Acquisition pipeline of an upstream export. Each variant owns exactly one
/// [`ColumnRule`] in [`RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    Itraq = 0,
    PrecursorArea = 1,
    Unlabeled = 2,
    Labeled = 3,
}

#[derive(Debug)]
pub struct ColumnRule {
    pub flavor: Flavor,
    pub format: SourceFormat,
    pub prefix: &'static str,
    pub suffix: &'static str,
    pub transform: ValueTransform,
}

// Indexed by the `Flavor` discriminant.
static RULES: [ColumnRule; 4] = [
    ColumnRule {
        flavor: Flavor::Itraq,
        format: SourceFormat::Cdap,
        prefix: "",
        suffix: " Log Ratio",
        transform: ValueTransform::Identity,
    },
    ColumnRule {
        flavor: Flavor::PrecursorArea,
        format: SourceFormat::Cdap,
        prefix: "",
        suffix: " Area",
        transform: ValueTransform::Log2,
    },
    ColumnRule {
        flavor: Flavor::Unlabeled,
        format: SourceFormat::MaxQuant,
        prefix: "Intensity ",
        suffix: "",
        transform: ValueTransform::Identity,
    },
    ColumnRule {
        flavor: Flavor::Labeled,
        format: SourceFormat::MaxQuant,
        prefix: "Reporter intensity ",
        suffix: "",
        transform: ValueTransform::Identity,
    },
];

impl Flavor {
    pub fn rule(self) -> &'static ColumnRule {
        &RULES[self as usize]
    }

    pub fn format(self) -> SourceFormat {
        self.rule().format
    }

    pub fn name(self) -> &'static str {
        match self {
            Flavor::Itraq => "itraq",
            Flavor::PrecursorArea => "precursor_area",
            Flavor::Unlabeled => "unlabeled",
            Flavor::Labeled => "labeled",
        }
    }
}

impl ColumnRule {
    /// Part of a header between the rule's prefix and suffix, if the header
    /// carries both.
    pub fn sample_core<'a>(&self, column: &'a str) -> Option<&'a str> {
        let core = column
            .strip_prefix(self.prefix)?
            .strip_suffix(self.suffix)?;
        if core.is_empty() { None } else { Some(core) }
    }

    /// Applies the flavor transform; non-finite results become missing.
    pub fn apply(&self, value: f64) -> Option<f64> {
        let out = match self.transform {
            ValueTransform::Identity => value,
            ValueTransform::Log2 => value.log2(),
        };
        if out.is_finite() { Some(out) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_indexed_by_flavor() {
        for flavor in [
            Flavor::Itraq,
            Flavor::PrecursorArea,
            Flavor::Unlabeled,
            Flavor::Labeled,
        ] {
            assert_eq!(flavor.rule().flavor, flavor);
        }
    }

    #[test]
    fn log2_of_zero_area_is_missing() {
        let rule = Flavor::PrecursorArea.rule();
        assert_eq!(rule.apply(0.0), None);
        assert_eq!(rule.apply(8.0), Some(3.0));
    }
}
