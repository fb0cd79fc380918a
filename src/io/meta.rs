use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::dataset::SourceFormat;
use crate::io::StagedWrites;

// Field set and wording are consumed verbatim by cbioportalImporter.
const CDAP_META: &str = "cancer_study_identifier: {cancer_id}
genetic_alteration_type: PROTEIN_LEVEL
datatype: Z-SCORE
stable_id: ms_abundance
profile_description: Protein levels (mass spectrometry)
show_profile_in_analysis_tab: true
profile_name: Protein levels (mass spectrometry)
data_filename: {data_filename}";

const MAXQUANT_META: &str = "cancer_study_identifier: {cancer_id}
genetic_alteration_type: PROTEIN_LEVEL
datatype: Z-SCORE
stable_id: protein_quantification
profile_description: Protein Quantification (Mass Spec)
show_profile_in_analysis_tab: true
profile_name: Protein levels (mass spectrometry by CPTAC)
data_filename: {data_filename}";

pub fn meta_text(
    cancer_id: &str,
    data_file: &Path,
    format: SourceFormat,
    reference_genome: Option<&str>,
) -> String {
    let template = match format {
        SourceFormat::Cdap => CDAP_META,
        SourceFormat::MaxQuant => MAXQUANT_META,
    };
    let data_filename = data_file
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut text = template
        .replace("{cancer_id}", cancer_id)
        .replace("{data_filename}", &data_filename);
    if let Some(genome) = reference_genome {
        text.push_str("\nreference_genome: ");
        text.push_str(genome);
    }
    text
}

pub fn write_meta(out: &mut StagedWrites, path: &Path, text: &str) -> Result<()> {
    out.stage(path, |w| {
        w.write_all(text.as_bytes())?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdap_meta_is_exact() {
        let text = meta_text(
            "brca_tcga_pub",
            Path::new("/out/data/data_protein.txt"),
            SourceFormat::Cdap,
            None,
        );
        assert!(text.starts_with("cancer_study_identifier: brca_tcga_pub\n"));
        assert!(text.ends_with("data_filename: data_protein.txt"));
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn reference_genome_is_appended() {
        let text = meta_text("x", Path::new("a.txt"), SourceFormat::MaxQuant, Some("hg19"));
        assert!(text.contains("stable_id: protein_quantification"));
        assert!(text.ends_with("\nreference_genome: hg19"));
    }
}
