use anyhow::{Result, bail};

/// `s123t125` -> `S123_T125`: uppercased, with `_` before every run of
/// letters except a leading one.
pub fn format_site(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_alpha = false;
    for ch in raw.chars() {
        let alpha = ch.is_ascii_alphabetic();
        if alpha && !prev_alpha && !out.is_empty() {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
        prev_alpha = alpha;
    }
    Some(out)
}

pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        bail!("PTM prefix must not be empty");
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        bail!("PTM prefix '{}' must be ASCII alphanumeric", prefix);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_site() {
        assert_eq!(format_site("s123t125").as_deref(), Some("S123_T125"));
        assert_eq!(format_site("y7").as_deref(), Some("Y7"));
        assert_eq!(format_site("S12").as_deref(), Some("S12"));
        assert_eq!(format_site(""), None);
    }

    #[test]
    fn prefix_rules() {
        assert!(validate_prefix("p").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("p|").is_err());
    }
}
