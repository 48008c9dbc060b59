use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for prompt labels
///
/// Clients send either an ISO 639 code ("en", "deu") or a free-form label
/// ("English", "中文"). Codes are expanded to their English names so the
/// prompt always reads naturally; anything else is passed through.
/// ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Label used when a client does not name the source language
pub const UNKNOWN_SOURCE_LABEL: &str = "foreign-language";

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        if let Some((_, part2t)) = PART2B_TO_PART2T
            .iter()
            .find(|(part2b, _)| *part2b == normalized_code)
        {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Human-readable label for a code or free-form language name
pub fn language_label(label: &str) -> String {
    let trimmed = label.trim();
    get_language_name(trimmed).unwrap_or_else(|_| trimmed.to_string())
}

/// Label for an optional source language
pub fn source_language_label(label: Option<&str>) -> String {
    match label.map(str::trim).filter(|l| !l.is_empty()) {
        Some(label) => language_label(label),
        None => UNKNOWN_SOURCE_LABEL.to_string(),
    }
}
