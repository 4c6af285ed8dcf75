use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for language code handling
///
/// Translation services take ISO 639-1 codes, optionally with a region or
/// script variant (`EN-US`, `PT-BR`, `ZH-HANS`). ISO 639-2 codes are
/// accepted as well.
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Language part of a code, lowercased: `PT-BR` -> `pt`
pub fn base_code(code: &str) -> String {
    let code = code.trim();
    let base = code.split(['-', '_']).next().unwrap_or(code);
    base.to_lowercase()
}

/// Validate a language code, ignoring any region or script variant
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let base = base_code(code);

    match base.len() {
        2 if Language::from_639_1(&base).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&base).is_some() => Ok(LanguageCodeType::Part2T),
        3 if PART2B_TO_PART2T.iter().any(|(b, _)| *b == base) => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let base = base_code(code);

    match validate_language_code(&base)? {
        LanguageCodeType::Part1 => Language::from_639_1(&base)
            .map(|lang| lang.to_639_3().to_string())
            .ok_or_else(|| anyhow!("Cannot normalize language code: {}", code)),
        LanguageCodeType::Part2T => Ok(base),
        LanguageCodeType::Part2B => PART2B_TO_PART2T
            .iter()
            .find(|(b, _)| *b == base)
            .map(|(_, t)| t.to_string())
            .ok_or_else(|| anyhow!("Cannot normalize language code: {}", code)),
    }
}

/// Whether two codes name the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// English name of the language
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}
