//! Per-field cleaners for identifiers, locations and employment types.
//!
//! Everything here is total: malformed input degrades to an empty string or
//! `None`, never an error. Batch-level problems are caught upstream.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::CleanRules;

/// Strip the vendor prefix from a job identifier. Identifiers without the
/// prefix pass through untouched.
pub fn clean_job_id(raw: &str, rules: &CleanRules) -> String {
    raw.strip_prefix(&rules.id_prefix).unwrap_or(raw).to_string()
}

/// Clean a location string. Order matters: boilerplate first, then a
/// trailing 5-digit postal token, then a trailing parenthetical, each step
/// exposing the next pattern at the end of the string.
pub fn clean_location(raw: &str, rules: &CleanRules) -> String {
    static ZIP_RE: OnceLock<Regex> = OnceLock::new();
    static PAREN_RE: OnceLock<Regex> = OnceLock::new();
    let zip_re = ZIP_RE.get_or_init(|| Regex::new(r"\b\d{5}\s*$").unwrap());
    let paren_re = PAREN_RE.get_or_init(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap());

    let mut loc = raw.to_string();
    for phrase in &rules.location_boilerplate {
        loc = loc.replace(phrase.as_str(), "");
    }
    let loc = zip_re.replace(loc.trim(), "");
    let loc = paren_re.replace(loc.trim(), "");
    loc.trim().to_string()
}

/// Canonicalize an employment-type label: drop standalone hyphens, keep the
/// first whitespace-delimited token, strip one trailing comma, then fold
/// vendor synonyms onto the canonical buckets. Unknown labels pass through.
pub fn clean_employment_type(raw: Option<&str>, rules: &CleanRules) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let unhyphenated = drop_isolated_hyphens(raw);
    let token = unhyphenated.split_whitespace().next()?;
    let token = token.strip_suffix(',').unwrap_or(token);
    if token.is_empty() {
        return None;
    }

    let mapped = rules
        .type_synonyms
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(token))
        .map(|(_, to)| to.as_str())
        .unwrap_or(token);
    Some(mapped.to_string())
}

/// Remove hyphens that have no word character on either side, so the list
/// separator in "Full-time - Monday to Friday" goes away while the hyphen
/// in "Part-time" stays.
fn drop_isolated_hyphens(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            let word_before = i > 0 && is_word(chars[i - 1]);
            let word_after = i + 1 < chars.len() && is_word(chars[i + 1]);
            if !word_before && !word_after {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
