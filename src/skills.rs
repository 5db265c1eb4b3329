//! Skill extraction against a configurable taxonomy.
//!
//! The taxonomy ships embedded as an ordered JSON array, skill name plus its
//! lowercase surface forms, so extraction order is stable run to run. Names
//! of a single letter ("R") never go through the substring scan, where the
//! letter would match inside every other word; they get a word-boundary
//! anchored pattern over the original-cased text instead.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::PipelineError;

const BUILTIN_SKILLS: &str = include_str!("../skills.json");

/// Phrases that name a single-letter language in prose ("R programming").
const LETTER_PHRASES: [&str; 3] = ["programming", "language", "studio"];

/// One taxonomy entry as it appears in the JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillEntry {
    pub skill: String,
    #[serde(default)]
    pub variations: Vec<String>,
}

#[derive(Debug)]
enum Matcher {
    /// Word-boundary anchored, case-insensitive. Single-letter names only.
    Anchored(Regex),
    /// Case-folded substring over any surface form.
    Variations(Vec<String>),
}

#[derive(Debug)]
struct CompiledSkill {
    name: String,
    matcher: Matcher,
}

#[derive(Debug)]
pub struct SkillTaxonomy {
    skills: Vec<CompiledSkill>,
}

impl SkillTaxonomy {
    /// The taxonomy embedded in the binary.
    pub fn builtin() -> Result<Self, PipelineError> {
        Self::from_json("embedded skills.json", BUILTIN_SKILLS)
    }

    /// Load a replacement taxonomy from disk. Validated up front so a bad
    /// file aborts the run before any record is touched.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| PipelineError::Taxonomy {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        Self::from_json(&origin, &text)
    }

    fn from_json(origin: &str, text: &str) -> Result<Self, PipelineError> {
        let entries: Vec<SkillEntry> =
            serde_json::from_str(text).map_err(|e| PipelineError::Taxonomy {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_entries(origin, entries)
    }

    /// Compile parsed entries. Tests build small taxonomies through here.
    pub fn from_entries(
        origin: &str,
        entries: Vec<SkillEntry>,
    ) -> Result<Self, PipelineError> {
        let fail = |reason: String| PipelineError::Taxonomy {
            path: origin.to_string(),
            reason,
        };

        if entries.is_empty() {
            return Err(fail("no skills defined".to_string()));
        }

        let mut skills = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = entry.skill.trim().to_string();
            if name.is_empty() {
                return Err(fail("entry with empty skill name".to_string()));
            }
            if skills.iter().any(|s: &CompiledSkill| s.name == name) {
                return Err(fail(format!("duplicate skill '{name}'")));
            }

            let matcher = if name.chars().count() == 1 {
                let re = Regex::new(&anchored_letter_pattern(&name))
                    .map_err(|e| fail(format!("skill '{name}': {e}")))?;
                Matcher::Anchored(re)
            } else {
                let forms: Vec<String> = entry
                    .variations
                    .iter()
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
                    .collect();
                if forms.is_empty() {
                    return Err(fail(format!("skill '{name}' has no variations")));
                }
                Matcher::Variations(forms)
            };
            skills.push(CompiledSkill { name, matcher });
        }
        Ok(SkillTaxonomy { skills })
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Canonical names whose surface forms appear in `description`. The
    /// anchored single-letter pass runs first, then the substring pass, each
    /// in taxonomy order, so output order is deterministic. No duplicates:
    /// names are unique and each skill matches through exactly one pass.
    pub fn extract(&self, description: &str) -> Vec<String> {
        let folded = description.to_lowercase();
        let mut found = Vec::new();

        for skill in &self.skills {
            if let Matcher::Anchored(re) = &skill.matcher {
                if re.is_match(description) {
                    found.push(skill.name.clone());
                }
            }
        }
        for skill in &self.skills {
            if let Matcher::Variations(forms) = &skill.matcher {
                if forms.iter().any(|form| folded.contains(form.as_str())) {
                    found.push(skill.name.clone());
                }
            }
        }
        found
    }
}

/// Pattern for a single-letter skill: the bare letter at a word boundary,
/// the letter before a comma, or the letter followed by one of the
/// `LETTER_PHRASES`. For "R" this compiles to
/// `(?i)\b(R\b|R,|R programming|R language|R studio)\b`.
fn anchored_letter_pattern(letter: &str) -> String {
    let l = regex::escape(letter);
    let phrases = LETTER_PHRASES
        .iter()
        .map(|p| format!("{l} {p}"))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?i)\b({l}\b|{l},|{phrases})\b")
}
