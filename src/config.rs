//! Runtime settings and cleaning rules.

use std::path::PathBuf;

use config::Config;
use serde::Deserialize;

/// Directory and database locations. Every field can be overridden through
/// the environment with a `JOBS_` prefix, e.g. `JOBS_RAW_DIR=/tmp/raw` or
/// `JOBS_DB_PATH=/tmp/jobs.sqlite`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the scraper drops raw batch CSVs.
    pub raw_dir: PathBuf,
    /// Staging area for processed CSVs awaiting load.
    pub processed_dir: PathBuf,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Optional skill taxonomy file replacing the embedded one.
    pub skills_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            db_path: PathBuf::from("data/jobs.sqlite"),
            skills_file: None,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let cfg = Config::builder()
            .add_source(config::Environment::with_prefix("JOBS"))
            .build()
            .unwrap_or_default();
        cfg.try_deserialize().unwrap_or_default()
    }
}

/// Heuristic constants for the field cleaners. Calibrated against the
/// current listing-site formatting; when the site changes phrasing, this is
/// the place to adjust.
#[derive(Debug, Clone)]
pub struct CleanRules {
    /// Vendor prefix stripped from job identifiers.
    pub id_prefix: String,
    /// Work-arrangement boilerplate removed from locations, in order.
    pub location_boilerplate: Vec<String>,
    /// Pay bounds below this value classify the whole pair as hourly.
    /// Annual salaries come in round thousands, hourly rates in two or
    /// three digits.
    pub hourly_threshold: f64,
    /// Vendor employment-type labels folded onto the canonical buckets.
    pub type_synonyms: Vec<(String, String)>,
}

impl Default for CleanRules {
    fn default() -> Self {
        CleanRules {
            id_prefix: "job_".to_string(),
            location_boilerplate: vec![
                "Hybrid work in".to_string(),
                "Remote in".to_string(),
            ],
            hourly_threshold: 1000.0,
            type_synonyms: vec![
                ("Temporary".to_string(), "Part-time".to_string()),
                ("Permanent".to_string(), "Full-time".to_string()),
            ],
        }
    }
}
