//! Batch normalization: read raw batches, merge, clean every record, write
//! the processed collection. The record cleaning itself is pure; file I/O
//! happens once on each side.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::debug;

use crate::config::CleanRules;
use crate::csv;
use crate::error::PipelineError;
use crate::fields;
use crate::records::{CleanRecord, RawRecord, CLEAN_COLUMNS, RAW_COLUMNS};
use crate::salary;
use crate::skills::SkillTaxonomy;

/// One raw batch, tagged with its file name for error reporting.
#[derive(Debug)]
pub struct RawBatch {
    pub file: String,
    pub records: Vec<RawRecord>,
}

/// Read every `.csv` batch under `dir`, sorted by file name. Directory
/// iteration order is platform noise; sorting keeps merge order, and with it
/// the output bytes, reproducible.
pub fn read_raw_dir(dir: &Path) -> Result<Vec<RawBatch>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read raw directory {}", dir.display()))?;
    let files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "csv").unwrap_or(false))
        .sorted()
        .collect();
    if files.is_empty() {
        return Err(PipelineError::NoBatches(dir.to_path_buf()).into());
    }

    let mut batches = Vec::with_capacity(files.len());
    for path in files {
        let file = file_label(&path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read batch {}", path.display()))?;
        let records = parse_batch(&file, &text)?;
        debug!(file = %file, rows = records.len(), "parsed raw batch");
        batches.push(RawBatch { file, records });
    }
    Ok(batches)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse one raw batch. The header must carry every `RAW_COLUMNS` name
/// (extra columns are ignored); rows shorter than the header pad out with
/// empty cells, rows longer than it are structural errors.
pub fn parse_batch(file: &str, text: &str) -> Result<Vec<RawRecord>> {
    let mut rows = csv::parse(text);
    if rows.is_empty() {
        return Err(PipelineError::EmptyBatch { file: file.to_string() }.into());
    }
    let header = rows.remove(0);

    let mut idx = [0usize; RAW_COLUMNS.len()];
    for (slot, column) in idx.iter_mut().zip(RAW_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            })?;
    }

    let mut records = Vec::with_capacity(rows.len());
    for (n, row) in rows.iter().enumerate() {
        if row.len() > header.len() {
            return Err(PipelineError::ExtraFields {
                file: file.to_string(),
                row: n + 2, // 1-based, counting the header line
                expected: header.len(),
                got: row.len(),
            }
            .into());
        }
        let cell = |i: usize| row.get(idx[i]).map(|s| s.as_str()).unwrap_or("");
        records.push(RawRecord {
            job_id: cell(0).to_string(),
            title: cell(1).to_string(),
            company: optional(cell(2)),
            location: optional(cell(3)),
            compensation_text: optional(cell(4)),
            employment_type_text: optional(cell(5)),
            description: cell(6).to_string(),
        });
    }
    Ok(records)
}

fn optional(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Concatenate batches in order. Duplicate job ids are kept; dedup belongs
/// to the load boundary's insert-if-absent.
pub fn merge(batches: Vec<RawBatch>) -> Result<Vec<RawRecord>> {
    let mut merged = Vec::new();
    for batch in batches {
        debug!(file = %batch.file, rows = batch.records.len(), "merging batch");
        merged.extend(batch.records);
    }
    if merged.is_empty() {
        return Err(PipelineError::EmptyCollection.into());
    }
    Ok(merged)
}

/// Clean one record. Pure and deterministic: the same record, rules and
/// taxonomy always produce the same output.
pub fn normalize_record(
    raw: &RawRecord,
    rules: &CleanRules,
    taxonomy: &SkillTaxonomy,
) -> CleanRecord {
    let pay = salary::split_pay(raw.compensation_text.as_deref(), rules);
    CleanRecord {
        job_id: fields::clean_job_id(&raw.job_id, rules),
        title: raw.title.clone(),
        company: raw.company.clone().unwrap_or_default(),
        location: raw
            .location
            .as_deref()
            .map(|l| fields::clean_location(l, rules))
            .unwrap_or_default(),
        salary_lower: pay.salary_lower,
        salary_avg: pay.salary_avg,
        salary_upper: pay.salary_upper,
        hourly_rate_lower: pay.hourly_lower,
        hourly_rate_avg: pay.hourly_avg,
        hourly_rate_upper: pay.hourly_upper,
        employment_type: fields::clean_employment_type(
            raw.employment_type_text.as_deref(),
            rules,
        ),
        required_skills: taxonomy.extract(&raw.description),
    }
}

/// Clean the whole collection, one output record per input record.
#[cfg(not(feature = "rayon"))]
pub fn normalize(
    records: &[RawRecord],
    rules: &CleanRules,
    taxonomy: &SkillTaxonomy,
) -> Vec<CleanRecord> {
    records
        .iter()
        .map(|r| normalize_record(r, rules, taxonomy))
        .collect()
}

/// Clean the whole collection in parallel. Records are independent and
/// `collect` keeps input order, so output is identical to the serial path.
#[cfg(feature = "rayon")]
pub fn normalize(
    records: &[RawRecord],
    rules: &CleanRules,
    taxonomy: &SkillTaxonomy,
) -> Vec<CleanRecord> {
    use rayon::prelude::*;
    records
        .par_iter()
        .map(|r| normalize_record(r, rules, taxonomy))
        .collect()
}

/// Serialize the cleaned collection with the processed header.
pub fn processed_to_string(records: &[CleanRecord]) -> String {
    let rows: Vec<Vec<String>> = records.iter().map(|r| r.to_row()).collect();
    csv::to_string(&CLEAN_COLUMNS, &rows)
}

pub fn write_processed(path: &Path, records: &[CleanRecord]) -> Result<()> {
    fs::write(path, processed_to_string(records))
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURES: &str = "tests/fixtures";

    fn taxonomy() -> SkillTaxonomy {
        SkillTaxonomy::builtin().unwrap()
    }

    fn fixture_records() -> Vec<RawRecord> {
        let batches = read_raw_dir(Path::new(FIXTURES)).unwrap();
        merge(batches).unwrap()
    }

    #[test]
    fn fixture_batches_merge_in_name_order() {
        let batches = read_raw_dir(Path::new(FIXTURES)).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].file, "raw_batch_1.csv");
        assert_eq!(batches[1].file, "raw_batch_2.csv");
    }

    #[test]
    fn merge_keeps_duplicates_and_cardinality() {
        let raws = fixture_records();
        assert_eq!(raws.len(), 5);

        let unique = raws.iter().map(|r| r.job_id.as_str()).unique().count();
        assert_eq!(unique, 4); // one listing appears in both batches

        let cleaned = normalize(&raws, &CleanRules::default(), &taxonomy());
        assert_eq!(cleaned.len(), raws.len());
    }

    #[test]
    fn fixture_records_clean_as_expected() {
        let cleaned = normalize(&fixture_records(), &CleanRules::default(), &taxonomy());

        let first = &cleaned[0];
        assert_eq!(first.job_id, "8a9f3c2b1d4e5f60");
        assert_eq!(first.location, "Austin, TX");
        assert_eq!(first.salary_lower, Some(90000.0));
        assert_eq!(first.salary_avg, Some(105000.0));
        assert_eq!(first.salary_upper, Some(120000.0));
        assert_eq!(first.employment_type.as_deref(), Some("Full-time"));
        assert!(first.required_skills.contains(&"Python".to_string()));
        assert!(first.required_skills.contains(&"Airflow".to_string()));

        let second = &cleaned[1];
        assert_eq!(second.company, "");
        assert_eq!(second.location, "New York, NY");
        assert_eq!(second.hourly_rate_lower, Some(25.0));
        assert_eq!(second.hourly_rate_avg, Some(30.0));
        assert_eq!(second.hourly_rate_upper, Some(35.0));
        assert_eq!(second.salary_lower, None);
        assert_eq!(second.employment_type.as_deref(), Some("Part-time"));
        assert!(second.required_skills.contains(&"R".to_string()));

        // quoted description with an embedded separator
        let third = &cleaned[2];
        assert_eq!(third.location, "Chicago, IL 60601");
        assert!(third.required_skills.contains(&"dbt".to_string()));
        assert!(third.required_skills.contains(&"Tableau".to_string()));

        // unprefixed id passes through; synonym folds; point estimate
        let staff = &cleaned[4];
        assert_eq!(staff.job_id, "9f1e3a5c7d2b4680");
        assert_eq!(staff.location, "");
        assert_eq!(staff.salary_lower, Some(185000.0));
        assert_eq!(staff.salary_upper, Some(185000.0));
        assert_eq!(staff.employment_type.as_deref(), Some("Part-time"));
        assert!(staff.required_skills.contains(&"Spark".to_string()));
        assert!(staff.required_skills.contains(&"Kafka".to_string()));
    }

    #[test]
    fn normalization_is_idempotent_to_the_byte() {
        let raws = fixture_records();
        let rules = CleanRules::default();
        let tax = taxonomy();

        let once = processed_to_string(&normalize(&raws, &rules, &tax));
        let twice = processed_to_string(&normalize(&raws, &rules, &tax));
        assert_eq!(once, twice);
    }

    #[test]
    fn pay_bands_never_straddle() {
        let cleaned = normalize(&fixture_records(), &CleanRules::default(), &taxonomy());
        for rec in &cleaned {
            let has_salary = rec.salary_lower.is_some() || rec.salary_upper.is_some();
            let has_hourly = rec.hourly_rate_lower.is_some() || rec.hourly_rate_upper.is_some();
            assert!(!(has_salary && has_hourly), "record {} straddles bands", rec.job_id);
        }
    }

    #[test]
    fn missing_column_is_fatal() {
        let text = "Job ID;Title;Company;Location;Job Type;Full Job Description\n\
                    job_1;Engineer;Acme;Remote;Full-time;desc\n";
        let err = parse_batch("batch.csv", text).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Salary"), "unexpected error: {msg}");
        assert!(msg.contains("batch.csv"));
    }

    #[test]
    fn empty_batch_is_fatal() {
        assert!(parse_batch("batch.csv", "").is_err());
    }

    #[test]
    fn short_rows_pad_with_empty_cells() {
        let text = "Job ID;Title;Company;Location;Salary;Job Type;Full Job Description\n\
                    job_1;Engineer\n";
        let records = parse_batch("batch.csv", text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Engineer");
        assert_eq!(records[0].company, None);
        assert_eq!(records[0].description, "");
    }

    #[test]
    fn overlong_row_is_fatal() {
        let text = "Job ID;Title;Company;Location;Salary;Job Type;Full Job Description\n\
                    job_1;a;b;c;d;e;f;extra\n";
        let err = parse_batch("batch.csv", text).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn header_columns_found_by_name_not_position() {
        let text = "Title;Job ID;Company;Location;Salary;Job Type;Full Job Description;Scraped At\n\
                    Engineer;job_42;Acme;Remote;;Full-time;desc;2024-01-01\n";
        let records = parse_batch("batch.csv", text).unwrap();
        assert_eq!(records[0].job_id, "job_42");
        assert_eq!(records[0].title, "Engineer");
    }

    #[test]
    fn merging_nothing_is_an_error() {
        let batches = vec![RawBatch { file: "empty.csv".to_string(), records: vec![] }];
        assert!(merge(batches).is_err());
    }

    #[test]
    fn skills_cell_round_trips_as_json() {
        let cleaned = normalize(&fixture_records(), &CleanRules::default(), &taxonomy());
        let text = processed_to_string(&cleaned);
        let rows = csv::parse(&text);

        let skills_col = rows[0].iter().position(|h| h == "Req_Skills").unwrap();
        let parsed: Vec<String> = serde_json::from_str(&rows[1][skills_col]).unwrap();
        assert_eq!(parsed, cleaned[0].required_skills);
    }
}
