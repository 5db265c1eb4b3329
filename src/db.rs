//! SQLite load boundary. One `jobs` relation keyed by job id; loading is
//! insert-if-absent, so replaying a staging file never clobbers rows.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rusqlite::Connection;
use tracing::debug;

use crate::csv;
use crate::error::PipelineError;
use crate::records::CLEAN_COLUMNS;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            job_id            TEXT PRIMARY KEY,
            title             TEXT,
            company           TEXT,
            location          TEXT,
            salary_lower      REAL,
            salary_avg        REAL,
            salary_upper      REAL,
            hourly_rate_lower REAL,
            hourly_rate_avg   REAL,
            hourly_rate_upper REAL,
            job_type          TEXT,
            req_skills        TEXT,
            loaded_at         TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_type ON jobs(job_type);
        ",
    )?;
    Ok(())
}

/// One processed row ready for insert. `req_skills` holds the parsed
/// canonical names; they go back to JSON text in the column.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary_lower: Option<f64>,
    pub salary_avg: Option<f64>,
    pub salary_upper: Option<f64>,
    pub hourly_rate_lower: Option<f64>,
    pub hourly_rate_avg: Option<f64>,
    pub hourly_rate_upper: Option<f64>,
    pub job_type: Option<String>,
    pub req_skills: Vec<String>,
}

// ── Staging files ──

/// Parse one processed CSV into load rows. Staging files are produced by
/// the transform stage, so damage here means the staging area is corrupt:
/// a bad number or an unparseable skills list aborts the load instead of
/// degrading quietly.
pub fn parse_processed(file: &str, text: &str) -> Result<Vec<JobRow>> {
    let mut rows = csv::parse(text);
    if rows.is_empty() {
        return Err(PipelineError::EmptyBatch { file: file.to_string() }.into());
    }
    let header = rows.remove(0);

    let mut idx = [0usize; CLEAN_COLUMNS.len()];
    for (slot, column) in idx.iter_mut().zip(CLEAN_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            })?;
    }

    let mut out = Vec::with_capacity(rows.len());
    for (n, row) in rows.iter().enumerate() {
        let line = n + 2;
        let cell = |i: usize| row.get(idx[i]).map(|s| s.as_str()).unwrap_or("");

        let number = |i: usize| -> Result<Option<f64>, PipelineError> {
            let value = cell(i).trim();
            if value.is_empty() {
                return Ok(None);
            }
            value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| PipelineError::BadNumber {
                    file: file.to_string(),
                    row: line,
                    column: CLEAN_COLUMNS[i].to_string(),
                    value: value.to_string(),
                })
        };

        let job_id = cell(0).to_string();
        let req_skills: Vec<String> =
            serde_json::from_str(cell(11)).map_err(|e| PipelineError::SkillsList {
                file: file.to_string(),
                row: line,
                job_id: job_id.clone(),
                source: e,
            })?;

        out.push(JobRow {
            job_id,
            title: cell(1).to_string(),
            company: cell(2).to_string(),
            location: cell(3).to_string(),
            salary_lower: number(4)?,
            salary_avg: number(5)?,
            salary_upper: number(6)?,
            hourly_rate_lower: number(7)?,
            hourly_rate_avg: number(8)?,
            hourly_rate_upper: number(9)?,
            job_type: match cell(10) {
                "" => None,
                t => Some(t.to_string()),
            },
            req_skills,
        });
    }
    Ok(out)
}

/// Every processed `.csv` under `dir`, sorted by name.
pub fn staged_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read staging directory {}", dir.display()))?;
    let files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "csv").unwrap_or(false))
        .sorted()
        .collect();
    if files.is_empty() {
        return Err(PipelineError::NoBatches(dir.to_path_buf()).into());
    }
    Ok(files)
}

// ── Loading ──

/// Insert rows with insert-if-absent semantics. Returns how many were new;
/// rows whose job id already exists are left untouched.
pub fn insert_jobs(conn: &Connection, rows: &[JobRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO jobs (
                job_id, title, company, location,
                salary_lower, salary_avg, salary_upper,
                hourly_rate_lower, hourly_rate_avg, hourly_rate_upper,
                job_type, req_skills
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        let pb = ProgressBar::new(rows.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                .unwrap(),
        );
        for row in rows {
            let skills_json = serde_json::to_string(&row.req_skills).unwrap_or_default();
            inserted += stmt.execute(rusqlite::params![
                row.job_id,
                row.title,
                row.company,
                row.location,
                row.salary_lower,
                row.salary_avg,
                row.salary_upper,
                row.hourly_rate_lower,
                row.hourly_rate_avg,
                row.hourly_rate_upper,
                row.job_type,
                skills_json,
            ])?;
            pb.inc(1);
        }
        pb.finish_and_clear();
    }
    tx.commit()?;
    Ok(inserted)
}

/// Load every staged file into the jobs relation. Returns rows read, rows
/// newly inserted, and the files consumed (for optional cleanup).
pub fn load_dir(conn: &Connection, dir: &Path) -> Result<(usize, usize, Vec<PathBuf>)> {
    let files = staged_files(dir)?;
    let mut read = 0;
    let mut inserted = 0;
    for path in &files {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let rows = parse_processed(&file, &text)?;
        let new = insert_jobs(conn, &rows)?;
        debug!(file = %file, rows = rows.len(), new, "loaded staging file");
        read += rows.len();
        inserted += new;
    }
    Ok((read, inserted, files))
}

/// Delete consumed staging files after a successful load. Opt-in from the
/// CLI; the staging directory itself stays.
pub fn clear_staged(files: &[PathBuf]) -> Result<()> {
    for path in files {
        fs::remove_file(path)
            .with_context(|| format!("failed to delete {}", path.display()))?;
        println!("Deleted: {}", path.display());
    }
    Ok(())
}
