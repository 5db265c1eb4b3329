//! Error taxonomy for the pipeline.
//!
//! Field-level parse failures are not errors here: cleaners degrade to null
//! and the record survives. Only structural problems (unreadable batches,
//! missing columns, broken staging files) and taxonomy problems abort a run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input directory exists but holds no `.csv` batch files.
    #[error("no .csv batches found in {}", .0.display())]
    NoBatches(PathBuf),

    #[error("{file}: empty file (no header row)")]
    EmptyBatch { file: String },

    #[error("{file}: missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("{file}: row {row}: {got} fields, header has {expected}")]
    ExtraFields {
        file: String,
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Every batch parsed but none contained a data row.
    #[error("merged collection is empty (no data rows in any batch)")]
    EmptyCollection,

    #[error("skill taxonomy {path}: {reason}")]
    Taxonomy { path: String, reason: String },

    /// A staging file carries a skills cell that is not a JSON string array.
    #[error("{file}: row {row} (job {job_id}): unparseable skills list: {source}")]
    SkillsList {
        file: String,
        row: usize,
        job_id: String,
        source: serde_json::Error,
    },

    #[error("{file}: row {row}: bad numeric value '{value}' in column '{column}'")]
    BadNumber {
        file: String,
        row: usize,
        column: String,
        value: String,
    },
}
