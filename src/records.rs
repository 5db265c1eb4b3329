//! Record types at the two CSV boundaries of the pipeline.

/// Column layout of a raw scraper batch, header names as scraped.
pub const RAW_COLUMNS: [&str; 7] = [
    "Job ID",
    "Title",
    "Company",
    "Location",
    "Salary",
    "Job Type",
    "Full Job Description",
];

/// Column layout of the processed collection.
pub const CLEAN_COLUMNS: [&str; 12] = [
    "Job ID",
    "Title",
    "Company",
    "Location",
    "Salary_Lower",
    "Salary_Avg",
    "Salary_Upper",
    "Hourly_Rate_Lower",
    "Hourly_Rate_Avg",
    "Hourly_Rate_Upper",
    "Job Type",
    "Req_Skills",
];

/// One scraped listing as it arrives. Empty cells come through as `None`
/// for the fields the cleaners treat as optional.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub job_id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub compensation_text: Option<String>,
    pub employment_type_text: Option<String>,
    pub description: String,
}

/// One cleaned listing. Pay bounds live in exactly one band (salary or
/// hourly), the other stays null.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
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
    pub employment_type: Option<String>,
    pub required_skills: Vec<String>,
}

impl CleanRecord {
    /// Serialize in `CLEAN_COLUMNS` order. Skills become a JSON string
    /// array so the list survives the CSV hop intact.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.job_id.clone(),
            self.title.clone(),
            self.company.clone(),
            self.location.clone(),
            format_bound(self.salary_lower),
            format_bound(self.salary_avg),
            format_bound(self.salary_upper),
            format_bound(self.hourly_rate_lower),
            format_bound(self.hourly_rate_avg),
            format_bound(self.hourly_rate_upper),
            self.employment_type.clone().unwrap_or_default(),
            serde_json::to_string(&self.required_skills).unwrap_or_default(),
        ]
    }
}

/// Format a pay bound for CSV: empty for null, no trailing `.0` on whole
/// amounts so `90000.0` round-trips as `90000`.
pub fn format_bound(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => format!("{}", v),
    }
}
