use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Provenance of the dataset currently served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// ISO timestamp of the CSV download that produced the current import.
    pub download_date: String,
    pub source: String,
    #[serde(default)]
    pub csv_last_modified: Option<String>,
    pub total_records: u64,
    pub imported_records: u64,
    pub skipped_records: u64,
    /// Import wall time in seconds.
    pub import_duration: f64,
    /// Whole days since `download_date`, computed by the server.
    pub data_age: i64,
}

impl Metadata {
    #[must_use]
    pub fn downloaded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.download_date, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }

    /// Share of CSV rows that made it into the database, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn import_ratio(&self) -> Option<f64> {
        (self.total_records > 0).then(|| self.imported_records as f64 / self.total_records as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataHistoryEntry {
    pub download_date: String,
    pub source: String,
    pub imported_records: u64,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// What a health indicator shows: the reported status, or "unavailable" for
/// any failure to reach the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    Available(String),
    Unavailable,
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiStatus::Available(status) => write!(f, "API status: {status}"),
            ApiStatus::Unavailable => write!(f, "Unavailable"),
        }
    }
}
