use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("fetch failed for parcel {parcel}: {source}")]
    Fetch {
        parcel: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("no property-card table found: {0}")]
    TableMissing(String),

    #[error("failed to load parcel listing {path}: {reason}")]
    Listing { path: PathBuf, reason: String },

    #[error("existing output {path} is malformed ({reason}); refusing to resume over it")]
    ResumeScan { path: PathBuf, reason: String },

    #[error("geocoding failed: {0}")]
    Geocode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
