#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to send request: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Failed to decode json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to decode csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to parse date: {0}")]
    TimeParse(#[from] time::error::Parse),
    #[error("Failed to format date: {0}")]
    TimeFormat(#[from] time::error::Format),
    #[error("Invalid url: {0}")]
    Url(String),
    #[error("Rate limit exceeded after retries")]
    RateLimited,
    #[error("No locations found for '{0}'")]
    NoResults(String),
    #[error("Location {index} out of range, only {available} candidates")]
    OutOfRange { index: usize, available: usize },
    #[error("History window of {days} days reaches before the calendar start")]
    InvalidWindow { days: u32 },
    #[error("Unexpected response from {source_name}: {body}")]
    UnexpectedResponse { source_name: String, body: String },
}
