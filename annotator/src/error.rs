use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("id mapping job {job_id} finished with status {status}")]
    MappingJobFailed { job_id: String, status: String },

    #[error("invalid accession input: {0}")]
    Input(String),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Why a UniProt document could not become a [`crate::models::ProteinRecord`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No gene name found.")]
    MissingGeneSymbol,
    #[error("No protein name found.")]
    MissingProteinName,
    #[error("No organism name scientific found.")]
    MissingOrganismName,
}
