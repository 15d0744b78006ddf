use std::path::PathBuf;
use std::time::Duration;

pub const PROTEIN_API_URL: &str = "https://www.ebi.ac.uk/proteins/api/proteins";
pub const ENSEMBL_API_URL: &str = "https://rest.ensembl.org";
pub const IDMAPPING_API_URL: &str = "https://rest.uniprot.org";

pub const DEFAULT_MAPPING_TARGET: &str = "UniParc";
pub const DEFAULT_OUTPUT: &str = "protein_gene_analysis.xlsx";
pub const DEFAULT_LOG_FILE: &str = "protein_annotator.log";

/// Seconds to wait after an HTTP 429 before the single retry.
const RATE_LIMIT_BACKOFF_SECS: u64 = 3;
/// Seconds between id-mapping status polls.
const POLLING_INTERVAL_SECS: u64 = 3;
/// Status polls before a job still `RUNNING` is given up on.
const MAX_MAPPING_POLLS: u32 = 20;

/// Endpoints, timings and file locations for one run.
///
/// The CLI always runs with [`AnnotatorConfig::default`]; the `with_*` setters
/// exist so a run can be aimed at a mock server.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    pub protein_api_url: String,
    pub ensembl_api_url: String,
    pub idmapping_api_url: String,
    pub mapping_target: String,
    pub rate_limit_backoff: Duration,
    pub mapping_poll_interval: Duration,
    pub mapping_max_polls: u32,
    /// Ask the id-mapping service about accessions the protein API reports as not found.
    pub remap_not_found: bool,
    pub output_path: PathBuf,
    pub log_file: PathBuf,
    pub user_agent: String,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            protein_api_url: PROTEIN_API_URL.to_string(),
            ensembl_api_url: ENSEMBL_API_URL.to_string(),
            idmapping_api_url: IDMAPPING_API_URL.to_string(),
            mapping_target: DEFAULT_MAPPING_TARGET.to_string(),
            rate_limit_backoff: Duration::from_secs(RATE_LIMIT_BACKOFF_SECS),
            mapping_poll_interval: Duration::from_secs(POLLING_INTERVAL_SECS),
            mapping_max_polls: MAX_MAPPING_POLLS,
            remap_not_found: true,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            user_agent: format!("annotator/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl AnnotatorConfig {
    pub fn with_protein_api_url(mut self, url: impl Into<String>) -> Self {
        self.protein_api_url = url.into();
        self
    }

    pub fn with_ensembl_api_url(mut self, url: impl Into<String>) -> Self {
        self.ensembl_api_url = url.into();
        self
    }

    pub fn with_idmapping_api_url(mut self, url: impl Into<String>) -> Self {
        self.idmapping_api_url = url.into();
        self
    }

    pub fn with_mapping_target(mut self, target: impl Into<String>) -> Self {
        self.mapping_target = target.into();
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    pub fn with_mapping_poll_interval(mut self, interval: Duration) -> Self {
        self.mapping_poll_interval = interval;
        self
    }

    pub fn with_mapping_max_polls(mut self, polls: u32) -> Self {
        self.mapping_max_polls = polls;
        self
    }

    pub fn with_remap_not_found(mut self, enabled: bool) -> Self {
        self.remap_not_found = enabled;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }
}
