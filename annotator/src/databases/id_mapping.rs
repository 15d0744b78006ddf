// src/databases/id_mapping.rs
//
// UniProt ID mapping service: submit a job, poll its status, read the first
// result group.

use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api_handler::{ApiResponse, Transport, JSON};
use crate::config::AnnotatorConfig;
use crate::databases::uniprot::IdRemapper;
use crate::error::AnnotatorError;

const FROM_DATABASE: &str = "UniProtKB_AC-ID";
const RUNNING: &str = "RUNNING";

pub struct IdMapping<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
    target: &'a str,
    poll_interval: Duration,
    max_polls: u32,
}

impl<'a> IdMapping<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a AnnotatorConfig) -> Self {
        Self {
            transport,
            base_url: config.idmapping_api_url.trim_end_matches('/'),
            target: &config.mapping_target,
            poll_interval: config.mapping_poll_interval,
            max_polls: config.mapping_max_polls,
        }
    }

    /// Accessions `accession` maps to in `target`, without versioned or
    /// isoform ids.
    pub fn map(&self, accession: &str, target: &str) -> Result<Vec<String>, AnnotatorError> {
        let job_id = self.submit(accession, target)?;
        info!("ID mapping job {} submitted for {} -> {}", job_id, accession, target);
        let results = self.wait_for_results(&job_id)?;
        Ok(mapped_accessions(&results))
    }

    fn submit(&self, accession: &str, target: &str) -> Result<String, AnnotatorError> {
        let url = format!("{}/idmapping/run", self.base_url);
        let response = self
            .transport
            .post_form(&url, &[("from", FROM_DATABASE), ("to", target), ("ids", accession)])?;
        let body = require_success(&url, response)?;

        body.get("jobId")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| AnnotatorError::Malformed {
                url,
                reason: "missing jobId".to_string(),
            })
    }

    fn wait_for_results(&self, job_id: &str) -> Result<Value, AnnotatorError> {
        let url = format!("{}/idmapping/status/{}", self.base_url, job_id);
        for _ in 0..self.max_polls {
            let response = self.transport.get(&url, &[("Accept", JSON)])?;
            let job = require_success(&url, response)?;

            match job.get("jobStatus") {
                None => return Ok(job),
                Some(Value::String(status)) if status == RUNNING => {
                    debug!("Job {} still running. Retrying in {:?}", job_id, self.poll_interval);
                    thread::sleep(self.poll_interval);
                }
                Some(status) => {
                    return Err(AnnotatorError::MappingJobFailed {
                        job_id: job_id.to_string(),
                        status: status.as_str().map_or_else(|| status.to_string(), str::to_owned),
                    })
                }
            }
        }

        warn!("Job {} still running after {} polls", job_id, self.max_polls);
        Err(AnnotatorError::MappingJobFailed {
            job_id: job_id.to_string(),
            status: RUNNING.to_string(),
        })
    }
}

impl IdRemapper for IdMapping<'_> {
    fn remap(&self, accession: &str) -> Result<Vec<String>, AnnotatorError> {
        self.map(accession, self.target)
    }
}

fn require_success(url: &str, response: ApiResponse) -> Result<Value, AnnotatorError> {
    if !response.status.is_success() {
        return Err(AnnotatorError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    response.body.ok_or_else(|| AnnotatorError::Malformed {
        url: url.to_string(),
        reason: "body is not JSON".to_string(),
    })
}

/// UniProtKB accessions in the first result group.
pub fn mapped_accessions(results: &Value) -> Vec<String> {
    results
        .pointer("/results/0/to/uniProtKBAccessions")
        .and_then(Value::as_array)
        .map(|accessions| {
            accessions
                .iter()
                .filter_map(Value::as_str)
                .filter(|acc| !acc.contains('.') && !acc.contains('-'))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
