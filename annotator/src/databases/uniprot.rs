// src/databases/uniprot.rs

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::api_handler::{get_with_backoff, Transport, JSON};
use crate::config::AnnotatorConfig;
use crate::error::{AnnotatorError, ExtractionError};
use crate::helper_functions::json_str;
use crate::models::{MolecularWeight, ProteinRecord, EMPTY};
use crate::pipeline::PipelineState;

/// Looks up alternative accessions for one that the protein API no longer knows.
pub trait IdRemapper {
    fn remap(&self, accession: &str) -> Result<Vec<String>, AnnotatorError>;
}

pub struct ProteinResolver<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
    backoff: Duration,
    remapper: Option<&'a dyn IdRemapper>,
}

impl<'a> ProteinResolver<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a AnnotatorConfig) -> Self {
        Self {
            transport,
            base_url: config.protein_api_url.trim_end_matches('/'),
            backoff: config.rate_limit_backoff,
            remapper: None,
        }
    }

    pub fn with_remapper(mut self, remapper: &'a dyn IdRemapper) -> Self {
        self.remapper = Some(remapper);
        self
    }

    /// One record per accession that resolved with every required field.
    /// Accessions already handled in `state`, resolved or not, are skipped
    /// without a request.
    pub fn resolve(&self, accessions: &[String], state: &mut PipelineState) -> Vec<ProteinRecord> {
        let mut records = Vec::new();

        for accession in accessions {
            if state.is_processed(accession) {
                info!("UniProt ID: {} is redundant", accession);
                continue;
            }
            info!("Handle UniProt ID: {}", accession);

            let Some(document) = self.fetch(accession) else {
                state.mark_invalid(accession);
                continue;
            };

            match extract_protein(accession, &document) {
                Ok(record) => {
                    state.record_protein(record.clone());
                    records.push(record);
                }
                Err(reason) => {
                    warn!("UniProt ID: {}. {}", accession, reason);
                    state.mark_invalid(accession);
                }
            }
        }

        records
    }

    fn fetch(&self, accession: &str) -> Option<Value> {
        let url = format!("{}/{}", self.base_url, accession);
        let response = match get_with_backoff(self.transport, &url, &[("Accept", JSON)], self.backoff) {
            Ok(response) => response,
            Err(e) => {
                warn!("UniProt ID: {}. Request failed: {}", accession, e);
                return None;
            }
        };

        match response.status {
            StatusCode::OK => {
                if response.body.is_none() {
                    warn!("UniProt ID: {}. Response body is not valid JSON", accession);
                }
                response.body
            }
            StatusCode::NOT_FOUND => {
                warn!("UniProt ID: {}. Is not valid: HTTP {}", accession, response.status.as_u16());
                self.report_remapping(accession);
                None
            }
            StatusCode::BAD_REQUEST => {
                warn!("UniProt ID: {}. Is not valid: HTTP {}", accession, response.status.as_u16());
                None
            }
            status => {
                warn!("Error by calling UniProt ID: {}: HTTP {}", accession, status.as_u16());
                None
            }
        }
    }

    /// Diagnostic only: the mapped ids are logged, never queued.
    fn report_remapping(&self, accession: &str) {
        let Some(remapper) = self.remapper else {
            return;
        };

        info!("UniProt ID: {}. Try to find mapped IDs", accession);
        match remapper.remap(accession) {
            Ok(ids) if !ids.is_empty() => {
                info!("UniProt ID: {}. Has been merged. New IDs: {:?}", accession, ids)
            }
            Ok(_) => info!("UniProt ID: {}. No new IDs.", accession),
            Err(e) => warn!("UniProt ID: {}. ID mapping failed: {}", accession, e),
        }
    }
}

/// Required fields discard the record when missing; optional fields fall back
/// to their placeholder.
pub fn extract_protein(accession: &str, document: &Value) -> Result<ProteinRecord, ExtractionError> {
    let gene_symbol = json_str(document, "/gene/0/name/value").ok_or(ExtractionError::MissingGeneSymbol)?;
    let protein_name = json_str(document, "/protein/recommendedName/fullName/value")
        .ok_or(ExtractionError::MissingProteinName)?;
    let organism_scientific =
        json_str(document, "/organism/names/0/value").ok_or(ExtractionError::MissingOrganismName)?;
    let organism_common = json_str(document, "/organism/names/1/value").unwrap_or(EMPTY);
    let molecular_weight = document
        .pointer("/sequence/mass")
        .and_then(|mass| match mass {
            Value::Number(mass) => Some(mass.clone()),
            _ => None,
        })
        .map_or(MolecularWeight::NotAvailable, MolecularWeight::Daltons);

    Ok(ProteinRecord {
        accession: accession.to_string(),
        protein_name: protein_name.to_string(),
        gene_symbol: gene_symbol.to_string(),
        organism_scientific: organism_scientific.to_string(),
        organism_common: organism_common.to_string(),
        molecular_weight,
    })
}
