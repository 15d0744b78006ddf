// src/databases/ensembl.rs

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::api_handler::{get_with_backoff, Transport, JSON};
use crate::config::AnnotatorConfig;
use crate::models::{CrossReferencedProtein, GeneAnnotation, ProteinRecord, EMPTY};
use crate::pipeline::PipelineState;

#[derive(Deserialize, Debug)]
struct Xref {
    id: Option<String>,
    #[serde(rename = "type")]
    id_type: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct GeneLookup {
    description: Option<String>,
    seq_region_name: Option<String>,
}

/// Ensembl species segment for an organism's scientific name.
pub fn species_name(organism_scientific: &str) -> String {
    organism_scientific.trim().to_lowercase()
}

/// Id of the first cross-reference entry of type `gene`.
pub fn first_gene_id(xrefs: &Value) -> Option<String> {
    let xrefs: Vec<Xref> = serde_json::from_value(xrefs.clone()).ok()?;
    xrefs
        .into_iter()
        .find(|x| x.id_type.as_deref() == Some("gene"))
        .and_then(|x| x.id)
        .filter(|id| !id.is_empty())
}

// ─── Gene cross-references ───────────────────────────────────────────────────

pub struct GeneXrefResolver<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
    backoff: Duration,
}

impl<'a> GeneXrefResolver<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a AnnotatorConfig) -> Self {
        Self {
            transport,
            base_url: config.ensembl_api_url.trim_end_matches('/'),
            backoff: config.rate_limit_backoff,
        }
    }

    /// Keeps only the proteins Ensembl can link to a gene (inner join).
    pub fn resolve(&self, records: Vec<ProteinRecord>, state: &mut PipelineState) -> Vec<CrossReferencedProtein> {
        let mut linked = Vec::with_capacity(records.len());

        for protein in records {
            let species = species_name(&protein.organism_scientific);
            match self.lookup(&species, &protein.gene_symbol, &protein.accession) {
                Some(gene_id) => {
                    state.link_gene(&protein.accession, &gene_id);
                    linked.push(CrossReferencedProtein { protein, gene_id });
                }
                None => state.mark_invalid(&protein.accession),
            }
        }

        info!("Ensembl: linked {} proteins to gene ids", linked.len());
        linked
    }

    fn lookup(&self, species: &str, gene: &str, accession: &str) -> Option<String> {
        let url = format!("{}/xrefs/symbol/{}/{}", self.base_url, species, gene);
        let response = match get_with_backoff(self.transport, &url, &[("Accept", JSON)], self.backoff) {
            Ok(response) => response,
            Err(e) => {
                warn!("Ensembl: request failed for ({}, {}). UniProt ID: {}: {}", species, gene, accession, e);
                return None;
            }
        };

        match response.status {
            StatusCode::OK => {}
            StatusCode::BAD_REQUEST => {
                warn!("No Ensembl Gene ID for ({}, {}): HTTP 400. UniProt ID: {}", species, gene, accession);
                return None;
            }
            status => {
                warn!(
                    "Error by calling Ensembl for ({}, {}): HTTP {}. UniProt ID: {}",
                    species,
                    gene,
                    status.as_u16(),
                    accession
                );
                return None;
            }
        }

        let gene_id = response.body.as_ref().and_then(first_gene_id);
        if gene_id.is_none() {
            warn!("Ensembl: No Ensembl Gene ID found for ({}, {}). UniProt ID: {}.", species, gene, accession);
        }
        gene_id
    }
}

// ─── Gene annotations ────────────────────────────────────────────────────────

pub struct GeneAnnotationFetcher<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
}

impl<'a> GeneAnnotationFetcher<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a AnnotatorConfig) -> Self {
        Self {
            transport,
            base_url: config.ensembl_api_url.trim_end_matches('/'),
        }
    }

    /// One annotation per id that answered HTTP 200, in input order.
    pub fn fetch(&self, gene_ids: &[String]) -> Vec<GeneAnnotation> {
        info!("start get_gene_data for {} gene ids", gene_ids.len());
        gene_ids.iter().filter_map(|id| self.fetch_one(id)).collect()
    }

    fn fetch_one(&self, gene_id: &str) -> Option<GeneAnnotation> {
        let url = format!("{}/lookup/id/{}?content-type=application/json", self.base_url, gene_id);
        let response = match self
            .transport
            .get(&url, &[("Accept", JSON), ("Content-Type", JSON)])
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Ensembl: request failed for Ensembl Gene ID {}: {}", gene_id, e);
                return None;
            }
        };

        if response.status != StatusCode::OK {
            warn!(
                "Ensembl: Ensembl Gene ID is not valid: {}: HTTP {}",
                gene_id,
                response.status.as_u16()
            );
            return None;
        }

        Some(extract_annotation(gene_id, response.body.as_ref()))
    }
}

pub fn extract_annotation(gene_id: &str, document: Option<&Value>) -> GeneAnnotation {
    let lookup: GeneLookup = document
        .and_then(|d| serde_json::from_value(d.clone()).ok())
        .unwrap_or_default();

    let description = lookup.description.filter(|d| !d.is_empty()).unwrap_or_else(|| {
        info!("Ensembl: No description for Ensembl ID: {}.", gene_id);
        EMPTY.to_string()
    });
    let seq_region_name = lookup.seq_region_name.filter(|s| !s.is_empty()).unwrap_or_else(|| {
        info!("Ensembl: No sequence region name for Ensembl ID: {}.", gene_id);
        EMPTY.to_string()
    });

    GeneAnnotation {
        gene_id: gene_id.to_string(),
        description,
        seq_region_name,
    }
}
