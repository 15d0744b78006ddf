//! Protein and gene annotation aggregator.
//!
//! Resolves UniProt accessions through the EBI Proteins API, links each
//! protein to its Ensembl gene, pulls the Ensembl gene annotation and joins
//! everything into one table per run.

pub mod api_handler;
pub mod config;
pub mod data_handling;
pub mod databases;
pub mod error;
pub mod helper_functions;
pub mod logging;
pub mod models;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AnnotatorConfig;
pub use error::{AnnotatorError, ExtractionError};
pub use pipeline::{Pipeline, PipelineState};
