use serde_json::Number;
use std::fmt;

// ─── Output columns ──────────────────────────────────────────────────────────
pub const PROTEIN_ACCESSION: &str = "Protein Accession";
pub const PROTEIN_NAME: &str = "Protein Name";
pub const GENE: &str = "Gen";
pub const ORGANISM_SCIENTIFIC: &str = "Organism (Scientific)";
pub const ORGANISM_COMMON: &str = "Organism (Common)";
pub const MOLECULAR_WEIGHT: &str = "Molecular Weight";
pub const ENSEMBL_GENE_ID: &str = "Ensembl Gene ID";
pub const DESCRIPTION: &str = "Description";
pub const SEQ_REGION_NAME: &str = "Seq Region Name";

pub const FINAL_COLUMNS: [&str; 9] = [
    PROTEIN_ACCESSION,
    PROTEIN_NAME,
    GENE,
    ORGANISM_SCIENTIFIC,
    ORGANISM_COMMON,
    MOLECULAR_WEIGHT,
    ENSEMBL_GENE_ID,
    DESCRIPTION,
    SEQ_REGION_NAME,
];

/// Placeholder for optional text fields the upstream document left out.
pub const EMPTY: &str = "empty";

/// Mass as the protein API reported it, integer or float.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MolecularWeight {
    Daltons(Number),
    NotAvailable,
}

impl fmt::Display for MolecularWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MolecularWeight::Daltons(mass) => write!(f, "{mass}"),
            MolecularWeight::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// One resolved UniProt entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinRecord {
    pub accession: String,
    pub protein_name: String,
    pub gene_symbol: String,
    pub organism_scientific: String,
    pub organism_common: String,
    pub molecular_weight: MolecularWeight,
}

/// A protein that Ensembl linked to a gene id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReferencedProtein {
    pub protein: ProteinRecord,
    pub gene_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneAnnotation {
    pub gene_id: String,
    pub description: String,
    pub seq_region_name: String,
}

/// Entity-store entry. Each stage returns an enriched copy instead of
/// mutating the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinEntity {
    pub record: ProteinRecord,
    pub gene_id: Option<String>,
    pub annotation: Option<GeneAnnotation>,
}

impl ProteinEntity {
    pub fn new(record: ProteinRecord) -> Self {
        Self {
            record,
            gene_id: None,
            annotation: None,
        }
    }

    pub fn with_gene_id(self, gene_id: impl Into<String>) -> Self {
        Self {
            gene_id: Some(gene_id.into()),
            ..self
        }
    }

    pub fn with_annotation(self, annotation: GeneAnnotation) -> Self {
        Self {
            annotation: Some(annotation),
            ..self
        }
    }
}
