use polars::prelude::*;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

use crate::models::{
    CrossReferencedProtein, GeneAnnotation, ProteinRecord, DESCRIPTION, ENSEMBL_GENE_ID, GENE,
    MOLECULAR_WEIGHT, ORGANISM_COMMON, ORGANISM_SCIENTIFIC, PROTEIN_ACCESSION, PROTEIN_NAME,
    SEQ_REGION_NAME,
};

/// Non-empty string at a JSON pointer.
pub fn json_str<'a>(document: &'a Value, pointer: &str) -> Option<&'a str> {
    document
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub fn protein_frame(records: &[ProteinRecord]) -> PolarsResult<DataFrame> {
    df!(
        PROTEIN_ACCESSION => records.iter().map(|r| r.accession.as_str()).collect::<Vec<_>>(),
        PROTEIN_NAME => records.iter().map(|r| r.protein_name.as_str()).collect::<Vec<_>>(),
        GENE => records.iter().map(|r| r.gene_symbol.as_str()).collect::<Vec<_>>(),
        ORGANISM_SCIENTIFIC => records.iter().map(|r| r.organism_scientific.as_str()).collect::<Vec<_>>(),
        ORGANISM_COMMON => records.iter().map(|r| r.organism_common.as_str()).collect::<Vec<_>>(),
        MOLECULAR_WEIGHT => records.iter().map(|r| r.molecular_weight.to_string()).collect::<Vec<_>>()
    )
}

/// Protein columns plus `Ensembl Gene ID`.
pub fn cross_reference_frame(rows: &[CrossReferencedProtein]) -> PolarsResult<DataFrame> {
    let proteins: Vec<ProteinRecord> = rows.iter().map(|r| r.protein.clone()).collect();
    let mut df = protein_frame(&proteins)?;
    let gene_ids = Column::new(
        ENSEMBL_GENE_ID.into(),
        rows.iter().map(|r| r.gene_id.as_str()).collect::<Vec<_>>(),
    );
    df.with_column(gene_ids)?;
    Ok(df)
}

pub fn annotation_frame(annotations: &[GeneAnnotation]) -> PolarsResult<DataFrame> {
    df!(
        ENSEMBL_GENE_ID => annotations.iter().map(|a| a.gene_id.as_str()).collect::<Vec<_>>(),
        DESCRIPTION => annotations.iter().map(|a| a.description.as_str()).collect::<Vec<_>>(),
        SEQ_REGION_NAME => annotations.iter().map(|a| a.seq_region_name.as_str()).collect::<Vec<_>>()
    )
}

pub fn dataframe_to_csv(df: &mut DataFrame, path: &Path, separator: u8) -> PolarsResult<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(separator)
        .finish(df)
}
