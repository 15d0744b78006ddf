use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::api_handler::Transport;
use crate::config::AnnotatorConfig;
use crate::data_handling::table_writer::write_table;
use crate::databases::ensembl::{GeneAnnotationFetcher, GeneXrefResolver};
use crate::databases::id_mapping::IdMapping;
use crate::databases::uniprot::ProteinResolver;
use crate::error::AnnotatorError;
use crate::helper_functions::{annotation_frame, cross_reference_frame};
use crate::models::{
    CrossReferencedProtein, GeneAnnotation, ProteinEntity, ProteinRecord, ENSEMBL_GENE_ID, FINAL_COLUMNS,
};

const LEFT_ORDER: &str = "__cross_reference_order";
const RIGHT_ORDER: &str = "__annotation_order";

/// Everything one run has learned so far. Append-only; lives for one run.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub resolved_proteins: HashMap<String, ProteinEntity>,
    /// Accessions that produced a protein row.
    pub seen_accessions: HashSet<String>,
    pub invalid_accessions: Vec<String>,
    /// Every accession handled so far, successful or not.
    processed_accessions: HashSet<String>,
}

impl PipelineState {
    pub fn is_processed(&self, accession: &str) -> bool {
        self.processed_accessions.contains(accession)
    }

    pub fn record_protein(&mut self, record: ProteinRecord) {
        self.seen_accessions.insert(record.accession.clone());
        self.processed_accessions.insert(record.accession.clone());
        self.resolved_proteins
            .insert(record.accession.clone(), ProteinEntity::new(record));
    }

    pub fn mark_invalid(&mut self, accession: &str) {
        self.processed_accessions.insert(accession.to_string());
        self.invalid_accessions.push(accession.to_string());
    }

    pub fn link_gene(&mut self, accession: &str, gene_id: &str) {
        if let Some(entity) = self.resolved_proteins.remove(accession) {
            self.resolved_proteins
                .insert(accession.to_string(), entity.with_gene_id(gene_id));
        }
    }

    /// Attaches `annotation` to every protein linked to its gene id.
    pub fn annotate(&mut self, annotation: &GeneAnnotation) {
        for entity in self.resolved_proteins.values_mut() {
            if entity.gene_id.as_deref() == Some(annotation.gene_id.as_str()) {
                *entity = entity.clone().with_annotation(annotation.clone());
            }
        }
    }
}

/// Full outer join on `Ensembl Gene ID`, keys coalesced.
///
/// Rows keep the cross-reference order; annotation-only rows follow in
/// annotation order.
pub fn merge_annotations(cross_references: &DataFrame, annotations: &DataFrame) -> PolarsResult<DataFrame> {
    let left = cross_references.with_row_index(LEFT_ORDER.into(), None)?;
    let right = annotations.with_row_index(RIGHT_ORDER.into(), None)?;

    let joined = left.join(
        &right,
        [ENSEMBL_GENE_ID],
        [ENSEMBL_GENE_ID],
        JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        None,
    )?;

    joined
        .sort(
            [LEFT_ORDER, RIGHT_ORDER],
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )?
        .select(FINAL_COLUMNS)
}

/// Distinct gene ids in first-seen order.
fn unique_gene_ids(rows: &[CrossReferencedProtein]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| seen.insert(r.gene_id.as_str()))
        .map(|r| r.gene_id.clone())
        .collect()
}

pub struct Pipeline<'a> {
    transport: &'a dyn Transport,
    config: &'a AnnotatorConfig,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a AnnotatorConfig) -> Self {
        Self {
            transport,
            config,
            state: PipelineState::default(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn into_state(self) -> PipelineState {
        self.state
    }

    /// Resolve proteins, link genes, fetch annotations and merge.
    pub fn run(&mut self, accessions: &[String]) -> Result<DataFrame, AnnotatorError> {
        info!("Start program with {} accessions", accessions.len());

        let mapping = IdMapping::new(self.transport, self.config);
        let mut resolver = ProteinResolver::new(self.transport, self.config);
        if self.config.remap_not_found {
            resolver = resolver.with_remapper(&mapping);
        }
        let proteins = resolver.resolve(accessions, &mut self.state);
        let resolved = proteins.len();
        if proteins.is_empty() {
            warn!("No accession could be resolved");
        }

        let linked = GeneXrefResolver::new(self.transport, self.config).resolve(proteins, &mut self.state);

        let gene_ids = unique_gene_ids(&linked);
        let annotations = GeneAnnotationFetcher::new(self.transport, self.config).fetch(&gene_ids);
        for annotation in &annotations {
            self.state.annotate(annotation);
        }

        let table = merge_annotations(&cross_reference_frame(&linked)?, &annotation_frame(&annotations)?)?;

        info!(
            "Run summary: {} requested, {} resolved, {} linked to a gene, {} gene annotations, {} rows",
            accessions.len(),
            resolved,
            linked.len(),
            annotations.len(),
            table.height()
        );
        if !self.state.invalid_accessions.is_empty() {
            info!("Not valid UniProt IDs: {:?}", self.state.invalid_accessions);
        }

        Ok(table)
    }

    /// [`Pipeline::run`] followed by writing the table to the configured output.
    pub fn run_and_save(&mut self, accessions: &[String]) -> Result<DataFrame, AnnotatorError> {
        let mut table = self.run(accessions)?;
        write_table(&mut table, &self.config.output_path)?;
        info!("End program");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DESCRIPTION, MOLECULAR_WEIGHT, PROTEIN_ACCESSION, SEQ_REGION_NAME};
    use crate::testing::{test_config, ScriptedTransport, ENSEMBL, IDMAPPING, PROTEINS};
    use serde_json::{json, Value};

    fn uniprot_entry(gene: &str, name: &str) -> Value {
        json!({
            "accession": "ignored",
            "gene": [{"name": {"value": gene}}],
            "protein": {"recommendedName": {"fullName": {"value": name}}},
            "organism": {"names": [{"type": "scientific", "value": "Homo sapiens"}, {"type": "common", "value": "Human"}]},
            "sequence": {"mass": 43653}
        })
    }

    fn tp53_transport() -> ScriptedTransport {
        ScriptedTransport::new()
            .on_get(&format!("{PROTEINS}/P04637"), 200, Some(uniprot_entry("TP53", "Cellular tumor antigen p53")))
            .on_get(
                &format!("{ENSEMBL}/xrefs/symbol/homo sapiens/TP53"),
                200,
                Some(json!([{"id": "ENSG00000141510", "type": "gene"}])),
            )
            .on_get(
                &format!("{ENSEMBL}/lookup/id/ENSG00000141510?content-type=application/json"),
                200,
                Some(json!({"description": "tumor protein p53", "seq_region_name": "17"})),
            )
    }

    fn cell(df: &DataFrame, column: &str, row: usize) -> Option<String> {
        df.column(column).unwrap().str().unwrap().get(row).map(str::to_owned)
    }

    fn accessions(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_protein_fills_all_nine_columns() {
        let config = test_config();
        let transport = tp53_transport();
        let mut pipeline = Pipeline::new(&transport, &config);

        let table = pipeline.run(&accessions(&["P04637"])).unwrap();

        assert_eq!(table.shape(), (1, 9));
        let names: Vec<&str> = table.get_column_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(names, FINAL_COLUMNS);
        for column in FINAL_COLUMNS {
            assert!(cell(&table, column, 0).is_some(), "{column} is empty");
        }
        assert_eq!(cell(&table, MOLECULAR_WEIGHT, 0).as_deref(), Some("43653"));
        assert_eq!(cell(&table, DESCRIPTION, 0).as_deref(), Some("tumor protein p53"));

        let entity = &pipeline.state().resolved_proteins["P04637"];
        assert_eq!(entity.gene_id.as_deref(), Some("ENSG00000141510"));
        assert_eq!(entity.annotation.as_ref().unwrap().seq_region_name, "17");
    }

    #[test]
    fn not_found_accession_is_remapped_and_skipped() {
        let config = test_config();
        let transport = tp53_transport()
            .on_get(&format!("{PROTEINS}/Q9Y24"), 404, None)
            .on_post(&format!("{IDMAPPING}/idmapping/run"), 200, Some(json!({"jobId": "job1"})))
            .on_get(&format!("{IDMAPPING}/idmapping/status/job1"), 200, Some(json!({"jobStatus": "ERROR"})));
        let mut pipeline = Pipeline::new(&transport, &config);

        let table = pipeline.run(&accessions(&["Q9Y24", "P04637"])).unwrap();

        assert_eq!(table.height(), 1);
        assert_eq!(cell(&table, PROTEIN_ACCESSION, 0).as_deref(), Some("P04637"));
        assert_eq!(transport.count(&format!("POST {IDMAPPING}/idmapping/run")), 1);
        assert_eq!(pipeline.state().invalid_accessions, vec!["Q9Y24"]);
    }

    #[test]
    fn remapping_can_be_disabled() {
        let config = test_config().with_remap_not_found(false);
        let transport = ScriptedTransport::new().on_get(&format!("{PROTEINS}/Q9Y24"), 404, None);
        let mut pipeline = Pipeline::new(&transport, &config);

        let table = pipeline.run(&accessions(&["Q9Y24"])).unwrap();

        assert_eq!(table.height(), 0);
        assert!(transport.calls().iter().all(|c| !c.starts_with("POST")));
    }

    #[test]
    fn empty_cross_reference_drops_the_protein() {
        let config = test_config();
        let transport = ScriptedTransport::new()
            .on_get(&format!("{PROTEINS}/P38398"), 200, Some(uniprot_entry("BRCA1", "Breast cancer type 1")))
            .on_get(&format!("{ENSEMBL}/xrefs/symbol/homo sapiens/BRCA1"), 200, Some(json!([])));
        let mut pipeline = Pipeline::new(&transport, &config);

        let table = pipeline.run(&accessions(&["P38398"])).unwrap();

        assert_eq!(table.height(), 0);
        assert_eq!(table.width(), 9);
        assert!(pipeline.state().seen_accessions.contains("P38398"));
        assert_eq!(pipeline.state().invalid_accessions, vec!["P38398"]);
    }

    #[test]
    fn shared_gene_id_is_fetched_once_and_joined_to_both_proteins() {
        let config = test_config();
        let transport = tp53_transport().on_get(
            &format!("{PROTEINS}/P04637-2"),
            200,
            Some(uniprot_entry("TP53", "Isoform 2 of Cellular tumor antigen p53")),
        );
        let mut pipeline = Pipeline::new(&transport, &config);

        let table = pipeline.run(&accessions(&["P04637", "P04637-2"])).unwrap();

        assert_eq!(table.height(), 2);
        assert_eq!(cell(&table, PROTEIN_ACCESSION, 1).as_deref(), Some("P04637-2"));
        assert_eq!(cell(&table, SEQ_REGION_NAME, 1).as_deref(), Some("17"));
        assert_eq!(
            transport.count(&format!("{ENSEMBL}/lookup/id/ENSG00000141510?content-type=application/json")),
            1
        );
    }

    #[test]
    fn failed_annotation_leaves_gene_fields_empty() {
        let config = test_config();
        let transport = ScriptedTransport::new()
            .on_get(&format!("{PROTEINS}/P04637"), 200, Some(uniprot_entry("TP53", "p53")))
            .on_get(
                &format!("{ENSEMBL}/xrefs/symbol/homo sapiens/TP53"),
                200,
                Some(json!([{"id": "ENSG00000141510", "type": "gene"}])),
            );
        let mut pipeline = Pipeline::new(&transport, &config);

        let table = pipeline.run(&accessions(&["P04637"])).unwrap();

        assert_eq!(table.height(), 1);
        assert_eq!(cell(&table, ENSEMBL_GENE_ID, 0).as_deref(), Some("ENSG00000141510"));
        assert_eq!(cell(&table, DESCRIPTION, 0), None);
        assert_eq!(cell(&table, SEQ_REGION_NAME, 0), None);
    }

    #[test]
    fn seen_set_matches_resolved_rows() {
        let config = test_config();
        let transport = tp53_transport()
            .on_get(&format!("{PROTEINS}/BAD"), 400, None)
            .on_get(&format!("{PROTEINS}/P38398"), 200, Some(json!({"gene": []})));
        let mut pipeline = Pipeline::new(&transport, &config);

        pipeline.run(&accessions(&["P04637", "BAD", "P38398"])).unwrap();
        let state = pipeline.into_state();

        let expected: HashSet<String> = ["P04637".to_string()].into_iter().collect();
        assert_eq!(state.seen_accessions, expected);
        assert_eq!(state.resolved_proteins.len(), 1);
    }

    #[test]
    fn merge_is_a_full_outer_join() {
        let cross_references = df!(
            PROTEIN_ACCESSION => &["P1", "P2", "P3"],
            "Protein Name" => &["a", "b", "c"],
            "Gen" => &["A", "B", "A"],
            "Organism (Scientific)" => &["Homo sapiens"; 3],
            "Organism (Common)" => &["Human"; 3],
            MOLECULAR_WEIGHT => &["1", "2", "N/A"],
            ENSEMBL_GENE_ID => &["ENSG_A", "ENSG_B", "ENSG_A"]
        )
        .unwrap();
        let annotations = df!(
            ENSEMBL_GENE_ID => &["ENSG_C", "ENSG_A"],
            DESCRIPTION => &["gene c", "gene a"],
            SEQ_REGION_NAME => &["3", "1"]
        )
        .unwrap();

        let merged = merge_annotations(&cross_references, &annotations).unwrap();

        assert_eq!(merged.shape(), (4, 9));
        let ids: Vec<Option<String>> = (0..4).map(|i| cell(&merged, ENSEMBL_GENE_ID, i)).collect();
        assert_eq!(
            ids,
            vec![
                Some("ENSG_A".to_string()),
                Some("ENSG_B".to_string()),
                Some("ENSG_A".to_string()),
                Some("ENSG_C".to_string())
            ]
        );
        assert_eq!(cell(&merged, DESCRIPTION, 2).as_deref(), Some("gene a"));
        assert_eq!(cell(&merged, DESCRIPTION, 1), None);
        assert_eq!(cell(&merged, PROTEIN_ACCESSION, 3), None);
    }

    #[test]
    fn merge_keeps_duplicate_annotation_rows() {
        let cross_references = df!(
            PROTEIN_ACCESSION => &["P1"],
            "Protein Name" => &["a"],
            "Gen" => &["A"],
            "Organism (Scientific)" => &["Homo sapiens"],
            "Organism (Common)" => &["Human"],
            MOLECULAR_WEIGHT => &["1"],
            ENSEMBL_GENE_ID => &["ENSG_A"]
        )
        .unwrap();
        let annotations = df!(
            ENSEMBL_GENE_ID => &["ENSG_A", "ENSG_A"],
            DESCRIPTION => &["first", "second"],
            SEQ_REGION_NAME => &["1", "1"]
        )
        .unwrap();

        let merged = merge_annotations(&cross_references, &annotations).unwrap();

        assert_eq!(merged.height(), 2);
        assert_eq!(cell(&merged, DESCRIPTION, 0).as_deref(), Some("first"));
        assert_eq!(cell(&merged, DESCRIPTION, 1).as_deref(), Some("second"));
    }

    #[test]
    fn writes_identical_bytes_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = Vec::new();
        for name in ["first.csv", "second.csv"] {
            let config = test_config().with_output_path(dir.path().join(name));
            let transport = tp53_transport();
            Pipeline::new(&transport, &config)
                .run_and_save(&accessions(&["P04637"]))
                .unwrap();
            outputs.push(std::fs::read(dir.path().join(name)).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
        let text = String::from_utf8(outputs[0].clone()).unwrap();
        assert!(text.starts_with("Protein Accession,Protein Name,Gen,"));
    }
}
