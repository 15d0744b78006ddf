pub mod ensembl;
pub mod id_mapping;
pub mod uniprot;
