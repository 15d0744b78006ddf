pub mod accessions;
pub mod table_writer;
