use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::error::AnnotatorError;

/// Accessions from the single CLI argument: a path to a newline-delimited
/// file, or an inline list such as `[Q8N726,O00255,P69905]`.
pub fn parse_accession_argument(argument: &str) -> Result<Vec<String>, AnnotatorError> {
    let path = Path::new(argument.trim());
    if path.is_file() {
        return read_accession_file(path);
    }

    let looks_like_file = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    if looks_like_file {
        return Err(AnnotatorError::Input(format!("accession file {} not found", path.display())));
    }

    Ok(parse_accession_list(argument))
}

pub fn parse_accession_list(list: &str) -> Vec<String> {
    list.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|id| id.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

/// One accession per line; blank lines and `#` comments are ignored.
pub fn read_accession_file(path: &Path) -> Result<Vec<String>, AnnotatorError> {
    info!("Reading accessions from {}", path.display());
    let reader = BufReader::new(File::open(path)?);

    let mut accessions = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if id.is_empty() || id.starts_with('#') {
            continue;
        }
        accessions.push(id.to_string());
    }
    Ok(accessions)
}
