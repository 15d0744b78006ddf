use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use annotator::api_handler::APIHandler;
use annotator::data_handling::accessions::parse_accession_argument;
use annotator::logging::init_logging;
use annotator::{AnnotatorConfig, Pipeline};

/// Collects UniProt and Ensembl annotations for a list of protein accessions.
#[derive(Parser, Debug)]
#[command(
    name = "annotator",
    version,
    override_usage = "annotator <[Q8N726,O00255,P69905,Q9Y261]> or <pathToFile>"
)]
struct Cli {
    /// Bracketed comma-separated accessions, or a file with one accession per line
    input: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AnnotatorConfig::default();
    let _guard = init_logging(&config.log_file)?;

    let accessions = parse_accession_argument(&cli.input)
        .with_context(|| format!("Failed to read accessions from {}", cli.input))?;
    if accessions.is_empty() {
        bail!("No accessions given in {}", cli.input);
    }
    info!("Starting protein annotation for {} accessions", accessions.len());

    let handler = APIHandler::new(&config.user_agent)?;
    let mut pipeline = Pipeline::new(&handler, &config);
    let table = pipeline
        .run_and_save(&accessions)
        .with_context(|| format!("Annotation run for {} failed", config.output_path.display()))?;

    println!("{}", table);
    Ok(())
}
