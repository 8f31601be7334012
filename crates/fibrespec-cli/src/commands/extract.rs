use chrono::NaiveDate;
use fibrespec_core::config::PipelineConfig;
use fibrespec_core::error::FibreSpecError;
use fibrespec_core::extraction::pdftotext::PdftotextExtractor;
use fibrespec_core::model::SpecificationOutput;
use fibrespec_core::registry::ParameterRegistry;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::commands::registry;
use crate::output;

/// Outputs for one input file. Empty when the document could not be read.
pub struct FileResult {
    pub path: PathBuf,
    pub outputs: Vec<SpecificationOutput>,
}

pub fn run(
    files: Vec<PathBuf>,
    output_format: &str,
    out_dir: Option<PathBuf>,
    date: Option<NaiveDate>,
    no_text: bool,
    registry_path: &Path,
    no_persist: bool,
) -> Result<(), FibreSpecError> {
    if !PdftotextExtractor::is_available() {
        return Err(FibreSpecError::PdftotextNotFound);
    }

    let registry = Arc::new(registry::open(registry_path, no_persist)?);
    let extractor = PdftotextExtractor::new();
    let config = PipelineConfig {
        processing_date: date,
        include_document_content: !no_text,
        ..PipelineConfig::default()
    };

    let results: Vec<FileResult> = files
        .par_iter()
        .map(|path| FileResult {
            path: path.clone(),
            outputs: extract_file(path, &extractor, &registry, &config),
        })
        .collect();

    match out_dir {
        Some(dir) => write_files(&dir, &results)?,
        None => match output_format {
            "json" => {
                let all: Vec<&SpecificationOutput> =
                    results.iter().flat_map(|r| &r.outputs).collect();
                output::json::print(&all)?
            }
            _ => output::table::print(&results),
        },
    }

    Ok(())
}

/// Run one file through the pipeline. Failures are logged and yield nothing
/// so the rest of the batch carries on.
fn extract_file(
    path: &Path,
    extractor: &PdftotextExtractor,
    registry: &ParameterRegistry,
    config: &PipelineConfig,
) -> Vec<SpecificationOutput> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let result = std::fs::read(path)
        .map_err(FibreSpecError::from)
        .and_then(|bytes| fibrespec_core::extract_pdf(&bytes, &filename, extractor, registry, config));

    match result {
        Ok(doc) => doc.outputs(config),
        Err(e) => {
            error!(file = %path.display(), error = %e, "document could not be processed");
            Vec::new()
        }
    }
}

fn write_files(dir: &Path, results: &[FileResult]) -> Result<(), FibreSpecError> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;
    for result in results {
        let stem = result
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        for out in &result.outputs {
            let target = dir.join(format!("{stem}_{}.json", out.metadata.fiber_type));
            std::fs::write(&target, serde_json::to_string_pretty(out)?)?;
            info!(file = %target.display(), "wrote specification");
            written += 1;
        }
    }
    eprintln!(
        "Processed {} file(s), wrote {} specification(s) to {}",
        results.len(),
        written,
        dir.display()
    );
    Ok(())
}
