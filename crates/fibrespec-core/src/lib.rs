pub mod config;
pub mod error;
pub mod extraction;
pub mod fibre_count;
pub mod model;
pub mod parsing;
pub mod reconcile;
pub mod registry;
pub mod section;

use config::PipelineConfig;
use error::FibreSpecError;
use extraction::{PdfExtractor, RawPage};
use fibre_count::{resolve, CountEvidence, Resolution};
use model::{OutputMetadata, SpecificationOutput, SpecificationRecord, VariantRecords};
use parsing::document_text::capture_headings;
use parsing::read_page_text;
use parsing::tables::TableInterpreter;
use registry::ParameterRegistry;
use tracing::{debug, info, warn};

/// Everything extracted from one document, one record per resolved variant.
#[derive(Debug, Clone)]
pub struct DocumentExtraction {
    pub source_file: String,
    pub resolution: Resolution,
    pub records: VariantRecords,
}

impl DocumentExtraction {
    /// Serializable records for every variant that holds meaningful data,
    /// in resolution order. Empty sections and text blocks are dropped.
    pub fn outputs(&self, config: &PipelineConfig) -> Vec<SpecificationOutput> {
        let processing_date = config.processing_date_string();
        self.records
            .iter()
            .filter(|(_, record)| record.has_meaningful_data())
            .map(|(label, record)| {
                let mut technical_specifications = record.sections.clone();
                technical_specifications.retain(|_, params| !params.is_empty());
                let mut document_content = if config.include_document_content {
                    record.document_text.clone()
                } else {
                    Default::default()
                };
                document_content.retain(|_, blocks| !blocks.is_empty());

                SpecificationOutput {
                    metadata: OutputMetadata {
                        source_file: self.source_file.clone(),
                        fiber_type: *label,
                        processing_date: processing_date.clone(),
                        detected_fiber_counts: self.resolution.labels.clone(),
                    },
                    document_content,
                    technical_specifications,
                }
            })
            .collect()
    }
}

/// Main API entry point: extract per-variant specifications from a PDF.
///
/// Pages the extractor could not read are logged and skipped. An `Err` means
/// the document as a whole could not be read.
pub fn extract_pdf(
    pdf_bytes: &[u8],
    filename: &str,
    extractor: &dyn PdfExtractor,
    registry: &ParameterRegistry,
    config: &PipelineConfig,
) -> Result<DocumentExtraction, FibreSpecError> {
    let extracted = extractor.extract_pages(pdf_bytes)?;
    debug!(
        backend = extractor.backend_name(),
        pages = extracted.len(),
        "extracted pages"
    );

    let pages: Vec<RawPage> = extracted
        .into_iter()
        .enumerate()
        .filter_map(|(i, page)| match page {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(file = filename, page = i + 1, error = %e, "skipping page");
                None
            }
        })
        .collect();

    Ok(process_document(filename, &pages, registry, config))
}

/// Run the pipeline over already-extracted pages.
///
/// Fibre counts are resolved first. Each page is then read in order: heading
/// text, free-text patterns, then tables. Deferred per-tube values are
/// applied and every record is reconciled against the registry at the end.
pub fn process_document(
    filename: &str,
    pages: &[RawPage],
    registry: &ParameterRegistry,
    config: &PipelineConfig,
) -> DocumentExtraction {
    let full_text = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let evidence = CountEvidence::gather(
        filename,
        &full_text,
        pages.iter().flat_map(|p| &p.tables),
        &registry.builtin().fiber_count_patterns,
        config.default_variant,
    );
    let resolution = resolve(&evidence);

    let mut records: VariantRecords = resolution
        .labels
        .iter()
        .map(|label| (*label, SpecificationRecord::default()))
        .collect();

    let mut interpreter = TableInterpreter::new(registry, &resolution.labels);
    for page in pages {
        let headings = capture_headings(&page.text);
        if !headings.is_empty() {
            let key = format!("Page_{}", page.page_number);
            for record in records.values_mut() {
                record.document_text.insert(key.clone(), headings.clone());
            }
        }

        read_page_text(&page.text, &mut records, registry);

        for table in &page.tables {
            interpreter.interpret_table(table, &mut records);
        }
    }
    interpreter.finish(&mut records);

    let moved: usize = records
        .values_mut()
        .map(|record| reconcile::reconcile(record, registry))
        .sum();

    info!(
        file = filename,
        variants = records.len(),
        reconciled = moved,
        "document processed"
    );

    DocumentExtraction {
        source_file: filename.to_string(),
        resolution,
        records,
    }
}
