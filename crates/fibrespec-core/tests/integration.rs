//! Integration tests for the extract_pdf() end-to-end pipeline.
//!
//! Uses a MockExtractor that returns pre-built pages without invoking
//! pdftotext, so these tests run without poppler-utils.

use chrono::NaiveDate;
use fibrespec_core::config::PipelineConfig;
use fibrespec_core::error::FibreSpecError;
use fibrespec_core::extraction::{PageExtraction, PdfExtractor, RawPage, Table};
use fibrespec_core::model::{ParamValue, SpecificationOutput, VariantLabel};
use fibrespec_core::registry::ParameterRegistry;
use fibrespec_core::{extract_pdf, process_document};
use std::sync::Arc;

struct MockExtractor {
    pages: Vec<RawPage>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, FibreSpecError> {
        Ok(self.pages.iter().cloned().map(Ok).collect())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct FailingExtractor;

impl PdfExtractor for FailingExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, FibreSpecError> {
        Err(FibreSpecError::Extraction("not a PDF".into()))
    }

    fn backend_name(&self) -> &str {
        "failing"
    }
}

fn page(number: usize, text: &str, tables: Vec<Table>) -> RawPage {
    RawPage {
        page_number: number,
        text: text.to_string(),
        tables,
    }
}

fn table(rows: &[&[&str]]) -> Table {
    rows.iter()
        .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
        .collect()
}

fn label(n: u32) -> VariantLabel {
    VariantLabel::new(n).unwrap()
}

fn config() -> PipelineConfig {
    PipelineConfig {
        processing_date: NaiveDate::from_ymd_opt(2024, 5, 1),
        ..PipelineConfig::default()
    }
}

fn output_for(outputs: &[SpecificationOutput], n: u32) -> &SpecificationOutput {
    outputs
        .iter()
        .find(|o| o.metadata.fiber_type == label(n))
        .unwrap_or_else(|| panic!("no output for {n}F"))
}

// ---------------------------------------------------------------------------
// Test 1: Two variants, shared attenuation text, per-variant diameters
// ---------------------------------------------------------------------------
#[test]
fn two_variants_from_filename_and_header_row() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let extractor = MockExtractor {
        pages: vec![
            page(
                1,
                "TECHNICAL SPECIFICATION\nLoose tube cable for duct installation",
                vec![table(&[
                    &["Fibre Count", "24F", "96F"],
                    &["Cable Diameter", "8.5 mm", "10.2 mm"],
                ])],
            ),
            page(
                2,
                "OPTICAL CHARACTERISTICS\nAttenuation at 1550 nm ≤ 0.20 dB/km",
                vec![],
            ),
        ],
    };

    let doc = extract_pdf(&[], "Cable_24F96F.pdf", &extractor, &registry, &config()).unwrap();
    let outputs = doc.outputs(&config());

    assert_eq!(outputs.len(), 2);
    let f24 = output_for(&outputs, 24);
    let f96 = output_for(&outputs, 96);

    assert_eq!(f24.text("Cable Construction", "Cable Diameter"), Some("8.5 mm"));
    assert_eq!(f96.text("Cable Construction", "Cable Diameter"), Some("10.2 mm"));
    for out in [f24, f96] {
        assert_eq!(
            out.text("Fiber Characteristics", "Attenuation at 1550 nm"),
            Some("≤ 0.20 dB/km")
        );
        assert_eq!(out.metadata.source_file, "Cable_24F96F.pdf");
        assert_eq!(out.metadata.processing_date, "2024-05-01");
        assert_eq!(out.metadata.detected_fiber_counts.len(), 2);
        assert_eq!(
            out.document_content["Page_2"]["OPTICAL CHARACTERISTICS"],
            "Attenuation at 1550 nm ≤ 0.20 dB/km"
        );
    }
    assert_eq!(f24.text("Cable Construction", "Fiber Count"), Some("24"));
    assert_eq!(f96.text("Cable Construction", "Fiber Count"), Some("96"));
}

// ---------------------------------------------------------------------------
// Test 2: Whitespace-only document yields no records
// ---------------------------------------------------------------------------
#[test]
fn whitespace_document_yields_nothing() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let extractor = MockExtractor {
        pages: vec![page(1, "   \n\n  ", vec![]), page(2, "", vec![])],
    };

    let doc = extract_pdf(&[], "blank.pdf", &extractor, &registry, &config()).unwrap();
    assert_eq!(doc.resolution.labels, vec![label(24)]);
    assert!(doc.outputs(&config()).is_empty());
}

// ---------------------------------------------------------------------------
// Test 3: Text-only counts are dropped when the filename disagrees
// ---------------------------------------------------------------------------
#[test]
fn filename_count_outranks_uncorroborated_text() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let pages = vec![page(
        1,
        "CABLE DATA\nAlso available as 96F fibre cable",
        vec![],
    )];

    let doc = process_document("Cable_24F.pdf", &pages, &registry, &config());
    assert_eq!(doc.resolution.labels, vec![label(24)]);
    assert_eq!(doc.outputs(&config()).len(), 1);
}

// ---------------------------------------------------------------------------
// Test 4: Counts outside the allow-list never become variants
// ---------------------------------------------------------------------------
#[test]
fn disallowed_counts_fall_back_to_default() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let pages = vec![page(1, "CABLE DATA\n37F fibre design", vec![])];

    let doc = process_document("Cable_37F.pdf", &pages, &registry, &config());
    assert_eq!(doc.resolution.labels, vec![label(24)]);
}

// ---------------------------------------------------------------------------
// Test 5: Construction arithmetic resolves the count without a filename hint
// ---------------------------------------------------------------------------
#[test]
fn construction_table_resolves_count() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let pages = vec![page(
        1,
        "",
        vec![table(&[
            &["Number of Loose Tubes", "4"],
            &["Fibres per Tube", "12"],
        ])],
    )];

    let doc = process_document("datasheet.pdf", &pages, &registry, &config());
    assert_eq!(doc.resolution.labels, vec![label(48)]);
    let outputs = doc.outputs(&config());
    assert_eq!(
        outputs[0].text("Cable Construction", "Number Of Loose Tubes"),
        Some("4")
    );
}

// ---------------------------------------------------------------------------
// Test 6: Shared colour table is truncated to each variant's fibre count
// ---------------------------------------------------------------------------
#[test]
fn colour_table_truncated_per_variant() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let pages = vec![page(
        1,
        "COLOUR CODE\nFibre Count 1 2 3 4 5 6 7 8 9 10 11 12\nFibre Colour Bl Or Gr Br Sl Wh Rd Bk Yl Vi Pk Aq\n",
        vec![],
    )];

    let doc = process_document("Drop_6F12F.pdf", &pages, &registry, &config());
    let outputs = doc.outputs(&config());
    let colours = |n: u32| match &output_for(&outputs, n).technical_specifications["Colour Coding"]
        ["Fibre Colour"]
    {
        ParamValue::Colours(c) => c.clone(),
        other => panic!("expected colours, got {other:?}"),
    };

    let six = colours(6);
    assert_eq!(six.len(), 6);
    assert!(six.keys().all(|k| k.parse::<u32>().unwrap() <= 6));
    assert_eq!(six["6"], "White");
    assert_eq!(colours(12)["12"], "Aqua");
}

// ---------------------------------------------------------------------------
// Test 7: Failed pages are skipped, unreadable documents are errors
// ---------------------------------------------------------------------------
#[test]
fn failed_page_is_skipped() {
    struct OnePageFails;

    impl PdfExtractor for OnePageFails {
        fn extract_pages(&self, _: &[u8]) -> Result<Vec<PageExtraction>, FibreSpecError> {
            Ok(vec![
                Err(FibreSpecError::PageExtraction {
                    page: 1,
                    reason: "garbled".into(),
                }),
                Ok(page(2, "MECHANICAL\nTorsion ±180 ° IEC-60794-1-21-E7", vec![])),
            ])
        }

        fn backend_name(&self) -> &str {
            "one-page-fails"
        }
    }

    let registry = ParameterRegistry::in_memory().unwrap();
    let doc = extract_pdf(&[], "Cable_12F.pdf", &OnePageFails, &registry, &config()).unwrap();
    let outputs = doc.outputs(&config());
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].text("Cable Characteristics", "Torsion"), Some("±180 °"));
}

#[test]
fn unreadable_document_is_error() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let result = extract_pdf(&[], "broken.pdf", &FailingExtractor, &registry, &config());
    assert!(matches!(result, Err(FibreSpecError::Extraction(_))));
}

// ---------------------------------------------------------------------------
// Test 8: Every parameter ends up in its registry section
// ---------------------------------------------------------------------------
#[test]
fn reconciled_sections_match_registry() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let pages = vec![page(
        1,
        "Installation -10 °C to +50 °C\nOperation -40 °C to +70 °C\n1310 nm ≤ 0.35 dB/km",
        vec![table(&[
            &["Mechanical properties", ""],
            &["Crush Resistance", "2000 N/10 cm"],
            &["Outer Sheath", "HDPE black"],
            &["Zq Rating", "Grade 1"],
        ])],
    )];

    let doc = process_document("Cable_24F.pdf", &pages, &registry, &config());
    for record in doc.records.values() {
        for (section, params) in &record.sections {
            for name in params.keys() {
                assert_eq!(&registry.categorize_parameter(name), section, "{name}");
            }
        }
    }
    let out = &doc.outputs(&config())[0];
    assert_eq!(
        out.text("Cable Characteristics", "Installation Temperature"),
        Some("-10 °C to +50 °C")
    );
    assert_eq!(
        out.text("Fiber Characteristics", "Attenuation at 1310 nm"),
        Some("≤ 0.35 dB/km")
    );
}

// ---------------------------------------------------------------------------
// Test 9: Per-tube counts come from the mapped column
// ---------------------------------------------------------------------------
#[test]
fn per_tube_values_follow_column_mapping() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let pages = vec![page(
        1,
        "",
        vec![table(&[
            &["Fibre Count", "24F", "96F"],
            &["Number of Fibres per Tube", "6", "12"],
            &["Number of Loose Tubes", "4", "8"],
        ])],
    )];

    let doc = process_document("Cable_24F_96F.pdf", &pages, &registry, &config());
    let outputs = doc.outputs(&config());
    let f24 = output_for(&outputs, 24);
    let f96 = output_for(&outputs, 96);
    assert_eq!(f24.text("Cable Construction", "Number Of Fibres Per Tube"), Some("6"));
    assert_eq!(f96.text("Cable Construction", "Number Of Fibres Per Tube"), Some("12"));
    assert_eq!(f96.text("Cable Construction", "Number Of Loose Tubes"), Some("8"));
}

// ---------------------------------------------------------------------------
// Test 10: Document content can be left out of the output
// ---------------------------------------------------------------------------
#[test]
fn document_content_can_be_omitted() {
    let registry = ParameterRegistry::in_memory().unwrap();
    let pages = vec![page(1, "GENERAL\nTorsion ±180 °", vec![])];
    let config = PipelineConfig {
        include_document_content: false,
        ..config()
    };

    let doc = process_document("Cable_24F.pdf", &pages, &registry, &config);
    let outputs = doc.outputs(&config);
    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].document_content.is_empty());
    assert!(!outputs[0].technical_specifications.is_empty());
}

// ---------------------------------------------------------------------------
// Test 11: Learned parameters persist and are shared across documents
// ---------------------------------------------------------------------------
#[test]
fn learned_parameters_persist_across_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynamic_parameters.json");
    let registry = Arc::new(ParameterRegistry::open(&path).unwrap());

    let docs: Vec<Vec<RawPage>> = (0..4)
        .map(|i| {
            let name = format!("Zq Rating {i}");
            vec![page(
                1,
                "",
                vec![table(&[
                    &["Outer Sheath", "HDPE"],
                    &[name.as_str(), "attenuation grade"],
                ])],
            )]
        })
        .collect();

    std::thread::scope(|s| {
        for (i, pages) in docs.iter().enumerate() {
            let registry = Arc::clone(&registry);
            s.spawn(move || {
                process_document(&format!("doc{i}_24F.pdf"), pages, &registry, &config());
            });
        }
    });

    let reopened = ParameterRegistry::open(&path).unwrap();
    let overlay = reopened.overlay();
    let learned = &overlay.parameters["Optical Characteristics"];
    for i in 0..4 {
        assert!(learned.contains(&format!("Zq Rating {i}")), "{learned:?}");
    }
}
