pub mod colour;
pub mod document_text;
pub mod normalize;
pub mod tables;
pub mod text_patterns;

use crate::model::{ParamValue, VariantRecords};
use crate::registry::ParameterRegistry;
use crate::section::COLOUR_CODING;
use colour::decode_tabular;
use text_patterns::{extract_enhanced, extract_labelled};

/// Parameter name for colours decoded from a "Fibre Count / Fibre Colour" table.
pub const FIBRE_COLOUR: &str = "Fibre Colour";

/// Read one page's free text into every variant record.
///
/// The tabular colour sequence is truncated to each variant's fibre count.
/// Label-pattern values only land on parameters a record does not hold yet;
/// enhanced-pattern values only fill empty or blank slots.
pub fn read_page_text(page_text: &str, records: &mut VariantRecords, registry: &ParameterRegistry) {
    if page_text.trim().is_empty() {
        return;
    }

    for (label, record) in records.iter_mut() {
        let colours = decode_tabular(page_text, label.count(), registry.builtin());
        if !colours.is_empty() {
            record.insert(COLOUR_CODING, FIBRE_COLOUR, ParamValue::Colours(colours));
        }
    }

    let labelled = extract_labelled(page_text, registry);
    for (section, params) in &labelled {
        for (name, value) in params {
            for record in records.values_mut() {
                if !record.contains_param(name) {
                    record.insert(section, name, ParamValue::Text(value.clone()));
                }
            }
        }
    }

    for finding in extract_enhanced(page_text, registry) {
        for record in records.values_mut() {
            record.insert_if_vacant(
                &finding.section,
                &finding.name,
                ParamValue::Text(finding.value.clone()),
            );
        }
    }
}
