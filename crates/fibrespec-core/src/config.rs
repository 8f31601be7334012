use crate::model::VariantLabel;
use chrono::{Local, NaiveDate};

/// Per-run pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Variant assumed when no fibre count can be resolved.
    pub default_variant: VariantLabel,
    /// Date stamped into output metadata. Today's local date when `None`.
    pub processing_date: Option<NaiveDate>,
    pub include_document_content: bool,
}

impl PipelineConfig {
    /// ISO date string for output metadata.
    pub fn processing_date_string(&self) -> String {
        self.processing_date
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y-%m-%d")
            .to_string()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            default_variant: VariantLabel::DEFAULT,
            processing_date: None,
            include_document_content: true,
        }
    }
}
