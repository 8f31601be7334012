use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fibre counts a datasheet variant may carry. Anything else is treated as a misread.
pub const ALLOWED_FIBRE_COUNTS: [u32; 10] = [2, 4, 6, 8, 12, 24, 48, 96, 144, 288];

/// Ordered fibre-number -> colour-name mapping ("1" -> "Blue", ...).
pub type ColourMap = IndexMap<String, String>;

/// Section name -> parameter name -> value.
pub type SectionMap = IndexMap<String, IndexMap<String, ParamValue>>;

/// Page key ("Page_1") -> heading -> joined paragraph text.
pub type DocumentText = IndexMap<String, IndexMap<String, String>>;

/// One record per resolved variant, in resolution order.
pub type VariantRecords = IndexMap<VariantLabel, SpecificationRecord>;

/// A fibre-count identifier such as `24F`.
///
/// Construction goes through [`VariantLabel::new`], so a label always holds an
/// allow-listed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantLabel(u32);

impl VariantLabel {
    /// `24F`, used when nothing else resolves.
    pub const DEFAULT: VariantLabel = VariantLabel(24);

    pub fn new(count: u32) -> Option<VariantLabel> {
        ALLOWED_FIBRE_COUNTS
            .contains(&count)
            .then_some(VariantLabel(count))
    }

    /// Parse "24F" / "24f" / " 24F ".
    pub fn parse(s: &str) -> Option<VariantLabel> {
        let s = s.trim();
        let digits = s.strip_suffix('F').or_else(|| s.strip_suffix('f'))?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        VariantLabel::new(digits.parse().ok()?)
    }

    pub fn count(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VariantLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}F", self.0)
    }
}

impl From<VariantLabel> for String {
    fn from(label: VariantLabel) -> String {
        label.to_string()
    }
}

impl TryFrom<String> for VariantLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VariantLabel::parse(&value).ok_or_else(|| format!("'{value}' is not a valid fibre count"))
    }
}

/// A parameter value: plain text, or a decoded colour sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Colours(ColourMap),
}

impl ParamValue {
    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Text(s) => s.trim().is_empty(),
            ParamValue::Colours(m) => m.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Colours(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{s}"),
            ParamValue::Colours(m) => {
                let parts: Vec<String> = m.iter().map(|(n, c)| format!("{n}:{c}")).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

/// Everything extracted for one variant of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecificationRecord {
    pub document_text: DocumentText,
    pub sections: SectionMap,
}

impl SpecificationRecord {
    pub fn get(&self, section: &str, param: &str) -> Option<&ParamValue> {
        self.sections.get(section)?.get(param)
    }

    pub fn section_mut(&mut self, section: &str) -> &mut IndexMap<String, ParamValue> {
        self.sections.entry(section.to_string()).or_default()
    }

    pub fn insert(&mut self, section: &str, param: &str, value: ParamValue) {
        self.section_mut(section).insert(param.to_string(), value);
    }

    /// Insert only when the slot is missing or holds a blank value.
    pub fn insert_if_vacant(&mut self, section: &str, param: &str, value: ParamValue) -> bool {
        let slot = self.section_mut(section);
        match slot.get(param) {
            Some(existing) if !existing.is_blank() => false,
            _ => {
                slot.insert(param.to_string(), value);
                true
            }
        }
    }

    pub fn remove(&mut self, section: &str, param: &str) -> Option<ParamValue> {
        self.sections.get_mut(section)?.shift_remove(param)
    }

    /// Write `param` under `section`, first removing it from any other section.
    pub fn file_under(&mut self, section: &str, param: &str, value: ParamValue) {
        for other in self.sections_containing(param) {
            if other != section {
                self.remove(&other, param);
            }
        }
        self.insert(section, param, value);
    }

    /// Whether any section holds `param`.
    pub fn contains_param(&self, param: &str) -> bool {
        self.sections.values().any(|params| params.contains_key(param))
    }

    /// Sections currently holding `param`, in section order.
    pub fn sections_containing(&self, param: &str) -> Vec<String> {
        self.sections
            .iter()
            .filter(|(_, params)| params.contains_key(param))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn has_meaningful_data(&self) -> bool {
        self.sections.values().any(|params| !params.is_empty())
            || self.document_text.values().any(|blocks| !blocks.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub source_file: String,
    pub fiber_type: VariantLabel,
    pub processing_date: String,
    pub detected_fiber_counts: Vec<VariantLabel>,
}

/// The serialized per-variant result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationOutput {
    pub metadata: OutputMetadata,
    pub document_content: DocumentText,
    pub technical_specifications: SectionMap,
}

impl SpecificationOutput {
    /// Technical value as text, if present and textual.
    pub fn text(&self, section: &str, param: &str) -> Option<&str> {
        self.technical_specifications
            .get(section)?
            .get(param)?
            .as_text()
    }
}
