use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The static registry shipped in `registry/builtin.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDef {
    /// Section -> keywords, in declaration order. Earlier sections win ties.
    pub section_keywords: IndexMap<String, Vec<String>>,
    /// Section -> canonical parameter names.
    pub parameter_categories: IndexMap<String, Vec<String>>,
    /// Second-chance keyword net consulted when no section keyword matches.
    pub fallback_keywords: IndexMap<String, Vec<String>>,
    /// Words never learned as section keywords.
    pub keyword_stop_words: Vec<String>,
    pub label_patterns: Vec<LabelPatternDef>,
    pub enhanced_patterns: Vec<EnhancedPatternDef>,
    pub fiber_count_patterns: Vec<String>,
    /// Lower-case colour abbreviation -> colour name.
    pub colour_codes: IndexMap<String, String>,
}

/// A (regex, canonical name) pair from the label-pattern library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelPatternDef {
    pub pattern: String,
    pub name: String,
    /// How capture groups become a parameter name and value. Inferred from the
    /// name and group count when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<GroupSemantics>,
}

/// How a label pattern's capture groups map onto (name, value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupSemantics {
    /// One capture: the value of the canonical name.
    Single,
    /// Two captures: `"{prefix} at {g1}"` -> `"{value_prefix}{g2}"`.
    Wavelength {
        prefix: String,
        #[serde(default)]
        value_prefix: String,
    },
    /// All captures joined with a space.
    Joined,
}

/// A keyword pattern whose matches only fill empty slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedPatternDef {
    pub key: String,
    pub pattern: String,
    pub name: String,
    #[serde(default)]
    pub mode: EnhancedMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnhancedMode {
    /// First match, first capture group.
    #[default]
    First,
    /// Two captures rendered as `"Installation: {g1} Operation: {g2}"`.
    InstallationOperation,
    /// Every match yields `"{label} at {g1} nm"` with `value_template`'s
    /// `{value}` replaced by the second capture.
    PerWavelength {
        label: String,
        value_template: String,
    },
}

/// The persisted, mutable addendum to the static registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOverlay {
    /// Section -> learned parameter names.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Vec<String>>,
    /// `[regex, canonical name]` pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<(String, String)>,
    /// Section -> learned keywords.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub section_keywords: IndexMap<String, Vec<String>>,
    /// Parameter name -> free-text description.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub descriptions: IndexMap<String, String>,
}
