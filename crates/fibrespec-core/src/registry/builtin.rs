use crate::error::FibreSpecError;
use crate::registry::pattern::LabelPattern;
use crate::registry::schema::{BuiltinDef, EnhancedMode};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

const BUILTIN_JSON: &str = include_str!("../../../../registry/builtin.json");

/// Parse the static registry definition shipped with the crate.
pub fn load_builtin_def() -> Result<BuiltinDef, FibreSpecError> {
    let def: BuiltinDef = serde_json::from_str(BUILTIN_JSON)?;
    Ok(def)
}

/// A keyword-pattern compiled from the enhanced library.
#[derive(Debug, Clone)]
pub struct EnhancedPattern {
    pub key: String,
    pub regex: Regex,
    pub name: String,
    pub mode: EnhancedMode,
}

/// The static registry with every keyword lower-cased and every pattern compiled.
#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    pub section_keywords: IndexMap<String, Vec<String>>,
    pub parameter_categories: IndexMap<String, Vec<String>>,
    pub fallback_keywords: IndexMap<String, Vec<String>>,
    pub stop_words: Vec<String>,
    pub label_patterns: Vec<LabelPattern>,
    pub enhanced_patterns: Vec<EnhancedPattern>,
    pub fiber_count_patterns: Vec<Regex>,
    pub colour_codes: IndexMap<String, String>,
}

impl BuiltinRegistry {
    pub fn load() -> Result<BuiltinRegistry, FibreSpecError> {
        BuiltinRegistry::compile(load_builtin_def()?)
    }

    pub fn compile(def: BuiltinDef) -> Result<BuiltinRegistry, FibreSpecError> {
        if def.section_keywords.is_empty() {
            return Err(FibreSpecError::RegistryInvalid(
                "section_keywords must not be empty".into(),
            ));
        }

        let label_patterns = def
            .label_patterns
            .iter()
            .map(LabelPattern::from_def)
            .collect::<Result<Vec<_>, _>>()?;

        // Enhanced patterns spell their keywords exactly as datasheets print them.
        let enhanced_patterns = def
            .enhanced_patterns
            .iter()
            .map(|p| {
                Ok(EnhancedPattern {
                    key: p.key.clone(),
                    regex: Regex::new(&p.pattern)?,
                    name: p.name.clone(),
                    mode: p.mode.clone(),
                })
            })
            .collect::<Result<Vec<_>, FibreSpecError>>()?;

        let fiber_count_patterns = def
            .fiber_count_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BuiltinRegistry {
            section_keywords: lowercase_lists(def.section_keywords),
            parameter_categories: lowercase_lists(def.parameter_categories),
            fallback_keywords: lowercase_lists(def.fallback_keywords),
            stop_words: def.keyword_stop_words.iter().map(|w| w.to_lowercase()).collect(),
            label_patterns,
            enhanced_patterns,
            fiber_count_patterns,
            colour_codes: def
                .colour_codes
                .into_iter()
                .map(|(code, name)| (code.to_lowercase(), name))
                .collect(),
        })
    }

    /// Static section whose parameter list contains `name` exactly (case-insensitive).
    pub fn exact_category(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.parameter_categories
            .iter()
            .find(|(_, params)| params.iter().any(|p| *p == lower))
            .map(|(section, _)| section.as_str())
    }

    pub fn colour_name(&self, code: &str) -> Option<&str> {
        self.colour_codes.get(&code.to_lowercase()).map(String::as_str)
    }
}

fn lowercase_lists(map: IndexMap<String, Vec<String>>) -> IndexMap<String, Vec<String>> {
    map.into_iter()
        .map(|(section, words)| {
            (
                section,
                words.into_iter().map(|w| w.to_lowercase()).collect(),
            )
        })
        .collect()
}
