use crate::parsing::normalize::clean_value;
use crate::registry::builtin::EnhancedPattern;
use crate::registry::pattern::LabelPattern;
use crate::registry::schema::{EnhancedMode, GroupSemantics};
use crate::registry::ParameterRegistry;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static WAVELENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)(?:\s*-\s*(\d+))?\s*(?:nm)?$").expect("valid regex")
});

/// A value recovered from page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFinding {
    pub section: String,
    pub name: String,
    pub value: String,
}

/// Run the label-pattern library (static then learned) over page text.
///
/// Returns section -> parameter -> value. A later match of the same name
/// replaces an earlier one.
pub fn extract_labelled(
    page_text: &str,
    registry: &ParameterRegistry,
) -> IndexMap<String, IndexMap<String, String>> {
    let mut found: IndexMap<String, IndexMap<String, String>> = IndexMap::new();

    for pattern in registry.label_patterns() {
        for caps in pattern.regex.captures_iter(page_text) {
            let Some((name, value)) = interpret_label_match(&pattern, &caps) else {
                continue;
            };
            let section = registry.ensure_parameter_exists(&name, Some(&value));
            registry.add_parameter_if_new(&name, Some(&section), None, None);
            found.entry(section).or_default().insert(name, value);
        }
    }
    found
}

/// Turn one match into (parameter name, cleaned value) per the pattern's group
/// semantics. Matches that clean to nothing are dropped.
pub fn interpret_label_match(pattern: &LabelPattern, caps: &Captures) -> Option<(String, String)> {
    let group = |i: usize| caps.get(i).map(|m| m.as_str().trim());

    let (name, value) = match &pattern.groups {
        GroupSemantics::Wavelength {
            prefix,
            value_prefix,
        } => {
            let wavelength = group(1)?;
            let reading = group(2)?;
            (
                wavelength_name(prefix, wavelength),
                clean_value(&format!("{value_prefix}{reading}")),
            )
        }
        GroupSemantics::Single => {
            let raw = group(1).or_else(|| group(0))?;
            (canonical_name(&pattern.name), clean_value(raw))
        }
        GroupSemantics::Joined => {
            let parts: Vec<&str> = (1..caps.len()).filter_map(group).collect();
            let joined = if parts.is_empty() {
                group(0)?.to_string()
            } else {
                parts.join(" ")
            };
            (pattern.name.clone(), clean_value(&joined))
        }
    };

    if value.is_empty() || name.trim().is_empty() {
        return None;
    }
    Some((name, value))
}

/// `"<label> at <n> nm"`, however the page spaced the wavelength.
fn wavelength_name(label: &str, raw: &str) -> String {
    let raw = raw.trim();
    match WAVELENGTH.captures(raw) {
        Some(caps) => match caps.get(2) {
            Some(upper) => format!("{label} at {}-{} nm", &caps[1], upper.as_str()),
            None => format!("{label} at {} nm", &caps[1]),
        },
        None => format!("{label} at {raw}"),
    }
}

/// Renames applied to single-capture pattern names.
fn canonical_name(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.contains("environmental_installation") || lower.contains("installation_temp") {
        "Installation Temperature".to_string()
    } else if lower.contains("environmental_operation") || lower.contains("operation_temp") {
        "Operation Temperature".to_string()
    } else if lower.contains("environmental_storage") || lower.contains("storage_temp") {
        "Storage Temperature".to_string()
    } else if lower.contains("tensile_strength_max") {
        "Max. Tensile Strength".to_string()
    } else {
        name.to_string()
    }
}

/// Run the enhanced keyword patterns over page text.
///
/// Findings are meant to fill only empty or blank slots.
pub fn extract_enhanced(page_text: &str, registry: &ParameterRegistry) -> Vec<TextFinding> {
    let mut findings = Vec::new();

    for pattern in &registry.builtin().enhanced_patterns {
        for (name, value) in enhanced_matches(pattern, page_text) {
            if value.is_empty() {
                continue;
            }
            let section = registry.categorize_parameter(&pattern.name);
            registry.add_parameter_if_new(&name, Some(&section), None, None);
            debug!(key = %pattern.key, parameter = %name, "enhanced pattern matched");
            findings.push(TextFinding {
                section,
                name,
                value,
            });
        }
    }
    findings
}

fn enhanced_matches(pattern: &EnhancedPattern, text: &str) -> Vec<(String, String)> {
    match &pattern.mode {
        EnhancedMode::First => pattern
            .regex
            .captures(text)
            .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
            .map(|v| vec![(pattern.name.clone(), clean_value(&v))])
            .unwrap_or_default(),
        EnhancedMode::InstallationOperation => pattern
            .regex
            .captures(text)
            .and_then(|c| {
                let installation = c.get(1)?.as_str().trim();
                let operation = c.get(2)?.as_str().trim();
                Some(clean_value(&format!(
                    "Installation: {installation} Operation: {operation}"
                )))
            })
            .map(|v| vec![(pattern.name.clone(), v)])
            .unwrap_or_default(),
        EnhancedMode::PerWavelength {
            label,
            value_template,
        } => pattern
            .regex
            .captures_iter(text)
            .filter_map(|c| {
                let wavelength = c.get(1)?.as_str().trim();
                let reading = c.get(2)?.as_str().trim();
                Some((
                    wavelength_name(label, wavelength),
                    clean_value(&value_template.replace("{value}", reading)),
                ))
            })
            .collect(),
    }
}
