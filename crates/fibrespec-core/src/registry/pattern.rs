use crate::error::FibreSpecError;
use crate::registry::schema::{GroupSemantics, LabelPatternDef};
use regex::{Regex, RegexBuilder};

/// A compiled label pattern.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    pub regex: Regex,
    pub name: String,
    pub groups: GroupSemantics,
}

impl LabelPattern {
    /// Compile a pattern case-insensitively, resolving its group semantics.
    pub fn compile(
        pattern: &str,
        name: &str,
        groups: Option<GroupSemantics>,
    ) -> Result<LabelPattern, FibreSpecError> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        let groups = groups.unwrap_or_else(|| infer_semantics(name, regex.captures_len() - 1));
        Ok(LabelPattern {
            regex,
            name: name.to_string(),
            groups,
        })
    }

    pub fn from_def(def: &LabelPatternDef) -> Result<LabelPattern, FibreSpecError> {
        LabelPattern::compile(&def.pattern, &def.name, def.groups.clone())
    }
}

/// Pick group semantics for a pattern that does not declare any.
pub fn infer_semantics(name: &str, group_count: usize) -> GroupSemantics {
    let lower = name.to_lowercase();
    if group_count >= 2 {
        if lower.contains("attenuation") {
            return wavelength("Attenuation", "≤ ");
        }
        if lower.contains("mode field diameter") || lower.contains("mfd") {
            return wavelength("MFD", "");
        }
        if lower.contains("chromatic dispersion") {
            return wavelength("Chromatic Dispersion", "≤ ");
        }
        return GroupSemantics::Joined;
    }
    GroupSemantics::Single
}

fn wavelength(prefix: &str, value_prefix: &str) -> GroupSemantics {
    GroupSemantics::Wavelength {
        prefix: prefix.to_string(),
        value_prefix: value_prefix.to_string(),
    }
}

/// Generate an extraction regex for a newly learned parameter name.
pub fn generate_pattern(parameter_name: &str) -> String {
    let lower = parameter_name.to_lowercase();
    let escaped = regex::escape(&lower);
    let spaced = escaped.split_whitespace().collect::<Vec<_>>().join(r"\s+");

    if lower.contains("attenuation") {
        return r"(?:attenuation\s+at\s+)?(\d+\s*nm)\s*≤?\s*([\d.]+\s*dB/km)".to_string();
    }
    if lower.contains("mode field diameter") || lower.contains("mfd") {
        return r"(?:mode\s+field\s+diameter\s+at\s+|mfd\s+at\s+)?(\d+\s*nm)\s+([\d.±\s]+µm)"
            .to_string();
    }
    if lower.contains("chromatic dispersion") {
        return r"(?:chromatic\s+dispersion\s+)?(\d+\s*(?:-\s*\d+)?\s*nm)\s*≤?\s*([\d.]+\s*ps/nm\.km)"
            .to_string();
    }
    if lower.contains("wavelength") {
        return format!(r"(?:{spaced})\s*([\d.-]+\s*nm)");
    }
    if ["diameter", "weight", "length", "radius"]
        .iter()
        .any(|w| lower.contains(w))
    {
        return format!(r"(?:{spaced})[:\s]*([\d.±\s]+\s*(?:mm|kg/km|km|m|µm|nm))");
    }
    if ["strength", "resistance", "force"]
        .iter()
        .any(|w| lower.contains(w))
    {
        return format!(r"(?:{spaced})[:\s]*([\d.±\s]+\s*(?:N|kN|N/mm|N\.m|kg))");
    }

    let mut variations = vec![escaped.clone(), spaced.clone()];
    for (word, loose) in [
        ("fibre", "fib(?:er|re)"),
        ("fiber", "fib(?:er|re)"),
        ("colour", "colou?r"),
        ("diameter", r"dia\.?(?:meter)?"),
    ] {
        if spaced.contains(word) {
            variations.push(spaced.replace(word, loose));
        }
    }
    variations.dedup();
    format!(r"(?:{})[:\s]+([^,\n]+?)\s*(?:,|\n|$)", variations.join("|"))
}
