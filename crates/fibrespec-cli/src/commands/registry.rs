use fibrespec_core::error::FibreSpecError;
use fibrespec_core::registry::pattern::LabelPattern;
use fibrespec_core::registry::{validate_overlay_file, ParameterRegistry};
use std::path::Path;

/// Open the registry the CLI flags describe.
pub fn open(path: &Path, no_persist: bool) -> Result<ParameterRegistry, FibreSpecError> {
    if no_persist {
        ParameterRegistry::in_memory()
    } else {
        ParameterRegistry::open(path)
    }
}

pub fn list(registry: &ParameterRegistry) -> Result<(), FibreSpecError> {
    println!("Registry ({})\n", registry.store_description());
    for section in registry.sections() {
        println!(
            "  {:<28} {:>3} built-in  {:>3} learned",
            section.name, section.static_parameters, section.dynamic_parameters
        );
        if !section.keywords.is_empty() {
            println!("      keywords: {}", section.keywords.join(", "));
        }
    }
    Ok(())
}

pub fn classify(registry: &ParameterRegistry, name: &str) -> Result<(), FibreSpecError> {
    println!("  as parameter: {}", registry.categorize_parameter(name));
    println!("  as text:      {}", registry.classify(name));
    Ok(())
}

pub fn add(
    registry: &ParameterRegistry,
    name: &str,
    section: Option<&str>,
    pattern: Option<&str>,
    description: Option<&str>,
) -> Result<(), FibreSpecError> {
    if name.trim().is_empty() {
        return Err(FibreSpecError::RegistryInvalid(
            "parameter name must not be empty".into(),
        ));
    }
    // The registry discards bad patterns with a warning; reject them up front here.
    if let Some(p) = pattern {
        LabelPattern::compile(p, name, None)?;
    }
    let filed = registry.add_parameter_if_new(name, section, pattern, description);
    println!("{} -> {}", name.trim(), filed);
    Ok(())
}

pub fn patterns(registry: &ParameterRegistry) -> Result<(), FibreSpecError> {
    let builtin = registry.builtin().label_patterns.len();
    for (i, pattern) in registry.label_patterns().iter().enumerate() {
        let origin = if i < builtin { "built-in" } else { "learned" };
        println!("  [{origin}] {}\n      {}", pattern.name, pattern.regex.as_str());
    }
    Ok(())
}

pub fn validate(path: &Path) -> Result<(), FibreSpecError> {
    let overlay = validate_overlay_file(path)?;
    let params: usize = overlay.parameters.values().map(Vec::len).sum();
    println!(
        "Valid overlay: {} parameter(s) in {} section(s), {} pattern(s)",
        params,
        overlay.parameters.len(),
        overlay.patterns.len()
    );
    Ok(())
}
