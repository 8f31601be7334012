pub mod builtin;
pub mod pattern;
pub mod schema;
pub mod store;

use crate::error::FibreSpecError;
use crate::section::{
    first_keyword_section, overlaps_parameter_list, KeywordGroup, GENERAL_INFORMATION,
};
use builtin::BuiltinRegistry;
use parking_lot::RwLock;
use pattern::{generate_pattern, LabelPattern};
use schema::RegistryOverlay;
use std::path::Path;
use std::sync::Arc;
use store::{FileStore, MemoryStore, OverlayStore};
use tracing::{debug, error, info, warn};

/// Section classification service: the static registry plus a learned overlay
/// that is flushed to its store after every mutation.
///
/// Readers share the overlay concurrently; a mutation holds the write lock
/// across both the change and the flush, so concurrent documents never
/// interleave partial overlays on disk.
pub struct ParameterRegistry {
    builtin: BuiltinRegistry,
    state: RwLock<DynamicState>,
    store: Arc<dyn OverlayStore>,
}

struct DynamicState {
    overlay: RegistryOverlay,
    patterns: Vec<LabelPattern>,
}

/// Per-section counts for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub name: String,
    pub static_parameters: usize,
    pub dynamic_parameters: usize,
    pub keywords: Vec<String>,
}

impl ParameterRegistry {
    /// Open a registry backed by an overlay file (created on first flush).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FibreSpecError> {
        Self::with_store(Arc::new(FileStore::new(path.as_ref())))
    }

    /// A registry whose learned state is never written out.
    pub fn in_memory() -> Result<Self, FibreSpecError> {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn OverlayStore>) -> Result<Self, FibreSpecError> {
        let builtin = BuiltinRegistry::load()?;
        let overlay = match store.load() {
            Ok(overlay) => overlay,
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "ignoring unreadable registry overlay");
                RegistryOverlay::default()
            }
        };
        let patterns = compile_overlay_patterns(&overlay);
        debug!(
            store = %store.describe(),
            dynamic_patterns = patterns.len(),
            "registry loaded"
        );
        Ok(ParameterRegistry {
            builtin,
            state: RwLock::new(DynamicState { overlay, patterns }),
            store,
        })
    }

    pub fn builtin(&self) -> &BuiltinRegistry {
        &self.builtin
    }

    /// Map free text to a section: section keywords (static then learned), then
    /// the fallback keyword net, then "General Information".
    pub fn classify(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let state = self.state.read();
        let learned = &state.overlay.section_keywords;
        let empty: Vec<String> = Vec::new();

        let static_hit = self.builtin.section_keywords.iter().find(|(section, keywords)| {
            let extra = learned.get(*section).unwrap_or(&empty);
            first_keyword_section(
                &lower,
                [
                    KeywordGroup { section, keywords },
                    KeywordGroup {
                        section,
                        keywords: extra,
                    },
                ],
            )
            .is_some()
        });
        if let Some((section, _)) = static_hit {
            return section.clone();
        }

        let learned_only = learned
            .iter()
            .filter(|(section, _)| !self.builtin.section_keywords.contains_key(*section))
            .map(|(section, keywords)| KeywordGroup { section, keywords });
        if let Some(section) = first_keyword_section(&lower, learned_only) {
            return section.to_string();
        }

        let fallback = self
            .builtin
            .fallback_keywords
            .iter()
            .map(|(section, keywords)| KeywordGroup { section, keywords });
        first_keyword_section(&lower, fallback)
            .unwrap_or(GENERAL_INFORMATION)
            .to_string()
    }

    /// Section for a parameter name: static parameter lists, then learned
    /// ones (substring overlap either way), then [`classify`](Self::classify).
    pub fn categorize_parameter(&self, name: &str) -> String {
        let lower = name.trim().to_lowercase();
        if let Some((section, _)) = self
            .builtin
            .parameter_categories
            .iter()
            .find(|(_, params)| overlaps_parameter_list(&lower, params))
        {
            return section.clone();
        }
        {
            let state = self.state.read();
            if let Some((section, _)) = state
                .overlay
                .parameters
                .iter()
                .find(|(_, params)| overlaps_parameter_list(&lower, params))
            {
                return section.clone();
            }
        }
        self.classify(name)
    }

    /// Register a parameter unless already known; returns its section.
    ///
    /// `section` defaults to [`classify`](Self::classify) of the name. When no
    /// pattern is given one is generated from the name.
    pub fn add_parameter_if_new(
        &self,
        name: &str,
        section: Option<&str>,
        pattern: Option<&str>,
        description: Option<&str>,
    ) -> String {
        let name = name.trim();
        if name.is_empty() {
            return GENERAL_INFORMATION.to_string();
        }
        if let Some(category) = self.builtin.exact_category(name) {
            return category.to_string();
        }
        let section = match section {
            Some(s) => s.to_string(),
            None => self.classify(name),
        };
        let lower = name.to_lowercase();

        let mut state = self.state.write();
        if let Some(existing) = state
            .overlay
            .parameters
            .iter()
            .find(|(_, params)| params.iter().any(|p| p.to_lowercase() == lower))
            .map(|(s, _)| s.clone())
        {
            return existing;
        }

        state
            .overlay
            .parameters
            .entry(section.clone())
            .or_default()
            .push(name.to_string());

        let pattern = pattern
            .map(str::to_string)
            .unwrap_or_else(|| generate_pattern(name));
        // Wavelength templates are shared by every "X at N nm" name.
        let duplicate = state.overlay.patterns.iter().any(|(p, _)| *p == pattern);
        match LabelPattern::compile(&pattern, name, None) {
            Ok(_) if duplicate => {}
            Ok(compiled) => {
                state.patterns.push(compiled);
                state.overlay.patterns.push((pattern, name.to_string()));
            }
            Err(e) => warn!(parameter = name, error = %e, "discarding invalid parameter pattern"),
        }

        if let Some(first_word) = name.split_whitespace().next() {
            learn_keyword(
                &mut state.overlay,
                &section,
                first_word,
                &self.builtin.stop_words,
            );
        }

        if let Some(description) = description {
            state
                .overlay
                .descriptions
                .insert(name.to_string(), description.to_string());
        }

        info!(parameter = name, section = %section, "registered new parameter");
        match self.store.save(&state.overlay) {
            Ok(()) => debug!(store = %self.store.describe(), "registry overlay saved"),
            Err(e) => error!(error = %e, "registry overlay not persisted"),
        }

        section
    }

    /// Section for a parameter about to be written. Names that only classify
    /// as "General Information" are reclassified using their value too, then
    /// registered under the better section.
    pub fn ensure_parameter_exists(&self, name: &str, value: Option<&str>) -> String {
        let existing = self.categorize_parameter(name);
        if existing != GENERAL_INFORMATION {
            return existing;
        }
        let better = match value {
            Some(v) if !v.trim().is_empty() => self.classify(&format!("{name} {v}")),
            _ => self.classify(name),
        };
        self.add_parameter_if_new(name, Some(&better), None, None)
    }

    /// All label patterns, static first then learned.
    pub fn label_patterns(&self) -> Vec<LabelPattern> {
        let state = self.state.read();
        self.builtin
            .label_patterns
            .iter()
            .chain(state.patterns.iter())
            .cloned()
            .collect()
    }

    pub fn overlay(&self) -> RegistryOverlay {
        self.state.read().overlay.clone()
    }

    /// Static and learned sections with their parameter counts and keywords.
    pub fn sections(&self) -> Vec<SectionSummary> {
        let state = self.state.read();
        let mut names: Vec<&String> = self.builtin.section_keywords.keys().collect();
        for name in self
            .builtin
            .parameter_categories
            .keys()
            .chain(state.overlay.parameters.keys())
            .chain(state.overlay.section_keywords.keys())
        {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        names
            .into_iter()
            .map(|name| {
                let mut keywords = self
                    .builtin
                    .section_keywords
                    .get(name)
                    .cloned()
                    .unwrap_or_default();
                if let Some(learned) = state.overlay.section_keywords.get(name) {
                    keywords.extend(learned.iter().cloned());
                }
                SectionSummary {
                    name: name.clone(),
                    static_parameters: self
                        .builtin
                        .parameter_categories
                        .get(name)
                        .map_or(0, Vec::len),
                    dynamic_parameters: state.overlay.parameters.get(name).map_or(0, Vec::len),
                    keywords,
                }
            })
            .collect()
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    /// Write the current overlay to the store.
    pub fn flush(&self) -> Result<(), FibreSpecError> {
        let state = self.state.read();
        self.store.save(&state.overlay)
    }

    /// Flush and drop the registry.
    pub fn close(self) -> Result<(), FibreSpecError> {
        self.flush()
    }
}

fn compile_overlay_patterns(overlay: &RegistryOverlay) -> Vec<LabelPattern> {
    overlay
        .patterns
        .iter()
        .filter_map(|(pattern, name)| match LabelPattern::compile(pattern, name, None) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(parameter = %name, error = %e, "skipping invalid learned pattern");
                None
            }
        })
        .collect()
}

fn learn_keyword(overlay: &mut RegistryOverlay, section: &str, word: &str, stop_words: &[String]) {
    let lower = word.to_lowercase();
    if word.chars().count() < 3 || stop_words.contains(&lower) {
        return;
    }
    let keywords = overlay
        .section_keywords
        .entry(section.to_string())
        .or_default();
    if keywords.iter().any(|k| k.to_lowercase() == lower) {
        return;
    }
    keywords.push(word.to_string());
    info!(keyword = word, section, "learned section keyword");
}

/// Load an overlay file and check that every pattern compiles.
pub fn validate_overlay_file(path: &Path) -> Result<RegistryOverlay, FibreSpecError> {
    let content = std::fs::read_to_string(path).map_err(|e| FibreSpecError::RegistryLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let overlay = store::parse_overlay(&content, path)?;
    validate_overlay(&overlay)?;
    Ok(overlay)
}

/// Check an overlay for empty names and patterns that fail to compile.
pub fn validate_overlay(overlay: &RegistryOverlay) -> Result<(), FibreSpecError> {
    for (section, params) in &overlay.parameters {
        if section.trim().is_empty() {
            return Err(FibreSpecError::RegistryInvalid(
                "section name must not be empty".into(),
            ));
        }
        if params.iter().any(|p| p.trim().is_empty()) {
            return Err(FibreSpecError::RegistryInvalid(format!(
                "section '{}' lists an empty parameter name",
                section
            )));
        }
    }
    for (pattern, name) in &overlay.patterns {
        LabelPattern::compile(pattern, name, None).map_err(|e| {
            FibreSpecError::RegistryInvalid(format!("pattern for '{}': {}", name, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (ParameterRegistry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let registry = ParameterRegistry::with_store(store.clone()).unwrap();
        (registry, store)
    }

    #[test]
    fn test_classify_keyword_order() {
        let (reg, _) = registry();
        assert_eq!(reg.classify("Cable Diameter"), "Cable Construction");
        assert_eq!(reg.classify("Fibre Colour"), "Colour Coding");
        assert_eq!(reg.classify("PMD link value"), "Optical Characteristics");
        assert_eq!(reg.classify("Wooden drums"), "Packaging & Marking");
    }

    #[test]
    fn test_classify_fallback_and_general() {
        let (reg, _) = registry();
        assert_eq!(reg.classify("cladding"), "Fiber Characteristics");
        assert_eq!(reg.classify("torsion"), "Cable Characteristics");
        assert_eq!(reg.classify("zzz qqq"), GENERAL_INFORMATION);
    }

    #[test]
    fn test_categorize_parameter_prefers_lists() {
        let (reg, _) = registry();
        assert_eq!(reg.categorize_parameter("Cable Diameter"), "Cable Construction");
        assert_eq!(reg.categorize_parameter("Attenuation at 1550 nm"), "Fiber Characteristics");
        assert_eq!(reg.categorize_parameter("Tensile Strength"), "Cable Characteristics");
        assert_eq!(reg.categorize_parameter("Drum Length"), "Physical Specifications");
        assert_eq!(reg.categorize_parameter("Storage Temperature"), "Cable Characteristics");
    }

    #[test]
    fn test_add_static_parameter_is_noop() {
        let (reg, store) = registry();
        assert_eq!(
            reg.add_parameter_if_new("cable weight", Some("Other"), None, None),
            "Cable Construction"
        );
        assert_eq!(store.save_count(), 0);
        assert!(reg.overlay().parameters.is_empty());
    }

    #[test]
    fn test_add_new_parameter_learns_and_persists() {
        let (reg, store) = registry();
        let section = reg.add_parameter_if_new(
            "Sheath Thickness",
            Some("Cable Construction"),
            None,
            Some("Nominal sheath wall"),
        );
        assert_eq!(section, "Cable Construction");
        assert_eq!(store.save_count(), 1);

        let saved = store.snapshot();
        assert_eq!(saved.parameters["Cable Construction"], vec!["Sheath Thickness"]);
        assert_eq!(saved.patterns.len(), 1);
        assert_eq!(saved.patterns[0].1, "Sheath Thickness");
        assert_eq!(saved.section_keywords["Cable Construction"], vec!["Sheath"]);
        assert_eq!(saved.descriptions["Sheath Thickness"], "Nominal sheath wall");

        // Case-insensitive dedupe keeps the first section.
        assert_eq!(
            reg.add_parameter_if_new("sheath thickness", Some("Colour Coding"), None, None),
            "Cable Construction"
        );
        assert_eq!(store.save_count(), 1);
    }

    struct ReadOnlyStore;

    impl OverlayStore for ReadOnlyStore {
        fn load(&self) -> Result<RegistryOverlay, FibreSpecError> {
            Ok(RegistryOverlay::default())
        }

        fn save(&self, _overlay: &RegistryOverlay) -> Result<(), FibreSpecError> {
            Err(FibreSpecError::RegistryPersist {
                path: "read-only".into(),
                reason: "store is read-only".into(),
            })
        }

        fn describe(&self) -> String {
            "read-only".to_string()
        }
    }

    #[test]
    fn test_failed_save_keeps_learned_parameter() {
        let reg = ParameterRegistry::with_store(Arc::new(ReadOnlyStore)).unwrap();
        let section = reg.add_parameter_if_new(
            "Zebra Stripe Count",
            Some("Mechanical Characteristics"),
            None,
            None,
        );
        assert_eq!(section, "Mechanical Characteristics");
        assert_eq!(
            reg.categorize_parameter("Zebra Stripe Count"),
            "Mechanical Characteristics"
        );
        assert_eq!(
            reg.overlay().parameters["Mechanical Characteristics"],
            vec!["Zebra Stripe Count"]
        );
        assert!(reg
            .label_patterns()
            .iter()
            .any(|p| p.name == "Zebra Stripe Count"));
        assert!(reg.flush().is_err());
    }

    #[test]
    fn test_stop_words_not_learned() {
        let (reg, store) = registry();
        reg.add_parameter_if_new("Number Zeta", Some("Cable Construction"), None, None);
        reg.add_parameter_if_new("Qx Value", Some("Cable Construction"), None, None);
        assert!(store
            .snapshot()
            .section_keywords
            .get("Cable Construction")
            .is_none());
    }

    #[test]
    fn test_learned_keyword_drives_classify() {
        let (reg, _) = registry();
        assert_eq!(reg.classify("Zircon index"), GENERAL_INFORMATION);
        reg.add_parameter_if_new("Zircon Index", Some("Lab Notes"), None, None);
        assert_eq!(reg.classify("zircon"), "Lab Notes");
        assert_eq!(reg.categorize_parameter("Zircon Index"), "Lab Notes");
    }

    #[test]
    fn test_ensure_parameter_exists_uses_value() {
        let (reg, _) = registry();
        let section = reg.ensure_parameter_exists("Zq Rating", Some("0.3 dB attenuation"));
        assert_eq!(section, "Optical Characteristics");
        assert_eq!(reg.overlay().parameters["Optical Characteristics"], vec!["Zq Rating"]);
    }

    #[test]
    fn test_invalid_pattern_is_discarded() {
        let (reg, store) = registry();
        reg.add_parameter_if_new("Broken", Some("Cable Construction"), Some("(oops"), None);
        let saved = store.snapshot();
        assert_eq!(saved.parameters["Cable Construction"], vec!["Broken"]);
        assert!(saved.patterns.is_empty());
    }

    #[test]
    fn test_label_patterns_static_then_learned() {
        let (reg, _) = registry();
        let before = reg.label_patterns().len();
        reg.add_parameter_if_new("Sheath Thickness", Some("Cable Construction"), None, None);
        let patterns = reg.label_patterns();
        assert_eq!(patterns.len(), before + 1);
        assert_eq!(patterns.last().map(|p| p.name.as_str()), Some("Sheath Thickness"));
    }

    #[test]
    fn test_reopen_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic_parameters.json");
        {
            let reg = ParameterRegistry::open(&path).unwrap();
            reg.add_parameter_if_new("Zircon Index", Some("Lab Notes"), None, None);
            reg.close().unwrap();
        }
        let reg = ParameterRegistry::open(&path).unwrap();
        assert_eq!(reg.categorize_parameter("Zircon Index"), "Lab Notes");
        assert!(reg.label_patterns().iter().any(|p| p.name == "Zircon Index"));
    }

    #[test]
    fn test_seeded_overlay_patterns_compiled() {
        let mut overlay = RegistryOverlay::default();
        overlay
            .parameters
            .insert("Lab Notes".into(), vec!["Zircon Index".into()]);
        overlay
            .patterns
            .push((r"Zircon Index\s+(\d+)".into(), "Zircon Index".into()));
        overlay.patterns.push(("(".into(), "Broken".into()));

        let reg = ParameterRegistry::with_store(Arc::new(MemoryStore::with_overlay(overlay))).unwrap();
        let learned: Vec<String> = reg
            .label_patterns()
            .into_iter()
            .skip(reg.builtin().label_patterns.len())
            .map(|p| p.name)
            .collect();
        assert_eq!(learned, vec!["Zircon Index"]);
        assert_eq!(reg.categorize_parameter("zircon index"), "Lab Notes");
    }

    #[test]
    fn test_corrupt_overlay_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dynamic_parameters.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let reg = ParameterRegistry::open(&path).unwrap();
        assert_eq!(reg.overlay(), RegistryOverlay::default());
    }

    #[test]
    fn test_validate_overlay() {
        let mut overlay = RegistryOverlay::default();
        overlay.patterns.push(("(\\d+) mm".into(), "Width".into()));
        assert!(validate_overlay(&overlay).is_ok());
        overlay.patterns.push(("(".into(), "Bad".into()));
        assert!(matches!(
            validate_overlay(&overlay),
            Err(FibreSpecError::RegistryInvalid(_))
        ));
    }

    #[test]
    fn test_sections_summary() {
        let (reg, _) = registry();
        reg.add_parameter_if_new("Zircon Index", Some("Lab Notes"), None, None);
        let sections = reg.sections();
        assert_eq!(sections[0].name, "Cable Construction");
        assert!(sections[0].static_parameters > 0);
        let lab = sections.iter().find(|s| s.name == "Lab Notes").unwrap();
        assert_eq!(lab.dynamic_parameters, 1);
        assert_eq!(lab.keywords, vec!["Zircon"]);
    }
}
