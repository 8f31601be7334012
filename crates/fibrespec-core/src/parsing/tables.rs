use crate::extraction::Table;
use crate::model::{ParamValue, VariantLabel, VariantRecords};
use crate::parsing::colour::decode_sequence;
use crate::parsing::normalize::{clean_value, normalize_parameter_name};
use crate::registry::ParameterRegistry;
use crate::section::{COLOUR_CODING, GENERAL_INFORMATION};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

/// First-cell labels of rows that only head a table.
const SKIP_LABELS: [&str; 9] = [
    "parameter",
    "sl.no.",
    "sr.no.",
    "specifications",
    "description",
    "details",
    "type",
    "color",
    "dimensions",
];

const PER_TUBE_PHRASES: [&str; 4] = [
    "number of fibres per tube",
    "number of fibers per tube",
    "fibres per tube",
    "fibers per tube",
];

const PER_VARIANT_PHRASES: [&str; 3] = ["cable diameter", "cable weight", "number of loose tubes"];

const MULTI_PART_KEYWORDS: [&str; 7] = [
    "tensile",
    "strength",
    "attenuation",
    "dispersion",
    "diameter",
    "wavelength",
    "bend",
];

const UNIT_TOKENS: [&str; 11] = ["mm", "km", "db", "nm", "ps", "µm", "kg", "n", "j", "°c", "kn"];
const VALUE_SYMBOLS: [char; 6] = ['±', '≤', '≥', '%', '-', '/'];
const PLACEHOLDERS: [&str; 4] = ["---", "n/a", "na", "-"];

static TWO_LETTER_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}$").expect("valid regex"));
static COLOUR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,4}$").expect("valid regex"));

/// Table-scoped association of variants to the column holding their values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: IndexMap<VariantLabel, usize>,
}

impl ColumnMapping {
    pub fn insert(&mut self, label: VariantLabel, column: usize) {
        self.columns.insert(label, column);
    }

    pub fn column(&self, label: VariantLabel) -> Option<usize> {
        self.columns.get(&label).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The non-empty cell mapped to `label` in `cells`.
    fn cell<'c>(&self, label: VariantLabel, cells: &'c [String]) -> Option<&'c str> {
        let col = self.column(label)?;
        cells.get(col).map(String::as_str).filter(|c| !c.is_empty())
    }
}

/// A general row's value before it is written per variant.
#[derive(Debug, Clone, PartialEq)]
enum RowValue {
    Shared(ParamValue),
    /// One cell per variant, in variant order.
    PerVariant(Vec<String>),
}

/// A per-tube reading held back until every page has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DeferredValue {
    label: VariantLabel,
    section: String,
    parameter: String,
    value: String,
}

/// Walks extracted table rows in document order and writes per-variant values.
///
/// The current section carries over from row to row (and table to table)
/// until a row's text classifies into a different section.
pub struct TableInterpreter<'a> {
    registry: &'a ParameterRegistry,
    variants: &'a [VariantLabel],
    current_section: String,
    deferred: Vec<DeferredValue>,
}

impl<'a> TableInterpreter<'a> {
    pub fn new(registry: &'a ParameterRegistry, variants: &'a [VariantLabel]) -> Self {
        TableInterpreter {
            registry,
            variants,
            current_section: GENERAL_INFORMATION.to_string(),
            deferred: Vec::new(),
        }
    }

    pub fn current_section(&self) -> &str {
        &self.current_section
    }

    /// Interpret one table. Column mappings never outlive the table.
    pub fn interpret_table(&mut self, table: &Table, records: &mut VariantRecords) {
        if table.len() < 2 {
            return;
        }
        let mut mapping = ColumnMapping::default();
        for row in table {
            if row.len() < 2 {
                continue;
            }
            let cells: Vec<String> = row
                .iter()
                .map(|c| c.as_deref().unwrap_or("").trim().to_string())
                .collect();
            self.interpret_row(&cells, &mut mapping, records);
        }
    }

    /// Apply held-back per-tube values.
    pub fn finish(self, records: &mut VariantRecords) {
        for d in self.deferred {
            if let Some(record) = records.get_mut(&d.label) {
                record.insert(&d.section, &d.parameter, ParamValue::Text(d.value));
            }
        }
    }

    fn interpret_row(
        &mut self,
        cells: &[String],
        mapping: &mut ColumnMapping,
        records: &mut VariantRecords,
    ) {
        let first = cells[0].as_str();
        let first_lower = first.to_lowercase();
        if first.is_empty() || SKIP_LABELS.contains(&first_lower.as_str()) {
            return;
        }

        if is_fibre_count_label(&first_lower) {
            self.read_header(cells, mapping, records);
            return;
        }

        let section = self.registry.classify(&cells.join(" "));
        if section != GENERAL_INFORMATION {
            self.current_section = section;
        }

        let name = normalize_parameter_name(first);
        let lower = name.to_lowercase();
        if is_fibre_count_label(&lower) {
            return;
        }

        if self.extend_mapping(cells, mapping) {
            return;
        }

        if PER_TUBE_PHRASES.iter().any(|p| lower.contains(p)) {
            self.defer_per_tube(&name, cells, mapping);
        } else if PER_VARIANT_PHRASES.iter().any(|p| lower.contains(p)) {
            self.write_per_variant(&name, cells, mapping, records);
        } else {
            self.write_general(&name, cells, mapping, records);
        }
    }

    fn variant_for(&self, cell: &str) -> Option<VariantLabel> {
        VariantLabel::parse(cell).filter(|label| self.variants.contains(label))
    }

    /// "Fibre Count | 24F | 96F": map label columns and stamp each variant's count.
    fn read_header(&self, cells: &[String], mapping: &mut ColumnMapping, records: &mut VariantRecords) {
        for (col, cell) in cells.iter().enumerate().skip(1) {
            if let Some(label) = self.variant_for(cell) {
                mapping.insert(label, col);
                debug!(label = %label, column = col, "mapped variant column");
            }
        }
        for label in self.variants {
            if let Some(record) = records.get_mut(label) {
                record.insert(
                    &self.current_section,
                    "Fiber Count",
                    ParamValue::Text(label.count().to_string()),
                );
            }
        }
    }

    /// Rows whose data cells are variant labels add to the mapping and carry
    /// no values themselves, whatever their first cell says.
    fn extend_mapping(&self, cells: &[String], mapping: &mut ColumnMapping) -> bool {
        let mut found = false;
        for (col, cell) in cells.iter().enumerate().skip(1) {
            if let Some(label) = self.variant_for(cell) {
                mapping.insert(label, col);
                found = true;
            }
        }
        if found {
            debug!(row = %cells[0], "variant labels in row, extending column mapping");
        }
        found
    }

    /// Fibres per tube differs per variant independently of the total, so the
    /// mapped cell is kept verbatim. Without a mapping nothing is recorded.
    fn defer_per_tube(&mut self, name: &str, cells: &[String], mapping: &ColumnMapping) {
        if mapping.is_empty() {
            return;
        }
        for label in self.variants {
            if let Some(cell) = mapping.cell(*label, cells) {
                let value = clean_value(cell);
                info!(label = %label, parameter = name, value = %value, "stored per-tube value");
                self.deferred.push(DeferredValue {
                    label: *label,
                    section: self.current_section.clone(),
                    parameter: name.to_string(),
                    value,
                });
            }
        }
    }

    /// Diameter, weight and tube count: mapped cell, else the first data cell.
    fn write_per_variant(
        &self,
        name: &str,
        cells: &[String],
        mapping: &ColumnMapping,
        records: &mut VariantRecords,
    ) {
        let section = self.registry.categorize_parameter(name);
        self.registry.add_parameter_if_new(name, Some(&section), None, None);
        let fallback = cells.get(1).map(String::as_str).filter(|c| !c.is_empty());

        for label in self.variants {
            let Some(raw) = mapping.cell(*label, cells).or(fallback) else {
                continue;
            };
            if let Some(record) = records.get_mut(label) {
                record.file_under(&section, name, ParamValue::Text(clean_value(raw)));
            }
        }
    }

    fn write_general(
        &self,
        name: &str,
        cells: &[String],
        mapping: &ColumnMapping,
        records: &mut VariantRecords,
    ) {
        let Some(row_value) = self.general_value(name, &cells[1..]) else {
            return;
        };

        if is_colour_name(name) {
            // The page-text colour table owns colour parameters once columns are mapped.
            if !mapping.is_empty() {
                return;
            }
            self.write_colour_row(name, row_value, records);
            return;
        }

        let hint = match &row_value {
            RowValue::Shared(ParamValue::Text(s)) => Some(s.as_str()),
            RowValue::PerVariant(values) => values.first().map(String::as_str),
            RowValue::Shared(ParamValue::Colours(_)) => None,
        };
        let section = self.registry.ensure_parameter_exists(name, hint);

        for (i, label) in self.variants.iter().enumerate() {
            let value = match (&row_value, mapping.cell(*label, cells)) {
                (_, Some(cell)) => ParamValue::Text(clean_value(cell)),
                (RowValue::PerVariant(values), None) => match values.get(i) {
                    Some(v) => ParamValue::Text(clean_value(v)),
                    None => continue,
                },
                (RowValue::Shared(ParamValue::Text(s)), None) => ParamValue::Text(clean_value(s)),
                (RowValue::Shared(colours), None) => colours.clone(),
            };
            if value.is_blank() {
                continue;
            }
            if let Some(record) = records.get_mut(label) {
                record.file_under(&section, name, value);
            }
        }
    }

    /// Colour rows never replace a colour parameter already present.
    fn write_colour_row(&self, name: &str, row_value: RowValue, records: &mut VariantRecords) {
        let (section, value) = match row_value {
            RowValue::Shared(ParamValue::Colours(colours)) => {
                let section =
                    self.registry
                        .add_parameter_if_new(name, Some(COLOUR_CODING), None, None);
                (section, ParamValue::Colours(colours))
            }
            RowValue::Shared(ParamValue::Text(text)) => {
                let section = self.registry.ensure_parameter_exists(name, Some(&text));
                (section, ParamValue::Text(clean_value(&text)))
            }
            RowValue::PerVariant(values) => {
                let joined = values.join(" ");
                let section = self.registry.ensure_parameter_exists(name, Some(&joined));
                (section, ParamValue::Text(clean_value(&joined)))
            }
        };
        if value.is_blank() {
            return;
        }
        for label in self.variants {
            if let Some(record) = records.get_mut(label) {
                if !record.contains_param(name) {
                    record.insert(&section, name, value.clone());
                }
            }
        }
    }

    /// Pick a general row's value. First success wins: positional cells,
    /// joined multi-part cells, first value-looking cell. A colour-named row
    /// then prefers a decoded colour sequence, and anything still empty falls
    /// back to the first meaningful cell.
    fn general_value(&self, name: &str, data: &[String]) -> Option<RowValue> {
        let lower = name.to_lowercase();
        let mut value = self.positional_value(data);

        if value.is_none() {
            value = if MULTI_PART_KEYWORDS.iter().any(|k| lower.contains(k)) {
                joined_value(data)
            } else {
                first_value_like(data)
            }
            .map(|s| RowValue::Shared(ParamValue::Text(s)));
        }

        if is_colour_name(name) {
            let tokens: Vec<&str> = data
                .iter()
                .map(String::as_str)
                .filter(|c| !c.is_empty() && COLOUR_TOKEN.is_match(&c.to_lowercase()))
                .collect();
            if !tokens.is_empty() {
                let colours = decode_sequence(&tokens.join(" "), self.registry.builtin());
                if !colours.is_empty() {
                    value = Some(RowValue::Shared(ParamValue::Colours(colours)));
                }
            }
        }

        value.or_else(|| {
            data.iter()
                .find(|c| !c.is_empty() && !is_placeholder(c))
                .map(|c| RowValue::Shared(ParamValue::Text(c.clone())))
        })
    }

    /// Exactly one non-label data cell per variant: assign by position.
    fn positional_value(&self, data: &[String]) -> Option<RowValue> {
        let cells: Vec<String> = data
            .iter()
            .filter(|c| !c.is_empty())
            .filter(|c| {
                let upper = c.to_uppercase();
                !self
                    .variants
                    .iter()
                    .any(|label| upper.contains(&label.to_string()))
            })
            .cloned()
            .collect();
        (cells.len() == self.variants.len()).then_some(RowValue::PerVariant(cells))
    }
}

fn is_fibre_count_label(lower: &str) -> bool {
    lower.contains("fibre count") || lower.contains("fiber count")
}

fn is_colour_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("colour") || lower.contains("color")
}

fn is_placeholder(cell: &str) -> bool {
    PLACEHOLDERS.contains(&cell.trim().to_lowercase().as_str())
}

fn joined_value(data: &[String]) -> Option<String> {
    let parts: Vec<&str> = data
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty() && !is_placeholder(c))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" "))
}

/// First cell that reads as a measurement, else as a description.
fn first_value_like(data: &[String]) -> Option<String> {
    data.iter()
        .filter(|c| !c.is_empty())
        .find(|c| looks_like_measurement(c) || looks_like_description(c))
        .cloned()
}

fn looks_like_measurement(cell: &str) -> bool {
    let lower = cell.to_lowercase();
    cell.chars().any(|c| c.is_ascii_digit())
        && (UNIT_TOKENS.iter().any(|u| lower.contains(u))
            || cell.chars().any(|c| VALUE_SYMBOLS.contains(&c)))
}

fn looks_like_description(cell: &str) -> bool {
    let lower = cell.to_lowercase();
    cell.chars().count() > 2
        && !matches!(lower.as_str(), "color" | "colour" | "type")
        && !TWO_LETTER_CODE.is_match(&lower)
}
