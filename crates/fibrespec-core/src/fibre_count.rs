use crate::extraction::Table;
use crate::model::VariantLabel;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};

static LABEL_IN_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)F").expect("valid regex"));
static COMMA_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+F(?:\s*,\s*\d+F)+)").expect("valid regex"));
static LABEL_IN_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)F").expect("valid regex"));

/// Which evidence a resolved label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    Filename,
    Construction,
    DocumentText,
    TextFallback,
    Default,
}

impl fmt::Display for CountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CountSource::Filename => "filename",
            CountSource::Construction => "construction",
            CountSource::DocumentText => "document text",
            CountSource::TextFallback => "text fallback",
            CountSource::Default => "default",
        };
        write!(f, "{s}")
    }
}

/// Raw signals gathered from one document.
#[derive(Debug, Clone)]
pub struct CountEvidence {
    pub filename: Vec<VariantLabel>,
    pub construction: Option<VariantLabel>,
    pub text: Vec<VariantLabel>,
    pub default: VariantLabel,
}

impl CountEvidence {
    pub fn gather<'a>(
        filename: &str,
        full_text: &str,
        tables: impl IntoIterator<Item = &'a Table>,
        text_patterns: &[Regex],
        default: VariantLabel,
    ) -> CountEvidence {
        CountEvidence {
            filename: from_filename(filename),
            construction: from_construction(tables),
            text: from_text(full_text, text_patterns),
            default,
        }
    }
}

/// One rule of the cascade: given the evidence and the labels accepted so
/// far, propose more.
type CountRule = fn(&CountEvidence, &[VariantLabel]) -> Vec<VariantLabel>;

/// Rules in priority order. Each contributes only labels not yet accepted.
const CASCADE: [(CountSource, CountRule); 5] = [
    (CountSource::Filename, |e, _| e.filename.clone()),
    (CountSource::Construction, |e, _| e.construction.into_iter().collect()),
    (CountSource::DocumentText, |e, _| {
        if e.filename.is_empty() {
            e.text.clone()
        } else {
            e.text
                .iter()
                .filter(|label| e.filename.contains(label))
                .copied()
                .collect()
        }
    }),
    (CountSource::TextFallback, |e, accepted| {
        if accepted.is_empty() {
            e.text.clone()
        } else {
            Vec::new()
        }
    }),
    (CountSource::Default, |e, accepted| {
        if accepted.is_empty() {
            vec![e.default]
        } else {
            Vec::new()
        }
    }),
];

/// The resolved variant set and where each label came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub labels: Vec<VariantLabel>,
    pub sources: Vec<(VariantLabel, CountSource)>,
}

/// Run the cascade. The result is never empty and holds no duplicates.
pub fn resolve(evidence: &CountEvidence) -> Resolution {
    let mut labels: Vec<VariantLabel> = Vec::new();
    let mut sources = Vec::new();

    for (source, rule) in CASCADE {
        for label in rule(evidence, &labels) {
            if !labels.contains(&label) {
                debug!(label = %label, source = %source, "accepted fibre count");
                labels.push(label);
                sources.push((label, source));
            }
        }
    }

    info!(
        counts = ?labels.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "resolved fibre counts"
    );
    Resolution { labels, sources }
}

/// Labels encoded in a filename ("Cable_24F,96F.pdf"), largest first.
pub fn from_filename(filename: &str) -> Vec<VariantLabel> {
    let upper = filename.to_uppercase();
    let mut labels: Vec<VariantLabel> = LABEL_IN_FILENAME
        .captures_iter(&upper)
        .filter_map(|c| c[1].parse().ok())
        .filter_map(VariantLabel::new)
        .collect();
    labels.sort_by(|a, b| b.cmp(a));
    labels.dedup();
    labels
}

/// Fibre total from "fibres per tube" x "number of tubes" rows, when the
/// product is an allowed count. Later rows override earlier ones.
pub fn from_construction<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Option<VariantLabel> {
    let mut per_tube: Option<u32> = None;
    let mut tubes: Option<u32> = None;

    for row in tables.into_iter().flatten() {
        let cells: Vec<&str> = row.iter().flatten().map(|c| c.trim()).collect();
        if cells.len() < 2 {
            continue;
        }
        let name = cells[0].to_lowercase();

        if ["fiber per tube", "fibre per tube", "fibres per tube", "fibers per tube"]
            .iter()
            .any(|p| name.contains(p))
        {
            if let Some(n) = cells[1..].iter().find_map(|c| parse_count(c)) {
                per_tube = Some(n);
            }
        }

        if ["number of tube", "loose tube", "tubes"]
            .iter()
            .any(|p| name.contains(p))
        {
            if let Some(n) = cells[1..]
                .iter()
                .find_map(|c| parse_count(c).filter(|n| *n <= 50))
            {
                tubes = Some(n);
            }
        }
    }

    match (per_tube, tubes) {
        (Some(f), Some(t)) if f > 0 && t > 0 => VariantLabel::new(f.checked_mul(t)?),
        _ => None,
    }
}

fn parse_count(cell: &str) -> Option<u32> {
    if cell.is_empty() || !cell.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cell.parse().ok()
}

/// Allowed counts mentioned in free text, in order of first detection.
pub fn from_text(text: &str, patterns: &[Regex]) -> Vec<VariantLabel> {
    let mut labels = Vec::new();
    let mut push = |digits: &str| {
        if let Some(label) = digits.parse().ok().and_then(VariantLabel::new) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    };

    // Resume after the captured digits so a delimiter consumed by one match
    // can open the next ("24F 96F").
    for pattern in patterns {
        let mut start = 0;
        while let Some(caps) = pattern.captures_at(text, start) {
            let Some(whole) = caps.get(0) else { break };
            let next = match caps.get(1) {
                Some(m) => {
                    push(m.as_str());
                    m.end()
                }
                None => whole.end(),
            };
            if next <= start {
                break;
            }
            start = next;
        }
    }
    for list in COMMA_LIST.find_iter(text) {
        for caps in LABEL_IN_LIST.captures_iter(list.as_str()) {
            push(&caps[1]);
        }
    }
    labels
}
