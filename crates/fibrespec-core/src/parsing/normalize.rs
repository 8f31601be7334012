use regex::Regex;
use std::sync::LazyLock;

static IEC_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*IEC-[\d-]+(?:-[A-Z]\d+)?\s*").expect("valid regex"));
static TRAILING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)[A-Z]\d+$").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Clean a raw cell or text value.
///
/// Steps, repeated until the value stops changing:
/// 1. Replace full IEC standard codes ("IEC-60794-1-21-E7") with a space
/// 2. Drop a trailing test-method code ("E7") standing as its own token
/// 3. Collapse whitespace runs and trim
///
/// A value that is only a code ("E3") cleans to the empty string.
pub fn clean_value(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let step = IEC_CODE.replace_all(&current, " ");
        let step = TRAILING_CODE.replace(&step, "");
        let next = WHITESPACE.replace_all(&step, " ").trim().to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

static NAME_VARIATIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bFibre Core\b", "Fiber Core"),
        (r"\bFibre Count\b", "Fiber Count"),
        (r"\bO\.D\b\.?", "OD"),
        (r"\bI\.D\b\.?", "ID"),
        (r"\bOd\b", "OD"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect()
});

/// Normalize a table row label to its canonical parameter name.
///
/// "loose tube o.d." -> "Loose Tube OD", "fibre count" -> "Fiber Count".
pub fn normalize_parameter_name(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let mut name = title_case(&collapsed);
    for (pattern, replacement) in NAME_VARIATIONS.iter() {
        name = pattern.replace_all(&name, *replacement).into_owned();
    }
    name
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
