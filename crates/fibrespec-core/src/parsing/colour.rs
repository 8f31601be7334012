use crate::model::ColourMap;
use crate::parsing::normalize::title_case;
use crate::registry::builtin::BuiltinRegistry;
use regex::Regex;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,\s]+").expect("valid regex"));
static FIBRE_COUNT_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Fibre\s+Count\s+((?:\d+\s*)+)").expect("valid regex"));
static FIBRE_COLOUR_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Fibre\s+Colour\s+((?:[A-Za-z]{2}\*?\s*)+)").expect("valid regex")
});
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{2}\*?").expect("valid regex"));

/// Decode an inline colour sequence ("bl, or gr") into fibre number -> colour.
///
/// Fibres are numbered by token position. Unknown tokens of two or more
/// characters are kept title-cased; shorter unknown tokens are dropped but
/// still consume their number.
pub fn decode_sequence(text: &str, builtin: &BuiltinRegistry) -> ColourMap {
    let mut mapping = ColourMap::new();
    let text = text.trim();
    if text.is_empty() || text == "---" {
        return mapping;
    }

    let lower = text.to_lowercase();
    let tokens = SEPARATORS.split(&lower).filter(|t| !t.is_empty());
    for (i, token) in tokens.enumerate() {
        let number = (i + 1).to_string();
        if let Some(name) = builtin.colour_name(token) {
            mapping.insert(number, name.to_string());
        } else if token.chars().count() >= 2 {
            mapping.insert(number, title_case(token));
        }
    }
    mapping
}

/// Decode "Fibre Count 1 2 3 ..." / "Fibre Colour Bl Or Gr ..." row pairs in
/// page text, keeping only fibres numbered up to `max_fibre`.
///
/// A trailing `*` on a code marks a tracer fibre and is dropped.
pub fn decode_tabular(text: &str, max_fibre: u32, builtin: &BuiltinRegistry) -> ColourMap {
    let mut mapping = ColourMap::new();
    let counts = FIBRE_COUNT_ROW.captures_iter(text);
    let colours = FIBRE_COLOUR_ROW.captures_iter(text);

    for (count_row, colour_row) in counts.zip(colours) {
        let numbers = NUMBER.find_iter(&count_row[1]);
        let codes = CODE.find_iter(&colour_row[1]);
        for (number, code) in numbers.zip(codes) {
            let Ok(fibre) = number.as_str().parse::<u32>() else {
                continue;
            };
            if fibre > max_fibre {
                continue;
            }
            let code = code.as_str().trim_end_matches('*').to_lowercase();
            let name = builtin
                .colour_name(&code)
                .map(str::to_string)
                .unwrap_or_else(|| title_case(&code));
            mapping.insert(number.as_str().to_string(), name);
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> BuiltinRegistry {
        BuiltinRegistry::load().unwrap()
    }

    #[test]
    fn test_decode_sequence() {
        let colours = decode_sequence("Bl, Or Gr  br", &builtin());
        assert_eq!(colours.len(), 4);
        assert_eq!(colours["1"], "Blue");
        assert_eq!(colours["4"], "Brown");
    }

    #[test]
    fn test_decode_sequence_unknown_tokens() {
        let colours = decode_sequence("bl x zz", &builtin());
        assert_eq!(colours.get("1").map(String::as_str), Some("Blue"));
        assert!(colours.get("2").is_none());
        assert_eq!(colours.get("3").map(String::as_str), Some("Zz"));
    }

    #[test]
    fn test_decode_sequence_placeholder() {
        assert!(decode_sequence("---", &builtin()).is_empty());
        assert!(decode_sequence("   ", &builtin()).is_empty());
    }

    #[test]
    fn test_decode_tabular_truncates_per_variant() {
        let text = "Fibre Count 1 2 3 4 5 6 7 8 9 10 11 12\n\
                    Fibre Colour Bl Or Gr Br Gy Wh Rd Bk Ye Vi Pk Aq\n";
        let six = decode_tabular(text, 6, &builtin());
        let keys: Vec<&str> = six.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(six["6"], "White");

        let twelve = decode_tabular(text, 12, &builtin());
        assert_eq!(twelve.len(), 12);
        assert_eq!(twelve["12"], "Aqua");
    }

    #[test]
    fn test_decode_tabular_strips_tracer_marker() {
        let text = "Fibre Count 1 2\nFibre Colour Bl* Qq\n";
        let colours = decode_tabular(text, 24, &builtin());
        assert_eq!(colours["1"], "Blue");
        assert_eq!(colours["2"], "Qq");
    }

    #[test]
    fn test_decode_tabular_needs_both_rows() {
        assert!(decode_tabular("Fibre Count 1 2 3", 24, &builtin()).is_empty());
    }
}
