use indexmap::IndexMap;

const HEADING_WORDS: [&str; 5] = [
    "specification",
    "description",
    "technical",
    "parameters",
    "characteristics",
];

/// Group a page's lines into heading -> joined paragraph text.
///
/// Lines before the first heading are dropped, as are headings with no body.
pub fn capture_headings(page_text: &str) -> IndexMap<String, String> {
    let mut blocks = IndexMap::new();
    let mut heading: Option<&str> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in page_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_heading(line) {
            if let Some(h) = heading {
                if !body.is_empty() {
                    blocks.insert(h.to_string(), body.join(" "));
                }
            }
            body.clear();
            heading = Some(line);
        } else if heading.is_some() {
            body.push(line);
        }
    }
    if let Some(h) = heading {
        if !body.is_empty() {
            blocks.insert(h.to_string(), body.join(" "));
        }
    }

    blocks
}

fn is_heading(line: &str) -> bool {
    let lower = line.to_lowercase();
    (is_upper(line) && line.chars().count() > 3) || HEADING_WORDS.iter().any(|w| lower.contains(w))
}

/// At least one cased letter, and no lower-case ones.
fn is_upper(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}
