/// Section returned when nothing else matches.
pub const GENERAL_INFORMATION: &str = "General Information";
/// Section holding decoded fibre colour sequences.
pub const COLOUR_CODING: &str = "Colour Coding";

/// One section's keyword list, as consulted by [`first_keyword_section`].
#[derive(Debug, Clone, Copy)]
pub struct KeywordGroup<'a> {
    pub section: &'a str,
    pub keywords: &'a [String],
}

/// Return the first section (in iteration order) with a keyword that is a
/// substring of `text_lower`. Keywords are compared lower-cased.
pub fn first_keyword_section<'a, I>(text_lower: &str, groups: I) -> Option<&'a str>
where
    I: IntoIterator<Item = KeywordGroup<'a>>,
{
    groups
        .into_iter()
        .find(|group| {
            group
                .keywords
                .iter()
                .any(|kw| !kw.is_empty() && text_lower.contains(&kw.to_lowercase()))
        })
        .map(|group| group.section)
}

/// Whether `name_lower` overlaps any listed parameter in either direction:
/// the parameter is a substring of the name, or the name of the parameter.
pub fn overlaps_parameter_list(name_lower: &str, params: &[String]) -> bool {
    if name_lower.is_empty() {
        return false;
    }
    params.iter().any(|p| {
        let p = p.to_lowercase();
        !p.is_empty() && (name_lower.contains(&p) || p.contains(name_lower))
    })
}
