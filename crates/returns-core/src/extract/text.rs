//! Text helpers shared by the extraction rules.

use std::sync::LazyLock;

use regex::Regex;

/// Start of the next `label:` token.
static NEXT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[a-z_]+\s*:").expect("valid label regex"));

/// Hard separators between free-text fields.
static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;|\n]").expect("valid delimiter regex"));

/// Capitalizes the first letter of every word and lower-cases the rest.
pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Text following the first match of `label`, up to the next label or
/// delimiter, trimmed. `None` if the label is absent or the value is blank.
pub fn labeled_value<'t>(text: &'t str, label: &Regex) -> Option<&'t str> {
    label.find_iter(text).find_map(|m| {
        let value = until_boundary(&text[m.end()..]);
        (!value.is_empty()).then_some(value)
    })
}

/// Cuts `rest` at the next label or delimiter.
pub fn until_boundary(rest: &str) -> &str {
    rest[..boundary(rest)].trim()
}

/// Byte offset of the next label or delimiter in `rest`.
pub fn boundary(rest: &str) -> usize {
    [NEXT_LABEL.find(rest), DELIMITER.find(rest)]
        .into_iter()
        .flatten()
        .map(|m| m.start())
        .min()
        .unwrap_or(rest.len())
}

/// Leading run of name-like characters: letters, spaces, `'` and `&`.
pub fn name_run(value: &str) -> &str {
    let end = value
        .char_indices()
        .find(|(_, c)| !(c.is_alphabetic() || c.is_whitespace() || *c == '\'' || *c == '&'))
        .map_or(value.len(), |(index, _)| index);
    value[..end].trim()
}
