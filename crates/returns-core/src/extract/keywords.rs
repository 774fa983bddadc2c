//! Bare-keyword matching, kept as a fallback for free text without labels.
//!
//! Only consulted in [`ExtractionMode::Keyword`](super::ExtractionMode) and
//! only after the labeled rules found nothing.

use std::sync::LazyLock;

use regex::Regex;

use super::text::title_case;

/// Product vocabulary, in match priority order.
const PRODUCTS: &[&str] = &[
    "laptop",
    "phone",
    "tablet",
    "watch",
    "headphones",
    "camera",
    "speaker",
    "computer",
    "monitor",
    "keyboard",
    "mouse",
];

/// Keyword groups and the canonical reason each maps to, in priority order.
const REASONS: &[(&[&str], &str)] = &[
    (&["defective", "broken", "faulty"], "Defective"),
    (&["warranty", "warranty claim"], "Warranty Claim"),
    (&["compatible", "compatibility", "not compatible"], "Not Compatible"),
    (&["missing", "accessories", "missing accessories"], "Missing Accessories"),
    (&["damaged", "arrival", "damaged on arrival"], "Damaged on Arrival"),
    (&["wrong", "shipped", "wrong item"], "Wrong Item Shipped"),
    (&["performance", "slow", "lag"], "Performance Issues"),
    (&["battery", "battery issue"], "Battery Issue"),
    (&["screen", "broken screen"], "Broken Screen"),
    (&["changed mind", "change mind", "don't want"], "Changed Mind"),
];

static PRODUCT_PATTERNS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    PRODUCTS
        .iter()
        .map(|product| (word_pattern(&[*product]), title_case(product)))
        .collect()
});

static REASON_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    REASONS
        .iter()
        .map(|(words, reason)| (word_pattern(words), *reason))
        .collect()
});

fn word_pattern(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .expect("keyword patterns are valid")
}

/// First vocabulary product mentioned anywhere in `text`.
pub fn product(text: &str) -> Option<String> {
    PRODUCT_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, name)| name.clone())
}

/// Canonical reason for the first keyword group mentioned in `text`.
pub fn return_reason(text: &str) -> Option<String> {
    REASON_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, reason)| reason.to_string())
}
