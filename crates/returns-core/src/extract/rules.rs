//! Pattern rules for each extractable field.
//!
//! Every field has an ordered list of rules. Rules are tried in order and the
//! first one that yields a value wins. All patterns are case-insensitive.

use std::{ops::Range, sync::LazyLock};

use jiff::civil::Date;
use regex::{Captures, Regex};

use super::text::{boundary, labeled_value, name_run, title_case, until_boundary};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction patterns are valid")
}

// order_id
static ORDER_ID_LABELED: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        re(r"(?i)\border[_\s]*id[:#\s]*(\d+)"),
        re(r"(?i)\border[:#\s]*(\d+)"),
        re(r"(?i)\bid[:#\s]*(\d+)"),
    ]
});
static BARE_DIGITS: LazyLock<Regex> = LazyLock::new(|| re(r"\d{4,}"));

// product / reason / store / category labels
static PRODUCT_LABEL: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bproduct(?:_name)?\s*:\s*"));
static REASON_LABEL: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(?:return_reason|reason|because)\s*:\s*"));
static STORE_LABEL: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bstore(?:_name)?\s*:\s*"));
static STORE_PLACE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(?:at|from)\s+"));
static CATEGORY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bcategory\s*:\s*([a-z]+)"));

// date, in precedence order: labeled ISO, labeled US, bare ISO, bare US.
// An ISO date may run straight into a `T` time part.
static DATE_RULES: LazyLock<[(Regex, DateOrder); 4]> = LazyLock::new(|| {
    [
        (re(r"(?i)\bdate\s*:\s*(\d{4})-(\d{1,2})-(\d{1,2})(?:T|\b)"), DateOrder::YearMonthDay),
        (re(r"(?i)\bdate\s*:\s*(\d{1,2})/(\d{1,2})/(\d{4})\b"), DateOrder::MonthDayYear),
        (re(r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:T|\b)"), DateOrder::YearMonthDay),
        (re(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b"), DateOrder::MonthDayYear),
    ]
});

// cost: labeled, `$amount`, `amount dollars`
static COST_RULES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        re(r"(?i)\b(?:cost|price)\s*:\s*\$?\s*(\d[\d,]*(?:\.\d+)?)"),
        re(r"\$\s*(\d[\d,]*(?:\.\d+)?)"),
        re(r"(?i)\b(\d[\d,]*(?:\.\d+)?)\s*(?:dollars?|usd)\b"),
    ]
});

static APPROVAL: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(?:approved_flag|approved|status)\s*:\s*(yes|no|true|false|approved|rejected|pending)\b")
});

/// Words that end a place name introduced by `at` / `from`.
const PLACE_STOPWORDS: &[&str] = &[
    "a", "after", "an", "and", "approved", "because", "before", "but", "category", "cost",
    "date", "due", "for", "in", "is", "it", "last", "my", "on", "order", "price", "product",
    "reason", "since", "status", "the", "this", "today", "was", "with", "yesterday",
];
const PLACE_MAX_WORDS: usize = 4;

#[derive(Debug, Clone, Copy)]
enum DateOrder {
    YearMonthDay,
    MonthDayYear,
}

/// Approval state after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Yes,
    No,
    Pending,
}

impl Approval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Approval::Yes => "Yes",
            Approval::No => "No",
            Approval::Pending => "Pending",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "yes" | "true" | "approved" => Some(Approval::Yes),
            "no" | "false" | "rejected" => Some(Approval::No),
            "pending" => Some(Approval::Pending),
            _ => None,
        }
    }
}

/// `order_id:` / `order:` / `id:` prefixed integer, else the first bare run
/// of four or more digits that is not part of a date or an amount.
pub fn order_id(text: &str) -> Option<String> {
    if let Some(id) = ORDER_ID_LABELED
        .iter()
        .find_map(|rule| rule.captures(text).map(|caps| caps[1].to_string()))
    {
        return Some(id);
    }

    let claimed = claimed_numeric_spans(text);
    BARE_DIGITS
        .find_iter(text)
        .find(|m| {
            let span = m.range();
            !claimed.iter().any(|c| c.start < span.end && span.start < c.end)
                && !part_of_number(text, &span)
        })
        .map(|m| m.as_str().to_string())
}

/// `product:` / `product_name:` followed by letters and spaces, title-cased.
pub fn product(text: &str) -> Option<String> {
    labeled_value(text, &PRODUCT_LABEL)
        .map(name_run)
        .filter(|value| !value.is_empty())
        .map(title_case)
}

/// `reason:` / `because:` / `return_reason:` free text, title-cased.
pub fn return_reason(text: &str) -> Option<String> {
    labeled_value(text, &REASON_LABEL)
        .map(|value| value.trim_end_matches(['.', '!', '?']).trim())
        .filter(|value| !value.is_empty())
        .map(title_case)
}

/// First valid date in precedence order, formatted `YYYY-MM-DD`.
pub fn date(text: &str) -> Option<String> {
    DATE_RULES.iter().find_map(|(rule, order)| {
        rule.captures_iter(text)
            .find_map(|caps| calendar_date(&caps, *order))
            .map(|date| date.to_string())
    })
}

/// First amount in precedence order.
pub fn cost(text: &str) -> Option<f64> {
    COST_RULES.iter().find_map(|rule| {
        rule.captures_iter(text)
            .find_map(|caps| caps[1].replace(',', "").parse::<f64>().ok())
    })
}

/// `store:` / `store_name:` label, else a place after `at` / `from`.
pub fn store_name(text: &str) -> Option<String> {
    if let Some(name) = labeled_value(text, &STORE_LABEL)
        .map(name_run)
        .filter(|value| !value.is_empty())
    {
        return Some(title_case(name));
    }

    let labeled = labeled_spans(text);
    STORE_PLACE
        .find_iter(text)
        .filter(|m| !labeled.iter().any(|span| span.contains(&m.start())))
        .find_map(|m| {
            let candidate = name_run(until_boundary(&text[m.end()..]));
            let words: Vec<&str> = candidate
                .split_whitespace()
                .take_while(|word| {
                    !PLACE_STOPWORDS.contains(&word.to_ascii_lowercase().as_str())
                })
                .take(PLACE_MAX_WORDS)
                .collect();
            (!words.is_empty()).then(|| title_case(&words.join(" ")))
        })
}

/// `category:<word>`, title-cased.
pub fn category(text: &str) -> Option<String> {
    CATEGORY.captures(text).map(|caps| title_case(&caps[1]))
}

/// `approved:` / `status:` / `approved_flag:` with a recognized value.
pub fn approval(text: &str) -> Option<Approval> {
    APPROVAL
        .captures_iter(text)
        .find_map(|caps| Approval::parse(&caps[1]))
}

fn calendar_date(caps: &Captures<'_>, order: DateOrder) -> Option<Date> {
    let (year, month, day) = match order {
        DateOrder::YearMonthDay => (&caps[1], &caps[2], &caps[3]),
        DateOrder::MonthDayYear => (&caps[3], &caps[1], &caps[2]),
    };
    Date::new(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?).ok()
}

/// Byte ranges of `product:` and `reason:` labels together with their values.
fn labeled_spans(text: &str) -> Vec<Range<usize>> {
    [&*PRODUCT_LABEL, &*REASON_LABEL]
        .into_iter()
        .flat_map(|label| label.find_iter(text))
        .map(|m| m.start()..m.end() + boundary(&text[m.end()..]))
        .collect()
}

/// Byte ranges covered by dates and amounts, off limits to the bare
/// order-id fallback.
fn claimed_numeric_spans(text: &str) -> Vec<Range<usize>> {
    let dates = DATE_RULES.iter().flat_map(|(rule, _)| rule.find_iter(text));
    let costs = COST_RULES.iter().flat_map(|rule| rule.find_iter(text));
    dates.chain(costs).map(|m| m.range()).collect()
}

fn part_of_number(text: &str, span: &Range<usize>) -> bool {
    let before = text[..span.start].chars().next_back();
    let mut after = text[span.end..].chars();
    let next = after.next();
    let next_is_digit = after.next().is_some_and(|c| c.is_ascii_digit());

    matches!(before, Some('-' | '/' | '.' | '$' | ','))
        || matches!(next, Some('-' | '/'))
        || (matches!(next, Some('.' | ',')) && next_is_digit)
}
