//! Map the model's free-form industry label onto one configured industry.
//!
//! Fallback order (first hit wins):
//! 1. exact string match
//! 2. ASCII case-insensitive match
//! 3. token overlap: both labels split on `/`, `-` and whitespace; a pair of
//!    tokens matches when one contains the other (case-insensitive).
//!    Tokens shorter than 3 chars are ignored so "&" or "of" never match.

const MIN_TOKEN_LEN: usize = 3;

pub fn match_industry<'a>(label: &str, industries: &'a [String]) -> Option<&'a str> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    // 1) Exact.
    if let Some(i) = industries.iter().find(|i| i.as_str() == label) {
        return Some(i.as_str());
    }

    // 2) Case-insensitive.
    if let Some(i) = industries.iter().find(|i| i.eq_ignore_ascii_case(label)) {
        return Some(i.as_str());
    }

    // 3) Token overlap.
    let wanted = tokens(label);
    if wanted.is_empty() {
        return None;
    }
    industries
        .iter()
        .find(|i| {
            let have = tokens(i);
            wanted
                .iter()
                .any(|w| have.iter().any(|h| h.contains(w.as_str()) || w.contains(h.as_str())))
        })
        .map(String::as_str)
}

fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| c == '/' || c == '-' || c.is_whitespace())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(|t| t.to_lowercase())
        .collect()
}
