//! Line classification rules for the response parser.
//!
//! Each rule pairs a [`LineKind`] with the labels that introduce it. Rules are
//! evaluated top-to-bottom and the first hit wins. A label matches when the
//! trimmed line starts with it (ASCII case-insensitive), in plain form
//! (`Country: US`) or wrapped in emphasis / list markup (`**Country:** US`,
//! `- Country: US`, `### Country: US`).
//!
//! Between the label and its colon only whitespace, emphasis markers and one
//! parenthetical are allowed, so `Positivity score (10 being ...): 8` is a
//! field line while `Country outlook: steady` or `Headline CPI: 3.1%` is prose.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Country,
    Industry,
    Headline,
    Effect,
    Positivity,
    Importance,
}

/// What may follow a label before the value starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// `Label (optional note):`
    Colon,
    /// As `Colon`, or no colon when the value starts with a digit
    /// (`Importance score 7/10`).
    ColonOrDigits,
    /// Question-style label: free words up to the first top-level colon.
    Phrase,
}

#[derive(Debug, Clone, Copy)]
pub struct LineRule {
    pub kind: LineKind,
    pub labels: &'static [&'static str],
    pub tail: Tail,
}

/// Ordered transition table of the parser.
pub const RULES: &[LineRule] = &[
    LineRule {
        kind: LineKind::Country,
        labels: &["Country"],
        tail: Tail::Colon,
    },
    LineRule {
        kind: LineKind::Industry,
        labels: &["Industry", "Market"],
        tail: Tail::Colon,
    },
    LineRule {
        kind: LineKind::Headline,
        labels: &["News headline", "Headline"],
        tail: Tail::Colon,
    },
    LineRule {
        kind: LineKind::Effect,
        labels: &["How does it affect"],
        tail: Tail::Phrase,
    },
    LineRule {
        kind: LineKind::Effect,
        labels: &["Effect", "Impact"],
        tail: Tail::Colon,
    },
    LineRule {
        kind: LineKind::Positivity,
        labels: &["Positivity score", "Positivity"],
        tail: Tail::ColonOrDigits,
    },
    LineRule {
        kind: LineKind::Importance,
        labels: &["Importance score", "Importance"],
        tail: Tail::ColonOrDigits,
    },
];

/// A line recognized by one of the [`RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedLine<'a> {
    pub kind: LineKind,
    pub value: &'a str,
}

/// Classify one line of model output. Untagged lines return `None`.
pub fn classify(line: &str) -> Option<TaggedLine<'_>> {
    let body = strip_lead(line.trim());
    for rule in RULES {
        for label in rule.labels {
            let Some(after) = strip_label(body, label) else {
                continue;
            };
            let Some(value) = field_value(after, rule.tail) else {
                continue;
            };
            return Some(TaggedLine {
                kind: rule.kind,
                value: trim_emphasis(value),
            });
        }
    }
    None
}

fn field_value(after: &str, tail: Tail) -> Option<&str> {
    if tail == Tail::Phrase {
        return label_colon(after).map(|i| &after[i + 1..]);
    }
    let rest = skip_label_note(after);
    if let Some(v) = rest.strip_prefix(':') {
        return Some(v);
    }
    match tail {
        Tail::ColonOrDigits if rest.starts_with(|c: char| c.is_ascii_digit()) => Some(rest),
        _ => None,
    }
}

fn is_filler(c: char) -> bool {
    c == '*' || c == '_' || c.is_whitespace()
}

/// Skip whitespace, emphasis and at most one balanced `( ... )` after a label.
/// An unbalanced note is left in place, so the caller rejects the line.
fn skip_label_note(s: &str) -> &str {
    let mut rest = s.trim_start_matches(is_filler);
    if rest.starts_with('(') {
        let mut depth = 0usize;
        for (i, c) in rest.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        rest = &rest[i + 1..];
                        break;
                    }
                }
                _ => {}
            }
        }
        rest = rest.trim_start_matches(is_filler);
    }
    rest
}

/// Remove list bullets, heading hashes, quote markers and leading emphasis.
fn strip_lead(s: &str) -> &str {
    let s = s.trim_start_matches(|c: char| matches!(c, '-' | '•' | '#' | '>') || c.is_whitespace());
    // "1. Country:" / "2) Country:"
    let digits = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let s = if digits > 0 && s[digits..].starts_with(['.', ')']) {
        s[digits + 1..].trim_start()
    } else {
        s
    };
    s.trim_start_matches(|c: char| c == '*' || c == '_')
}

/// Case-insensitive prefix match that stops on a word boundary.
fn strip_label<'a>(s: &'a str, label: &str) -> Option<&'a str> {
    let head = s.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = &s[label.len()..];
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(rest),
    }
}

/// Byte index of the first `:` outside parentheses and brackets.
fn label_colon(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Trim whitespace and dangling `**` / `__` left over from `**Label:**`.
pub(crate) fn trim_emphasis(s: &str) -> &str {
    s.trim_matches(is_filler)
}
