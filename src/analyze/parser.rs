//! # Response parser
//! Line-oriented state machine that turns the research model's free-text
//! answer into per-country [`ParsedRecord`]s.
//!
//! Lines are classified by the ordered table in [`super::rules`]. Field lines
//! accumulate into one [`PartialRecord`]; a *flush* moves it into the output
//! when both a country and a headline are known. Flushes happen on a new
//! country line, on an industry line that follows a populated record, on a
//! second headline in the same block, and at end of input.
//!
//! The parser never fails: anything it cannot extract becomes `None`/empty.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

use super::aliases::AliasTable;
use super::rules::{classify, trim_emphasis, LineKind};
use crate::model::ParsedRecord;

static RE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link regex"));
static RE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quote regex"));
static RE_SOURCE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*([^(),]+?)\s*,\s*([^()]+?)\s*\)").expect("source/date regex"));
static RE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("digits regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// No country seen yet (or the last country line was empty); field lines are ignored.
    AwaitingCountry,
    AccumulatingFields,
}

/// Fields collected since the last flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub industry: Option<String>,
    pub headline: Option<String>,
    pub link: String,
    pub effect: Option<String>,
    pub positivity: Option<f64>,
    pub importance: Option<f64>,
    pub source: Option<String>,
    pub published_date: Option<String>,
}

impl PartialRecord {
    /// Anything beyond the industry label has been filled in.
    fn is_populated(&self) -> bool {
        self.headline.is_some()
            || self.effect.is_some()
            || self.positivity.is_some()
            || self.importance.is_some()
            || !self.link.is_empty()
    }

    /// Records without a headline are dropped here.
    fn into_record(self) -> Option<ParsedRecord> {
        let headline = self.headline?;
        Some(ParsedRecord {
            industry: self.industry,
            headline,
            link: self.link,
            effect: self.effect,
            positivity_score: self.positivity,
            importance_score: self.importance,
            source: self.source,
            published_date: self.published_date,
        })
    }
}

/// Parser output plus the number of populated records dropped for lack of a headline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: BTreeMap<String, Vec<ParsedRecord>>,
    pub dropped: usize,
}

impl ParseOutcome {
    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

pub struct ResponseParser<'a> {
    aliases: &'a AliasTable,
    state: ParserState,
    country: Option<String>,
    partial: PartialRecord,
    out: ParseOutcome,
}

impl<'a> ResponseParser<'a> {
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self {
            aliases,
            state: ParserState::AwaitingCountry,
            country: None,
            partial: PartialRecord::default(),
            out: ParseOutcome::default(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn partial(&self) -> &PartialRecord {
        &self.partial
    }

    pub fn feed_line(&mut self, line: &str) {
        let Some(tagged) = classify(line) else {
            return;
        };
        let value = tagged.value;
        if tagged.kind != LineKind::Country && self.state == ParserState::AwaitingCountry {
            return;
        }

        match tagged.kind {
            LineKind::Country => self.start_country(value),
            LineKind::Industry => {
                if self.partial.is_populated() {
                    self.flush();
                }
                self.partial = PartialRecord {
                    industry: non_empty(value),
                    ..PartialRecord::default()
                };
            }
            LineKind::Headline => {
                if self.partial.headline.is_some() {
                    let industry = self.partial.industry.clone();
                    self.flush();
                    self.partial.industry = industry;
                }
                let h = extract_headline(value);
                self.partial.headline = h.headline;
                self.partial.link = h.link;
                self.partial.source = h.source;
                self.partial.published_date = h.published_date;
            }
            LineKind::Effect => self.partial.effect = non_empty(value),
            LineKind::Positivity => self.partial.positivity = first_integer(value),
            LineKind::Importance => self.partial.importance = first_integer(value),
        }
    }

    /// Flush whatever is still accumulated and return the result.
    pub fn finish(mut self) -> ParseOutcome {
        self.flush();
        self.out
    }

    fn start_country(&mut self, value: &str) {
        self.flush();
        let name = self.aliases.canonical(value);
        if name.is_empty() {
            self.country = None;
            self.state = ParserState::AwaitingCountry;
        } else {
            self.country = Some(name.to_string());
            self.state = ParserState::AccumulatingFields;
        }
    }

    fn flush(&mut self) {
        let partial = std::mem::take(&mut self.partial);
        let Some(country) = self.country.as_deref() else {
            return;
        };
        let populated = partial.is_populated();
        match partial.into_record() {
            Some(rec) => self
                .out
                .records
                .entry(country.to_string())
                .or_default()
                .push(rec),
            None if populated => {
                self.out.dropped += 1;
                debug!(target: "radar::parser", %country, "dropping record without headline");
            }
            None => {}
        }
    }
}

/// Parse a whole response. See the module docs for the flush rules.
pub fn parse_response(raw: &str, aliases: &AliasTable) -> BTreeMap<String, Vec<ParsedRecord>> {
    parse_response_with_stats(raw, aliases).records
}

pub fn parse_response_with_stats(raw: &str, aliases: &AliasTable) -> ParseOutcome {
    let mut p = ResponseParser::new(aliases);
    for line in raw.lines() {
        p.feed_line(line);
    }
    p.finish()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlineParts {
    pub headline: Option<String>,
    pub link: String,
    pub source: Option<String>,
    pub published_date: Option<String>,
}

/// Split a headline value into text, link and the `(Source, Date)` suffix.
pub fn extract_headline(value: &str) -> HeadlineParts {
    let text = normalize_quotes(&html_escape::decode_html_entities(value));
    let quoted = RE_QUOTED
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    let mut parts = HeadlineParts::default();
    let rest = match RE_LINK.captures(&text) {
        Some(caps) => {
            let link_text = caps.get(1).map(|m| m.as_str().trim().to_string());
            parts.headline = quoted.or(link_text);
            parts.link = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            RE_LINK.replace(&text, "").into_owned()
        }
        None => {
            parts.headline = quoted.or_else(|| Some(text.replace('*', "").trim().to_string()));
            text.clone()
        }
    };
    parts.headline = parts.headline.filter(|h| !h.is_empty());

    if let Some(caps) = RE_SOURCE_DATE.captures_iter(&rest).last() {
        parts.source = caps.get(1).and_then(|m| non_empty(m.as_str()));
        parts.published_date = caps.get(2).and_then(|m| non_empty(m.as_str()));
    }
    parts
}

/// First run of ASCII digits as an integer score; `None` if absent or too large.
pub fn first_integer(value: &str) -> Option<f64> {
    RE_DIGITS
        .find(value)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(f64::from)
}

fn normalize_quotes(s: &str) -> String {
    s.replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
}

fn non_empty(s: &str) -> Option<String> {
    let t = trim_emphasis(s);
    (!t.is_empty()).then(|| t.to_string())
}
