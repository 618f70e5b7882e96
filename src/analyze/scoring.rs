//! Score aggregation: per-industry averages and the country-level score.
//!
//! Both stages are pure functions over records. Inputs are clamped into the
//! [1,10] score domain here and nowhere else; the parser keeps raw values.
//!
//! Industry score = 0.7 * spread(mid) + 0.3 * (0.4*avgP + 0.6*avgI)
//! Overall score  = contrast(spread(mean of industries with data))
//!
//! The spread bands and the exponential contrast push mid-range results
//! toward the extremes so map colors separate good and bad markets.

use std::collections::BTreeMap;

use super::industry::match_industry;
use crate::model::{IndustryScore, NewsRecord};

pub const SCORE_MIN: f64 = 1.0;
pub const SCORE_MAX: f64 = 10.0;
/// Stand-in for absent or non-numeric scores, and the no-data country score.
pub const NEUTRAL_SCORE: f64 = 5.0;

const W_POSITIVITY: f64 = 0.4;
const W_IMPORTANCE: f64 = 0.6;
const W_SPREAD: f64 = 0.7;
const W_WEIGHTED: f64 = 0.3;

const CONTRAST_HIGH_PIVOT: f64 = 5.5;
const CONTRAST_LOW_PIVOT: f64 = 4.5;
const CONTRAST_EXPONENT: f64 = 1.2;

/// Linear map of the input sub-range `from` onto `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

const fn band(from_lo: f64, from_hi: f64, to_lo: f64, to_hi: f64) -> Band {
    Band {
        from: (from_lo, from_hi),
        to: (to_lo, to_hi),
    }
}

pub const INDUSTRY_SPREAD: [Band; 5] = [
    band(1.0, 2.0, 1.0, 1.5),
    band(2.0, 4.0, 1.5, 3.0),
    band(4.0, 6.0, 3.0, 6.0),
    band(6.0, 8.0, 6.0, 8.5),
    band(8.0, 10.0, 8.5, 10.0),
];

pub const OVERALL_SPREAD: [Band; 4] = [
    band(1.0, 3.0, 1.0, 2.0),
    band(3.0, 5.0, 2.0, 4.0),
    band(5.0, 7.0, 4.0, 8.0),
    band(7.0, 10.0, 8.0, 10.0),
];

/// Piecewise-linear remap. Bands are half-open except the last, which is
/// closed; input outside the covered range is clamped to it first.
pub fn remap(x: f64, bands: &[Band]) -> f64 {
    let (Some(first), Some(last)) = (bands.first(), bands.last()) else {
        return x;
    };
    let x = x.clamp(first.from.0, last.from.1);
    let b = bands
        .iter()
        .find(|b| x >= b.from.0 && x < b.from.1)
        .unwrap_or(last);
    let t = (x - b.from.0) / (b.from.1 - b.from.0);
    b.to.0 + t * (b.to.1 - b.to.0)
}

/// Exponential contrast around the [4.5, 5.5] dead zone.
pub fn contrast(score: f64) -> f64 {
    if score > CONTRAST_HIGH_PIVOT {
        CONTRAST_HIGH_PIVOT + (score - CONTRAST_HIGH_PIVOT).powf(CONTRAST_EXPONENT)
    } else if score < CONTRAST_LOW_PIVOT {
        CONTRAST_LOW_PIVOT - (CONTRAST_LOW_PIVOT - score).powf(CONTRAST_EXPONENT)
    } else {
        score
    }
}

/// Clamp a raw model score into [1,10]; absent or non-finite → neutral.
#[inline]
pub fn clamp_score(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if v.is_finite() => v.clamp(SCORE_MIN, SCORE_MAX),
        _ => NEUTRAL_SCORE,
    }
}

#[inline]
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    positivity: f64,
    importance: f64,
    count: usize,
}

/// Per-industry scores for every configured industry. Industries without a
/// matching record report [`IndustryScore::NO_DATA`].
pub fn aggregate_industries<'a, I>(records: I, industries: &[String]) -> BTreeMap<String, IndustryScore>
where
    I: IntoIterator<Item = &'a NewsRecord>,
{
    let mut acc: BTreeMap<&str, Acc> = industries.iter().map(|i| (i.as_str(), Acc::default())).collect();

    for rec in records {
        let Some(label) = rec.industry.as_deref() else {
            continue;
        };
        let Some(matched) = match_industry(label, industries) else {
            continue;
        };
        if let Some(a) = acc.get_mut(matched) {
            a.positivity += clamp_score(rec.positivity_score);
            a.importance += clamp_score(rec.importance_score);
            a.count += 1;
        }
    }

    acc.into_iter()
        .map(|(name, a)| (name.to_string(), industry_score(a)))
        .collect()
}

fn industry_score(a: Acc) -> IndustryScore {
    if a.count == 0 {
        return IndustryScore::NO_DATA;
    }
    let n = a.count as f64;
    let avg_p = a.positivity / n;
    let avg_i = a.importance / n;

    let spread = remap((avg_p + avg_i) / 2.0, &INDUSTRY_SPREAD);
    let weighted = W_POSITIVITY * avg_p + W_IMPORTANCE * avg_i;
    let blended = (W_SPREAD * spread + W_WEIGHTED * weighted).clamp(SCORE_MIN, SCORE_MAX);

    IndustryScore {
        positivity_score: round1(avg_p),
        importance_score: round1(avg_i),
        average_score: round1(blended),
    }
}

/// Country-level score from industry scores; zero-sentinel entries are
/// ignored and a country without data gets [`NEUTRAL_SCORE`].
pub fn aggregate_overall<'a, I>(scores: I) -> f64
where
    I: IntoIterator<Item = &'a IndustryScore>,
{
    let (sum, n) = scores
        .into_iter()
        .filter(|s| s.has_data())
        .fold((0.0f64, 0usize), |(sum, n), s| (sum + s.average_score, n + 1));
    if n == 0 {
        return NEUTRAL_SCORE;
    }

    let base = sum / n as f64;
    let spread = remap(base, &OVERALL_SPREAD);
    round1(contrast(spread).clamp(SCORE_MIN, SCORE_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn industries() -> Vec<String> {
        ["Beauty/wellness", "clothing/apparel", "retail", "ticketing/events"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn rec(industry: &str, p: Option<f64>, i: Option<f64>) -> NewsRecord {
        NewsRecord {
            country: "US".into(),
            industry: Some(industry.into()),
            headline: format!("{industry} {p:?} {i:?}"),
            link: String::new(),
            effect: None,
            positivity_score: p,
            importance_score: i,
            source: None,
            published_date: None,
            ingested_at: Utc::now(),
        }
    }

    fn score(avg: f64) -> IndustryScore {
        IndustryScore {
            positivity_score: avg,
            importance_score: avg,
            average_score: avg,
        }
    }

    #[test]
    fn remap_band_edges() {
        assert_eq!(remap(1.0, &INDUSTRY_SPREAD), 1.0);
        assert_eq!(remap(2.0, &INDUSTRY_SPREAD), 1.5);
        assert_eq!(remap(5.0, &INDUSTRY_SPREAD), 4.5);
        assert_eq!(remap(10.0, &INDUSTRY_SPREAD), 10.0);
        assert_eq!(remap(0.0, &INDUSTRY_SPREAD), 1.0);
        assert_eq!(remap(7.0, &OVERALL_SPREAD), 8.0);
    }

    #[test]
    fn contrast_dead_zone_is_identity() {
        assert_eq!(contrast(5.0), 5.0);
        assert_eq!(contrast(4.5), 4.5);
        assert!(contrast(8.0) > 8.0);
        assert!(contrast(2.0) < 2.0);
    }

    #[test]
    fn perfect_record_scores_ten() {
        let recs = vec![rec("retail", Some(10.0), Some(10.0))];
        let out = aggregate_industries(&recs, &industries());
        assert_eq!(out["retail"].average_score, 10.0);
        assert_eq!(out["retail"].positivity_score, 10.0);
    }

    #[test]
    fn blend_of_spread_and_weighted() {
        // mid 7 → spread 7.25; weighted 6.8; 0.7*7.25 + 0.3*6.8 = 7.115
        let recs = vec![rec("retail", Some(8.0), Some(6.0))];
        let out = aggregate_industries(&recs, &industries());
        assert_eq!(out["retail"].average_score, 7.1);
        assert_eq!(out["retail"].importance_score, 6.0);
    }

    #[test]
    fn empty_industries_report_zero_sentinel() {
        let recs = vec![rec("retail", Some(6.0), Some(6.0))];
        let out = aggregate_industries(&recs, &industries());
        assert_eq!(out.len(), 4);
        assert_eq!(out["clothing/apparel"], IndustryScore::NO_DATA);
        assert_eq!(out["ticketing/events"], IndustryScore::NO_DATA);
    }

    #[test]
    fn out_of_range_and_missing_scores_are_clamped_here() {
        let recs = vec![rec("retail", Some(15.0), None)];
        let out = aggregate_industries(&recs, &industries());
        assert_eq!(out["retail"].positivity_score, 10.0);
        assert_eq!(out["retail"].importance_score, 5.0);
    }

    #[test]
    fn records_without_industry_are_ignored() {
        let mut r = rec("retail", Some(9.0), Some(9.0));
        r.industry = None;
        let out = aggregate_industries(&[r], &industries());
        assert!(out.values().all(|s| *s == IndustryScore::NO_DATA));
    }

    #[test]
    fn overall_uses_only_industries_with_data() {
        let scores = [score(0.0), score(0.0), score(7.0), score(0.0)];
        let overall = aggregate_overall(&scores);
        // 7.0 → 8.0 → 5.5 + 2.5^1.2 ≈ 8.503
        assert_eq!(overall, 8.5);
        assert!((8.0..=10.0).contains(&overall));
    }

    #[test]
    fn overall_defaults_to_neutral_without_data() {
        assert_eq!(aggregate_overall(&[score(0.0), score(0.0)]), NEUTRAL_SCORE);
        assert_eq!(aggregate_overall(std::iter::empty()), NEUTRAL_SCORE);
    }

    #[test]
    fn overall_pushes_mixed_low_scores_down() {
        // mean 4.6 → 3.6 → 4.5 - 0.9^1.2 ≈ 3.62
        let overall = aggregate_overall(&[score(7.1), score(2.1)]);
        assert_eq!(overall, 3.6);
    }
}
