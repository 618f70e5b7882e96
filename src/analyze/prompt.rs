//! Research prompt for the LLM.
//!
//! Only the substitution points are contractual: countries, industries, the
//! current date and the start of the lookback window. The requested output
//! format mirrors the labels understood by [`super::rules`].

use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptVars {
    pub countries: Vec<String>,
    pub industries: Vec<String>,
    pub current_date: NaiveDate,
    pub window_start: NaiveDate,
}

impl PromptVars {
    /// Window of `lookback_days` ending at `today`.
    pub fn for_date(
        countries: &[String],
        industries: &[String],
        today: NaiveDate,
        lookback_days: u32,
    ) -> Self {
        Self {
            countries: countries.to_vec(),
            industries: industries.to_vec(),
            current_date: today,
            window_start: today
                .checked_sub_signed(Duration::days(i64::from(lookback_days)))
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

pub fn build_prompt(v: &PromptVars) -> String {
    let today = v.current_date.format("%Y-%m-%d");
    let since = v.window_start.format("%Y-%m-%d");
    let countries = v.countries.join(", ");
    let industries = v.industries.join(", ");

    format!(
        r#"You are an analyst of macro- and microeconomic trends, with emphasis on macroeconomics, as they affect the advertising business.

Today's date is {today}. Only include articles published between {since} and {today}. Older articles are not acceptable.

The answer feeds a map dashboard where a user clicks a country to see its latest market news in order of importance.

Use exactly this format, one block per news item:

Country:
Industry:
News headline (with links and date): "Headline text" (Source, Date) [Link text](FULL_ARTICLE_URL)
How does it affect the advertising business:
Positivity score (10 being very positive for the business, 1 being very negative for the business):
Importance score (10 being very important for the business, 1 being very unimportant for the business):

Variables
{{Regions}}: {countries}
{{Possible industries}}: {industries}

Requirements:
- Only news published from {since} to {today}; verify each publication date.
- Prefer credible economic and financial sources (Bloomberg, Reuters, CNBC, Financial Times, Wall Street Journal, official government and central bank releases).
- Give 2-5 items per country, most important first; skip a country with no recent news.
- Label every item with one industry from: {industries}
- Give full article URLs, formatted as [Article Title](https://full-article-url), never bare domains.
- Mention competitor moves and advertising data-privacy rules where relevant."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> PromptVars {
        let countries = vec!["US".to_string(), "Canada".to_string()];
        let industries = vec!["tech".to_string(), "finance".to_string()];
        let today = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        PromptVars::for_date(&countries, &industries, today, 7)
    }

    #[test]
    fn window_start_is_lookback_days_before_today() {
        let v = vars();
        assert_eq!(v.window_start, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn huge_lookback_clamps_to_earliest_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let v = PromptVars::for_date(&[], &[], today, u32::MAX);
        assert_eq!(v.window_start, NaiveDate::MIN);
    }

    #[test]
    fn variables_are_interpolated() {
        let p = build_prompt(&vars());
        assert!(p.contains("{Regions}: US, Canada"));
        assert!(p.contains("{Possible industries}: tech, finance"));
        assert!(p.contains("between 2024-06-01 and 2024-06-08"));
    }

    #[test]
    fn requested_format_uses_parser_labels() {
        let p = build_prompt(&vars());
        for line in p.lines().filter(|l| l.ends_with(':')) {
            if line.starts_with("Country")
                || line.starts_with("Industry")
                || line.starts_with("Positivity score")
                || line.starts_with("Importance score")
            {
                assert!(crate::analyze::rules::classify(line).is_some(), "{line}");
            }
        }
    }
}
