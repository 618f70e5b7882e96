//! # Country Store
//! Append-only history ledger plus one derived [`CountryView`] per country.
//!
//! Every append recomputes the affected country's view from scratch:
//! history → this country → last `window` by ingestion time → dedup by exact
//! headline (first wins) → industry aggregation → overall score. The new view
//! replaces the old one in a single map insert.
//!
//! The store itself is plain single-writer data; [`StoreHandle`] adds the
//! shared-ownership wrapper used by the service.

use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::analyze::aliases::AliasTable;
use crate::analyze::industry::match_industry;
use crate::analyze::scoring::{aggregate_industries, aggregate_overall};
use crate::model::{
    CountrySummary, CountryView, NewsRecord, ParsedRecord, RankedCountry, Snapshot, StoreSummary,
};

/// Bucket for records the model did not label with an industry.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone)]
pub struct StorePolicy {
    pub industries: Vec<String>,
    pub window: Duration,
    pub aliases: AliasTable,
}

impl StorePolicy {
    pub fn new(industries: Vec<String>, window_days: u32, aliases: AliasTable) -> Self {
        Self {
            industries,
            window: Duration::days(i64::from(window_days)),
            aliases,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CountryStore {
    policy: StorePolicy,
    history: Vec<NewsRecord>,
    views: BTreeMap<String, CountryView>,
    last_updated: Option<DateTime<Utc>>,
}

impl CountryStore {
    pub fn new(policy: StorePolicy) -> Self {
        Self {
            policy,
            history: Vec::new(),
            views: BTreeMap::new(),
            last_updated: None,
        }
    }

    pub fn policy(&self) -> &StorePolicy {
        &self.policy
    }

    /// Append parsed records for `country`, stamped with the current time.
    pub fn append_records(
        &mut self,
        country: &str,
        records: Vec<ParsedRecord>,
    ) -> Option<&CountryView> {
        self.append_records_at(country, records, Utc::now())
    }

    /// Append with an explicit ingestion time. An empty country key is
    /// rejected: nothing is stored and `None` is returned.
    pub fn append_records_at(
        &mut self,
        country: &str,
        records: Vec<ParsedRecord>,
        now: DateTime<Utc>,
    ) -> Option<&CountryView> {
        let key = country.trim();
        if key.is_empty() {
            debug!(target: "radar::store", n = records.len(), "records without country ignored");
            return None;
        }

        let n = records.len();
        self.history
            .extend(records.into_iter().map(|r| NewsRecord::stamp(key, r, now)));
        self.recompute(key, now);
        debug!(target: "radar::store", country = key, appended = n, "view recomputed");
        self.views.get(key)
    }

    pub fn country_view(&self, country: &str) -> Option<&CountryView> {
        self.views.get(country)
    }

    pub fn all_views(&self) -> &BTreeMap<String, CountryView> {
        &self.views
    }

    pub fn history(&self) -> &[NewsRecord] {
        &self.history
    }

    /// Full (unwindowed) history of one country, in insertion order.
    pub fn history_for(&self, country: &str) -> Vec<NewsRecord> {
        self.history
            .iter()
            .filter(|r| r.country == country)
            .cloned()
            .collect()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Record the completion time of a successful update run.
    pub fn mark_updated(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }

    pub fn cleanup_aliases(&mut self) -> Vec<(String, String)> {
        self.cleanup_aliases_at(Utc::now())
    }

    /// Merge alias countries that slipped past parse-time normalization.
    ///
    /// Only pairs where both the alias and the canonical country have a view
    /// are merged. Returns the merged `(alias, canonical)` pairs.
    pub fn cleanup_aliases_at(&mut self, now: DateTime<Utc>) -> Vec<(String, String)> {
        let pairs: Vec<(String, String)> = self
            .policy
            .aliases
            .pairs()
            .filter(|(a, c)| self.views.contains_key(*a) && self.views.contains_key(*c))
            .map(|(a, c)| (a.to_string(), c.to_string()))
            .collect();

        for (alias, canon) in &pairs {
            let mut moved = 0usize;
            for rec in self.history.iter_mut().filter(|r| &r.country == alias) {
                rec.country = canon.clone();
                moved += 1;
            }
            self.views.remove(alias);
            self.recompute(canon, now);
            info!(target: "radar::store", %alias, %canon, moved, "merged alias country");
        }
        pairs
    }

    /// Seed from a snapshot. Seeded views are kept as they were; countries that
    /// only appear in the seeded history get a freshly computed view.
    pub fn load(&mut self, snapshot: Snapshot, now: DateTime<Utc>) {
        self.history = snapshot
            .news_history
            .into_iter()
            .filter(|r| !r.country.trim().is_empty())
            .collect();
        self.views = snapshot.countries;
        self.last_updated = snapshot.last_updated;

        let missing: Vec<String> = self
            .history
            .iter()
            .map(|r| r.country.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|c| !self.views.contains_key(c))
            .collect();
        for c in missing {
            self.recompute(&c, now);
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.views.clear();
        self.last_updated = None;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            last_updated: self.last_updated,
            countries: self.views.clone(),
            news_history: self.history.clone(),
        }
    }

    pub fn summary(&self, top_n: usize) -> StoreSummary {
        let countries = self
            .views
            .values()
            .map(|v| CountrySummary {
                name: v.name.clone(),
                overall_score: v.overall_score,
                news_count: v.news_count,
                last_updated: v.last_updated,
            })
            .collect::<Vec<_>>();

        let mut ranked = self
            .views
            .values()
            .map(|v| RankedCountry {
                name: v.name.clone(),
                score: v.overall_score,
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(top_n);

        StoreSummary {
            total_countries: self.views.len(),
            total_news_items: self.history.len(),
            last_update: self.last_updated,
            countries,
            top_countries: ranked,
        }
    }

    /// This country's records inside the window, deduplicated by headline.
    pub fn window_for(&self, country: &str, now: DateTime<Utc>) -> Vec<&NewsRecord> {
        let cutoff = now
            .checked_sub_signed(self.policy.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut seen: HashSet<&str> = HashSet::new();
        self.history
            .iter()
            .filter(|r| r.country == country && r.ingested_at >= cutoff)
            .filter(|r| seen.insert(r.headline.as_str()))
            .collect()
    }

    fn build_view(&self, country: &str, now: DateTime<Utc>) -> CountryView {
        let window = self.window_for(country, now);
        let industries = &self.policy.industries;

        let industry_scores = aggregate_industries(window.iter().copied(), industries);
        let overall_score = aggregate_overall(industry_scores.values());

        let mut records_by_industry: BTreeMap<String, Vec<NewsRecord>> = BTreeMap::new();
        for rec in &window {
            let bucket = match rec.industry.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => match_industry(label, industries)
                    .unwrap_or(label)
                    .to_string(),
                _ => UNCATEGORIZED.to_string(),
            };
            records_by_industry
                .entry(bucket)
                .or_default()
                .push((*rec).clone());
        }

        CountryView {
            name: country.to_string(),
            last_updated: now,
            overall_score,
            industry_scores,
            records_by_industry,
            news_count: window.len(),
        }
    }

    fn recompute(&mut self, country: &str, now: DateTime<Utc>) {
        let view = self.build_view(country, now);
        self.views.insert(country.to_string(), view);
    }
}

/// Shared handle used by the HTTP layer and the updater.
///
/// Readers clone what they need out of a short read lock. Writers must be
/// serialized by the caller (see `update::Updater`).
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<RwLock<CountryStore>>,
}

impl StoreHandle {
    pub fn new(store: CountryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, CountryStore> {
        // A panicked writer leaves a fully replaced or untouched view map.
        self.inner.read().unwrap_or_else(|p| p.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, CountryStore> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> StorePolicy {
        StorePolicy::new(
            vec!["retail".into(), "clothing/apparel".into()],
            14,
            AliasTable::default_seed(),
        )
    }

    fn parsed(headline: &str, industry: &str, p: f64, i: f64) -> ParsedRecord {
        ParsedRecord {
            industry: Some(industry.into()),
            headline: headline.into(),
            positivity_score: Some(p),
            importance_score: Some(i),
            ..ParsedRecord::default()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn unbounded_window_keeps_all_history() {
        let policy = StorePolicy::new(vec!["retail".into()], u32::MAX, AliasTable::default_seed());
        let mut s = CountryStore::new(policy);
        s.append_records_at("US", vec![parsed("Old", "retail", 6.0, 6.0)], t0());
        let v = s
            .append_records_at("US", vec![parsed("New", "retail", 8.0, 8.0)], t0() + Duration::days(900))
            .cloned()
            .unwrap();
        assert_eq!(v.news_count, 2);
    }

    #[test]
    fn append_builds_view_with_all_industries() {
        let mut s = CountryStore::new(policy());
        let v = s
            .append_records_at("US", vec![parsed("A", "retail", 8.0, 6.0)], t0())
            .cloned()
            .unwrap();
        assert_eq!(v.name, "US");
        assert_eq!(v.industry_scores.len(), 2);
        assert_eq!(v.industry_scores["retail"].average_score, 7.1);
        assert_eq!(v.news_count, 1);
        assert_eq!(s.history()[0].ingested_at, t0());
    }

    #[test]
    fn empty_country_is_rejected() {
        let mut s = CountryStore::new(policy());
        assert!(s
            .append_records_at("  ", vec![parsed("A", "retail", 8.0, 6.0)], t0())
            .is_none());
        assert!(s.history().is_empty());
        assert!(s.all_views().is_empty());
    }

    #[test]
    fn duplicate_headlines_keep_first_ingested() {
        let mut s = CountryStore::new(policy());
        s.append_records_at("US", vec![parsed("Same", "retail", 10.0, 10.0)], t0());
        s.append_records_at(
            "US",
            vec![parsed("Same", "retail", 1.0, 1.0)],
            t0() + Duration::hours(1),
        );

        let window = s.window_for("US", t0() + Duration::hours(1));
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].positivity_score, Some(10.0));
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.country_view("US").unwrap().industry_scores["retail"].average_score, 10.0);
    }

    #[test]
    fn records_older_than_window_fall_out() {
        let mut s = CountryStore::new(policy());
        s.append_records_at("US", vec![parsed("Old", "retail", 1.0, 1.0)], t0());
        let later = t0() + Duration::days(15);
        s.append_records_at("US", vec![parsed("New", "retail", 9.0, 9.0)], later);

        let v = s.country_view("US").unwrap();
        assert_eq!(v.news_count, 1);
        assert_eq!(v.records_by_industry["retail"][0].headline, "New");
        assert_eq!(s.history_for("US").len(), 2);
    }

    #[test]
    fn records_are_grouped_by_matched_industry() {
        let mut s = CountryStore::new(policy());
        let mut loose = parsed("B", "Apparel", 6.0, 6.0);
        loose.industry = Some("Apparel".into());
        let mut none = parsed("C", "", 6.0, 6.0);
        none.industry = None;
        s.append_records_at("US", vec![loose, none, parsed("D", "Autos", 5.0, 5.0)], t0());

        let v = s.country_view("US").unwrap();
        assert!(v.records_by_industry.contains_key("clothing/apparel"));
        assert!(v.records_by_industry.contains_key(UNCATEGORIZED));
        assert!(v.records_by_industry.contains_key("Autos"));
    }

    #[test]
    fn cleanup_merges_alias_into_canonical() {
        let mut s = CountryStore::new(policy());
        s.append_records_at("US", vec![parsed("A", "retail", 8.0, 8.0)], t0());
        s.append_records_at("USA", vec![parsed("B", "retail", 4.0, 4.0)], t0());
        s.append_records_at("UK", vec![parsed("C", "retail", 4.0, 4.0)], t0());

        let merged = s.cleanup_aliases_at(t0());
        assert_eq!(merged, vec![("USA".to_string(), "US".to_string())]);
        assert!(s.country_view("USA").is_none());
        // UK has no canonical view, so it stays.
        assert!(s.country_view("UK").is_some());
        assert_eq!(s.country_view("US").unwrap().news_count, 2);
        assert!(s.history().iter().all(|r| r.country != "USA"));
    }

    #[test]
    fn load_keeps_seeded_views_and_fills_missing_ones() {
        let mut seeded = CountryStore::new(policy());
        seeded.append_records_at("US", vec![parsed("A", "retail", 8.0, 8.0)], t0());
        seeded.mark_updated(t0());
        let mut snap = seeded.snapshot();
        snap.news_history.push(NewsRecord::stamp(
            "Australia",
            parsed("Z", "retail", 9.0, 9.0),
            t0(),
        ));

        let mut s = CountryStore::new(policy());
        s.load(snap.clone(), t0());
        assert_eq!(s.country_view("US"), snap.countries.get("US"));
        assert!(s.country_view("Australia").is_some());
        assert_eq!(s.last_updated(), Some(t0()));

        s.reset();
        assert!(s.all_views().is_empty() && s.history().is_empty());
    }

    #[test]
    fn summary_ranks_best_countries() {
        let mut s = CountryStore::new(policy());
        s.append_records_at("US", vec![parsed("A", "retail", 9.0, 9.0)], t0());
        s.append_records_at("Europe", vec![parsed("B", "retail", 2.0, 2.0)], t0());
        s.append_records_at("Australia", vec![parsed("C", "retail", 6.0, 6.0)], t0());

        let sum = s.summary(2);
        assert_eq!(sum.total_countries, 3);
        assert_eq!(sum.total_news_items, 3);
        let top: Vec<_> = sum.top_countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(top, vec!["US", "Australia"]);
    }
}
