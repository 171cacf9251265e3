use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::github::{LanguageMap, RepoSummary, SearchUser};

/// How many languages are reported per user.
pub const TOP_LANGUAGES: usize = 3;

/// Sums over a user's repository list.
#[derive(Debug, Default, PartialEq)]
pub struct RepoTotals {
    pub forks: u64,
    pub stars: u64,
    pub size: u64,
    pub count: usize,
}

impl RepoTotals {
    pub fn from_repos(repos: &[RepoSummary]) -> Self {
        repos.iter().fold(Self::default(), |acc, r| Self {
            forks: acc.forks.saturating_add(r.forks_count),
            stars: acc.stars.saturating_add(r.stargazers_count),
            size: acc.size.saturating_add(r.size),
            count: acc.count + 1,
        })
    }

    /// Mean repository size, 0 for a user without repositories.
    pub fn average_size(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.size as f64 / self.count as f64
        }
    }
}

/// Counts, per language, the number of repositories it appears in.
///
/// The result is in order of first appearance; byte counts are ignored.
pub fn tally_languages<'a>(
    maps: impl IntoIterator<Item = &'a LanguageMap>,
) -> Vec<(String, u32)> {
    let mut counts: IndexMap<String, u32> = IndexMap::new();
    for language in maps.into_iter().flat_map(|map| map.keys()) {
        *counts.entry(language.clone()).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

/// Most frequent languages first; ties keep first-appearance order.
pub fn top_languages(mut counts: Vec<(String, u32)>) -> Vec<(String, u32)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_LANGUAGES);
    counts
}

/// Writes `20` rather than `20.0` when the mean has no fractional part.
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && *value >= 0.0 && *value <= u64::MAX as f64 {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// A search result with the aggregates the proxy adds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichedUser {
    pub id: Option<u64>,
    pub login: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub public_repos: u64,
    pub total_forks: u64,
    pub total_stars: u64,
    #[serde(serialize_with = "whole_as_integer")]
    pub average_size: f64,
    /// Serialized as `[["Rust", 4], ["Go", 2]]`.
    pub top_languages: Vec<(String, u32)>,
}

impl EnrichedUser {
    pub fn new(
        user: &SearchUser,
        public_repos: u64,
        totals: &RepoTotals,
        top_languages: Vec<(String, u32)>,
    ) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            avatar_url: user.avatar_url.clone(),
            html_url: user.html_url.clone(),
            public_repos,
            total_forks: totals.forks,
            total_stars: totals.stars,
            average_size: totals.average_size(),
            top_languages,
        }
    }

    /// Identity only, every aggregate zeroed.
    pub fn degraded(user: &SearchUser) -> Self {
        Self::new(user, 0, &RepoTotals::default(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repo(forks: u64, stars: u64, size: u64) -> RepoSummary {
        RepoSummary {
            forks_count: forks,
            stargazers_count: stars,
            size,
            languages_url: String::new(),
        }
    }

    fn langs(value: serde_json::Value) -> LanguageMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn user() -> SearchUser {
        SearchUser {
            id: Some(7),
            login: Some("octo".into()),
            avatar_url: Some("https://avatars/7".into()),
            html_url: Some("https://github.com/octo".into()),
            url: Some("https://api.github.com/users/octo".into()),
        }
    }

    #[test]
    fn totals_and_average() {
        let totals = RepoTotals::from_repos(&[repo(1, 5, 10), repo(2, 0, 20), repo(0, 3, 30)]);
        assert_eq!(totals.forks, 3);
        assert_eq!(totals.stars, 8);
        assert_eq!(totals.size, 60);
        assert_eq!(totals.average_size(), 20.0);
    }

    #[test]
    fn average_of_no_repos_is_zero() {
        let totals = RepoTotals::from_repos(&[]);
        assert_eq!(totals, RepoTotals::default());
        assert_eq!(totals.average_size(), 0.0);
    }

    #[test]
    fn average_keeps_fraction() {
        let totals = RepoTotals::from_repos(&[repo(0, 0, 1), repo(0, 0, 2)]);
        assert_eq!(totals.average_size(), 1.5);

        let record = EnrichedUser::new(&user(), 2, &totals, Vec::new());
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["average_size"], json!(1.5));
    }

    #[test]
    fn whole_average_serializes_as_integer() {
        let totals = RepoTotals::from_repos(&[repo(0, 0, 10), repo(0, 0, 20), repo(0, 0, 30)]);
        let record = EnrichedUser::new(&user(), 3, &totals, Vec::new());
        let text = serde_json::to_string(&record).unwrap();
        assert!(text.contains(r#""average_size":20,"#), "{text}");
    }

    #[test]
    fn missing_identity_fields_serialize_as_null() {
        let user = SearchUser {
            avatar_url: None,
            html_url: None,
            ..user()
        };
        let value = serde_json::to_value(EnrichedUser::degraded(&user)).unwrap();
        assert_eq!(value["avatar_url"], json!(null));
        assert_eq!(value["html_url"], json!(null));
        assert_eq!(value["login"], json!("octo"));
    }

    #[test]
    fn tally_counts_occurrences_not_bytes() {
        let maps = [
            langs(json!({"Go": 100})),
            langs(json!({"Go": 50, "Rust": 10})),
            langs(json!({"Rust": 5})),
        ];
        let counts = tally_languages(&maps);
        assert_eq!(counts, vec![("Go".into(), 2), ("Rust".into(), 2)]);

        let top = top_languages(counts);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|(_, n)| *n == 2));
    }

    #[test]
    fn top_three_descending_with_first_appearance_ties() {
        let maps = [
            langs(json!({"Shell": 1, "Python": 900})),
            langs(json!({"C": 10, "Python": 1})),
            langs(json!({"C": 10, "Makefile": 2})),
            langs(json!({"Lua": 3, "Python": 3})),
        ];
        let top = top_languages(tally_languages(&maps));
        assert_eq!(
            top,
            vec![("Python".into(), 3), ("C".into(), 2), ("Shell".into(), 1)]
        );
    }

    #[test]
    fn empty_maps_yield_no_languages() {
        let maps = [langs(json!({})), langs(json!({}))];
        assert!(top_languages(tally_languages(&maps)).is_empty());
    }

    #[test]
    fn degraded_record_serializes_zeroed() {
        let value = serde_json::to_value(EnrichedUser::degraded(&user())).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "login": "octo",
                "avatar_url": "https://avatars/7",
                "html_url": "https://github.com/octo",
                "public_repos": 0,
                "total_forks": 0,
                "total_stars": 0,
                "average_size": 0,
                "top_languages": []
            })
        );
    }

    #[test]
    fn top_languages_serialize_as_pairs() {
        let totals = RepoTotals::from_repos(&[repo(1, 2, 4)]);
        let record = EnrichedUser::new(&user(), 12, &totals, vec![("Rust".into(), 1)]);
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["top_languages"], json!([["Rust", 1]]));
        assert_eq!(value["average_size"], json!(4));
        assert_eq!(value["public_repos"], json!(12));
    }
}
