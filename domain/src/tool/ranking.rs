//! Relevance ranking for tool discovery.
//!
//! Scores are additive:
//!
//! | Signal | Weight |
//! |--------|--------|
//! | Tool name appears in the query | +10 |
//! | Query keyword found in the tool name | +3 each |
//! | Query keyword found in the description | +2 each |
//! | Category matches | +5 |
//! | Historical success rate | +2 × rate |
//! | Historical failures | −0.5 each, at most 3 counted |
//!
//! Ranking is a pure function of the specs, their metrics, and the query, so
//! identical inputs always produce identical output.

use super::entities::ToolSpec;
use super::metrics::ToolMetrics;
use serde::{Deserialize, Serialize};

pub const NAME_MATCH_WEIGHT: f64 = 10.0;
pub const NAME_KEYWORD_WEIGHT: f64 = 3.0;
pub const DESCRIPTION_KEYWORD_WEIGHT: f64 = 2.0;
pub const CATEGORY_WEIGHT: f64 = 5.0;
pub const SUCCESS_RATE_WEIGHT: f64 = 2.0;
pub const FAILURE_PENALTY: f64 = 0.5;
pub const MAX_PENALIZED_FAILURES: u64 = 3;

/// Default number of tools returned by discovery
pub const DEFAULT_SELECT_LIMIT: usize = 5;

/// Lowercase, strip punctuation, keep words longer than two characters.
/// Duplicates are dropped, first occurrence wins.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let mut keywords: Vec<String> = Vec::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() > 2 && !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

/// A prepared discovery query
#[derive(Debug, Clone, PartialEq)]
pub struct RankingQuery {
    text: String,
    keywords: Vec<String>,
    category: Option<String>,
}

impl RankingQuery {
    pub fn new(query: &str) -> Self {
        Self {
            text: query.to_lowercase(),
            keywords: extract_keywords(query),
            category: None,
        }
    }

    /// Restrict the category bonus to an explicit category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into().to_lowercase());
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn matches_category(&self, category: &str) -> bool {
        let category = category.to_lowercase();
        match &self.category {
            Some(wanted) => *wanted == category,
            None => self.keywords.iter().any(|k| *k == category),
        }
    }
}

/// Relevance of one tool for a query
pub fn relevance_score(
    spec: &ToolSpec,
    metrics: Option<&ToolMetrics>,
    query: &RankingQuery,
) -> f64 {
    let name = spec.name.to_lowercase();
    let description = spec.description.to_lowercase();
    let mut score = 0.0;

    if !name.is_empty() && query.text.contains(&name) {
        score += NAME_MATCH_WEIGHT;
    }

    for keyword in &query.keywords {
        if description.contains(keyword.as_str()) {
            score += DESCRIPTION_KEYWORD_WEIGHT;
        }
        if name.contains(keyword.as_str()) {
            score += NAME_KEYWORD_WEIGHT;
        }
    }

    if query.matches_category(&spec.category) {
        score += CATEGORY_WEIGHT;
    }

    if let Some(metrics) = metrics {
        if let Some(rate) = metrics.success_rate() {
            score += rate * SUCCESS_RATE_WEIGHT;
        }
        score -= metrics.failure_count.min(MAX_PENALIZED_FAILURES) as f64 * FAILURE_PENALTY;
    }

    score
}

/// A tool with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTool {
    pub name: String,
    pub score: f64,
}

/// Rank candidates (given in insertion order) and keep the top `limit`
/// positive scores. Ties keep insertion order.
pub fn rank_tools<'a>(
    candidates: impl IntoIterator<Item = (&'a ToolSpec, Option<&'a ToolMetrics>)>,
    query: &RankingQuery,
    limit: usize,
) -> Vec<ScoredTool> {
    let mut scored: Vec<ScoredTool> = candidates
        .into_iter()
        .map(|(spec, metrics)| ScoredTool {
            name: spec.name.clone(),
            score: relevance_score(spec, metrics, query),
        })
        .filter(|s| s.score > 0.0)
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, description: &str, category: &str) -> ToolSpec {
        ToolSpec::new(name, description).with_category(category)
    }

    #[test]
    fn test_extract_keywords() {
        assert_eq!(
            extract_keywords("What's the Weather, in Tokyo?? in tokyo"),
            vec!["whats", "the", "weather", "tokyo"]
        );
        assert!(extract_keywords("a an to").is_empty());
    }

    #[test]
    fn test_exact_name_beats_category_only_match() {
        let weather = spec("weather", "Look up conditions", "misc");
        let forecast = spec("forecast", "Predict conditions", "weather");
        let query = RankingQuery::new("weather please");

        let ranked = rank_tools([(&forecast, None), (&weather, None)], &query, 5);
        assert_eq!(ranked[0].name, "weather");
        assert_eq!(ranked[1].name, "forecast");
        assert!(ranked[0].score > ranked[1].score);
        assert_eq!(ranked[1].score, CATEGORY_WEIGHT);
    }

    #[test]
    fn test_zero_scores_are_dropped() {
        let a = spec("echo", "Echo text", "util");
        let ranked = rank_tools([(&a, None)], &RankingQuery::new("deploy cluster"), 5);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let a = spec("alpha", "sends mail", "general");
        let b = spec("beta", "sends mail", "general");
        let c = spec("gamma", "sends mail", "general");
        let ranked = rank_tools(
            [(&a, None), (&b, None), (&c, None)],
            &RankingQuery::new("mail"),
            2,
        );
        let names: Vec<_> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_history_bonus_and_penalty() {
        let tool = spec("search", "find documents", "general");
        let query = RankingQuery::new("find");
        let base = relevance_score(&tool, None, &query);

        let mut good = ToolMetrics::default();
        good.record_success(1);
        assert_eq!(relevance_score(&tool, Some(&good), &query), base + 2.0);

        let mut bad = ToolMetrics::default();
        for _ in 0..5 {
            bad.record_failure(1, "x");
        }
        // rate 0, penalty capped at three failures
        assert_eq!(relevance_score(&tool, Some(&bad), &query), base - 1.5);
    }

    #[test]
    fn test_explicit_category() {
        let tool = spec("ban", "remove a member", "moderation");
        let query = RankingQuery::new("something").with_category("Moderation");
        assert_eq!(relevance_score(&tool, None, &query), CATEGORY_WEIGHT);
    }

    #[test]
    fn test_ranking_is_reproducible() {
        let a = spec("fetch_url", "fetch a web page", "web");
        let b = spec("http_request", "make an http request to a url", "web");
        let query = RankingQuery::new("fetch the url over http");
        let first = rank_tools([(&a, None), (&b, None)], &query, 5);
        let second = rank_tools([(&a, None), (&b, None)], &query, 5);
        assert_eq!(first, second);
    }
}
