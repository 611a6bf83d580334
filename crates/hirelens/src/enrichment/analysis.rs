use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Repository;

const TOP_N: usize = 10;
const ACTIVE_WINDOW_DAYS: i64 = 365;

/// Summary metrics over a user's repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileAnalysis {
    pub total_repos: usize,
    pub active_repos: usize,
    /// Most used languages, most frequent first.
    pub languages: Vec<String>,
    pub topics: Vec<String>,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Repository count; GitHub's REST API exposes no cheap commit total.
    pub total_contributions: usize,
    pub original_repos: usize,
    pub forked_repos: usize,
    pub language_diversity: usize,
    pub average_repo_stars: f64,
}

/// Frequency-ordered items, ties broken by first appearance.
struct Histogram<'a> {
    order: Vec<(&'a str, usize)>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Histogram<'a> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, item: &'a str) {
        match self.index.get(item) {
            Some(&slot) => self.order[slot].1 += 1,
            None => {
                self.index.insert(item, self.order.len());
                self.order.push((item, 1));
            }
        }
    }

    fn distinct(&self) -> usize {
        self.order.len()
    }

    fn top(mut self, n: usize) -> Vec<String> {
        // sort_by is stable, so equal counts keep first-seen order.
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.order
            .into_iter()
            .take(n)
            .map(|(item, _)| item.to_string())
            .collect()
    }
}

/// Computes profile metrics. Stars and forks count original repositories
/// only; languages, topics and activity look at every repository.
pub fn analyze(repos: &[Repository], now: DateTime<Utc>) -> ProfileAnalysis {
    if repos.is_empty() {
        return ProfileAnalysis::default();
    }

    let originals: Vec<&Repository> = repos.iter().filter(|r| !r.is_fork).collect();

    let mut languages = Histogram::new();
    let mut topics = Histogram::new();
    for repo in repos {
        if let Some(lang) = repo.language.as_deref() {
            languages.add(lang);
        }
        for topic in &repo.topics {
            topics.add(topic);
        }
    }

    let total_stars: u64 = originals.iter().map(|r| r.stars).sum();
    let total_forks: u64 = originals.iter().map(|r| r.forks).sum();

    let cutoff = now - Duration::days(ACTIVE_WINDOW_DAYS);
    let active_repos = repos
        .iter()
        .filter(|r| r.updated_at.is_some_and(|t| t > cutoff))
        .count();

    let average_repo_stars = if originals.is_empty() {
        0.0
    } else {
        total_stars as f64 / originals.len() as f64
    };

    ProfileAnalysis {
        total_repos: repos.len(),
        active_repos,
        language_diversity: languages.distinct(),
        languages: languages.top(TOP_N),
        topics: topics.top(TOP_N),
        total_stars,
        total_forks,
        total_contributions: repos.len(),
        original_repos: originals.len(),
        forked_repos: repos.len() - originals.len(),
        average_repo_stars,
    }
}
