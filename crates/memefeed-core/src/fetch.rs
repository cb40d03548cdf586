//! Deduplicating fetch adapter over an external content source.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::item::{Item, ItemId};

/// One batch request against a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub topic: String,
    pub limit: usize,
}

/// External source of candidate items.
///
/// Implementations return a batch already filtered for safety and media
/// format. Scoring and deduplication happen in [`DedupFetcher`].
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_batch(&self, query: &FetchQuery) -> Result<Vec<Item>>;
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub topics: Vec<String>,
    pub batch_size: usize,
    pub min_score: u64,
}

pub struct DedupFetcher<S> {
    source: S,
    settings: FetchSettings,
}

impl<S: ContentSource> DedupFetcher<S> {
    pub fn new(source: S, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One unseen item scoring at least the configured minimum, or `None`.
    ///
    /// Source failures are logged and reported as `None`.
    pub async fn fetch_unseen(&self, seen: &HashSet<ItemId>) -> Option<Item> {
        let query = self.next_query()?;
        let candidates = match self.source.fetch_batch(&query).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(topic = %query.topic, error = %err, "content source failed");
                return None;
            }
        };
        let total = candidates.len();
        let picked = pick_unseen(
            candidates,
            self.settings.min_score,
            seen,
            &mut rand::thread_rng(),
        );
        tracing::debug!(
            topic = %query.topic,
            candidates = total,
            picked = picked.as_ref().map(|item| item.id().as_str()),
            "fetched batch"
        );
        picked
    }

    fn next_query(&self) -> Option<FetchQuery> {
        let topic = self.settings.topics.choose(&mut rand::thread_rng())?;
        Some(FetchQuery {
            topic: topic.clone(),
            limit: self.settings.batch_size,
        })
    }
}

/// Uniformly picks one candidate with `score >= min_score` whose identity is
/// not in `seen`.
pub fn pick_unseen<R: Rng>(
    candidates: Vec<Item>,
    min_score: u64,
    seen: &HashSet<ItemId>,
    rng: &mut R,
) -> Option<Item> {
    let mut eligible: Vec<Item> = candidates
        .into_iter()
        .filter(|item| item.score() >= min_score && !seen.contains(item.id()))
        .collect();
    if eligible.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..eligible.len());
    Some(eligible.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn item(id: &str, score: u64) -> Item {
        Item::new(id, format!("https://i.redd.it/{id}.png"), id, score, "r/memes", "", 250)
    }

    #[test]
    fn filters_low_scores_and_seen_ids() {
        let seen: HashSet<ItemId> = [ItemId::new("b")].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let candidates = vec![item("a", 100), item("b", 9000), item("c", 5000)];
            let picked = pick_unseen(candidates, 5000, &seen, &mut rng).unwrap();
            assert_eq!(picked.id().as_str(), "c");
        }
    }

    #[test]
    fn nothing_eligible_returns_none() {
        let seen: HashSet<ItemId> = [ItemId::new("a")].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_unseen(vec![item("a", 9000)], 10, &seen, &mut rng).is_none());
        assert!(pick_unseen(Vec::new(), 0, &HashSet::new(), &mut rng).is_none());
    }

    #[test]
    fn picks_every_eligible_candidate_eventually() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut picked = HashSet::new();
        for _ in 0..200 {
            let candidates = vec![item("a", 10), item("b", 10), item("c", 10)];
            let item = pick_unseen(candidates, 0, &HashSet::new(), &mut rng).unwrap();
            picked.insert(item.id().clone());
        }
        assert_eq!(picked.len(), 3);
    }

    struct ScriptedSource {
        batches: Mutex<Vec<Result<Vec<Item>>>>,
        queries: Mutex<Vec<FetchQuery>>,
    }

    #[async_trait]
    impl ContentSource for ScriptedSource {
        async fn fetch_batch(&self, query: &FetchQuery) -> Result<Vec<Item>> {
            self.queries.lock().unwrap().push(query.clone());
            self.batches.lock().unwrap().remove(0)
        }
    }

    fn fetcher(batches: Vec<Result<Vec<Item>>>) -> DedupFetcher<ScriptedSource> {
        DedupFetcher::new(
            ScriptedSource {
                batches: Mutex::new(batches),
                queries: Mutex::new(Vec::new()),
            },
            FetchSettings {
                topics: vec!["memes".to_string()],
                batch_size: 50,
                min_score: 5000,
            },
        )
    }

    #[tokio::test]
    async fn source_errors_become_unavailable() {
        let fetcher = fetcher(vec![Err(anyhow!("connection reset"))]);
        assert!(fetcher.fetch_unseen(&HashSet::new()).await.is_none());
    }

    #[tokio::test]
    async fn query_uses_configured_topic_and_batch_size() {
        let fetcher = fetcher(vec![Ok(vec![item("a", 6000)])]);
        let picked = fetcher.fetch_unseen(&HashSet::new()).await.unwrap();
        assert_eq!(picked.id().as_str(), "a");
        let queries = fetcher.source().queries.lock().unwrap();
        assert_eq!(
            queries.as_slice(),
            [FetchQuery {
                topic: "memes".to_string(),
                limit: 50
            }]
        );
    }

    #[tokio::test]
    async fn no_topics_means_unavailable() {
        let fetcher = DedupFetcher::new(
            ScriptedSource {
                batches: Mutex::new(Vec::new()),
                queries: Mutex::new(Vec::new()),
            },
            FetchSettings {
                topics: Vec::new(),
                batch_size: 50,
                min_score: 0,
            },
        );
        assert!(fetcher.fetch_unseen(&HashSet::new()).await.is_none());
    }
}
