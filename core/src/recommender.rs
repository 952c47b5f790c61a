use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::index::{IndexConfig, SimilarityIndex};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub id: usize,
    pub title: String,
    pub storyline: String,
    pub score: f32,
}

impl ScoredResult {
    /// Score as a 0-100 match strength for display.
    pub fn match_percentage(&self) -> f32 {
        self.score * 100.0
    }
}

/// A corpus together with the index built from it. Immutable once published.
#[derive(Debug)]
pub struct Snapshot {
    pub corpus: Corpus,
    pub index: SimilarityIndex,
}

impl Snapshot {
    pub fn build(corpus: Corpus, config: IndexConfig) -> Self {
        let index = SimilarityIndex::build(&corpus, config);
        Self { corpus, index }
    }

    pub fn query(&self, text: &str, top_n: usize) -> Vec<ScoredResult> {
        self.index
            .rank(text, top_n)
            .into_iter()
            .map(|m| {
                let doc = self.corpus.get(m.doc_id as usize);
                ScoredResult {
                    id: m.doc_id as usize,
                    title: doc.title.clone(),
                    storyline: doc.storyline.clone(),
                    score: m.score,
                }
            })
            .collect()
    }
}

/// Plot-similarity recommender. Starts unbuilt; [`build`](Self::build)
/// publishes a fresh [`Snapshot`] in a single pointer swap, so concurrent
/// queries see either the old snapshot or the new one, never a partial build.
#[derive(Debug, Default)]
pub struct MovieRecommender {
    config: IndexConfig,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl MovieRecommender {
    pub fn new(config: IndexConfig) -> Self {
        Self { config, current: RwLock::new(None) }
    }

    pub fn is_built(&self) -> bool {
        self.current.read().is_some()
    }

    /// Index `corpus` and make it the visible state. Returns the number of
    /// indexed movies.
    pub fn build(&self, corpus: Corpus) -> usize {
        let snapshot = Arc::new(Snapshot::build(corpus, self.config));
        let num_movies = snapshot.corpus.len();
        *self.current.write() = Some(snapshot);
        num_movies
    }

    /// Load a CSV and build from it. On failure the previous state, built or
    /// not, is left in place.
    pub fn load_and_build<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let corpus = Corpus::load(path)?;
        Ok(self.build(corpus))
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.current.read().clone().ok_or(Error::NotBuilt)
    }

    /// Top `top_n` movies whose storyline shares weighted terms with `text`.
    /// An empty result means no positive match, not an error.
    pub fn query(&self, text: &str, top_n: usize) -> Result<Vec<ScoredResult>> {
        let snapshot = self.snapshot()?;
        let results = snapshot.query(text, top_n);
        tracing::debug!(top_n, hits = results.len(), "ranked query");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;

    #[test]
    fn query_before_build_fails() {
        let rec = MovieRecommender::default();
        assert!(!rec.is_built());
        assert!(matches!(rec.query("anything", DEFAULT_TOP_N), Err(Error::NotBuilt)));
    }

    #[test]
    fn failed_load_keeps_previous_snapshot() {
        let rec = MovieRecommender::default();
        rec.build(Corpus::from_documents(vec![Document::new(Some("Deep Sea"), Some("submarine crew trapped"))]));
        let err = rec.load_and_build("/nonexistent/movies.csv").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(rec.query("submarine", 5).unwrap().len(), 1);
    }

    #[test]
    fn match_percentage_scales_score() {
        let r = ScoredResult { id: 0, title: "t".into(), storyline: "s".into(), score: 0.25 };
        assert!((r.match_percentage() - 25.0).abs() < 1e-4);

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["title"], "t");
        assert_eq!(json["storyline"], "s");
        assert_eq!(json["score"], 0.25);
    }
}
