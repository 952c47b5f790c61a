use crate::corpus::Corpus;
use crate::tokenizer::{normalize, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type TermId = u32;
pub type DocId = u32;

/// Term-weighting knobs. The default is raw term counts with smoothed IDF,
/// `ln((1 + n) / (1 + df)) + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Use `1 + ln(tf)` instead of the raw count.
    pub sublinear_tf: bool,
    /// Use `ln((1 + n) / (1 + df)) + 1` instead of `ln(n / df) + 1`.
    pub smooth_idf: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { sublinear_tf: false, smooth_idf: true }
    }
}

impl IndexConfig {
    fn tf(&self, raw: u32) -> f32 {
        if raw == 0 {
            0.0
        } else if self.sublinear_tf {
            1.0 + (raw as f32).ln()
        } else {
            raw as f32
        }
    }

    fn idf(&self, num_docs: u32, df: u32) -> f32 {
        let (n, df) = (num_docs as f32, df.max(1) as f32);
        if self.smooth_idf {
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        } else {
            (n / df).ln() + 1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // l2-normalized tf-idf weight
}

/// A corpus row with a strictly positive similarity to some query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub doc_id: DocId,
    pub score: f32,
}

/// TF-IDF weight matrix over a frozen vocabulary, stored column-wise as
/// postings lists.
///
/// Rows are L2-normalized at build time, so the cosine similarity with an
/// L2-normalized query is a plain dot product. Every accumulation runs in
/// ascending term id and ascending doc id order, which keeps scores
/// bit-identical across rebuilds of the same corpus.
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    config: IndexConfig,
    dictionary: HashMap<String, TermId>,
    idf: Vec<f32>,
    postings: Vec<Vec<Posting>>, // indexed by term id, sorted by doc_id
    num_docs: u32,
}

impl SimilarityIndex {
    /// Build from the corpus' normalized storylines. An empty corpus yields an
    /// empty index on which every query matches nothing.
    pub fn build(corpus: &Corpus, config: IndexConfig) -> Self {
        let term_counts: Vec<HashMap<&str, u32>> = corpus
            .iter()
            .map(|doc| {
                let mut counts: HashMap<&str, u32> = HashMap::new();
                for term in tokenize(&doc.normalized_text) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // Column ids follow lexicographic term order.
        let vocabulary: BTreeSet<&str> = term_counts.iter().flat_map(|c| c.keys().copied()).collect();
        let dictionary: HashMap<String, TermId> = vocabulary
            .iter()
            .enumerate()
            .map(|(tid, term)| (term.to_string(), tid as TermId))
            .collect();

        let num_docs = corpus.len() as u32;
        let mut df = vec![0u32; dictionary.len()];
        for counts in &term_counts {
            for term in counts.keys() {
                df[dictionary[*term] as usize] += 1;
            }
        }
        let idf: Vec<f32> = df.iter().map(|&d| config.idf(num_docs, d)).collect();

        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); dictionary.len()];
        let mut empty_rows = 0usize;
        for (doc_id, counts) in term_counts.iter().enumerate() {
            let row: BTreeMap<TermId, f32> = counts
                .iter()
                .map(|(term, &tf_raw)| {
                    let tid = dictionary[*term];
                    (tid, config.tf(tf_raw) * idf[tid as usize])
                })
                .collect();
            let norm = row.values().map(|w| w * w).sum::<f32>().sqrt();
            if norm == 0.0 {
                empty_rows += 1;
                continue;
            }
            for (tid, w) in row {
                postings[tid as usize].push(Posting { doc_id: doc_id as DocId, weight: w / norm });
            }
        }

        tracing::info!(num_docs, num_terms = dictionary.len(), empty_rows, "built tf-idf index");
        Self { config, dictionary, idf, postings, num_docs }
    }

    /// Row count of the weight matrix; always the corpus length it was built from.
    pub fn num_rows(&self) -> usize { self.num_docs as usize }

    pub fn vocabulary_len(&self) -> usize { self.dictionary.len() }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    /// Sparse weight row for one document, ordered by term id.
    pub fn row(&self, doc_id: DocId) -> Vec<(TermId, f32)> {
        self.postings
            .iter()
            .enumerate()
            .filter_map(|(tid, plist)| {
                plist
                    .binary_search_by_key(&doc_id, |p| p.doc_id)
                    .ok()
                    .map(|i| (tid as TermId, plist[i].weight))
            })
            .collect()
    }

    /// Project free text into the frozen vocabulary. Unknown terms are
    /// dropped; a query with no known terms gives an empty vector.
    pub fn query_vector(&self, text: &str) -> Vec<(TermId, f32)> {
        let normalized = normalize(text);
        let mut tf_q_raw: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in tokenize(&normalized) {
            if let Some(&tid) = self.dictionary.get(term) {
                *tf_q_raw.entry(tid).or_insert(0) += 1;
            }
        }
        let mut q_weights: Vec<(TermId, f32)> = tf_q_raw
            .into_iter()
            .map(|(tid, tf_raw)| (tid, self.config.tf(tf_raw) * self.idf[tid as usize]))
            .collect();
        let norm = q_weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Vec::new();
        }
        for (_, w) in q_weights.iter_mut() {
            *w /= norm;
        }
        q_weights
    }

    /// Cosine similarity of `text` against every row, in corpus order. Rows or
    /// queries with a zero norm score 0.
    pub fn scores(&self, text: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_rows()];
        for (tid, q_w) in self.query_vector(text) {
            for p in &self.postings[tid as usize] {
                scores[p.doc_id as usize] += p.weight * q_w;
            }
        }
        for s in scores.iter_mut() {
            *s = s.clamp(0.0, 1.0);
        }
        scores
    }

    /// Best `top_n` rows with a strictly positive score, highest first. Zero
    /// scores are dropped before truncation and equal scores keep corpus order.
    pub fn rank(&self, text: &str, top_n: usize) -> Vec<Match> {
        if top_n == 0 {
            return Vec::new();
        }
        let mut scored: Vec<Match> = self
            .scores(text)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .map(|(doc_id, score)| Match { doc_id: doc_id as DocId, score })
            .collect();
        // stable: ties stay in ascending doc_id order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_n);
        scored
    }
}
