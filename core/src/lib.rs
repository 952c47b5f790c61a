//! Plot-similarity search over a fixed corpus of movie storylines.
//!
//! Load a [`Corpus`] from CSV, build a [`SimilarityIndex`] over its normalized
//! storylines, then rank free-text queries by TF-IDF cosine similarity. The
//! [`MovieRecommender`] ties the two together behind an atomically swapped
//! snapshot so it can be shared across threads.

pub mod corpus;
pub mod error;
pub mod index;
pub mod recommender;
pub mod tokenizer;

pub use corpus::{Corpus, Document};
pub use error::{Error, Result};
pub use index::{IndexConfig, Match, SimilarityIndex};
pub use recommender::{MovieRecommender, ScoredResult, Snapshot, DEFAULT_TOP_N};
