use crate::error::{Error, Result};
use crate::tokenizer::normalize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const TITLE_COLUMN: &str = "Title";
pub const STORYLINE_COLUMN: &str = "Storyline";
/// Stand-in for rows whose title cell is empty or absent.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// One movie. Its position in the [`Corpus`] is its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub storyline: String,
    pub normalized_text: String,
}

impl Document {
    pub fn new(title: Option<&str>, storyline: Option<&str>) -> Self {
        let title = match title {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => UNKNOWN_TITLE.to_string(),
        };
        let storyline = storyline.unwrap_or_default().to_string();
        let normalized_text = normalize(&storyline);
        Self { title, storyline, normalized_text }
    }
}

/// Ordered, load-once collection of movies.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn from_documents(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    /// Read a CSV file with `Title` and `Storyline` columns.
    ///
    /// A file that cannot be opened yields [`Error::NotFound`]; anything wrong
    /// with its contents yields [`Error::Load`]. Empty cells and short rows are
    /// filled with defaults instead of being rejected.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            tracing::error!(path = %path.display(), %err, "cannot open movie data");
            Error::NotFound { path: path.to_path_buf() }
        })?;
        let corpus = Self::from_reader(file)?;
        tracing::info!(num_movies = corpus.len(), path = %path.display(), "loaded movies");
        Ok(corpus)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
        let headers = reader.headers()?.clone();
        let title_col = column_index(&headers, TITLE_COLUMN)?;
        let storyline_col = column_index(&headers, STORYLINE_COLUMN)?;

        let mut docs = Vec::new();
        let mut repaired = 0usize;
        for result in reader.records() {
            let record = result?;
            let title = record.get(title_col).filter(|s| !s.is_empty());
            let storyline = record.get(storyline_col).filter(|s| !s.is_empty());
            if title.is_none() || storyline.is_none() {
                repaired += 1;
            }
            docs.push(Document::new(title, storyline));
        }
        if repaired > 0 {
            tracing::warn!(repaired, "filled missing title/storyline cells with defaults");
        }
        Ok(Self { docs })
    }

    /// Panics when `index >= self.len()`.
    pub fn get(&self, index: usize) -> &Document {
        &self.docs[index]
    }

    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| Error::Load(format!("missing column `{name}`")))
}
