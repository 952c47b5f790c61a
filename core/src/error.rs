use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("movie data not found: {path}")]
    NotFound { path: PathBuf },

    #[error("error loading movie data: {0}")]
    Load(String),

    #[error("recommender has not been built; load and build the corpus first")]
    NotBuilt,
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Load(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::NotFound { path: PathBuf::from("movies.csv") };
        assert_eq!(err.to_string(), "movie data not found: movies.csv");

        let err = Error::Load("missing column `Title`".to_string());
        assert_eq!(err.to_string(), "error loading movie data: missing column `Title`");

        assert!(Error::NotBuilt.to_string().starts_with("recommender has not been built"));
    }
}
