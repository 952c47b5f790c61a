use axum::{extract::{Path, Query, State}, http::{HeaderMap, HeaderValue, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use reelmatch_core::{Error, IndexConfig, MovieRecommender, ScoredResult, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_K: usize = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub index: IndexConfig,
    pub admin_token: Option<String>,
    /// Comma-separated list; any origin when unset or unparseable.
    pub cors_allow_origin: Option<String>,
}

impl AppConfig {
    /// Fill the token and CORS settings from `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN`.
    pub fn from_env(data_path: PathBuf, index: IndexConfig) -> Self {
        Self {
            data_path,
            index,
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_N }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub id: usize,
    pub title: String,
    pub storyline: String,
    pub score: f32,
    /// Score rendered for display, e.g. `"42.0%"`.
    pub match_pct: String,
}

impl From<ScoredResult> for SearchHit {
    fn from(r: ScoredResult) -> Self {
        let match_pct = format!("{:.1}%", r.match_percentage());
        Self { id: r.id, title: r.title, storyline: r.storyline, score: r.score, match_pct }
    }
}

#[derive(Serialize)]
pub struct MovieResponse {
    pub id: usize,
    pub title: String,
    pub storyline: String,
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub num_movies: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<MovieRecommender>,
    pub data_path: PathBuf,
    pub admin_token: Option<String>,
    /// Why the last load failed, shown while the recommender is unbuilt.
    pub load_error: Arc<RwLock<Option<String>>>,
}

pub fn build_app(config: AppConfig) -> Router {
    // A failed load leaves the recommender unbuilt; search answers 503 until a
    // rebuild succeeds.
    let recommender = Arc::new(MovieRecommender::new(config.index));
    let load_error = match recommender.load_and_build(&config.data_path) {
        Ok(num_movies) => {
            tracing::info!(num_movies, path = %config.data_path.display(), "recommender ready");
            None
        }
        Err(err) => {
            tracing::error!(%err, "starting without movie data");
            Some(err.to_string())
        }
    };
    let app_state = AppState {
        recommender,
        data_path: config.data_path,
        admin_token: config.admin_token,
        load_error: Arc::new(RwLock::new(load_error)),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/movie/:id", get(movie_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(cors_layer(config.cors_allow_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
}

/// Any origin unless `allow_origin` names at least one parseable origin.
fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allow_origin
        .into_iter()
        .flat_map(|val| val.split(','))
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let k = params.k.min(MAX_K);
    let results = state.recommender.query(&params.q, k).map_err(|e| error_response(&state, e))?;
    let total_hits = results.len();
    let results = results.into_iter().map(SearchHit::from).collect();
    Ok(Json(SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), total_hits, results }))
}

pub async fn movie_handler(State(state): State<AppState>, Path(id): Path<usize>) -> Result<Json<MovieResponse>, (StatusCode, String)> {
    let snapshot = state.recommender.snapshot().map_err(|e| error_response(&state, e))?;
    if id >= snapshot.corpus.len() {
        return Err((StatusCode::NOT_FOUND, format!("movie {id} not found")));
    }
    let doc = snapshot.corpus.get(id);
    Ok(Json(MovieResponse { id, title: doc.title.clone(), storyline: doc.storyline.clone() }))
}

async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<RebuildResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let recommender = Arc::clone(&state.recommender);
    let path = state.data_path.clone();
    let outcome = tokio::task::spawn_blocking(move || recommender.load_and_build(&path))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("rebuild task failed: {e}")))?;
    match outcome {
        Ok(num_movies) => {
            *state.load_error.write() = None;
            tracing::info!(num_movies, "recommender rebuilt");
            Ok(Json(RebuildResponse { num_movies }))
        }
        Err(err) => {
            tracing::error!(%err, "rebuild failed, keeping previous index");
            if !state.recommender.is_built() {
                *state.load_error.write() = Some(err.to_string());
            }
            Err(error_response(&state, err))
        }
    }
}

fn error_response(state: &AppState, err: Error) -> (StatusCode, String) {
    match err {
        Error::NotBuilt => {
            let reason = state.load_error.read().clone();
            let msg = match reason {
                Some(reason) => format!("movie data not available: {reason}"),
                None => err.to_string(),
            };
            (StatusCode::SERVICE_UNAVAILABLE, msg)
        }
        Error::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        Error::Load(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
