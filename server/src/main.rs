use anyhow::Result;
use axum::Router;
use clap::Parser;
use reelmatch_core::IndexConfig;
use reelmatch_server::{build_app, AppConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Movie CSV with Title and Storyline columns
    #[arg(long, default_value = "imdb_2024_movies.csv")]
    data: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Weight terms by 1 + ln(tf) instead of the raw count
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    /// Use ln(N/df) + 1 instead of the smoothed IDF
    #[arg(long, default_value_t = false)]
    no_smooth_idf: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let index = IndexConfig { sublinear_tf: args.sublinear_tf, smooth_idf: !args.no_smooth_idf };
    let app: Router = build_app(AppConfig::from_env(args.data, index));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
