use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use reelmatch_core::{Error, IndexConfig, MovieRecommender, ScoredResult, DEFAULT_TOP_N};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "reelmatch")]
#[command(about = "Find movies whose storyline matches a plot description", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Movie CSV with Title and Storyline columns
    #[arg(long, default_value = "imdb_2024_movies.csv")]
    data: PathBuf,
    /// Weight terms by 1 + ln(tf) instead of the raw count
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    /// Use ln(N/df) + 1 instead of the smoothed IDF
    #[arg(long, default_value_t = false)]
    no_smooth_idf: bool,
}

impl DataArgs {
    fn index_config(&self) -> IndexConfig {
        IndexConfig { sublinear_tf: self.sublinear_tf, smooth_idf: !self.no_smooth_idf }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rank movies against a plot description
    Query {
        #[command(flatten)]
        data: DataArgs,
        /// Number of movies to show
        #[arg(long, short = 'n', default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Plot description
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show corpus and vocabulary size
    Stats {
        #[command(flatten)]
        data: DataArgs,
    },
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", user_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Query { data, top_n, json, text } => {
            let recommender = load(&data)?;
            let query = text.join(" ");
            let results = recommender.query(&query, top_n)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", format_results(&query, &results));
            }
            Ok(())
        }
        Commands::Stats { data } => {
            let recommender = load(&data)?;
            let snapshot = recommender.snapshot()?;
            println!("movies:     {}", snapshot.corpus.len());
            println!("vocabulary: {}", snapshot.index.vocabulary_len());
            Ok(())
        }
    }
}

fn load(data: &DataArgs) -> Result<MovieRecommender> {
    let recommender = MovieRecommender::new(data.index_config());
    recommender.load_and_build(&data.data)?;
    Ok(recommender)
}

fn format_results(query: &str, results: &[ScoredResult]) -> String {
    let mut out = format!("Query: {query}\n");
    if results.is_empty() {
        out.push_str("No matching movies found. Try describing the plot differently.\n");
        return out;
    }
    for (i, movie) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (Score: {:.2}, {:.0}% match)\n",
            i + 1,
            movie.title,
            movie.score,
            movie.match_percentage()
        ));
        if !movie.storyline.is_empty() {
            out.push_str(&format!("   {}\n", movie.storyline));
        }
    }
    out
}

fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<Error>() {
        Some(Error::NotFound { path }) => format!(
            "Movie data not found at {}. Run the scraper first or pass --data.",
            path.display()
        ),
        Some(Error::Load(msg)) => format!("Could not read movie data: {msg}"),
        Some(Error::NotBuilt) => "The recommender is not ready yet.".to_string(),
        None => format!("error: {err:#}"),
    }
}
