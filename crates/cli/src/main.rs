use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{CatalogItem, DataIndex, Genre};
use factor_model::{Hyperparameters, LatentFactorModel, ModelTrainer};
use pipeline::{RatingInput, parse_genre};
use server::{
    Recommendation, RecommendationOrchestrator, RecommendationResponse, RecommenderConfig,
    SessionRequest,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// reel-rate - rate five movies, get five back
#[derive(Parser)]
#[command(name = "reel-rate")]
#[command(about = "Genre-based movie recommendations from a quick rating session", long_about = None)]
struct Cli {
    /// Directory holding movies_by_rating.csv, user_movie_ratings.csv and links.csv
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Pre-trained baseline model (JSON) to warm-start from
    #[arg(short, long)]
    baseline: Option<PathBuf>,

    /// Seed for candidate sampling and factor initialization
    #[arg(long, default_value = "111")]
    seed: u64,

    /// Recompute item statistics and re-sort the catalog instead of
    /// trusting the file order
    #[arg(long)]
    rerank: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the genre vocabulary
    Genres,

    /// Show the movies a session on this genre is asked to rate
    Sample {
        #[arg(long)]
        genre: String,
    },

    /// Rate the sampled movies and get recommendations
    Recommend {
        #[arg(long)]
        genre: String,

        /// Comma-separated ratings (1-5 or "skip"), one per sampled movie
        #[arg(long)]
        ratings: String,
    },

    /// Train a baseline model on the historical ratings and save it
    Train {
        /// Output JSON file
        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        epochs: Option<usize>,

        #[arg(long)]
        factors: Option<usize>,
    },

    /// Dataset counts and the best-rated movies of a genre
    Stats {
        #[arg(long)]
        genre: Option<String>,

        #[arg(long, default_value = "10")]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse()).await
}

/// Dispatch to appropriate command handler; only data commands touch the files
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Genres => handle_genres(),
        Commands::Sample { genre } => {
            let data = load_data(&cli.data_dir, cli.rerank)?;
            let orchestrator = build_orchestrator(data, cli.baseline.as_deref(), cli.seed)?;
            handle_sample(&orchestrator, &genre)?
        }
        Commands::Recommend { genre, ratings } => {
            let data = load_data(&cli.data_dir, cli.rerank)?;
            let orchestrator = build_orchestrator(data, cli.baseline.as_deref(), cli.seed)?;
            handle_recommend(&orchestrator, &genre, &ratings).await?
        }
        Commands::Train {
            out,
            epochs,
            factors,
        } => {
            let data = load_data(&cli.data_dir, cli.rerank)?;
            handle_train(&data, &out, cli.seed, epochs, factors)?
        }
        Commands::Stats { genre, top } => {
            let data = load_data(&cli.data_dir, cli.rerank)?;
            handle_stats(data, genre.as_deref(), top)?
        }
    }

    Ok(())
}

fn load_data(data_dir: &Path, rerank: bool) -> Result<DataIndex> {
    println!("Loading ratings from {}...", data_dir.display());
    let start = Instant::now();
    let mut data = DataIndex::load_from_files(data_dir)
        .with_context(|| format!("Failed to load data from {}", data_dir.display()))?;
    if rerank {
        data.catalog.compute_item_stats(&data.ratings);
        data.catalog.sort_by_rating();
    }
    let (items, rows, users) = data.counts();
    println!(
        "{} Loaded {} movies and {} ratings from {} users in {:?}",
        "✓".green(),
        items,
        rows,
        users,
        start.elapsed()
    );
    Ok(data)
}

/// Build the orchestrator, training settings following the baseline if one is given.
fn build_orchestrator(
    data: DataIndex,
    baseline_path: Option<&Path>,
    seed: u64,
) -> Result<RecommendationOrchestrator> {
    let baseline = baseline_path
        .map(|path| {
            LatentFactorModel::load_json(path)
                .with_context(|| format!("Failed to load baseline model {}", path.display()))
        })
        .transpose()?;

    let hyperparameters = match &baseline {
        Some(model) => model
            .hyperparameters()
            .copied()
            .unwrap_or_default()
            .with_n_factors(model.n_factors()),
        None => Hyperparameters::default().with_seed(seed),
    };
    let config = RecommenderConfig::default()
        .with_seed(seed)
        .with_hyperparameters(hyperparameters);

    Ok(RecommendationOrchestrator::new(data, baseline, config))
}

/// Handle the 'genres' command
fn handle_genres() {
    println!("{}", "Genres:".bold().blue());
    for genre in Genre::ALL {
        println!("  {}", genre);
    }
}

/// Handle the 'sample' command
fn handle_sample(orchestrator: &RecommendationOrchestrator, genre: &str) -> Result<()> {
    let genre = parse_genre(genre)?;
    let candidates = orchestrator.candidates(genre);
    if candidates.is_empty() {
        println!("No {} movies in the catalog.", genre);
        return Ok(());
    }

    println!("{}", format!("Rate these {} movies:", genre).bold().blue());
    for (i, item) in candidates.iter().enumerate() {
        print_candidate(orchestrator, i + 1, item);
    }
    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    orchestrator: &RecommendationOrchestrator,
    genre: &str,
    ratings: &str,
) -> Result<()> {
    let genre = parse_genre(genre)?;
    let inputs = ratings
        .split(',')
        .map(|token| token.parse::<RatingInput>())
        .collect::<Result<Vec<_>, _>>()?;

    let candidates = orchestrator.candidates(genre);
    if inputs.len() > candidates.len() {
        bail!(
            "Got {} ratings but only {} movies were sampled for {}",
            inputs.len(),
            candidates.len(),
            genre
        );
    }

    println!("{}", "You rated:".bold().blue());
    for (i, (item, input)) in candidates.iter().zip(&inputs).enumerate() {
        let label = match input {
            RatingInput::Stars(stars) => "★".repeat(usize::from(*stars)).yellow(),
            RatingInput::Skip => "skipped".dimmed(),
        };
        println!("{}. {} {}", (i + 1).to_string().green(), item.title, label);
    }

    let request = SessionRequest {
        user: orchestrator.new_session(),
        genre,
        ratings: candidates.iter().map(|item| item.id).zip(inputs).collect(),
    };
    info!("Starting session {}", request.user);

    let response = orchestrator.recommend(&request).await?;
    print_recommendations(&response);
    Ok(())
}

/// Handle the 'train' command
fn handle_train(
    data: &DataIndex,
    out: &Path,
    seed: u64,
    epochs: Option<usize>,
    factors: Option<usize>,
) -> Result<()> {
    let mut params = Hyperparameters::default().with_seed(seed);
    if let Some(epochs) = epochs {
        params = params.with_n_epochs(epochs);
    }
    if let Some(factors) = factors {
        params = params.with_n_factors(factors);
    }

    let records: Vec<_> = data.ratings.records().collect();
    println!(
        "Training {} factors for {} epochs on {} ratings...",
        params.n_factors,
        params.n_epochs,
        records.len()
    );
    let start = Instant::now();
    let model = ModelTrainer::new(params)
        .train(&records, None)
        .context("Failed to train baseline model")?;
    model
        .save_json(out)
        .with_context(|| format!("Failed to save model to {}", out.display()))?;

    let (users, items) = model.counts();
    println!(
        "{} Trained on {} users and {} movies in {:?}, saved to {}",
        "✓".green(),
        users,
        items,
        start.elapsed(),
        out.display()
    );
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(data: DataIndex, genre: Option<&str>, top: usize) -> Result<()> {
    let DataIndex {
        mut catalog,
        ratings,
        links,
    } = data;
    catalog.compute_item_stats(&ratings);

    println!("{}", "Dataset:".bold().blue());
    println!("{}Movies: {}", "• ".green(), catalog.len());
    println!("{}Rating rows: {}", "• ".green(), ratings.len());
    println!(
        "{}Complete rows: {}",
        "• ".green(),
        ratings.records().count()
    );
    println!("{}Users: {}", "• ".green(), ratings.user_count());
    println!("{}External links: {}", "• ".green(), links.len());
    if let Some(mean) = ratings.global_mean() {
        println!("{}Mean rating: {:.2}", "• ".green(), mean);
    }

    let Some(genre) = genre else {
        return Ok(());
    };
    let genre = parse_genre(genre)?;
    let items: Vec<&CatalogItem> = catalog.items_in_genre(genre).collect();
    println!(
        "{}",
        format!("Top {} of {} {} movies:", top.min(items.len()), items.len(), genre)
            .bold()
            .blue()
    );
    for (i, item) in items.iter().take(top).enumerate() {
        let stats = item
            .stats
            .map(|s| format!("avg {:.2} ({} ratings)", s.avg_rating, s.rating_count))
            .unwrap_or_else(|| "no ratings".to_string());
        println!("{}. {} - {}", (i + 1).to_string().green(), item.title, stats);
    }
    Ok(())
}

fn print_candidate(orchestrator: &RecommendationOrchestrator, rank: usize, item: &CatalogItem) {
    let link = orchestrator
        .imdb_url(item.id)
        .unwrap_or_else(|| "no IMDb link".to_string());
    println!(
        "{}. [{}] {} {}",
        rank.to_string().green(),
        item.id,
        item.title,
        link.dimmed()
    );
}

/// Helper function to format and print recommendations
fn print_recommendations(response: &RecommendationResponse) {
    println!(
        "{}",
        format!("Recommended for you (model: {}):", response.model_source)
            .bold()
            .blue()
    );
    if response.recommendations.is_empty() {
        println!("Nothing left to recommend in this genre.");
        return;
    }
    for (i, rec) in response.recommendations.iter().enumerate() {
        print_recommendation(i + 1, rec);
    }
}

fn print_recommendation(rank: usize, rec: &Recommendation) {
    println!(
        "{}. {} [{}] - Predicted: {:.2}",
        rank.to_string().green(),
        rec.title,
        rec.genres.join(", "),
        rec.score
    );
    if let Some(url) = &rec.imdb_url {
        println!("   {}", url.dimmed());
    }
}
