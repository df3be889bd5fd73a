mod db;
mod error;
mod extract;
mod fetch;
mod html;
mod input;
mod pipeline;
mod query;
mod report;
mod resolver;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::fetch::HttpFetcher;
use crate::report::ReportRow;

#[derive(Parser)]
#[command(name = "school_scraper", about = "Resolve school names to US News profiles and extract their metrics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a query list and write a timestamped CSV report
    Run {
        /// Query list: .csv (first column) or plain text (one per line)
        #[arg(short, long)]
        input: PathBuf,
        /// Directory for the CSV report
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Pause between queries, in seconds
        #[arg(long, default_value = "2")]
        delay_secs: f64,
        /// Per-request timeout, in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
        /// Only process the first N queries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Run log database
        #[arg(long = "db", default_value = db::DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },
    /// Resolve a single query to its profile URL
    Resolve {
        query: String,
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
    /// Extract every field from one profile URL and print it as JSON
    Extract {
        url: String,
        /// School name, used to drop a repeated name line from the overview
        #[arg(short, long)]
        school: String,
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
    /// Show run-log statistics
    Stats {
        #[arg(long = "db", default_value = db::DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            out_dir,
            delay_secs,
            timeout_secs,
            limit,
            db_path,
        } => {
            let mut queries = input::read_queries(&input)?;
            if let Some(n) = limit {
                queries.truncate(n);
            }
            if queries.is_empty() {
                println!("No queries in {}.", input.display());
                return Ok(());
            }
            println!("Loaded {} queries", queries.len());

            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let fetcher = HttpFetcher::new(Duration::from_secs(timeout_secs))?;
            let delay = Duration::try_from_secs_f64(delay_secs)
                .context("--delay-secs must be a non-negative number")?;

            let started = chrono::Local::now();
            let batch = started.format("%Y-%m-%d_%H-%M-%S").to_string();
            let summary =
                pipeline::run_batch(&conn, &batch, &queries, &fetcher, &fetcher, delay).await?;

            let rows: Vec<ReportRow> = summary.records.iter().map(ReportRow::from).collect();
            let path = report::write_report(&out_dir, &rows, chrono::Local::now())?;
            println!(
                "Done: {} queries ({} ok, {} invalid, {} not found, {} errors).",
                summary.total(),
                summary.records.len(),
                summary.invalid,
                summary.not_found,
                summary.failed
            );
            if summary.log_failures > 0 {
                println!("Warning: {} outcomes missing from the run log.", summary.log_failures);
            }
            println!("CSV file created: {}", path.display());
            Ok(())
        }
        Commands::Resolve { query, timeout_secs } => {
            let fetcher = HttpFetcher::new(Duration::from_secs(timeout_secs))?;
            match resolver::resolve(&query, &fetcher).await {
                Ok(url) => println!("{}", url),
                Err(error::QueryError::LinkNotFound) => println!("US News link not found"),
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
        Commands::Extract {
            url,
            school,
            timeout_secs,
        } => {
            let fetcher = HttpFetcher::new(Duration::from_secs(timeout_secs))?;
            let record = extract::extract(&url, &school, &fetcher).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Stats { db_path } => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Batches:     {}", s.batches);
            println!("Queries:     {}", s.total);
            println!("Extracted:   {}", s.ok);
            println!("  K-12:        {}", s.k12);
            println!("  High School: {}", s.high_schools);
            println!("Invalid:     {}", s.invalid);
            println!("Not found:   {}", s.not_found);
            println!("Errors:      {}", s.fetch_errors);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
