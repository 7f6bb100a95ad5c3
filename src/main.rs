use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use rowstream::{
    config::{DatabaseConfig, StreamConfig},
    executor::{
        predicate::Predicate,
        users::{batch_processing, calculate_average_age, lazy_paginate, stream_users},
    },
    storage::{seed::seed, sqlite::SqliteProvider},
    types::{AGE_SCALE, error::DatabaseError, record::UserRecord},
};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE: &str = "prodev.db";

/// Streams rows out of the user_data table
#[derive(Parser)]
#[command(name = "rowstream")]
#[command(about = "Lazily streams, batches and paginates user rows", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// SQLite database file, overrides the config
    #[arg(long, short)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the table and load users from a CSV file
    Seed {
        #[arg(default_value = "user_data.csv")]
        csv: PathBuf,
    },
    /// Print users one at a time
    Stream {
        /// Stop after this many users
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Scan users in batches and print those older than --min-age
    Batches {
        #[arg(long, short)]
        size: Option<usize>,
        #[arg(long, default_value_t = 25)]
        min_age: i64,
    },
    /// Print users page by page
    Paginate {
        #[arg(long, short)]
        size: Option<usize>,
    },
    /// Print the average age
    Average,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<StreamConfig, DatabaseError> {
    let mut config = match &cli.config {
        Some(path) => StreamConfig::from_file(path)?,
        None => StreamConfig::new(DatabaseConfig::new(DEFAULT_DATABASE)),
    };
    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<(), DatabaseError> {
    let config = load_config(&cli)?;
    let provider = SqliteProvider::new(config.database.clone());

    match cli.command {
        Command::Seed { csv } => {
            let report = seed(&provider, &csv)?;
            println!(
                "inserted {}, skipped {} duplicates, {} invalid rows",
                report.inserted, report.duplicates, report.invalid
            );
        }
        Command::Stream { limit } => {
            let mut users = stream_users(&provider);
            for user in users.by_ref().take(limit.unwrap_or(usize::MAX)) {
                print_user(&user);
            }
            if let Some(e) = users.take_error() {
                return Err(e);
            }
        }
        Command::Batches { size, min_age } => {
            let size = size.unwrap_or(config.batch_size);
            let report = batch_processing(
                &provider,
                size,
                &Predicate::gt("age", min_age),
                |user| print_user(&user),
            )?;
            println!(
                "{} of {} users in {} batches are older than {}",
                report.matched, report.examined, report.batches, min_age
            );
        }
        Command::Paginate { size } => {
            let mut pages = lazy_paginate(&provider, size.unwrap_or(config.page_size))?;
            for page in pages.by_ref() {
                println!("-- page {} (offset {})", page.number + 1, page.offset);
                for user in &page {
                    print_user(user);
                }
            }
            if let Some(e) = pages.take_error() {
                return Err(e);
            }
        }
        Command::Average => match calculate_average_age(&provider) {
            Some(mean) => println!("Average age of users: {:.2}", round_age(mean)),
            None => println!("Average age of users: n/a (no users)"),
        },
    }
    Ok(())
}

fn print_user(user: &UserRecord) {
    println!(
        "{}  {:<24} {:<32} {}",
        user.user_id,
        user.name,
        user.email,
        round_age(user.age)
    );
}

fn round_age(age: Decimal) -> Decimal {
    age.round_dp_with_strategy(AGE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
