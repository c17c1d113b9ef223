//! CLI administration tool for qrlink.
//!
//! Inspects and creates short links and performs database checks without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List all short links, newest first
//! cargo run --bin admin -- list
//!
//! # Show one link (does not count a click)
//! cargo run --bin admin -- stats Xy3_a9Qz
//!
//! # Shorten a URL (returns the existing link if already shortened)
//! cargo run --bin admin -- shorten https://example.com/some/long/path
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; `DATABASE_URL` (or `DB_*` components) is required.
//! `BASE_URL`, `CODE_LENGTH` and `QR_*` are used when shortening.

use qrlink::application::services::UrlService;
use qrlink::config::{self, Config, StorageBackend};
use qrlink::infrastructure::persistence::PgUrlRepository;
use qrlink::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing qrlink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// List all short links
    List,

    /// Show a single short link
    Stats {
        /// Short code
        code: String,
    },

    /// Shorten a URL
    Shorten {
        /// URL to shorten (http or https)
        url: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;

    if config.storage_backend != StorageBackend::Postgres {
        anyhow::bail!("The admin tool only works with STORAGE_BACKEND=postgres");
    }

    let pool = server::connect_pool(&config).await?;
    let service = build_service(&config, &pool);

    match cli.command {
        Commands::List => list_links(&service).await?,
        Commands::Stats { code } => show_link(&service, &code).await?,
        Commands::Shorten { url } => shorten(&service, &url).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn build_service(config: &Config, pool: &PgPool) -> UrlService {
    let repository = Arc::new(PgUrlRepository::new(Arc::new(pool.clone())));
    server::build_url_service(config, repository)
}

/// Lists all short links.
///
/// # Output Format
///
/// ```text
/// Short links
///
///   Code       Clicks  Created            URL
///   ─────────────────────────────────────────────────────────────────
///   Xy3_a9Qz   2       2025-01-15 10:30   https://example.com
/// ```
async fn list_links(service: &UrlService) -> Result<()> {
    println!("{}", "Short links".bright_blue().bold());
    println!();

    let links = service
        .list_all()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        println!();
        println!(
            "  Create one with: {} admin shorten <url>",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<10} {:<7} {:<18} {}",
        "Code".bright_white().bold(),
        "Clicks".bright_white().bold(),
        "Created".bright_white().bold(),
        "URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for link in &links {
        println!(
            "  {:<10} {:<7} {:<18} {}",
            link.code.cyan(),
            link.clicks.to_string().bright_green(),
            link.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            link.original_url
        );
    }

    println!();
    println!(
        "  Total: {}",
        links.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Shows a single link without counting a click.
async fn show_link(service: &UrlService, code: &str) -> Result<()> {
    let record = service
        .get_stats(code)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", "Short link".bright_blue().bold());
    println!();
    println!("  Code:          {}", record.code.cyan());
    println!("  Short URL:     {}", service.short_url(&record.code).bright_yellow());
    println!("  Original URL:  {}", record.original_url);
    println!(
        "  Clicks:        {}",
        record.clicks.to_string().bright_green().bold()
    );
    println!(
        "  Created:       {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    match record.last_accessed_at {
        Some(at) => println!("  Last accessed: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Last accessed: {}", "never".bright_black()),
    }
    println!();

    Ok(())
}

async fn shorten(service: &UrlService, url: &str) -> Result<()> {
    let creation = service
        .create_or_get(url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to shorten URL: {}", e))?;

    if creation.is_created() {
        println!("{}", "✅ URL shortened successfully".green().bold());
    } else {
        println!("{}", "ℹ️  URL already exists".yellow());
    }
    println!();
    println!("  Code:      {}", creation.code.cyan());
    println!(
        "  Short URL: {}",
        service.short_url(&creation.code).bright_yellow().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM url_records")
                .fetch_one(pool)
                .await?;

            let clicks: i64 =
                sqlx::query_scalar("SELECT COALESCE(SUM(clicks), 0)::BIGINT FROM url_records")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Links:      {}", links.to_string().bright_green().bold());
            println!("  Clicks:     {}", clicks.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}
