mod db;
mod error;
mod history;
mod model;
mod parser;
mod reddit;
mod settings;
mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::warn;

use history::Recorded;
use model::{FuelSlot, Post, Prediction, Source};
use settings::Settings;
use validate::Credentials;

#[derive(Parser)]
#[command(name = "fuel_watch", about = "Weekly fuel price predictions from Reddit, as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the newest post from the configured feeds, parse and record it
    Fetch {
        /// Print the parsed prediction without recording it
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse a post from local text and print the prediction
    Parse {
        #[arg(short, long, default_value = "")]
        title: String,
        /// Body file ("-" for stdin)
        #[arg(short, long)]
        body: Option<PathBuf>,
        /// Identifier to attach
        #[arg(long, default_value = "local")]
        id: String,
    },
    /// Validate a submitted prediction (JSON file or "-" for stdin) and record it
    Submit {
        payload: PathBuf,
        /// Bearer token presented by the caller
        #[arg(long)]
        token: Option<String>,
        #[arg(long, value_enum, default_value = "webhook")]
        source: Source,
    },
    /// Print the latest recorded prediction
    Latest,
    /// Recent predictions, newest first
    History {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Write latest.json and history.json to a directory
    Export {
        #[arg(short, long, default_value = "public")]
        out: PathBuf,
    },
    /// Show storage statistics
    Stats,
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
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Fetch { dry_run } => {
            let client = reddit::client(&settings)?;
            let Some(post) = reddit::fetch_latest_post(&client, &settings.feeds).await else {
                println!("No posts found in {} feeds.", settings.feeds.len());
                return Ok(());
            };
            println!(
                "Newest post: {} ({}) {}",
                post.title,
                reddit::display_time(&post.created),
                post.permalink.as_deref().unwrap_or("")
            );
            let prediction = parser::parse_post(&post, Source::Reddit);
            let has_signal = [&prediction.gas, &prediction.diesel]
                .into_iter()
                .flatten()
                .any(|s| s.direction.is_some() || s.price.is_some());
            if !has_signal {
                warn!(id = %post.id, "post carried no usable price signal");
            }
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
                return Ok(());
            }
            let mut store = db::connect(&settings.db_path)?;
            match history::record(&mut store, &prediction, settings.history_limit)? {
                Recorded::Inserted => println!("Recorded {}.", summary(&prediction)),
                Recorded::Duplicate => println!("Post {} already recorded.", post.id),
            }
            Ok(())
        }
        Commands::Parse { title, body, id } => {
            let body = match body {
                Some(path) => read_input(&path)?,
                None => String::new(),
            };
            let post = Post {
                id,
                title,
                body,
                created: Utc::now(),
                permalink: None,
            };
            let prediction = parser::parse_post(&post, Source::Reddit);
            println!("{}", serde_json::to_string_pretty(&prediction)?);
            Ok(())
        }
        Commands::Submit { payload, token, source } => {
            let raw = read_input(&payload)?;
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("Payload is not valid JSON")?;
            let creds = Credentials {
                expected: settings.webhook_token.as_deref(),
                provided: token.as_deref(),
            };
            let prediction = match validate::validate(&value, &creds, source, Utc::now()) {
                Ok(p) => p,
                Err(rejection) => bail!("{}", rejection.status_line()),
            };
            let mut store = db::connect(&settings.db_path)?;
            history::record(&mut store, &prediction, settings.history_limit)?;
            println!("Accepted {}.", summary(&prediction));
            Ok(())
        }
        Commands::Latest => {
            let store = db::connect(&settings.db_path)?;
            match history::latest(&store)? {
                Some(p) => println!("{}", serde_json::to_string_pretty(&p)?),
                None => println!("No prediction recorded yet. Run 'fetch' first."),
            }
            Ok(())
        }
        Commands::History { limit } => {
            let store = db::connect(&settings.db_path)?;
            let rows = history::load(&store)?;
            if rows.is_empty() {
                println!("No predictions recorded.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<16} | {:<11} | {:<24} | {:<24} | {:<30}",
                "#", "When", "Source", "Gas", "Diesel", "Notes"
            );
            println!("{}", "-".repeat(121));
            for (i, p) in rows.iter().take(limit).enumerate() {
                println!(
                    "{:>3} | {:<16} | {:<11} | {:<24} | {:<24} | {:<30}",
                    i + 1,
                    reddit::display_time(&p.timestamp),
                    p.source.as_str(),
                    slot_label(p.gas.as_ref()),
                    slot_label(p.diesel.as_ref()),
                    truncate(p.notes.as_deref().unwrap_or(""), 30),
                );
            }
            println!("\n{} of {} predictions", rows.len().min(limit), rows.len());
            Ok(())
        }
        Commands::Export { out } => {
            let store = db::connect(&settings.db_path)?;
            let rows = history::load(&store)?;
            let Some(latest) = history::latest(&store)? else {
                println!("Nothing to export yet.");
                return Ok(());
            };
            std::fs::create_dir_all(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            write_json(&out.join("latest.json"), &latest)?;
            write_json(&out.join("history.json"), &rows)?;
            println!("Wrote latest.json and history.json ({} entries) to {}", rows.len(), out.display());
            Ok(())
        }
        Commands::Stats => {
            let store = db::connect(&settings.db_path)?;
            let s = store.stats()?;
            let rows = history::load(&store)?;
            println!("Database:   {}", settings.db_path);
            println!("Keys:       {}", s.keys);
            println!("History:    {} / {}", rows.len(), settings.history_limit);
            println!("Last write: {}", s.last_write.as_deref().unwrap_or("-"));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn summary(p: &Prediction) -> String {
    format!(
        "gas {}, diesel {}",
        slot_label(p.gas.as_ref()),
        slot_label(p.diesel.as_ref())
    )
}

fn slot_label(slot: Option<&FuelSlot>) -> String {
    let Some(slot) = slot else {
        return "-".into();
    };
    let direction = slot.direction.map(|d| d.as_str()).unwrap_or("?");
    let adjustment = slot
        .adjustment
        .map(|a| format!(" {:.1}c", a))
        .unwrap_or_default();
    let price = slot
        .price
        .map(|p| format!(" @ ${:.3}", p))
        .unwrap_or_default();
    format!("{}{}{}", direction, adjustment, price)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Direction;

    #[test]
    fn slot_labels() {
        assert_eq!(slot_label(None), "-");
        let slot = FuelSlot { direction: Some(Direction::Up), adjustment: Some(3.6), price: Some(1.621) };
        assert_eq!(slot_label(Some(&slot)), "up 3.6c @ $1.621");
        let slot = FuelSlot { direction: None, adjustment: None, price: None };
        assert_eq!(slot_label(Some(&slot)), "?");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }
}
