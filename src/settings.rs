use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_DB_PATH: &str = "data/fuel_watch.sqlite";
const DEFAULT_USER_AGENT: &str = "fuel_watch/0.1 (weekly fuel price digest)";
const DEFAULT_FEEDS: &[&str] = &[
    "https://www.reddit.com/r/ontario/search.json?q=title%3A%22gas%20prices%22&restrict_sr=on&sort=new&limit=5",
    "https://www.reddit.com/r/toronto/search.json?q=title%3A%22gas%20prices%22&restrict_sr=on&sort=new&limit=5",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    /// Reddit listing endpoints, fetched concurrently; newest post wins.
    pub feeds: Vec<String>,
    pub user_agent: String,
    pub history_limit: usize,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub webhook_token: Option<String>,
}

impl Settings {
    /// Defaults, then `fuel_watch.toml` if present, then `FUEL_*` env vars.
    pub fn load() -> Result<Self> {
        Self::builder()?
            .add_source(File::with_name("fuel_watch").required(false))
            .add_source(
                Environment::with_prefix("FUEL")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("feeds"),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let feeds: Vec<String> = DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect();
        Ok(Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("feeds", feeds)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("history_limit", 52)?
            .set_default("request_timeout_secs", 20)?)
    }
}
