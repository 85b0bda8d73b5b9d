use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::Post;
use crate::settings::Settings;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Deserialize)]
struct RawPost {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    created_utc: f64,
    permalink: Option<String>,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Post {
            id: raw.id,
            title: raw.title,
            body: raw.selftext,
            created: DateTime::from_timestamp(raw.created_utc as i64, 0).unwrap_or_default(),
            permalink: raw.permalink.map(|p| format!("https://www.reddit.com{}", p)),
        }
    }
}

pub fn client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Decode a Reddit listing (`/search.json`, `/new.json`, ...).
pub fn parse_listing(json: &str) -> Result<Vec<Post>> {
    let listing: Listing = serde_json::from_str(json).context("Unexpected listing shape")?;
    Ok(listing.data.children.into_iter().map(|c| c.data.into()).collect())
}

/// Fetch every feed concurrently and return the newest post across them.
/// A feed that fails is logged and counts as empty.
pub async fn fetch_latest_post(client: &reqwest::Client, feeds: &[String]) -> Option<Post> {
    let results = join_all(feeds.iter().map(|url| async move {
        match fetch_feed(client, url).await {
            Ok(posts) => {
                info!(feed = %url, posts = posts.len(), "fetched feed");
                posts
            }
            Err(e) => {
                warn!(feed = %url, "feed failed: {:#}", e);
                Vec::new()
            }
        }
    }))
    .await;

    newest(results.into_iter().flatten())
}

fn newest(posts: impl Iterator<Item = Post>) -> Option<Post> {
    posts.max_by_key(|p| p.created)
}

async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Vec<Post>> {
    for attempt in 0..=MAX_RETRIES {
        let response = client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return parse_listing(&body);
        }
        if !should_retry(status) || attempt == MAX_RETRIES {
            bail!("HTTP {} from {}", status, url);
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "HTTP {} on {} (attempt {}/{}), backing off {:.1}s",
            status,
            url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }
    bail!("retries exhausted for {}", url)
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `created` as shown in CLI output.
pub fn display_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}
