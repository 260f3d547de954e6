use crate::adapters::http::{build_client, ensure_success};
use crate::adapters::traits::NewsSource;
use crate::error::AdapterError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const RSS2JSON_URL: &str = "https://api.rss2json.com/v1/api.json";
const SUMMARY_MAX_CHARS: usize = 200;

/// Default real-estate feeds, as (publisher, RSS url)
pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    (
        "ET Realty",
        "https://realty.economictimes.indiatimes.com/rss/topstories",
    ),
    (
        "Hindustan Times",
        "https://www.hindustantimes.com/feeds/rss/real-estate/rssfeed.xml",
    ),
    (
        "Moneycontrol",
        "https://www.moneycontrol.com/rss/realestate.xml",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub publisher: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedItem {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
    thumbnail: Option<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    link: Option<String>,
}

/// Visible text of an HTML fragment, whitespace collapsed
pub fn strip_html(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let text: Vec<&str> = document.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text,
    }
}

/// rss2json reports times as `YYYY-MM-DD HH:MM:SS` in UTC
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc2822(raw.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

fn items_from_feed(publisher: &str, response: FeedResponse) -> Result<Vec<NewsItem>, AdapterError> {
    if response.status.as_deref() != Some("ok") {
        return Err(AdapterError::invalid(
            "rss2json",
            response.message.unwrap_or_else(|| "feed status not ok".to_string()),
        ));
    }

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            let title = strip_html(item.title.as_deref()?);
            let link = item.link?.trim().to_string();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            let image = item
                .thumbnail
                .filter(|t| !t.trim().is_empty())
                .or_else(|| item.enclosure.and_then(|e| e.link))
                .filter(|t| !t.trim().is_empty());
            Some(NewsItem {
                title,
                link,
                publisher: publisher.to_string(),
                published_at: item.pub_date.as_deref().and_then(parse_pub_date),
                summary: truncate(
                    strip_html(item.description.as_deref().unwrap_or_default()),
                    SUMMARY_MAX_CHARS,
                ),
                image,
            })
        })
        .collect())
}

/// Merge feeds: drop repeated headlines, newest first, undated last
fn merge_headlines(items: Vec<NewsItem>, limit: usize) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut merged: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.title.to_lowercase()))
        .collect();
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged.truncate(limit);
    merged
}

/// Shown when no feed can be reached
pub fn fallback_headlines(limit: usize) -> Vec<NewsItem> {
    const HEADLINES: &[(&str, &str)] = &[
        (
            "Home loan rates hold steady as RBI keeps repo rate unchanged",
            "Borrowers with repo-linked loans see no change in EMIs this quarter.",
        ),
        (
            "Housing sales rise across top seven cities",
            "Mid-segment and premium launches drive demand in Mumbai, Pune and Bengaluru.",
        ),
        (
            "RERA registrations climb as buyers favour verified projects",
            "State regulators report more projects registering before launch.",
        ),
        (
            "Rental demand strong near IT corridors",
            "Whitefield, Hinjewadi and Gachibowli lead rental enquiries for 2 BHK homes.",
        ),
        (
            "Stamp duty changes: what home buyers should check before registration",
            "A quick guide to stamp duty and registration charges in major states.",
        ),
    ];

    HEADLINES
        .iter()
        .take(limit)
        .map(|(title, summary)| NewsItem {
            title: title.to_string(),
            link: String::new(),
            publisher: "Estate Hub".to_string(),
            published_at: None,
            summary: summary.to_string(),
            image: None,
        })
        .collect()
}

/// Real-estate headlines from RSS feeds via rss2json
pub struct RssNewsSource {
    client: Client,
    feeds: Vec<(String, String)>,
}

impl RssNewsSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_feeds(
            DEFAULT_FEEDS
                .iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
            timeout,
        )
    }

    pub fn with_feeds(feeds: Vec<(String, String)>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            feeds,
        })
    }

    async fn fetch_feed(&self, publisher: &str, url: &str) -> Result<Vec<NewsItem>, AdapterError> {
        let response = self
            .client
            .get(RSS2JSON_URL)
            .query(&[("rss_url", url)])
            .send()
            .await?;
        let feed: FeedResponse = ensure_success("rss2json", response)?.json().await?;
        items_from_feed(publisher, feed)
    }
}

#[async_trait]
impl NewsSource for RssNewsSource {
    async fn headlines(&self, limit: usize) -> Vec<NewsItem> {
        let mut collected = Vec::new();
        for (publisher, url) in &self.feeds {
            match self.fetch_feed(publisher, url).await {
                Ok(items) => {
                    debug!("{} items from {}", items.len(), publisher);
                    collected.extend(items);
                }
                Err(e) => warn!("Failed to fetch {} feed: {}", publisher, e),
            }
        }

        if collected.is_empty() {
            info!("No live news available, using fallback headlines");
            return fallback_headlines(limit);
        }
        merge_headlines(collected, limit)
    }

    fn source_name(&self) -> &'static str {
        "rss2json"
    }
}
