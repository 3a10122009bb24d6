use super::{http_client, SearchService};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SEARCH_URL: &str = "https://api.duckduckgo.com/";

const BODY_LIMIT: usize = 150;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<Topic>,
}

/// Either a leaf topic or a named group of topics.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Topic {
    Leaf {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<Topic>,
    },
}

struct Hit {
    title: String,
    body: String,
    url: String,
}

/// DuckDuckGo Instant Answer lookup.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    base_url: String,
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self {
            client: http_client(Duration::from_secs(10)),
            base_url: DEFAULT_SEARCH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch(&self, query: &str) -> Result<InstantAnswer, String> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .header("x-luna-request-id", uuid::Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status().as_u16()));
        }
        // The API answers with a javascript content type, so decode by hand.
        let text = resp.text().await.map_err(|e| e.to_string())?;
        serde_json::from_str(&text).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SearchService for DuckDuckGoSearch {
    async fn search(&self, query: &str, limit: usize) -> String {
        let query = query.trim();
        if query.chars().count() < 2 {
            return "Please provide a more specific search query.".to_string();
        }

        match self.fetch(query).await {
            Ok(answer) => {
                let hits = collect_hits(&answer, limit.max(1));
                debug!(query, hits = hits.len(), "search finished");
                if hits.is_empty() {
                    unavailable(query)
                } else {
                    format_results(query, &hits)
                }
            }
            Err(e) => {
                warn!(query, "search failed: {e}");
                unavailable(query)
            }
        }
    }
}

fn unavailable(query: &str) -> String {
    format!("Sorry, I'm having trouble accessing search results for '{query}' right now.")
}

fn collect_hits(answer: &InstantAnswer, limit: usize) -> Vec<Hit> {
    let mut hits = Vec::new();
    if !answer.abstract_text.trim().is_empty() {
        let title = if answer.heading.trim().is_empty() {
            "Quick Answer".to_string()
        } else {
            answer.heading.trim().to_string()
        };
        hits.push(Hit {
            title,
            body: answer.abstract_text.trim().to_string(),
            url: answer.abstract_url.clone(),
        });
    }
    flatten(&answer.related_topics, &mut hits, limit);
    hits.truncate(limit);
    hits
}

fn flatten(topics: &[Topic], out: &mut Vec<Hit>, limit: usize) {
    for topic in topics {
        if out.len() >= limit {
            return;
        }
        match topic {
            Topic::Leaf { text, first_url } if !text.trim().is_empty() => {
                let (title, body) = match text.split_once(" - ") {
                    Some((t, b)) => (t.trim().to_string(), b.trim().to_string()),
                    None => (text.trim().to_string(), String::new()),
                };
                out.push(Hit {
                    title,
                    body,
                    url: first_url.clone(),
                });
            }
            Topic::Leaf { .. } => {}
            Topic::Group { topics } => flatten(topics, out, limit),
        }
    }
}

fn format_results(query: &str, hits: &[Hit]) -> String {
    let blocks: Vec<String> = hits
        .iter()
        .map(|hit| {
            let mut block = format!("**{}**", hit.title);
            if !hit.body.is_empty() {
                block.push('\n');
                block.push_str(&truncate_body(&hit.body));
            }
            if !hit.url.is_empty() {
                block.push_str(&format!("\n[View source]({})", hit.url));
            }
            block
        })
        .collect();
    format!("Search results for '{query}':\n\n{}", blocks.join("\n\n"))
}

/// Cut to `BODY_LIMIT` chars on a word boundary, appending "...".
fn truncate_body(body: &str) -> String {
    if body.chars().count() <= BODY_LIMIT {
        return body.to_string();
    }
    let cut: String = body.chars().take(BODY_LIMIT).collect();
    let head = cut.rsplit_once(' ').map(|(h, _)| h).unwrap_or(&cut);
    format!("{head}...")
}
