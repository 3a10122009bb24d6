//! Side-service executors reached from the dispatcher.
//!
//! Executors return user-facing text; failures are phrased, never propagated.

pub mod commands;
pub mod search;
pub mod weather;

pub use commands::DesktopCommands;
pub use search::DuckDuckGoSearch;
pub use weather::OpenWeatherMap;

use async_trait::async_trait;
use std::time::Duration;

/// Above this creativity the executors switch to their playful wording.
pub(crate) const PLAYFUL_THRESHOLD: f64 = 0.7;
/// At or below this creativity the executors use their plainest wording.
pub(crate) const PLAIN_THRESHOLD: f64 = 0.3;

#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Current conditions for `city`, phrased for `creativity`.
    async fn current(&self, city: &str, creativity: f64) -> String;
}

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Formatted results for `query`, at most `limit` entries.
    async fn search(&self, query: &str, limit: usize) -> String;
}

pub trait CommandExecutor: Send + Sync {
    /// Run a recognised desktop command. `None` when nothing in `raw` matched.
    fn execute(&self, raw: &str, creativity: f64) -> Option<String>;
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
