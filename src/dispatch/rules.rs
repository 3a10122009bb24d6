//! Keyword tables and query extraction.

use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) const MODEL_QUESTIONS: &[&str] = &[
    "what model are you",
    "which model are you",
    "what ai model",
    "which ai model",
    "what model do you use",
    "which model do you use",
    "what are you using",
    "tell me your model",
    "identify your model",
    "current model",
];

pub(crate) const IDENTITY_QUESTIONS: &[&str] = &[
    "who are you",
    "what are you",
    "tell me about yourself",
    "introduce yourself",
    "who is luna",
    "what is luna",
];

/// Checked in order; the first hit decides how the query is extracted.
pub(crate) const SEARCH_KEYWORDS: &[&str] = &[
    "search",
    "look up",
    "find",
    "google",
    "what is",
    "who is",
    "when is",
    "where is",
    "tell me about",
    "information about",
    "search for",
    "find out",
    "lookup",
    "nfl",
    "football",
    "sports",
    "baseball",
    "basketball",
    "soccer",
    "hockey",
    "news",
    "latest",
    "recent",
    "current",
    "today",
    "update",
    "score",
    "game",
    "how to",
    "tutorial",
    "guide",
    "learn",
    "explain",
    "define",
    "meaning of",
];

/// Keywords whose trailing text becomes the query.
const EXTRACTING_KEYWORDS: &[&str] = &[
    "search for",
    "search",
    "look up",
    "find",
    "google",
    "what is",
    "who is",
    "when is",
    "where is",
    "tell me about",
    "information about",
];

pub(crate) const SEARCH_DISABLED_KEYWORDS: &[&str] = &["search", "google", "find", "look up"];

const SPORTS_TERMS: &[&str] = &[
    "nfl",
    "football",
    "baseball",
    "basketball",
    "soccer",
    "hockey",
    "sports",
];

const FILLER_WORDS: &[&str] = &["about", "for", "the"];

pub(crate) const COMMAND_KEYWORDS: &[&str] = &[
    "open ",
    "volume",
    "screenshot",
    "notepad",
    "calculator",
    "browser",
    "chrome",
    "explorer",
    "file manager",
];

static QUESTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"what.+(?:is|are|was|were|will be|does|do|did)",
        r"who.+(?:is|are|was|were|will be)",
        r"when.+(?:is|are|was|were|will be|did|does|do)",
        r"where.+(?:is|are|was|were|will be)",
        r"how.+(?:is|are|was|were|will be|do|does|did|to)",
        r"why.+(?:is|are|was|were|will be|do|does|did)",
        r"(?:nfl|football|sports|baseball|basketball).+(?:score|game|news|update|today|latest)",
    ]
    .iter()
    .filter_map(|p| Regex::new(&format!("(?i){p}")).ok())
    .collect()
});

pub(crate) fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// Weather city: the text after `" in "` (up to any further `" in "`), spaces turned into
/// commas. `None` when no usable clause is present.
pub(crate) fn weather_city(lower: &str) -> Option<String> {
    let part = lower.split(" in ").nth(1)?;
    let city = part
        .trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '!' | '.'))
        .trim();
    if city.is_empty() {
        None
    } else {
        Some(city.replace(' ', ","))
    }
}

/// Search query for a lowercased message, or `None` when the message is not a search or the
/// extracted query is too short to be useful.
pub(crate) fn search_query(lower: &str) -> Option<String> {
    let mut is_search = false;
    let mut query = lower.to_string();

    if let Some(keyword) = SEARCH_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        is_search = true;
        if EXTRACTING_KEYWORDS.contains(keyword) {
            if let Some((_, rest)) = lower.split_once(keyword) {
                if !rest.trim().is_empty() {
                    query = rest.trim().to_string();
                }
            }
        }
    }

    if !is_search && QUESTION_PATTERNS.iter().any(|re| re.is_match(lower)) {
        is_search = true;
    }

    if contains_any(lower, SPORTS_TERMS) {
        is_search = true;
        if lower.contains("search the nfl") {
            query = "NFL news today latest scores".to_string();
        } else if lower.contains("nfl") && !contains_any(lower, &["score", "news", "game", "today"]) {
            query = format!("NFL {} latest news", lower.replace("nfl", "").trim());
        }
    }

    if !is_search {
        return None;
    }
    let query = strip_fillers(&query);
    (query.chars().count() > 2).then_some(query)
}

/// Drop leading filler words ("about", "for", "the"), repeatedly.
fn strip_fillers(query: &str) -> String {
    query
        .split_whitespace()
        .skip_while(|w| FILLER_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_city() {
        assert_eq!(weather_city("weather in new york").as_deref(), Some("new,york"));
        assert_eq!(
            weather_city("what's the weather in dayton ohio?").as_deref(),
            Some("dayton,ohio")
        );
        assert_eq!(weather_city("weather in paris in june").as_deref(), Some("paris"));
        assert_eq!(weather_city("weather today"), None);
        assert_eq!(weather_city("weather in "), None);
    }

    #[test]
    fn test_extracting_keyword() {
        assert_eq!(search_query("search for rust lifetimes").as_deref(), Some("rust lifetimes"));
        assert_eq!(search_query("please google the eiffel tower").as_deref(), Some("eiffel tower"));
        assert_eq!(search_query("tell me about the moon landing").as_deref(), Some("moon landing"));
    }

    #[test]
    fn test_non_extracting_keyword_keeps_message() {
        assert_eq!(
            search_query("latest rust release").as_deref(),
            Some("latest rust release")
        );
    }

    #[test]
    fn test_question_pattern() {
        assert_eq!(
            search_query("why do cats purr").as_deref(),
            Some("why do cats purr")
        );
        assert_eq!(search_query("nice weather-free chat"), None);
    }

    #[test]
    fn test_sports_rewrites() {
        assert_eq!(
            search_query("search the nfl").as_deref(),
            Some("NFL news today latest scores")
        );
        assert_eq!(
            search_query("nfl bengals").as_deref(),
            Some("NFL bengals latest news")
        );
        assert_eq!(
            search_query("nfl score tonight").as_deref(),
            Some("nfl score tonight")
        );
    }

    #[test]
    fn test_short_query_rejected() {
        assert_eq!(search_query("find it"), None);
        assert_eq!(search_query("find the"), None);
    }

    #[test]
    fn test_strip_fillers() {
        assert_eq!(strip_fillers("about the for thing"), "thing");
        assert_eq!(strip_fillers("theory of everything"), "theory of everything");
        assert_eq!(strip_fillers("the"), "");
    }
}
