//! Error classification logic

use crate::error_code::ErrorKind;

/// Classify a non-success HTTP response.
///
/// Providers report paused and cold-starting endpoints with a variety of status codes
/// (400, 503, 524) but consistently mention it in the error text, so the body is checked
/// before the status code:
/// - "paused" anywhere in the error text wins
/// - "loading" in the text, or 503/524, is a transient warm-up
/// - everything else maps by status code
pub fn classify_failure(status: u16, error_text: &str) -> ErrorKind {
    let lower = error_text.to_lowercase();
    if lower.contains("paused") {
        return ErrorKind::Paused;
    }
    if lower.contains("loading") || status == 503 || status == 524 {
        return ErrorKind::Transient;
    }
    ErrorKind::from_http_status(status)
}

/// Pull a human-readable error message out of a provider error body.
///
/// Accepts the common shapes `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`; anything else is returned trimmed as-is.
pub fn extract_error_text(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    if let Some(err) = json.get("error") {
        if let Some(s) = err.as_str() {
            return s.to_string();
        }
        if let Some(msg) = err.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
        return err.to_string();
    }

    json.get("message")
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| body.trim().to_string())
}
