//! Remote failure taxonomy.
//!
//! Every failure of a remote model call is reduced to one [`ErrorKind`] at the client
//! boundary. The router decides retry, alternate walk and budget accounting from the
//! kind alone, never from message text.
//!
//! | Kind | Typical source | Retry primary | Opens alternates | Uses alternate budget |
//! |------|----------------|---------------|------------------|-----------------------|
//! | `Auth` | 401 / 403 | no (one credential reload) | no | yes |
//! | `RateLimit` | 429 | yes | no | yes |
//! | `BadRequest` | 400 | no | no | yes |
//! | `NotFound` | 404 | no | no | **no** |
//! | `Transient` | 503 / 524 / "loading" | yes | yes | yes |
//! | `Paused` | "paused" in body | yes | yes | yes |
//! | `Timeout` | network timeout | no | no | yes |
//! | `EmptyResponse` | 200 with blank content | yes | no | yes |
//! | `Unknown` | anything else | no | no | yes |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed outcome of a failed remote model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid, expired or missing API key (401/403).
    Auth,
    /// Request rate limit exceeded (429).
    RateLimit,
    /// Malformed request; often a paused endpoint hiding behind a 400.
    BadRequest,
    /// Model or endpoint does not exist (404). Permanent for this process.
    NotFound,
    /// Endpoint is loading or temporarily unavailable (503/524, "loading").
    Transient,
    /// Endpoint reports itself as paused.
    Paused,
    /// Network-level timeout.
    Timeout,
    /// HTTP success with an empty or whitespace-only completion.
    EmptyResponse,
    /// Could not be classified.
    Unknown,
}

impl ErrorKind {
    /// Returns the standard snake_case name (e.g., `"rate_limit"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Transient => "transient",
            Self::Paused => "paused",
            Self::Timeout => "timeout",
            Self::EmptyResponse => "empty_response",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the primary model should be tried again after this failure.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Transient | Self::Paused | Self::EmptyResponse
        )
    }

    /// Whether this failure, as the last primary error, allows the alternates walk
    /// when status pings are not being ignored.
    #[inline]
    pub fn opens_alternates(&self) -> bool {
        matches!(self, Self::Transient | Self::Paused)
    }

    /// Whether a failed alternate attempt of this kind counts against the alternate cap.
    #[inline]
    pub fn consumes_alternate_budget(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Maps an HTTP status code to its kind, without looking at the body.
    ///
    /// Body sniffing for paused/loading endpoints lives in
    /// [`crate::client::classify_failure`].
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 | 403 => Self::Auth,
            404 => Self::NotFound,
            408 => Self::Timeout,
            429 => Self::RateLimit,
            503 | 524 => Self::Transient,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::from_http_status(401), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_http_status(403), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_http_status(429), ErrorKind::RateLimit);
        assert_eq!(ErrorKind::from_http_status(400), ErrorKind::BadRequest);
        assert_eq!(ErrorKind::from_http_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_http_status(503), ErrorKind::Transient);
        assert_eq!(ErrorKind::from_http_status(524), ErrorKind::Transient);
        assert_eq!(ErrorKind::from_http_status(500), ErrorKind::Unknown);
    }

    #[test]
    fn test_only_not_found_is_free() {
        let all = [
            ErrorKind::Auth,
            ErrorKind::RateLimit,
            ErrorKind::BadRequest,
            ErrorKind::NotFound,
            ErrorKind::Transient,
            ErrorKind::Paused,
            ErrorKind::Timeout,
            ErrorKind::EmptyResponse,
            ErrorKind::Unknown,
        ];
        let free: Vec<_> = all
            .iter()
            .filter(|k| !k.consumes_alternate_budget())
            .collect();
        assert_eq!(free, vec![&ErrorKind::NotFound]);
    }

    #[test]
    fn test_retryable_set() {
        assert!(ErrorKind::RateLimit.retryable());
        assert!(ErrorKind::Paused.retryable());
        assert!(ErrorKind::Transient.retryable());
        assert!(ErrorKind::EmptyResponse.retryable());
        assert!(!ErrorKind::Auth.retryable());
        assert!(!ErrorKind::Timeout.retryable());
        assert!(!ErrorKind::BadRequest.retryable());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ErrorKind::EmptyResponse).unwrap();
        assert_eq!(json, "\"empty_response\"");
    }
}
