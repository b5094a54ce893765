//! error types
//!
//! one enum for every way a logical call can end badly. transport failures,
//! server rate limits, local throttling and pagination stalls stay distinct so
//! callers can decide what to surface and what to retry at a higher level.

use crate::graphql::GraphQlError;
use crate::retry::RateLimitFailure;
use std::fmt;
use std::time::Duration;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// longest body excerpt kept on transport errors
pub(crate) const BODY_SNIPPET_LEN: usize = 512;

/// error type for the client, pagination, and jira helpers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// non-2xx, non-429 response; never retried
    #[error("unexpected http status {status} for {method} {url}")]
    Transport {
        status: u16,
        method: String,
        url: String,
        /// leading part of the response body
        body: String,
    },

    /// server-side rate limit that was not waited out
    #[error("{0}")]
    RateLimited(RateLimitFailure),

    /// local cost budget could not cover the call in time
    #[error(
        "local rate limit exceeded; estimated_cost={}; wait_seconds={:.3} exceeds max_wait_seconds={:.3}",
        .cost,
        .wait.as_secs_f64(),
        .max_wait.as_secs_f64()
    )]
    LocalThrottled {
        cost: u32,
        wait: Duration,
        max_wait: Duration,
    },

    /// a page token came back that this walk already fetched
    #[error("pagination not advancing: cursor {cursor} repeated; aborting")]
    PaginationStalled { cursor: String },

    /// the server said there is another page but gave no cursor for it
    #[error("pagination cursor missing for {path}")]
    PaginationCursorMissing { path: String },

    #[error("graphql error: {message}")]
    GraphQl {
        /// http status if available
        status: Option<u16>,
        /// graphql error list
        errors: Vec<GraphQlError>,
        /// raw response body
        body: String,
        /// top-level message
        message: String,
        /// whatever `data` the server did return
        partial_data: Option<serde_json::Value>,
    },

    #[error("missing data in {operation} response")]
    MissingData { operation: String },

    /// the caller's cancellation token fired during a wait or send
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// true if the error looks like an auth failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::GraphQl { status: Some(401 | 403), .. })
            || matches!(self, Error::Transport { status: 401 | 403, .. })
            || matches!(self, Error::Http(err) if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED))
    }

    /// true for server-enforced rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }

    /// true for client-side budget exhaustion
    pub fn is_local_throttle(&self) -> bool {
        matches!(self, Error::LocalThrottled { .. })
    }

    /// true if the caller cancelled the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// rate-limit details, if this is a rate-limit failure
    pub fn rate_limit(&self) -> Option<&RateLimitFailure> {
        match self {
            Error::RateLimited(failure) => Some(failure),
            _ => None,
        }
    }
}

/// truncate a body on a char boundary for error context
pub(crate) fn body_snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_LEN {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RateLimitReason;

    #[test]
    fn test_is_auth_error() {
        let err = Error::GraphQl {
            status: Some(401),
            errors: vec![],
            body: String::new(),
            message: "unauthorized".to_string(),
            partial_data: None,
        };
        assert!(err.is_auth_error());

        let err = Error::Transport {
            status: 403,
            method: "GET".to_string(),
            url: "https://example.com/rest/api/3/myself".to_string(),
            body: String::new(),
        };
        assert!(err.is_auth_error());

        let err = Error::Transport {
            status: 500,
            method: "GET".to_string(),
            url: "https://example.com".to_string(),
            body: String::new(),
        };
        assert!(!err.is_auth_error());
    }

    #[test]
    fn test_rate_limit_and_local_throttle_are_distinct() {
        let remote = Error::RateLimited(RateLimitFailure {
            reason: RateLimitReason::RetriesExhausted,
            attempts: 3,
            header: Some("2021-05-10T11:00:00Z".to_string()),
            resume_at: None,
            wait: Some(Duration::from_secs(1)),
            max_wait: None,
        });
        let local = Error::LocalThrottled {
            cost: 5,
            wait: Duration::from_secs(10),
            max_wait: Duration::from_secs(2),
        };

        assert!(remote.is_rate_limited() && !remote.is_local_throttle());
        assert!(local.is_local_throttle() && !local.is_rate_limited());
        assert_eq!(remote.rate_limit().unwrap().attempts, 3);
        assert!(local.rate_limit().is_none());
        assert_eq!(
            local.to_string(),
            "local rate limit exceeded; estimated_cost=5; wait_seconds=10.000 exceeds max_wait_seconds=2.000"
        );
    }

    #[test]
    fn test_body_snippet_truncates_on_char_boundary() {
        let short = "short body";
        assert_eq!(body_snippet(short), short);

        let long = "é".repeat(BODY_SNIPPET_LEN);
        let snippet = body_snippet(&long);
        assert!(snippet.ends_with("..."));
        assert!(snippet.len() <= BODY_SNIPPET_LEN + 3);
    }
}
