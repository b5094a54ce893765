//! rate-limit aware client for work-tracking apis
//!
//! this crate provides the transport core shared by rest and graphql calls
//! against a cost-limited remote api: a request executor that waits out 429
//! responses within configured bounds, an optional local token bucket, a
//! paginator that refuses to loop on a repeated cursor, and a response model
//! that keeps graphql data and errors side by side.
//!
//! start with [`Client`] and [`ClientConfig`], build a [`Request`], then use
//! `execute`, `execute_json` or `execute_graphql`. typed jira calls live on
//! [`Client`] as well (see [`jira`]).
//!
//! ## quick start
//!
//! ```no_run
//! use worktrack::{BasicAuth, Client, ClientConfig, SprintState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new(
//!     "https://example.atlassian.net",
//!     BasicAuth::new("dev@example.com", "api-token"),
//! );
//! let client = Client::new(config)?;
//! let sprints = client
//!     .list_board_sprints(7, Some(SprintState::Active), 50)
//!     .await?;
//! println!("{} active sprints", sprints.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## rate limits
//!
//! a 429 is retried only when its `Retry-After` header parses as a timestamp,
//! the wait fits under [`RetryPolicy::max_wait`], and attempts remain. every
//! other non-2xx status fails at once with [`Error::Transport`].

mod auth;
mod budget;
mod client;
mod config;
mod error;
mod graphql;
pub mod jira;
mod operation;
mod pagination;
mod redact;
mod request;
mod response;
mod retry;
mod timestamp;

pub use auth::{AuthProvider, BasicAuth, BearerAuth, CookieAuth, NoAuth};
pub use budget::{CostBudget, CostBudgetConfig};
pub use client::{Client, EXPERIMENTAL_API_HEADER};
pub use config::{ClientConfig, DEFAULT_GRAPHQL_PATH};
pub use error::{Error, Result};
pub use graphql::{GraphQlError, GraphQlLocation, GraphQlResponse};
pub use jira::SprintState;
pub use operation::Operation;
pub use pagination::{
    paginate, Connection, Edge, OffsetPage, Page, PageInfo, Paginator, DEFAULT_PAGE_SIZE,
};
pub use redact::{is_sensitive, sanitize_headers, RedactedHeaders, REDACTED};
pub use request::{Request, RequestBuilder, Target};
pub use response::Envelope;
pub use retry::{
    RateLimitFailure, RateLimitReason, RateLimitSignal, RetryDecision, RetryPolicy,
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_WAIT,
};
pub use timestamp::{
    parse_optional_resume_after, parse_resume_after, ResumeAt, TimestampError, TimestampFormat,
};
pub use tokio_util::sync::CancellationToken;
