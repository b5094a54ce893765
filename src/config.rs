//! client configuration
//!
//! a [`ClientConfig`] carries the site url, a credential provider, and the
//! transport policy (timeouts, 429 retries, local budget). hand it to
//! [`crate::Client::new`].

use crate::auth::AuthProvider;
use crate::budget::CostBudgetConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// default path of the graphql gateway, relative to the base url
pub const DEFAULT_GRAPHQL_PATH: &str = "/graphql";

/// transport settings shared by every call a client makes
#[derive(Clone)]
pub struct ClientConfig {
    /// base url as given, kept for error messages
    pub(crate) raw_base_url: String,

    /// parsed base url, `None` if the input did not parse
    pub(crate) base_url: Option<Url>,

    /// applies credentials to every attempt
    pub(crate) auth: Arc<dyn AuthProvider>,

    /// graphql endpoint path
    pub(crate) graphql_path: String,

    /// timeout for one physical attempt
    pub(crate) timeout: Duration,

    /// user agent string
    pub(crate) user_agent: String,

    pub(crate) verify_ssl: bool,

    /// sent on every attempt, before auth
    pub(crate) extra_headers: HeaderMap,

    /// experimental api flags sent with every request
    pub(crate) experimental_apis: Vec<String>,

    /// 429 retry bounds
    pub(crate) retry: RetryPolicy,

    /// local token bucket; `None` keeps local accounting off entirely
    pub(crate) local_budget: Option<CostBudgetConfig>,

    /// promote graphql operation errors to `Error::GraphQl`
    pub(crate) strict: bool,

    /// observed by every wait the client performs
    pub(crate) cancellation: CancellationToken,

    /// used as-is when set; wins over `http_client_builder`
    pub(crate) http_client: Option<reqwest::Client>,

    /// hook run on the default reqwest builder
    pub(crate) http_client_builder:
        Option<Arc<dyn Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync>>,
}

impl ClientConfig {
    /// configuration for a site url and credential provider
    ///
    /// # arguments
    ///
    /// * `base_url` - site or gateway url (with or without trailing slash)
    /// * `auth` - credential provider applied to every request
    ///
    /// # example
    ///
    /// ```
    /// use worktrack::{BearerAuth, ClientConfig};
    ///
    /// let config = ClientConfig::new("https://api.atlassian.com", BearerAuth::new("token"));
    /// ```
    pub fn new(base_url: impl AsRef<str>, auth: impl AuthProvider + 'static) -> Self {
        let raw = base_url.as_ref();
        let trimmed = raw.trim_end_matches('/');
        // bare host names get https
        let base_url = Url::parse(trimmed)
            .or_else(|_| Url::parse(&format!("https://{trimmed}")))
            .ok();

        Self {
            raw_base_url: raw.to_string(),
            base_url,
            auth: Arc::new(auth),
            graphql_path: DEFAULT_GRAPHQL_PATH.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("worktrack-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            extra_headers: HeaderMap::new(),
            experimental_apis: Vec::new(),
            retry: RetryPolicy::default(),
            local_budget: None,
            strict: false,
            cancellation: CancellationToken::new(),
            http_client: None,
            http_client_builder: None,
        }
    }

    /// set the graphql endpoint path
    ///
    /// default: `/graphql`
    pub fn with_graphql_path(mut self, path: impl Into<String>) -> Self {
        self.graphql_path = path.into();
        self
    }

    /// set the timeout for each physical attempt
    ///
    /// a logical call that retries can take longer than this.
    /// default: 30 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// override the `user-agent` sent on every attempt
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// turn tls certificate checks on or off
    ///
    /// default: on. ignored with a prebuilt http client.
    pub fn with_ssl_verification(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// send one extra header on every attempt
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.insert(name, value);
        self
    }

    /// send several extra headers on every attempt
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.extra_headers.extend(headers);
        self
    }

    /// extra headers configured so far
    pub fn extra_headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    /// send an experimental api flag with every request
    pub fn with_experimental_api(mut self, flag: impl Into<String>) -> Self {
        let flag = flag.into();
        if !self.experimental_apis.contains(&flag) {
            self.experimental_apis.push(flag);
        }
        self
    }

    /// set how many times a 429 is retried and the longest wait sat through
    ///
    /// default: 2 retries, 60 seconds
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// enable the local cost budget
    ///
    /// default: disabled, no bucket is allocated
    pub fn with_local_budget(mut self, budget: CostBudgetConfig) -> Self {
        self.local_budget = Some(budget);
        self
    }

    /// treat graphql operation errors as hard errors even when data is present
    ///
    /// default: false (data and errors are both returned)
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// cancellation token observed by every retry and budget wait
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// use a caller-built reqwest client.
    ///
    /// user agent and tls settings then come from that client. the attempt
    /// timeout, extra headers, credentials, and experimental flags are still
    /// applied to every attempt.
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// adjust the reqwest builder (proxies, tls roots) after the user agent,
    /// timeout, and tls settings are applied.
    ///
    /// has no effect together with `with_http_client`.
    pub fn with_http_client_builder<F>(mut self, f: F) -> Self
    where
        F: Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync + 'static,
    {
        self.http_client_builder = Some(Arc::new(f));
        self
    }

    /// retry policy in effect
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let base_url = self.base_url()?;

        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(Error::Config(format!(
                "base url scheme must be http or https, got {}",
                base_url.scheme()
            )));
        }

        if !self.graphql_path.starts_with('/') {
            return Err(Error::Config(format!(
                "graphql path must start with '/': {}",
                self.graphql_path
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }

        if let Some(flag) = self.experimental_apis.iter().find(|f| f.trim().is_empty()) {
            return Err(Error::Config(format!(
                "experimental api flag must be non-empty: {flag:?}"
            )));
        }

        if let Some(budget) = &self.local_budget {
            budget.validate()?;
        }

        Ok(())
    }

    fn base_url(&self) -> Result<&Url> {
        self.base_url
            .as_ref()
            .ok_or_else(|| Error::Config(format!("invalid base url: {}", self.raw_base_url)))
    }

    fn base(&self) -> Result<String> {
        Ok(self.base_url()?.as_str().trim_end_matches('/').to_string())
    }

    pub(crate) fn graphql_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base()?, self.graphql_path))?)
    }

    /// build a rest url from a path and ordered query parameters
    pub(crate) fn rest_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base()?, path))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("graphql_path", &self.graphql_path)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("verify_ssl", &self.verify_ssl)
            .field("extra_headers", &self.extra_headers.len())
            .field("experimental_apis", &self.experimental_apis)
            .field("retry", &self.retry)
            .field("local_budget", &self.local_budget)
            .field("strict", &self.strict)
            .field("http_client", &self.http_client.is_some())
            .field("http_client_builder", &self.http_client_builder.is_some())
            .field("auth", &"<redacted>")
            .finish()
    }
}
