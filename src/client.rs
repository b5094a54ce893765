//! main client
//!
//! the request executor: one logical call in, one envelope or one terminal
//! error out. a call may make several physical attempts when the server
//! answers 429 and the retry policy allows another try.

use crate::budget::CostBudget;
use crate::config::ClientConfig;
use crate::error::{body_snippet, Error, Result};
use crate::graphql::{operation_error, request_id_from_body, GraphQlResponse};
use crate::operation::Operation;
use crate::redact::RedactedHeaders;
use crate::request::{Request, Target};
use crate::response::Envelope;
use crate::retry::{RateLimitSignal, RetryDecision};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// header carrying one experimental api flag
pub const EXPERIMENTAL_API_HEADER: HeaderName = HeaderName::from_static("x-experimentalapi");

/// rest and graphql client for work-tracking apis
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    budget: Option<Arc<CostBudget>>,
    cancel: CancellationToken,
}

impl Client {
    /// create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        // surface malformed credentials at construction, not on first call
        config.auth.apply(&mut HeaderMap::new())?;

        let http = match config.http_client.clone() {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder()
                    .user_agent(config.user_agent.clone())
                    .timeout(config.timeout)
                    .danger_accept_invalid_certs(!config.verify_ssl);
                if let Some(customize) = &config.http_client_builder {
                    builder = customize(builder);
                }
                builder.build()?
            }
        };

        let budget = match config.local_budget {
            Some(budget) => Some(Arc::new(CostBudget::new(budget)?)),
            None => None,
        };
        let cancel = config.cancellation.clone();

        Ok(Self {
            config: Arc::new(config),
            http,
            budget,
            cancel,
        })
    }

    /// access the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// local cost budget, if enabled
    pub fn budget(&self) -> Option<&CostBudget> {
        self.budget.as_deref()
    }

    /// token observed by every wait this client performs
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// a client sharing transport and budget that observes `token` instead
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    /// execute one logical request
    ///
    /// returns the envelope of the first 2xx response. a 429 is retried as the
    /// retry policy allows; any other status fails with [`Error::Transport`].
    pub async fn execute(&self, request: &Request) -> Result<Envelope> {
        self.execute_with(request, |http_request| async move {
            let response = self.http.execute(http_request).await?;
            Envelope::from_response(response).await
        })
        .await
    }

    /// execute a request and decode the body as json
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        self.execute(request).await?.json()
    }

    /// execute a graphql request and decode the response
    ///
    /// data and errors are both returned unless the client is strict, in which
    /// case any operation error becomes [`Error::GraphQl`].
    pub async fn execute_graphql<T: DeserializeOwned>(
        &self,
        request: &Request,
    ) -> Result<GraphQlResponse<T>> {
        if !request.is_graphql() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a graphql request",
                request.label()
            )));
        }
        let envelope = self.execute(request).await?;
        decode_graphql(&envelope, self.config.strict)
    }

    /// execute a pre-built operation
    pub async fn execute_operation<O: Operation>(
        &self,
        variables: serde_json::Value,
    ) -> Result<GraphQlResponse<O::Response>> {
        let request = Request::graphql(O::QUERY)
            .operation_name(O::NAME)
            .variables(variables)
            .cost(O::COST)
            .experimental_apis(O::EXPERIMENTAL_APIS.iter().copied())
            .build()?;
        self.execute_graphql(&request).await
    }
}

impl Client {
    pub(crate) async fn execute_with<F, Fut>(&self, request: &Request, mut send: F) -> Result<Envelope>
    where
        F: FnMut(reqwest::Request) -> Fut,
        Fut: Future<Output = Result<Envelope>>,
    {
        let url = self.url_for(request)?;
        let method = request.method();
        let operation = request.label();
        let policy = self.config.retry;
        let mut attempt: u32 = 1;

        loop {
            if let Some(budget) = &self.budget {
                budget.acquire(request.cost(), &self.cancel).await?;
            }

            let headers = self.attempt_headers(request)?;
            debug!(
                method = %method,
                url = %url,
                attempt,
                max_attempts = policy.max_attempts(),
                headers = ?RedactedHeaders(&headers),
                "sending request"
            );

            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .headers(headers)
                .timeout(self.config.timeout);
            if let Some(body) = request.body() {
                builder = builder.json(&body);
            }
            let http_request = builder.build()?;

            let envelope = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                result = send(http_request) => result?,
            };

            let status = envelope.status();
            if status.is_success() {
                return Ok(envelope);
            }
            if status != StatusCode::TOO_MANY_REQUESTS {
                return Err(Error::Transport {
                    status: status.as_u16(),
                    method: method.to_string(),
                    url: url.to_string(),
                    body: body_snippet(envelope.body()),
                });
            }

            let signal =
                RateLimitSignal::from_header(envelope.header(RETRY_AFTER.as_str()), Utc::now());
            debug!(
                attempt,
                present = signal.header.is_some(),
                parsed = signal.resume.is_ok(),
                header = ?signal.header,
                "resume header on 429"
            );
            let resume = signal
                .resume_at()
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "unparseable".to_string());
            let request_id = request_id_from_body(envelope.body());
            warn!(
                attempt,
                resume_at = %resume,
                wait = ?signal.clamped_wait(),
                operation = %operation,
                request_id = ?request_id,
                "Rate limited"
            );

            match policy.decide(&signal, attempt) {
                RetryDecision::GiveUp(failure) => return Err(Error::RateLimited(failure)),
                RetryDecision::Retry { wait } => {
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn url_for(&self, request: &Request) -> Result<Url> {
        match request.target() {
            Target::Rest { path, query, .. } => self.config.rest_url(path, query),
            Target::GraphQl { .. } => self.config.graphql_url(),
        }
    }

    fn attempt_headers(&self, request: &Request) -> Result<HeaderMap> {
        let mut headers = self.config.extra_headers.clone();
        self.config.auth.apply(&mut headers)?;

        let defaults = self.config.experimental_apis.iter();
        let extra = request
            .experimental_apis()
            .iter()
            .filter(|flag| !self.config.experimental_apis.contains(flag));
        for flag in defaults.chain(extra) {
            let value = HeaderValue::from_str(flag).map_err(|err| {
                Error::InvalidArgument(format!("invalid experimental api flag {flag:?}: {err}"))
            })?;
            headers.append(EXPERIMENTAL_API_HEADER, value);
        }
        Ok(headers)
    }
}

fn decode_graphql<T: DeserializeOwned>(
    envelope: &Envelope,
    strict: bool,
) -> Result<GraphQlResponse<T>> {
    let status = Some(envelope.status().as_u16());
    let body = envelope.body();
    let mut raw: GraphQlResponse<serde_json::Value> = serde_json::from_str(body)?;
    if strict {
        raw = raw.into_strict(status, body)?;
    }

    let GraphQlResponse {
        data,
        errors,
        extensions,
    } = raw;

    let data = match data {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => match <T as Deserialize>::deserialize(&value) {
            Ok(typed) => Some(typed),
            Err(_) if !errors.is_empty() => {
                return Err(operation_error(errors, Some(value), status, body))
            }
            Err(err) => return Err(err.into()),
        },
    };

    Ok(GraphQlResponse {
        data,
        errors,
        extensions,
    })
}
