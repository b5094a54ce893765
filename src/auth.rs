//! credential providers
//!
//! the executor calls [`AuthProvider::apply`] on every physical attempt.
//! acquiring or refreshing credentials is the provider's business; the
//! providers here only apply values they were handed.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use std::fmt;

/// applies credentials to an outgoing request
pub trait AuthProvider: Send + Sync {
    /// add credential headers to `headers`
    fn apply(&self, headers: &mut HeaderMap) -> Result<()>;
}

fn sensitive_value(value: &str, what: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|err| Error::Config(format!("invalid {what} header value: {err}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// oauth / personal access token sent as `Authorization: Bearer <token>`
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl AuthProvider for BearerAuth {
    fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("bearer token cannot be empty".to_string()));
        }
        headers.insert(
            AUTHORIZATION,
            sensitive_value(&format!("Bearer {}", self.token.trim()), "authorization")?,
        );
        Ok(())
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// account email + api token sent as http basic auth
#[derive(Clone)]
pub struct BasicAuth {
    email: String,
    api_token: String,
}

impl BasicAuth {
    pub fn new(email: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_token: api_token.into(),
        }
    }
}

impl AuthProvider for BasicAuth {
    fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        if self.email.is_empty() || self.api_token.is_empty() {
            return Err(Error::Config(
                "basic auth requires an email and an api token".to_string(),
            ));
        }
        let encoded = STANDARD.encode(format!("{}:{}", self.email, self.api_token));
        headers.insert(
            AUTHORIZATION,
            sensitive_value(&format!("Basic {encoded}"), "authorization")?,
        );
        Ok(())
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// browser session cookies sent as a single `Cookie` header
#[derive(Clone)]
pub struct CookieAuth {
    cookies: Vec<(String, String)>,
}

impl CookieAuth {
    /// cookies are sent in the order given
    pub fn new<K, V>(cookies: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cookies: cookies
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl AuthProvider for CookieAuth {
    fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        if self.cookies.is_empty() {
            return Err(Error::Config("cookie auth requires at least one cookie".to_string()));
        }
        let joined = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.insert(COOKIE, sensitive_value(&joined, "cookie")?);
        Ok(())
    }
}

impl fmt::Debug for CookieAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.cookies.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("CookieAuth")
            .field("cookies", &names)
            .finish()
    }
}

/// adds nothing; for transports that authenticate on their own
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn apply(&self, _headers: &mut HeaderMap) -> Result<()> {
        Ok(())
    }
}
