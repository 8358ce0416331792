use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects API-key headers.
///
/// Headers already set on a request win, so a caller can replace the
/// default `Authorization` with a user's own access token.
pub struct ApiKey<C> {
    inner: C,
    headers: HeaderMap,
}

impl<C> ApiKey<C> {
    /// Sends `key` in the header `header_name`.
    pub fn header(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(header_name.as_bytes())?,
            sensitive(key)?,
        );
        Ok(Self { inner, headers })
    }

    /// `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {key}"))?);
        Ok(Self { inner, headers })
    }

    /// The hosted backend wants its project key twice: as `apikey` and as a
    /// bearer token.
    pub fn service_key(inner: C, key: &str) -> Result<Self> {
        let mut this = Self::bearer(inner, key)?;
        this.headers
            .insert(HeaderName::from_static("apikey"), sensitive(key)?);
        Ok(this)
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        for (name, value) in &self.headers {
            req.headers_mut()
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        self.inner.execute(req).await
    }
}
