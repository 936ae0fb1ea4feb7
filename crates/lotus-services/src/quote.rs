//! Quote of the moment from a plain-text endpoint.

use lotus_core::{NetworkError, ReqwestErrorExt};
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Quote request failed: {0}")]
    Network(#[from] NetworkError),
    #[error("Quote endpoint returned an empty body")]
    Empty,
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        QuoteError::Network(e.into_network_error())
    }
}

#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: Client,
    url: String,
}

impl QuoteClient {
    pub fn new(url: impl Into<String>) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch one quote. Anything but a 2xx with a non-blank body is an error.
    pub async fn fetch(&self) -> Result<String, QuoteError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            }
            .into());
        }

        let text = response.text().await?;
        let quote = text.trim();
        if quote.is_empty() {
            return Err(QuoteError::Empty);
        }

        Ok(quote.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  人生如逆旅，我亦是行人。\n"))
            .mount(&server)
            .await;

        let client = QuoteClient::new(format!("{}/", server.uri())).unwrap();
        assert_eq!(client.fetch().await.unwrap(), "人生如逆旅，我亦是行人。");
    }

    #[tokio::test]
    async fn test_non_success_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = QuoteClient::new(server.uri()).unwrap();
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(
            err,
            QuoteError::Network(NetworkError::ServerError { status: 429, .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("   "))
            .mount(&server)
            .await;

        let client = QuoteClient::new(server.uri()).unwrap();
        assert!(matches!(client.fetch().await, Err(QuoteError::Empty)));
    }
}
