use crate::config::Config;
use crate::stripe::{StripeApi, StripeError};
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("stripe-mcp-server/", env!("CARGO_PKG_VERSION"));

/// `StripeApi` over HTTPS with bearer authentication.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    api_base: Url,
    api_key: String,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self, StripeError> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| StripeError::InvalidUrl(format!("{}: {}", config.api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(StripeError::InvalidUrl(config.api_base.clone()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &[&str]) -> Result<Url, StripeError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StripeError::InvalidUrl(self.api_base.to_string()))?;
            segments.pop_if_empty().push("v1");
            for segment in path {
                // pushed segments are percent-encoded, so ids cannot escape the path
                segments.push(segment);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl StripeApi for HttpClient {
    async fn get(&self, path: &[&str], query: Vec<(String, String)>) -> Result<Value, StripeError> {
        let url = self.url(path)?;
        tracing::debug!("GET {}", url.path());
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(&query)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn post(&self, path: &[&str], form: Vec<(String, String)>) -> Result<Value, StripeError> {
        let url = self.url(path)?;
        tracing::debug!("POST {}", url.path());
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await?;
        handle_response(response).await
    }
}

async fn handle_response(response: Response) -> Result<Value, StripeError> {
    let status = response.status();
    let body = response.text().await?;
    let value: Value = serde_json::from_str(&body).map_err(|e| {
        StripeError::Decode(format!("HTTP {} with non-JSON body: {}", status.as_u16(), e))
    })?;

    if status.is_success() {
        return Ok(value);
    }

    let error = value.get("error");
    let field = |name: &str| {
        error
            .and_then(|e| e.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let message = field("message").unwrap_or_else(|| format!("Stripe returned HTTP {}", status));

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(StripeError::Authentication(message));
    }
    Err(StripeError::Api {
        status: status.as_u16(),
        kind: field("type").unwrap_or_else(|| "api_error".to_string()),
        message,
    })
}
