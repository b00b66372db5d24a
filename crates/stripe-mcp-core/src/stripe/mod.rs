use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub mod client;
pub mod form;
#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpClient;
pub use form::Params;

#[derive(Debug)]
pub enum StripeError {
    Http(reqwest::Error),
    Api {
        status: u16,
        kind: String,
        message: String,
    },
    Authentication(String),
    Decode(String),
    InvalidUrl(String),
}

impl Display for StripeError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            StripeError::Http(e) => write!(f, "{}", e),
            StripeError::Api { message, .. } => write!(f, "{}", message),
            StripeError::Authentication(message) => write!(f, "{}", message),
            StripeError::Decode(e) => write!(f, "unexpected response from Stripe: {}", e),
            StripeError::InvalidUrl(e) => write!(f, "invalid Stripe url: {}", e),
        }
    }
}

impl std::error::Error for StripeError {}

impl From<reqwest::Error> for StripeError {
    fn from(e: reqwest::Error) -> Self {
        StripeError::Http(e)
    }
}

/// The subset of the Stripe REST API exposed as tools.
///
/// Implementors only provide raw `GET`/`POST` against `/v1/<segments>`; the
/// resource operations are built on top of those two.
#[async_trait]
pub trait StripeApi: Send + Sync {
    async fn get(&self, path: &[&str], query: Vec<(String, String)>) -> Result<Value, StripeError>;

    async fn post(&self, path: &[&str], form: Vec<(String, String)>) -> Result<Value, StripeError>;

    async fn list_customers(&self, limit: u32) -> Result<Value, StripeError> {
        self.get(&["customers"], vec![("limit".into(), limit.to_string())])
            .await
    }

    /// Cheapest authenticated call; fails with `Authentication` on a bad key.
    async fn verify(&self) -> Result<(), StripeError> {
        self.list_customers(1).await.map(|_| ())
    }

    async fn create_customer(&self, params: &Params) -> Result<Value, StripeError> {
        self.post(&["customers"], form::encode(params)).await
    }

    async fn retrieve_customer(&self, id: &str) -> Result<Value, StripeError> {
        self.get(&["customers", id], Vec::new()).await
    }

    async fn update_customer(&self, id: &str, params: &Params) -> Result<Value, StripeError> {
        self.post(&["customers", id], form::encode(params)).await
    }

    async fn create_payment_intent(&self, params: &Params) -> Result<Value, StripeError> {
        self.post(&["payment_intents"], form::encode(params)).await
    }

    async fn list_charges(&self, params: &Params) -> Result<Value, StripeError> {
        self.get(&["charges"], form::encode(params)).await
    }

    async fn create_refund(&self, params: &Params) -> Result<Value, StripeError> {
        self.post(&["refunds"], form::encode(params)).await
    }
}
