use crate::stripe::{StripeApi, StripeError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub path: String,
    pub params: Vec<(String, String)>,
}

/// Records calls and echoes them back as a fake Stripe object.
#[derive(Default)]
pub(crate) struct MockStripe {
    pub calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<(u16, String)>>,
}

impl MockStripe {
    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(Some((status, message.to_string()))),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(
        &self,
        method: &'static str,
        path: &[&str],
        params: Vec<(String, String)>,
    ) -> Result<Value, StripeError> {
        let path = path.join("/");
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.clone(),
            params: params.clone(),
        });

        if let Some((status, message)) = self.failure.lock().unwrap().clone() {
            if status == 401 {
                return Err(StripeError::Authentication(message));
            }
            return Err(StripeError::Api {
                status,
                kind: "invalid_request_error".to_string(),
                message,
            });
        }

        let params: serde_json::Map<String, Value> = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Ok(json!({ "object": path, "method": method, "params": params }))
    }
}

#[async_trait]
impl StripeApi for MockStripe {
    async fn get(&self, path: &[&str], query: Vec<(String, String)>) -> Result<Value, StripeError> {
        self.respond("GET", path, query)
    }

    async fn post(&self, path: &[&str], form: Vec<(String, String)>) -> Result<Value, StripeError> {
        self.respond("POST", path, form)
    }
}
