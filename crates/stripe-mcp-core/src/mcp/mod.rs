use crate::audit::AuditLog;
use crate::config::Config;
use crate::resources;
use crate::stripe::StripeApi;
use crate::tools::{self, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub mod error;
pub(crate) mod method;
pub mod message;
pub mod state;

use error::{ErrorCode, RpcError};
use message::{Decoded, Incoming, Response};
use method::Method;
use state::Lifecycle;

/// Newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl From<&Config> for ServerInfo {
    fn from(config: &Config) -> Self {
        Self {
            name: config.server_name.clone(),
            version: config.server_version.clone(),
        }
    }
}

struct Inner {
    api: Box<dyn StripeApi>,
    audit: AuditLog,
    info: ServerInfo,
}

/// Shared state of the MCP server. Cheap to clone; every session sees the
/// same Stripe client and audit log.
#[derive(Clone)]
pub struct Server {
    inner: Arc<Inner>,
}

impl Server {
    pub fn new(api: impl StripeApi + 'static, audit: AuditLog, info: ServerInfo) -> Self {
        Self {
            inner: Arc::new(Inner {
                api: Box::new(api),
                audit,
                info,
            }),
        }
    }

    pub fn audit(&self) -> &AuditLog {
        &self.inner.audit
    }

    pub fn session(&self) -> Session {
        Session {
            server: self.clone(),
            lifecycle: Lifecycle::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: Option<String>,
}

#[derive(Deserialize)]
struct ReadResourceParams {
    uri: String,
}

#[derive(Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn params<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, RpcError> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| RpcError::new(ErrorCode::InvalidParams, e.to_string()))
}

/// One client conversation: a lifecycle plus a handle on the server.
pub struct Session {
    server: Server,
    lifecycle: Lifecycle,
}

impl Session {
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Handles one line of input. Returns `None` for notifications and
    /// anything else that must not be answered.
    pub async fn handle_line(&mut self, line: &str) -> Option<Response> {
        match message::decode(line) {
            Decoded::Message(incoming) => self.handle(incoming).await,
            Decoded::Reply => {
                tracing::debug!("ignoring client response");
                None
            }
            Decoded::Invalid(id, error) => {
                tracing::warn!("rejecting message: {}", error.message);
                Some(Response::failure(id, error))
            }
        }
    }

    async fn handle(&mut self, incoming: Incoming) -> Option<Response> {
        let method = Method::from_name(&incoming.method);
        tracing::debug!("received {}", incoming.method);

        let Some(id) = incoming.id else {
            if let Method::Unknown(name) = &method {
                tracing::debug!("ignoring unknown notification {}", name);
            }
            self.lifecycle = self.lifecycle.next(&method);
            return None;
        };

        if !self.lifecycle.admits(&method) {
            return Some(Response::failure(
                Some(id),
                ErrorCode::ServerNotInitialized.into(),
            ));
        }

        let result = self.dispatch(&method, incoming.params).await;
        if result.is_ok() {
            self.lifecycle = self.lifecycle.next(&method);
        }
        Some(match result {
            Ok(value) => Response::success(id, value),
            Err(error) => Response::failure(Some(id), error),
        })
    }

    async fn dispatch(&self, method: &Method, raw: Value) -> Result<Value, RpcError> {
        let inner = &self.server.inner;
        match method {
            Method::Initialize => {
                let p: InitializeParams = params(raw)?;
                Ok(self.initialize(p.protocol_version.as_deref()))
            }
            Method::Ping => Ok(json!({})),
            Method::ListResources => {
                let resources = serde_json::to_value(resources::list())?;
                Ok(json!({ "resources": resources }))
            }
            Method::ReadResource => {
                let p: ReadResourceParams = params(raw)?;
                let contents = resources::read(&p.uri, &inner.audit)
                    .map_err(|e| RpcError::new(ErrorCode::InvalidParams, e.to_string()))?;
                let contents = serde_json::to_value(contents)?;
                Ok(json!({ "contents": [contents] }))
            }
            Method::ListTools => {
                let tools = serde_json::to_value(tools::catalog())?;
                Ok(json!({ "tools": tools }))
            }
            Method::CallTool => {
                let p: CallToolParams = params(raw)?;
                Ok(self.call_tool(&p.name, p.arguments).await)
            }
            Method::Initialized | Method::Cancelled | Method::Unknown(_) => {
                Err(ErrorCode::MethodNotFound.into())
            }
        }
    }

    fn initialize(&self, requested: Option<&str>) -> Value {
        let info = &self.server.inner.info;
        let version = requested
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]);
        tracing::info!(
            "initializing session with protocol {} (client asked for {})",
            version,
            requested.unwrap_or("nothing")
        );
        json!({
            "protocolVersion": version,
            "capabilities": {
                "experimental": {},
                "resources": {"subscribe": false, "listChanged": false},
                "tools": {"listChanged": false}
            },
            "serverInfo": {"name": info.name, "version": info.version}
        })
    }

    /// Tool failures are part of the result, flagged with `isError`.
    async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let inner = &self.server.inner;
        match tools::call(inner.api.as_ref(), &inner.audit, name, arguments).await {
            Ok(result) => json!({
                "content": [{"type": "text", "text": result.to_string()}],
                "isError": false
            }),
            Err(e) => {
                if !matches!(e, ToolError::Stripe(_)) {
                    tracing::warn!("tool call {} failed: {}", name, e);
                }
                json!({
                    "content": [{"type": "text", "text": e.to_string()}],
                    "isError": true
                })
            }
        }
    }
}
