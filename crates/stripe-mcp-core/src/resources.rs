use crate::audit::AuditLog;
use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const AUDIT_URI: &str = "audit://stripe-operations";
const AUDIT_SCHEME: &str = "audit";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: &'static str,
    pub text: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResourceError {
    UnsupportedScheme(String),
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ResourceError::UnsupportedScheme(_) => write!(f, "Unsupported URI scheme"),
        }
    }
}

impl std::error::Error for ResourceError {}

pub fn list() -> Vec<ResourceDescriptor> {
    vec![ResourceDescriptor {
        uri: AUDIT_URI,
        name: "Stripe Operations Audit Log",
        description: "Log of all Stripe operations performed",
        mime_type: "text/plain",
    }]
}

fn scheme(uri: &str) -> Option<&str> {
    uri.split_once(':').map(|(scheme, _)| scheme)
}

/// Every `audit:` uri resolves to the rendered audit log.
pub fn read(uri: &str, audit: &AuditLog) -> Result<ResourceContents, ResourceError> {
    match scheme(uri) {
        Some(s) if s.eq_ignore_ascii_case(AUDIT_SCHEME) => Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: "text/plain",
            text: audit.render(),
        }),
        other => Err(ResourceError::UnsupportedScheme(
            other.unwrap_or_default().to_string(),
        )),
    }
}
