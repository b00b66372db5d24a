#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Method {
    Initialize,
    Initialized,
    Ping,
    ListResources,
    ReadResource,
    ListTools,
    CallTool,
    Cancelled,
    Unknown(String),
}

impl Method {
    pub(crate) fn from_name(name: &str) -> Self {
        match name {
            "initialize" => Method::Initialize,
            "notifications/initialized" => Method::Initialized,
            "ping" => Method::Ping,
            "resources/list" => Method::ListResources,
            "resources/read" => Method::ReadResource,
            "tools/list" => Method::ListTools,
            "tools/call" => Method::CallTool,
            "notifications/cancelled" => Method::Cancelled,
            other => Method::Unknown(other.to_string()),
        }
    }

    pub(crate) fn is_notification(&self) -> bool {
        matches!(self, Method::Initialized | Method::Cancelled)
    }
}
