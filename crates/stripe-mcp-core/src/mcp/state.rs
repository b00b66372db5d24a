use crate::mcp::method::Method;

/// Where a session is in the MCP initialization handshake.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Lifecycle {
    #[default]
    AwaitingInitialize,
    /// `initialize` answered, `notifications/initialized` not seen yet.
    Initializing,
    Ready,
}

impl Lifecycle {
    pub(crate) fn admits(&self, method: &Method) -> bool {
        match method {
            Method::Initialize | Method::Ping => true,
            m if m.is_notification() => true,
            _ => *self != Lifecycle::AwaitingInitialize,
        }
    }

    pub(crate) fn next(self, method: &Method) -> Lifecycle {
        match (self, method) {
            (Lifecycle::AwaitingInitialize, Method::Initialize) => Lifecycle::Initializing,
            (Lifecycle::Initializing, Method::Initialized) => Lifecycle::Ready,
            (state, _) => state,
        }
    }
}
