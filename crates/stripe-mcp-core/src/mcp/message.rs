use crate::mcp::error::{ErrorCode, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

/// A request (with `id`) or notification (without).
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Value,
}

#[derive(Deserialize)]
struct RawIncoming {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, PartialEq)]
pub enum Decoded {
    Message(Incoming),
    /// A response to something we never send; dropped.
    Reply,
    Invalid(Option<RequestId>, RpcError),
}

pub fn decode(line: &str) -> Decoded {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return Decoded::Invalid(None, RpcError::new(ErrorCode::ParseError, e.to_string()))
        }
    };

    let Value::Object(object) = value else {
        return Decoded::Invalid(None, ErrorCode::InvalidRequest.into());
    };

    let id = match object.get("id") {
        None | Some(Value::Null) => None,
        Some(raw) => match serde_json::from_value::<RequestId>(raw.clone()) {
            Ok(id) => Some(id),
            Err(_) => return Decoded::Invalid(None, ErrorCode::InvalidRequest.into()),
        },
    };

    if !object.contains_key("method")
        && (object.contains_key("result") || object.contains_key("error"))
    {
        return Decoded::Reply;
    }

    let raw: RawIncoming = match serde_json::from_value(Value::Object(object)) {
        Ok(raw) => raw,
        Err(e) => {
            return Decoded::Invalid(id, RpcError::new(ErrorCode::InvalidRequest, e.to_string()))
        }
    };
    if raw.jsonrpc != JSONRPC_VERSION {
        return Decoded::Invalid(
            id,
            RpcError::new(
                ErrorCode::InvalidRequest,
                format!("unsupported jsonrpc version {}", raw.jsonrpc),
            ),
        );
    }

    Decoded::Message(Incoming {
        id,
        method: raw.method,
        params: raw.params,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ErrorObject {
                code: error.code.code(),
                message: error.message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        let decoded = decode(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#);
        assert_eq!(
            decoded,
            Decoded::Message(Incoming {
                id: Some(RequestId::Number(7)),
                method: "tools/list".to_string(),
                params: Value::Null,
            })
        );
    }

    #[test]
    fn test_decode_notification() {
        let decoded = decode(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        let Decoded::Message(incoming) = decoded else {
            panic!("expected message");
        };
        assert!(incoming.id.is_none());
    }

    #[test]
    fn test_decode_errors() {
        let Decoded::Invalid(id, err) = decode("{not json") else {
            panic!("expected parse error");
        };
        assert!(id.is_none());
        assert_eq!(err.code, ErrorCode::ParseError);

        let Decoded::Invalid(_, err) = decode("[1,2]") else {
            panic!("expected invalid request");
        };
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let Decoded::Invalid(id, err) = decode(r#"{"jsonrpc":"1.0","id":"a","method":"ping"}"#)
        else {
            panic!("expected invalid request");
        };
        assert_eq!(id, Some(RequestId::String("a".into())));
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let Decoded::Invalid(id, _) = decode(r#"{"jsonrpc":"2.0","id":3}"#) else {
            panic!("expected invalid request");
        };
        assert_eq!(id, Some(RequestId::Number(3)));
    }

    #[test]
    fn test_decode_reply_is_dropped() {
        assert_eq!(decode(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#), Decoded::Reply);
    }

    #[test]
    fn test_response_serialization() {
        let ok = Response::success(RequestId::Number(1), json!({}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "result": {}})
        );

        let err = Response::failure(None, ErrorCode::ParseError.into());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
        );
    }
}
