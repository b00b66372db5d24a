//! Stripe's bracket-notation form encoding.
//!
//! `{"metadata": {"plan": "pro"}, "payment_method_types": ["card"]}` becomes
//! `metadata[plan]=pro&payment_method_types[0]=card`. A JSON `null` is sent as
//! an empty value, which Stripe treats as "unset this field".

use serde_json::{Map, Value};

pub type Params = Map<String, Value>;

pub fn encode(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten(format!("{}[{}]", prefix, key), value, pairs);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten(format!("{}[{}]", prefix, index), value, pairs);
            }
        }
        Value::Null => pairs.push((prefix, String::new())),
        Value::Bool(b) => pairs.push((prefix, b.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
        Value::String(s) => pairs.push((prefix, s.clone())),
    }
}
