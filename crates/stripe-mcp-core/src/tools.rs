use crate::audit::AuditLog;
use crate::stripe::{Params, StripeApi, StripeError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{Display, Formatter};

pub const MAX_CHARGE_LIMIT: u32 = 100;

#[derive(Debug)]
pub enum ToolError {
    UnknownTool(String),
    InvalidArguments { tool: &'static str, reason: String },
    Stripe(StripeError),
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ToolError::UnknownTool(name) => write!(f, "Unknown tool: {}", name),
            ToolError::InvalidArguments { tool, reason } => {
                write!(f, "Invalid arguments for {}: {}", tool, reason)
            }
            ToolError::Stripe(e) => write!(f, "Payment processing failed: {}", e),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<StripeError> for ToolError {
    fn from(e: StripeError) -> Self {
        ToolError::Stripe(e)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "customer_create",
            description: "Create a new customer in Stripe",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": {"type": "string", "format": "email"},
                    "name": {"type": "string"},
                    "metadata": {"type": "object"}
                },
                "required": ["email"]
            }),
        },
        ToolDescriptor {
            name: "customer_retrieve",
            description: "Retrieve a customer's details",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": {"type": "string"}
                },
                "required": ["customer_id"]
            }),
        },
        ToolDescriptor {
            name: "customer_update",
            description: "Update customer information",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": {"type": "string"},
                    "update_fields": {
                        "type": "object",
                        "description": "Fields to update (email, name, metadata, etc.)"
                    }
                },
                "required": ["customer_id", "update_fields"]
            }),
        },
        ToolDescriptor {
            name: "payment_intent_create",
            description: "Create a payment intent for processing payments",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "amount": {"type": "integer", "description": "Amount in cents"},
                    "currency": {"type": "string", "default": "usd"},
                    "payment_method_types": {
                        "type": "array",
                        "items": {"type": "string"},
                        "default": ["card"]
                    },
                    "customer": {"type": "string"},
                    "metadata": {"type": "object"}
                },
                "required": ["amount", "currency"]
            }),
        },
        ToolDescriptor {
            name: "charge_list",
            description: "List recent charges",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "maximum": MAX_CHARGE_LIMIT, "default": 10},
                    "customer_id": {"type": "string"}
                }
            }),
        },
        ToolDescriptor {
            name: "refund_create",
            description: "Create a refund for a charge",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "charge_id": {"type": "string"},
                    "amount": {"type": "integer", "description": "Amount in cents to refund"},
                    "reason": {
                        "type": "string",
                        "enum": ["duplicate", "fraudulent", "requested_by_customer"]
                    }
                },
                "required": ["charge_id"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
pub struct CustomerCreate {
    email: String,
    name: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerRetrieve {
    customer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerUpdate {
    customer_id: String,
    update_fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentCreate {
    amount: i64,
    currency: String,
    #[serde(default = "default_payment_method_types")]
    payment_method_types: Vec<String>,
    customer: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

fn default_payment_method_types() -> Vec<String> {
    vec!["card".to_string()]
}

#[derive(Debug, Deserialize)]
pub struct ChargeList {
    #[serde(default = "default_charge_limit")]
    limit: u32,
    customer_id: Option<String>,
}

fn default_charge_limit() -> u32 {
    10
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    Duplicate,
    Fraudulent,
    #[default]
    RequestedByCustomer,
}

impl RefundReason {
    fn as_str(&self) -> &'static str {
        match self {
            RefundReason::Duplicate => "duplicate",
            RefundReason::Fraudulent => "fraudulent",
            RefundReason::RequestedByCustomer => "requested_by_customer",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefundCreate {
    charge_id: String,
    amount: Option<i64>,
    #[serde(default)]
    reason: RefundReason,
}

/// A validated tool invocation.
#[derive(Debug)]
pub enum ToolCall {
    CustomerCreate(CustomerCreate),
    CustomerRetrieve(CustomerRetrieve),
    CustomerUpdate(CustomerUpdate),
    PaymentIntentCreate(PaymentIntentCreate),
    ChargeList(ChargeList),
    RefundCreate(RefundCreate),
}

fn parse_args<T: DeserializeOwned>(tool: &'static str, arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(map),
        other => {
            return Err(ToolError::InvalidArguments {
                tool,
                reason: format!("expected an object, got {}", other),
            })
        }
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool,
        reason: e.to_string(),
    })
}

fn invalid(tool: &'static str, reason: &str) -> ToolError {
    ToolError::InvalidArguments {
        tool,
        reason: reason.to_string(),
    }
}

impl ToolCall {
    pub fn parse(name: &str, arguments: Value) -> Result<Self, ToolError> {
        let call = match name {
            "customer_create" => ToolCall::CustomerCreate(parse_args(
                "customer_create",
                arguments,
            )?),
            "customer_retrieve" => ToolCall::CustomerRetrieve(parse_args(
                "customer_retrieve",
                arguments,
            )?),
            "customer_update" => ToolCall::CustomerUpdate(parse_args(
                "customer_update",
                arguments,
            )?),
            "payment_intent_create" => ToolCall::PaymentIntentCreate(parse_args(
                "payment_intent_create",
                arguments,
            )?),
            "charge_list" => ToolCall::ChargeList(parse_args("charge_list", arguments)?),
            "refund_create" => ToolCall::RefundCreate(parse_args("refund_create", arguments)?),
            _ => return Err(ToolError::UnknownTool(name.to_string())),
        };
        call.validate()?;
        Ok(call)
    }

    fn validate(&self) -> Result<(), ToolError> {
        match self {
            ToolCall::CustomerCreate(args) if args.email.trim().is_empty() => {
                Err(invalid(self.name(), "email must not be empty"))
            }
            ToolCall::CustomerRetrieve(CustomerRetrieve { customer_id })
            | ToolCall::CustomerUpdate(CustomerUpdate { customer_id, .. })
                if customer_id.trim().is_empty() =>
            {
                Err(invalid(self.name(), "customer_id must not be empty"))
            }
            ToolCall::PaymentIntentCreate(args) if args.amount <= 0 => {
                Err(invalid(self.name(), "amount must be a positive number of cents"))
            }
            ToolCall::PaymentIntentCreate(args) if args.currency.trim().is_empty() => {
                Err(invalid(self.name(), "currency must not be empty"))
            }
            ToolCall::ChargeList(args) if args.limit == 0 || args.limit > MAX_CHARGE_LIMIT => {
                Err(invalid(self.name(), "limit must be between 1 and 100"))
            }
            ToolCall::RefundCreate(args) if args.charge_id.trim().is_empty() => {
                Err(invalid(self.name(), "charge_id must not be empty"))
            }
            ToolCall::RefundCreate(RefundCreate {
                amount: Some(amount),
                ..
            }) if *amount <= 0 => Err(invalid(
                self.name(),
                "amount must be a positive number of cents",
            )),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::CustomerCreate(_) => "customer_create",
            ToolCall::CustomerRetrieve(_) => "customer_retrieve",
            ToolCall::CustomerUpdate(_) => "customer_update",
            ToolCall::PaymentIntentCreate(_) => "payment_intent_create",
            ToolCall::ChargeList(_) => "charge_list",
            ToolCall::RefundCreate(_) => "refund_create",
        }
    }

    /// Only operations that change Stripe state end up in the audit log.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, ToolCall::CustomerRetrieve(_) | ToolCall::ChargeList(_))
    }

    pub async fn execute(&self, api: &dyn StripeApi) -> Result<Value, StripeError> {
        match self {
            ToolCall::CustomerCreate(args) => {
                let mut params = Params::new();
                params.insert("email".into(), json!(args.email));
                if let Some(name) = &args.name {
                    params.insert("name".into(), json!(name));
                }
                params.insert("metadata".into(), Value::Object(args.metadata.clone()));
                api.create_customer(&params).await
            }
            ToolCall::CustomerRetrieve(args) => api.retrieve_customer(&args.customer_id).await,
            ToolCall::CustomerUpdate(args) => {
                api.update_customer(&args.customer_id, &args.update_fields)
                    .await
            }
            ToolCall::PaymentIntentCreate(args) => {
                let mut params = Params::new();
                params.insert("amount".into(), json!(args.amount));
                params.insert("currency".into(), json!(args.currency));
                params.insert(
                    "payment_method_types".into(),
                    json!(args.payment_method_types),
                );
                if let Some(customer) = &args.customer {
                    params.insert("customer".into(), json!(customer));
                }
                params.insert("metadata".into(), Value::Object(args.metadata.clone()));
                api.create_payment_intent(&params).await
            }
            ToolCall::ChargeList(args) => {
                let mut params = Params::new();
                params.insert("limit".into(), json!(args.limit));
                if let Some(customer) = &args.customer_id {
                    params.insert("customer".into(), json!(customer));
                }
                api.list_charges(&params).await
            }
            ToolCall::RefundCreate(args) => {
                let mut params = Params::new();
                params.insert("charge".into(), json!(args.charge_id));
                if let Some(amount) = args.amount {
                    params.insert("amount".into(), json!(amount));
                }
                params.insert("reason".into(), json!(args.reason.as_str()));
                api.create_refund(&params).await
            }
        }
    }
}

/// Validates, runs against Stripe and records mutating calls in the audit log.
pub async fn call(
    api: &dyn StripeApi,
    audit: &AuditLog,
    name: &str,
    arguments: Value,
) -> Result<Value, ToolError> {
    let call = ToolCall::parse(name, arguments.clone())?;
    let result = call.execute(api).await.map_err(|e| {
        tracing::error!("Stripe API error: {}", e);
        ToolError::Stripe(e)
    })?;
    if call.is_mutating() {
        let parameters = if arguments.is_null() {
            Value::Object(Map::new())
        } else {
            arguments
        };
        audit.record(call.name(), parameters).await;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stripe::mock::MockStripe;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_catalog() {
        let names: Vec<_> = catalog().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "customer_create",
                "customer_retrieve",
                "customer_update",
                "payment_intent_create",
                "charge_list",
                "refund_create",
            ]
        );
        let serialized = serde_json::to_value(&catalog()[0]).unwrap();
        assert_eq!(serialized["inputSchema"]["required"], json!(["email"]));
    }

    #[tokio::test]
    async fn test_customer_create_is_audited() {
        let api = MockStripe::default();
        let audit = AuditLog::default();
        let args = json!({"email": "a@example.com", "name": "Ada", "metadata": {"tier": "gold"}});

        let result = call(&api, &audit, "customer_create", args.clone())
            .await
            .unwrap();
        assert_eq!(result["object"], "customers");

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(
            calls[0].params,
            vec![
                pair("email", "a@example.com"),
                pair("name", "Ada"),
                pair("metadata[tier]", "gold"),
            ]
        );

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, "customer_create");
        assert_eq!(entries[0].parameters, args);
    }

    #[tokio::test]
    async fn test_reads_are_not_audited() {
        let api = MockStripe::default();
        let audit = AuditLog::default();
        call(&api, &audit, "customer_retrieve", json!({"customer_id": "cus_1"}))
            .await
            .unwrap();
        call(&api, &audit, "charge_list", Value::Null).await.unwrap();

        assert!(audit.is_empty());
        let calls = api.calls();
        assert_eq!(calls[0].path, "customers/cus_1");
        assert_eq!(calls[1].path, "charges");
        assert_eq!(calls[1].params, vec![pair("limit", "10")]);
    }

    #[tokio::test]
    async fn test_customer_update_sends_fields() {
        let api = MockStripe::default();
        let audit = AuditLog::default();
        call(
            &api,
            &audit,
            "customer_update",
            json!({"customer_id": "cus_1", "update_fields": {"name": "New", "metadata": {"old": null}}}),
        )
        .await
        .unwrap();
        let calls = api.calls();
        assert_eq!(calls[0].path, "customers/cus_1");
        assert_eq!(
            calls[0].params,
            vec![pair("name", "New"), pair("metadata[old]", "")]
        );
        assert_eq!(audit.entries()[0].operation, "customer_update");
    }

    #[tokio::test]
    async fn test_payment_intent_defaults() {
        let api = MockStripe::default();
        let audit = AuditLog::default();
        call(
            &api,
            &audit,
            "payment_intent_create",
            json!({"amount": 2500, "currency": "eur", "customer": "cus_7"}),
        )
        .await
        .unwrap();
        assert_eq!(
            api.calls()[0].params,
            vec![
                pair("amount", "2500"),
                pair("currency", "eur"),
                pair("payment_method_types[0]", "card"),
                pair("customer", "cus_7"),
            ]
        );
    }

    #[tokio::test]
    async fn test_refund_defaults_reason() {
        let api = MockStripe::default();
        let audit = AuditLog::default();
        call(&api, &audit, "refund_create", json!({"charge_id": "ch_1"}))
            .await
            .unwrap();
        assert_eq!(
            api.calls()[0].params,
            vec![pair("charge", "ch_1"), pair("reason", "requested_by_customer")]
        );
    }

    #[test]
    fn test_invalid_arguments() {
        let err = ToolCall::parse("customer_create", json!({"name": "x"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments for customer_create: missing field `email`"
        );

        let err = ToolCall::parse("refund_create", json!({"charge_id": "ch_1", "reason": "bored"}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { tool: "refund_create", .. }));

        let err = ToolCall::parse("charge_list", json!({"limit": 101})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments for charge_list: limit must be between 1 and 100"
        );

        let err = ToolCall::parse("charge_list", json!({"limit": 0})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments for charge_list: limit must be between 1 and 100"
        );

        let err = ToolCall::parse("payment_intent_create", json!({"amount": 0, "currency": "usd"}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let err = ToolCall::parse("customer_retrieve", json!(["cus_1"])).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn test_unknown_tool() {
        let err = ToolCall::parse("subscription_create", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: subscription_create");
    }

    #[tokio::test]
    async fn test_stripe_failure_is_not_audited() {
        let api = MockStripe::failing(402, "Your card was declined.");
        let audit = AuditLog::default();
        let err = call(&api, &audit, "refund_create", json!({"charge_id": "ch_1"}))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Payment processing failed: Your card was declined."
        );
        assert!(audit.is_empty());
    }
}
