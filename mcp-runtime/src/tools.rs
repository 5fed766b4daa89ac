use serde_json::{Map, Value, json};

use crate::client::{ClientError, LoanProClient};
use crate::format;

pub const DEFAULT_SEARCH_LIMIT: u64 = 10;

#[derive(Debug)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug)]
pub enum ToolError {
    /// Arguments did not pass validation; nothing was sent upstream.
    InvalidArguments {
        message: String,
        field: Option<String>,
    },
    UnknownTool(String),
    Execution(ClientError),
}

impl ToolError {
    fn validation(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
            field: None,
        }
    }

    fn with_field(self, key: &str) -> Self {
        match self {
            Self::InvalidArguments { message, .. } => Self::InvalidArguments {
                message,
                field: Some(key.to_string()),
            },
            other => other,
        }
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArguments { message, .. } => f.write_str(message),
            Self::UnknownTool(name) => write!(f, "Unknown tool: {name}"),
            Self::Execution(err) => write!(f, "{err}"),
        }
    }
}

impl From<ClientError> for ToolError {
    fn from(err: ClientError) -> Self {
        Self::Execution(err)
    }
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_loan",
            description: "Get comprehensive loan information by ID including balances, payoff amount, and customer details",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "loan_id": {
                        "type": "string",
                        "description": "The loan ID to retrieve"
                    }
                },
                "required": ["loan_id"]
            }),
        },
        ToolDefinition {
            name: "search_loans",
            description: "Search loans with filters and search terms",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "search_term": {
                        "type": "string",
                        "description": "Search term to match against customer name, display ID, or title"
                    },
                    "status": {
                        "type": "string",
                        "description": "Loan status filter"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of results",
                        "default": DEFAULT_SEARCH_LIMIT
                    }
                }
            }),
        },
        ToolDefinition {
            name: "get_customer",
            description: "Get customer information by ID",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": {
                        "type": "string",
                        "description": "The customer ID to retrieve"
                    }
                },
                "required": ["customer_id"]
            }),
        },
        ToolDefinition {
            name: "search_customers",
            description: "Search customers with a search term",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "search_term": {
                        "type": "string",
                        "description": "Search term to match against customer names, email, or SSN"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of results",
                        "default": DEFAULT_SEARCH_LIMIT
                    }
                }
            }),
        },
        ToolDefinition {
            name: "get_loan_payments",
            description: "Get payment history for a loan",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "loan_id": {
                        "type": "string",
                        "description": "The loan ID to get payment history for"
                    }
                },
                "required": ["loan_id"]
            }),
        },
        ToolDefinition {
            name: "get_loan_transactions",
            description: "Get detailed transaction history for a loan including payments, charges, credits, and adjustments with payment application breakdown",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "loan_id": {
                        "type": "string",
                        "description": "The loan ID to get transaction history for"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of transactions to return (omit for all)"
                    },
                    "offset": {
                        "type": "number",
                        "description": "Number of transactions to skip before the returned page"
                    }
                },
                "required": ["loan_id"]
            }),
        },
    ]
}

/// Runs one tool against the remote API and renders its text block.
pub async fn call_tool(
    client: &LoanProClient,
    name: &str,
    args: &Map<String, Value>,
) -> Result<String, ToolError> {
    match name {
        "get_loan" => {
            let loan_id = required_id(args, "loan_id")?;
            let loan = client.get_loan(&loan_id).await?;
            Ok(format::loan_details(&loan))
        }
        "search_loans" => {
            let search_term = arg_optional_string(args, "search_term")?;
            let status = arg_optional_string(args, "status")?;
            let limit = search_limit(args)?;
            let results = client
                .search_loans(search_term.as_deref(), status.as_deref(), limit)
                .await?;
            Ok(format::loan_list(&results))
        }
        "get_customer" => {
            let customer_id = required_id(args, "customer_id")?;
            let customer = client.get_customer(&customer_id).await?;
            Ok(format::customer_details(&customer))
        }
        "search_customers" => {
            let search_term = arg_optional_string(args, "search_term")?;
            let limit = search_limit(args)?;
            let results = client
                .search_customers(search_term.as_deref(), limit)
                .await?;
            Ok(format::customer_list(&results))
        }
        "get_loan_payments" => {
            let loan_id = required_id(args, "loan_id")?;
            let payments = client.get_loan_payments(&loan_id).await?;
            Ok(format::payment_history(&loan_id, &payments))
        }
        "get_loan_transactions" => {
            let loan_id = required_id(args, "loan_id")?;
            let limit = arg_optional_u64(args, "limit")?.unwrap_or(0);
            let offset = arg_optional_u64(args, "offset")?.unwrap_or(0);
            let page = client.get_loan_transactions(&loan_id, limit, offset).await?;
            Ok(format::transaction_history(&loan_id, &page, limit, offset))
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

fn search_limit(args: &Map<String, Value>) -> Result<u64, ToolError> {
    match arg_optional_u64(args, "limit")? {
        None => Ok(DEFAULT_SEARCH_LIMIT),
        Some(0) => Err(ToolError::validation("'limit' must be at least 1").with_field("limit")),
        Some(limit) => Ok(limit),
    }
}

/// Entity ids end up inside an OData key segment, so only digits pass.
fn required_id(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let value = args.get(key).ok_or_else(|| {
        ToolError::validation(format!("Missing required field '{key}'")).with_field(key)
    })?;
    let id = match value {
        Value::String(v) => v.trim().to_string(),
        Value::Number(n) if n.is_u64() => n.to_string(),
        _ => {
            return Err(
                ToolError::validation(format!("'{key}' must be a string")).with_field(key)
            );
        }
    };
    if id.is_empty() {
        return Err(ToolError::validation(format!("'{key}' must not be empty")).with_field(key));
    }
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(
            ToolError::validation(format!("'{key}' must be a numeric ID, got '{id}'"))
                .with_field(key),
        );
    }
    Ok(id)
}

fn arg_optional_string(args: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.trim().to_string())),
        Some(_) => Err(ToolError::validation(format!("'{key}' must be a string")).with_field(key)),
    }
}

/// Accepts whole numbers sent as floats (`10.0`), which JSON-schema `number`
/// clients commonly produce.
fn arg_optional_u64(args: &Map<String, Value>, key: &str) -> Result<Option<u64>, ToolError> {
    let invalid = || {
        ToolError::validation(format!("'{key}' must be a non-negative integer")).with_field(key)
    };
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f as u64)
            })
            .map(Some)
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}
