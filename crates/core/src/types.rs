//! Core type definitions

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::errors::ShapeError;

/// Protocol listing is truncated to this many records
pub const PROTOCOLS_LIMIT: usize = 20;

/// Historical chain TVL is truncated to this many points
pub const CHAIN_HISTORY_LIMIT: usize = 30;

/// Field projected out of a protocol detail payload
pub const CHAIN_TVLS_FIELD: &str = "currentChainTvls";

/// Result of one accessor call.
///
/// `Ok(None)` is the absent marker: the upstream could not be read.
/// `Err` means the upstream answered with a payload of the wrong shape.
pub type AccessorResult = Result<Option<Value>, ShapeError>;

/// Outcome of a single upstream read
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Value(Value),
    Absent,
}

impl Fetched {
    pub fn into_option(self) -> Option<Value> {
        match self {
            Fetched::Value(v) => Some(v),
            Fetched::Absent => None,
        }
    }
}

/// The four named upstream operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessor {
    Protocols,
    ProtocolTvl,
    ChainTvl,
    TokenPrices,
}

impl Accessor {
    pub const ALL: [Accessor; 4] = [
        Accessor::Protocols,
        Accessor::ProtocolTvl,
        Accessor::ChainTvl,
        Accessor::TokenPrices,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Accessor::Protocols => "protocols",
            Accessor::ProtocolTvl => "protocol_tvl",
            Accessor::ChainTvl => "chain_tvl",
            Accessor::TokenPrices => "token_prices",
        }
    }

    /// Name under which the accessor is published as a tool
    pub fn tool_name(&self) -> &'static str {
        match self {
            Accessor::Protocols => "get_protocols",
            Accessor::ProtocolTvl => "get_protocol_tvl",
            Accessor::ChainTvl => "get_chain_tvl",
            Accessor::TokenPrices => "get_token_prices",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tool_name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Accessor::Protocols => "Get all protocols from defillama.",
            Accessor::ProtocolTvl => "Get a defi protocol tvl from defillama",
            Accessor::ChainTvl => "Get a chain's tvl",
            Accessor::TokenPrices => "Get a token's price",
        }
    }

    /// Path parameter the accessor takes, if any
    pub fn parameter(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Accessor::Protocols => None,
            Accessor::ProtocolTvl => Some(("protocol", "protocol name")),
            Accessor::ChainTvl => Some(("chain", "chain name")),
            Accessor::TokenPrices => Some(("token", "token name")),
        }
    }

    /// JSON schema describing the accessor's arguments
    pub fn input_schema(&self) -> Value {
        match self.parameter() {
            Some((name, description)) => json!({
                "type": "object",
                "properties": {
                    name: { "type": "string", "description": description }
                },
                "required": [name],
            }),
            None => json!({ "type": "object", "properties": {} }),
        }
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Short name of a JSON value's type, used in shape errors
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name_lookup() {
        for accessor in Accessor::ALL {
            assert_eq!(Accessor::from_tool_name(accessor.tool_name()), Some(accessor));
        }
        assert_eq!(Accessor::from_tool_name("get_yields"), None);
    }

    #[test]
    fn test_input_schema_requires_parameter() {
        let schema = Accessor::ChainTvl.input_schema();
        assert_eq!(schema["required"], json!(["chain"]));
        assert_eq!(schema["properties"]["chain"]["type"], "string");

        let schema = Accessor::Protocols.input_schema();
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_fetched_into_option() {
        assert_eq!(Fetched::Absent.into_option(), None);
        assert_eq!(
            Fetched::Value(json!([1])).into_option(),
            Some(json!([1]))
        );
    }
}
