//! DefiLlama data accessors
//!
//! Each accessor binds one URL template to the upstream client and applies a
//! fixed post-processing rule. Identifiers are interpolated into the path
//! as-is. An absent upstream result passes through silently; a payload of the
//! wrong shape is reported as a `ShapeError`.

use async_trait::async_trait;
use serde_json::Value;

use llama_core::{
    json_kind, Accessor, AccessorResult, CoreResult, Fetched, ShapeError, UpstreamConfig,
    CHAIN_HISTORY_LIMIT, CHAIN_TVLS_FIELD, PROTOCOLS_LIMIT,
};

use crate::client::UpstreamClient;

/// Source of DefiLlama data consumed by the request surfaces
#[async_trait]
pub trait DataSource: Send + Sync {
    /// First 20 protocol records
    async fn protocols(&self) -> AccessorResult;

    /// `currentChainTvls` of one protocol
    async fn protocol_tvl(&self, protocol: &str) -> AccessorResult;

    /// First 30 historical TVL points of one chain
    async fn chain_tvl(&self, chain: &str) -> AccessorResult;

    /// Current price payload, unmodified
    async fn token_prices(&self, token: &str) -> AccessorResult;

    /// Dispatch by accessor identity. `identifier` is ignored by `Protocols`.
    async fn invoke(&self, accessor: Accessor, identifier: &str) -> AccessorResult {
        match accessor {
            Accessor::Protocols => self.protocols().await,
            Accessor::ProtocolTvl => self.protocol_tvl(identifier).await,
            Accessor::ChainTvl => self.chain_tvl(identifier).await,
            Accessor::TokenPrices => self.token_prices(identifier).await,
        }
    }
}

/// DefiLlama-backed data source
#[derive(Debug, Clone)]
pub struct LlamaFeed {
    client: UpstreamClient,
    defi_base: String,
    coin_base: String,
}

impl LlamaFeed {
    pub fn new(config: &UpstreamConfig) -> CoreResult<Self> {
        Ok(Self {
            client: UpstreamClient::new(config)?,
            defi_base: config.defi_base.trim_end_matches('/').to_string(),
            coin_base: config.coin_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn protocols_url(&self) -> String {
        format!("{}/protocols", self.defi_base)
    }

    pub fn protocol_url(&self, protocol: &str) -> String {
        format!("{}/protocol/{}", self.defi_base, protocol)
    }

    pub fn chain_url(&self, chain: &str) -> String {
        format!("{}/v2/historicalChainTvl/{}", self.defi_base, chain)
    }

    pub fn token_url(&self, token: &str) -> String {
        format!("{}/prices/current/{}", self.coin_base, token)
    }
}

#[async_trait]
impl DataSource for LlamaFeed {
    async fn protocols(&self) -> AccessorResult {
        let fetched = self.client.get_json(&self.protocols_url()).await;
        post_process(fetched, |v| take_first(Accessor::Protocols, v, PROTOCOLS_LIMIT))
    }

    async fn protocol_tvl(&self, protocol: &str) -> AccessorResult {
        let fetched = self.client.get_json(&self.protocol_url(protocol)).await;
        post_process(fetched, |v| {
            project_field(Accessor::ProtocolTvl, v, CHAIN_TVLS_FIELD)
        })
    }

    async fn chain_tvl(&self, chain: &str) -> AccessorResult {
        let fetched = self.client.get_json(&self.chain_url(chain)).await;
        post_process(fetched, |v| take_first(Accessor::ChainTvl, v, CHAIN_HISTORY_LIMIT))
    }

    async fn token_prices(&self, token: &str) -> AccessorResult {
        let fetched = self.client.get_json(&self.token_url(token)).await;
        Ok(fetched.into_option())
    }
}

/// Apply `rule` to a present payload; absent stays absent
fn post_process<F>(fetched: Fetched, rule: F) -> AccessorResult
where
    F: FnOnce(Value) -> Result<Value, ShapeError>,
{
    match fetched {
        Fetched::Value(v) => rule(v).map(Some),
        Fetched::Absent => Ok(None),
    }
}

/// Keep the first `limit` elements of a JSON array
pub fn take_first(accessor: Accessor, payload: Value, limit: usize) -> Result<Value, ShapeError> {
    match payload {
        Value::Array(mut items) => {
            items.truncate(limit);
            Ok(Value::Array(items))
        }
        other => Err(ShapeError::NotSequence {
            accessor,
            found: json_kind(&other),
        }),
    }
}

/// Pull `field` out of a JSON object
pub fn project_field(
    accessor: Accessor,
    payload: Value,
    field: &'static str,
) -> Result<Value, ShapeError> {
    match payload {
        Value::Object(mut map) => map
            .remove(field)
            .ok_or(ShapeError::MissingField { accessor, field }),
        other => Err(ShapeError::NotObject {
            accessor,
            found: json_kind(&other),
        }),
    }
}
