//! Positional-parameter entry points
//!
//! Marketplace RPC commands pass arguments as a JSON array; these adapters
//! turn `params` into typed requests and call the regular operations.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EscrowError, EscrowResult};
use crate::escrow::{
    Escrow, EscrowCreateRequest, EscrowRatioRequest, EscrowService, EscrowUpdateRequest,
};

/// JSON-RPC style request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: Some("2.0".to_string()),
            method: method.into(),
            params,
            id: None,
        }
    }

    fn param<T: DeserializeOwned>(&self, index: usize, name: &str) -> EscrowResult<T> {
        let value = self.params.get(index).ok_or_else(|| {
            EscrowError::InvalidParams(format!(
                "{}: missing param {} ({})",
                self.method, index, name
            ))
        })?;

        serde_json::from_value(value.clone()).map_err(|e| {
            EscrowError::InvalidParams(format!(
                "{}: param {} ({}) is invalid: {}",
                self.method, index, name, e
            ))
        })
    }
}

impl EscrowService {
    /// `[]`
    pub async fn rpc_find_all(&self, _request: &RpcRequest) -> EscrowResult<Vec<Escrow>> {
        self.find_all().await
    }

    /// `[id]`
    pub async fn rpc_find_one(&self, request: &RpcRequest) -> EscrowResult<Escrow> {
        let id: i64 = request.param(0, "id")?;
        self.find_one(id, true).await
    }

    /// `[paymentInformationId, type, buyerRatio, sellerRatio]`
    pub async fn rpc_create(&self, request: &RpcRequest) -> EscrowResult<Escrow> {
        self.create(EscrowCreateRequest {
            payment_information_id: request.param(0, "paymentInformationId")?,
            escrow_type: request.param(1, "type")?,
            ratio: EscrowRatioRequest {
                buyer: request.param(2, "buyerRatio")?,
                seller: request.param(3, "sellerRatio")?,
            },
        })
        .await
    }

    /// `[id, type, buyerRatio, sellerRatio]`
    pub async fn rpc_update(&self, request: &RpcRequest) -> EscrowResult<Escrow> {
        let id: i64 = request.param(0, "id")?;
        self.update(
            id,
            EscrowUpdateRequest {
                escrow_type: request.param(1, "type")?,
                ratio: EscrowRatioRequest {
                    buyer: request.param(2, "buyerRatio")?,
                    seller: request.param(3, "sellerRatio")?,
                },
            },
        )
        .await
    }

    /// `[id]`
    pub async fn rpc_destroy(&self, request: &RpcRequest) -> EscrowResult<()> {
        let id: i64 = request.param(0, "id")?;
        self.destroy(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::EscrowType;
    use serde_json::json;

    #[test]
    fn test_param_decoding() {
        let request = RpcRequest::new("escrow.create", vec![json!(4), json!("MAD"), json!(50)]);

        assert_eq!(request.param::<i64>(0, "paymentInformationId").unwrap(), 4);
        assert_eq!(
            request.param::<EscrowType>(1, "type").unwrap(),
            EscrowType::Mad
        );

        let missing = request.param::<i32>(3, "sellerRatio").unwrap_err();
        assert_eq!(missing.error_code(), "INVALID_PARAMS");
        assert!(missing.to_string().contains("sellerRatio"));

        let wrong_type = request.param::<i64>(1, "id").unwrap_err();
        assert_eq!(wrong_type.error_code(), "INVALID_PARAMS");
    }

    #[test]
    fn test_request_defaults() {
        let request: RpcRequest = serde_json::from_value(json!({ "method": "escrow.list" })).unwrap();
        assert!(request.params.is_empty());
        assert!(request.id.is_none());
    }
}
