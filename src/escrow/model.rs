//! Escrow models and request DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};

/// Supported escrow modes
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum EscrowType {
    Nop,
    Mad,
    Multisig,
}

impl EscrowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowType::Nop => "NOP",
            EscrowType::Mad => "MAD",
            EscrowType::Multisig => "MULTISIG",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown escrow type: {0}")]
pub struct UnknownEscrowType(pub String);

impl std::str::FromStr for EscrowType {
    type Err = UnknownEscrowType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOP" => Ok(EscrowType::Nop),
            "MAD" => Ok(EscrowType::Mad),
            "MULTISIG" => Ok(EscrowType::Multisig),
            other => Err(UnknownEscrowType(other.to_string())),
        }
    }
}

// The `type` column is plain TEXT.
impl TryFrom<String> for EscrowType {
    type Error = UnknownEscrowType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Escrow row, optionally carrying its ratio
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Escrow {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub escrow_type: EscrowType,
    pub payment_information_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only set when loaded with related rows
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<EscrowRatio>,
}

/// Buyer/seller split attached 1:1 to an escrow
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct EscrowRatio {
    pub id: i64,
    pub buyer: i32,
    pub seller: i32,
    pub escrow_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EscrowRatio {
    pub fn total(&self) -> i64 {
        i64::from(self.buyer) + i64::from(self.seller)
    }
}

/// Ratio part of create/update requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq, Eq)]
#[validate(schema(function = "validate_ratio_weights"))]
pub struct EscrowRatioRequest {
    #[validate(range(min = 0))]
    pub buyer: i32,
    #[validate(range(min = 0))]
    pub seller: i32,
}

fn validate_ratio_weights(ratio: &EscrowRatioRequest) -> Result<(), ValidationError> {
    if i64::from(ratio.buyer) + i64::from(ratio.seller) == 0 {
        return Err(ValidationError::new("ratio_weights_all_zero"));
    }
    Ok(())
}

/// Request DTO for creating an escrow on a payment information
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EscrowCreateRequest {
    #[validate(range(min = 1))]
    pub payment_information_id: i64,
    #[serde(rename = "type")]
    pub escrow_type: EscrowType,
    #[validate]
    pub ratio: EscrowRatioRequest,
}

/// Request DTO for updating an escrow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EscrowUpdateRequest {
    #[serde(rename = "type")]
    pub escrow_type: EscrowType,
    #[validate]
    pub ratio: EscrowRatioRequest,
}

/// Create/update request addressed by listing item template
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EscrowTemplateRequest {
    #[validate(range(min = 1))]
    pub listing_item_template_id: i64,
    #[serde(rename = "type")]
    pub escrow_type: EscrowType,
    #[validate]
    pub ratio: EscrowRatioRequest,
}

impl EscrowTemplateRequest {
    pub fn into_create_request(self, payment_information_id: i64) -> EscrowCreateRequest {
        EscrowCreateRequest {
            payment_information_id,
            escrow_type: self.escrow_type,
            ratio: self.ratio,
        }
    }

    pub fn into_update_request(self) -> EscrowUpdateRequest {
        EscrowUpdateRequest {
            escrow_type: self.escrow_type,
            ratio: self.ratio,
        }
    }
}

/// Request DTO for locking funds in an escrow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EscrowLockRequest {
    pub escrow_id: i64,
    pub address_id: i64,
    #[validate(length(min = 1))]
    pub item_hash: String,
    #[validate(length(min = 1))]
    pub nonce: String,
    #[validate(length(max = 1024))]
    pub memo: Option<String>,
}

/// Request DTO for refunding an escrow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRefundRequest {
    pub escrow_id: i64,
    #[validate(length(min = 1))]
    pub item_hash: String,
    pub accepted: bool,
    #[validate(length(max = 1024))]
    pub memo: Option<String>,
}

/// Request DTO for releasing an escrow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EscrowReleaseRequest {
    pub escrow_id: i64,
    #[validate(length(min = 1))]
    pub item_hash: String,
    #[validate(length(max = 1024))]
    pub memo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escrow_type_wire_names() {
        assert_eq!(serde_json::to_string(&EscrowType::Mad).unwrap(), "\"MAD\"");
        assert_eq!(
            serde_json::from_str::<EscrowType>("\"MULTISIG\"").unwrap(),
            EscrowType::Multisig
        );
        assert_eq!("NOP".parse::<EscrowType>().unwrap(), EscrowType::Nop);
        assert!("mad".parse::<EscrowType>().is_err());
        assert!(EscrowType::try_from("FOO".to_string()).is_err());
    }

    #[test]
    fn test_template_request_from_camel_case_body() {
        let body = json!({
            "listingItemTemplateId": 7,
            "type": "MAD",
            "ratio": { "buyer": 50, "seller": 50 }
        });

        let request: EscrowTemplateRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.listing_item_template_id, 7);
        assert!(request.validate().is_ok());

        let create = request.into_create_request(3);
        assert_eq!(create.payment_information_id, 3);
        assert_eq!(create.escrow_type, EscrowType::Mad);
        assert_eq!(create.ratio, EscrowRatioRequest { buyer: 50, seller: 50 });
    }

    #[test]
    fn test_create_request_validation() {
        let mut request = EscrowCreateRequest {
            payment_information_id: 1,
            escrow_type: EscrowType::Mad,
            ratio: EscrowRatioRequest { buyer: 100, seller: 0 },
        };
        assert!(request.validate().is_ok());

        request.ratio.buyer = -1;
        assert!(request.validate().is_err());

        request.ratio = EscrowRatioRequest { buyer: 0, seller: 0 };
        assert!(request.validate().is_err());

        request.ratio = EscrowRatioRequest { buyer: 1, seller: 1 };
        request.payment_information_id = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_lock_request_validation() {
        let mut request: EscrowLockRequest = serde_json::from_value(json!({
            "escrowId": 1,
            "addressId": 2,
            "itemHash": "f00d",
            "nonce": "abc",
            "memo": null
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        request.nonce = String::new();
        assert!(request.validate().is_err());

        request.nonce = "abc".to_string();
        request.memo = Some("x".repeat(2000));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_ratio_total() {
        let now = Utc::now();
        let ratio = EscrowRatio {
            id: 1,
            buyer: 60,
            seller: 40,
            escrow_id: 9,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(ratio.total(), 100);
    }

    #[test]
    fn test_escrow_serializes_type_and_optional_ratio() {
        let now = Utc::now();
        let escrow = Escrow {
            id: 1,
            escrow_type: EscrowType::Nop,
            payment_information_id: 4,
            created_at: now,
            updated_at: now,
            ratio: None,
        };

        let value = serde_json::to_value(&escrow).unwrap();
        assert_eq!(value["type"], "NOP");
        assert!(value.get("ratio").is_none());
    }
}
