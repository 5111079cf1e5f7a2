use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::error::EscrowResult;
use crate::escrow::{Escrow, EscrowType};

/// Marketplace protocol action carried by a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowMessageType {
    MpaLock,
    MpaRefund,
    MpaRelease,
}

/// Outbound escrow action envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscrowActionMessage {
    pub id: Uuid,
    pub version: String,
    pub mpaction: EscrowMpAction,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EscrowMpAction {
    pub action: EscrowMessageType,
    /// Hash of the listing item the escrow belongs to
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<EscrowMessageInfo>,
    pub escrow: EscrowReference,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscrowMessageInfo {
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscrowReference {
    pub id: i64,
    #[serde(rename = "type")]
    pub escrow_type: EscrowType,
}

impl From<&Escrow> for EscrowReference {
    fn from(escrow: &Escrow) -> Self {
        Self {
            id: escrow.id,
            escrow_type: escrow.escrow_type,
        }
    }
}

impl EscrowActionMessage {
    pub fn new(version: &str, mpaction: EscrowMpAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: version.to_string(),
            mpaction,
            created_at: Utc::now(),
        }
    }

    pub fn action(&self) -> EscrowMessageType {
        self.mpaction.action
    }

    /// Wire payload handed to the network layer
    pub fn to_json(&self) -> EscrowResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
