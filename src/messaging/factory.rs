//! Builders for lock, refund and release messages

use super::message::{EscrowActionMessage, EscrowMessageInfo, EscrowMessageType, EscrowMpAction};
use crate::address::Address;
use crate::error::{EscrowError, EscrowResult};
use crate::escrow::Escrow;

/// Builds an action message from an escrow plus action-specific context
pub trait EscrowActionFactory<I>: Send + Sync {
    fn get(&self, input: I) -> EscrowResult<EscrowActionMessage>;
}

pub struct EscrowLockInput {
    pub escrow: Escrow,
    pub address: Address,
    pub listing: String,
    pub nonce: String,
    pub memo: Option<String>,
}

pub struct EscrowRefundInput {
    pub escrow: Escrow,
    pub listing: String,
    pub accepted: bool,
    pub memo: Option<String>,
}

pub struct EscrowReleaseInput {
    pub escrow: Escrow,
    pub listing: String,
    pub memo: Option<String>,
}

fn require_listing(listing: &str) -> EscrowResult<()> {
    if listing.trim().is_empty() {
        return Err(EscrowError::Message(
            "Escrow action message requires a listing item hash".to_string(),
        ));
    }
    Ok(())
}

pub struct EscrowLockFactory {
    version: String,
}

impl EscrowLockFactory {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl EscrowActionFactory<EscrowLockInput> for EscrowLockFactory {
    fn get(&self, input: EscrowLockInput) -> EscrowResult<EscrowActionMessage> {
        require_listing(&input.listing)?;
        if input.nonce.is_empty() {
            return Err(EscrowError::Message(
                "Escrow lock message requires a nonce".to_string(),
            ));
        }

        Ok(EscrowActionMessage::new(
            &self.version,
            EscrowMpAction {
                action: EscrowMessageType::MpaLock,
                item: input.listing,
                nonce: Some(input.nonce),
                accepted: None,
                memo: input.memo,
                info: Some(EscrowMessageInfo {
                    address: input.address,
                }),
                escrow: (&input.escrow).into(),
            },
        ))
    }
}

pub struct EscrowRefundFactory {
    version: String,
}

impl EscrowRefundFactory {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl EscrowActionFactory<EscrowRefundInput> for EscrowRefundFactory {
    fn get(&self, input: EscrowRefundInput) -> EscrowResult<EscrowActionMessage> {
        require_listing(&input.listing)?;

        Ok(EscrowActionMessage::new(
            &self.version,
            EscrowMpAction {
                action: EscrowMessageType::MpaRefund,
                item: input.listing,
                nonce: None,
                accepted: Some(input.accepted),
                memo: input.memo,
                info: None,
                escrow: (&input.escrow).into(),
            },
        ))
    }
}

pub struct EscrowReleaseFactory {
    version: String,
}

impl EscrowReleaseFactory {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl EscrowActionFactory<EscrowReleaseInput> for EscrowReleaseFactory {
    fn get(&self, input: EscrowReleaseInput) -> EscrowResult<EscrowActionMessage> {
        require_listing(&input.listing)?;

        Ok(EscrowActionMessage::new(
            &self.version,
            EscrowMpAction {
                action: EscrowMessageType::MpaRelease,
                item: input.listing,
                nonce: None,
                accepted: None,
                memo: input.memo,
                info: None,
                escrow: (&input.escrow).into(),
            },
        ))
    }
}

/// The three factories, stamped with the same protocol version
pub struct EscrowActionFactories {
    pub lock: EscrowLockFactory,
    pub refund: EscrowRefundFactory,
    pub release: EscrowReleaseFactory,
}

impl EscrowActionFactories {
    pub fn new(version: &str) -> Self {
        Self {
            lock: EscrowLockFactory::new(version),
            refund: EscrowRefundFactory::new(version),
            release: EscrowReleaseFactory::new(version),
        }
    }
}
