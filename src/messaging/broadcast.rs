//! Hand-off of action messages to the network layer

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::message::EscrowActionMessage;
use crate::error::{EscrowError, EscrowResult};

#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, message: &EscrowActionMessage) -> EscrowResult<()>;
}

/// Publishes messages on an in-process channel the network layer subscribes to
#[derive(Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<EscrowActionMessage>,
}

impl ChannelBroadcaster {
    /// `capacity` must be non-zero
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EscrowActionMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn broadcast(&self, message: &EscrowActionMessage) -> EscrowResult<()> {
        let payload_len = message.to_json()?.len();

        match self.tx.send(message.clone()) {
            Ok(receivers) => {
                tracing::debug!(
                    message_id = %message.id,
                    action = ?message.action(),
                    payload_len,
                    receivers,
                    "Escrow action message broadcast"
                );
                Ok(())
            }
            Err(_) => {
                tracing::error!(
                    message_id = %message.id,
                    "Failed to broadcast escrow action message: no network subscribers"
                );
                Err(EscrowError::Broadcast(
                    "no network subscribers for escrow action messages".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::EscrowType;
    use crate::messaging::{EscrowMessageType, EscrowMpAction, EscrowReference};

    fn message() -> EscrowActionMessage {
        EscrowActionMessage::new(
            "0.1.0.0",
            EscrowMpAction {
                action: EscrowMessageType::MpaRefund,
                item: "hash".to_string(),
                nonce: None,
                accepted: Some(true),
                memo: None,
                info: None,
                escrow: EscrowReference {
                    id: 1,
                    escrow_type: EscrowType::Nop,
                },
            },
        )
    }

    #[tokio::test]
    async fn test_subscriber_receives_message() {
        let broadcaster = ChannelBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        let sent = message();
        broadcaster.broadcast(&sent).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), sent);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_fails() {
        let broadcaster = ChannelBroadcaster::new(8);

        let err = broadcaster.broadcast(&message()).await.unwrap_err();
        assert_eq!(err.error_code(), "BROADCAST_ERROR");
    }
}
