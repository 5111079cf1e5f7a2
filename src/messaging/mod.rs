//! Escrow action messages and their hand-off to the peer network
//!
//! Factories build one message per action (lock, refund, release); a
//! [`Broadcaster`] passes it on. Signing and propagation happen downstream.

mod broadcast;
mod factory;
mod message;

pub use broadcast::{Broadcaster, ChannelBroadcaster};
pub use factory::{
    EscrowActionFactories, EscrowActionFactory, EscrowLockFactory, EscrowLockInput,
    EscrowRefundFactory, EscrowRefundInput, EscrowReleaseFactory, EscrowReleaseInput,
};
pub use message::*;
