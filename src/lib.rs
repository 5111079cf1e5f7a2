//! Marketplace Escrow Library
//!
//! Escrow configuration for listing templates (create, update, destroy with
//! the buyer/seller ratio) and the lock, refund and release action messages
//! handed to the peer network.

pub mod address;
pub mod config;
pub mod db;
pub mod error;
pub mod escrow;
pub mod listing;
pub mod memory;
pub mod messaging;
pub mod state;
pub mod telemetry;

pub use error::{EscrowError, EscrowResult};
pub use escrow::EscrowService;
