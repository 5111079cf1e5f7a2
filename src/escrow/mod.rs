//! Escrow domain module
//!
//! Contains models, persistence, ratio coordination, listing checks and the
//! service that ties them together.

mod guard;
mod lock;
mod model;
mod ratio;
pub mod repository;
mod rpc;
mod service;

pub use guard::{ListingLinkageGuard, TemplateAction};
pub use model::*;
pub use ratio::EscrowRatioCoordinator;
pub use repository::{
    EscrowChanges, EscrowRatioRepository, EscrowRepository, NewEscrow, NewEscrowRatio,
    PgEscrowRatioRepository, PgEscrowRepository,
};
pub use rpc::RpcRequest;
pub use service::EscrowService;
