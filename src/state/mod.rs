//! Application state shared by embedders of the escrow service

mod app_state;

pub use app_state::AppState;
