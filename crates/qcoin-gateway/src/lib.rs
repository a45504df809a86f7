//! qcoin Gateway - HTTP surface over the mining ledger

pub mod handlers;
pub mod server;

pub use server::{router, start_gateway, AppState, ServerConfig};
