//! qcoin Core - Types, wire shapes, and error handling

pub mod error;
pub mod protocol;
pub mod types;

pub use error::{ChainFault, Error, FaultKind, RejectionReason, Result};
pub use protocol::*;
pub use types::*;
