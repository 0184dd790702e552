//! Route inbound messages to agents and build session keys.
//!
//! Session keys are shaped `{channel}:{account}:{chat_type}:{peer}` so one
//! peer maps to the same conversation across restarts and across channels
//! that share a device identifier.

pub mod error;
pub mod resolve;

pub use {
    error::{Error, Result},
    resolve::resolve_agent_route,
};
