//! Channel plugin system.
//!
//! Each channel (Xiaozhi, Telegram, ...) implements the ChannelPlugin trait
//! with adapters for inbound/outbound messaging, status, and account
//! lifecycle. The agent runtime behind the channels is abstracted by the
//! [`runtime::AgentRuntime`] trait and injected into plugins at construction
//! time, never resolved from ambient state.

pub mod error;
pub mod plugin;
pub mod registry;
pub mod runtime;

pub use {
    error::{Error, Result},
    plugin::{ChannelHealthSnapshot, ChannelOutbound, ChannelPlugin, ChannelStatus},
    runtime::{AgentRuntime, ReplyDelivery},
};
