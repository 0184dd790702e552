//! Xiaozhi ESP32 voice-assistant channel plugin for voxlink.
//!
//! Implements `ChannelPlugin` by long-polling a xiaozhi device server for
//! transcribed utterances and POSTing agent replies back for playback on
//! the device.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod outbound;
pub mod plugin;
pub mod poll;
pub mod state;

#[cfg(test)]
mod testing;

pub use {
    config::XiaozhiAccountConfig,
    error::{Error, Result},
    plugin::XiaozhiPlugin,
};

/// Channel identifier used for routing and provenance tagging.
pub const CHANNEL_ID: &str = "xiaozhi";
