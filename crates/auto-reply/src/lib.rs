//! Inbound message processing pipeline: the glue between channels and agents.
//!
//! Flow: channel message → normalize MsgContext → resolve route → invoke
//! agent → deliver reply fragments via the channel's [`ReplyDelivery`]
//! capability.
//!
//! [`ReplyDelivery`]: voxlink_channels::ReplyDelivery

pub mod reply;
pub mod runtime;

pub use {reply::get_reply, runtime::PipelineRuntime};
