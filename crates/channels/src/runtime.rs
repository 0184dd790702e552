//! The boundary between channels and the conversational-agent runtime.
//!
//! Channels never call into a concrete runtime; they are handed an
//! `Arc<dyn AgentRuntime>` at construction. The runtime in turn never talks
//! to a channel's wire protocol directly: every reply fragment it produces
//! goes through the [`ReplyDelivery`] capability the channel passed in for
//! that turn.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait};

use voxlink_common::types::{MsgContext, Peer, ReplyPayload, ResolvedRoute};

/// Single-method capability for delivering one reply fragment back to the
/// originating channel.
///
/// Implementations must tolerate being called zero or more times per turn.
/// Empty-text fragments are the implementation's business to skip.
#[async_trait]
pub trait ReplyDelivery: Send + Sync {
    async fn deliver(&self, fragment: &ReplyPayload) -> Result<()>;
}

/// Entry points a channel needs from the agent runtime.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Resolve which agent/session handles a message from `peer` on
    /// `channel`. Must be deterministic for a given peer and account, and
    /// cheap enough to call on every inbound message.
    fn resolve_route(
        &self,
        channel: &str,
        account_id: Option<&str>,
        peer: &Peer,
    ) -> Result<ResolvedRoute>;

    /// Run one conversational turn. Resolves once the turn, including every
    /// reply delivery it triggered, has completed or failed.
    async fn dispatch_turn(&self, ctx: MsgContext, delivery: Arc<dyn ReplyDelivery>) -> Result<()>;

    /// Release any per-turn typing/presence state held for `session_key`.
    /// Called exactly once by the channel after a completed turn.
    async fn mark_idle(&self, session_key: &str);
}
