//! Built-in [`AgentRuntime`] backed by the reply pipeline.

use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

use {anyhow::Result, async_trait::async_trait, tracing::debug};

use {
    voxlink_channels::{AgentRuntime, ReplyDelivery},
    voxlink_common::types::{MsgContext, Peer, ResolvedRoute},
};

/// Agent runtime that routes via the binding cascade and answers through the
/// reply pipeline.
///
/// Tracks which sessions have a turn in flight so channels can keep
/// typing/presence indicators honest; `mark_idle` clears that state.
#[derive(Default)]
pub struct PipelineRuntime {
    /// Session keys with a turn currently in flight (std::sync::RwLock:
    /// all operations are synchronous set lookups, never held across
    /// `.await` points).
    active: RwLock<HashSet<String>>,
}

impl PipelineRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a turn is currently in flight for `session_key`.
    pub fn is_busy(&self, session_key: &str) -> bool {
        self.active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(session_key)
    }
}

#[async_trait]
impl AgentRuntime for PipelineRuntime {
    fn resolve_route(
        &self,
        channel: &str,
        account_id: Option<&str>,
        peer: &Peer,
    ) -> Result<ResolvedRoute> {
        Ok(voxlink_routing::resolve_agent_route(
            channel, account_id, peer,
        )?)
    }

    async fn dispatch_turn(&self, ctx: MsgContext, delivery: Arc<dyn ReplyDelivery>) -> Result<()> {
        {
            let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
            active.insert(ctx.session_key.clone());
        }

        let reply = crate::reply::get_reply(&ctx).await?;
        delivery.deliver(&reply).await?;
        Ok(())
    }

    async fn mark_idle(&self, session_key: &str) {
        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        if active.remove(session_key) {
            debug!(session_key, "session marked idle");
        }
    }
}
