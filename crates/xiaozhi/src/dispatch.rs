//! Dispatch bridge: drives one inbound device message through the agent
//! runtime and delivers every resulting reply fragment back to the device
//! server.
//!
//! Delivery failures are isolated here: a failed reply POST is logged and
//! never fails the turn. Routing and turn-dispatch failures are not caught;
//! they propagate to the poll loop's per-cycle error handler.

use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::{error, info},
};

use {
    voxlink_channels::{AgentRuntime, ReplyDelivery},
    voxlink_common::types::{ChatType, MsgContext, Peer, ReplyPayload},
};

use crate::{CHANNEL_ID, config::XiaozhiAccountConfig, outbound};

/// Reply-delivery capability handed to the agent runtime for one turn.
///
/// Each non-empty fragment results in exactly one `POST /xiaozhi/reply`
/// attempt; fragments are attempted independently of each other.
pub struct XiaozhiReplyDelivery {
    client: reqwest::Client,
    base_url: String,
    device_id: String,
}

impl XiaozhiReplyDelivery {
    pub(crate) fn new(client: reqwest::Client, base_url: &str, device_id: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            device_id: device_id.to_string(),
        }
    }
}

#[async_trait]
impl ReplyDelivery for XiaozhiReplyDelivery {
    async fn deliver(&self, fragment: &ReplyPayload) -> anyhow::Result<()> {
        let text = fragment.text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let preview: String = text.chars().take(200).collect();
        info!(device_id = %self.device_id, "final reply: {preview}");

        if let Err(e) =
            outbound::post_reply(&self.client, &self.base_url, &self.device_id, text).await
        {
            error!(device_id = %self.device_id, error = %e, "xiaozhi reply delivery failed");
        }
        Ok(())
    }
}

/// Run one conversational turn for an inbound device message.
///
/// Routing and turn dispatch errors propagate to the caller; the runtime is
/// marked idle only after a completed turn.
pub(crate) async fn handle_message(
    runtime: &dyn AgentRuntime,
    client: &reqwest::Client,
    config: &XiaozhiAccountConfig,
    account_id: &str,
    device_id: &str,
    text: &str,
) -> anyhow::Result<()> {
    let peer = Peer::direct(device_id);
    let route = runtime.resolve_route(CHANNEL_ID, Some(account_id), &peer)?;

    let ctx = MsgContext {
        channel: CHANNEL_ID.into(),
        account_id: route.account_id.clone(),
        session_key: route.session_key.clone(),
        from: device_id.to_string(),
        chat_type: ChatType::Direct,
        body: text.to_string(),
        body_for_agent: text.to_string(),
        sender_name: None,
        reply_to_id: None,
        timestamp: now_ms(),
        command_authorized: true,
    };

    info!(
        account_id,
        session_key = %route.session_key,
        "dispatching xiaozhi turn"
    );

    let delivery: Arc<dyn ReplyDelivery> = Arc::new(XiaozhiReplyDelivery::new(
        client.clone(),
        config.base_url(),
        device_id,
    ));

    runtime.dispatch_turn(ctx, delivery).await?;
    runtime.mark_idle(&route.session_key).await;
    Ok(())
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
