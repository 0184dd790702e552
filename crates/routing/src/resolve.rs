use tracing::debug;

use {
    crate::{Error, Result},
    voxlink_common::types::{Peer, ResolvedRoute},
};

/// Account id used when a channel did not specify one.
pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// Agent id used until per-peer/per-account bindings exist.
pub const DEFAULT_AGENT_ID: &str = "default";

/// Resolve which agent should handle a message from `peer` on `channel`.
///
/// Deterministic for a given (channel, account, peer) triple and free of
/// I/O, so channels may call it on every inbound message.
pub fn resolve_agent_route(
    channel: &str,
    account_id: Option<&str>,
    peer: &Peer,
) -> Result<ResolvedRoute> {
    if channel.is_empty() {
        return Err(Error::MissingChannel);
    }
    if peer.id.is_empty() {
        return Err(Error::MissingPeer);
    }

    let account = match account_id {
        Some(id) if !id.is_empty() => id,
        _ => DEFAULT_ACCOUNT_ID,
    };
    let session_key = format!("{channel}:{account}:{}:{}", peer.kind.as_str(), peer.id);

    debug!(channel, account, session_key, "resolved agent route");

    Ok(ResolvedRoute {
        agent_id: DEFAULT_AGENT_ID.to_string(),
        account_id: account.to_string(),
        session_key,
    })
}
