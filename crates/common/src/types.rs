//! Message context and reply payload types shared between channels and the
//! agent runtime.

use serde::{Deserialize, Serialize};

/// What kind of chat a message belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// One-to-one conversation with a single peer (DM, paired device, ...).
    #[default]
    Direct,
    Group,
    Channel,
}

impl ChatType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
            Self::Channel => "channel",
        }
    }
}

/// The remote party a message originates from, as seen by routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub kind: ChatType,
    /// Channel-scoped peer identifier (user ID, device ID, ...).
    pub id: String,
}

impl Peer {
    #[must_use]
    pub fn direct(id: impl Into<String>) -> Self {
        Self {
            kind: ChatType::Direct,
            id: id.into(),
        }
    }
}

/// Where an inbound message was routed: which agent handles it and under
/// which session key the conversation state lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub agent_id: String,
    pub account_id: String,
    pub session_key: String,
}

/// Normalized inbound message context handed to the agent runtime.
///
/// Channels build one of these per inbound message; everything downstream
/// (routing, session lookup, the reply pipeline) works off this struct and
/// never sees channel-native message types.
#[derive(Debug, Clone)]
pub struct MsgContext {
    /// Originating channel id (e.g. "xiaozhi", "telegram").
    pub channel: String,
    pub account_id: String,
    pub session_key: String,
    /// Channel-scoped sender identifier.
    pub from: String,
    pub chat_type: ChatType,
    /// Raw message text as received.
    pub body: String,
    /// Text presented to the agent (channels may strip mentions etc.).
    pub body_for_agent: String,
    pub sender_name: Option<String>,
    /// Channel-native id of the message being replied to, if any.
    pub reply_to_id: Option<String>,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// Whether this message may invoke commands without a further
    /// permission check by the runtime.
    pub command_authorized: bool,
}

/// One unit of agent-produced reply text destined for a channel.
#[derive(Debug, Clone, Default)]
pub struct ReplyPayload {
    pub text: String,
    /// Channel-native message id to attach the reply to, if supported.
    pub reply_to_id: Option<String>,
    /// Suppress notification sounds where the channel supports it.
    pub silent: bool,
}
