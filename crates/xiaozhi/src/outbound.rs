use {anyhow::Result, async_trait::async_trait, serde::Serialize, tracing::debug};

use voxlink_channels::plugin::ChannelOutbound;

use crate::{error, state::AccountStateMap};

/// Outbound message sender for xiaozhi devices.
pub struct XiaozhiOutbound {
    pub(crate) accounts: AccountStateMap,
}

/// Wire body of `POST /xiaozhi/reply`.
#[derive(Serialize)]
struct ReplyBody<'a> {
    device_id: &'a str,
    text: &'a str,
}

/// POST one reply fragment to the device server.
///
/// Only the HTTP status is interpreted; a non-2xx response surfaces as
/// [`error::Error::ReplyStatus`] carrying the response body for logging.
pub(crate) async fn post_reply(
    client: &reqwest::Client,
    base_url: &str,
    device_id: &str,
    text: &str,
) -> error::Result<()> {
    let url = format!("{base_url}/xiaozhi/reply");
    let resp = client
        .post(&url)
        .json(&ReplyBody { device_id, text })
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(error::Error::ReplyStatus { status, body });
    }

    debug!(device_id, url, "delivered reply to device server");
    Ok(())
}

#[async_trait]
impl ChannelOutbound for XiaozhiOutbound {
    async fn send_text(&self, account_id: &str, to: &str, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let (client, base_url) = {
            let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
            let state = accounts.get(account_id).ok_or_else(|| {
                error::Error::from(voxlink_channels::Error::unknown_account(account_id))
            })?;
            (state.client.clone(), state.config.base_url().to_string())
        };

        post_reply(&client, &base_url, to, text).await?;
        Ok(())
    }
}
