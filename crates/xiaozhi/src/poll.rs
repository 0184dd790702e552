//! Long-poll monitor loop against the xiaozhi device server.
//!
//! One monitor task per account. The task owns a process-local cursor
//! (offset of the newest update seen) and drives each polled batch through
//! the dispatch bridge strictly in order before issuing the next poll, so
//! there is at most one conversational turn in flight per monitor.

use std::{sync::Arc, time::Duration};

use {
    serde_json::Value,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use voxlink_channels::AgentRuntime;

use crate::{
    config::XiaozhiAccountConfig,
    dispatch,
    error::{Error, Result},
    state::{AccountState, AccountStateMap},
};

/// Delay before the next attempt after a failed poll cycle.
pub(crate) const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Client-side margin above the server's long-poll window, in seconds, so a
/// server that legitimately holds the connection for the full window is not
/// aborted while a hung connection is still bounded.
pub(crate) const TIMEOUT_MARGIN_SECS: u64 = 5;

/// Everything one monitor task needs.
pub struct MonitorParams {
    pub account_id: String,
    pub config: XiaozhiAccountConfig,
    pub client: reqwest::Client,
    pub runtime: Arc<dyn AgentRuntime>,
    pub cancel: CancellationToken,
}

/// Start polling for a single account.
///
/// Registers the account state and spawns a background task that processes
/// updates until the returned `CancellationToken` is cancelled.
pub fn start_polling(
    account_id: String,
    config: XiaozhiAccountConfig,
    accounts: AccountStateMap,
    runtime: Arc<dyn AgentRuntime>,
) -> anyhow::Result<CancellationToken> {
    // Fresh connection per poll/reply request; nothing is kept idle between
    // cycles.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(
            config.timeout_secs.saturating_add(TIMEOUT_MARGIN_SECS),
        ))
        .pool_max_idle_per_host(0)
        .build()?;

    let cancel = CancellationToken::new();
    {
        let mut map = accounts.write().unwrap_or_else(|e| e.into_inner());
        map.insert(
            account_id.clone(),
            AccountState {
                account_id: account_id.clone(),
                config: config.clone(),
                client: client.clone(),
                cancel: cancel.clone(),
            },
        );
    }

    tokio::spawn(run_monitor(MonitorParams {
        account_id,
        config,
        client,
        runtime,
        cancel: cancel.clone(),
    }));

    Ok(cancel)
}

/// Poll until cancelled.
///
/// The loop never exits because of an error: transient failures, non-2xx
/// poll statuses, and turn-dispatch failures all degrade to a fixed retry
/// cadence. Cancellation is observed before each poll and inside the error
/// path (skipping the delay).
pub async fn run_monitor(params: MonitorParams) {
    let MonitorParams {
        account_id,
        config,
        client,
        runtime,
        cancel,
    } = params;

    info!(
        account_id,
        server_url = %config.server_url,
        device_id = %config.device_id,
        timeout_secs = config.timeout_secs,
        "starting xiaozhi monitor"
    );

    let mut cursor: i64 = 0;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if let Err(e) = poll_cycle(&client, &config, &account_id, runtime.as_ref(), &mut cursor)
            .await
        {
            if cancel.is_cancelled() {
                break;
            }
            warn!(account_id, error = %e, "xiaozhi poll cycle failed");
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(RETRY_DELAY) => {},
            }
        }
    }

    info!(account_id, "xiaozhi monitor stopped");
}

/// One poll/dispatch iteration.
///
/// A malformed-but-parseable body counts as an empty cycle and returns
/// `Ok`; transport errors, unparseable bodies, non-2xx statuses, and
/// dispatch failures return `Err` and incur the retry delay. A dispatch
/// failure stops the cycle at the failed element: updates after it have not
/// touched the cursor yet and are re-fetched on the next poll.
async fn poll_cycle(
    client: &reqwest::Client,
    config: &XiaozhiAccountConfig,
    account_id: &str,
    runtime: &dyn AgentRuntime,
    cursor: &mut i64,
) -> Result<()> {
    let url = format!("{}/xiaozhi/updates", config.base_url());
    let resp = client
        .get(&url)
        .query(&[
            ("device_id", config.device_id.clone()),
            ("offset", cursor.to_string()),
            ("timeout", config.timeout_secs.to_string()),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(Error::PollStatus {
            status: resp.status(),
        });
    }

    let body: Value = resp.json().await?;
    let Some(batch) = parse_batch(&body) else {
        return Ok(());
    };

    for update in batch {
        let Some(msg) = ready_message(update, cursor, &config.device_id) else {
            continue;
        };
        info!(
            account_id,
            update_id = msg.id,
            device_id = %msg.device_id,
            "received message: {}",
            msg.text
        );
        dispatch::handle_message(runtime, client, config, account_id, &msg.device_id, &msg.text)
            .await
            .map_err(|e| Error::external("turn dispatch failed", e))?;
    }

    Ok(())
}

/// An update that passed cursor bookkeeping and the empty-text filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InboundMessage {
    pub id: Option<i64>,
    pub device_id: String,
    pub text: String,
}

/// Extract the update array from a poll response body.
///
/// Anything that is not `{ ok: true, result: [...] }` counts as "no
/// messages this cycle".
pub(crate) fn parse_batch(body: &Value) -> Option<&Vec<Value>> {
    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    body.get("result").and_then(Value::as_array)
}

/// Apply cursor bookkeeping to one update and decide whether it should be
/// dispatched.
///
/// Cursor bookkeeping happens per element, before that element's empty-text
/// filter: a blank update with a newer id still moves the cursor. The cursor
/// only ever advances; an out-of-order smaller id neither regresses it nor
/// drops the update. The caller finishes dispatching each returned message
/// before examining the next update, so a failed turn leaves the cursor at
/// the failed element and the rest of the batch is re-fetched.
pub(crate) fn ready_message(
    update: &Value,
    cursor: &mut i64,
    fallback_device: &str,
) -> Option<InboundMessage> {
    let id = update.get("id").and_then(Value::as_i64);
    if let Some(id) = id
        && id > *cursor
    {
        *cursor = id;
    }

    let text = update
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return None;
    }

    let device_id = update
        .get("device_id")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .unwrap_or(fallback_device);

    Some(InboundMessage {
        id,
        device_id: device_id.to_string(),
        text: text.to_string(),
    })
}
