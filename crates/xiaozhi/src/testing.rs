//! In-process stub device server and runtime fakes shared by tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    axum::{
        Json, Router,
        extract::{Query, State},
        http::StatusCode,
        routing::{get, post},
    },
    serde_json::{Value, json},
};

use {
    voxlink_channels::{AgentRuntime, ReplyDelivery},
    voxlink_common::types::{MsgContext, Peer, ResolvedRoute},
};

use crate::config::XiaozhiAccountConfig;

/// Stub xiaozhi device server.
///
/// Serves scripted responses for `GET /xiaozhi/updates` front to back and
/// records every poll (with its query params) and every reply POST body.
/// Once the script is exhausted it behaves like an idle long poll.
#[derive(Default)]
pub(crate) struct StubServer {
    pub script: Mutex<VecDeque<(StatusCode, Value)>>,
    pub polls: Mutex<Vec<(Instant, HashMap<String, String>)>>,
    pub replies: Mutex<Vec<Value>>,
    pub reply_status: Mutex<StatusCode>,
}

async fn updates_handler(
    State(state): State<Arc<StubServer>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.polls.lock().unwrap().push((Instant::now(), params));
    let next = state.script.lock().unwrap().pop_front();
    match next {
        Some((status, body)) => (status, Json(body)),
        None => {
            tokio::time::sleep(Duration::from_millis(50)).await;
            (StatusCode::OK, Json(json!({"ok": true, "result": []})))
        },
    }
}

async fn reply_handler(State(state): State<Arc<StubServer>>, Json(body): Json<Value>) -> StatusCode {
    state.replies.lock().unwrap().push(body);
    *state.reply_status.lock().unwrap()
}

pub(crate) async fn spawn_stub(script: Vec<(StatusCode, Value)>) -> (String, Arc<StubServer>) {
    let state = Arc::new(StubServer {
        script: Mutex::new(script.into()),
        ..Default::default()
    });
    let app = Router::new()
        .route("/xiaozhi/updates", get(updates_handler))
        .route("/xiaozhi/reply", post(reply_handler))
        .with_state(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

pub(crate) fn test_config(server_url: &str) -> XiaozhiAccountConfig {
    XiaozhiAccountConfig {
        server_url: server_url.into(),
        device_id: "esp32_default".into(),
        timeout_secs: 1,
        enabled: true,
    }
}

/// Recording agent runtime that produces no reply fragments.
#[derive(Default)]
pub(crate) struct MockRuntime {
    /// (device_id, body) per dispatched turn, in dispatch order.
    pub dispatched: Mutex<Vec<(String, String)>>,
    pub contexts: Mutex<Vec<MsgContext>>,
    pub idled: Mutex<Vec<String>>,
    pub fail_dispatch: bool,
}

#[async_trait]
impl AgentRuntime for MockRuntime {
    fn resolve_route(
        &self,
        channel: &str,
        account_id: Option<&str>,
        peer: &Peer,
    ) -> anyhow::Result<ResolvedRoute> {
        let account = account_id.unwrap_or("default");
        Ok(ResolvedRoute {
            agent_id: "default".into(),
            account_id: account.into(),
            session_key: format!("{channel}:{account}:{}:{}", peer.kind.as_str(), peer.id),
        })
    }

    async fn dispatch_turn(
        &self,
        ctx: MsgContext,
        _delivery: Arc<dyn ReplyDelivery>,
    ) -> anyhow::Result<()> {
        self.dispatched
            .lock()
            .unwrap()
            .push((ctx.from.clone(), ctx.body.clone()));
        self.contexts.lock().unwrap().push(ctx);
        if self.fail_dispatch {
            anyhow::bail!("dispatch failed by request");
        }
        Ok(())
    }

    async fn mark_idle(&self, session_key: &str) {
        self.idled.lock().unwrap().push(session_key.to_string());
    }
}

/// Poll `check` every 10 ms until it holds, panicking after `deadline`.
pub(crate) async fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) {
    let start = Instant::now();
    while !check() {
        assert!(
            start.elapsed() < deadline,
            "condition not met within {deadline:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
