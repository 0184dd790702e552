use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tokio_util::sync::CancellationToken;

use crate::config::XiaozhiAccountConfig;

/// Shared account state map.
pub type AccountStateMap = Arc<RwLock<HashMap<String, AccountState>>>;

/// Per-account runtime state.
pub struct AccountState {
    pub account_id: String,
    pub config: XiaozhiAccountConfig,
    /// HTTP client shared by the poll loop and reply delivery. Its request
    /// timeout sits 5 s above the long-poll window so a server legitimately
    /// holding the connection open is not aborted early.
    pub client: reqwest::Client,
    pub cancel: CancellationToken,
}
