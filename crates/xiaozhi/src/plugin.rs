use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {
    anyhow::Result,
    async_trait::async_trait,
    tracing::{info, warn},
};

use voxlink_channels::{
    AgentRuntime,
    plugin::{ChannelHealthSnapshot, ChannelOutbound, ChannelPlugin, ChannelStatus},
};

use crate::{
    config::XiaozhiAccountConfig, outbound::XiaozhiOutbound, poll, state::AccountStateMap,
};

/// Xiaozhi channel plugin.
///
/// The agent runtime is injected here and shared by every account's monitor
/// task; it is never looked up from ambient state.
pub struct XiaozhiPlugin {
    accounts: AccountStateMap,
    outbound: XiaozhiOutbound,
    runtime: Arc<dyn AgentRuntime>,
}

impl XiaozhiPlugin {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        let accounts: AccountStateMap = Arc::new(RwLock::new(HashMap::new()));
        let outbound = XiaozhiOutbound {
            accounts: Arc::clone(&accounts),
        };
        Self {
            accounts,
            outbound,
            runtime,
        }
    }

    /// List all active account IDs.
    pub fn account_ids(&self) -> Vec<String> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        accounts.keys().cloned().collect()
    }
}

#[async_trait]
impl ChannelPlugin for XiaozhiPlugin {
    fn id(&self) -> &str {
        crate::CHANNEL_ID
    }

    fn name(&self) -> &str {
        "Xiaozhi"
    }

    async fn start_account(&mut self, account_id: &str, config: serde_json::Value) -> Result<()> {
        let cfg: XiaozhiAccountConfig =
            serde_json::from_value(config).map_err(voxlink_channels::Error::from)?;

        if cfg.server_url.is_empty() {
            return Err(
                voxlink_channels::Error::invalid_input("xiaozhi server_url is required").into(),
            );
        }
        if !cfg.enabled {
            info!(account_id, "xiaozhi account disabled, not starting");
            return Ok(());
        }

        info!(account_id, "starting xiaozhi account");
        poll::start_polling(
            account_id.to_string(),
            cfg,
            Arc::clone(&self.accounts),
            Arc::clone(&self.runtime),
        )?;
        Ok(())
    }

    async fn stop_account(&mut self, account_id: &str) -> Result<()> {
        let cancel = {
            let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
            accounts.get(account_id).map(|s| s.cancel.clone())
        };

        if let Some(cancel) = cancel {
            info!(account_id, "stopping xiaozhi account");
            cancel.cancel();
            let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
            accounts.remove(account_id);
        } else {
            warn!(account_id, "xiaozhi account not found");
        }

        Ok(())
    }

    fn outbound(&self) -> Option<&dyn ChannelOutbound> {
        Some(&self.outbound)
    }

    fn status(&self) -> Option<&dyn ChannelStatus> {
        Some(self)
    }
}

#[async_trait]
impl ChannelStatus for XiaozhiPlugin {
    async fn probe(&self, account_id: &str) -> Result<ChannelHealthSnapshot> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        let snapshot = match accounts.get(account_id) {
            Some(state) => ChannelHealthSnapshot {
                connected: !state.cancel.is_cancelled(),
                account_id: account_id.to_string(),
                details: Some(format!(
                    "server: {}, device: {}",
                    state.config.server_url, state.config.device_id
                )),
            },
            None => ChannelHealthSnapshot {
                connected: false,
                account_id: account_id.to_string(),
                details: Some("account not started".into()),
            },
        };
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::MockRuntime,
        serde_json::json,
        voxlink_channels::registry::ChannelRegistry,
    };

    fn plugin() -> XiaozhiPlugin {
        XiaozhiPlugin::new(Arc::new(MockRuntime::default()))
    }

    #[tokio::test]
    async fn disabled_account_is_not_started() {
        let mut plugin = plugin();
        plugin
            .start_account("default", json!({"server_url": "http://localhost:8003"}))
            .await
            .unwrap();
        assert!(plugin.account_ids().is_empty());

        let snap = plugin.probe("default").await.unwrap();
        assert!(!snap.connected);
        assert_eq!(snap.details.as_deref(), Some("account not started"));
    }

    #[tokio::test]
    async fn empty_server_url_is_rejected() {
        let mut plugin = plugin();
        let err = plugin
            .start_account("default", json!({"server_url": "", "enabled": true}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("server_url"));
    }

    #[tokio::test]
    async fn start_and_stop_lifecycle() {
        let mut plugin = plugin();
        // Unroutable address: the monitor task will fail its polls and back
        // off, which is irrelevant to the lifecycle under test.
        plugin
            .start_account(
                "default",
                json!({"server_url": "http://127.0.0.1:9", "enabled": true}),
            )
            .await
            .unwrap();

        assert_eq!(plugin.account_ids(), vec!["default".to_string()]);
        let snap = plugin.probe("default").await.unwrap();
        assert!(snap.connected);
        assert!(snap.details.unwrap().contains("http://127.0.0.1:9"));

        plugin.stop_account("default").await.unwrap();
        assert!(plugin.account_ids().is_empty());
        assert!(!plugin.probe("default").await.unwrap().connected);
    }

    #[tokio::test]
    async fn stop_unknown_account_is_a_noop() {
        let mut plugin = plugin();
        plugin.stop_account("missing").await.unwrap();
    }

    #[test]
    fn registers_under_channel_id() {
        let mut registry = ChannelRegistry::new();
        registry.register(Box::new(plugin()));
        let registered = registry.get("xiaozhi").unwrap();
        assert_eq!(registered.name(), "Xiaozhi");
        assert!(registered.outbound().is_some());
        assert!(registered.status().is_some());
    }
}
