use serde::{Deserialize, Serialize};

/// Configuration for a single xiaozhi device-server account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XiaozhiAccountConfig {
    /// Base URL of the xiaozhi device server.
    pub server_url: String,

    /// Device identifier to poll for. Individual updates may carry their
    /// own `device_id`; this value is the fallback.
    pub device_id: String,

    /// Long-poll wait hint passed to the server, in seconds. The HTTP
    /// client enforces a hard timeout 5 seconds above this.
    pub timeout_secs: u64,

    /// Whether this account should be started by the gateway.
    pub enabled: bool,
}

impl XiaozhiAccountConfig {
    /// Server base URL without a trailing slash, for joining paths.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

impl Default for XiaozhiAccountConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8003".into(),
            device_id: "esp32_default".into(),
            timeout_secs: 30,
            enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = XiaozhiAccountConfig::default();
        assert_eq!(cfg.server_url, "http://localhost:8003");
        assert_eq!(cfg.device_id, "esp32_default");
        assert_eq!(cfg.timeout_secs, 30);
        assert!(!cfg.enabled);
    }

    #[test]
    fn deserialize_from_json() {
        let json = r#"{
            "server_url": "http://10.0.0.7:8003/",
            "device_id": "esp32_kitchen",
            "enabled": true
        }"#;
        let cfg: XiaozhiAccountConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.device_id, "esp32_kitchen");
        assert!(cfg.enabled);
        // defaults for unspecified fields
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn base_url_trims_trailing_slash() {
        let cfg = XiaozhiAccountConfig {
            server_url: "http://localhost:8003/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.base_url(), "http://localhost:8003");
    }

    #[test]
    fn serialize_roundtrip() {
        let cfg = XiaozhiAccountConfig {
            device_id: "d1".into(),
            enabled: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: XiaozhiAccountConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg2.device_id, "d1");
        assert!(cfg2.enabled);
    }
}
