//! Proxy-wide settings and model listings.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Where the proxy lives and where logout should send the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub base_url: String,
    pub logout_url: String,
}

/// Body of `/sso/get/ui_settings`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiSettingsResponse {
    #[serde(rename = "PROXY_BASE_URL", default)]
    pub proxy_base_url: Option<String>,
    #[serde(rename = "PROXY_LOGOUT_URL", default)]
    pub proxy_logout_url: Option<String>,
}

impl UiSettingsResponse {
    /// Merge with locally configured values; blank remote values keep the fallback.
    pub fn into_settings(self, fallback: &ProxySettings) -> ProxySettings {
        fn pick(remote: Option<String>, local: &str) -> String {
            remote
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| local.to_string())
        }

        ProxySettings {
            base_url: pick(self.proxy_base_url, &fallback.base_url),
            logout_url: pick(self.proxy_logout_url, &fallback.logout_url),
        }
    }
}

/// Body of `/models`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

impl ModelList {
    /// Model ids in server order.
    pub fn into_ids(self) -> Vec<String> {
        self.data.into_iter().map(|entry| entry.id).collect()
    }
}
