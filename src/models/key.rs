//! Virtual key records from `/key/list`.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A virtual API key issued by the proxy. `token` is the hashed key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub token: String,
    #[serde(default)]
    pub key_alias: Option<String>,
    /// Abbreviated form of the secret, e.g. `sk-...abcd`.
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub spend: Option<f64>,
    #[serde(default)]
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
}

impl ApiKey {
    /// Alias, then abbreviated name, then the hashed token.
    pub fn display_name(&self) -> &str {
        [self.key_alias.as_deref(), self.key_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or(&self.token)
    }
}

/// Envelope returned by `/key/list?return_full_object=true`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub keys: Vec<ApiKey>,
}
