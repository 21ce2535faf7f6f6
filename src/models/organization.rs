//! Organization records from `/organization/list`.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A top-level organization grouping teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub organization_id: String,
    #[serde(default)]
    pub organization_alias: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
    #[serde(default)]
    pub spend: Option<f64>,
    #[serde(default)]
    pub budget_id: Option<String>,
}

impl Organization {
    /// Alias when set, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.organization_alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .unwrap_or(&self.organization_id)
    }
}
