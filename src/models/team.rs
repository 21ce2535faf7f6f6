//! Team records from `/team/list`.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A team the user belongs to or can administer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: String,
    #[serde(default)]
    pub team_alias: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
    #[serde(default)]
    pub spend: Option<f64>,
    #[serde(default)]
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub blocked: bool,
}

impl Team {
    /// Alias when set, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.team_alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .unwrap_or(&self.team_id)
    }
}
