//! Data models returned by the proxy's management API.

pub mod key;
pub mod organization;
pub mod proxy;
pub mod team;

pub use key::ApiKey;
pub use organization::Organization;
pub use proxy::{ModelList, ProxySettings, UiSettingsResponse};
pub use team::Team;

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
