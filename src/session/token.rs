//! Session token claims.
//!
//! The token is decoded without signature verification. The proxy verifies
//! it on every request, so the console only reads the claims.

use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Claims the console reads from the session token.
///
/// Each claim is read leniently: a value of an unexpected JSON type is
/// coerced where it has an obvious reading and dropped otherwise, so one odd
/// claim never rejects the whole token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Virtual key used as the bearer credential.
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub login_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub premium_user: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub disabled_non_admin_personal_key_creation: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub auth_header_name: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

/// Decode the claims of `token` without checking signature, expiry or audience.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<TokenClaims>(token.trim(), &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}
