//! Session bootstrap: cookie lookup, token decoding and derived flags.

pub mod cookie;
pub mod role;
pub mod token;

pub use cookie::{get_cookie, resolve_cookie_header};
pub use role::{UserRole, format_user_role};
pub use token::{TokenClaims, decode_claims};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;

/// Login method that gets the SSO upsell banner.
const PASSWORD_LOGIN_METHOD: &str = "username_password";

/// Identity and permission flags of the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Raw cookie value, forwarded to panels that need the whole token.
    #[serde(skip_serializing)]
    pub token: String,
    /// Bearer credential; `None` when the token has no usable `key`.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub user_role: UserRole,
    pub user_email: Option<String>,
    pub premium_user: bool,
    pub disabled_personal_key_creation: bool,
    pub show_sso_banner: bool,
    pub auth_header_name: Option<String>,
}

impl Session {
    /// Build a session from decoded claims.
    ///
    /// Flags keep their defaults when the claim is absent.
    pub fn from_claims(token: impl Into<String>, claims: TokenClaims) -> Self {
        let mut session = Self {
            token: token.into(),
            access_token: claims.key.filter(|key| !key.trim().is_empty()),
            user_role: UserRole::from_raw(claims.user_role.as_deref()),
            user_email: None,
            premium_user: false,
            disabled_personal_key_creation: claims.disabled_non_admin_personal_key_creation.unwrap_or(false),
            show_sso_banner: true,
            auth_header_name: claims.auth_header_name.filter(|name| !name.trim().is_empty()),
        };

        if let Some(email) = claims.user_email.filter(|email| !email.is_empty()) {
            session.user_email = Some(email);
        }
        if let Some(method) = claims.login_method {
            session.show_sso_banner = method == PASSWORD_LOGIN_METHOD;
        }
        if let Some(premium) = claims.premium_user {
            session.premium_user = premium;
        }

        session
    }

    /// Decode a raw token into a session.
    pub fn decode(token: &str) -> Result<Self> {
        let claims = decode_claims(token)?;
        Ok(Self::from_claims(token, claims))
    }

    /// Whether the role is the read-only admin, which is pinned to usage.
    pub fn is_admin_viewer(&self) -> bool {
        self.user_role == UserRole::AdminViewer
    }
}

/// Read `cookie_name` from the document cookie string and decode it.
///
/// Returns `Ok(None)` when there is no cookie; a malformed token is an error.
pub fn bootstrap(cookie_header: Option<&str>, cookie_name: &str) -> Result<Option<Session>> {
    let Some(token) = cookie_header.and_then(|header| get_cookie(header, cookie_name)) else {
        debug!("No '{cookie_name}' cookie present");
        return Ok(None);
    };

    let session = Session::decode(&token)?;
    info!(
        "Session decoded: role={}, email={}, premium={}",
        session.user_role,
        session.user_email.as_deref().unwrap_or("-"),
        session.premium_user
    );
    Ok(Some(session))
}
