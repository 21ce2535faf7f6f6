//! User roles carried in the session token.

use std::fmt;

use serde::{Serialize, Serializer};

/// Permission level resolved from the token's `user_role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    AppOwner,
    Admin,
    AdminViewer,
    OrgAdmin,
    InternalUser,
    InternalViewer,
    AppUser,
    /// Non-empty value outside the known set.
    Unknown,
    /// Claim missing or empty.
    Undefined,
}

impl UserRole {
    /// Map a raw claim value. Matching is case-insensitive.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|value| !value.is_empty()) else {
            return Self::Undefined;
        };

        match raw.to_lowercase().as_str() {
            "app_owner" | "demo_app_owner" => Self::AppOwner,
            "app_admin" | "proxy_admin" => Self::Admin,
            "proxy_admin_viewer" => Self::AdminViewer,
            "org_admin" => Self::OrgAdmin,
            "internal_user" => Self::InternalUser,
            "internal_user_viewer" | "internal_viewer" => Self::InternalViewer,
            "app_user" => Self::AppUser,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label shown in the console.
    pub fn label(self) -> &'static str {
        match self {
            Self::AppOwner => "App Owner",
            Self::Admin => "Admin",
            Self::AdminViewer => "Admin Viewer",
            Self::OrgAdmin => "Org Admin",
            Self::InternalUser => "Internal User",
            Self::InternalViewer => "Internal Viewer",
            Self::AppUser => "App User",
            Self::Unknown => "Unknown Role",
            Self::Undefined => "Undefined Role",
        }
    }

    /// Proxy admins, including the read-only variant.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::AdminViewer)
    }
}

/// Label for a raw role claim.
pub fn format_user_role(raw: Option<&str>) -> &'static str {
    UserRole::from_raw(raw).label()
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for UserRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_roles() {
        let cases = [
            ("app_owner", "App Owner"),
            ("demo_app_owner", "App Owner"),
            ("app_admin", "Admin"),
            ("proxy_admin", "Admin"),
            ("proxy_admin_viewer", "Admin Viewer"),
            ("org_admin", "Org Admin"),
            ("internal_user", "Internal User"),
            ("internal_user_viewer", "Internal Viewer"),
            ("internal_viewer", "Internal Viewer"),
            ("app_user", "App User"),
        ];

        for (raw, label) in cases {
            assert_eq!(format_user_role(Some(raw)), label, "raw role {raw}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(format_user_role(Some("PROXY_ADMIN")), "Admin");
        assert_eq!(UserRole::from_raw(Some("Proxy_Admin_Viewer")), UserRole::AdminViewer);
    }

    #[test]
    fn test_unknown_role() {
        assert_eq!(format_user_role(Some("superuser")), "Unknown Role");
        assert_eq!(format_user_role(Some(" ")), "Unknown Role");
    }

    #[test]
    fn test_undefined_role() {
        assert_eq!(format_user_role(None), "Undefined Role");
        assert_eq!(format_user_role(Some("")), "Undefined Role");
    }

    #[test]
    fn test_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::AdminViewer.is_admin());
        assert!(!UserRole::OrgAdmin.is_admin());
        assert!(!UserRole::InternalUser.is_admin());
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&UserRole::InternalViewer).unwrap();
        assert_eq!(json, "\"Internal Viewer\"");
    }
}
