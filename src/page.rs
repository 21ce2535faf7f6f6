//! Console pages and the props each panel receives.

use std::fmt;

use crate::session::UserRole;

/// Page identifier used when the URL has no `page` parameter.
pub const DEFAULT_PAGE_ID: &str = "api-keys";

/// A feature panel of the console.
///
/// Unknown identifiers resolve to [`Page::Usage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    ApiKeys,
    Models,
    LlmPlayground,
    Users,
    Teams,
    Organizations,
    AdminPanel,
    ApiReference,
    LoggingAndAlerts,
    Budgets,
    Guardrails,
    RouterSettings,
    ModelHub,
    Caching,
    PassThrough,
    Logs,
    McpTools,
    TagManagement,
    NewUsage,
    Usage,
}

/// A piece of shared console state that can be handed to a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prop {
    UserId,
    UserRole,
    UserEmail,
    PremiumUser,
    AccessToken,
    Token,
    Teams,
    Keys,
    Organizations,
    UserModels,
    ProxySettings,
    ShowSsoBanner,
    DisabledPersonalKeyCreation,
}

impl Page {
    /// Every page, in sidebar order.
    pub const ALL: [Page; 20] = [
        Page::ApiKeys,
        Page::LlmPlayground,
        Page::Models,
        Page::Usage,
        Page::NewUsage,
        Page::Teams,
        Page::Organizations,
        Page::Users,
        Page::Budgets,
        Page::Guardrails,
        Page::Logs,
        Page::McpTools,
        Page::TagManagement,
        Page::ModelHub,
        Page::Caching,
        Page::PassThrough,
        Page::LoggingAndAlerts,
        Page::RouterSettings,
        Page::AdminPanel,
        Page::ApiReference,
    ];

    /// Identifier as it appears in the `page` query parameter.
    pub fn id(self) -> &'static str {
        match self {
            Page::ApiKeys => "api-keys",
            Page::Models => "models",
            Page::LlmPlayground => "llm-playground",
            Page::Users => "users",
            Page::Teams => "teams",
            Page::Organizations => "organizations",
            Page::AdminPanel => "admin-panel",
            Page::ApiReference => "api_ref",
            Page::LoggingAndAlerts => "settings",
            Page::Budgets => "budgets",
            Page::Guardrails => "guardrails",
            Page::RouterSettings => "general-settings",
            Page::ModelHub => "model-hub",
            Page::Caching => "caching",
            Page::PassThrough => "pass-through-settings",
            Page::Logs => "logs",
            Page::McpTools => "mcp-tools",
            Page::TagManagement => "tag-management",
            Page::NewUsage => "new_usage",
            Page::Usage => "usage",
        }
    }

    /// Exact lookup; `None` for identifiers outside the known set.
    pub fn lookup(id: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|page| page.id() == id)
    }

    /// Resolve an identifier, falling back to [`Page::Usage`].
    pub fn from_id(id: &str) -> Page {
        Page::lookup(id).unwrap_or(Page::Usage)
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::ApiKeys => "Virtual Keys",
            Page::Models => "Models",
            Page::LlmPlayground => "Test Key",
            Page::Users => "Internal Users",
            Page::Teams => "Teams",
            Page::Organizations => "Organizations",
            Page::AdminPanel => "Admin Settings",
            Page::ApiReference => "API Reference",
            Page::LoggingAndAlerts => "Logging & Alerts",
            Page::Budgets => "Budgets",
            Page::Guardrails => "Guardrails",
            Page::RouterSettings => "Router Settings",
            Page::ModelHub => "Model Hub",
            Page::Caching => "Caching",
            Page::PassThrough => "Pass-Through",
            Page::Logs => "Logs",
            Page::McpTools => "MCP Tools",
            Page::TagManagement => "Tag Management",
            Page::NewUsage => "New Usage",
            Page::Usage => "Usage",
        }
    }

    /// Pages the sidebar offers only to proxy admins.
    pub fn admin_only(self) -> bool {
        matches!(
            self,
            Page::Users
                | Page::AdminPanel
                | Page::LoggingAndAlerts
                | Page::Budgets
                | Page::Guardrails
                | Page::RouterSettings
                | Page::Caching
                | Page::PassThrough
                | Page::TagManagement
        )
    }

    /// Whether the sidebar shows this page to `role`.
    pub fn visible_to(self, role: UserRole) -> bool {
        !self.admin_only() || role.is_admin()
    }

    /// Shared state handed to this page's panel.
    pub fn props(self) -> &'static [Prop] {
        use Prop as P;

        match self {
            Page::ApiKeys => &[P::UserId, P::UserRole, P::UserEmail, P::PremiumUser, P::Teams, P::Keys, P::Organizations],
            Page::Models => &[P::UserId, P::UserRole, P::Token, P::AccessToken, P::Keys, P::PremiumUser, P::Teams],
            Page::LlmPlayground => &[P::AccessToken, P::Token, P::UserRole, P::UserId, P::DisabledPersonalKeyCreation],
            Page::Users => &[P::UserId, P::UserRole, P::Token, P::Keys, P::Teams, P::AccessToken],
            Page::Teams => &[P::Teams, P::AccessToken, P::UserId, P::UserRole, P::Organizations],
            Page::Organizations => &[P::Organizations, P::UserModels, P::AccessToken, P::UserRole, P::PremiumUser],
            Page::AdminPanel => &[P::AccessToken, P::ShowSsoBanner, P::PremiumUser],
            Page::ApiReference => &[P::ProxySettings],
            Page::LoggingAndAlerts => &[P::UserId, P::UserRole, P::AccessToken, P::PremiumUser],
            Page::Budgets | Page::Guardrails => &[P::AccessToken],
            Page::RouterSettings | Page::PassThrough => &[P::UserId, P::UserRole, P::AccessToken],
            Page::ModelHub => &[P::AccessToken, P::PremiumUser],
            Page::Caching => &[P::UserId, P::UserRole, P::Token, P::AccessToken, P::PremiumUser],
            Page::Logs => &[P::UserId, P::UserRole, P::Token, P::AccessToken, P::Teams],
            Page::McpTools | Page::TagManagement => &[P::AccessToken, P::UserRole, P::UserId],
            Page::NewUsage => &[P::UserId, P::UserRole, P::AccessToken, P::Teams],
            Page::Usage => &[P::UserId, P::UserRole, P::Token, P::AccessToken, P::Keys, P::PremiumUser],
        }
    }

    pub fn receives(self, prop: Prop) -> bool {
        self.props().contains(&prop)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
