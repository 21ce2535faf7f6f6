//! Console state: session, router and reference data, plus the view they select.

use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::client::RequestAuth;
use crate::loader::{LoadKey, ReferenceData};
use crate::models::{ApiKey, Organization, ProxySettings, Team};
use crate::page::{Page, Prop};
use crate::router::Router;
use crate::session::{self, Session, UserRole};

/// Where the session bootstrap ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Bootstrap has not run yet.
    Pending,
    /// No session cookie.
    SignedOut,
    /// The cookie was present but could not be decoded.
    Invalid(String),
    Active(Session),
}

/// Top-level view selected by the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Loading,
    SignedOut { error: Option<String> },
    /// Invitation link: the keys panel alone, without navigation.
    Onboarding { invitation_id: String },
    Panel(Page),
}

/// Values handed to a panel. Fields the page does not receive stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PanelProps {
    pub user_id: Option<String>,
    pub user_role: Option<UserRole>,
    pub user_email: Option<String>,
    pub premium_user: Option<bool>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub teams: Option<Vec<Team>>,
    pub keys: Option<Vec<ApiKey>>,
    pub organizations: Option<Vec<Organization>>,
    pub user_models: Option<Vec<String>>,
    pub proxy_settings: Option<ProxySettings>,
    pub show_sso_banner: Option<bool>,
    pub disabled_personal_key_creation: Option<bool>,
}

/// Root state of the console window.
#[derive(Debug, Clone)]
pub struct ConsoleState {
    pub router: Router,
    pub session: SessionStatus,
    pub reference: ReferenceData,
    pub proxy_settings: ProxySettings,
    /// Configured header name, used when the token names none.
    header_fallback: Option<String>,
}

impl ConsoleState {
    pub fn new(location: Url, proxy_settings: ProxySettings, header_fallback: Option<String>) -> Self {
        Self {
            router: Router::new(location),
            session: SessionStatus::Pending,
            reference: ReferenceData::default(),
            proxy_settings,
            header_fallback,
        }
    }

    /// Decode the session cookie and apply its side effects.
    ///
    /// An admin viewer is sent to the usage page whatever the URL asked for.
    pub fn bootstrap(&mut self, cookie_header: Option<&str>, cookie_name: &str) {
        self.session = match session::bootstrap(cookie_header, cookie_name) {
            Ok(Some(session)) => {
                if session.is_admin_viewer() {
                    info!("Admin viewer session, redirecting to usage");
                    self.router.update_page(Page::Usage.id());
                }
                SessionStatus::Active(session)
            }
            Ok(None) => SessionStatus::SignedOut,
            Err(e) => {
                warn!("Session bootstrap failed: {e}");
                SessionStatus::Invalid(e.to_string())
            }
        };
    }

    pub fn update_page(&mut self, page_id: &str) {
        self.router.update_page(page_id);
    }

    pub fn active_session(&self) -> Option<&Session> {
        match &self.session {
            SessionStatus::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.active_session().map(|session| session.user_role)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.active_session().and_then(|session| session.access_token.as_deref())
    }

    pub fn user_id(&self) -> Option<String> {
        self.router.user_id()
    }

    /// Credentials for proxy calls; header name from the token, then config.
    pub fn request_auth(&self) -> Option<RequestAuth> {
        let session = self.active_session()?;
        let access_token = session.access_token.as_deref()?;
        let header_name = session
            .auth_header_name
            .as_deref()
            .or(self.header_fallback.as_deref());
        Some(RequestAuth::new(access_token, header_name))
    }

    /// Dependency key for the reference loader.
    pub fn load_key(&self) -> Option<LoadKey> {
        LoadKey::from_parts(self.request_auth(), self.user_id().as_deref(), self.user_role())
    }

    pub fn view(&self) -> View {
        match &self.session {
            SessionStatus::Pending => View::Loading,
            _ if self.router.invitation_id().is_some() => View::Onboarding {
                invitation_id: self.router.invitation_id().unwrap_or_default(),
            },
            SessionStatus::SignedOut => View::SignedOut { error: None },
            SessionStatus::Invalid(error) => View::SignedOut {
                error: Some(error.clone()),
            },
            SessionStatus::Active(_) => View::Panel(self.router.page()),
        }
    }

    /// Props for `page`, limited to what that page receives.
    pub fn panel_props(&self, page: Page) -> PanelProps {
        let session = self.active_session();
        let mut props = PanelProps::default();

        for prop in page.props() {
            match prop {
                Prop::UserId => props.user_id = self.user_id(),
                Prop::UserRole => props.user_role = self.user_role(),
                Prop::UserEmail => props.user_email = session.and_then(|s| s.user_email.clone()),
                Prop::PremiumUser => props.premium_user = session.map(|s| s.premium_user),
                Prop::AccessToken => props.access_token = self.access_token().map(str::to_string),
                Prop::Token => props.token = session.map(|s| s.token.clone()),
                Prop::Teams => {
                    props.teams = match page {
                        // Logs lists every team and treats "not loaded" as empty.
                        Page::Logs => Some(self.reference.teams.clone().unwrap_or_default()),
                        _ => self.reference.teams.clone(),
                    }
                }
                Prop::Keys => props.keys = self.reference.keys.clone(),
                Prop::Organizations => props.organizations = Some(self.reference.organizations.clone()),
                Prop::UserModels => props.user_models = Some(self.reference.user_models.clone()),
                Prop::ProxySettings => props.proxy_settings = Some(self.proxy_settings.clone()),
                Prop::ShowSsoBanner => props.show_sso_banner = session.map(|s| s.show_sso_banner),
                Prop::DisabledPersonalKeyCreation => {
                    props.disabled_personal_key_creation = session.map(|s| s.disabled_personal_key_creation)
                }
            }
        }

        props
    }
}
