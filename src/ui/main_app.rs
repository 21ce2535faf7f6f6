//! Main console window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use eframe::egui::{self, Color32, RichText, ScrollArea};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::client::ProxyClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::loader::{LoadEvent, ReferenceData, ReferenceLoader};
use crate::models::{ApiKey, ProxySettings};
use crate::page::{Page, Prop};
use crate::state::{ConsoleState, SessionStatus, View};

use super::components::{colors, empty_state};
use super::navbar::{self, NavbarAction};
use super::panels::{self, PanelAction};
use super::sidebar;

const MAX_LOG_ENTRIES: usize = 100;

/// Messages from async tasks to UI.
pub enum UiMessage {
    KeysLoaded { generation: u64, keys: Vec<ApiKey> },
    KeysFailed { generation: u64, error: String },
    ProxySettingsLoaded(ProxySettings),
    ProxySettingsFailed(String),
}

/// Log level for UI messages.
#[derive(Clone, Copy, Debug)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Log entry for display in the UI.
#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub level: LogLevel,
}

/// Root window of the console.
pub struct ConsoleApp {
    rt: tokio::runtime::Runtime,
    client: Arc<ProxyClient>,
    config: AppConfig,
    cookie_header: Option<String>,

    state: ConsoleState,
    loader: ReferenceLoader,

    tx: mpsc::UnboundedSender<UiMessage>,
    rx: mpsc::UnboundedReceiver<UiMessage>,

    keys_loading: bool,
    keys_task: Option<JoinHandle<()>>,
    /// Loader generation the key list belongs to.
    keys_generation: Option<u64>,
    log_messages: Vec<LogEntry>,
}

impl ConsoleApp {
    /// Build the window state and run the session bootstrap.
    pub fn new(
        config: AppConfig,
        rt: tokio::runtime::Runtime,
        location: Url,
        cookie_header: Option<String>,
    ) -> Result<Self> {
        let client = Arc::new(ProxyClient::new(
            &config.proxy.base_url,
            Duration::from_secs(config.proxy.timeout_secs),
        )?);
        let proxy_settings = ProxySettings {
            base_url: config.proxy.base_url.clone(),
            logout_url: config.proxy.logout_url.clone(),
        };

        let mut state = ConsoleState::new(location, proxy_settings, config.proxy.auth_header_name.clone());
        state.bootstrap(cookie_header.as_deref(), &config.session.cookie_name);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = Self {
            rt,
            loader: ReferenceLoader::new(Arc::clone(&client)),
            client,
            config,
            cookie_header,
            state,
            tx,
            rx,
            keys_loading: false,
            keys_task: None,
            keys_generation: None,
            log_messages: Vec::new(),
        };

        app.log_session();
        app.load_proxy_settings();
        Ok(app)
    }

    /// Log a message to the UI log.
    fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log_messages.push(LogEntry {
            timestamp: Local::now(),
            message: message.into(),
            level,
        });

        if self.log_messages.len() > MAX_LOG_ENTRIES {
            self.log_messages.remove(0);
        }
    }

    fn log_session(&mut self) {
        let (level, message) = match &self.state.session {
            SessionStatus::Active(session) => (
                LogLevel::Success,
                format!(
                    "Signed in as {} ({})",
                    session.user_email.as_deref().unwrap_or("unknown user"),
                    session.user_role
                ),
            ),
            SessionStatus::Invalid(error) => (LogLevel::Error, format!("Session cookie rejected: {error}")),
            SessionStatus::SignedOut => (LogLevel::Warning, "No session cookie".to_string()),
            SessionStatus::Pending => return,
        };
        self.log(level, message);
    }

    /// Fetch the proxy's advertised base and logout URLs.
    fn load_proxy_settings(&mut self) {
        let client = Arc::clone(&self.client);
        let fallback = self.state.proxy_settings.clone();
        let tx = self.tx.clone();

        self.rt.spawn(async move {
            let message = match client.ui_settings(&fallback).await {
                Ok(settings) => UiMessage::ProxySettingsLoaded(settings),
                Err(e) => UiMessage::ProxySettingsFailed(e.to_string()),
            };
            let _ = tx.send(message);
        });
    }

    /// Fetch the key list for the keys panel.
    fn refresh_keys(&mut self) {
        let Some(key) = self.state.load_key() else {
            return;
        };
        if self.keys_loading {
            return;
        }
        self.keys_loading = true;

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let generation = self.loader.generation();

        self.keys_task = Some(self.rt.spawn(async move {
            let message = match client.keys(&key.auth, Some(&key.user_id), key.role).await {
                Ok(keys) => UiMessage::KeysLoaded { generation, keys },
                Err(e) => UiMessage::KeysFailed {
                    generation,
                    error: e.to_string(),
                },
            };
            let _ = tx.send(message);
        }));
    }

    /// Abort an in-flight key list fetch.
    fn cancel_keys(&mut self) {
        if let Some(task) = self.keys_task.take() {
            task.abort();
        }
        self.keys_loading = false;
        self.keys_generation = None;
    }

    /// Poll async operation results.
    fn poll_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                UiMessage::KeysLoaded { generation, keys } => {
                    if generation != self.loader.generation() {
                        continue;
                    }
                    self.keys_loading = false;
                    self.keys_task = None;
                    self.log(LogLevel::Info, format!("Loaded {} keys", keys.len()));
                    self.state.reference.keys = Some(keys);
                    self.keys_generation = Some(generation);
                }
                UiMessage::KeysFailed { generation, error } => {
                    if generation != self.loader.generation() {
                        continue;
                    }
                    self.keys_loading = false;
                    self.keys_task = None;
                    // No automatic retry; the refresh button asks again.
                    self.keys_generation = Some(generation);
                    self.log(LogLevel::Error, format!("Failed to load keys: {error}"));
                }
                UiMessage::ProxySettingsLoaded(settings) => {
                    tracing::info!("Proxy base URL: {}", settings.base_url);
                    self.state.proxy_settings = settings;
                }
                UiMessage::ProxySettingsFailed(error) => {
                    self.log(LogLevel::Warning, format!("Using configured proxy settings: {error}"));
                }
            }
        }
    }

    /// Keep reference data in step with the session and URL.
    fn sync_reference_data(&mut self) {
        let generation = self.loader.generation();
        self.loader.sync(self.rt.handle(), self.state.load_key());
        if self.loader.generation() != generation {
            // Keys belong to the previous identity.
            self.cancel_keys();
            self.state.reference.keys = None;
        }

        for event in self.loader.poll(&mut self.state.reference) {
            match event {
                LoadEvent::Loaded { kind, count } => {
                    self.log(LogLevel::Info, format!("Loaded {count} {}", kind.name()));
                }
                LoadEvent::Failed { kind, error } => {
                    self.log(LogLevel::Error, format!("Failed to load {}: {error}", kind.name()));
                }
            }
        }

        // Fetch the key list once per identity, for pages that show it.
        let page = match self.state.view() {
            View::Panel(page) => Some(page),
            View::Onboarding { .. } => Some(Page::ApiKeys),
            View::Loading | View::SignedOut { .. } => None,
        };
        let wants_keys = page.is_some_and(|page| page.receives(Prop::Keys));
        if wants_keys && self.keys_generation.is_none() && !self.keys_loading {
            self.refresh_keys();
        }
    }

    /// Decode the cookie again and refetch everything.
    fn reload(&mut self) {
        self.state.bootstrap(self.cookie_header.as_deref(), &self.config.session.cookie_name);
        self.state.reference = ReferenceData::default();
        self.cancel_keys();
        self.loader.invalidate();
        self.log_session();
        self.load_proxy_settings();
    }

    fn logout(&mut self, ctx: &egui::Context) {
        tracing::info!("Logging out");
        self.cookie_header = None;
        self.state.session = SessionStatus::SignedOut;
        self.state.reference = ReferenceData::default();
        self.cancel_keys();
        self.loader.invalidate();

        let logout_url = self.state.proxy_settings.logout_url.clone();
        if !logout_url.is_empty() {
            ctx.open_url(egui::OpenUrl::new_tab(logout_url));
        }
        self.log(LogLevel::Info, "Logged out");
    }

    fn navigate(&mut self, page_id: &str) {
        tracing::debug!("Navigating to {page_id}");
        self.state.update_page(page_id);
    }

    fn handle_panel_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::None => {}
            PanelAction::RefreshKeys => self.refresh_keys(),
            PanelAction::Navigate(page_id) => self.navigate(page_id),
        }
    }

    fn show_signed_out(&self, ui: &mut egui::Ui, error: Option<&str>) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            ui.heading("Not signed in");
            ui.add_space(10.0);
            if let Some(error) = error {
                ui.colored_label(colors::ERROR, error);
                ui.add_space(10.0);
            }
            ui.label(format!(
                "Sign in at {} and pass the \"{}\" cookie with --cookie or --cookie-file.",
                self.state.router.location(),
                self.config.session.cookie_name
            ));
        });
    }

    fn show_activity_log(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("activity_log")
            .resizable(true)
            .default_height(120.0)
            .show(ctx, |ui| {
                ui.label(RichText::new("Activity").strong());
                ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if self.log_messages.is_empty() {
                            ui.label(RichText::new("No log entries").weak());
                            return;
                        }
                        for entry in &self.log_messages {
                            let color = match entry.level {
                                LogLevel::Info => Color32::GRAY,
                                LogLevel::Success => colors::SUCCESS,
                                LogLevel::Warning => colors::WARNING,
                                LogLevel::Error => colors::ERROR,
                            };
                            let formatted = format!("[{}] {}", entry.timestamp.format("%H:%M:%S"), entry.message);
                            ui.add(egui::Label::new(RichText::new(formatted).color(color)).wrap());
                        }
                    });
            });
    }
}

impl eframe::App for ConsoleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.config.ui.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        self.poll_messages();
        self.sync_reference_data();

        if self.loader.is_loading() || self.keys_loading {
            ctx.request_repaint();
        }

        match navbar::show(ctx, self.state.active_session(), &self.state.proxy_settings) {
            NavbarAction::None => {}
            NavbarAction::Reload => self.reload(),
            NavbarAction::Logout => self.logout(ctx),
        }

        navbar::show_status_bar(
            ctx,
            self.loader.is_loading(),
            self.loader.last_error(),
            self.state.router.location().as_str(),
        );
        if self.config.ui.show_activity_log {
            self.show_activity_log(ctx);
        }

        let view = self.state.view();
        if let View::Panel(page) = view
            && let Some(role) = self.state.user_role()
            && let Some(page_id) = sidebar::show(ctx, page, role)
        {
            self.navigate(page_id);
        }

        let mut action = PanelAction::None;
        egui::CentralPanel::default().show(ctx, |ui| match &view {
            View::Loading => {
                ui.centered_and_justified(|ui| ui.spinner());
            }
            View::SignedOut { error } => self.show_signed_out(ui, error.as_deref()),
            View::Onboarding { invitation_id } => {
                ui.label(RichText::new(format!("Invitation {invitation_id}")).weak());
                let props = self.state.panel_props(Page::ApiKeys);
                action = panels::show(ui, Page::ApiKeys, &props, self.keys_loading);
            }
            View::Panel(page) => {
                if self.state.active_session().is_none() {
                    empty_state(ui, "No active session");
                    return;
                }
                let props = self.state.panel_props(*page);
                action = panels::show(ui, *page, &props, self.keys_loading);
            }
        });
        self.handle_panel_action(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::token::tests::make_token;
    use serde_json::json;

    fn console(location: &str) -> ConsoleApp {
        let mut config = AppConfig::default();
        config.proxy.base_url = "http://127.0.0.1:9".to_string();
        config.proxy.timeout_secs = 1;
        let cookie = format!(
            "token={}",
            make_token(&json!({"key": "sk-1", "user_role": "internal_user"}))
        );
        let rt = tokio::runtime::Runtime::new().unwrap();
        ConsoleApp::new(config, rt, Url::parse(location).unwrap(), Some(cookie)).unwrap()
    }

    fn key_named(token: &str) -> ApiKey {
        serde_json::from_value(json!({"token": token})).unwrap()
    }

    #[test]
    fn test_logout_drops_key_list_sent_before_it() {
        let mut app = console("http://127.0.0.1:9/ui/?userID=u-1&invitation_id=inv-1");
        let generation = app.loader.generation();
        app.tx
            .send(UiMessage::KeysLoaded {
                generation,
                keys: vec![key_named("h1")],
            })
            .unwrap();

        app.logout(&egui::Context::default());
        app.poll_messages();

        assert_eq!(app.state.reference.keys, None);
        assert!(app.keys_task.is_none());
        assert!(!app.keys_loading);
        assert!(matches!(app.state.view(), View::Onboarding { .. }));
    }

    #[test]
    fn test_key_list_for_current_generation_lands() {
        let mut app = console("http://127.0.0.1:9/ui/?userID=u-1");
        let generation = app.loader.generation();
        app.tx
            .send(UiMessage::KeysLoaded {
                generation,
                keys: vec![key_named("h1")],
            })
            .unwrap();

        app.poll_messages();
        assert_eq!(app.state.reference.keys.map(|keys| keys.len()), Some(1));
        assert_eq!(app.keys_generation, Some(generation));
    }

    #[test]
    fn test_reload_aborts_key_fetch() {
        let mut app = console("http://127.0.0.1:9/ui/?userID=u-1");
        app.refresh_keys();
        assert!(app.keys_loading);
        assert!(app.keys_task.is_some());

        app.reload();
        assert!(!app.keys_loading);
        assert!(app.keys_task.is_none());
        assert_eq!(app.keys_generation, None);
    }
}
