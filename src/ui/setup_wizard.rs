//! First-run setup wizard for configuration.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crate::client::{DEFAULT_AUTH_HEADER, ProxyClient};
use crate::config::AppConfig;
use crate::session;
use eframe::egui::{self, Color32, RichText};

/// Connection test state.
#[derive(Default, Clone)]
pub enum ConnectionTestState {
    #[default]
    NotTested,
    Testing,
    Success,
    Failed(String),
}

/// Setup wizard state.
pub struct SetupWizard {
    /// Current step (0-3).
    pub current_step: usize,
    /// Configuration being built.
    pub config: AppConfig,
    /// Proxy connection test state.
    pub proxy_test_state: ConnectionTestState,
    /// Wizard completed flag.
    pub completed: bool,
    /// Timeout input as string for text editing.
    timeout_input: String,
    cookie_input: String,
    header_input: String,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupWizard {
    pub fn new() -> Self {
        Self::from_config(AppConfig::default())
    }

    /// Start from an existing (possibly invalid) configuration.
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            current_step: 0,
            timeout_input: config.proxy.timeout_secs.to_string(),
            cookie_input: config.session.cookie.clone().unwrap_or_default(),
            header_input: config.proxy.auth_header_name.clone().unwrap_or_default(),
            config,
            proxy_test_state: ConnectionTestState::NotTested,
            completed: false,
        }
    }

    /// Check if user can proceed to next step.
    pub fn can_proceed(&self) -> bool {
        match self.current_step {
            0 => true,
            1 => matches!(self.proxy_test_state, ConnectionTestState::Success),
            2 => self.validate_session_step().is_ok(),
            3 => self.config.validate().is_ok(),
            _ => false,
        }
    }

    /// Copy the free-text inputs into the config.
    fn apply_inputs(&mut self) {
        let cookie = self.cookie_input.trim();
        self.config.session.cookie = (!cookie.is_empty()).then(|| cookie.to_string());

        let header = self.header_input.trim();
        self.config.proxy.auth_header_name = (!header.is_empty()).then(|| header.to_string());
    }

    /// Validate session step inputs.
    fn validate_session_step(&self) -> Result<(), String> {
        if self.config.session.cookie_name.trim().is_empty() {
            return Err("Cookie name cannot be empty".to_string());
        }
        let cookie = self.cookie_input.trim();
        if !cookie.is_empty() {
            session::bootstrap(Some(cookie), &self.config.session.cookie_name)
                .map_err(|e| format!("Cookie does not hold a readable token: {e}"))?;
        }
        Ok(())
    }

    /// Get step title.
    fn step_title(&self) -> &'static str {
        match self.current_step {
            0 => "Welcome",
            1 => "Proxy Connection",
            2 => "Session",
            3 => "Confirmation",
            _ => "Setup",
        }
    }

    /// Total number of steps.
    const TOTAL_STEPS: usize = 4;
}

/// Setup wizard application.
pub struct SetupApp {
    pub wizard: SetupWizard,
    pub initial_error: Option<String>,
    config_path: PathBuf,
    rt: tokio::runtime::Runtime,
    proxy_test_rx: Option<mpsc::Receiver<Result<(), String>>>,
}

impl SetupApp {
    pub fn new(
        wizard: SetupWizard,
        initial_error: Option<String>,
        config_path: PathBuf,
        rt: tokio::runtime::Runtime,
    ) -> Self {
        Self {
            wizard,
            initial_error,
            config_path,
            rt,
            proxy_test_rx: None,
        }
    }

    /// Test proxy connection asynchronously.
    fn start_proxy_test(&mut self) {
        let base_url = self.wizard.config.proxy.base_url.clone();
        let timeout = Duration::from_secs(self.wizard.config.proxy.timeout_secs.clamp(1, 300));
        let (tx, rx) = mpsc::channel();
        self.proxy_test_rx = Some(rx);
        self.wizard.proxy_test_state = ConnectionTestState::Testing;

        self.rt.spawn(async move {
            let result = test_proxy_connection(&base_url, timeout).await;
            let _ = tx.send(result);
        });
    }

    /// Check for async test results.
    fn poll_test_results(&mut self) {
        if let Some(rx) = &self.proxy_test_rx
            && let Ok(result) = rx.try_recv()
        {
            self.wizard.proxy_test_state = match result {
                Ok(()) => ConnectionTestState::Success,
                Err(e) => ConnectionTestState::Failed(e),
            };
            self.proxy_test_rx = None;
        }
    }
}

impl eframe::App for SetupApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_test_results();

        if matches!(self.wizard.proxy_test_state, ConnectionTestState::Testing) {
            ctx.request_repaint();
        }

        // Show initial error dialog
        if let Some(err) = self.initial_error.clone() {
            egui::Window::new("Configuration Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(Color32::from_rgb(255, 100, 100), &err);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.initial_error = None;
                    }
                });
            return;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);

                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Gateway Console Setup").size(24.0).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!(
                            "Step {} of {}",
                            self.wizard.current_step + 1,
                            SetupWizard::TOTAL_STEPS
                        ));
                    });
                });

                ui.separator();
                ui.add_space(10.0);

                ui.heading(self.wizard.step_title());
                ui.add_space(20.0);

                let needs_proxy_test = match self.wizard.current_step {
                    0 => {
                        show_welcome_step(ui);
                        false
                    }
                    1 => show_proxy_step(ui, &mut self.wizard),
                    2 => {
                        show_session_step(ui, &mut self.wizard);
                        false
                    }
                    3 => {
                        show_confirmation_step(ui, &self.wizard, &self.config_path);
                        false
                    }
                    _ => false,
                };

                if needs_proxy_test {
                    self.start_proxy_test();
                }

                ui.add_space(30.0);
                ui.separator();

                ui.horizontal(|ui| {
                    if self.wizard.current_step > 0 && ui.button("< Back").clicked() {
                        self.wizard.current_step -= 1;
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if self.wizard.current_step < SetupWizard::TOTAL_STEPS - 1 {
                            let btn_text = if self.wizard.current_step == 0 {
                                "Get Started >"
                            } else {
                                "Next >"
                            };
                            let enabled = self.wizard.can_proceed();
                            if ui.add_enabled(enabled, egui::Button::new(btn_text)).clicked() {
                                self.wizard.apply_inputs();
                                self.wizard.current_step += 1;
                            }
                        } else {
                            let enabled = self.wizard.can_proceed();
                            if ui.add_enabled(enabled, egui::Button::new("Save & Exit")).clicked() {
                                self.wizard.completed = true;
                            }
                        }
                    });
                });
            });
        });

        if self.wizard.completed {
            match self.wizard.config.save(&self.config_path) {
                Ok(()) => {
                    tracing::info!("Config saved to {:?}", self.config_path);
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                Err(e) => {
                    self.initial_error = Some(format!("Failed to save config: {}", e));
                    self.wizard.completed = false;
                }
            }
        }
    }
}

fn show_welcome_step(ui: &mut egui::Ui) {
    ui.label("Welcome to Gateway Console!");
    ui.add_space(10.0);
    ui.label("This wizard will help you connect the console to your proxy.");
    ui.add_space(20.0);
    ui.label("You will need:");
    ui.add_space(5.0);
    ui.label("  - The proxy base URL");
    ui.label("  - The session cookie from a signed-in browser (optional)");
}

fn show_proxy_step(ui: &mut egui::Ui, wizard: &mut SetupWizard) -> bool {
    let mut needs_test = false;

    egui::Grid::new("proxy_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Proxy URL:");
            if ui.text_edit_singleline(&mut wizard.config.proxy.base_url).changed() {
                wizard.proxy_test_state = ConnectionTestState::NotTested;
            }
            ui.end_row();

            ui.label("Logout URL:");
            ui.text_edit_singleline(&mut wizard.config.proxy.logout_url);
            ui.end_row();

            ui.label("Timeout (seconds):");
            if ui.text_edit_singleline(&mut wizard.timeout_input).changed()
                && let Ok(t) = wizard.timeout_input.parse()
            {
                wizard.config.proxy.timeout_secs = t;
            }
            ui.end_row();
        });

    ui.add_space(20.0);

    ui.horizontal(|ui| {
        let testing = matches!(wizard.proxy_test_state, ConnectionTestState::Testing);
        if ui.add_enabled(!testing, egui::Button::new("Test Connection")).clicked() {
            needs_test = true;
        }

        ui.add_space(10.0);

        match &wizard.proxy_test_state {
            ConnectionTestState::NotTested => {
                ui.label("Not tested");
            }
            ConnectionTestState::Testing => {
                ui.spinner();
                ui.label("Testing...");
            }
            ConnectionTestState::Success => {
                ui.colored_label(Color32::from_rgb(100, 200, 100), "Proxy is alive!");
            }
            ConnectionTestState::Failed(e) => {
                ui.colored_label(Color32::from_rgb(255, 100, 100), format!("Failed: {}", e));
            }
        }
    });

    needs_test
}

fn show_session_step(ui: &mut egui::Ui, wizard: &mut SetupWizard) {
    ui.label("Paste the cookie string from a signed-in browser session.");
    ui.label(RichText::new("This step is optional - you can pass --cookie later.").italics());
    ui.add_space(10.0);

    egui::Grid::new("session_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Cookie name:");
            ui.text_edit_singleline(&mut wizard.config.session.cookie_name);
            ui.end_row();

            ui.label("Cookie:");
            ui.add(egui::TextEdit::singleline(&mut wizard.cookie_input).password(true));
            ui.end_row();

            ui.label("Auth header:");
            ui.add(egui::TextEdit::singleline(&mut wizard.header_input).hint_text(DEFAULT_AUTH_HEADER));
            ui.end_row();
        });

    if let Err(e) = wizard.validate_session_step() {
        ui.add_space(10.0);
        ui.colored_label(Color32::from_rgb(255, 100, 100), e);
    }
}

fn show_confirmation_step(ui: &mut egui::Ui, wizard: &SetupWizard, path: &std::path::Path) {
    ui.label("Review your configuration:");
    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Proxy");
        ui.label(format!("  {}", wizard.config.proxy.base_url));
        if !wizard.config.proxy.logout_url.is_empty() {
            ui.label(format!("  Logout: {}", wizard.config.proxy.logout_url));
        }
        ui.label(format!("  Timeout: {} seconds", wizard.config.proxy.timeout_secs));
    });

    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Session");
        ui.label(format!("  Cookie name: {}", wizard.config.session.cookie_name));
        ui.label(format!(
            "  Cookie: {}",
            if wizard.config.session.cookie.is_some() {
                "Saved"
            } else {
                "Not configured"
            }
        ));
        ui.label(format!(
            "  Auth header: {}",
            wizard.config.proxy.auth_header_name.as_deref().unwrap_or(DEFAULT_AUTH_HEADER)
        ));
    });

    if let Err(e) = wizard.config.validate() {
        ui.add_space(10.0);
        ui.colored_label(Color32::from_rgb(255, 100, 100), e.to_string());
    }

    ui.add_space(20.0);
    ui.label(format!("Click 'Save & Exit' to write {}.", path.display()));
    ui.label("You will need to restart the application after setup.");
}

/// Test proxy connection via its liveness endpoint.
async fn test_proxy_connection(base_url: &str, timeout: Duration) -> Result<(), String> {
    let client = ProxyClient::new(base_url, timeout).map_err(|e| e.to_string())?;
    match client.test_connection().await {
        Ok(true) => Ok(()),
        Ok(false) => Err("Proxy answered but is not healthy".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::token::tests::make_token;
    use serde_json::json;

    #[test]
    fn test_proxy_step_requires_successful_test() {
        let mut wizard = SetupWizard::new();
        wizard.current_step = 1;
        assert!(!wizard.can_proceed());

        wizard.proxy_test_state = ConnectionTestState::Success;
        assert!(wizard.can_proceed());
    }

    #[test]
    fn test_session_step_checks_cookie() {
        let mut wizard = SetupWizard::new();
        wizard.current_step = 2;
        assert!(wizard.can_proceed());

        wizard.cookie_input = "token=garbage".to_string();
        assert!(!wizard.can_proceed());

        wizard.cookie_input = format!("token={}", make_token(&json!({"key": "sk-1"})));
        assert!(wizard.can_proceed());
    }

    #[test]
    fn test_apply_inputs_trims_and_clears() {
        let mut wizard = SetupWizard::new();
        wizard.cookie_input = "  token=abc ".to_string();
        wizard.header_input = "   ".to_string();
        wizard.apply_inputs();

        assert_eq!(wizard.config.session.cookie.as_deref(), Some("token=abc"));
        assert_eq!(wizard.config.proxy.auth_header_name, None);
    }

    #[test]
    fn test_from_config_keeps_values() {
        let mut config = AppConfig::default();
        config.proxy.auth_header_name = Some("x-gateway-key".to_string());
        let wizard = SetupWizard::from_config(config);
        assert_eq!(wizard.header_input, "x-gateway-key");
        assert_eq!(wizard.timeout_input, "30");
    }
}
