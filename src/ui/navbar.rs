//! Top navigation bar and status bar.

use eframe::egui::{self, Align, Layout, RichText};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, CROWN, SIGN_OUT};

use super::components::{badge, colors};
use crate::models::ProxySettings;
use crate::session::Session;

/// Requests from the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavbarAction {
    None,
    Reload,
    Logout,
}

/// Show the navigation bar.
pub fn show(ctx: &egui::Context, session: Option<&Session>, proxy: &ProxySettings) -> NavbarAction {
    let mut action = NavbarAction::None;

    egui::TopBottomPanel::top("navbar").min_height(40.0).show(ctx, |ui| {
        ui.horizontal_centered(|ui| {
            ui.label(RichText::new("Gateway Console").size(18.0).strong());
            ui.add_space(10.0);
            ui.label(RichText::new(&proxy.base_url).weak());

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let Some(session) = session else {
                    return;
                };

                if ui.button(format!("{SIGN_OUT}  Logout")).clicked() {
                    action = NavbarAction::Logout;
                }
                if ui.button(format!("{ARROWS_CLOCKWISE}  Reload")).clicked() {
                    action = NavbarAction::Reload;
                }

                ui.add_space(10.0);
                if session.premium_user {
                    badge(ui, &format!("{CROWN} Premium"), colors::WARNING);
                }
                badge(ui, session.user_role.label(), colors::ACCENT);
                if let Some(email) = &session.user_email {
                    ui.label(email);
                }
            });
        });

        if let Some(session) = session
            && session.show_sso_banner
            && !session.premium_user
        {
            ui.colored_label(
                colors::WARNING,
                "Signed in with username and password. Single sign-on is available with an enterprise license.",
            );
            ui.add_space(4.0);
        }
    });

    action
}

/// Render status bar (display only, no interaction).
pub fn show_status_bar(ctx: &egui::Context, loading: bool, error: Option<&str>, location: &str) {
    egui::TopBottomPanel::bottom("status_bar")
        .min_height(28.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if loading {
                    ui.spinner();
                    ui.colored_label(colors::WARNING, "Loading reference data...");
                } else if let Some(error) = error {
                    ui.colored_label(colors::ERROR, format!("Error: {error}"));
                } else {
                    ui.colored_label(colors::SUCCESS, "Ready");
                }

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.label(RichText::new(location).weak().monospace());
                });
            });
        });
}
