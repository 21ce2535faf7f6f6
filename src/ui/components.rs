//! Shared UI components.

use eframe::egui::{self, Color32, CornerRadius, Margin, Response, RichText, Ui};

/// Status indicator colors.
pub mod colors {
    use super::Color32;

    pub const SUCCESS: Color32 = Color32::from_rgb(100, 200, 100);
    pub const ERROR: Color32 = Color32::from_rgb(255, 100, 100);
    pub const WARNING: Color32 = Color32::from_rgb(255, 200, 100);
    pub const ACCENT: Color32 = Color32::from_rgb(110, 150, 255);
}

/// Render a panel header with title and optional subtitle.
pub fn panel_header(ui: &mut Ui, title: &str, subtitle: Option<&str>) {
    ui.heading(RichText::new(title).size(24.0));
    if let Some(subtitle) = subtitle {
        ui.label(RichText::new(subtitle).weak());
    }
    ui.add_space(10.0);
    ui.separator();
    ui.add_space(20.0);
}

/// Render a titled card frame around `add_contents`.
pub fn section(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui)) {
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(Margin::same(15))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.label(RichText::new(title).strong());
            ui.add_space(10.0);
            add_contents(ui);
        });
}

/// Small colored tag, e.g. the role or a "Premium" marker.
pub fn badge(ui: &mut Ui, text: &str, color: Color32) -> Response {
    egui::Frame::new()
        .stroke(egui::Stroke::new(1.0, color))
        .inner_margin(Margin::symmetric(6, 2))
        .corner_radius(CornerRadius::same(4))
        .show(ui, |ui| ui.label(RichText::new(text).color(color).size(12.0)))
        .inner
}

/// Centered placeholder text for empty collections.
pub fn empty_state(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(20.0);
        ui.label(RichText::new(message).size(16.0).weak());
        ui.add_space(20.0);
    });
}

/// Sidebar entry with an icon.
pub fn nav_button(ui: &mut Ui, icon: &str, label: &str, selected: bool) -> Response {
    let text = RichText::new(format!("{icon}  {label}")).size(14.0);
    let text = if selected { text.strong() } else { text };
    ui.add_sized(
        [ui.available_width(), 28.0],
        egui::Button::new(text).selected(selected).frame(selected),
    )
}

/// Shorten a credential for display: `sk-1...cdef`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Format an optional spend amount.
pub fn format_spend(spend: Option<f64>) -> String {
    match spend {
        Some(amount) => format!("${amount:.4}"),
        None => "-".to_string(),
    }
}
