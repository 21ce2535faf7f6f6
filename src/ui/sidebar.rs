//! Role-aware navigation sidebar.

use eframe::egui::{self, RichText, ScrollArea};
use egui_phosphor::regular::{
    ARROWS_LEFT_RIGHT, BELL, BOOK_OPEN, BUILDINGS, CHART_BAR, CHART_LINE, CHAT_CIRCLE, CUBE, DATABASE, GEAR,
    KEY, LIST_BULLETS, SHIELD_CHECK, SLIDERS, STOREFRONT, TAG, USER, USERS_THREE, WALLET, WRENCH,
};

use super::components::nav_button;
use crate::page::Page;
use crate::session::UserRole;

fn icon(page: Page) -> &'static str {
    match page {
        Page::ApiKeys => KEY,
        Page::LlmPlayground => CHAT_CIRCLE,
        Page::Models => CUBE,
        Page::Usage => CHART_BAR,
        Page::NewUsage => CHART_LINE,
        Page::Teams => USERS_THREE,
        Page::Organizations => BUILDINGS,
        Page::Users => USER,
        Page::Budgets => WALLET,
        Page::Guardrails => SHIELD_CHECK,
        Page::Logs => LIST_BULLETS,
        Page::McpTools => WRENCH,
        Page::TagManagement => TAG,
        Page::ModelHub => STOREFRONT,
        Page::Caching => DATABASE,
        Page::PassThrough => ARROWS_LEFT_RIGHT,
        Page::LoggingAndAlerts => BELL,
        Page::RouterSettings => SLIDERS,
        Page::AdminPanel => GEAR,
        Page::ApiReference => BOOK_OPEN,
    }
}

/// Pages offered to `role`, in display order.
pub fn visible_pages(role: UserRole) -> Vec<Page> {
    Page::ALL.into_iter().filter(|page| page.visible_to(role)).collect()
}

/// Show the sidebar.
///
/// Returns the page id to navigate to when an entry is clicked.
pub fn show(ctx: &egui::Context, current: Page, role: UserRole) -> Option<&'static str> {
    let mut selected = None;

    egui::SidePanel::left("sidebar")
        .resizable(false)
        .exact_width(220.0)
        .show(ctx, |ui| {
            ui.add_space(10.0);
            ui.label(RichText::new("Navigation").weak().size(12.0));
            ui.add_space(5.0);

            ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
                for page in visible_pages(role) {
                    if nav_button(ui, icon(page), page.title(), page == current).clicked() && page != current {
                        selected = Some(page.id());
                    }
                }
            });
        });

    selected
}
