//! Feature panels.
//!
//! Each panel shows the props it was handed and the reference data relevant
//! to it. Editing lives in the proxy's own management screens.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_phosphor::regular::ARROWS_CLOCKWISE;

use super::components::{colors, empty_state, format_spend, mask_secret, panel_header, section};
use crate::page::{Page, Prop};
use crate::state::PanelProps;

/// Requests a panel makes of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    None,
    RefreshKeys,
    Navigate(&'static str),
}

/// Show the panel for `page`.
pub fn show(ui: &mut Ui, page: Page, props: &PanelProps, keys_loading: bool) -> PanelAction {
    let mut action = PanelAction::None;

    panel_header(ui, page.title(), Some(description(page)));

    ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
        match page {
            Page::ApiKeys => action = show_keys(ui, props, keys_loading),
            Page::Teams => show_teams(ui, props),
            Page::Organizations => show_organizations(ui, props),
            Page::Usage => action = show_usage(ui, props),
            Page::ApiReference => show_api_reference(ui, props),
            Page::AdminPanel => show_admin(ui, props),
            Page::Logs | Page::NewUsage | Page::Models | Page::Users => show_team_summary(ui, props),
            Page::LlmPlayground => show_playground(ui, props),
            Page::Budgets
            | Page::Guardrails
            | Page::RouterSettings
            | Page::ModelHub
            | Page::Caching
            | Page::PassThrough
            | Page::McpTools
            | Page::TagManagement
            | Page::LoggingAndAlerts => {
                empty_state(ui, "Managed from the proxy's management screens.");
            }
        }

        ui.add_space(20.0);
        show_received_props(ui, page, props);
    });

    action
}

fn description(page: Page) -> &'static str {
    match page {
        Page::ApiKeys => "Virtual keys issued to you and your teams",
        Page::Models => "Models deployed behind the proxy",
        Page::LlmPlayground => "Try a key against the proxy",
        Page::Users => "Users who can sign in to the proxy",
        Page::Teams => "Teams and their budgets",
        Page::Organizations => "Organizations grouping teams",
        Page::AdminPanel => "Proxy admins and single sign-on",
        Page::ApiReference => "Calling the proxy from code",
        Page::LoggingAndAlerts => "Logging callbacks and alerting",
        Page::Budgets => "Reusable budget definitions",
        Page::Guardrails => "Content guardrails applied to requests",
        Page::RouterSettings => "Routing strategy and fallbacks",
        Page::ModelHub => "Models available to proxy users",
        Page::Caching => "Response cache status",
        Page::PassThrough => "Pass-through endpoints to upstream providers",
        Page::Logs => "Request and spend logs",
        Page::McpTools => "Tools exposed through MCP servers",
        Page::TagManagement => "Tags used for spend tracking",
        Page::NewUsage => "Spend by team",
        Page::Usage => "Spend across your keys",
    }
}

fn show_keys(ui: &mut Ui, props: &PanelProps, keys_loading: bool) -> PanelAction {
    let mut action = PanelAction::None;

    ui.horizontal(|ui| {
        ui.add_enabled_ui(!keys_loading, |ui| {
            if ui.button(format!("{ARROWS_CLOCKWISE}  Refresh keys")).clicked() {
                action = PanelAction::RefreshKeys;
            }
        });
        if keys_loading {
            ui.spinner();
        }
    });
    ui.add_space(10.0);

    section(ui, "Keys", |ui| match &props.keys {
        None => empty_state(ui, "Keys not loaded yet"),
        Some(keys) if keys.is_empty() => empty_state(ui, "No keys"),
        Some(keys) => {
            let rows = keys
                .iter()
                .map(|key| {
                    vec![
                        key.display_name().to_string(),
                        key.team_id.clone().unwrap_or_else(|| "-".to_string()),
                        format_spend(key.spend),
                        key.models.join(", "),
                        key.expires.clone().unwrap_or_else(|| "never".to_string()),
                    ]
                })
                .collect();
            table(ui, "keys_table", &["Key", "Team", "Spend", "Models", "Expires"], rows);
        }
    });

    action
}

fn show_teams(ui: &mut Ui, props: &PanelProps) {
    section(ui, "Teams", |ui| teams_table(ui, props));

    if let Some(organizations) = &props.organizations {
        ui.add_space(10.0);
        ui.label(format!("{} organizations available", organizations.len()));
    }
}

fn teams_table(ui: &mut Ui, props: &PanelProps) {
    match &props.teams {
        None => empty_state(ui, "Teams not loaded yet"),
        Some(teams) if teams.is_empty() => empty_state(ui, "No teams"),
        Some(teams) => {
            let rows = teams
                .iter()
                .map(|team| {
                    vec![
                        team.display_name().to_string(),
                        team.organization_id.clone().unwrap_or_else(|| "-".to_string()),
                        format_spend(team.spend),
                        format_spend(team.max_budget),
                        if team.blocked { "blocked" } else { "active" }.to_string(),
                    ]
                })
                .collect();
            table(ui, "teams_table", &["Team", "Organization", "Spend", "Budget", "Status"], rows);
        }
    }
}

fn show_organizations(ui: &mut Ui, props: &PanelProps) {
    section(ui, "Organizations", |ui| {
        let organizations = props.organizations.as_deref().unwrap_or_default();
        if organizations.is_empty() {
            empty_state(ui, "No organizations");
            return;
        }
        let rows = organizations
            .iter()
            .map(|org| {
                vec![
                    org.display_name().to_string(),
                    format_spend(org.spend),
                    org.models.join(", "),
                ]
            })
            .collect();
        table(ui, "organizations_table", &["Organization", "Spend", "Models"], rows);
    });

    ui.add_space(10.0);

    section(ui, "Your models", |ui| {
        let models = props.user_models.as_deref().unwrap_or_default();
        if models.is_empty() {
            empty_state(ui, "No models available");
        } else {
            ui.horizontal_wrapped(|ui| {
                for model in models {
                    ui.label(RichText::new(model).monospace());
                }
            });
        }
    });
}

fn show_usage(ui: &mut Ui, props: &PanelProps) -> PanelAction {
    let mut action = PanelAction::None;

    section(ui, "Spend", |ui| match &props.keys {
        Some(keys) => {
            let total: f64 = keys.iter().filter_map(|key| key.spend).sum();
            ui.label(RichText::new(format!("${total:.4}")).size(28.0).strong());
            ui.label(format!("across {} keys", keys.len()));
        }
        None => {
            ui.label("Load your keys to see spend.");
            if ui.button("Open Virtual Keys").clicked() {
                action = PanelAction::Navigate(Page::ApiKeys.id());
            }
        }
    });

    action
}

fn show_api_reference(ui: &mut Ui, props: &PanelProps) {
    let base_url = props
        .proxy_settings
        .as_ref()
        .map(|settings| settings.base_url.as_str())
        .unwrap_or_default();

    section(ui, "OpenAI-compatible endpoint", |ui| {
        ui.label("Point any OpenAI SDK at the proxy:");
        ui.add_space(5.0);
        let snippet = format!(
            "curl {base_url}/chat/completions \\\n  -H \"Authorization: Bearer $PROXY_KEY\" \\\n  -H \"Content-Type: application/json\" \\\n  -d '{{\"model\": \"gpt-4o\", \"messages\": [{{\"role\": \"user\", \"content\": \"hi\"}}]}}'"
        );
        ui.add(
            egui::TextEdit::multiline(&mut snippet.as_str())
                .code_editor()
                .desired_width(f32::INFINITY),
        );
    });
}

fn show_admin(ui: &mut Ui, props: &PanelProps) {
    section(ui, "Single sign-on", |ui| {
        if props.show_sso_banner == Some(true) && props.premium_user != Some(true) {
            ui.colored_label(
                colors::WARNING,
                "You signed in with a username and password. SSO requires an enterprise license.",
            );
        } else {
            ui.colored_label(colors::SUCCESS, "SSO sign-in is available.");
        }
    });
}

fn show_team_summary(ui: &mut Ui, props: &PanelProps) {
    section(ui, "Teams", |ui| teams_table(ui, props));
}

fn show_playground(ui: &mut Ui, props: &PanelProps) {
    section(ui, "Key", |ui| {
        if props.disabled_personal_key_creation == Some(true) {
            ui.colored_label(colors::WARNING, "Personal key creation is disabled for your role.");
        }
        match &props.access_token {
            Some(token) => ui.label(format!("Using session key {}", mask_secret(token))),
            None => ui.colored_label(colors::ERROR, "No session key available"),
        };
    });
}

/// Grid of the props this page received.
fn show_received_props(ui: &mut Ui, page: Page, props: &PanelProps) {
    egui::CollapsingHeader::new("Session props")
        .id_salt(("received_props", page.id()))
        .default_open(false)
        .show(ui, |ui| {
            egui::Grid::new(("props_grid", page.id()))
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    for prop in page.props() {
                        ui.label(prop_name(*prop));
                        ui.label(prop_value(*prop, props));
                        ui.end_row();
                    }
                });
        });
}

fn prop_name(prop: Prop) -> &'static str {
    match prop {
        Prop::UserId => "User ID",
        Prop::UserRole => "Role",
        Prop::UserEmail => "Email",
        Prop::PremiumUser => "Premium",
        Prop::AccessToken => "Access token",
        Prop::Token => "Session token",
        Prop::Teams => "Teams",
        Prop::Keys => "Keys",
        Prop::Organizations => "Organizations",
        Prop::UserModels => "Models",
        Prop::ProxySettings => "Proxy",
        Prop::ShowSsoBanner => "SSO banner",
        Prop::DisabledPersonalKeyCreation => "Personal keys disabled",
    }
}

fn prop_value(prop: Prop, props: &PanelProps) -> String {
    fn count<T>(items: &Option<Vec<T>>) -> String {
        items
            .as_ref()
            .map(|items| items.len().to_string())
            .unwrap_or_else(|| "not loaded".to_string())
    }
    fn flag(value: Option<bool>) -> String {
        value.map(|v| if v { "yes" } else { "no" }.to_string()).unwrap_or_default()
    }

    match prop {
        Prop::UserId => props.user_id.clone().unwrap_or_else(|| "-".to_string()),
        Prop::UserRole => props.user_role.map(|role| role.label().to_string()).unwrap_or_default(),
        Prop::UserEmail => props.user_email.clone().unwrap_or_else(|| "-".to_string()),
        Prop::PremiumUser => flag(props.premium_user),
        Prop::AccessToken => props.access_token.as_deref().map(mask_secret).unwrap_or_else(|| "-".to_string()),
        Prop::Token => props.token.as_deref().map(mask_secret).unwrap_or_else(|| "-".to_string()),
        Prop::Teams => count(&props.teams),
        Prop::Keys => count(&props.keys),
        Prop::Organizations => count(&props.organizations),
        Prop::UserModels => count(&props.user_models),
        Prop::ProxySettings => props
            .proxy_settings
            .as_ref()
            .map(|settings| settings.base_url.clone())
            .unwrap_or_default(),
        Prop::ShowSsoBanner => flag(props.show_sso_banner),
        Prop::DisabledPersonalKeyCreation => flag(props.disabled_personal_key_creation),
    }
}

fn table(ui: &mut Ui, id: &str, headers: &[&str], rows: Vec<Vec<String>>) {
    let mut builder = TableBuilder::new(ui).id_salt(id).striped(true);
    for index in 0..headers.len() {
        builder = if index + 1 == headers.len() {
            builder.column(Column::remainder())
        } else {
            builder.column(Column::auto().at_least(90.0))
        };
    }

    builder
        .header(22.0, |mut header| {
            for title in headers {
                header.col(|ui| {
                    ui.strong(*title);
                });
            }
        })
        .body(|mut body| {
            for row_values in rows {
                body.row(20.0, |mut row| {
                    for value in row_values {
                        row.col(|ui| {
                            ui.label(value);
                        });
                    }
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Team;

    #[test]
    fn test_every_page_has_description() {
        for page in Page::ALL {
            assert!(!description(page).is_empty(), "{page}");
        }
    }

    #[test]
    fn test_prop_values() {
        let props = PanelProps {
            access_token: Some("sk-1234567890abcdef".to_string()),
            teams: Some(vec![Team {
                team_id: "t-1".to_string(),
                team_alias: None,
                organization_id: None,
                models: Vec::new(),
                spend: None,
                max_budget: None,
                blocked: false,
            }]),
            premium_user: Some(false),
            ..Default::default()
        };

        assert_eq!(prop_value(Prop::AccessToken, &props), "sk-1...cdef");
        assert_eq!(prop_value(Prop::Teams, &props), "1");
        assert_eq!(prop_value(Prop::Keys, &props), "not loaded");
        assert_eq!(prop_value(Prop::PremiumUser, &props), "no");
        assert_eq!(prop_value(Prop::UserId, &props), "-");
    }
}
