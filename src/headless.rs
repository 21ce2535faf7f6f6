//! Headless session report for `--whoami`.

use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::info;

use crate::client::ProxyClient;
use crate::loader::{LoadEvent, ReferenceLoader};
use crate::page::Page;
use crate::session::Session;
use crate::state::{ConsoleState, PanelProps, View};

/// What the console would show, as JSON-friendly data.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleSummary {
    pub location: String,
    pub page: String,
    pub view: String,
    pub session: Option<Session>,
    pub props: Option<PanelProps>,
    pub errors: Vec<String>,
}

/// Bootstrap has already run on `state`; load reference data and describe the view.
pub async fn summarize(client: Arc<ProxyClient>, state: &mut ConsoleState) -> ConsoleSummary {
    let mut errors = Vec::new();
    if let Some(error) = session_error(state) {
        errors.push(error);
    }

    let mut loader = ReferenceLoader::new(Arc::clone(&client));
    if loader.sync(&Handle::current(), state.load_key()) {
        for event in loader.settle(&mut state.reference).await {
            if let LoadEvent::Failed { kind, error } = event {
                errors.push(format!("{}: {error}", kind.name()));
            }
        }
    }

    let view = state.view();
    let page = match view {
        View::Panel(page) => Some(page),
        View::Onboarding { .. } => Some(Page::ApiKeys),
        View::Loading | View::SignedOut { .. } => None,
    };

    if page == Some(Page::ApiKeys)
        && let Some(key) = state.load_key()
    {
        match client.keys(&key.auth, Some(&key.user_id), key.role).await {
            Ok(keys) => state.reference.keys = Some(keys),
            Err(e) => errors.push(format!("keys: {e}")),
        }
    }

    info!("Summarized view {view:?} with {} errors", errors.len());
    ConsoleSummary {
        location: state.router.location().to_string(),
        page: state.router.page_id().to_string(),
        view: view_name(&view),
        session: state.active_session().cloned(),
        props: page.map(|page| state.panel_props(page)),
        errors,
    }
}

fn session_error(state: &ConsoleState) -> Option<String> {
    match state.view() {
        View::SignedOut { error } => error.map(|e| format!("session: {e}")),
        _ => None,
    }
}

fn view_name(view: &View) -> String {
    match view {
        View::Loading => "loading".to_string(),
        View::SignedOut { .. } => "signed-out".to_string(),
        View::Onboarding { invitation_id } => format!("onboarding:{invitation_id}"),
        View::Panel(page) => page.id().to_string(),
    }
}
