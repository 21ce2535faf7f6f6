//! Reference-data loader.
//!
//! Fetches user models, teams and organizations once the session identity is
//! complete. Every trigger and every cancel bumps a generation; completions
//! from older generations are dropped, and in-flight tasks are aborted on
//! re-trigger, on cancel and on drop.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{ProxyClient, RequestAuth};
use crate::error::{AppError, Result};
use crate::models::{ApiKey, Organization, Team};
use crate::session::UserRole;

/// Source of the three reference collections.
#[async_trait]
pub trait ReferenceSource: Send + Sync + 'static {
    async fn user_models(&self, auth: &RequestAuth, user_id: &str, role: UserRole) -> Result<Vec<String>>;
    async fn teams(&self, auth: &RequestAuth, user_id: &str, role: UserRole) -> Result<Vec<Team>>;
    async fn organizations(&self, auth: &RequestAuth) -> Result<Vec<Organization>>;
}

#[async_trait]
impl ReferenceSource for ProxyClient {
    async fn user_models(&self, auth: &RequestAuth, user_id: &str, role: UserRole) -> Result<Vec<String>> {
        ProxyClient::user_models(self, auth, user_id, role).await
    }

    async fn teams(&self, auth: &RequestAuth, user_id: &str, role: UserRole) -> Result<Vec<Team>> {
        ProxyClient::teams(self, auth, user_id, role).await
    }

    async fn organizations(&self, auth: &RequestAuth) -> Result<Vec<Organization>> {
        ProxyClient::organizations(self, auth).await
    }
}

/// Identity the fetches depend on. A change to any field re-triggers all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadKey {
    pub auth: RequestAuth,
    pub user_id: String,
    pub role: UserRole,
}

impl LoadKey {
    /// `Some` only when the token, user id and role are all present.
    ///
    /// A token without a role claim yields [`UserRole::Undefined`], which counts as missing.
    pub fn from_parts(auth: Option<RequestAuth>, user_id: Option<&str>, role: Option<UserRole>) -> Option<Self> {
        let auth = auth.filter(|auth| !auth.access_token.is_empty())?;
        let user_id = user_id.filter(|id| !id.is_empty())?;
        let role = role.filter(|role| *role != UserRole::Undefined)?;

        Some(Self {
            auth,
            user_id: user_id.to_string(),
            role,
        })
    }
}

/// Reference collections shared by the panels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    /// `None` until the first teams fetch lands.
    pub teams: Option<Vec<Team>>,
    pub organizations: Vec<Organization>,
    pub user_models: Vec<String>,
    /// Filled by the keys panel.
    pub keys: Option<Vec<ApiKey>>,
}

/// Which collection a fetch fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    UserModels,
    Teams,
    Organizations,
}

impl FetchKind {
    pub fn name(self) -> &'static str {
        match self {
            FetchKind::UserModels => "models",
            FetchKind::Teams => "teams",
            FetchKind::Organizations => "organizations",
        }
    }
}

enum Fetched {
    UserModels(Vec<String>),
    Teams(Vec<Team>),
    Organizations(Vec<Organization>),
}

struct Completion {
    generation: u64,
    kind: FetchKind,
    result: Result<Fetched>,
}

/// Outcome of an applied completion, for the activity log.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Loaded { kind: FetchKind, count: usize },
    Failed { kind: FetchKind, error: String },
}

/// Runs the reference fetches and merges their results.
pub struct ReferenceLoader<S: ReferenceSource = ProxyClient> {
    source: Arc<S>,
    key: Option<LoadKey>,
    generation: u64,
    pending: usize,
    tasks: Vec<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    last_error: Option<String>,
}

impl<S: ReferenceSource> ReferenceLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            key: None,
            generation: 0,
            pending: 0,
            tasks: Vec::new(),
            tx,
            rx,
            last_error: None,
        }
    }

    /// Trigger the fetches if `key` differs from the last one seen.
    ///
    /// Returns `true` when a new generation was started. A `None` key cancels
    /// any in-flight work without starting new fetches.
    pub fn sync(&mut self, handle: &Handle, key: Option<LoadKey>) -> bool {
        if key == self.key {
            return false;
        }

        self.cancel();
        self.key = key.clone();
        let Some(key) = key else {
            debug!("Reference data prerequisites missing, nothing to load");
            return false;
        };

        self.pending = 3;
        self.last_error = None;
        info!(
            "Loading reference data for {} ({}), generation {}",
            key.user_id, key.role, self.generation
        );

        let source = Arc::clone(&self.source);
        let k = key.clone();
        self.spawn_fetch(handle, FetchKind::UserModels, async move {
            source.user_models(&k.auth, &k.user_id, k.role).await.map(Fetched::UserModels)
        });

        let source = Arc::clone(&self.source);
        let k = key.clone();
        self.spawn_fetch(handle, FetchKind::Teams, async move {
            source.teams(&k.auth, &k.user_id, k.role).await.map(Fetched::Teams)
        });

        let source = Arc::clone(&self.source);
        self.spawn_fetch(handle, FetchKind::Organizations, async move {
            source.organizations(&key.auth).await.map(Fetched::Organizations)
        });

        true
    }

    fn spawn_fetch<F>(&mut self, handle: &Handle, kind: FetchKind, fetch: F)
    where
        F: Future<Output = Result<Fetched>> + Send + 'static,
    {
        let tx = self.tx.clone();
        let generation = self.generation;
        self.tasks.push(handle.spawn(async move {
            let result = fetch.await;
            let _ = tx.send(Completion {
                generation,
                kind,
                result,
            });
        }));
    }

    /// Abort in-flight fetches and discard anything they already queued.
    ///
    /// Bumps the generation, so a completion sent after this call is stale.
    pub fn cancel(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        while self.rx.try_recv().is_ok() {}
        self.generation += 1;
        self.pending = 0;
    }

    /// Forget the last key so the next [`sync`](Self::sync) refetches.
    pub fn invalidate(&mut self) {
        self.cancel();
        self.key = None;
    }

    /// Merge finished fetches into `data` without blocking.
    pub fn poll(&mut self, data: &mut ReferenceData) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(event) = self.apply(completion, data) {
                events.push(event);
            }
        }
        if self.pending == 0 {
            self.tasks.retain(|task| !task.is_finished());
        }
        events
    }

    /// Wait for the current generation to finish and merge its results.
    pub async fn settle(&mut self, data: &mut ReferenceData) -> Vec<LoadEvent> {
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                let err = AppError::TaskFailed(e.to_string());
                warn!("Reference fetch task failed: {err}");
                self.last_error = Some(err.to_string());
            }
        }
        let events = self.poll(data);
        self.pending = 0;
        events
    }

    fn apply(&mut self, completion: Completion, data: &mut ReferenceData) -> Option<LoadEvent> {
        if completion.generation != self.generation {
            debug!(
                "Dropping stale {} result from generation {}",
                completion.kind.name(),
                completion.generation
            );
            return None;
        }
        self.pending = self.pending.saturating_sub(1);

        let kind = completion.kind;
        match completion.result {
            Ok(Fetched::UserModels(models)) => {
                let count = models.len();
                data.user_models = models;
                Some(LoadEvent::Loaded { kind, count })
            }
            Ok(Fetched::Teams(teams)) => {
                let count = teams.len();
                data.teams = Some(teams);
                Some(LoadEvent::Loaded { kind, count })
            }
            Ok(Fetched::Organizations(organizations)) => {
                let count = organizations.len();
                data.organizations = organizations;
                Some(LoadEvent::Loaded { kind, count })
            }
            Err(e) => {
                warn!("Failed to load {}: {e}", kind.name());
                let error = e.to_string();
                self.last_error = Some(error.clone());
                Some(LoadEvent::Failed { kind, error })
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl<S: ReferenceSource> Drop for ReferenceLoader<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeSource {
        model_calls: AtomicUsize,
        team_calls: AtomicUsize,
        org_calls: AtomicUsize,
        fail_teams: AtomicBool,
        gate: Option<Arc<Notify>>,
        finished: AtomicBool,
    }

    impl FakeSource {
        fn calls(&self) -> (usize, usize, usize) {
            (
                self.model_calls.load(Ordering::SeqCst),
                self.team_calls.load(Ordering::SeqCst),
                self.org_calls.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl ReferenceSource for FakeSource {
        async fn user_models(&self, _auth: &RequestAuth, user_id: &str, _role: UserRole) -> Result<Vec<String>> {
            self.model_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
                self.finished.store(true, Ordering::SeqCst);
            }
            Ok(vec![format!("model-for-{user_id}")])
        }

        async fn teams(&self, _auth: &RequestAuth, user_id: &str, _role: UserRole) -> Result<Vec<Team>> {
            self.team_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_teams.load(Ordering::SeqCst) {
                return Err(AppError::parse("teams unavailable"));
            }
            Ok(vec![Team {
                team_id: format!("team-of-{user_id}"),
                team_alias: None,
                organization_id: None,
                models: Vec::new(),
                spend: None,
                max_budget: None,
                blocked: false,
            }])
        }

        async fn organizations(&self, _auth: &RequestAuth) -> Result<Vec<Organization>> {
            self.org_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Organization {
                organization_id: "org-1".to_string(),
                organization_alias: None,
                models: Vec::new(),
                spend: None,
                budget_id: None,
            }])
        }
    }

    fn key(token: &str, user_id: &str, role: UserRole) -> Option<LoadKey> {
        LoadKey::from_parts(Some(RequestAuth::new(token, None)), Some(user_id), Some(role))
    }

    #[test]
    fn test_key_requires_all_parts() {
        let auth = Some(RequestAuth::new("sk-1", None));
        assert!(LoadKey::from_parts(None, Some("u-1"), Some(UserRole::Admin)).is_none());
        assert!(LoadKey::from_parts(auth.clone(), None, Some(UserRole::Admin)).is_none());
        assert!(LoadKey::from_parts(auth.clone(), Some(""), Some(UserRole::Admin)).is_none());
        assert!(LoadKey::from_parts(auth.clone(), Some("u-1"), None).is_none());
        assert!(LoadKey::from_parts(Some(RequestAuth::new("", None)), Some("u-1"), Some(UserRole::Admin)).is_none());
        assert!(LoadKey::from_parts(auth.clone(), Some("u-1"), Some(UserRole::Undefined)).is_none());
        assert!(LoadKey::from_parts(auth, Some("u-1"), Some(UserRole::Admin)).is_some());
    }

    #[tokio::test]
    async fn test_cancel_discards_queued_completions() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::AppUser));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(source.calls(), (1, 1, 1));

        loader.cancel();
        assert!(loader.poll(&mut data).is_empty());
        assert_eq!(data, ReferenceData::default());
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_invalidate_discards_queued_completions() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::AppUser));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let generation = loader.generation();

        loader.invalidate();
        assert!(loader.generation() > generation);
        assert!(loader.poll(&mut data).is_empty());
        assert!(data.user_models.is_empty());
        assert!(data.teams.is_none());
    }

    #[tokio::test]
    async fn test_no_fetch_without_identity() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));

        assert!(!loader.sync(&Handle::current(), None));
        let mut data = ReferenceData::default();
        loader.settle(&mut data).await;

        assert_eq!(source.calls(), (0, 0, 0));
        assert_eq!(data, ReferenceData::default());
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_fetches_all_three_once() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        assert!(loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::InternalUser)));
        assert!(loader.is_loading());
        let events = loader.settle(&mut data).await;

        assert_eq!(events.len(), 3);
        assert_eq!(source.calls(), (1, 1, 1));
        assert_eq!(data.user_models, vec!["model-for-u-1".to_string()]);
        assert_eq!(data.teams.as_ref().map(Vec::len), Some(1));
        assert_eq!(data.organizations.len(), 1);
        assert_eq!(data.keys, None);

        // Same identity does not re-trigger
        assert!(!loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::InternalUser)));
        loader.settle(&mut data).await;
        assert_eq!(source.calls(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_any_dependency_change_refetches_all() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::InternalUser));
        loader.settle(&mut data).await;

        assert!(loader.sync(&Handle::current(), key("sk-1", "u-2", UserRole::InternalUser)));
        loader.settle(&mut data).await;
        assert_eq!(source.calls(), (2, 2, 2));
        assert_eq!(data.teams.as_ref().unwrap()[0].team_id, "team-of-u-2");

        assert!(loader.sync(&Handle::current(), key("sk-2", "u-2", UserRole::InternalUser)));
        loader.settle(&mut data).await;
        assert_eq!(source.calls(), (3, 3, 3));

        assert!(loader.sync(&Handle::current(), key("sk-2", "u-2", UserRole::Admin)));
        loader.settle(&mut data).await;
        assert_eq!(source.calls(), (4, 4, 4));
        assert_eq!(loader.generation(), 4);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::Admin));
        loader.settle(&mut data).await;
        let generation = loader.generation();

        loader.invalidate();
        assert!(loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::Admin)));
        loader.settle(&mut data).await;
        assert_eq!(source.calls(), (2, 2, 2));
        assert_eq!(loader.generation(), generation + 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_collection() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::AppUser));
        loader.settle(&mut data).await;
        assert!(data.teams.is_some());

        source.fail_teams.store(true, Ordering::SeqCst);
        loader.sync(&Handle::current(), key("sk-1", "u-9", UserRole::AppUser));
        let events = loader.settle(&mut data).await;

        assert!(events.iter().any(|event| matches!(
            event,
            LoadEvent::Failed { kind: FetchKind::Teams, .. }
        )));
        assert_eq!(data.teams.as_ref().unwrap()[0].team_id, "team-of-u-1");
        assert_eq!(data.user_models, vec!["model-for-u-9".to_string()]);
        assert!(loader.last_error().unwrap().contains("teams unavailable"));
    }

    #[tokio::test]
    async fn test_stale_generation_is_dropped() {
        let source = Arc::new(FakeSource::default());
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::AppUser));
        loader.settle(&mut data).await;

        loader
            .tx
            .send(Completion {
                generation: loader.generation() - 1,
                kind: FetchKind::UserModels,
                result: Ok(Fetched::UserModels(vec!["stale".to_string()])),
            })
            .unwrap();

        assert!(loader.poll(&mut data).is_empty());
        assert_eq!(data.user_models, vec!["model-for-u-1".to_string()]);
    }

    #[tokio::test]
    async fn test_drop_aborts_in_flight_fetches() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(FakeSource {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });

        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::AppUser));
        tokio::task::yield_now().await;
        drop(loader);

        gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!source.finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_clearing_identity_cancels() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(FakeSource {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let mut loader = ReferenceLoader::new(Arc::clone(&source));
        let mut data = ReferenceData::default();

        loader.sync(&Handle::current(), key("sk-1", "u-1", UserRole::AppUser));
        assert!(!loader.sync(&Handle::current(), None));
        assert!(!loader.is_loading());

        gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.poll(&mut data);
        assert!(data.user_models.is_empty());
    }
}
