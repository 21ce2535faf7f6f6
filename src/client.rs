//! Proxy management API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, cookie::Jar};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::key::KeyListResponse;
use crate::models::{ApiKey, ModelList, Organization, ProxySettings, Team, UiSettingsResponse};
use crate::session::UserRole;

/// Header used for bearer credentials unless the session or config names another.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// Credentials passed explicitly to every authenticated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAuth {
    pub header_name: String,
    pub access_token: String,
}

impl RequestAuth {
    /// Build credentials, using [`DEFAULT_AUTH_HEADER`] when no name is given.
    pub fn new(access_token: impl Into<String>, header_name: Option<&str>) -> Self {
        Self {
            header_name: header_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_AUTH_HEADER)
                .to_string(),
            access_token: access_token.into(),
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(self.header_name.as_str(), format!("Bearer {}", self.access_token))
    }
}

/// HTTP client for the proxy's management endpoints.
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The proxy URL (e.g., "http://localhost:4000")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AppError::validation("proxy URL is empty"));
        }
        url::Url::parse(base_url)?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder().cookie_provider(jar).timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{base}/{path}", base = self.base_url)
    }

    /// Send `request` and decode a JSON body, mapping non-2xx to [`AppError::Status`].
    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AppError::parse(format!("Unexpected body from {url}: {e}")))
    }

    /// Models the user may call.
    pub async fn user_models(&self, auth: &RequestAuth, user_id: &str, role: UserRole) -> Result<Vec<String>> {
        let url = self.endpoint("models");
        debug!("Fetching models for {user_id} ({role})");

        let list: ModelList = self.fetch_json(auth.apply(self.client.get(&url)), &url).await?;
        Ok(list.into_ids())
    }

    /// Teams visible to the user. Admin roles see every team.
    pub async fn teams(&self, auth: &RequestAuth, user_id: &str, role: UserRole) -> Result<Vec<Team>> {
        let url = self.endpoint("team/list");
        let mut request = auth.apply(self.client.get(&url));
        if !role.is_admin() {
            request = request.query(&[("user_id", user_id)]);
        }

        self.fetch_json(request, &url).await
    }

    /// Every organization on the proxy.
    pub async fn organizations(&self, auth: &RequestAuth) -> Result<Vec<Organization>> {
        let url = self.endpoint("organization/list");
        self.fetch_json(auth.apply(self.client.get(&url)), &url).await
    }

    /// Virtual keys owned by `user_id`, or all keys for admin roles.
    pub async fn keys(&self, auth: &RequestAuth, user_id: Option<&str>, role: UserRole) -> Result<Vec<ApiKey>> {
        let url = self.endpoint("key/list");
        let mut request = auth
            .apply(self.client.get(&url))
            .query(&[("return_full_object", "true")]);
        if let Some(user_id) = user_id.filter(|_| !role.is_admin()) {
            request = request.query(&[("user_id", user_id)]);
        }

        let response: KeyListResponse = self.fetch_json(request, &url).await?;
        Ok(response.keys)
    }

    /// Proxy base and logout URLs as the proxy advertises them.
    pub async fn ui_settings(&self, fallback: &ProxySettings) -> Result<ProxySettings> {
        let url = self.endpoint("sso/get/ui_settings");
        let response: UiSettingsResponse = self.fetch_json(self.client.get(&url), &url).await?;
        Ok(response.into_settings(fallback))
    }

    /// Test connection to the proxy.
    pub async fn test_connection(&self) -> Result<bool> {
        let url = self.endpoint("health/liveliness");
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ProxyClient {
        ProxyClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_auth_header_name() {
        assert_eq!(RequestAuth::new("sk-1", None).header_name, "Authorization");
        assert_eq!(RequestAuth::new("sk-1", Some(" ")).header_name, "Authorization");
        assert_eq!(RequestAuth::new("sk-1", Some("x-gateway-key")).header_name, "x-gateway-key");
    }

    #[test]
    fn test_rejects_empty_base_url() {
        assert!(matches!(
            ProxyClient::new("  ", Duration::from_secs(1)),
            Err(AppError::Validation(_))
        ));
        assert!(ProxyClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_user_models_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("Authorization", "Bearer sk-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "gpt-4o"}, {"id": "claude-sonnet"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let auth = RequestAuth::new("sk-1", None);
        let models = client.user_models(&auth, "u-1", UserRole::InternalUser).await.unwrap();
        assert_eq!(models, vec!["gpt-4o".to_string(), "claude-sonnet".to_string()]);
    }

    #[tokio::test]
    async fn test_custom_header_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organization/list"))
            .and(header("x-gateway-key", "Bearer sk-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"organization_id": "org-1", "organization_alias": "Acme"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let auth = RequestAuth::new("sk-2", Some("x-gateway-key"));
        let orgs = client.organizations(&auth).await.unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].display_name(), "Acme");
    }

    #[tokio::test]
    async fn test_teams_filtered_for_non_admin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team/list"))
            .and(query_param("user_id", "u-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"team_id": "t-7"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let auth = RequestAuth::new("sk-1", None);
        let teams = client.teams(&auth, "u-7", UserRole::InternalUser).await.unwrap();
        assert_eq!(teams[0].team_id, "t-7");
    }

    #[tokio::test]
    async fn test_teams_unfiltered_for_admin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"team_id": "t-1"}, {"team_id": "t-2"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let auth = RequestAuth::new("sk-1", None);
        let teams = client.teams(&auth, "u-1", UserRole::Admin).await.unwrap();
        assert_eq!(teams.len(), 2);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.query().is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let auth = RequestAuth::new("bad", None);
        let err = client.user_models(&auth, "u-1", UserRole::AppUser).await.unwrap_err();
        match err {
            AppError::Status { status, url } => {
                assert_eq!(status.as_u16(), 401);
                assert!(url.ends_with("/models"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organization/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.organizations(&RequestAuth::new("sk", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_keys_request_full_objects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/key/list"))
            .and(query_param("return_full_object", "true"))
            .and(query_param("user_id", "u-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [{"token": "hashed", "key_alias": "ci", "spend": 1.5}],
                "total_count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let keys = client
            .keys(&RequestAuth::new("sk", None), Some("u-3"), UserRole::InternalUser)
            .await
            .unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].display_name(), "ci");
    }

    #[tokio::test]
    async fn test_ui_settings_and_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sso/get/ui_settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "PROXY_BASE_URL": "https://gw.example.com",
                "PROXY_LOGOUT_URL": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health/liveliness"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\"I'm alive!\""))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let fallback = ProxySettings {
            base_url: server.uri(),
            logout_url: "https://sso.example.com/logout".to_string(),
        };
        let settings = client.ui_settings(&fallback).await.unwrap();
        assert_eq!(settings.base_url, "https://gw.example.com");
        assert_eq!(settings.logout_url, "https://sso.example.com/logout");
        assert!(client.test_connection().await.unwrap());
    }
}
