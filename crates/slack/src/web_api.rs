use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, warn};

use kudos_core::config::SlackConfig;
use kudos_core::domain::member::{MemberId, MemberProfile};
use kudos_core::recipients::{DirectoryError, MemberDirectory};

use crate::gateway::{BotIdentity, ChatGateway, GatewayError};

const AUTH_ERRORS: &[&str] = &["invalid_auth", "not_authed", "account_inactive", "token_revoked"];

/// [`ChatGateway`] backed by the Slack Web API.
#[derive(Clone)]
pub struct SlackWebApi {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackWebApi {
    pub fn new(config: &SlackConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    /// Who the token belongs to. Fails with `AuthInvalid` on a dead token.
    pub async fn bot_identity(&self) -> Result<BotIdentity, GatewayError> {
        let payload = self.post("auth.test", json!({})).await?;
        let id = string_field(&payload, "user_id")
            .ok_or_else(|| missing_field("auth.test", "user_id"))?;
        let name = string_field(&payload, "user").unwrap_or_else(|| id.clone());

        Ok(BotIdentity { id: MemberId::new(&id), name })
    }

    pub async fn user_info(&self, member: &MemberId) -> Result<MemberProfile, GatewayError> {
        let url = format!("{}/users.info", self.base_url);
        let request = self
            .client
            .get(url)
            .bearer_auth(self.bot_token.expose_secret())
            .query(&[("user", member.as_str())]);
        let payload = self.send("users.info", request).await?;

        let user = payload.get("user").ok_or_else(|| missing_field("users.info", "user"))?;
        if user.get("deleted").and_then(Value::as_bool).unwrap_or(false) {
            return Err(GatewayError::Api {
                method: "users.info".to_string(),
                error: "user_deleted".to_string(),
            });
        }

        let id = string_field(user, "id").unwrap_or_else(|| member.as_str().to_string());
        Ok(MemberProfile { id: MemberId::new(&id), display_name: display_name(user) })
    }

    async fn post(&self, method: &'static str, body: Value) -> Result<Value, GatewayError> {
        let url = format!("{}/{method}", self.base_url);
        let request = self.client.post(url).bearer_auth(self.bot_token.expose_secret()).json(&body);
        self.send(method, request).await
    }

    async fn send(
        &self,
        method: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, GatewayError> {
        let response =
            request.send().await.map_err(|error| GatewayError::Transport(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!(event_name = "slack.api.http_error", method, status = %status, "slack api call failed");
            return Err(GatewayError::Transport(format!("`{method}` returned HTTP {status}")));
        }

        let payload: Value =
            response.json().await.map_err(|error| GatewayError::Transport(error.to_string()))?;
        check_envelope(method, payload)
    }
}

fn check_envelope(method: &str, payload: Value) -> Result<Value, GatewayError> {
    if payload.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        debug!(event_name = "slack.api.ok", method, "slack api call succeeded");
        return Ok(payload);
    }

    let error = string_field(&payload, "error").unwrap_or_else(|| "unknown_error".to_string());
    if AUTH_ERRORS.contains(&error.as_str()) {
        return Err(GatewayError::AuthInvalid(error));
    }

    Err(GatewayError::Api { method: method.to_string(), error })
}

fn display_name(user: &Value) -> String {
    let profile = user.get("profile");
    let candidates = [
        profile.and_then(|profile| string_field(profile, "display_name")),
        profile.and_then(|profile| string_field(profile, "real_name")),
        string_field(user, "real_name"),
        string_field(user, "name"),
    ];

    candidates.into_iter().flatten().find(|name| !name.trim().is_empty()).unwrap_or_default()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn missing_field(method: &str, field: &str) -> GatewayError {
    GatewayError::Api { method: method.to_string(), error: format!("response missing `{field}`") }
}

#[async_trait]
impl MemberDirectory for SlackWebApi {
    async fn lookup_member(&self, member: &MemberId) -> Result<MemberProfile, DirectoryError> {
        self.user_info(member).await.map_err(|error| DirectoryError(error.to_string()))
    }
}

#[async_trait]
impl ChatGateway for SlackWebApi {
    async fn send_channel_message(&self, channel_id: &str, text: &str) -> Result<(), GatewayError> {
        self.post("chat.postMessage", json!({ "channel": channel_id, "text": text })).await?;
        Ok(())
    }

    async fn send_private_reply(
        &self,
        channel_id: &str,
        member: &MemberId,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.post(
            "chat.postEphemeral",
            json!({ "channel": channel_id, "user": member.as_str(), "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_ts: &str,
        name: &str,
    ) -> Result<(), GatewayError> {
        self.post(
            "reactions.add",
            json!({ "channel": channel_id, "timestamp": message_ts, "name": name }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use kudos_core::config::SlackConfig;
    use kudos_core::domain::member::MemberId;
    use kudos_core::recipients::MemberDirectory;

    use super::SlackWebApi;
    use crate::gateway::{ChatGateway, GatewayError};

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}")
    }

    fn api(base_url: String) -> SlackWebApi {
        SlackWebApi::new(&SlackConfig {
            bot_token: "xoxb-test".to_string().into(),
            signing_secret: "secret".to_string().into(),
            api_base_url: base_url,
            timeout_secs: 5,
        })
        .expect("client")
    }

    async fn users_info(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        match params.get("user").map(String::as_str) {
            Some("U123") => Json(json!({
                "ok": true,
                "user": {
                    "id": "U123",
                    "name": "alice",
                    "real_name": "Alice Liddell",
                    "profile": { "display_name": "", "real_name": "Alice Liddell" }
                }
            })),
            Some("UGONE") => Json(json!({ "ok": true, "user": { "id": "UGONE", "deleted": true } })),
            _ => Json(json!({ "ok": false, "error": "user_not_found" })),
        }
    }

    #[tokio::test]
    async fn user_lookup_prefers_profile_names_and_rejects_unknowns() {
        let base_url = serve(Router::new().route("/users.info", get(users_info))).await;
        let api = api(base_url);

        let profile = api.lookup_member(&MemberId::new("u123")).await.expect("known user");
        assert_eq!(profile.id, MemberId::new("U123"));
        assert_eq!(profile.display_name, "Alice Liddell");

        assert!(api.lookup_member(&MemberId::new("UDUCK")).await.is_err());
        assert!(api.lookup_member(&MemberId::new("UGONE")).await.is_err());
    }

    #[tokio::test]
    async fn chat_calls_send_bearer_token_and_json_payloads() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route(
                "/chat.postEphemeral",
                post(|State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    captured.lock().expect("lock").push((auth, body));
                    Json(json!({ "ok": true, "message_ts": "1.0" }))
                }),
            )
            .route(
                "/reactions.add",
                post(|| async { Json(json!({ "ok": false, "error": "already_reacted" })) }),
            )
            .with_state(captured.clone());
        let api = api(serve(router).await);

        api.send_private_reply("C1", &MemberId::new("U123"), "hello")
            .await
            .expect("ephemeral reply");
        let error = api.add_reaction("C1", "1.0", "heart").await.expect_err("api error");

        let captured = captured.lock().expect("lock").clone();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0, "Bearer xoxb-test");
        assert_eq!(captured[0].1, json!({ "channel": "C1", "user": "U123", "text": "hello" }));
        assert_eq!(
            error,
            GatewayError::Api { method: "reactions.add".to_string(), error: "already_reacted".to_string() }
        );
    }

    #[tokio::test]
    async fn revoked_token_maps_to_auth_invalid() {
        let router = Router::new().route(
            "/auth.test",
            post(|| async { Json(json!({ "ok": false, "error": "token_revoked" })) }),
        );
        let api = api(serve(router).await);

        let error = api.bot_identity().await.expect_err("revoked");

        assert!(error.is_auth_invalid());
    }

    #[tokio::test]
    async fn auth_test_reports_bot_identity() {
        let router = Router::new().route(
            "/auth.test",
            post(|| async { Json(json!({ "ok": true, "user_id": "UBOT", "user": "kudosbot" })) }),
        );
        let api = api(serve(router).await);

        let identity = api.bot_identity().await.expect("identity");

        assert_eq!(identity.id, MemberId::new("UBOT"));
        assert_eq!(identity.name, "kudosbot");
    }
}
