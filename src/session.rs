use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignUpOutcome {
    SessionIssued,
    // The service wants the address verified before issuing a session; the
    // user signs in after following the emailed link.
    ConfirmationRequired,
}

/// Client of the hosted session service. Data operations resolve the active
/// identity through this seam; auth screens forward credentials through it.
/// Failure messages are the service's own wording, surfaced verbatim.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn current_user(&self) -> Option<AuthUser>;

    async fn current_user_id(&self) -> Option<String> {
        self.current_user().await.map(|user| user.id)
    }

    async fn access_token(&self) -> Option<String>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, String>;

    async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, String>;

    async fn sign_out(&self);
}

/// Extracts the service-reported message from an error response body, falling
/// back to the HTTP status when the body carries none.
pub fn service_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                if !message.trim().is_empty() {
                    return message.trim().to_string();
                }
            }
        }
    }
    format!("auth service error (http {status})")
}

/// Pulls `(access_token, user)` out of a session-bearing response. Returns
/// `None` when the payload has no token (e.g. signup pending confirmation).
pub fn parse_session_payload(value: &Value) -> Option<(String, AuthUser)> {
    let token = value.get("access_token").and_then(|v| v.as_str())?;
    let user = value.get("user")?;
    let id = user.get("id").and_then(|v| v.as_str())?;
    let email = user
        .get("email")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let full_name = user
        .get("user_metadata")
        .and_then(|m| m.get("full_name"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Some((
        token.to_string(),
        AuthUser {
            id: id.to_string(),
            email: email.to_string(),
            full_name,
        },
    ))
}

pub fn auth_endpoint(base_url: &str, path: &str) -> String {
    format!("{}/auth/v1/{}", base_url.trim_end_matches('/'), path)
}

#[cfg(all(feature = "app", not(test)))]
pub use http::HttpSessionService;

#[cfg(all(feature = "app", not(test)))]
mod http {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::{
        auth_endpoint, parse_session_payload, service_error_message, AuthUser, SessionService,
        SignUpOutcome,
    };

    struct StoredSession {
        access_token: String,
        user: AuthUser,
    }

    pub struct HttpSessionService {
        base_url: String,
        anon_key: String,
        client: reqwest::Client,
        session: Mutex<Option<StoredSession>>,
    }

    impl HttpSessionService {
        pub fn new(base_url: &str, anon_key: &str) -> Result<Self, String> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|err| format!("failed to build http client: {err}"))?;
            Ok(Self {
                base_url: base_url.to_string(),
                anon_key: anon_key.to_string(),
                client,
                session: Mutex::new(None),
            })
        }

        async fn post_auth(&self, path: &str, payload: &Value) -> Result<Value, String> {
            let resp = self
                .client
                .post(auth_endpoint(&self.base_url, path))
                .header("apikey", &self.anon_key)
                .json(payload)
                .send()
                .await
                .map_err(|err| format!("auth request failed: {err}"))?;

            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|err| format!("failed to read auth response: {err}"))?;

            if !status.is_success() {
                return Err(service_error_message(status.as_u16(), &text));
            }
            serde_json::from_str(&text).map_err(|err| format!("invalid auth json: {err}"))
        }

        fn store_session(&self, token: String, user: AuthUser) {
            let mut guard = self.session.lock().expect("session poisoned");
            *guard = Some(StoredSession {
                access_token: token,
                user,
            });
        }
    }

    #[async_trait]
    impl SessionService for HttpSessionService {
        async fn current_user(&self) -> Option<AuthUser> {
            let guard = self.session.lock().expect("session poisoned");
            guard.as_ref().map(|s| s.user.clone())
        }

        async fn access_token(&self) -> Option<String> {
            let guard = self.session.lock().expect("session poisoned");
            guard.as_ref().map(|s| s.access_token.clone())
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, String> {
            let payload = serde_json::json!({ "email": email, "password": password });
            let value = self
                .post_auth("token?grant_type=password", &payload)
                .await?;
            let (token, user) = parse_session_payload(&value)
                .ok_or_else(|| "auth response carried no session".to_string())?;
            self.store_session(token, user.clone());
            Ok(user)
        }

        async fn sign_up(
            &self,
            full_name: &str,
            email: &str,
            password: &str,
        ) -> Result<SignUpOutcome, String> {
            let payload = serde_json::json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name }
            });
            let value = self.post_auth("signup", &payload).await?;
            match parse_session_payload(&value) {
                Some((token, user)) => {
                    self.store_session(token, user);
                    Ok(SignUpOutcome::SessionIssued)
                }
                None => Ok(SignUpOutcome::ConfirmationRequired),
            }
        }

        async fn sign_out(&self) {
            let token = {
                let mut guard = self.session.lock().expect("session poisoned");
                guard.take().map(|s| s.access_token)
            };
            let Some(token) = token else { return };

            // The local session is gone either way; a failed revocation only
            // leaves the token to expire server-side.
            let result = self
                .client
                .post(auth_endpoint(&self.base_url, "logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send()
                .await;
            if let Err(err) = result {
                log::warn!("sign-out revocation failed: {err}");
            }
        }
    }
}
