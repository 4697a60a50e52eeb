use async_trait::async_trait;

use crate::models::Task;

/// Adapter over the hosted task store. Every operation resolves the active
/// identity first; without a session the operation is abandoned and the
/// failure sentinel returned. Errors never surface to callers — diagnostics
/// go to the operational log only.
#[async_trait]
pub trait TaskRemote: Send + Sync {
    /// Inserts a record tagged with the resolved identity. Returns the
    /// store-confirmed row (its id may differ from the client-minted one).
    async fn create(&self, task: &Task) -> Option<Task>;

    async fn update(&self, task_id: &str, title: &str, details: &str) -> bool;

    async fn delete(&self, task_id: &str) -> bool;

    /// Writes the negation of the caller-supplied status and returns the new
    /// status. The caller's view of `current_status` may be stale; whichever
    /// write lands last wins remotely.
    async fn toggle_completion(&self, task_id: &str, current_status: bool) -> Option<bool>;
}

pub fn todos_endpoint(base_url: &str) -> String {
    format!("{}/rest/v1/todos", base_url.trim_end_matches('/'))
}

// Row scoping: id AND owning identity. The user_id equality filter is the
// sole access-control mechanism on the data path.
pub fn row_filter(task_id: &str, user_id: &str) -> String {
    format!("id=eq.{task_id}&user_id=eq.{user_id}")
}

#[cfg(all(feature = "app", not(test)))]
pub use http::HttpTaskRemote;

#[cfg(all(feature = "app", not(test)))]
mod http {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{row_filter, todos_endpoint, TaskRemote};
    use crate::models::Task;
    use crate::session::SessionService;

    pub struct HttpTaskRemote {
        base_url: String,
        anon_key: String,
        client: reqwest::Client,
        session: Arc<dyn SessionService>,
    }

    impl HttpTaskRemote {
        pub fn new(
            base_url: &str,
            anon_key: &str,
            session: Arc<dyn SessionService>,
        ) -> Result<Self, String> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|err| format!("failed to build http client: {err}"))?;
            Ok(Self {
                base_url: base_url.to_string(),
                anon_key: anon_key.to_string(),
                client,
                session,
            })
        }

        async fn resolve_user_id(&self, operation: &str) -> Option<String> {
            match self.session.current_user_id().await {
                Some(id) => Some(id),
                None => {
                    log::error!("no authenticated session; {operation} abandoned");
                    None
                }
            }
        }

        async fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
            let token = self.session.access_token().await.unwrap_or_default();
            builder.header("apikey", &self.anon_key).bearer_auth(token)
        }

        fn row_url(&self, task_id: &str, user_id: &str) -> String {
            format!(
                "{}?{}",
                todos_endpoint(&self.base_url),
                row_filter(task_id, user_id)
            )
        }

        /// Sends a scoped mutation and reduces the outcome to success/failure.
        async fn send_scoped(&self, operation: &str, builder: reqwest::RequestBuilder) -> bool {
            match builder.send().await {
                Ok(resp) if resp.status().is_success() => true,
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    log::error!("{operation} rejected: http {status}: {body}");
                    false
                }
                Err(err) => {
                    log::error!("{operation} request failed: {err}");
                    false
                }
            }
        }
    }

    #[async_trait]
    impl TaskRemote for HttpTaskRemote {
        async fn create(&self, task: &Task) -> Option<Task> {
            let user_id = self.resolve_user_id("task create").await?;
            let mut row = task.clone();
            row.user_id = user_id;

            let request = self
                .authed(self.client.post(todos_endpoint(&self.base_url)))
                .await
                .header("Prefer", "return=representation")
                .json(&vec![row]);

            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<Vec<Task>>().await {
                        Ok(rows) => {
                            let confirmed = rows.into_iter().next();
                            if confirmed.is_none() {
                                log::error!("task create returned no rows");
                            }
                            confirmed
                        }
                        Err(err) => {
                            log::error!("task create returned invalid rows: {err}");
                            None
                        }
                    }
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    log::error!("task create rejected: http {status}: {body}");
                    None
                }
                Err(err) => {
                    log::error!("task create request failed: {err}");
                    None
                }
            }
        }

        async fn update(&self, task_id: &str, title: &str, details: &str) -> bool {
            let Some(user_id) = self.resolve_user_id("task update").await else {
                return false;
            };
            let request = self
                .authed(self.client.patch(self.row_url(task_id, &user_id)))
                .await
                .json(&serde_json::json!({ "title": title, "details": details }));
            self.send_scoped("task update", request).await
        }

        async fn delete(&self, task_id: &str) -> bool {
            let Some(user_id) = self.resolve_user_id("task delete").await else {
                return false;
            };
            let request = self
                .authed(self.client.delete(self.row_url(task_id, &user_id)))
                .await;
            self.send_scoped("task delete", request).await
        }

        async fn toggle_completion(&self, task_id: &str, current_status: bool) -> Option<bool> {
            let user_id = self.resolve_user_id("completion toggle").await?;
            let new_status = !current_status;
            let request = self
                .authed(self.client.patch(self.row_url(task_id, &user_id)))
                .await
                .json(&serde_json::json!({ "completed": new_status }));
            if self.send_scoped("completion toggle", request).await {
                Some(new_status)
            } else {
                None
            }
        }
    }
}
