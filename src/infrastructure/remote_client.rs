// Remote Client - typed HTTP wrapper over the page service's REST collections
// Every call strips the local id prefix, attaches the bearer credential and maps
// failures onto RemoteErrorKind. No caching, no state.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::RemoteConfig;
use crate::core::{strip_prefix, PageId};
use crate::ent_schema::FieldMap;
use crate::entities::{
    Achievement, AchievementDraft, AchievementPatch, Job, JobDraft, JobPatch, Member, MemberDraft, MemberPatch,
    PageDraft, Post, PostDraft, PostPatch, RemoteProfile, SubResourceKind,
};
use crate::error::{AppError, AppResult, RemoteError, RemoteErrorKind, RemoteResult};
use crate::infrastructure::traits::{CredentialProvider, PageRemote};

type Envelope = Map<String, Value>;

/// HTTP implementation of [`PageRemote`]
pub struct RemoteClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig, credentials: Arc<dyn CredentialProvider>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    #[instrument(skip(self, query, body), fields(base = %self.base_url))]
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> RemoteResult<Envelope> {
        let mut request = self.client.request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(token) = self.credentials.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(pair) = query {
            request = request.query(&[pair]);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::network(format!("{} {} failed: {}", method, path, e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::network(format!("{} {} body read failed: {}", method, path, e)))?;
        debug!("{} {} -> {}", method, path, status);

        if !status.is_success() {
            return Err(classify_status(status, &error_message(&text, status)));
        }
        parse_envelope(&text)
    }

    async fn list_in<T: DeserializeOwned>(&self, kind: SubResourceKind, page_id: &PageId) -> RemoteResult<Vec<T>> {
        let path = format!("/{}", kind.collection());
        let envelope = self
            .call(Method::GET, &path, Some(("page_id", page_id.remote_id())), None)
            .await?;
        take(envelope, kind.collection())
    }

    async fn create_in<D, T>(&self, kind: SubResourceKind, page_id: &PageId, draft: &D) -> RemoteResult<T>
    where
        D: Serialize + Sync,
        T: DeserializeOwned,
    {
        let mut body = encode(draft)?;
        if let Value::Object(map) = &mut body {
            map.insert("pageId".to_string(), Value::String(page_id.remote_id().to_string()));
        }
        let path = format!("/{}", kind.collection());
        let envelope = self.call(Method::POST, &path, None, Some(body)).await?;
        take(envelope, kind.singular())
    }

    async fn update_in<P, T>(&self, kind: SubResourceKind, id: &str, patch: &P) -> RemoteResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let path = format!("/{}/{}", kind.collection(), strip_prefix(id));
        let envelope = self.call(Method::PUT, &path, None, Some(encode(patch)?)).await?;
        take(envelope, kind.singular())
    }

    async fn delete_in(&self, kind: SubResourceKind, id: &str) -> RemoteResult<()> {
        let path = format!("/{}/{}", kind.collection(), strip_prefix(id));
        self.call(Method::DELETE, &path, None, None).await?;
        Ok(())
    }
}

/// Map a non-2xx status onto the remote error taxonomy
pub fn classify_status(status: StatusCode, message: &str) -> RemoteError {
    let kind = match status.as_u16() {
        404 => RemoteErrorKind::NotFound,
        400 | 422 => RemoteErrorKind::Validation,
        409 | 412 => RemoteErrorKind::Conflict,
        500..=599 => RemoteErrorKind::Network,
        _ => RemoteErrorKind::Unknown,
    };
    RemoteError::new(kind, message)
}

/// Classify a `success: false` envelope by its error text
pub fn classify_message(message: &str) -> RemoteErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("not found") {
        RemoteErrorKind::NotFound
    } else if lower.contains("conflict") || lower.contains("stale") {
        RemoteErrorKind::Conflict
    } else if lower.contains("invalid") || lower.contains("validation") {
        RemoteErrorKind::Validation
    } else {
        RemoteErrorKind::Unknown
    }
}

fn error_message(text: &str, status: StatusCode) -> String {
    let from_body = serde_json::from_str::<Value>(text).ok().and_then(|body| {
        body.get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_body {
        Some(message) => message,
        None if !text.trim().is_empty() => text.trim().to_string(),
        None => status.to_string(),
    }
}

fn parse_envelope(text: &str) -> RemoteResult<Envelope> {
    if text.trim().is_empty() {
        return Ok(Envelope::new());
    }
    let body: Value =
        serde_json::from_str(text).map_err(|e| RemoteError::unknown(format!("undecodable response: {}", e)))?;
    let Value::Object(envelope) = body else {
        return Err(RemoteError::unknown("response is not a JSON object"));
    };

    if envelope.get("success") == Some(&Value::Bool(false)) {
        let message = envelope
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(RemoteError::new(classify_message(&message), message));
    }
    Ok(envelope)
}

fn take<T: DeserializeOwned>(mut envelope: Envelope, key: &str) -> RemoteResult<T> {
    let value = envelope
        .remove(key)
        .ok_or_else(|| RemoteError::unknown(format!("response is missing `{}`", key)))?;
    serde_json::from_value(value).map_err(|e| RemoteError::unknown(format!("undecodable `{}` payload: {}", key, e)))
}

fn encode<B: Serialize>(body: &B) -> RemoteResult<Value> {
    serde_json::to_value(body).map_err(|e| RemoteError::unknown(format!("unencodable request body: {}", e)))
}

#[async_trait]
impl PageRemote for RemoteClient {
    async fn fetch_page(&self, id: &PageId) -> RemoteResult<RemoteProfile> {
        let path = format!("/profiles/{}", id.remote_id());
        let envelope = self.call(Method::GET, &path, None, None).await?;
        take(envelope, "profile")
    }

    async fn save_page(&self, id: &PageId, partial: &FieldMap) -> RemoteResult<Option<RemoteProfile>> {
        let path = format!("/profiles/{}", id.remote_id());
        let mut envelope = self.call(Method::PUT, &path, None, Some(encode(partial)?)).await?;
        match envelope.remove("profile") {
            None | Some(Value::Null) => Ok(None),
            Some(profile) => serde_json::from_value(profile)
                .map(Some)
                .map_err(|e| RemoteError::unknown(format!("undecodable `profile` payload: {}", e))),
        }
    }

    async fn list_pages(&self) -> RemoteResult<Vec<RemoteProfile>> {
        let envelope = self.call(Method::GET, "/profiles", None, None).await?;
        take(envelope, "profiles")
    }

    async fn create_page(&self, draft: &PageDraft) -> RemoteResult<RemoteProfile> {
        let envelope = self
            .call(Method::POST, "/profiles", None, Some(encode(draft)?))
            .await?;
        take(envelope, "profile")
    }

    async fn list_posts(&self, page_id: &PageId) -> RemoteResult<Vec<Post>> {
        self.list_in(SubResourceKind::Post, page_id).await
    }

    async fn create_post(&self, page_id: &PageId, draft: &PostDraft) -> RemoteResult<Post> {
        self.create_in(SubResourceKind::Post, page_id, draft).await
    }

    async fn update_post(&self, id: &str, patch: &PostPatch) -> RemoteResult<Post> {
        self.update_in(SubResourceKind::Post, id, patch).await
    }

    async fn delete_post(&self, id: &str) -> RemoteResult<()> {
        self.delete_in(SubResourceKind::Post, id).await
    }

    async fn list_jobs(&self, page_id: &PageId) -> RemoteResult<Vec<Job>> {
        self.list_in(SubResourceKind::Job, page_id).await
    }

    async fn create_job(&self, page_id: &PageId, draft: &JobDraft) -> RemoteResult<Job> {
        self.create_in(SubResourceKind::Job, page_id, draft).await
    }

    async fn update_job(&self, id: &str, patch: &JobPatch) -> RemoteResult<Job> {
        self.update_in(SubResourceKind::Job, id, patch).await
    }

    async fn delete_job(&self, id: &str) -> RemoteResult<()> {
        self.delete_in(SubResourceKind::Job, id).await
    }

    async fn list_members(&self, page_id: &PageId) -> RemoteResult<Vec<Member>> {
        self.list_in(SubResourceKind::Member, page_id).await
    }

    async fn create_member(&self, page_id: &PageId, draft: &MemberDraft) -> RemoteResult<Member> {
        self.create_in(SubResourceKind::Member, page_id, draft).await
    }

    async fn update_member(&self, id: &str, patch: &MemberPatch) -> RemoteResult<Member> {
        self.update_in(SubResourceKind::Member, id, patch).await
    }

    async fn delete_member(&self, id: &str) -> RemoteResult<()> {
        self.delete_in(SubResourceKind::Member, id).await
    }

    async fn list_achievements(&self, page_id: &PageId) -> RemoteResult<Vec<Achievement>> {
        self.list_in(SubResourceKind::Achievement, page_id).await
    }

    async fn create_achievement(&self, page_id: &PageId, draft: &AchievementDraft) -> RemoteResult<Achievement> {
        self.create_in(SubResourceKind::Achievement, page_id, draft).await
    }

    async fn update_achievement(&self, id: &str, patch: &AchievementPatch) -> RemoteResult<Achievement> {
        self.update_in(SubResourceKind::Achievement, id, patch).await
    }

    async fn delete_achievement(&self, id: &str) -> RemoteResult<()> {
        self.delete_in(SubResourceKind::Achievement, id).await
    }
}
