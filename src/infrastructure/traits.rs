use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::core::PageId;
use crate::ent_schema::FieldMap;
use crate::entities::{
    Achievement, AchievementDraft, AchievementPatch, Job, JobDraft, JobPatch, Member, MemberDraft, MemberPatch,
    PageDraft, Post, PostDraft, PostPatch, RemoteProfile,
};
use crate::error::{AppResult, RemoteResult};
use crate::infrastructure::snapshot::CacheSnapshot;

/// The remote page service, one method per (collection, operation).
///
/// Implementations strip the local id prefix before building remote paths and
/// report expected failures as `RemoteError`, never by panicking.
#[async_trait]
pub trait PageRemote: Send + Sync {
    async fn fetch_page(&self, id: &PageId) -> RemoteResult<RemoteProfile>;
    /// Returns the updated profile when the service echoes it back
    async fn save_page(&self, id: &PageId, partial: &FieldMap) -> RemoteResult<Option<RemoteProfile>>;
    async fn list_pages(&self) -> RemoteResult<Vec<RemoteProfile>>;
    async fn create_page(&self, draft: &PageDraft) -> RemoteResult<RemoteProfile>;

    async fn list_posts(&self, page_id: &PageId) -> RemoteResult<Vec<Post>>;
    async fn create_post(&self, page_id: &PageId, draft: &PostDraft) -> RemoteResult<Post>;
    async fn update_post(&self, id: &str, patch: &PostPatch) -> RemoteResult<Post>;
    async fn delete_post(&self, id: &str) -> RemoteResult<()>;

    async fn list_jobs(&self, page_id: &PageId) -> RemoteResult<Vec<Job>>;
    async fn create_job(&self, page_id: &PageId, draft: &JobDraft) -> RemoteResult<Job>;
    async fn update_job(&self, id: &str, patch: &JobPatch) -> RemoteResult<Job>;
    async fn delete_job(&self, id: &str) -> RemoteResult<()>;

    async fn list_members(&self, page_id: &PageId) -> RemoteResult<Vec<Member>>;
    async fn create_member(&self, page_id: &PageId, draft: &MemberDraft) -> RemoteResult<Member>;
    async fn update_member(&self, id: &str, patch: &MemberPatch) -> RemoteResult<Member>;
    async fn delete_member(&self, id: &str) -> RemoteResult<()>;

    async fn list_achievements(&self, page_id: &PageId) -> RemoteResult<Vec<Achievement>>;
    async fn create_achievement(&self, page_id: &PageId, draft: &AchievementDraft) -> RemoteResult<Achievement>;
    async fn update_achievement(&self, id: &str, patch: &AchievementPatch) -> RemoteResult<Achievement>;
    async fn delete_achievement(&self, id: &str) -> RemoteResult<()>;
}

/// Persistent key-value storage for page snapshots (the L2 behind the cache)
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    async fn load(&self, page_id: &PageId) -> AppResult<Option<CacheSnapshot>>;
    async fn store(&self, page_id: &PageId, snapshot: &CacheSnapshot) -> AppResult<()>;
    async fn remove(&self, page_id: &PageId) -> AppResult<()>;
}

/// Session provider: supplies the bearer credential for each remote call
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed credential, or none
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-visible summary routed to the toast surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Toast/notification surface
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default notifier: routes notices to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(target: "notice", "{}", notice.message),
            NoticeLevel::Warning => warn!(target: "notice", "{}", notice.message),
            NoticeLevel::Error => error!(target: "notice", "{}", notice.message),
        }
    }
}

/// Router that receives the resolved view name when an identity is switched
pub trait Navigator: Send + Sync {
    fn navigate(&self, view: &str, page_id: &PageId);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _view: &str, _page_id: &PageId) {}
}
