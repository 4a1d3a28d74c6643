// Entities - the page root and the sub-resources scoped to it

pub mod achievement;
pub mod job;
pub mod member;
pub mod page;
pub mod post;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::fmt;

use crate::core::PageId;
use crate::error::RemoteResult;
use crate::infrastructure::traits::PageRemote;

pub use achievement::{Achievement, AchievementDraft, AchievementPatch};
pub use job::{EmploymentType, Job, JobDraft, JobPatch};
pub use member::{Member, MemberDraft, MemberPatch, MemberRole, MemberStatus};
pub use page::{
    AcademyDetails, ClubDetails, CoachDetails, CommonFields, CommunityDetails, Page, PageDetails, PageDraft,
    PitchDetails, PlayerDetails, RemoteProfile, VenueDetails,
};
pub use post::{Post, PostCounters, PostDraft, PostPatch, Visibility};

/// The nested collections a page owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubResourceKind {
    Post,
    Job,
    Member,
    Achievement,
}

impl SubResourceKind {
    /// Remote collection path segment and list payload key
    pub fn collection(self) -> &'static str {
        match self {
            SubResourceKind::Post => "posts",
            SubResourceKind::Job => "jobs",
            SubResourceKind::Member => "members",
            SubResourceKind::Achievement => "achievements",
        }
    }

    /// Payload key of a single entity
    pub fn singular(self) -> &'static str {
        match self {
            SubResourceKind::Post => "post",
            SubResourceKind::Job => "job",
            SubResourceKind::Member => "member",
            SubResourceKind::Achievement => "achievement",
        }
    }
}

impl fmt::Display for SubResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// An entity scoped to exactly one page, with optimistic create/update support.
///
/// `page_id` is carried in its remote form (no local prefix) and never changes
/// after creation; patches cannot touch it.
pub trait SubResource: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    type Draft: Clone + fmt::Debug + Send + Sync + 'static;
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    const KIND: SubResourceKind;

    fn id(&self) -> &str;
    fn page_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;

    /// Local stand-in shown until the server confirms the create
    fn speculative(temp_id: &str, page_id: &PageId, draft: &Self::Draft) -> Self;

    fn apply_patch(&mut self, patch: &Self::Patch);

    fn remote_list<'a>(remote: &'a dyn PageRemote, page_id: &'a PageId) -> BoxFuture<'a, RemoteResult<Vec<Self>>>;

    fn remote_create<'a>(
        remote: &'a dyn PageRemote,
        page_id: &'a PageId,
        draft: &'a Self::Draft,
    ) -> BoxFuture<'a, RemoteResult<Self>>;

    fn remote_update<'a>(
        remote: &'a dyn PageRemote,
        id: &'a str,
        patch: &'a Self::Patch,
    ) -> BoxFuture<'a, RemoteResult<Self>>;

    fn remote_delete<'a>(remote: &'a dyn PageRemote, id: &'a str) -> BoxFuture<'a, RemoteResult<()>>;
}
