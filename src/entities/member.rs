// Member entity - a page's membership roster

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::{SubResource, SubResourceKind};
use crate::core::PageId;
use crate::error::RemoteResult;
use crate::infrastructure::traits::PageRemote;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Moderator,
    #[default]
    Member,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub page_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default)]
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    pub name: String,
    pub email: String,
    pub role: MemberRole,
}

impl MemberDraft {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            role: MemberRole::Member,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
}

impl MemberPatch {
    pub fn status(status: MemberStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl SubResource for Member {
    type Draft = MemberDraft;
    type Patch = MemberPatch;

    const KIND: SubResourceKind = SubResourceKind::Member;

    fn id(&self) -> &str {
        &self.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    fn speculative(temp_id: &str, page_id: &PageId, draft: &MemberDraft) -> Self {
        // New members wait for approval
        Self {
            id: temp_id.to_string(),
            page_id: page_id.remote_id().to_string(),
            name: draft.name.clone(),
            email: draft.email.clone(),
            role: draft.role,
            status: MemberStatus::Pending,
            joined_at: Utc::now(),
        }
    }

    fn apply_patch(&mut self, patch: &MemberPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    fn remote_list<'a>(remote: &'a dyn PageRemote, page_id: &'a PageId) -> BoxFuture<'a, RemoteResult<Vec<Self>>> {
        remote.list_members(page_id)
    }

    fn remote_create<'a>(
        remote: &'a dyn PageRemote,
        page_id: &'a PageId,
        draft: &'a MemberDraft,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.create_member(page_id, draft)
    }

    fn remote_update<'a>(
        remote: &'a dyn PageRemote,
        id: &'a str,
        patch: &'a MemberPatch,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.update_member(id, patch)
    }

    fn remote_delete<'a>(remote: &'a dyn PageRemote, id: &'a str) -> BoxFuture<'a, RemoteResult<()>> {
        remote.delete_member(id)
    }
}
