// Achievement / experience entry for player and coach pages

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::{SubResource, SubResourceKind};
use crate::core::PageId;
use crate::error::RemoteResult;
use crate::infrastructure::traits::PageRemote;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub page_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    /// ISO date, e.g. "2021-08-01"
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDraft {
    pub title: String,
    pub description: Option<String>,
    pub organization: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl AchievementDraft {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            organization: None,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl SubResource for Achievement {
    type Draft = AchievementDraft;
    type Patch = AchievementPatch;

    const KIND: SubResourceKind = SubResourceKind::Achievement;

    fn id(&self) -> &str {
        &self.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn speculative(temp_id: &str, page_id: &PageId, draft: &AchievementDraft) -> Self {
        Self {
            id: temp_id.to_string(),
            page_id: page_id.remote_id().to_string(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            organization: draft.organization.clone(),
            start_date: draft.start_date.clone(),
            end_date: draft.end_date.clone(),
            created_at: Utc::now(),
        }
    }

    fn apply_patch(&mut self, patch: &AchievementPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if patch.description.is_some() {
            self.description = patch.description.clone();
        }
        if patch.organization.is_some() {
            self.organization = patch.organization.clone();
        }
        if patch.start_date.is_some() {
            self.start_date = patch.start_date.clone();
        }
        if patch.end_date.is_some() {
            self.end_date = patch.end_date.clone();
        }
    }

    fn remote_list<'a>(remote: &'a dyn PageRemote, page_id: &'a PageId) -> BoxFuture<'a, RemoteResult<Vec<Self>>> {
        remote.list_achievements(page_id)
    }

    fn remote_create<'a>(
        remote: &'a dyn PageRemote,
        page_id: &'a PageId,
        draft: &'a AchievementDraft,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.create_achievement(page_id, draft)
    }

    fn remote_update<'a>(
        remote: &'a dyn PageRemote,
        id: &'a str,
        patch: &'a AchievementPatch,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.update_achievement(id, patch)
    }

    fn remote_delete<'a>(remote: &'a dyn PageRemote, id: &'a str) -> BoxFuture<'a, RemoteResult<()>> {
        remote.delete_achievement(id)
    }
}
