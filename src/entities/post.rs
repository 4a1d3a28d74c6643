// Post entity

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::{SubResource, SubResourceKind};
use crate::core::PageId;
use crate::error::RemoteResult;
use crate::infrastructure::traits::PageRemote;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Followers,
    Private,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCounters {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub page_id: String,
    pub content: String,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub counters: PostCounters,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub content: String,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl PostDraft {
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            media: Vec::new(),
            visibility: Visibility::Public,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl SubResource for Post {
    type Draft = PostDraft;
    type Patch = PostPatch;

    const KIND: SubResourceKind = SubResourceKind::Post;

    fn id(&self) -> &str {
        &self.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn speculative(temp_id: &str, page_id: &PageId, draft: &PostDraft) -> Self {
        Self {
            id: temp_id.to_string(),
            page_id: page_id.remote_id().to_string(),
            content: draft.content.clone(),
            media: draft.media.clone(),
            visibility: draft.visibility,
            counters: PostCounters::default(),
            created_at: Utc::now(),
        }
    }

    fn apply_patch(&mut self, patch: &PostPatch) {
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(media) = &patch.media {
            self.media = media.clone();
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
    }

    fn remote_list<'a>(remote: &'a dyn PageRemote, page_id: &'a PageId) -> BoxFuture<'a, RemoteResult<Vec<Self>>> {
        remote.list_posts(page_id)
    }

    fn remote_create<'a>(
        remote: &'a dyn PageRemote,
        page_id: &'a PageId,
        draft: &'a PostDraft,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.create_post(page_id, draft)
    }

    fn remote_update<'a>(
        remote: &'a dyn PageRemote,
        id: &'a str,
        patch: &'a PostPatch,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.update_post(id, patch)
    }

    fn remote_delete<'a>(remote: &'a dyn PageRemote, id: &'a str) -> BoxFuture<'a, RemoteResult<()>> {
        remote.delete_post(id)
    }
}
