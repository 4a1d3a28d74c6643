// Job listing entity

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::{SubResource, SubResourceKind};
use crate::core::PageId;
use crate::error::RemoteResult;
use crate::infrastructure::traits::PageRemote;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
    Volunteer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub page_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub experience_required: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub salary_range: Option<String>,
    pub experience_required: Option<String>,
    pub contact_email: Option<String>,
}

impl JobDraft {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            location: None,
            employment_type: EmploymentType::FullTime,
            salary_range: None,
            experience_required: None,
            contact_email: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl SubResource for Job {
    type Draft = JobDraft;
    type Patch = JobPatch;

    const KIND: SubResourceKind = SubResourceKind::Job;

    fn id(&self) -> &str {
        &self.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn speculative(temp_id: &str, page_id: &PageId, draft: &JobDraft) -> Self {
        Self {
            id: temp_id.to_string(),
            page_id: page_id.remote_id().to_string(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            location: draft.location.clone(),
            employment_type: draft.employment_type,
            salary_range: draft.salary_range.clone(),
            experience_required: draft.experience_required.clone(),
            contact_email: draft.contact_email.clone(),
            created_at: Utc::now(),
        }
    }

    fn apply_patch(&mut self, patch: &JobPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if patch.location.is_some() {
            self.location = patch.location.clone();
        }
        if let Some(employment_type) = patch.employment_type {
            self.employment_type = employment_type;
        }
        if patch.salary_range.is_some() {
            self.salary_range = patch.salary_range.clone();
        }
        if patch.experience_required.is_some() {
            self.experience_required = patch.experience_required.clone();
        }
        if patch.contact_email.is_some() {
            self.contact_email = patch.contact_email.clone();
        }
    }

    fn remote_list<'a>(remote: &'a dyn PageRemote, page_id: &'a PageId) -> BoxFuture<'a, RemoteResult<Vec<Self>>> {
        remote.list_jobs(page_id)
    }

    fn remote_create<'a>(
        remote: &'a dyn PageRemote,
        page_id: &'a PageId,
        draft: &'a JobDraft,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.create_job(page_id, draft)
    }

    fn remote_update<'a>(
        remote: &'a dyn PageRemote,
        id: &'a str,
        patch: &'a JobPatch,
    ) -> BoxFuture<'a, RemoteResult<Self>> {
        remote.update_job(id, patch)
    }

    fn remote_delete<'a>(remote: &'a dyn PageRemote, id: &'a str) -> BoxFuture<'a, RemoteResult<()>> {
        remote.delete_job(id)
    }
}
