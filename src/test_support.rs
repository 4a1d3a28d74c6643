// Test doubles - in-memory page service with fault injection, plus recording collaborators

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::core::{strip_prefix, PageId};
use crate::ent_schema::FieldMap;
use crate::entities::{
    Achievement, AchievementDraft, AchievementPatch, Job, JobDraft, JobPatch, Member, MemberDraft, MemberPatch,
    PageDraft, Post, PostDraft, PostPatch, RemoteProfile, SubResource,
};
use crate::error::{RemoteError, RemoteResult};
use crate::infrastructure::traits::{Navigator, Notice, NoticeLevel, Notifier, PageRemote};

/// One call as the service received it
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub op: String,
    pub target: String,
    pub body: Value,
}

#[derive(Default)]
struct RemoteState {
    pages: BTreeMap<String, RemoteProfile>,
    posts: Vec<Post>,
    jobs: Vec<Job>,
    members: Vec<Member>,
    achievements: Vec<Achievement>,
    failures: VecDeque<(String, RemoteError)>,
    gates: HashMap<String, Arc<Semaphore>>,
    offline: bool,
    calls: Vec<RemoteCall>,
    next_id: u64,
}

/// Sub-resources the in-memory service can hold
trait Stored: SubResource + Serialize {
    fn bucket(state: &mut RemoteState) -> &mut Vec<Self>;
}

impl Stored for Post {
    fn bucket(state: &mut RemoteState) -> &mut Vec<Self> {
        &mut state.posts
    }
}

impl Stored for Job {
    fn bucket(state: &mut RemoteState) -> &mut Vec<Self> {
        &mut state.jobs
    }
}

impl Stored for Member {
    fn bucket(state: &mut RemoteState) -> &mut Vec<Self> {
        &mut state.members
    }
}

impl Stored for Achievement {
    fn bucket(state: &mut RemoteState) -> &mut Vec<Self> {
        &mut state.achievements
    }
}

/// In-memory [`PageRemote`] with fault injection and call gating
#[derive(Default)]
pub struct InMemoryRemote {
    state: Mutex<RemoteState>,
}

impl InMemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a profile given as flat JSON `{id, type, ...fields}`
    pub fn insert_page(&self, profile: Value) {
        let profile: RemoteProfile = serde_json::from_value(profile).expect("profile JSON");
        self.state.lock().pages.insert(profile.id.clone(), profile);
    }

    pub fn remove_page(&self, remote_id: &str) {
        self.state.lock().pages.remove(remote_id);
    }

    pub fn page(&self, remote_id: &str) -> Option<RemoteProfile> {
        self.state.lock().pages.get(remote_id).cloned()
    }

    pub fn insert_post(&self, post: Post) {
        self.state.lock().posts.push(post);
    }

    pub fn insert_job(&self, job: Job) {
        self.state.lock().jobs.push(job);
    }

    pub fn insert_member(&self, member: Member) {
        self.state.lock().members.push(member);
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().posts.clone()
    }

    pub fn members(&self) -> Vec<Member> {
        self.state.lock().members.clone()
    }

    /// Every call fails with a network error while offline
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Fail the next call to `op` with `error`
    pub fn fail_next(&self, op: &str, error: RemoteError) {
        self.state.lock().failures.push_back((op.to_string(), error));
    }

    /// Calls to `op` block until released
    pub fn hold(&self, op: &str) {
        self.state
            .lock()
            .gates
            .insert(op.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let one held call to `op` through
    pub fn release_one(&self, op: &str) {
        if let Some(gate) = self.state.lock().gates.get(op) {
            gate.add_permits(1);
        }
    }

    /// Stop holding `op`; every waiting call proceeds
    pub fn open(&self, op: &str) {
        if let Some(gate) = self.state.lock().gates.remove(op) {
            gate.close();
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, op: &str) -> Vec<RemoteCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op == op)
            .cloned()
            .collect()
    }

    /// Wait until `op` has been called at least `count` times
    pub async fn wait_for_calls(&self, op: &str, count: usize) {
        let reached = async {
            while self.calls_to(op).len() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), reached)
            .await
            .expect("remote call never arrived");
    }

    async fn enter(&self, op: &str, target: &str, body: Value) -> RemoteResult<()> {
        let gate = {
            let mut state = self.state.lock();
            state.calls.push(RemoteCall {
                op: op.to_string(),
                target: target.to_string(),
                body,
            });
            state.gates.get(op).cloned()
        };
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut state = self.state.lock();
        if let Some(pos) = state.failures.iter().position(|(failing, _)| failing == op) {
            if let Some((_, error)) = state.failures.remove(pos) {
                return Err(error);
            }
        }
        if state.offline {
            return Err(RemoteError::network("service unreachable"));
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock();
        state.next_id += 1;
        format!("{}{}", prefix, state.next_id)
    }

    async fn list_of<T: Stored>(&self, page_id: &PageId) -> RemoteResult<Vec<T>> {
        let op = format!("list_{}", T::KIND.collection());
        self.enter(&op, page_id.remote_id(), Value::Null).await?;
        let mut state = self.state.lock();
        Ok(T::bucket(&mut state)
            .iter()
            .filter(|item| item.page_id() == page_id.remote_id())
            .cloned()
            .collect())
    }

    async fn create_in<T: Stored>(&self, page_id: &PageId, draft: &T::Draft) -> RemoteResult<T>
    where
        T::Draft: Serialize,
    {
        let op = format!("create_{}", T::KIND.singular());
        let body = serde_json::to_value(draft).unwrap_or(Value::Null);
        self.enter(&op, page_id.remote_id(), body).await?;
        let id = self.next_id(&format!("{}-", T::KIND.singular()));
        let created = T::speculative(&id, page_id, draft);
        T::bucket(&mut self.state.lock()).push(created.clone());
        Ok(created)
    }

    async fn update_in<T: Stored>(&self, id: &str, patch: &T::Patch) -> RemoteResult<T>
    where
        T::Patch: Serialize,
    {
        let op = format!("update_{}", T::KIND.singular());
        let body = serde_json::to_value(patch).unwrap_or(Value::Null);
        self.enter(&op, id, body).await?;
        let mut state = self.state.lock();
        let item = T::bucket(&mut state)
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| RemoteError::not_found(format!("{} {} not found", T::KIND, id)))?;
        item.apply_patch(patch);
        Ok(item.clone())
    }

    async fn delete_in<T: Stored>(&self, id: &str) -> RemoteResult<()> {
        let op = format!("delete_{}", T::KIND.singular());
        self.enter(&op, id, Value::Null).await?;
        let mut state = self.state.lock();
        let bucket = T::bucket(&mut state);
        let before = bucket.len();
        bucket.retain(|item| item.id() != id);
        if bucket.len() == before {
            return Err(RemoteError::not_found(format!("{} {} not found", T::KIND, id)));
        }
        Ok(())
    }
}

#[async_trait]
impl PageRemote for InMemoryRemote {
    async fn fetch_page(&self, id: &PageId) -> RemoteResult<RemoteProfile> {
        self.enter("fetch_page", id.remote_id(), Value::Null).await?;
        self.page(id.remote_id())
            .ok_or_else(|| RemoteError::not_found(format!("Page {} not found", id.remote_id())))
    }

    async fn save_page(&self, id: &PageId, partial: &FieldMap) -> RemoteResult<Option<RemoteProfile>> {
        let body = serde_json::to_value(partial).unwrap_or(Value::Null);
        self.enter("save_page", id.remote_id(), body).await?;
        let mut state = self.state.lock();
        let profile = state
            .pages
            .get_mut(id.remote_id())
            .ok_or_else(|| RemoteError::not_found(format!("Page {} not found", id.remote_id())))?;
        for (name, value) in partial {
            profile.fields.insert(name.clone(), value.clone());
        }
        Ok(Some(profile.clone()))
    }

    async fn list_pages(&self) -> RemoteResult<Vec<RemoteProfile>> {
        self.enter("list_pages", "", Value::Null).await?;
        Ok(self.state.lock().pages.values().cloned().collect())
    }

    async fn create_page(&self, draft: &PageDraft) -> RemoteResult<RemoteProfile> {
        let body = serde_json::to_value(draft).unwrap_or(Value::Null);
        self.enter("create_page", "", body).await?;
        let id = self.next_id("");
        let profile = RemoteProfile {
            id: strip_prefix(&id).to_string(),
            page_type: draft.page_type.to_string(),
            fields: draft.fields.clone(),
        };
        self.state.lock().pages.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn list_posts(&self, page_id: &PageId) -> RemoteResult<Vec<Post>> {
        self.list_of(page_id).await
    }

    async fn create_post(&self, page_id: &PageId, draft: &PostDraft) -> RemoteResult<Post> {
        self.create_in(page_id, draft).await
    }

    async fn update_post(&self, id: &str, patch: &PostPatch) -> RemoteResult<Post> {
        self.update_in(id, patch).await
    }

    async fn delete_post(&self, id: &str) -> RemoteResult<()> {
        self.delete_in::<Post>(id).await
    }

    async fn list_jobs(&self, page_id: &PageId) -> RemoteResult<Vec<Job>> {
        self.list_of(page_id).await
    }

    async fn create_job(&self, page_id: &PageId, draft: &JobDraft) -> RemoteResult<Job> {
        self.create_in(page_id, draft).await
    }

    async fn update_job(&self, id: &str, patch: &JobPatch) -> RemoteResult<Job> {
        self.update_in(id, patch).await
    }

    async fn delete_job(&self, id: &str) -> RemoteResult<()> {
        self.delete_in::<Job>(id).await
    }

    async fn list_members(&self, page_id: &PageId) -> RemoteResult<Vec<Member>> {
        self.list_of(page_id).await
    }

    async fn create_member(&self, page_id: &PageId, draft: &MemberDraft) -> RemoteResult<Member> {
        self.create_in(page_id, draft).await
    }

    async fn update_member(&self, id: &str, patch: &MemberPatch) -> RemoteResult<Member> {
        self.update_in(id, patch).await
    }

    async fn delete_member(&self, id: &str) -> RemoteResult<()> {
        self.delete_in::<Member>(id).await
    }

    async fn list_achievements(&self, page_id: &PageId) -> RemoteResult<Vec<Achievement>> {
        self.list_of(page_id).await
    }

    async fn create_achievement(&self, page_id: &PageId, draft: &AchievementDraft) -> RemoteResult<Achievement> {
        self.create_in(page_id, draft).await
    }

    async fn update_achievement(&self, id: &str, patch: &AchievementPatch) -> RemoteResult<Achievement> {
        self.update_in(id, patch).await
    }

    async fn delete_achievement(&self, id: &str) -> RemoteResult<()> {
        self.delete_in::<Achievement>(id).await
    }
}

/// Notifier that keeps every notice for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices.lock().iter().filter(|n| n.level == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Navigator that keeps every (view, page) it was sent to
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<(String, PageId)>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn visits(&self) -> Vec<(String, PageId)> {
        self.visits.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, view: &str, page_id: &PageId) {
        self.visits.lock().push((view.to_string(), page_id.clone()));
    }
}
