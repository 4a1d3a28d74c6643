// SubResourceStore - optimistic collection of one sub-resource kind, scoped to a single page
// Mutations apply locally first and roll back on failure; mutations on the same id run
// one at a time in request order.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::core::PageId;
use crate::entities::{Member, MemberPatch, MemberStatus, SubResource};
use crate::error::{AppError, AppResult, RemoteErrorKind};
use crate::infrastructure::mutation_queue::MutationQueue;
use crate::infrastructure::traits::PageRemote;

pub const TEMP_ID_PREFIX: &str = "tmp_";

const EVENT_CAPACITY: usize = 64;

/// Change notifications for listeners of a store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Refreshed { count: usize },
    RefreshFailed { kind: RemoteErrorKind, message: String },
    Inserted { id: String },
    Confirmed { temp_id: String, id: String },
    Updated { id: String },
    Removed { id: String },
    RolledBack { id: String, reason: String },
}

#[derive(Debug, Clone)]
struct Entry<T> {
    item: T,
    /// Speculative, or a mutation on it is in flight
    pending: bool,
}

struct StoreState<T> {
    entries: Vec<Entry<T>>,
    /// Ids removed locally whose remote delete has not resolved
    deleting: HashSet<String>,
    /// Temporary id -> server id, or None when the create failed. Kept only
    /// while mutations queued on the temporary id are still waiting.
    aliases: HashMap<String, Option<String>>,
    stale: bool,
    closed: bool,
    refresh: Option<JoinHandle<()>>,
}

struct StoreInner<T> {
    page_id: PageId,
    remote: Arc<dyn PageRemote>,
    queue: Arc<MutationQueue>,
    state: Mutex<StoreState<T>>,
    events: broadcast::Sender<StoreEvent>,
}

/// Handle to a page's collection of `T`; clones share the same state
pub struct SubResourceStore<T: SubResource> {
    inner: Arc<StoreInner<T>>,
}

impl<T: SubResource> Clone for SubResourceStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: SubResource> std::fmt::Debug for SubResourceStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubResourceStore")
            .field("kind", &T::KIND)
            .field("page_id", &self.inner.page_id)
            .field("len", &self.len())
            .finish()
    }
}

impl<T: SubResource> SubResourceStore<T> {
    pub fn new(page_id: PageId, remote: Arc<dyn PageRemote>, queue: Arc<MutationQueue>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                page_id,
                remote,
                queue,
                state: Mutex::new(StoreState {
                    entries: Vec::new(),
                    deleting: HashSet::new(),
                    aliases: HashMap::new(),
                    stale: false,
                    closed: false,
                    refresh: None,
                }),
                events,
            }),
        }
    }

    pub fn page_id(&self) -> &PageId {
        &self.inner.page_id
    }

    /// Current items, newest first. Starts a background refresh unless one is
    /// already running; listeners hear about its result.
    pub fn list(&self) -> Vec<T> {
        self.spawn_refresh();
        self.items()
    }

    /// Current items without triggering a refresh
    pub fn items(&self) -> Vec<T> {
        self.inner
            .state
            .lock()
            .entries
            .iter()
            .map(|entry| entry.item.clone())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        let state = self.inner.state.lock();
        let id = resolve_alias(&*state, id)?;
        state
            .entries
            .iter()
            .find(|entry| entry.item.id() == id)
            .map(|entry| entry.item.clone())
    }

    pub fn is_pending(&self, id: &str) -> bool {
        let state = self.inner.state.lock();
        let Some(id) = resolve_alias(&*state, id) else {
            return false;
        };
        state
            .entries
            .iter()
            .any(|entry| entry.item.id() == id && entry.pending)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last refresh failed on the network; contents may be out of date
    pub fn is_stale(&self) -> bool {
        self.inner.state.lock().stale
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Stop background refreshes; late results are discarded
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        state.closed = true;
        if let Some(handle) = state.refresh.take() {
            handle.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    fn spawn_refresh(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let mut state = self.inner.state.lock();
        let running = state.refresh.as_ref().is_some_and(|handle| !handle.is_finished());
        if state.closed || running {
            return;
        }
        let store = self.clone();
        state.refresh = Some(runtime.spawn(async move {
            // Outcome is reported through events and the stale flag
            let _ = store.refresh().await;
        }));
    }

    /// Replace the contents with the remote list, keeping local work in progress
    #[instrument(skip(self), fields(kind = %T::KIND, page_id = %self.inner.page_id))]
    pub async fn refresh(&self) -> AppResult<usize> {
        if self.is_closed() {
            return Ok(self.len());
        }

        let result = T::remote_list(self.inner.remote.as_ref(), &self.inner.page_id).await;
        let mut state = self.inner.state.lock();
        if state.closed {
            debug!("Discarding refresh of closed {} store", T::KIND);
            return Ok(state.entries.len());
        }

        match result {
            Ok(items) => {
                let page = self.inner.page_id.remote_id();
                let queue = &self.inner.queue;
                let mut entries: Vec<Entry<T>> = state
                    .entries
                    .drain(..)
                    .filter(|entry| entry.pending || queue.is_busy(&slot::<T>(entry.item.id())))
                    .collect();
                let local: HashSet<String> = entries.iter().map(|e| e.item.id().to_string()).collect();

                for item in items {
                    if item.page_id() != page {
                        warn!("Ignoring {} {} scoped to page {}", T::KIND, item.id(), item.page_id());
                        continue;
                    }
                    if local.contains(item.id()) || state.deleting.contains(item.id()) {
                        continue;
                    }
                    entries.push(Entry { item, pending: false });
                }
                sort_newest_first(&mut entries);

                let count = entries.len();
                state.entries = entries;
                state.stale = false;
                drop(state);
                self.emit(StoreEvent::Refreshed { count });
                Ok(count)
            }
            Err(err) => {
                if err.kind == RemoteErrorKind::Network {
                    state.stale = true;
                }
                drop(state);
                warn!("Refresh of {} list failed: {}", T::KIND, err);
                self.emit(StoreEvent::RefreshFailed {
                    kind: err.kind,
                    message: err.message.clone(),
                });
                Err(err.into())
            }
        }
    }

    /// Insert a speculative item at the head, then confirm it remotely
    #[instrument(skip(self, draft), fields(kind = %T::KIND, page_id = %self.inner.page_id))]
    pub async fn create(&self, draft: T::Draft) -> AppResult<T> {
        let temp_id = format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4());
        let speculative = T::speculative(&temp_id, &self.inner.page_id, &draft);
        let temp_slot = slot::<T>(&temp_id);
        let _turn = match self.inner.queue.try_acquire(&temp_slot) {
            Some(turn) => turn,
            None => self.inner.queue.acquire(&temp_slot).await,
        };

        self.inner.state.lock().entries.insert(
            0,
            Entry {
                item: speculative,
                pending: true,
            },
        );
        self.emit(StoreEvent::Inserted { id: temp_id.clone() });

        match T::remote_create(self.inner.remote.as_ref(), &self.inner.page_id, &draft).await {
            Ok(created) => {
                {
                    let mut state = self.inner.state.lock();
                    // A refresh may already have brought the server copy in
                    state
                        .entries
                        .retain(|entry| entry.item.id() != temp_id && entry.item.id() != created.id());
                    state.entries.push(Entry {
                        item: created.clone(),
                        pending: false,
                    });
                    sort_newest_first(&mut state.entries);
                    state
                        .aliases
                        .insert(temp_id.clone(), Some(created.id().to_string()));
                }
                self.prune_alias(&temp_id);
                debug!("Confirmed {} {} as {}", T::KIND, temp_id, created.id());
                self.emit(StoreEvent::Confirmed {
                    temp_id,
                    id: created.id().to_string(),
                });
                Ok(created)
            }
            Err(err) => {
                {
                    let mut state = self.inner.state.lock();
                    state.entries.retain(|entry| entry.item.id() != temp_id);
                    state.aliases.insert(temp_id.clone(), None);
                }
                self.prune_alias(&temp_id);
                self.emit(StoreEvent::RolledBack {
                    id: temp_id,
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Apply a patch locally, then remotely; restore the previous item on failure
    #[instrument(skip(self, patch), fields(kind = %T::KIND))]
    pub async fn update(&self, id: &str, patch: T::Patch) -> AppResult<T> {
        let _turn = self.inner.queue.acquire(&slot::<T>(id)).await;
        let target = self.resolve(id);
        self.prune_alias(id);
        let target = target?;
        let _target_turn = if target != id {
            Some(self.inner.queue.acquire(&slot::<T>(&target)).await)
        } else {
            None
        };

        let before = {
            let mut state = self.inner.state.lock();
            let entry = state
                .entries
                .iter_mut()
                .find(|entry| entry.item.id() == target)
                .ok_or_else(|| AppError::NotFound(format!("{} {} is not in this page", T::KIND, target)))?;
            let before = entry.item.clone();
            entry.item.apply_patch(&patch);
            entry.pending = true;
            before
        };
        self.emit(StoreEvent::Updated { id: target.clone() });

        match T::remote_update(self.inner.remote.as_ref(), &target, &patch).await {
            Ok(updated) => {
                self.replace(&target, updated.clone());
                self.emit(StoreEvent::Updated { id: target });
                Ok(updated)
            }
            Err(err) => {
                self.replace(&target, before);
                self.emit(StoreEvent::RolledBack {
                    id: target,
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Remove locally, then remotely; re-insert at the original position on failure
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _turn = self.inner.queue.acquire(&slot::<T>(id)).await;
        let target = self.resolve(id);
        self.prune_alias(id);
        let target = target?;
        let _target_turn = if target != id {
            Some(self.inner.queue.acquire(&slot::<T>(&target)).await)
        } else {
            None
        };

        let (position, removed) = {
            let mut state = self.inner.state.lock();
            let position = state
                .entries
                .iter()
                .position(|entry| entry.item.id() == target)
                .ok_or_else(|| AppError::NotFound(format!("{} {} is not in this page", T::KIND, target)))?;
            let removed = state.entries.remove(position);
            state.deleting.insert(target.clone());
            (position, removed)
        };
        self.emit(StoreEvent::Removed { id: target.clone() });

        let result = T::remote_delete(self.inner.remote.as_ref(), &target).await;
        let mut state = self.inner.state.lock();
        state.deleting.remove(&target);
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.kind == RemoteErrorKind::NotFound => {
                debug!("{} {} was already gone remotely", T::KIND, target);
                Ok(())
            }
            Err(err) => {
                let position = position.min(state.entries.len());
                state.entries.insert(
                    position,
                    Entry {
                        item: removed.item,
                        pending: false,
                    },
                );
                drop(state);
                self.emit(StoreEvent::RolledBack {
                    id: target,
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Follow a temporary id to the server id its create resolved to
    fn resolve(&self, id: &str) -> AppResult<String> {
        let state = self.inner.state.lock();
        match state.aliases.get(id) {
            Some(Some(real)) => Ok(real.clone()),
            Some(None) => Err(AppError::NotFound(format!("{} {} was never created", T::KIND, id))),
            None => Ok(id.to_string()),
        }
    }

    /// Forget a temporary id once nothing is queued behind it
    fn prune_alias(&self, temp_id: &str) {
        if self.inner.queue.queued(&slot::<T>(temp_id)) == 0 {
            self.inner.state.lock().aliases.remove(temp_id);
        }
    }

    fn replace(&self, id: &str, item: T) {
        let mut state = self.inner.state.lock();
        if let Some(entry) = state.entries.iter_mut().find(|entry| entry.item.id() == id) {
            entry.item = item;
            entry.pending = false;
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }
}

impl SubResourceStore<Member> {
    /// Move a pending member to active
    pub async fn approve(&self, id: &str) -> AppResult<Member> {
        self.update(id, MemberPatch::status(MemberStatus::Active)).await
    }

    pub async fn deactivate(&self, id: &str) -> AppResult<Member> {
        self.update(id, MemberPatch::status(MemberStatus::Inactive)).await
    }
}

fn resolve_alias<'a, T>(state: &'a StoreState<T>, id: &'a str) -> Option<&'a str> {
    match state.aliases.get(id) {
        Some(Some(real)) => Some(real.as_str()),
        Some(None) => None,
        None => Some(id),
    }
}

/// Mutation queue key; ids are only unique within one kind
fn slot<T: SubResource>(id: &str) -> String {
    format!("{}:{}", T::KIND, id)
}

fn sort_newest_first<T: SubResource>(entries: &mut [Entry<T>]) {
    entries.sort_by(|a, b| b.item.created_at().cmp(&a.item.created_at()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EmploymentType, Job, JobPatch, Post, PostCounters, PostDraft, PostPatch, Visibility};
    use crate::error::RemoteError;
    use crate::test_support::InMemoryRemote;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn post(id: &str, content: &str, minute: u32) -> Post {
        Post {
            id: id.to_string(),
            page_id: "1".to_string(),
            content: content.to_string(),
            media: Vec::new(),
            visibility: Visibility::Public,
            counters: PostCounters::default(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
        }
    }

    fn job(id: &str, title: &str) -> Job {
        Job {
            id: id.to_string(),
            page_id: "1".to_string(),
            title: title.to_string(),
            description: String::new(),
            location: None,
            employment_type: EmploymentType::FullTime,
            salary_range: None,
            experience_required: None,
            contact_email: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    async fn loaded_store(remote: &Arc<InMemoryRemote>) -> SubResourceStore<Post> {
        let store = SubResourceStore::new(PageId::new("page_1"), remote.clone(), MutationQueue::new());
        store.refresh().await.unwrap();
        store
    }

    fn seeded_remote() -> Arc<InMemoryRemote> {
        let remote = InMemoryRemote::new();
        remote.insert_post(post("p1", "Trials on Saturday", 1));
        remote.insert_post(post("p2", "New kit has arrived", 2));
        remote.insert_post(Post {
            page_id: "2".to_string(),
            ..post("p9", "Another page", 3)
        });
        remote
    }

    #[tokio::test]
    async fn refresh_keeps_only_this_page_newest_first() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;

        let ids: Vec<String> = store.items().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert!(!store.is_stale());
    }

    #[tokio::test]
    async fn failed_create_restores_the_previous_list() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;
        let before = store.items();

        remote.fail_next("create_post", RemoteError::validation("content too long"));
        let err = store.create(PostDraft::text(&"x".repeat(10))).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.items(), before);
    }

    #[tokio::test]
    async fn create_shows_speculative_entry_until_confirmed() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;
        remote.hold("create_post");

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.create(PostDraft::text("Match report")).await }
        });
        remote.wait_for_calls("create_post", 1).await;

        let head = store.items()[0].clone();
        assert!(head.id.starts_with(TEMP_ID_PREFIX));
        assert_eq!(head.page_id, "1");
        assert!(store.is_pending(&head.id));

        remote.release_one("create_post");
        let created = pending.await.unwrap().unwrap();
        assert_eq!(store.items()[0].id, created.id);
        assert!(!store.is_pending(&created.id));
        // Nothing was queued on the temporary id, so it is forgotten at once
        assert!(store.get(&head.id).is_none());
        assert!(store.inner.state.lock().aliases.is_empty());
    }

    #[tokio::test]
    async fn failed_update_restores_the_snapshot() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;

        remote.fail_next("update_post", RemoteError::conflict("stale"));
        let patch = PostPatch {
            content: Some("Edited".to_string()),
            ..Default::default()
        };
        let err = store.update("p1", patch).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.get("p1").unwrap().content, "Trials on Saturday");
        assert!(!store.is_pending("p1"));
    }

    #[tokio::test]
    async fn failed_delete_reinserts_at_original_position() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;
        let mut events = store.subscribe();

        remote.fail_next("delete_post", RemoteError::network("offline"));
        assert!(store.delete("p2").await.is_err());

        let ids: Vec<String> = store.items().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Removed { id: "p2".to_string() });
        assert!(matches!(events.recv().await.unwrap(), StoreEvent::RolledBack { .. }));
    }

    #[tokio::test]
    async fn updates_to_one_id_reach_the_remote_in_order() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;
        remote.hold("update_post");

        let first = tokio::spawn({
            let store = store.clone();
            async move {
                let patch = PostPatch {
                    content: Some("first".to_string()),
                    ..Default::default()
                };
                store.update("p1", patch).await
            }
        });
        remote.wait_for_calls("update_post", 1).await;
        let second = tokio::spawn({
            let store = store.clone();
            async move {
                let patch = PostPatch {
                    content: Some("second".to_string()),
                    ..Default::default()
                };
                store.update("p1", patch).await
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        // The second update waits behind the first
        assert_eq!(remote.calls_to("update_post").len(), 1);

        remote.open("update_post");
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let bodies: Vec<String> = remote
            .calls_to("update_post")
            .iter()
            .map(|call| call.body["content"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(bodies, vec!["first", "second"]);
        assert_eq!(store.get("p1").unwrap().content, "second");
    }

    #[tokio::test]
    async fn mutations_on_a_temp_id_follow_the_create() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;
        remote.hold("create_post");

        let create = tokio::spawn({
            let store = store.clone();
            async move { store.create(PostDraft::text("Draft")).await }
        });
        remote.wait_for_calls("create_post", 1).await;
        let temp_id = store.items()[0].id.clone();

        let update = tokio::spawn({
            let store = store.clone();
            let temp_id = temp_id.clone();
            async move {
                let patch = PostPatch {
                    content: Some("Final".to_string()),
                    ..Default::default()
                };
                store.update(&temp_id, patch).await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        remote.open("create_post");

        let created = create.await.unwrap().unwrap();
        let updated = update.await.unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(remote.calls_to("update_post")[0].target, created.id);
        assert_eq!(store.get(&created.id).unwrap().content, "Final");
        assert!(store.inner.state.lock().aliases.is_empty());
    }

    #[tokio::test]
    async fn same_ids_of_different_kinds_do_not_wait_on_each_other() {
        let remote = seeded_remote();
        remote.insert_job(job("p1", "Assistant coach"));
        let queue = MutationQueue::new();
        let posts = SubResourceStore::<Post>::new(PageId::new("page_1"), remote.clone(), queue.clone());
        let jobs = SubResourceStore::<Job>::new(PageId::new("page_1"), remote.clone(), queue.clone());
        posts.refresh().await.unwrap();
        jobs.refresh().await.unwrap();
        remote.hold("update_job");

        let job_update = tokio::spawn({
            let jobs = jobs.clone();
            async move {
                let patch = JobPatch {
                    title: Some("Head coach".to_string()),
                    ..Default::default()
                };
                jobs.update("p1", patch).await
            }
        });
        remote.wait_for_calls("update_job", 1).await;

        let patch = PostPatch {
            content: Some("Not blocked".to_string()),
            ..Default::default()
        };
        let updated = tokio::time::timeout(Duration::from_secs(1), posts.update("p1", patch))
            .await
            .expect("post update waited on the job update")
            .unwrap();
        assert_eq!(updated.content, "Not blocked");

        // The job in flight does not pin the post's local copy during a refresh
        let elsewhere = SubResourceStore::<Post>::new(PageId::new("page_1"), remote.clone(), MutationQueue::new());
        elsewhere.refresh().await.unwrap();
        let patch = PostPatch {
            content: Some("Edited elsewhere".to_string()),
            ..Default::default()
        };
        elsewhere.update("p1", patch).await.unwrap();
        posts.refresh().await.unwrap();
        assert_eq!(posts.get("p1").unwrap().content, "Edited elsewhere");

        remote.open("update_job");
        job_update.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn refresh_keeps_speculative_entries_and_marks_stale_offline() {
        let remote = seeded_remote();
        let store = loaded_store(&remote).await;
        remote.hold("create_post");
        let _create = tokio::spawn({
            let store = store.clone();
            async move { store.create(PostDraft::text("Pending")).await }
        });
        remote.wait_for_calls("create_post", 1).await;

        store.refresh().await.unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.items()[0].id.starts_with(TEMP_ID_PREFIX));

        remote.set_offline(true);
        assert!(store.refresh().await.is_err());
        assert!(store.is_stale());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn list_refreshes_in_the_background() {
        let remote = seeded_remote();
        let store = SubResourceStore::<Post>::new(PageId::new("page_1"), remote.clone(), MutationQueue::new());
        let mut events = store.subscribe();

        assert!(store.list().is_empty());
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Refreshed { count: 2 });
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn closed_store_discards_late_refreshes() {
        let remote = seeded_remote();
        let store = SubResourceStore::<Post>::new(PageId::new("page_1"), remote.clone(), MutationQueue::new());
        remote.hold("list_posts");

        let refresh = tokio::spawn({
            let store = store.clone();
            async move { store.refresh().await }
        });
        remote.wait_for_calls("list_posts", 1).await;
        store.close();
        remote.open("list_posts");
        refresh.await.unwrap().unwrap();

        assert!(store.is_empty());
        store.list();
        assert_eq!(remote.calls_to("list_posts").len(), 1);
    }

    #[tokio::test]
    async fn members_can_be_approved() {
        let remote = InMemoryRemote::new();
        let store = SubResourceStore::<Member>::new(PageId::new("page_1"), remote.clone(), MutationQueue::new());

        let member = store
            .create(crate::entities::MemberDraft::new("Sam Okafor", "sam@example.com"))
            .await
            .unwrap();
        assert_eq!(member.status, MemberStatus::Pending);

        let approved = store.approve(&member.id).await.unwrap();
        assert_eq!(approved.status, MemberStatus::Active);
        assert_eq!(remote.members()[0].status, MemberStatus::Active);
    }
}
