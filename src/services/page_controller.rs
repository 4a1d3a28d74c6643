// PageController - owns the active page: its merged view, its edits and its sub-resource stores
// Only one page is active at a time; loads that lose a race are discarded.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::core::{PageId, PageType};
use crate::ent_schema::{FieldMap, SchemaRegistry};
use crate::entities::{Achievement, Job, Member, Page, PageDraft, Post, RemoteProfile};
use crate::error::{AppError, AppResult, RemoteErrorKind, RemoteResult};
use crate::infrastructure::cache_layer::SnapshotCache;
use crate::infrastructure::mutation_queue::MutationQueue;
use crate::infrastructure::snapshot::CacheSnapshot;
use crate::infrastructure::traits::{Notice, Notifier, PageRemote};
use crate::services::reconciliation_engine::{MergedView, ReconciliationEngine};
use crate::services::sub_resource_store::SubResourceStore;

const GONE_CAPACITY: usize = 16;

/// How a page edit ended when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The remote accepted the value
    Confirmed,
    /// The remote was unreachable; the edit is kept locally until retried
    Pending,
}

/// The sub-resource collections of one page
#[derive(Debug, Clone)]
pub struct PageStores {
    pub posts: SubResourceStore<Post>,
    pub jobs: SubResourceStore<Job>,
    pub members: SubResourceStore<Member>,
    /// Player and coach pages only
    pub achievements: Option<SubResourceStore<Achievement>>,
}

impl PageStores {
    fn new(page_id: &PageId, page_type: PageType, remote: &Arc<dyn PageRemote>, queue: &Arc<MutationQueue>) -> Self {
        Self {
            posts: SubResourceStore::new(page_id.clone(), remote.clone(), queue.clone()),
            jobs: SubResourceStore::new(page_id.clone(), remote.clone(), queue.clone()),
            members: SubResourceStore::new(page_id.clone(), remote.clone(), queue.clone()),
            achievements: page_type
                .has_achievements()
                .then(|| SubResourceStore::new(page_id.clone(), remote.clone(), queue.clone())),
        }
    }

    fn close(&self) {
        self.posts.close();
        self.jobs.close();
        self.members.close();
        if let Some(achievements) = &self.achievements {
            achievements.close();
        }
    }
}

struct ActivePage {
    page_id: PageId,
    generation: u64,
    /// None until the load completes
    view: Option<MergedView>,
    stores: Option<PageStores>,
}

impl ActivePage {
    fn close(&self) {
        if let Some(stores) = &self.stores {
            stores.close();
        }
    }
}

pub struct PageController {
    registry: &'static SchemaRegistry,
    remote: Arc<dyn PageRemote>,
    cache: Arc<SnapshotCache>,
    engine: ReconciliationEngine,
    queue: Arc<MutationQueue>,
    notifier: Arc<dyn Notifier>,
    active: Mutex<Option<ActivePage>>,
    generation: AtomicU64,
    gone: broadcast::Sender<PageId>,
}

impl PageController {
    pub fn new(
        registry: &'static SchemaRegistry,
        remote: Arc<dyn PageRemote>,
        cache: Arc<SnapshotCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            engine: ReconciliationEngine::new(registry, cache.clone(), remote.clone()),
            remote,
            cache,
            queue: MutationQueue::new(),
            notifier,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
            gone: broadcast::channel(GONE_CAPACITY).0,
        }
    }

    /// Ids of pages found deleted on the remote, by a load or a save
    pub fn subscribe_gone(&self) -> broadcast::Receiver<PageId> {
        self.gone.subscribe()
    }

    /// Make `page_id` the active page and reconcile it
    #[instrument(skip(self))]
    pub async fn load(&self, page_id: &PageId) -> AppResult<MergedView> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.active.lock().replace(ActivePage {
            page_id: page_id.clone(),
            generation,
            view: None,
            stores: None,
        });
        if let Some(previous) = previous {
            previous.close();
        }

        let result = self.engine.fetch_and_merge(page_id).await;
        if let Err(AppError::PageGone(_)) = &result {
            self.report_gone(page_id);
        }
        if !self.is_current(generation) {
            debug!("Discarding superseded load of page {}", page_id);
            return Err(AppError::Superseded(page_id.to_string()));
        }
        let reconciliation = match result {
            Ok(reconciliation) => reconciliation,
            Err(err) => {
                self.clear_if_current(generation);
                return Err(err);
            }
        };

        self.engine.commit(&reconciliation).await?;

        let view = reconciliation.view;
        let stores = PageStores::new(page_id, view.page.page_type, &self.remote, &self.queue);
        let mut active = self.active.lock();
        match active.as_mut() {
            Some(current) if current.generation == generation => {
                current.view = Some(view.clone());
                current.stores = Some(stores);
                info!(
                    "Loaded {} page {}{}",
                    view.page.page_type,
                    page_id,
                    if view.stale { " from cache" } else { "" }
                );
                Ok(view)
            }
            _ => {
                stores.close();
                Err(AppError::Superseded(page_id.to_string()))
            }
        }
    }

    /// Edit one field of the active page. The edit is cached before the remote
    /// is asked, and saves of one page reach the remote in edit order.
    #[instrument(skip(self, value))]
    pub async fn edit_field(&self, name: &str, value: Value) -> AppResult<EditOutcome> {
        let (page_id, page_type) = self.loaded_page()?;
        self.registry.validate_field(page_type, name, &value)?;

        let snapshot = self
            .cache
            .update(&page_id, |snapshot| {
                snapshot.record_edit(name, value.clone());
                snapshot.clone()
            })
            .await?;
        self.sync_view(&page_id, &snapshot, None);

        let mut partial = FieldMap::new();
        partial.insert(name.to_string(), value);

        let _turn = self.queue.acquire(&save_key(&page_id)).await;
        let result = self.remote.save_page(&page_id, &partial).await;
        self.settle_save(&page_id, &partial, result).await
    }

    /// Resubmit every unconfirmed edit of the active page in one save.
    /// Only ever called on the user's request.
    #[instrument(skip(self))]
    pub async fn retry_pending_edits(&self) -> AppResult<EditOutcome> {
        let (page_id, _) = self.loaded_page()?;
        let _turn = self.queue.acquire(&save_key(&page_id)).await;

        let pending = self.cache.get(&page_id).await?.unconfirmed();
        if pending.is_empty() {
            return Ok(EditOutcome::Confirmed);
        }
        info!("Retrying {} pending edit(s) on page {}", pending.len(), page_id);

        let result = self.remote.save_page(&page_id, &pending).await;
        let outcome = self.settle_save(&page_id, &pending, result).await?;
        if outcome == EditOutcome::Confirmed {
            self.notifier.notify(Notice::info("All changes saved"));
        }
        Ok(outcome)
    }

    async fn settle_save(
        &self,
        page_id: &PageId,
        partial: &FieldMap,
        result: RemoteResult<Option<RemoteProfile>>,
    ) -> AppResult<EditOutcome> {
        let fields = partial.keys().cloned().collect::<Vec<_>>().join(", ");
        match result {
            Ok(_) => {
                let snapshot = self
                    .cache
                    .update(page_id, |snapshot| {
                        for (name, value) in partial {
                            snapshot.acknowledge(name, value);
                        }
                        snapshot.clone()
                    })
                    .await?;
                self.sync_view(page_id, &snapshot, Some(false));
                debug!("Saved {} on page {}", fields, page_id);
                Ok(EditOutcome::Confirmed)
            }
            Err(err) => match err.kind {
                RemoteErrorKind::Network | RemoteErrorKind::Unknown => {
                    warn!("Save of {} on page {} failed, keeping local copy: {}", fields, page_id, err);
                    if err.kind == RemoteErrorKind::Network {
                        self.mark_stale(page_id);
                    }
                    self.notifier.notify(Notice::warning(format!(
                        "Couldn't save {} right now. Your changes are kept on this device.",
                        fields
                    )));
                    Ok(EditOutcome::Pending)
                }
                RemoteErrorKind::Conflict | RemoteErrorKind::Validation => {
                    let snapshot = self
                        .cache
                        .update(page_id, |snapshot| {
                            for (name, value) in partial {
                                snapshot.discard_edit(name, value);
                            }
                            snapshot.clone()
                        })
                        .await?;
                    self.sync_view(page_id, &snapshot, None);
                    self.notifier
                        .notify(Notice::error(format!("Change to {} was rejected: {}", fields, err.message)));
                    Err(err.into())
                }
                RemoteErrorKind::NotFound => {
                    self.cache.remove(page_id).await?;
                    self.drop_page(page_id);
                    self.report_gone(page_id);
                    Err(AppError::PageGone(page_id.to_string()))
                }
            },
        }
    }

    /// Validate and create a new page, seeding the cache with the server copy
    #[instrument(skip(self, draft), fields(page_type = %draft.page_type))]
    pub async fn create_page(&self, draft: PageDraft) -> AppResult<Page> {
        self.registry
            .validate_complete(draft.page_type, &draft.fields)
            .map_err(AppError::Validation)?;

        let profile = self.remote.create_page(&draft).await?;
        let page = Page::from_profile(PageId::from_remote(&profile.id), profile, self.registry)?;
        self.cache
            .put(
                &page.id,
                CacheSnapshot {
                    last_remote_snapshot: Some(page.clone()),
                    ..Default::default()
                },
            )
            .await?;
        info!("Created {} page {}", page.page_type, page.id);
        Ok(page)
    }

    /// Release the active page. Returns its edits the remote has not confirmed.
    pub async fn switch_away(&self) -> AppResult<FieldMap> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let previous = self.active.lock().take();
        let Some(previous) = previous else {
            return Ok(FieldMap::new());
        };
        previous.close();
        Ok(self.cache.get(&previous.page_id).await?.unconfirmed())
    }

    pub fn active_page_id(&self) -> Option<PageId> {
        self.active.lock().as_ref().map(|active| active.page_id.clone())
    }

    pub fn view(&self) -> Option<MergedView> {
        self.active.lock().as_ref().and_then(|active| active.view.clone())
    }

    pub fn stores(&self) -> AppResult<PageStores> {
        self.active
            .lock()
            .as_ref()
            .and_then(|active| active.stores.clone())
            .ok_or(AppError::NoActivePage)
    }

    pub fn posts(&self) -> AppResult<SubResourceStore<Post>> {
        Ok(self.stores()?.posts)
    }

    pub fn jobs(&self) -> AppResult<SubResourceStore<Job>> {
        Ok(self.stores()?.jobs)
    }

    pub fn members(&self) -> AppResult<SubResourceStore<Member>> {
        Ok(self.stores()?.members)
    }

    /// None for page types without an achievements collection
    pub fn achievements(&self) -> AppResult<Option<SubResourceStore<Achievement>>> {
        Ok(self.stores()?.achievements)
    }

    pub async fn unconfirmed_edits(&self) -> AppResult<FieldMap> {
        let (page_id, _) = self.loaded_page()?;
        Ok(self.cache.get(&page_id).await?.unconfirmed())
    }

    fn loaded_page(&self) -> AppResult<(PageId, PageType)> {
        let active = self.active.lock();
        let active = active.as_ref().ok_or(AppError::NoActivePage)?;
        let view = active.view.as_ref().ok_or(AppError::NoActivePage)?;
        Ok((active.page_id.clone(), view.page.page_type))
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    fn clear_if_current(&self, generation: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|a| a.generation == generation) {
            active.take();
        }
    }

    fn drop_page(&self, page_id: &PageId) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|a| &a.page_id == page_id) {
            if let Some(previous) = active.take() {
                previous.close();
            }
        }
    }

    fn report_gone(&self, page_id: &PageId) {
        // No subscribers is fine
        let _ = self.gone.send(page_id.clone());
    }

    /// Rebuild the in-memory view of `page_id` from its cached snapshot.
    /// `stale` overrides the view's flag; None keeps it.
    fn sync_view(&self, page_id: &PageId, snapshot: &CacheSnapshot, stale: Option<bool>) {
        let mut active = self.active.lock();
        let Some(current) = active.as_mut().filter(|a| &a.page_id == page_id) else {
            return;
        };
        if let Some(view) = current.view.as_mut() {
            let stale = stale.unwrap_or(view.stale);
            if let Some(refreshed) = MergedView::from_snapshot(snapshot, stale) {
                *view = refreshed;
            }
        }
    }

    /// The remote could not be reached: the view now shows local state only
    fn mark_stale(&self, page_id: &PageId) {
        let mut active = self.active.lock();
        if let Some(view) = active
            .as_mut()
            .filter(|a| &a.page_id == page_id)
            .and_then(|a| a.view.as_mut())
        {
            view.stale = true;
        }
    }
}

fn save_key(page_id: &PageId) -> String {
    format!("profile:{}", page_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::infrastructure::traits::NoticeLevel;
    use crate::schemas::registry;
    use crate::test_support::{InMemoryRemote, RecordingNotifier};
    use serde_json::json;

    struct Fixture {
        remote: Arc<InMemoryRemote>,
        notifier: Arc<RecordingNotifier>,
        cache: Arc<SnapshotCache>,
        controller: PageController,
    }

    fn fixture() -> Fixture {
        let remote = InMemoryRemote::new();
        remote.insert_page(json!({"id": "1", "type": "academy", "name": "North Academy", "staffCount": 3}));
        remote.insert_page(json!({"id": "2", "type": "player", "name": "Ada Obi", "position": "striker"}));
        let notifier = RecordingNotifier::new();
        let cache = Arc::new(SnapshotCache::in_memory());
        let controller = PageController::new(registry(), remote.clone(), cache.clone(), notifier.clone());
        Fixture {
            remote,
            notifier,
            cache,
            controller,
        }
    }

    #[tokio::test]
    async fn invalid_edits_never_reach_the_network() {
        let f = fixture();
        f.controller.load(&PageId::new("page_1")).await.unwrap();

        let err = f.controller.edit_field("capacity", json!(500)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref v) if v[0].field == "capacity"));
        let err = f.controller.edit_field("staffCount", json!(-4)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(f.remote.calls_to("save_page").is_empty());
    }

    #[tokio::test]
    async fn confirmed_edit_updates_view_and_cache() {
        let f = fixture();
        let id = PageId::new("page_1");
        f.controller.load(&id).await.unwrap();

        let outcome = f.controller.edit_field("staffCount", json!(4)).await.unwrap();

        assert_eq!(outcome, EditOutcome::Confirmed);
        let view = f.controller.view().unwrap();
        assert_eq!(view.page.get("staffCount"), Some(&json!(4)));
        assert!(view.pending_fields.is_empty());
        assert!(f.controller.unconfirmed_edits().await.unwrap().is_empty());
        assert_eq!(f.remote.page("1").unwrap().fields["staffCount"], json!(4));
    }

    #[tokio::test]
    async fn offline_edit_stays_pending_with_a_warning() {
        let f = fixture();
        let id = PageId::new("page_1");
        f.controller.load(&id).await.unwrap();
        f.remote.set_offline(true);

        let outcome = f.controller.edit_field("description", json!("Elite youth coaching")).await.unwrap();

        assert_eq!(outcome, EditOutcome::Pending);
        assert_eq!(f.notifier.count(NoticeLevel::Warning), 1);
        let view = f.controller.view().unwrap();
        assert!(view.is_pending("description"));
        assert!(view.stale);
        let stored = f.cache.get(&id).await.unwrap();
        assert!(stored.unconfirmed_edits["description"].is_unconfirmed());
    }

    #[tokio::test]
    async fn rejected_edit_is_rolled_back() {
        let f = fixture();
        f.controller.load(&PageId::new("page_1")).await.unwrap();
        f.remote.fail_next("save_page", RemoteError::conflict("stale write"));

        let err = f.controller.edit_field("name", json!("North FC Academy")).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        let view = f.controller.view().unwrap();
        assert_eq!(view.page.name(), "North Academy");
        assert!(f.controller.unconfirmed_edits().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_of_a_deleted_page_reports_page_gone() {
        let f = fixture();
        f.controller.load(&PageId::new("page_1")).await.unwrap();
        let mut gone = f.controller.subscribe_gone();
        f.remote.remove_page("1");

        let err = f.controller.edit_field("location", json!("York")).await.unwrap_err();

        assert_eq!(err, AppError::PageGone("page_1".to_string()));
        assert!(f.controller.active_page_id().is_none());
        assert_eq!(gone.try_recv().unwrap(), PageId::new("page_1"));
    }

    #[tokio::test]
    async fn retry_submits_all_pending_edits_at_once() {
        let f = fixture();
        f.controller.load(&PageId::new("page_1")).await.unwrap();
        f.remote.set_offline(true);
        f.controller.edit_field("staffCount", json!(5)).await.unwrap();
        f.controller.edit_field("location", json!("Leeds")).await.unwrap();

        f.remote.set_offline(false);
        let outcome = f.controller.retry_pending_edits().await.unwrap();

        assert_eq!(outcome, EditOutcome::Confirmed);
        assert!(!f.controller.view().unwrap().stale);
        let saves = f.remote.calls_to("save_page");
        let last = saves.last().unwrap();
        assert_eq!(last.body, json!({"location": "Leeds", "staffCount": 5}));
        assert!(f.controller.unconfirmed_edits().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stores_follow_the_page_type() {
        let f = fixture();
        f.controller.load(&PageId::new("page_1")).await.unwrap();
        assert!(f.controller.achievements().unwrap().is_none());

        f.controller.load(&PageId::new("page_2")).await.unwrap();
        assert!(f.controller.achievements().unwrap().is_some());
        assert_eq!(f.controller.posts().unwrap().page_id(), &PageId::new("page_2"));
    }

    #[tokio::test]
    async fn switch_away_returns_unconfirmed_edits_and_closes_stores() {
        let f = fixture();
        f.controller.load(&PageId::new("page_1")).await.unwrap();
        let posts = f.controller.posts().unwrap();
        f.remote.set_offline(true);
        f.controller.edit_field("staffCount", json!(7)).await.unwrap();

        let unsaved = f.controller.switch_away().await.unwrap();

        assert_eq!(unsaved.get("staffCount"), Some(&json!(7)));
        assert!(posts.is_closed());
        assert!(matches!(f.controller.posts(), Err(AppError::NoActivePage)));
        assert!(matches!(
            f.controller.edit_field("name", json!("X")).await,
            Err(AppError::NoActivePage)
        ));
    }

    #[tokio::test]
    async fn create_page_requires_a_name() {
        let f = fixture();
        let err = f
            .controller
            .create_page(PageDraft::new(PageType::Venue).field("capacity", 800))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref v) if v.iter().any(|x| x.field == "name")));

        let page = f
            .controller
            .create_page(PageDraft::new(PageType::Venue).field("name", "Riverside").field("capacity", 800))
            .await
            .unwrap();
        assert_eq!(page.get("capacity"), Some(&json!(800)));
        assert!(f.cache.peek(&page.id).is_some());
    }
}
