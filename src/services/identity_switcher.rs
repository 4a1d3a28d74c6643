// IdentitySwitcher - the account's roster of page identities and which one is active

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, instrument, warn};

use crate::core::{PageId, PageType};
use crate::entities::{Page, PageDraft, RemoteProfile};
use crate::error::{AppError, AppResult, RemoteErrorKind};
use crate::infrastructure::traits::{Navigator, Notice, Notifier, PageRemote};
use crate::services::page_controller::PageController;
use crate::services::reconciliation_engine::MergedView;

#[derive(Debug, Clone, PartialEq)]
pub enum SwitcherState {
    NoIdentitySelected,
    LoadingIdentity { page_id: PageId },
    IdentityActive { page_id: PageId, stale: bool },
    IdentityLoadFailed { page_id: PageId, error: AppError },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: PageId,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub display_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RosterSort {
    #[default]
    NameAscending,
    NameDescending,
    /// By type tag, then name
    Type,
}

/// Search, filter and sort over the roster
#[derive(Debug, Clone, Default)]
pub struct RosterQuery {
    pub name_contains: Option<String>,
    pub page_type: Option<PageType>,
    pub sort: RosterSort,
}

impl RosterQuery {
    pub fn search(text: &str) -> Self {
        Self {
            name_contains: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn of_type(page_type: PageType) -> Self {
        Self {
            page_type: Some(page_type),
            ..Self::default()
        }
    }

    fn matches(&self, entry: &RosterEntry) -> bool {
        let name_ok = self.name_contains.as_ref().map_or(true, |needle| {
            entry
                .display_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let type_ok = self.page_type.map_or(true, |t| t == entry.page_type);
        name_ok && type_ok
    }
}

struct SwitcherInner {
    state: SwitcherState,
    roster: Vec<RosterEntry>,
    roster_stale: bool,
    /// Pages the controller found deleted on the remote
    gone: broadcast::Receiver<PageId>,
}

pub struct IdentitySwitcher {
    controller: Arc<PageController>,
    remote: Arc<dyn PageRemote>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    inner: Mutex<SwitcherInner>,
    selection: AtomicU64,
}

impl IdentitySwitcher {
    pub fn new(
        controller: Arc<PageController>,
        remote: Arc<dyn PageRemote>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let gone = controller.subscribe_gone();
        Self {
            controller,
            remote,
            notifier,
            navigator,
            inner: Mutex::new(SwitcherInner {
                state: SwitcherState::NoIdentitySelected,
                roster: Vec::new(),
                roster_stale: false,
                gone,
            }),
            selection: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SwitcherState {
        self.absorb_gone_pages();
        self.inner.lock().state.clone()
    }

    pub fn controller(&self) -> &Arc<PageController> {
        &self.controller
    }

    /// Roster could not be refreshed; entries may be out of date
    pub fn roster_stale(&self) -> bool {
        self.inner.lock().roster_stale
    }

    /// Rebuild the roster from the account's pages
    #[instrument(skip(self))]
    pub async fn refresh_roster(&self) -> AppResult<usize> {
        match self.remote.list_pages().await {
            Ok(profiles) => {
                let roster: Vec<RosterEntry> = profiles.into_iter().filter_map(roster_entry).collect();
                let count = roster.len();
                let mut inner = self.inner.lock();
                inner.roster = roster;
                inner.roster_stale = false;
                info!("Roster refreshed with {} identities", count);
                Ok(count)
            }
            Err(err) if err.kind == RemoteErrorKind::Network => {
                warn!("Roster refresh failed, keeping previous roster: {}", err);
                let mut inner = self.inner.lock();
                inner.roster_stale = true;
                Ok(inner.roster.len())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Filtered, sorted projection of the roster
    pub fn roster(&self, query: &RosterQuery) -> Vec<RosterEntry> {
        self.absorb_gone_pages();
        let active = self.controller.active_page_id();
        let mut entries: Vec<RosterEntry> = self
            .inner
            .lock()
            .roster
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .map(|mut entry| {
                entry.is_active = active.as_ref() == Some(&entry.id);
                entry
            })
            .collect();

        match query.sort {
            RosterSort::NameAscending => entries.sort_by_key(|e| e.display_name.to_lowercase()),
            RosterSort::NameDescending => {
                entries.sort_by_key(|e| e.display_name.to_lowercase());
                entries.reverse();
            }
            RosterSort::Type => entries.sort_by(|a, b| {
                a.page_type
                    .as_str()
                    .cmp(b.page_type.as_str())
                    .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
            }),
        }
        entries
    }

    /// Switch to another identity: release the current page, load the new one
    /// and tell the navigator which view to show.
    #[instrument(skip(self))]
    pub async fn select_identity(&self, page_id: &PageId) -> AppResult<MergedView> {
        let ticket = self.selection.fetch_add(1, Ordering::SeqCst) + 1;

        self.absorb_gone_pages();
        let unsaved = self.controller.switch_away().await?;
        self.ensure_latest(ticket, page_id)?;
        if !unsaved.is_empty() {
            self.notifier.notify(Notice::warning(format!(
                "{} unsaved change(s) were kept on this device and can be retried later",
                unsaved.len()
            )));
        }
        self.set_state(
            ticket,
            SwitcherState::LoadingIdentity {
                page_id: page_id.clone(),
            },
        );

        match self.controller.load(page_id).await {
            Ok(view) => {
                self.ensure_latest(ticket, page_id)?;
                self.set_state(
                    ticket,
                    SwitcherState::IdentityActive {
                        page_id: page_id.clone(),
                        stale: view.stale,
                    },
                );
                if view.stale {
                    self.notifier
                        .notify(Notice::info("You're offline. Showing the last saved copy of this page."));
                }
                self.navigator.navigate(&view.page.page_type.view_name(), page_id);
                Ok(view)
            }
            Err(err @ AppError::Superseded(_)) => Err(err),
            Err(err) => {
                if matches!(err, AppError::PageGone(_)) {
                    self.absorb_gone_pages();
                } else {
                    self.notifier.notify(Notice::error(format!("Couldn't open page: {}", err)));
                }
                self.set_state(
                    ticket,
                    SwitcherState::IdentityLoadFailed {
                        page_id: page_id.clone(),
                        error: err.clone(),
                    },
                );
                Err(err)
            }
        }
    }

    /// Leave every identity
    pub async fn deselect(&self) -> AppResult<()> {
        let ticket = self.selection.fetch_add(1, Ordering::SeqCst) + 1;
        self.controller.switch_away().await?;
        self.set_state(ticket, SwitcherState::NoIdentitySelected);
        Ok(())
    }

    /// Create a page and add it to the roster
    pub async fn create_identity(&self, draft: PageDraft) -> AppResult<Page> {
        let page = self.controller.create_page(draft).await?;
        let entry = RosterEntry {
            id: page.id.clone(),
            page_type: page.page_type,
            display_name: page.name().to_string(),
            is_active: false,
        };
        self.inner.lock().roster.push(entry);
        Ok(page)
    }

    /// Fail with Superseded once a newer selection has started
    fn ensure_latest(&self, ticket: u64, page_id: &PageId) -> AppResult<()> {
        if self.selection.load(Ordering::SeqCst) == ticket {
            return Ok(());
        }
        debug!("Selection of {} superseded", page_id);
        Err(AppError::Superseded(page_id.to_string()))
    }

    /// Drop gone pages from the roster; an identity that was open fails
    fn absorb_gone_pages(&self) {
        let mut gone_pages = Vec::new();
        {
            let mut inner = self.inner.lock();
            loop {
                match inner.gone.try_recv() {
                    Ok(page_id) => gone_pages.push(page_id),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!("Missed {} gone-page notices", skipped);
                        inner.roster_stale = true;
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
            for page_id in &gone_pages {
                inner.roster.retain(|entry| &entry.id != page_id);
                let current = match &inner.state {
                    SwitcherState::LoadingIdentity { page_id: id } | SwitcherState::IdentityActive { page_id: id, .. } => {
                        id == page_id
                    }
                    _ => false,
                };
                if current {
                    inner.state = SwitcherState::IdentityLoadFailed {
                        page_id: page_id.clone(),
                        error: AppError::PageGone(page_id.to_string()),
                    };
                }
            }
        }
        for page_id in gone_pages {
            info!("Page {} was deleted, removed from roster", page_id);
            self.notifier.notify(Notice::error("This page no longer exists"));
        }
    }

    fn set_state(&self, ticket: u64, state: SwitcherState) {
        // A newer selection owns the state
        if self.selection.load(Ordering::SeqCst) == ticket {
            self.inner.lock().state = state;
        }
    }
}

fn roster_entry(profile: RemoteProfile) -> Option<RosterEntry> {
    let page_type: PageType = match profile.page_type.parse() {
        Ok(page_type) => page_type,
        Err(_) => {
            warn!("Skipping identity {} with unknown type {}", profile.id, profile.page_type);
            return None;
        }
    };
    let display_name = profile
        .fields
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| profile.id.clone());

    Some(RosterEntry {
        id: PageId::from_remote(&profile.id),
        page_type,
        display_name,
        is_active: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache_layer::{MemorySnapshotBackend, SnapshotCache, SnapshotCacheConfig};
    use crate::infrastructure::snapshot::CacheSnapshot;
    use crate::infrastructure::traits::SnapshotBackend;
    use crate::schemas::registry;
    use crate::test_support::{InMemoryRemote, RecordingNavigator, RecordingNotifier};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// L2 whose reads take a while
    struct SlowBackend {
        inner: MemorySnapshotBackend,
    }

    #[async_trait]
    impl SnapshotBackend for SlowBackend {
        async fn load(&self, page_id: &PageId) -> AppResult<Option<CacheSnapshot>> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.inner.load(page_id).await
        }

        async fn store(&self, page_id: &PageId, snapshot: &CacheSnapshot) -> AppResult<()> {
            self.inner.store(page_id, snapshot).await
        }

        async fn remove(&self, page_id: &PageId) -> AppResult<()> {
            self.inner.remove(page_id).await
        }
    }

    struct Fixture {
        remote: Arc<InMemoryRemote>,
        navigator: Arc<RecordingNavigator>,
        switcher: IdentitySwitcher,
    }

    fn seeded_remote() -> Arc<InMemoryRemote> {
        let remote = InMemoryRemote::new();
        remote.insert_page(json!({"id": "1", "type": "academy", "name": "North Academy"}));
        remote.insert_page(json!({"id": "2", "type": "venue", "name": "Riverside Ground", "capacity": 1200}));
        remote.insert_page(json!({"id": "3", "type": "coach", "name": "Ada Obi"}));
        remote
    }

    async fn fixture() -> Fixture {
        let remote = seeded_remote();
        remote.insert_page(json!({"id": "4", "type": "stadium", "name": "Legacy"}));

        let notifier = RecordingNotifier::new();
        let navigator = RecordingNavigator::new();
        let controller = Arc::new(PageController::new(
            registry(),
            remote.clone(),
            Arc::new(SnapshotCache::in_memory()),
            notifier.clone(),
        ));
        let switcher = IdentitySwitcher::new(controller, remote.clone(), notifier, navigator.clone());
        switcher.refresh_roster().await.unwrap();
        Fixture {
            remote,
            navigator,
            switcher,
        }
    }

    #[tokio::test]
    async fn roster_skips_unknown_types_and_sorts() {
        let f = fixture().await;

        let names: Vec<String> = f
            .switcher
            .roster(&RosterQuery::default())
            .into_iter()
            .map(|e| e.display_name)
            .collect();
        assert_eq!(names, vec!["Ada Obi", "North Academy", "Riverside Ground"]);

        let venues = f.switcher.roster(&RosterQuery::of_type(PageType::Venue));
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].id, PageId::new("page_2"));
        assert_eq!(f.switcher.roster(&RosterQuery::search("north")).len(), 1);
    }

    #[tokio::test]
    async fn selecting_an_identity_navigates_to_its_view() {
        let f = fixture().await;
        let id = PageId::new("page_2");

        let view = f.switcher.select_identity(&id).await.unwrap();

        assert_eq!(view.page.get("capacity"), Some(&json!(1200)));
        assert_eq!(
            f.switcher.state(),
            SwitcherState::IdentityActive {
                page_id: id.clone(),
                stale: false
            }
        );
        assert_eq!(f.navigator.visits(), vec![("venue_page".to_string(), id.clone())]);
        let active: Vec<PageId> = f
            .switcher
            .roster(&RosterQuery::default())
            .into_iter()
            .filter(|e| e.is_active)
            .map(|e| e.id)
            .collect();
        assert_eq!(active, vec![id]);
    }

    #[tokio::test]
    async fn vanished_identity_is_removed_from_roster() {
        let f = fixture().await;
        f.remote.remove_page("1");

        let err = f.switcher.select_identity(&PageId::new("page_1")).await.unwrap_err();

        assert_eq!(err, AppError::PageGone("page_1".to_string()));
        assert!(matches!(f.switcher.state(), SwitcherState::IdentityLoadFailed { .. }));
        assert_eq!(f.switcher.roster(&RosterQuery::default()).len(), 2);
        assert!(f.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn page_deleted_during_an_edit_leaves_the_roster() {
        let f = fixture().await;
        let id = PageId::new("page_1");
        f.switcher.select_identity(&id).await.unwrap();
        f.remote.remove_page("1");

        let err = f
            .switcher
            .controller()
            .edit_field("location", json!("York"))
            .await
            .unwrap_err();

        assert_eq!(err, AppError::PageGone("page_1".to_string()));
        assert_eq!(
            f.switcher.state(),
            SwitcherState::IdentityLoadFailed {
                page_id: id.clone(),
                error: AppError::PageGone("page_1".to_string()),
            }
        );
        let ids: Vec<PageId> = f
            .switcher
            .roster(&RosterQuery::default())
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert!(!ids.contains(&id));
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn latest_selection_wins_over_one_stuck_switching_away() {
        let remote = seeded_remote();
        let cache = Arc::new(SnapshotCache::new(
            Arc::new(SlowBackend {
                inner: MemorySnapshotBackend::new(),
            }),
            SnapshotCacheConfig { l1_max_entries: 1 },
        ));
        let controller = Arc::new(PageController::new(
            registry(),
            remote.clone(),
            cache.clone(),
            RecordingNotifier::new(),
        ));
        let navigator = RecordingNavigator::new();
        let switcher = Arc::new(IdentitySwitcher::new(
            controller.clone(),
            remote.clone(),
            RecordingNotifier::new(),
            navigator.clone(),
        ));
        switcher.select_identity(&PageId::new("page_1")).await.unwrap();
        // Push page_1 out of L1 so switching away from it reads the slow L2
        cache.get(&PageId::new("page_9")).await.unwrap();

        let earlier = tokio::spawn({
            let switcher = switcher.clone();
            async move { switcher.select_identity(&PageId::new("page_2")).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let latest = switcher.select_identity(&PageId::new("page_3")).await;

        assert!(matches!(earlier.await.unwrap(), Err(AppError::Superseded(_))));
        assert_eq!(latest.unwrap().page.page_type, PageType::Coach);
        assert_eq!(controller.active_page_id(), Some(PageId::new("page_3")));
        assert_eq!(
            switcher.state(),
            SwitcherState::IdentityActive {
                page_id: PageId::new("page_3"),
                stale: false
            }
        );
        assert_eq!(navigator.visits().last().map(|v| v.0.clone()), Some("coach_page".to_string()));
        assert!(remote.calls_to("fetch_page").iter().all(|call| call.target != "2"));
    }

    #[tokio::test]
    async fn offline_without_cache_fails_the_load() {
        let f = fixture().await;
        f.remote.set_offline(true);

        let err = f.switcher.select_identity(&PageId::new("page_3")).await.unwrap_err();

        assert!(matches!(err, AppError::Network(_)));
        assert!(matches!(
            f.switcher.state(),
            SwitcherState::IdentityLoadFailed { error: AppError::Network(_), .. }
        ));
    }

    #[tokio::test]
    async fn offline_roster_refresh_keeps_previous_entries() {
        let f = fixture().await;
        f.remote.set_offline(true);

        assert_eq!(f.switcher.refresh_roster().await.unwrap(), 3);
        assert!(f.switcher.roster_stale());
    }

    #[tokio::test]
    async fn created_identity_joins_the_roster() {
        let f = fixture().await;

        let page = f
            .switcher
            .create_identity(PageDraft::new(PageType::Club).field("name", "Harbour FC"))
            .await
            .unwrap();

        let clubs = f.switcher.roster(&RosterQuery::of_type(PageType::Club));
        assert_eq!(clubs.len(), 1);
        assert_eq!(clubs[0].id, page.id);
    }
}
