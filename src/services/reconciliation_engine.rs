// ReconciliationEngine - merges the cached snapshot of a page with the authoritative remote copy
// Unconfirmed local edits win field by field; everything else comes from the remote.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::PageId;
use crate::ent_schema::{FieldMap, FieldSchema, SchemaRegistry};
use crate::entities::Page;
use crate::error::{AppError, AppResult, RemoteErrorKind};
use crate::infrastructure::cache_layer::SnapshotCache;
use crate::infrastructure::snapshot::CacheSnapshot;
use crate::infrastructure::traits::PageRemote;

/// What the consumer sees for a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedView {
    pub page: Page,
    /// Served from the cache because the remote was unreachable
    pub stale: bool,
    /// Fields showing a local edit the remote has not confirmed
    pub pending_fields: Vec<String>,
}

impl MergedView {
    pub fn from_snapshot(snapshot: &CacheSnapshot, stale: bool) -> Option<Self> {
        Some(Self {
            page: snapshot.local_view()?,
            stale,
            pending_fields: snapshot.unconfirmed().into_keys().collect(),
        })
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.pending_fields.iter().any(|f| f == field)
    }
}

/// Result of a fetch, not yet written to the cache
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub page_id: PageId,
    pub view: MergedView,
    /// Fresh remote copy; absent when the view was served stale
    remote: Option<Page>,
}

pub struct ReconciliationEngine {
    registry: &'static SchemaRegistry,
    cache: Arc<SnapshotCache>,
    remote: Arc<dyn PageRemote>,
}

impl ReconciliationEngine {
    pub fn new(registry: &'static SchemaRegistry, cache: Arc<SnapshotCache>, remote: Arc<dyn PageRemote>) -> Self {
        Self {
            registry,
            cache,
            remote,
        }
    }

    /// Fetch and merge without committing. NotFound evicts the page at once.
    #[instrument(skip(self))]
    pub async fn fetch_and_merge(&self, page_id: &PageId) -> AppResult<Reconciliation> {
        // The cached copy is read before the remote is asked
        let cached = self.cache.get(page_id).await?;

        let profile = match self.remote.fetch_page(page_id).await {
            Ok(profile) => profile,
            Err(err) => {
                return match err.kind {
                    RemoteErrorKind::Network => match MergedView::from_snapshot(&cached, true) {
                        Some(view) => {
                            warn!("Serving cached copy of page {}: {}", page_id, err.message);
                            Ok(Reconciliation {
                                page_id: page_id.clone(),
                                view,
                                remote: None,
                            })
                        }
                        None => Err(AppError::Network(err.message)),
                    },
                    RemoteErrorKind::NotFound => {
                        info!("Page {} no longer exists remotely, evicting", page_id);
                        self.cache.remove(page_id).await?;
                        Err(AppError::PageGone(page_id.to_string()))
                    }
                    _ => Err(err.into()),
                };
            }
        };

        let remote = Page::from_profile(page_id.clone(), profile, self.registry)?;
        let mut next = cached;
        absorb_remote(&mut next, &remote, self.registry.schema_for(remote.page_type));
        let view = merge_fields(&next, &remote, self.registry.schema_for(remote.page_type));
        debug!(
            "Merged page {} with {} pending field(s)",
            page_id,
            view.pending_fields.len()
        );

        Ok(Reconciliation {
            page_id: page_id.clone(),
            view,
            remote: Some(remote),
        })
    }

    /// Write a reconciliation's remote copy into the cache, pruning settled edits.
    /// Edits recorded since the fetch are kept.
    pub async fn commit(&self, reconciliation: &Reconciliation) -> AppResult<()> {
        let Some(remote) = reconciliation.remote.as_ref() else {
            return Ok(());
        };
        let schema = self.registry.schema_for(remote.page_type);
        self.cache
            .update(&reconciliation.page_id, |snapshot| absorb_remote(snapshot, remote, schema))
            .await
    }

    /// Fetch, merge and commit in one step
    pub async fn reconcile(&self, page_id: &PageId) -> AppResult<MergedView> {
        let reconciliation = self.fetch_and_merge(page_id).await?;
        self.commit(&reconciliation).await?;
        Ok(reconciliation.view)
    }
}

/// Make `remote` the last-known copy and drop every edit it settles: edits the
/// remote already holds, acknowledged edits, and edits for fields the type lacks.
pub fn absorb_remote(snapshot: &mut CacheSnapshot, remote: &Page, schema: &FieldSchema) {
    snapshot.unconfirmed_edits.retain(|field, edit| {
        schema.defines(field) && edit.is_unconfirmed() && remote.get(field) != Some(&edit.value)
    });
    snapshot.last_remote_snapshot = Some(remote.clone());
}

/// Field-level merge in schema order: an unconfirmed edit wins, otherwise the remote value
pub fn merge_fields(snapshot: &CacheSnapshot, remote: &Page, schema: &FieldSchema) -> MergedView {
    let mut fields = FieldMap::new();
    let mut pending_fields = Vec::new();

    for def in schema.fields() {
        let local = snapshot
            .unconfirmed_edits
            .get(&def.name)
            .filter(|edit| edit.is_unconfirmed());
        match local {
            Some(edit) => {
                fields.insert(def.name.clone(), edit.value.clone());
                pending_fields.push(def.name.clone());
            }
            None => {
                if let Some(value) = remote.get(&def.name) {
                    fields.insert(def.name.clone(), value.clone());
                }
            }
        }
    }

    MergedView {
        page: Page {
            id: remote.id.clone(),
            page_type: remote.page_type,
            fields,
        },
        stale: false,
        pending_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::snapshot::EditState;
    use crate::schemas::registry;
    use crate::test_support::InMemoryRemote;
    use serde_json::json;

    fn engine(remote: Arc<InMemoryRemote>) -> (ReconciliationEngine, Arc<SnapshotCache>) {
        let cache = Arc::new(SnapshotCache::in_memory());
        (ReconciliationEngine::new(registry(), cache.clone(), remote), cache)
    }

    fn seeded_remote() -> Arc<InMemoryRemote> {
        let remote = InMemoryRemote::new();
        remote.insert_page(json!({
            "id": "1",
            "type": "academy",
            "name": "North Academy",
            "description": "B",
            "staffCount": 3
        }));
        remote
    }

    #[tokio::test]
    async fn unconfirmed_local_edit_wins_over_remote() {
        let (engine, cache) = engine(seeded_remote());
        let id = PageId::new("page_1");
        cache.update(&id, |s| s.record_edit("description", json!("A"))).await.unwrap();

        let view = engine.reconcile(&id).await.unwrap();

        assert_eq!(view.page.get("description"), Some(&json!("A")));
        assert_eq!(view.page.get("staffCount"), Some(&json!(3)));
        assert_eq!(view.pending_fields, vec!["description".to_string()]);
        assert!(!view.stale);
        let snapshot = cache.get(&id).await.unwrap();
        assert!(snapshot.unconfirmed_edits.contains_key("description"));
    }

    #[tokio::test]
    async fn edits_matching_the_remote_are_pruned() {
        let (engine, cache) = engine(seeded_remote());
        let id = PageId::new("page_1");
        cache
            .update(&id, |s| {
                s.record_edit("description", json!("B"));
                s.record_edit("name", json!("Northern Academy"));
                s.unconfirmed_edits.get_mut("name").unwrap().state = EditState::Acknowledged;
            })
            .await
            .unwrap();

        let view = engine.reconcile(&id).await.unwrap();

        assert!(view.pending_fields.is_empty());
        // The acknowledged edit was superseded by a newer remote write
        assert_eq!(view.page.name(), "North Academy");
        let snapshot = cache.get(&id).await.unwrap();
        assert!(snapshot.unconfirmed_edits.is_empty());
        assert_eq!(
            snapshot.last_remote_snapshot.unwrap().get("description"),
            Some(&json!("B"))
        );
    }

    #[tokio::test]
    async fn network_failure_serves_stale_snapshot() {
        let remote = seeded_remote();
        let (engine, cache) = engine(remote.clone());
        let id = PageId::new("page_1");
        engine.reconcile(&id).await.unwrap();
        cache.update(&id, |s| s.record_edit("staffCount", json!(5))).await.unwrap();

        remote.set_offline(true);
        let view = engine.reconcile(&id).await.unwrap();

        assert!(view.stale);
        assert_eq!(view.page.get("staffCount"), Some(&json!(5)));
        assert_eq!(view.page.get("description"), Some(&json!("B")));
        assert!(view.is_pending("staffCount"));
    }

    #[tokio::test]
    async fn network_failure_without_cache_is_an_error() {
        let remote = seeded_remote();
        remote.set_offline(true);
        let (engine, _) = engine(remote);

        let err = engine.reconcile(&PageId::new("page_1")).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn missing_page_is_evicted() {
        let remote = seeded_remote();
        let (engine, cache) = engine(remote.clone());
        let id = PageId::new("page_1");
        engine.reconcile(&id).await.unwrap();
        assert!(cache.peek(&id).is_some());

        remote.remove_page("1");
        let err = engine.reconcile(&id).await.unwrap_err();

        assert_eq!(err, AppError::PageGone("page_1".to_string()));
        assert!(cache.peek(&id).is_none());
    }

    #[tokio::test]
    async fn commit_keeps_edits_made_after_the_fetch() {
        let (engine, cache) = engine(seeded_remote());
        let id = PageId::new("page_1");

        let reconciliation = engine.fetch_and_merge(&id).await.unwrap();
        cache.update(&id, |s| s.record_edit("location", json!("Leeds"))).await.unwrap();
        engine.commit(&reconciliation).await.unwrap();

        let snapshot = cache.get(&id).await.unwrap();
        assert!(snapshot.last_remote_snapshot.is_some());
        assert_eq!(snapshot.unconfirmed_edits["location"].value, json!("Leeds"));
    }
}
