use serde_json::json;
use std::sync::Arc;

use pages_client::{
    entities::{PostDraft, SubResource},
    infrastructure::{SnapshotCache, SnapshotCacheConfig, SqliteSnapshotBackend},
    schemas::registry,
    services::{IdentitySwitcher, RosterQuery, SwitcherState},
    test_support::{InMemoryRemote, RecordingNavigator, RecordingNotifier},
    AppError, EditOutcome, PageController, PageId, PageType,
};

async fn sqlite_cache(url: &str) -> Arc<SnapshotCache> {
    let backend = SqliteSnapshotBackend::connect(url).await.unwrap();
    Arc::new(SnapshotCache::new(Arc::new(backend), SnapshotCacheConfig::default()))
}

fn academy_remote() -> Arc<InMemoryRemote> {
    let remote = InMemoryRemote::new();
    remote.insert_page(json!({
        "id": "11",
        "type": "academy",
        "name": "North Academy",
        "staffCount": 3
    }));
    remote.insert_page(json!({
        "id": "12",
        "type": "community",
        "name": "Sunday League Fans",
        "memberCount": 40
    }));
    remote
}

#[tokio::test]
async fn offline_edit_survives_restart_and_is_confirmed_on_retry() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("cache.db").display());
    let remote = academy_remote();
    let id = PageId::new("page_11");

    // First session: edit while offline
    {
        let notifier = RecordingNotifier::new();
        let controller = PageController::new(registry(), remote.clone(), sqlite_cache(&url).await, notifier.clone());
        let view = controller.load(&id).await.unwrap();
        assert_eq!(view.page.get("staffCount"), Some(&json!(3)));

        remote.set_offline(true);
        let outcome = controller.edit_field("staffCount", json!(5)).await.unwrap();
        assert_eq!(outcome, EditOutcome::Pending);
        assert_eq!(notifier.notices().len(), 1);
        let view = controller.view().unwrap();
        assert_eq!(view.page.get("staffCount"), Some(&json!(5)));
        assert!(view.stale);
    }

    // Second session, still offline: the cached copy carries the edit
    let controller = PageController::new(
        registry(),
        remote.clone(),
        sqlite_cache(&url).await,
        RecordingNotifier::new(),
    );
    let view = controller.load(&id).await.unwrap();
    assert!(view.stale);
    assert_eq!(view.page.get("staffCount"), Some(&json!(5)));

    // Back online: the unconfirmed edit still wins over the remote value
    remote.set_offline(false);
    let view = controller.load(&id).await.unwrap();
    assert!(!view.stale);
    assert_eq!(view.page.get("staffCount"), Some(&json!(5)));
    assert!(view.is_pending("staffCount"));
    assert_eq!(remote.page("11").unwrap().fields["staffCount"], json!(3));

    let outcome = controller.retry_pending_edits().await.unwrap();
    assert_eq!(outcome, EditOutcome::Confirmed);
    assert_eq!(remote.page("11").unwrap().fields["staffCount"], json!(5));

    let view = controller.load(&id).await.unwrap();
    assert!(view.pending_fields.is_empty());
    assert_eq!(view.page.get("staffCount"), Some(&json!(5)));
}

#[tokio::test]
async fn later_selection_discards_an_earlier_load() {
    let remote = academy_remote();
    let navigator = RecordingNavigator::new();
    let controller = Arc::new(PageController::new(
        registry(),
        remote.clone(),
        Arc::new(SnapshotCache::in_memory()),
        RecordingNotifier::new(),
    ));
    let switcher = Arc::new(IdentitySwitcher::new(
        controller.clone(),
        remote.clone(),
        RecordingNotifier::new(),
        navigator.clone(),
    ));

    remote.hold("fetch_page");
    let first = tokio::spawn({
        let switcher = switcher.clone();
        async move { switcher.select_identity(&PageId::new("page_11")).await }
    });
    remote.wait_for_calls("fetch_page", 1).await;

    let second = tokio::spawn({
        let switcher = switcher.clone();
        async move { switcher.select_identity(&PageId::new("page_12")).await }
    });
    remote.wait_for_calls("fetch_page", 2).await;
    remote.open("fetch_page");

    let first = first.await.unwrap();
    let second = second.await.unwrap().unwrap();

    assert!(matches!(first, Err(AppError::Superseded(_))));
    assert_eq!(second.page.page_type, PageType::Community);
    assert_eq!(controller.active_page_id(), Some(PageId::new("page_12")));
    assert_eq!(
        switcher.state(),
        SwitcherState::IdentityActive {
            page_id: PageId::new("page_12"),
            stale: false
        }
    );
    assert_eq!(navigator.visits().len(), 1);
    assert_eq!(navigator.visits()[0].0, "community_page");
}

#[tokio::test]
async fn switching_pages_scopes_sub_resources() {
    let remote = academy_remote();
    let controller = Arc::new(PageController::new(
        registry(),
        remote.clone(),
        Arc::new(SnapshotCache::in_memory()),
        RecordingNotifier::new(),
    ));
    let switcher = IdentitySwitcher::new(
        controller.clone(),
        remote.clone(),
        RecordingNotifier::new(),
        RecordingNavigator::new(),
    );
    switcher.refresh_roster().await.unwrap();
    assert_eq!(switcher.roster(&RosterQuery::default()).len(), 2);

    switcher.select_identity(&PageId::new("page_11")).await.unwrap();
    let academy_posts = controller.posts().unwrap();
    let post = academy_posts.create(PostDraft::text("Open trials this weekend")).await.unwrap();
    assert_eq!(post.page_id(), "11");

    switcher.select_identity(&PageId::new("page_12")).await.unwrap();
    let community_posts = controller.posts().unwrap();
    community_posts.refresh().await.unwrap();

    assert!(academy_posts.is_closed());
    assert!(community_posts.is_empty());
    assert_eq!(remote.posts().len(), 1);
}

#[tokio::test]
async fn fields_of_other_page_types_are_rejected() {
    let remote = academy_remote();
    let controller = PageController::new(
        registry(),
        remote.clone(),
        Arc::new(SnapshotCache::in_memory()),
        RecordingNotifier::new(),
    );
    controller.load(&PageId::new("page_12")).await.unwrap();

    match controller.edit_field("capacity", json!(500)).await {
        Err(AppError::Validation(violations)) => assert_eq!(violations[0].field, "capacity"),
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert!(remote.calls_to("save_page").is_empty());
}
