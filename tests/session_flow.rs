use std::sync::Arc;
use std::time::Duration;

use notehub::api::{demo_notes, MemoryNotesApi};
use notehub::draft::{DraftPatch, DraftStore};
use notehub::entity::NoteTag;
use notehub::server::{ListProps, Prefetched};
use notehub::view::Surface;
use notehub::{Config, NavigationLocation, NotesSession, QueryClient, QueryStatus};
use tokio::time::Instant;

fn api() -> Arc<MemoryNotesApi> {
    Arc::new(MemoryNotesApi::with_notes(demo_notes(15)))
}

fn boot(
    api: &Arc<MemoryNotesApi>,
    drafts: &DraftStore,
    location: &str,
) -> NotesSession<MemoryNotesApi> {
    NotesSession::boot(
        QueryClient::new(Arc::clone(api)),
        drafts.clone(),
        &Config::default(),
        NavigationLocation::parse(location).unwrap(),
        None,
    )
}

#[tokio::test(start_paused = true)]
async fn test_overlay_then_reload_keeps_draft() {
    let api = api();
    let drafts = DraftStore::new();
    let mut session = boot(&api, &drafts, "/notes/filter/Todo");
    session.settle().await;

    session.open_create();
    let rendered = session.rendered();
    assert_eq!(rendered.overlay, Some(Surface::Create));
    assert_eq!(rendered.list.as_deref(), Some("/notes/filter/Todo"));
    assert!(session.list_result().unwrap().is_success());

    session.update_draft(DraftPatch::title("Call the plumber"));
    session.update_draft(DraftPatch::tag(NoteTag::Personal));

    // reload at the same location: a new session sharing the draft store
    let here = session.location().to_string();
    drop(session);
    let reloaded = boot(&api, &drafts, &here);
    let rendered = reloaded.rendered();
    assert_eq!(rendered.full_page, Some(Surface::Create));
    assert_eq!(rendered.list, None);
    assert!(reloaded.list_result().is_none());

    let draft = reloaded.drafts().get_draft();
    assert_eq!(draft.title, "Call the plumber");
    assert_eq!(draft.tag, NoteTag::Personal);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_then_submit() {
    let api = api();
    let drafts = DraftStore::new();
    let mut session = boot(&api, &drafts, "/notes/filter/All?page=2");
    session.settle().await;

    session.open_create();
    session.update_draft(DraftPatch::title("Weekly plan"));
    assert!(session.cancel_create());
    assert_eq!(session.location().to_string(), "/notes/filter/All?page=2");
    assert_eq!(drafts.get_draft().title, "Weekly plan");

    session.open_create();
    assert_eq!(drafts.get_draft().title, "Weekly plan");
    session.submit_draft().await.unwrap();
    assert!(drafts.is_empty());
    assert_eq!(session.location().to_string(), "/notes/filter/All?page=2");
    assert_eq!(api.calls().create, 1);
}

#[tokio::test(start_paused = true)]
async fn test_submit_from_full_page_returns_to_all_notes() {
    let api = api();
    let drafts = DraftStore::new();
    let mut session = boot(&api, &drafts, "/notes/action/create");

    session.update_draft(DraftPatch::title("Straight from a link"));
    let note = session.submit_draft().await.unwrap();
    assert_eq!(session.location(), &NavigationLocation::all_notes());

    session.settle().await;
    let page = session.list_result().unwrap().data.unwrap();
    assert_eq!(page.notes[0].id, note.id);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_search_issues_one_request() {
    let api = api();
    let mut session = boot(&api, &DraftStore::new(), "/notes/filter/All");
    session.settle().await;
    assert_eq!(api.calls().list, 1);

    for text in ["s", "sh", "sho", "shop"] {
        session.set_search(text, Instant::now());
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!session.advance(Instant::now()));
    }
    assert_eq!(api.calls().list, 1);

    assert!(session.wait_for_search().await);
    session.settle().await;
    assert_eq!(api.calls().list, 2);
    assert_eq!(session.location().to_string(), "/notes/filter/All?search=shop");
    let page = session.list_result().unwrap().data.unwrap();
    assert!(page.notes.iter().all(|n| n.tag == NoteTag::Shopping));
}

#[tokio::test(start_paused = true)]
async fn test_server_snapshot_boots_without_requests() {
    let api = api();
    let server = QueryClient::new(Arc::clone(&api));
    let location = NavigationLocation::parse("/notes/filter/Meeting").unwrap();
    server
        .prefetch_notes(&location.query_key(Config::default().page_size).unwrap())
        .await;

    // what the prefetch endpoint would ship to the browser
    let wire = serde_json::to_string(&Prefetched {
        props: ListProps {
            initial_page: location.page,
            initial_search: location.search.clone(),
            initial_tag: location.filter().unwrap(),
        },
        state: server.dehydrate(),
    })
    .unwrap();
    assert_eq!(api.calls().list, 1);

    let shipped: Prefetched<ListProps> = serde_json::from_str(&wire).unwrap();
    let session = NotesSession::boot(
        QueryClient::new(Arc::clone(&api)),
        DraftStore::new(),
        &Config::default(),
        location,
        Some(shipped.state),
    );
    let result = session.list_result().unwrap();
    assert_eq!(result.status, QueryStatus::Success);
    assert_eq!(result.data.unwrap().notes.len(), 3);
    assert_eq!(api.calls().list, 1);
}
