use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use notehub::api::{demo_notes, MemoryNotesApi};
use notehub::entity::{NewNote, NoteTag, TagFilter};
use notehub::server::notes_api_router;
use notehub::{ApiError, Config, HttpNotesApi, NotesApi, QueryClient, QueryKey};
use tokio_util::sync::CancellationToken;

struct TestServer {
    addr: SocketAddr,
    upstream: Arc<MemoryNotesApi>,
    shutdown: CancellationToken,
}

impl TestServer {
    async fn start() -> Self {
        let upstream = Arc::new(MemoryNotesApi::with_notes(demo_notes(15)));
        let app = notes_api_router(Arc::clone(&upstream));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
                .unwrap();
        });
        Self {
            addr,
            upstream,
            shutdown,
        }
    }

    fn client(&self) -> HttpNotesApi {
        HttpNotesApi::new(&Config {
            api_base_url: format!("http://{}", self.addr),
            request_timeout: Duration::from_secs(5),
            ..Config::default()
        })
        .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[tokio::test]
async fn test_fetch_page_over_http() {
    let server = TestServer::start().await;
    let api = server.client();

    let page = api
        .fetch_notes_page(&QueryKey::new("", 2, 12, TagFilter::All))
        .await
        .unwrap();
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.notes.len(), 3);

    let key = QueryKey::new("note 7", 1, 12, TagFilter::Tag(NoteTag::Work));
    let page = api.fetch_notes_page(&key).await.unwrap();
    assert_eq!(page.notes.len(), 1);
    assert_eq!(page.notes[0].id, "note-7");
}

#[tokio::test]
async fn test_fetch_note_and_not_found() {
    let server = TestServer::start().await;
    let api = server.client();

    let note = api.fetch_note_by_id("note-3").await.unwrap();
    assert_eq!(note.tag, NoteTag::Personal);

    let err = api.fetch_note_by_id("does-not-exist").await.unwrap_err();
    assert_eq!(err, ApiError::not_found("does-not-exist"));
}

#[tokio::test]
async fn test_server_side_validation_maps_to_validation_error() {
    let server = TestServer::start().await;
    let api = server.client();

    // bypass client-side checks by calling the transport directly
    let input = NewNote {
        title: "x".repeat(51),
        content: String::new(),
        tag: NoteTag::Todo,
    };
    let err = api.create_note(&input).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "title"));
    assert_eq!(server.upstream.len(), 15);
}

#[tokio::test]
async fn test_create_over_http_invalidates_lists() {
    let server = TestServer::start().await;
    let client = QueryClient::new(Arc::new(server.client()));
    let key = QueryKey::first_page(12);

    let before = client.fetch_notes(&key).await.unwrap();
    let created = client
        .create_note(&NewNote {
            title: "Quarterly review".to_string(),
            content: "Slides due Friday".to_string(),
            tag: NoteTag::Meeting,
        })
        .await
        .unwrap();

    assert!(client.peek_notes(&key).is_stale);
    let after = client.fetch_notes(&key).await.unwrap();
    assert_eq!(after.notes[0].id, created.id);
    assert_ne!(before, after);
    assert_eq!(server.upstream.calls().list, 2);
    assert_eq!(client.peek_note(&created.id).data, Some(created));
}

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let server = TestServer::start().await;
    server.upstream.set_latency(Some(Duration::from_millis(50)));
    let client = QueryClient::new(Arc::new(server.client()));
    let key = QueryKey::first_page(12);

    let (a, b, c) = tokio::join!(
        client.fetch_notes(&key),
        client.fetch_notes(&key),
        client.fetch_notes(&key)
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert!(c.is_ok());
    assert_eq!(server.upstream.calls().list, 1);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpNotesApi::new(&Config {
        api_base_url: format!("http://{}", addr),
        ..Config::default()
    })
    .unwrap();
    let err = api.fetch_note_by_id("note-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
}
