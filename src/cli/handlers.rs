use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::api::{demo_notes, validate_new_note, HttpNotesApi, MemoryNotesApi, NotesApi};
use crate::config::Config;
use crate::entity::{NewNote, Note, NoteTag, NotesPage, TagFilter};
use crate::error::{ApiError, NotehubError, Result};
use crate::query::{QueryClient, QueryKey};
use crate::server;
use crate::util::truncate_chars;
use crate::view::{NavigationLocation, Route};

/// Number of sample notes behind `--demo`.
const DEMO_NOTE_COUNT: usize = 40;

/// Global flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub api_url: Option<String>,
    pub demo: bool,
}

impl GlobalOptions {
    /// Environment config with command-line overrides applied.
    fn config(&self) -> Result<Config> {
        let mut config = Config::from_env()?;
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
            config.validate()?;
        }
        Ok(config)
    }
}

fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn demo_api() -> Arc<MemoryNotesApi> {
    Arc::new(MemoryNotesApi::with_notes(demo_notes(DEMO_NOTE_COUNT)))
}

fn parse_tag(value: &str) -> Result<NoteTag> {
    value
        .parse()
        .map_err(|e: String| NotehubError::Api(ApiError::validation("tag", e)))
}

fn parse_filter(value: Option<&str>) -> Result<TagFilter> {
    match value {
        None => Ok(TagFilter::All),
        Some(v) => v
            .parse()
            .map_err(|e: String| NotehubError::Api(ApiError::validation("tag", e))),
    }
}

// ============================================================================
// serve
// ============================================================================

pub fn handle_serve(global: GlobalOptions, bind: Option<String>) -> Result<()> {
    let mut config = global.config()?;
    if let Some(bind) = bind {
        config.bind = bind;
    }

    let app = if global.demo {
        let api = demo_api();
        tracing::info!(notes = api.len(), "serving demo notes under /api");
        server::router(Arc::clone(&api), config.page_size)
            .nest("/api", server::notes_api_router(api))
    } else {
        let api = Arc::new(HttpNotesApi::new(&config)?);
        tracing::info!(upstream = api.base_url(), "using remote Notes API");
        server::router(api, config.page_size)
    };

    let rt = runtime()?;
    rt.block_on(async {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
            trigger.cancel();
        });
        server::serve(app, &config.bind, shutdown).await
    })
}

// ============================================================================
// list / show / create
// ============================================================================

pub fn handle_list(
    global: GlobalOptions,
    tag: Option<String>,
    page: u32,
    search: Option<String>,
    json: bool,
) -> Result<()> {
    let config = global.config()?;
    let filter = parse_filter(tag.as_deref())?;
    let key = QueryKey::new(search.unwrap_or_default(), page, config.page_size, filter);

    let rt = runtime()?;
    let result = if global.demo {
        rt.block_on(QueryClient::new(demo_api()).fetch_notes(&key))
    } else {
        let api = Arc::new(HttpNotesApi::new(&config)?);
        rt.block_on(QueryClient::new(api).fetch_notes(&key))
    }?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_page(&result, key.page));
    }
    Ok(())
}

pub fn handle_show(global: GlobalOptions, id: String, json: bool) -> Result<()> {
    let config = global.config()?;
    let rt = runtime()?;
    let note = if global.demo {
        rt.block_on(QueryClient::new(demo_api()).fetch_note(&id))
    } else {
        let api = Arc::new(HttpNotesApi::new(&config)?);
        rt.block_on(QueryClient::new(api).fetch_note(&id))
    }?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        print!("{}", format_note(&note));
    }
    Ok(())
}

pub fn handle_create(
    global: GlobalOptions,
    title: String,
    content: String,
    tag: String,
    json: bool,
) -> Result<()> {
    let input = NewNote {
        title,
        content,
        tag: parse_tag(&tag)?,
    };
    validate_new_note(&input)?;

    let config = global.config()?;
    let rt = runtime()?;
    let note = if global.demo {
        rt.block_on(QueryClient::new(demo_api()).create_note(&input))
    } else {
        let api = Arc::new(HttpNotesApi::new(&config)?);
        rt.block_on(QueryClient::new(api).create_note(&input))
    }?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Created note {} [{}] {}", note.id, note.tag, note.title);
    }
    Ok(())
}

// ============================================================================
// prefetch
// ============================================================================

pub fn handle_prefetch(global: GlobalOptions, location: String) -> Result<()> {
    let config = global.config()?;
    let location = NavigationLocation::parse(&location)?;

    let rt = runtime()?;
    let snapshot = if global.demo {
        rt.block_on(prefetch_location(demo_api(), &location, config.page_size))
    } else {
        let api = Arc::new(HttpNotesApi::new(&config)?);
        rt.block_on(prefetch_location(api, &location, config.page_size))
    };

    println!("{}", snapshot?);
    Ok(())
}

/// Dehydrated snapshot JSON for what `location` renders.
async fn prefetch_location<A: NotesApi>(
    api: Arc<A>,
    location: &NavigationLocation,
    page_size: u32,
) -> Result<String> {
    let client = QueryClient::new(api);
    match &location.route {
        Route::Notes { .. } => {
            if let Some(key) = location.query_key(page_size) {
                client.prefetch_notes(&key).await;
            }
        }
        Route::NotePreview { id } => client.prefetch_note(id).await,
        Route::CreateNote => {}
    }
    client.dehydrate().to_json()
}

// ============================================================================
// text output
// ============================================================================

fn format_page(page: &NotesPage, number: u32) -> String {
    if page.notes.is_empty() {
        return "No notes found.\n".to_string();
    }
    let mut out = format!("Notes (page {} of {}):\n\n", number, page.total_pages);
    for note in &page.notes {
        out.push_str(&format!("  [{}] {} ({})\n", note.tag, note.title, note.id));
        if !note.content.is_empty() {
            out.push_str(&format!("      {}\n", truncate_chars(&note.content, 60)));
        }
    }
    out
}

fn format_note(note: &Note) -> String {
    let mut out = format!("{}\n", note.title);
    out.push_str(&format!("  id:      {}\n", note.id));
    out.push_str(&format!("  tag:     {}\n", note.tag));
    out.push_str(&format!(
        "  created: {}\n",
        note.created_at.format("%Y-%m-%d %H:%M")
    ));
    if let Some(updated) = note.updated_at {
        out.push_str(&format!("  updated: {}\n", updated.format("%Y-%m-%d %H:%M")));
    }
    if !note.content.is_empty() {
        out.push('\n');
        out.push_str(&note.content);
        out.push('\n');
    }
    out
}
