//! HTTP route layer over the content store
//!
//! Thin consumers of the query interface: absence becomes a 404, store
//! errors become a generic 500. The recently-updated flag on listings is
//! computed here, not by the store.

use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::{ContentStore, JournalEntry};
use crate::error::ContentError;
use crate::Site;

/// Window for the "Updated" tag on listings: a fixed 365 days, not
/// calendar-year-aware.
const RECENTLY_UPDATED_WINDOW_DAYS: i64 = 365;

/// Server state
struct ServerState {
    store: ContentStore,
}

/// Start the content server.
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let store = ContentStore::new(site);
    let app = router(store, &site.content_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router over a store. Entry media under the content directory is
/// served at `/content`, where compiled bodies point their image URLs.
pub fn router(store: ContentStore, content_dir: &FsPath) -> Router {
    let state = Arc::new(ServerState { store });

    Router::new()
        .route("/journal", get(list_published))
        .route("/journal/:slug", get(show_entry))
        .route("/archive", get(list_archived))
        .route("/pages/:slug", get(show_page))
        .nest_service("/content", ServeDir::new(content_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// True iff the entry was updated within the fixed window before `now`.
pub fn is_recently_updated(updated: Option<NaiveDate>, now: DateTime<Utc>) -> bool {
    match updated {
        Some(date) => {
            let updated_at = date.and_time(NaiveTime::MIN).and_utc();
            now.signed_duration_since(updated_at)
                < Duration::days(RECENTLY_UPDATED_WINDOW_DAYS)
        }
        None => false,
    }
}

async fn list_published(State(state): State<Arc<ServerState>>) -> Response {
    match state.store.published_entries().await {
        Ok(entries) => {
            let now = Utc::now();
            let entries: Vec<JournalEntry> = entries
                .into_iter()
                .map(|mut entry| {
                    entry.is_recently_updated =
                        Some(is_recently_updated(entry.metadata.updated, now));
                    entry
                })
                .collect();
            Json(entries).into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn list_archived(State(state): State<Arc<ServerState>>) -> Response {
    match state.store.archived_entries().await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn show_entry(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.store.entry_by_slug(&slug).await {
        Ok(Some(entry)) => Json(entry).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Journal entry not found").into_response(),
        Err(e) => internal_error(e),
    }
}

async fn show_page(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.store.page(&slug).await {
        Ok(Some(page)) => Json(page).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: ContentError) -> Response {
    tracing::error!(error = %e, "content request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
