//! HTTP API
use std::num::NonZeroU16;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::services::ServeDir;
use tracing::{error, info};
use uuid::Uuid;

use crate::constants::{IMAGE_ROUTE, MAX_BATCH_SIZE};
use crate::db::entities::{collections, items};
use crate::error::MintError;
use crate::generator::{GenerateRequest, Generator};
use crate::item::GeneratedItem;

mod middleware;

use middleware::Owner;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    generator: Arc<Generator>,
    db: Arc<DatabaseConnection>,
    batch_size: usize,
}

impl AppState {
    fn new(generator: Arc<Generator>, db: Arc<DatabaseConnection>, batch_size: usize) -> Self {
        Self {
            generator,
            db,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }
}

#[derive(Deserialize, Debug)]
struct BatchRequest {
    #[serde(flatten)]
    request: GenerateRequest,
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Serialize, Debug)]
struct BatchResponse {
    items: Vec<GeneratedItem>,
}

#[derive(Deserialize, Debug)]
struct CollectionAssignment {
    collection_id: Option<i32>,
}

#[derive(Deserialize, Debug)]
struct NewCollection {
    name: String,
    #[serde(default)]
    tags: Vec<String>,
}

async fn generate_handler(
    owner: Owner,
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GeneratedItem>, MintError> {
    let item = state.generator.generate(&owner.id, &request).await?;
    Ok(Json(item))
}

async fn generate_batch_handler(
    owner: Owner,
    State(state): State<AppState>,
    Json(batch): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, MintError> {
    let count = batch.count.unwrap_or(state.batch_size);
    if count == 0 || count > MAX_BATCH_SIZE {
        return Err(MintError::BadRequest(format!(
            "Batch size must be between 1 and {MAX_BATCH_SIZE}"
        )));
    }
    let items = state
        .generator
        .generate_batch(&owner.id, &batch.request, count, |progress| {
            info!(
                "Batch {}/{} produced {} item {}",
                progress.completed, progress.total, progress.item.rarity, progress.item.id
            );
        })
        .await?;
    Ok(Json(BatchResponse { items }))
}

async fn list_items_handler(
    owner: Owner,
    State(state): State<AppState>,
    Query(query): Query<items::ItemQuery>,
) -> Result<Json<items::ItemPage>, MintError> {
    let page = items::list_for_owner(state.db.as_ref(), &owner.id, &query).await?;
    Ok(Json(page))
}

async fn toggle_favorite_handler(
    owner: Owner,
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Value>, MintError> {
    let is_favorite = items::toggle_favorite(state.db.as_ref(), &owner.id, &id)
        .await?
        .ok_or_else(|| MintError::NotFound(format!("item {id}")))?;
    Ok(Json(json!({ "is_favorite": is_favorite })))
}

async fn set_collection_handler(
    owner: Owner,
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
    Json(assignment): Json<CollectionAssignment>,
) -> Result<StatusCode, MintError> {
    if let Some(collection_id) = assignment.collection_id {
        collections::find_for_owner(state.db.as_ref(), &owner.id, collection_id)
            .await?
            .ok_or_else(|| MintError::NotFound(format!("collection {collection_id}")))?;
    }
    if items::set_collection(state.db.as_ref(), &owner.id, &id, assignment.collection_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(MintError::NotFound(format!("item {id}")))
    }
}

async fn delete_item_handler(
    owner: Owner,
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<StatusCode, MintError> {
    if items::delete(state.db.as_ref(), &owner.id, &id).await? {
        info!("Deleted item {id} for {}", owner.id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(MintError::NotFound(format!("item {id}")))
    }
}

async fn stats_handler(
    owner: Owner,
    State(state): State<AppState>,
) -> Result<Json<items::OwnerStats>, MintError> {
    let stats = items::owner_stats(state.db.as_ref(), &owner.id).await?;
    Ok(Json(stats))
}

async fn list_collections_handler(
    owner: Owner,
    State(state): State<AppState>,
) -> Result<Json<Vec<collections::CollectionView>>, MintError> {
    let views = collections::list_for_owner(state.db.as_ref(), &owner.id)
        .await?
        .iter()
        .map(collections::Model::view)
        .collect();
    Ok(Json(views))
}

async fn create_collection_handler(
    owner: Owner,
    State(state): State<AppState>,
    Json(new): Json<NewCollection>,
) -> Result<(StatusCode, Json<collections::CollectionView>), MintError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(MintError::BadRequest(
            "Collection name cannot be empty".to_string(),
        ));
    }
    let existing = collections::list_for_owner(state.db.as_ref(), &owner.id).await?;
    if existing.iter().any(|collection| collection.name == name) {
        return Err(MintError::BadRequest(format!(
            "Collection {name} already exists"
        )));
    }
    let created = collections::create(state.db.as_ref(), &owner.id, name, &new.tags).await?;
    info!("Created collection {} for {}", created.id, owner.id);
    Ok((StatusCode::CREATED, Json(created.view())))
}

fn create_router(image_dir: &Path) -> Router<AppState> {
    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/generate/batch", post(generate_batch_handler))
        .route("/api/items", get(list_items_handler))
        .route("/api/items/{id}", axum::routing::delete(delete_item_handler))
        .route("/api/items/{id}/favorite", post(toggle_favorite_handler))
        .route("/api/items/{id}/collection", put(set_collection_handler))
        .route("/api/stats", get(stats_handler))
        .route(
            "/api/collections",
            get(list_collections_handler).post(create_collection_handler),
        )
        .nest_service(&format!("/{IMAGE_ROUTE}"), ServeDir::new(image_dir))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Binds the listener and serves the API until a shutdown signal arrives.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    generator: Arc<Generator>,
    db: Arc<DatabaseConnection>,
    batch_size: usize,
    image_dir: &Path,
) -> Result<(), anyhow::Error> {
    let app = create_router(image_dir).with_state(AppState::new(generator, db, batch_size));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
