use crate::catalog::{CatalogStore, Pagination, Stats};
use crate::config::Config;
use crate::constants;
use crate::error::CatalogError;
use crate::slots::{schedule_staging_cleanup, SlotManager};
use crate::types::{freshness_token, Product};
use axum::{
    extract::{ConnectInfo, Multipart, Path, Query},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Router,
};
use hyper::Server;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "product-image-tool",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    products: Vec<Product>,
    pagination: Pagination,
    stats: Stats,
}

/// Paginated product listing plus aggregate image-coverage counts.
async fn list_products(
    Extension(store): Extension<Arc<CatalogStore>>,
    Extension(config): Extension<Arc<Config>>,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(config.listing.page_size);
    let (products, pagination) = store.page(page, limit);
    Json(ListResponse { products, pagination, stats: store.stats() })
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn failure(err: &CatalogError) -> (StatusCode, Json<UploadResponse>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(UploadResponse {
            success: false,
            url: None,
            log: None,
            error: Some(err.to_string()),
        }),
    )
}

/// Pulls the `image` field out of the multipart body and stages it on disk.
async fn stage_upload(
    uploads_dir: &std::path::Path,
    multipart: &mut Multipart,
) -> Result<(PathBuf, Vec<u8>), CatalogError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CatalogError::invalid(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CatalogError::invalid(format!("failed to read upload: {e}")))?;
        let staged = uploads_dir.join(format!(
            "upload-{}-{:08x}",
            freshness_token(),
            rand::random::<u32>()
        ));
        tokio::fs::write(&staged, &bytes).await?;
        return Ok((staged, bytes.to_vec()));
    }
    Err(CatalogError::invalid("missing 'image' field"))
}

/// Upload one image into one (product, slot) pair.
async fn upload_single(
    Extension(manager): Extension<Arc<SlotManager>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path((id, index)): Path<(String, i64)>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let (staged, bytes) = match stage_upload(manager.uploads_dir(), &mut multipart).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!(origin = %addr.ip(), "Upload rejected: {e}");
            return failure(&e).into_response();
        }
    };

    let result = manager.set_slot(&id, index, bytes).await;
    // The staged payload has served its purpose either way
    schedule_staging_cleanup(staged);

    match result {
        Ok(outcome) => {
            info!(origin = %addr.ip(), product = %id, slot = index + 1, "Upload committed");
            Json(UploadResponse {
                success: true,
                log: Some(format!(
                    "Uploaded image {} - {} ({}KB)",
                    index + 1,
                    outcome.filename,
                    outcome.size_kb
                )),
                url: Some(outcome.url),
                error: None,
            })
            .into_response()
        }
        Err(e) => {
            warn!(origin = %addr.ip(), product = %id, slot = index + 1, "Upload failed: {e}");
            failure(&e).into_response()
        }
    }
}

/// Clear one image slot.
async fn remove_image(
    Extension(manager): Extension<Arc<SlotManager>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path((id, index)): Path<(String, i64)>,
) -> impl IntoResponse {
    match manager.clear_slot(&id, index).await {
        Ok(()) => {
            info!(origin = %addr.ip(), product = %id, slot = index + 1, "Image cleared");
            Json(serde_json::json!({ "success": true })).into_response()
        }
        Err(e) => {
            warn!(origin = %addr.ip(), product = %id, slot = index + 1, "Remove failed: {e}");
            failure(&e).into_response()
        }
    }
}

/// Re-serialize the catalog and return the backup CSV as a download.
async fn download_csv(
    Extension(store): Extension<Arc<CatalogStore>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    store.persist();
    match tokio::fs::read(store.backup_path()).await {
        Ok(bytes) => {
            info!(origin = %addr.ip(), "CSV downloaded");
            (
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", constants::BACKUP_CSV),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            warn!(origin = %addr.ip(), "CSV download failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("CSV export failed: {e}")).into_response()
        }
    }
}

/// Create the HTTP server with all routes
pub fn create_server(
    store: Arc<CatalogStore>,
    manager: Arc<SlotManager>,
    config: Arc<Config>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(list_products))
        .route("/upload-single/:id/:index", post(upload_single))
        .route("/remove-image/:id/:index", post(remove_image))
        .route("/download-csv", get(download_csv))
        // Operator UI and the /images directory live under public/
        .fallback_service(ServeDir::new(config.paths.public_dir.clone()))
        .layer(axum::extract::DefaultBodyLimit::max(constants::MAX_UPLOAD_BYTES))
        .layer(Extension(store))
        .layer(Extension(manager))
        .layer(Extension(config))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    store: Arc<CatalogStore>,
    manager: Arc<SlotManager>,
    config: Arc<Config>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(store, manager, config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 Product image tool running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📦 Products API: http://localhost:{port}/api/products");

    Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}
