// axum application setup and server startup

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{handlers::gallery, middleware::security::add_security_headers};
use crate::config::AppConfig;
use crate::gallery::{Gallery, MediaCodec};

pub const API_PREFIX: &str = "/api/v1";

/// shared application state
#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
}

impl AppState {
    pub fn new(gallery: Gallery) -> Self {
        Self {
            gallery: Arc::new(gallery),
        }
    }
}

/// create the axum application with the default image codec
pub fn create_app(config: &AppConfig) -> Router {
    build_router(AppState::new(Gallery::new(&config.gallery)))
}

/// create the application around a specific codec
pub fn create_app_with_codec(config: &AppConfig, codec: Arc<dyn MediaCodec>) -> Router {
    build_router(AppState::new(Gallery::with_codec(&config.gallery, codec)))
}

fn build_router(app_state: AppState) -> Router {
    let api = Router::new()
        .route("/ping", get(gallery::ping))
        .route("/albums", get(gallery::albums))
        .route("/list", get(gallery::list))
        .route("/thumbnails", get(gallery::thumbnails))
        .route("/image", get(gallery::image))
        .route("/video", get(gallery::video));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(add_security_headers)),
        )
        .with_state(app_state)
}

/// start the http server
pub async fn start_server(config: AppConfig) -> Result<()> {
    tokio::fs::create_dir_all(&config.gallery.thumb_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create thumbnail directory: {}",
                config.gallery.thumb_dir.display()
            )
        })?;

    // create socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid host/port combination")?;

    // log startup information
    info!("starting galleryd v{} at http://{}", env!("CARGO_PKG_VERSION"), addr);
    info!(
        "batch concurrency: {}, item timeout: {:?}",
        config.gallery.concurrency, config.gallery.item_timeout_secs
    );

    let app = create_app(&config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind to address")?;

    info!("server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
