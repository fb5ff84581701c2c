// src/server/mod.rs

//! HTTP surface: the terminal WebSocket and the lesson/step routes.

pub mod lessons;
pub mod socket;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::content::LessonCatalog;
use crate::exec::{ShellCommandExecutor, StepRunner};
use crate::terminal::SessionRegistry;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub steps: StepRunner<LessonCatalog, ShellCommandExecutor>,
    connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        registry: SessionRegistry,
        steps: StepRunner<LessonCatalog, ShellCommandExecutor>,
    ) -> Self {
        Self {
            registry,
            steps,
            connections: Arc::new(AtomicU64::new(1)),
        }
    }

    /// A fresh identity for an accepted terminal connection.
    pub fn next_connection_id(&self) -> String {
        format!("term-{}", self.connections.fetch_add(1, Ordering::Relaxed))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/term", get(socket::terminal_socket))
        .route("/api/lessons", get(lessons::list_lessons))
        .route("/api/lessons/:lesson_id", get(lessons::get_lesson))
        .route(
            "/api/lessons/:lesson_id/steps/:step_id/verify",
            post(lessons::verify_step),
        )
        .route(
            "/api/lessons/:lesson_id/steps/:step_id/runBefore",
            post(lessons::run_before_step),
        )
        .route(
            "/api/lessons/:lesson_id/steps/:step_id/runAfter",
            post(lessons::run_after_step),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then close every terminal session.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("reading listener address")?;
    info!(%addr, "turtorial server listening");

    let registry = state.registry.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("running HTTP server")?;

    registry.close_all().await;
    info!("server stopped");
    Ok(())
}
