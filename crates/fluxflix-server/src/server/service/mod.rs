//! HTTP surface of the movie catalog.
//!
//! ## Structure
//!
//! - [`handler`] - catalog and health endpoints.
//! - [`events`] - the per-movie server-sent event feed.
//! - [`error`] - mapping of library errors onto HTTP responses.
//!
//! Every route shares one [`AppState`], built once in `main.rs`.

pub mod error;
pub mod events;
pub mod handler;

use crate::server::config::ServerConfig;
use axum::{Router, http::Method, routing::get};
use core::time::Duration;
use fluxflix::{EventStreamGenerator, InMemoryMovieStore, MovieQueryService, SystemClock, TokioSleep};
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Event generator used by the server: wall clock and Tokio timers.
pub type Generator = EventStreamGenerator<SystemClock, TokioSleep>;

#[derive(Clone)]
pub struct AppState {
    pub movies: MovieQueryService,
    pub events: Generator,
    pub config: Arc<ServerConfig>,
    pub health: HealthReporter,
    pub sessions: SessionGauge,
}

impl AppState {
    /// Builds state over an empty in-memory catalog.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            movies: MovieQueryService::new(Arc::new(InMemoryMovieStore::new())),
            events: EventStreamGenerator::new(SystemClock, TokioSleep),
            config: Arc::new(config),
            health: HealthReporter::default(),
            sessions: SessionGauge::default(),
        }
    }

    /// Marks the service as not serving, ends every open event stream and
    /// waits up to `SHUTDOWN_TIMEOUT` for their connections to wind down.
    pub async fn shutdown(&self) {
        tracing::info!("Refusing new event streams");
        self.health.set_not_serving();
        self.events.shutdown();

        tracing::info!(
            "Draining in-flight streams ({} active)",
            self.sessions.active()
        );
        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            while self.sessions.active() > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::debug!("All in-flight streams drained successfully"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} streams still active)",
                self.sessions.active()
            ),
        }
    }
}

/// Serving status published on `/health`.
#[derive(Clone, Debug, Default)]
pub struct HealthReporter {
    not_serving: Arc<AtomicBool>,
}

impl HealthReporter {
    pub fn set_not_serving(&self) {
        self.not_serving.store(true, Ordering::Release);
    }

    pub fn is_serving(&self) -> bool {
        !self.not_serving.load(Ordering::Acquire)
    }
}

/// Counts event streams that are currently attached to a client.
#[derive(Clone, Debug, Default)]
pub struct SessionGauge {
    active: Arc<AtomicUsize>,
}

impl SessionGauge {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Registers a session; it is released when the returned guard drops.
    pub fn enter(&self) -> SessionGuard {
        self.active.fetch_add(1, Ordering::Relaxed);
        SessionGuard {
            active: Arc::clone(&self.active),
        }
    }
}

#[derive(Debug)]
pub struct SessionGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/movies", get(handler::list_movies))
        .route("/movies/{id}", get(handler::get_movie))
        .route("/movies/{id}/events", get(events::movie_events))
        .route("/health", get(handler::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
