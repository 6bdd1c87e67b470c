//! `GET /movies/{id}/events`: a server-sent event feed of [`MovieEvent`]s.
//!
//! Each request opens its own [`EventStream`](fluxflix::EventStream). Frames
//! carry the event as JSON in `data` and a per-connection sequence number in
//! `id`. The stream is only polled as the client drains the connection, so a
//! slow reader slows its own feed down rather than buffering events. The
//! session ends when the client disconnects or the server shuts down; once
//! shutdown has begun new feeds are refused with `503`.

use super::{AppState, SessionGauge, SessionGuard, error::ApiError};
use crate::server::telemetry::{
    decrement_streams_inflight, increment_events_emitted, increment_requests,
    increment_stream_errors, increment_streams_inflight, record_stream_duration,
};
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use fluxflix::{Cadence, MovieEvent};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Default, Deserialize)]
pub struct EventParams {
    /// Overrides the configured cadence for this connection.
    pub cadence_ms: Option<i64>,
}

pub async fn movie_events(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    Query(params): Query<EventParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>> + Send + 'static>, ApiError> {
    increment_requests();

    if !state.health.is_serving() {
        increment_stream_errors();
        return Err(ApiError::ShuttingDown);
    }

    let opened = params
        .cadence_ms
        .map_or(Ok(state.config.cadence), Cadence::from_millis)
        .and_then(|cadence| state.events.open_stream(movie_id.as_str(), cadence.as_duration()));

    let events = match opened {
        Ok(events) => events,
        Err(err) => {
            increment_stream_errors();
            return Err(err.into());
        }
    };

    let mut session = Session::open(&state.sessions, movie_id, events.cadence());

    let frames = events.map(move |event| session.frame(&event));

    Ok(Sse::new(frames).keep_alive(KeepAlive::new().interval(state.config.keep_alive)))
}

/// Bookkeeping for one connected subscriber, released when the response
/// body is dropped.
struct Session {
    movie_id: String,
    started: Instant,
    emitted: u64,
    _guard: SessionGuard,
}

impl Session {
    fn open(gauge: &SessionGauge, movie_id: String, cadence: Cadence) -> Self {
        increment_streams_inflight();
        tracing::info!(
            %movie_id,
            cadence_ms = cadence.as_millis_ceil(),
            "Event stream opened"
        );
        Self {
            movie_id,
            started: Instant::now(),
            emitted: 0,
            _guard: gauge.enter(),
        }
    }

    fn frame(&mut self, event: &MovieEvent) -> Result<Event, axum::Error> {
        self.emitted += 1;
        increment_events_emitted();
        Event::default()
            .id(self.emitted.to_string())
            .json_data(event)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        decrement_streams_inflight();
        record_stream_duration(elapsed.as_secs_f64() * 1_000.0);
        tracing::info!(
            movie_id = %self.movie_id,
            emitted = self.emitted,
            elapsed_ms = elapsed.as_millis() as u64,
            "Event stream closed"
        );
    }
}
