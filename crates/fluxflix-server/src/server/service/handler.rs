//! Catalog and health endpoints.
//!
//! `GET /movies` answers with a JSON array by default. Clients that accept
//! `application/x-ndjson` (or `application/stream+json`) get one JSON
//! document per line instead, written as the catalog sequence is consumed.

use super::AppState;
use crate::server::telemetry::increment_requests;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use fluxflix::Movie;
use futures::{StreamExt, stream::BoxStream};
use serde::Deserialize;

const NDJSON: &str = "application/x-ndjson";
const STREAM_JSON: &str = "application/stream+json";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Exact title to filter on.
    pub title: Option<String>,
}

pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Response {
    increment_requests();

    let movies: BoxStream<'static, Movie> = match params.title.as_deref() {
        Some(title) => state.movies.find_by_title(title).boxed(),
        None => state.movies.list_all().boxed(),
    };

    if wants_ndjson(&headers) {
        let lines = movies.map(|movie| {
            serde_json::to_vec(&movie).map(|mut line| {
                line.push(b'\n');
                Bytes::from(line)
            })
        });
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static(NDJSON))],
            Body::from_stream(lines),
        )
            .into_response()
    } else {
        Json(movies.collect::<Vec<_>>().await).into_response()
    }
}

/// `404` with an empty body when no movie has this id.
pub async fn get_movie(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    increment_requests();

    match state.movies.get_by_id(&id) {
        Some(movie) => Json(movie).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn health(State(state): State<AppState>) -> Response {
    if state.health.is_serving() {
        (StatusCode::OK, Json(serde_json::json!({ "status": "serving" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "not_serving" })),
        )
            .into_response()
    }
}

fn wants_ndjson(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|media| media.split(';').next().unwrap_or_default().trim())
        .any(|media| media.eq_ignore_ascii_case(NDJSON) || media.eq_ignore_ascii_case(STREAM_JSON))
}
