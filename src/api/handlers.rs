use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::routes::SNIPPET_PATH;
use crate::models::{parse_roles, RequestContext, Settings};
use crate::snippet::{loader_url, SnippetAsset};
use crate::visibility::VisibilityMatcher;

pub struct AppState {
    pub settings: Settings,
    pub matcher: VisibilityMatcher,
    pub asset: SnippetAsset,
    /// `Cache-Control` max-age for the snippet, in seconds
    pub max_age_secs: u64,
}

impl AppState {
    pub fn new(
        settings: Settings,
        matcher: VisibilityMatcher,
        asset: SnippetAsset,
        max_age_secs: u64,
    ) -> Self {
        Self {
            settings,
            matcher,
            asset,
            max_age_secs,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Deserialize)]
pub struct TrackingQuery {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    /// Comma-separated role identifiers
    #[serde(default)]
    pub roles: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub track: bool,
    pub script_path: String,
    pub loader_url: String,
}

/// Serve the generated snippet with caching headers
pub async fn serve_snippet(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let asset = &state.asset;

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|value| asset.matches_etag(value));

    let cache_control = format!("public, max-age={}", state.max_age_secs);

    // A 304 carries the same validators and caching headers as the 200
    if not_modified {
        debug!("Snippet not modified");
        return (
            StatusCode::NOT_MODIFIED,
            [
                (header::CACHE_CONTROL, cache_control),
                (header::ETAG, asset.etag().to_string()),
            ],
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/javascript; charset=utf-8".to_string(),
            ),
            (header::CACHE_CONTROL, cache_control),
            (header::ETAG, asset.etag().to_string()),
        ],
        asset.body().to_string(),
    )
        .into_response()
}

/// Decide whether a page view should carry the snippet
pub async fn tracking_decision(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrackingQuery>,
) -> Result<Json<TrackingResponse>, (StatusCode, Json<ErrorResponse>)> {
    let path = match query.path {
        Some(path) if !path.trim().is_empty() => path,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "path is required".to_string(),
                }),
            ))
        }
    };

    let roles = parse_roles(query.roles.as_deref().unwrap_or_default());
    let mut context = RequestContext::new(path, roles);
    if let Some(alias) = query.alias.filter(|alias| !alias.is_empty()) {
        context = context.with_alias(alias);
    }

    let track = state.matcher.should_track(&state.settings, &context);

    Ok(Json(TrackingResponse {
        track,
        script_path: SNIPPET_PATH.to_string(),
        loader_url: loader_url(&state.settings.account_id, &state.settings.snippet_version),
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
