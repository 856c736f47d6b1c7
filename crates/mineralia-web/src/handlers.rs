use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use mineralia_core::CatalogError;
use mineralia_core::models::MineralListQuery;

use crate::WebState;
use crate::dto::{
    ClassificationResponse, DiscoveryCountryQuery, DiscoveryYearQuery, HealthResponse,
    MineralListResponse, MineralStatisticsResponse, StatusCountQuery, StatusGroupsResponse,
};
use crate::error::{bad_request_response, catalog_error_response};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn route_not_found() -> Response {
    catalog_error_response(
        CatalogError::NotFound("route".to_string()),
        "route.lookup",
        None,
    )
}

pub async fn list_minerals(
    State(state): State<WebState>,
    query: Result<Query<MineralListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return bad_request_response("minerals.list", "query", rejection.body_text());
        }
    };
    let limit = state.catalog.config().resolve_list_limit(query.limit);
    let offset = query.offset.unwrap_or(0);
    let catalog = state.catalog.clone();
    match run_blocking("minerals.list", None, move || catalog.list_minerals(&query)).await {
        Ok(items) => (
            StatusCode::OK,
            Json(MineralListResponse {
                items,
                limit,
                offset,
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub async fn mineral_detail(
    State(state): State<WebState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let id = match parse_mineral_id("minerals.detail", &raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let catalog = state.catalog.clone();
    match run_blocking("minerals.detail", Some(raw_id), move || {
        catalog.mineral_detail(id)
    })
    .await
    {
        Ok(detail) => tagged_json(&headers, &detail),
        Err(response) => response,
    }
}

pub async fn mineral_classification(
    State(state): State<WebState>,
    Path(raw_id): Path<String>,
) -> Response {
    let id = match parse_mineral_id("minerals.classification", &raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let catalog = state.catalog.clone();
    match run_blocking("minerals.classification", Some(raw_id), move || {
        catalog.resolve_classification(id)
    })
    .await
    {
        Ok(classification) => (
            StatusCode::OK,
            Json(ClassificationResponse {
                mineral_id: id,
                classification,
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub async fn mineral_statuses(
    State(state): State<WebState>,
    Path(raw_id): Path<String>,
) -> Response {
    let id = match parse_mineral_id("minerals.statuses", &raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let catalog = state.catalog.clone();
    match run_blocking("minerals.statuses", Some(raw_id), move || {
        catalog.resolve_status_groups(id)
    })
    .await
    {
        Ok(statuses) => (
            StatusCode::OK,
            Json(StatusGroupsResponse {
                mineral_id: id,
                statuses,
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub async fn mineral_statistics(
    State(state): State<WebState>,
    Path(raw_id): Path<String>,
) -> Response {
    let id = match parse_mineral_id("minerals.statistics", &raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let catalog = state.catalog.clone();
    match run_blocking("minerals.statistics", Some(raw_id), move || {
        let related_ids = catalog.related_mineral_ids(id)?;
        let statistics = catalog.resolve_statistics(id, &related_ids)?;
        Ok(MineralStatisticsResponse {
            mineral_id: id,
            related_ids,
            statistics,
        })
    })
    .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(response) => response,
    }
}

pub async fn status_counts(
    State(state): State<WebState>,
    query: Result<Query<StatusCountQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return bad_request_response("statistics.statuses", "query", rejection.body_text());
        }
    };
    let catalog = state.catalog.clone();
    match run_blocking("statistics.statuses", None, move || {
        catalog.status_counts(query.mode.unwrap_or_default(), query.grouped.unwrap_or(false))
    })
    .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(response) => response,
    }
}

pub async fn discovery_year_counts(
    State(state): State<WebState>,
    query: Result<Query<DiscoveryYearQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return bad_request_response(
                "statistics.discovery_years",
                "query",
                rejection.body_text(),
            );
        }
    };
    let catalog = state.catalog.clone();
    match run_blocking("statistics.discovery_years", None, move || {
        catalog.discovery_year_counts(query.min, query.max)
    })
    .await
    {
        Ok(years) => (StatusCode::OK, Json(years)).into_response(),
        Err(response) => response,
    }
}

pub async fn discovery_country_counts(
    State(state): State<WebState>,
    query: Result<Query<DiscoveryCountryQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return bad_request_response(
                "statistics.discovery_countries",
                "query",
                rejection.body_text(),
            );
        }
    };
    let catalog = state.catalog.clone();
    match run_blocking("statistics.discovery_countries", None, move || {
        catalog.discovery_country_counts(query.limit)
    })
    .await
    {
        Ok(countries) => (StatusCode::OK, Json(countries)).into_response(),
        Err(response) => response,
    }
}

fn parse_mineral_id(operation: &str, raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|err| {
        bad_request_response(operation, "id", format!("invalid mineral id {raw}: {err}"))
    })
}

/// Catalog reads are synchronous SQLite calls; keep them off the async workers.
async fn run_blocking<T, F>(
    operation: &'static str,
    mineral: Option<String>,
    f: F,
) -> Result<T, Response>
where
    F: FnOnce() -> mineralia_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(catalog_error_response(err, operation, mineral)),
        Err(join_err) => Err(catalog_error_response(
            CatalogError::Internal(format!("catalog task failed: {join_err}")),
            operation,
            mineral,
        )),
    }
}

fn tagged_json<T: Serialize>(request_headers: &HeaderMap, body: &T) -> Response {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(err) => return catalog_error_response(CatalogError::Json(err), "response.encode", None),
    };
    let etag = format!("\"{}\"", blake3::hash(&bytes).to_hex());
    let not_modified = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.split(',').any(|candidate| candidate.trim() == etag));
    let Ok(etag_value) = HeaderValue::from_str(&etag) else {
        return catalog_error_response(
            CatalogError::Internal("etag is not a valid header value".to_string()),
            "response.encode",
            None,
        );
    };
    if not_modified {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response();
    }
    (
        StatusCode::OK,
        [
            (header::ETAG, etag_value),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
        ],
        bytes,
    )
        .into_response()
}
