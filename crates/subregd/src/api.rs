//! HTTP JSON API for the subdomain registry
//!
//! Thin glue around the registry store: handlers sanitize and validate
//! input, invoke the store, mirror changes to the DNS provisioner on a
//! best-effort basis, and format JSON envelope responses.
//!
//! Provisioner calls always happen outside the store's lock — before the
//! durable create and before/after the other mutations — and their failures
//! are logged, never surfaced as a request failure.
//!
//! Routes:
//! - `GET    /health` - service health document
//! - `GET    /api/subdomains` - list, filter by `tld`, search with `q`
//! - `POST   /api/subdomains` - create (201, 409 on duplicate)
//! - `GET    /api/subdomains/{tld}/{subdomain}` - fetch one (404 if absent)
//! - `PUT    /api/subdomains/{tld}/{subdomain}` - partial update
//! - `DELETE /api/subdomains/{tld}/{subdomain}` - delete, with DNS cleanup
//! - `GET    /api/config` - the registry configuration document
//! - `GET    /api/stats` - aggregate counts by tld, status, and SSL

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::warn;

use subreg_core::record::{NewRecord, RecordPatch};
use subreg_core::{Error, validate};

use crate::state::AppState;

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/subdomains", get(list_subdomains).post(create_subdomain))
        .route(
            "/api/subdomains/{tld}/{subdomain}",
            get(get_subdomain)
                .put(update_subdomain)
                .delete(delete_subdomain),
        )
        .route("/api/config", get(get_config))
        .route("/api/stats", get(get_stats))
        .with_state(state)
}

/// Client-visible request failure
///
/// Store and validation errors map onto distinct status codes; everything
/// unexpected collapses into a generic 500 that leaks no internals.
#[derive(Debug)]
pub enum ApiError {
    /// 400: malformed subdomain or unrecognized TLD
    BadRequest(String),
    /// 404: key absent
    NotFound(String),
    /// 409: create on an existing key
    Conflict(String),
    /// 500: anything else, details kept in the log
    Internal,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::AlreadyExists(_) => Self::Conflict("Subdomain already exists".to_string()),
            Error::NotFound(_) => Self::NotFound("Subdomain not found".to_string()),
            Error::InvalidInput(msg) => Self::BadRequest(msg),
            other => {
                tracing::error!(error = %other, "internal error while handling request");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "subreg",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Query parameters for the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Restrict results to one TLD code
    pub tld: Option<String>,
    /// Case-insensitive substring search
    pub q: Option<String>,
}

pub async fn list_subdomains(
    State(app): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let records = match &params.q {
        Some(query) => app.store.search(query).await?,
        None => {
            let mut all: Vec<_> = app.store.get_all().await?.into_values().collect();
            all.sort_by_key(|record| record.key());
            all
        }
    };

    let records: Vec<_> = match &params.tld {
        Some(tld) => records.into_iter().filter(|r| &r.tld == tld).collect(),
        None => records,
    };

    Ok(Json(json!({
        "success": true,
        "count": records.len(),
        "subdomains": records,
    })))
}

pub async fn get_subdomain(
    State(app): State<AppState>,
    Path((tld, subdomain)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let subdomain = validate::sanitize(&subdomain);
    let record = app
        .store
        .get(&subdomain, &tld)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subdomain not found".to_string()))?;

    Ok(Json(json!({ "success": true, "subdomain": record })))
}

/// Request body for subdomain creation
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequest {
    pub subdomain: String,
    pub tld: String,
    pub target: Option<String>,
    pub record_type: Option<String>,
    pub ssl_enabled: Option<bool>,
    pub metadata: Option<HashMap<String, Value>>,
}

pub async fn create_subdomain(
    State(app): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let subdomain = validate::sanitize(&req.subdomain);
    if !validate::is_valid(&subdomain) {
        return Err(ApiError::BadRequest("Invalid subdomain format".to_string()));
    }

    let config = app.store.get_config().await?;
    let Some(base_domain) = app.base_domain(&req.tld) else {
        return Err(ApiError::BadRequest("Invalid TLD".to_string()));
    };
    if !config.allows_tld(&req.tld) {
        return Err(ApiError::BadRequest("Invalid TLD".to_string()));
    }

    // Cheap precheck so a known-duplicate key skips provisioning; the store's
    // atomic create still decides races.
    if app.store.get(&subdomain, &req.tld).await?.is_some() {
        return Err(ApiError::Conflict("Subdomain already exists".to_string()));
    }

    let target = req
        .target
        .clone()
        .unwrap_or_else(|| config.default_target.clone());
    let record_type = req.record_type.clone().unwrap_or_else(|| "A".to_string());

    // Best-effort provisioning, outside the store lock
    let mut dns_record_id = None;
    if config.auto_dns {
        if let Some(provisioner) = &app.provisioner {
            let fqdn = format!("{subdomain}.{base_domain}");
            match provisioner
                .create_record(&fqdn, &req.tld, &target, &record_type)
                .await
            {
                Ok(remote) => {
                    tracing::info!(fqdn, record_id = %remote.id, "DNS record provisioned");
                    dns_record_id = Some(remote.id);
                }
                Err(e) => {
                    warn!(fqdn, error = %e, "DNS provisioning failed, registry create continues");
                }
            }
        }
    }

    let fields = NewRecord {
        target: Some(target),
        record_type: Some(record_type),
        ssl_enabled: Some(req.ssl_enabled.unwrap_or(config.ssl_enabled)),
        dns_record_id,
        metadata: req.metadata,
    };
    let record = app.store.create(&subdomain, &req.tld, fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Subdomain created successfully",
            "subdomain": record,
        })),
    ))
}

pub async fn update_subdomain(
    State(app): State<AppState>,
    Path((tld, subdomain)): Path<(String, String)>,
    Json(patch): Json<RecordPatch>,
) -> Result<Json<Value>, ApiError> {
    let subdomain = validate::sanitize(&subdomain);

    let existing = app
        .store
        .get(&subdomain, &tld)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subdomain not found".to_string()))?;

    // Mirror a target change to the remote record before the durable update
    if let (Some(new_target), Some(record_id)) = (&patch.target, &existing.dns_record_id) {
        if *new_target != existing.target {
            if let Some(provisioner) = &app.provisioner {
                let config = app.store.get_config().await?;
                if config.auto_dns {
                    if let Some(fqdn) = app.fqdn(&subdomain, &tld) {
                        if let Err(e) = provisioner
                            .update_record(&fqdn, &tld, new_target, record_id)
                            .await
                        {
                            warn!(fqdn, error = %e, "remote DNS update failed, registry update continues");
                        }
                    }
                }
            }
        }
    }

    let record = app.store.update(&subdomain, &tld, patch).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Subdomain updated successfully",
        "subdomain": record,
    })))
}

pub async fn delete_subdomain(
    State(app): State<AppState>,
    Path((tld, subdomain)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let subdomain = validate::sanitize(&subdomain);

    let existing = app
        .store
        .get(&subdomain, &tld)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subdomain not found".to_string()))?;

    // Best-effort remote cleanup when a provider record was recorded
    if let Some(record_id) = &existing.dns_record_id {
        if let Some(provisioner) = &app.provisioner {
            if let Err(e) = provisioner.delete_record(&tld, record_id).await {
                warn!(record_id, error = %e, "remote DNS delete failed, registry delete continues");
            }
        }
    }

    app.store.delete(&subdomain, &tld).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Subdomain deleted successfully",
    })))
}

pub async fn get_config(State(app): State<AppState>) -> Result<Json<Value>, ApiError> {
    let config = app.store.get_config().await?;
    Ok(Json(json!({ "success": true, "config": config })))
}

pub async fn get_stats(State(app): State<AppState>) -> Result<Json<Value>, ApiError> {
    let records = app.store.get_all().await?;

    let mut by_tld: HashMap<String, usize> = HashMap::new();
    let mut by_status: HashMap<String, usize> = HashMap::new();
    let mut ssl_enabled = 0usize;

    for record in records.values() {
        *by_tld.entry(record.tld.clone()).or_default() += 1;
        *by_status.entry(record.status.clone()).or_default() += 1;
        if record.ssl_enabled {
            ssl_enabled += 1;
        }
    }

    Ok(Json(json!({
        "success": true,
        "stats": {
            "total_subdomains": records.len(),
            "by_tld": by_tld,
            "by_status": by_status,
            "ssl_enabled": ssl_enabled,
        },
    })))
}
