use super::{ApiError, ApiResult};
use crate::middleware::caller_from;
use crate::server::AdminState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use pluma_core::error::PlumaError;
use pluma_core::plugin::{Plugin, PluginSpec};
use pluma_core::query::PluginQuery;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

fn listing(plugins: Vec<Plugin>) -> Json<Value> {
    Json(json!({
        "total": plugins.len(),
        "list": plugins
    }))
}

pub async fn list_plugins(State(state): State<Arc<AdminState>>) -> ApiResult<Json<Value>> {
    Ok(listing(state.service.list().await?))
}

pub async fn get_plugin(
    State(state): State<Arc<AdminState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    match state.service.get(id).await? {
        Some(plugin) => Ok(Json(json!({ "value": plugin }))),
        None => Err(ApiError(PlumaError::PluginNotFound(id))),
    }
}

pub async fn create_plugin(
    State(state): State<Arc<AdminState>>,
    headers: HeaderMap,
    Json(spec): Json<PluginSpec>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let caller = caller_from(&headers);
    let plugin = state.service.create(spec, &caller).await?;
    Ok((StatusCode::CREATED, Json(json!({ "value": plugin }))))
}

pub async fn update_plugin(
    State(state): State<Arc<AdminState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(spec): Json<PluginSpec>,
) -> ApiResult<Json<Value>> {
    let caller = caller_from(&headers);
    let plugin = state.service.update(id, spec, &caller).await?;
    Ok(Json(json!({ "value": plugin })))
}

pub async fn delete_plugin(
    State(state): State<Arc<AdminState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Structured query, filtered to the caller's domains.
pub async fn query_plugins(
    State(state): State<Arc<AdminState>>,
    headers: HeaderMap,
    Json(query): Json<PluginQuery>,
) -> ApiResult<Json<Value>> {
    let caller = caller_from(&headers);
    let plugins = state.service.query_with_auth_check(&query, &caller).await?;
    Ok(listing(plugins))
}

/// Lookup by the function-call name declared in the parse-mode config.
pub async fn get_plugin_by_name(
    State(state): State<Arc<AdminState>>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    match state.service.get_by_name(&name).await? {
        Some(plugin) => Ok((StatusCode::OK, Json(json!({ "value": plugin })))),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No plugin declares function name: {name}"),
                "status": 404,
            })),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub text: String,
    #[serde(rename = "type", default)]
    pub plugin_type: Option<String>,
}

/// Free-text match on pattern or name.
pub async fn search_plugins(
    State(state): State<Arc<AdminState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let plugins = state
        .service
        .fetch_by_text(&params.text, params.plugin_type.as_deref())
        .await?;
    Ok(listing(plugins))
}
