//! Hosted app handlers: list, read, create, update, delete over the provider.

use crate::address::AddressKind;
use crate::error::ProviderError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::schema::COLUMN_ID;
use crate::sql::{ContentValues, Selection};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Reserved query keys; every other key is an equality filter on that column.
const FIELDS_PARAM: &str = "fields";
const SORT_PARAM: &str = "sort";

#[derive(Serialize)]
struct Created {
    id: i64,
    address: String,
}

#[derive(Serialize)]
struct Updated {
    updated: u64,
}

#[derive(Serialize)]
struct Deleted {
    deleted: u64,
}

fn body_to_map(value: Value) -> Result<ContentValues, ProviderError> {
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(ProviderError::Validation("body must be a JSON object".into())),
    }
}

fn query_value_for_column(col: &str, s: &str) -> Value {
    if col == COLUMN_ID {
        if let Ok(n) = s.parse::<i64>() {
            return Value::Number(n.into());
        }
    }
    Value::String(s.to_string())
}

/// Splits query params into projection, sort order, and a filter selection.
struct ListParams {
    fields: Option<Vec<String>>,
    sort: Option<String>,
    selection: Option<Selection>,
}

fn parse_params(params: HashMap<String, String>) -> Result<ListParams, ProviderError> {
    let mut fields = None;
    let mut sort = None;
    let mut filters: Vec<(String, Value)> = Vec::new();
    for (k, v) in params {
        match k.as_str() {
            FIELDS_PARAM => {
                fields = Some(
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                );
            }
            SORT_PARAM => sort = Some(v),
            _ => {
                let val = query_value_for_column(&k, &v);
                filters.push((k, val));
            }
        }
    }
    // HashMap order is arbitrary; keep the generated SQL stable.
    filters.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(ListParams {
        fields,
        sort,
        selection: Selection::from_filters(&filters)?,
    })
}

fn item_address(state: &AppState, id: &str) -> String {
    format!("{}/{}", state.provider.collection_address(), id)
}

async fn query_address(
    state: &AppState,
    address: &str,
    params: ListParams,
) -> Result<Vec<serde_json::Map<String, Value>>, ProviderError> {
    let projection: Option<Vec<&str>> = params
        .fields
        .as_ref()
        .map(|f| f.iter().map(String::as_str).collect());
    let cursor = state
        .provider
        .query(
            address,
            projection.as_deref(),
            params.selection.as_ref(),
            params.sort.as_deref(),
        )
        .await?;
    Ok(cursor.rows().to_objects())
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ProviderError> {
    let address = state.provider.collection_address().to_string();
    let content_type = state.provider.get_type(&address)?;
    let rows = query_address(&state, &address, parse_params(params)?).await?;
    Ok(success_many(rows, Some(content_type.as_str())))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ProviderError> {
    let address = item_address(&state, &id);
    let rows = query_address(&state, &address, parse_params(params)?).await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(address))?;
    Ok(success_one_ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ProviderError> {
    let values = body_to_map(body)?;
    let address = state
        .provider
        .insert(state.provider.collection_address(), &values)
        .await?;
    let id = match state.provider.matcher().classify(&address) {
        AddressKind::Item(id) => id,
        _ => return Err(ProviderError::UnknownAddress(address)),
    };
    Ok(success_one(Created { id, address }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ProviderError> {
    let address = item_address(&state, &id);
    let values = body_to_map(body)?;
    let updated = state.provider.update(&address, &values, None).await?;
    Ok(success_one_ok(Updated { updated }))
}

pub async fn update_matching(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ProviderError> {
    let params = parse_params(params)?;
    let values = body_to_map(body)?;
    let updated = state
        .provider
        .update(
            state.provider.collection_address(),
            &values,
            params.selection.as_ref(),
        )
        .await?;
    Ok(success_one_ok(Updated { updated }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ProviderError> {
    let address = item_address(&state, &id);
    let deleted = state.provider.delete(&address, None).await?;
    Ok(success_one_ok(Deleted { deleted }))
}

pub async fn delete_matching(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ProviderError> {
    let params = parse_params(params)?;
    let deleted = state
        .provider
        .delete(state.provider.collection_address(), params.selection.as_ref())
        .await?;
    Ok(success_one_ok(Deleted { deleted }))
}
