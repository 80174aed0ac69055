use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    auth::AuthUser,
    error::AppError,
    property::{sort_column, Property, PropertyFilter, PropertyPayload, PropertyStatus},
    state::AppState,
    user::Role,
    utils::{offset, page_window},
    validate::validate_property,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route(
            "/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/:id/toggle-status", patch(toggle_status_handler))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
    status: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

fn build_filter(query: &ListQuery) -> Result<PropertyFilter, AppError> {
    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<PropertyStatus>()
                .map_err(|_| AppError::BadRequest("Invalid status filter".to_string()))?,
        ),
    };

    let kind = match query.kind.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| AppError::BadRequest("Invalid type filter".to_string()))?,
        ),
    };

    Ok(PropertyFilter {
        search: query.search.clone(),
        status,
        kind,
        min_price: query.min_price,
        max_price: query.max_price,
    })
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).max(1);

    let filter = build_filter(&query)?;
    let descending = !matches!(query.sort_order.as_deref(), Some(order) if order.eq_ignore_ascii_case("asc"));

    let properties = Property::list(
        &state.pool,
        &filter,
        sort_column(query.sort_by.as_deref()),
        descending,
        limit,
        offset(page, limit),
    )
    .await?;

    let total = Property::count(&state.pool, &filter).await?;
    let available =
        Property::count_with_status(&state.pool, &filter, PropertyStatus::Available).await?;
    let occupied =
        Property::count_with_status(&state.pool, &filter, PropertyStatus::Occupied).await?;
    let maintenance =
        Property::count_with_status(&state.pool, &filter, PropertyStatus::Maintenance).await?;

    let window = page_window(total, page, limit);
    let properties: Vec<_> = properties
        .into_iter()
        .map(|property| property.into_json())
        .collect();

    Ok(Json(json!({
        "success": true,
        "message": "Properties retrieved successfully",
        "data": {
            "properties": properties,
            "pagination": {
                "currentPage": page,
                "totalPages": window.total_pages,
                "totalProperties": total,
                "hasNextPage": window.has_next_page,
                "hasPrevPage": window.has_prev_page,
            },
            "stats": {
                "total": total,
                "available": available,
                "occupied": occupied,
                "maintenance": maintenance,
            },
        },
    })))
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let Some(property) = Property::find_by_id_with_owner(&state.pool, id).await? else {
        return Err(AppError::NotFound("Property not found".to_string()));
    };

    Property::increment_view_count(&state.pool, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Property retrieved successfully",
        "data": { "property": property.into_json() },
    })))
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<PropertyPayload>,
) -> Result<impl IntoResponse, AppError> {
    validate_property(&payload)?;

    let kind = payload
        .property_type()
        .ok_or_else(|| AppError::BadRequest("Invalid property type".to_string()))?;

    let property = Property::create(&state.pool, user.id, &payload, kind).await?;

    info!("User {} created property {}", user.id, property.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Property created successfully",
            "data": { "property": property },
        })),
    ))
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<PropertyPayload>,
) -> Result<impl IntoResponse, AppError> {
    validate_property(&payload)?;

    let Some(property) = Property::find_by_id(&state.pool, id).await? else {
        return Err(AppError::NotFound("Property not found".to_string()));
    };

    if user.role != Role::Admin && property.owner_id != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to update this property".to_string(),
        ));
    }

    let kind = payload
        .property_type()
        .ok_or_else(|| AppError::BadRequest("Invalid property type".to_string()))?;

    let property = Property::update(&state.pool, id, &payload, kind).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Property updated successfully",
        "data": { "property": property },
    })))
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let Some(property) = Property::find_by_id(&state.pool, id).await? else {
        return Err(AppError::NotFound("Property not found".to_string()));
    };

    if user.role != Role::Admin && property.owner_id != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this property".to_string(),
        ));
    }

    Property::delete(&state.pool, id).await?;

    info!("User {} deleted property {}", user.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "Property deleted successfully",
    })))
}

async fn toggle_status_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let Some(property) = Property::find_by_id(&state.pool, id).await? else {
        return Err(AppError::NotFound("Property not found".to_string()));
    };

    let new_status = property.status.toggled();
    let property = Property::set_status(&state.pool, id, new_status).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Property marked as {}", new_status.as_str()),
        "data": { "property": property },
    })))
}
