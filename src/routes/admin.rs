use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    auth::AdminUser,
    error::AppError,
    property::{Property, PropertyStatus},
    state::AppState,
    user::{sort_column, Role, User, UserFilter},
    utils::{growth_rate, offset, page_window},
};

const DEFAULT_PHONE: &str = "+1 (555) 000-0000";
const DEFAULT_AVATAR: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=100&h=100&fit=crop&crop=face";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats_handler))
        .route("/users", get(list_users_handler))
        .route("/users/:id/toggle-status", patch(toggle_user_status_handler))
        .route("/users/:id/status", patch(update_user_status_handler))
        .route("/users/:id", delete(delete_user_handler))
}

async fn dashboard_stats_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let total_users = User::count(
        &state.pool,
        &UserFilter {
            search: None,
            is_active: None,
        },
    )
    .await?;
    let active_users = User::count_by_activity(&state.pool, true).await?;
    let suspended_users = User::count_by_activity(&state.pool, false).await?;

    let total_properties = Property::count_all(&state.pool).await?;
    let available_properties =
        Property::count_by_status(&state.pool, PropertyStatus::Available).await?;
    let rented_properties =
        Property::count_by_status(&state.pool, PropertyStatus::Occupied).await?;

    let thirty_days_ago = Utc::now() - Duration::days(30);
    let recent_users = User::count_since(&state.pool, thirty_days_ago).await?;
    let recent_properties = Property::count_since(&state.pool, thirty_days_ago).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Dashboard statistics retrieved successfully",
        "data": {
            "totalUsers": total_users,
            "activeUsers": active_users,
            "suspendedUsers": suspended_users,
            "totalProperties": total_properties,
            "availableProperties": available_properties,
            "rentedProperties": rented_properties,
            "insights": {
                "recentUsers": recent_users,
                "recentProperties": recent_properties,
                "userGrowthRate": growth_rate(recent_users, total_users),
                "propertyGrowthRate": growth_rate(recent_properties, total_properties),
            },
        },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListUsersQuery {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
    status: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).max(1);

    let filter = UserFilter {
        search: query.search.clone(),
        is_active: match query.status.as_deref() {
            Some("active") => Some(true),
            Some("suspended") => Some(false),
            _ => None,
        },
    };
    let descending = !matches!(query.sort_order.as_deref(), Some(order) if order.eq_ignore_ascii_case("asc"));

    let users = User::list(
        &state.pool,
        &filter,
        sort_column(query.sort_by.as_deref()),
        descending,
        limit,
        offset(page, limit),
    )
    .await?;
    let total = User::count(&state.pool, &filter).await?;

    let window = page_window(total, page, limit);
    let users: Vec<Value> = users.iter().map(dashboard_user).collect();

    Ok(Json(json!({
        "success": true,
        "message": "Users retrieved successfully",
        "data": {
            "users": users,
            "pagination": {
                "currentPage": page,
                "totalPages": window.total_pages,
                "totalUsers": total,
                "hasNextPage": window.has_next_page,
                "hasPrevPage": window.has_prev_page,
            },
        },
    })))
}

/// Row shape the admin dashboard table renders.
fn dashboard_user(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": format!("{} {}", user.first_name, user.last_name),
        "email": user.email,
        "phone": DEFAULT_PHONE,
        "status": if user.is_active { "active" } else { "suspended" },
        "avatar": DEFAULT_AVATAR,
        "firstName": user.first_name,
        "lastName": user.last_name,
        "username": user.username,
        "createdAt": user.created_at,
        "isActive": user.is_active,
    })
}

async fn toggle_user_status_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_managed_user(&state, id, "Cannot modify admin user status").await?;

    let updated = User::set_active(&state.pool, id, !user.is_active).await?;

    info!(
        "Admin {} {} user {}",
        admin.id,
        if updated.is_active { "activated" } else { "suspended" },
        id
    );

    let mut body = json!(&updated);
    body["status"] = json!(if updated.is_active { "active" } else { "suspended" });

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "User {} successfully",
            if updated.is_active { "activated" } else { "suspended" }
        ),
        "data": { "user": body },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusRequest {
    is_active: bool,
}

async fn update_user_status_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    find_managed_user(&state, id, "Cannot modify admin user status").await?;

    let updated = User::set_active(&state.pool, id, payload.is_active).await?;

    info!(
        "Admin {} {} user {}",
        admin.id,
        if updated.is_active { "activated" } else { "suspended" },
        id
    );

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "User {} successfully",
            if updated.is_active { "activated" } else { "suspended" }
        ),
        "data": { "user": updated },
    })))
}

async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    find_managed_user(&state, id, "Cannot delete admin user").await?;

    let owned = Property::count_by_owner(&state.pool, id).await?;
    if owned > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete user with existing properties. Please transfer or remove their properties first."
                .to_string(),
        ));
    }

    User::delete(&state.pool, id).await?;

    info!("Admin {} deleted user {}", admin.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}

/// Loads the target account and rejects admin targets, shared by the user
/// management endpoints.
async fn find_managed_user(
    state: &AppState,
    id: i32,
    forbidden_message: &str,
) -> Result<User, AppError> {
    let Some(user) = User::find_by_id(&state.pool, id).await? else {
        return Err(AppError::NotFound("User not found".to_string()));
    };

    if user.role == Role::Admin {
        return Err(AppError::Forbidden(forbidden_message.to_string()));
    }

    Ok(user)
}
