use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireCapability, cap};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::CreateRoleRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::{validate_color, validate_role_name};
use crate::types::Role;

pub async fn create_role(
    auth: RequireCapability<cap::ManageRoles>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleRequest>,
) -> impl IntoResponse {
    validate_role_name(&req.name)?;
    validate_color(&req.color)?;

    let role = Role {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        color: req.color,
        capabilities: req.capabilities,
        created_at: Utc::now(),
    };

    state.store.create_role(&role).map_err(|e| match e {
        Error::AlreadyExists => ApiError::conflict("Role name already taken"),
        other => ApiError::from(other),
    })?;

    tracing::info!(
        role = %role.name,
        capabilities = %role.capabilities,
        by = %auth.caller.user.id,
        "role created"
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(role))))
}
