use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::server::AppState;
use crate::types::{Capability, Role, User};

pub const USER_HEADER: &str = "x-quad-user";

/// The authenticated caller and their role.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Whether the caller may see another user's private statistics.
    #[must_use]
    pub fn can_view_private(&self, user_id: &str) -> bool {
        self.user.id == user_id || self.can(Capability::ManageUsers)
    }

    /// Owners may always act on their own content; everyone else needs `capability`.
    #[must_use]
    pub fn owns_or_can(&self, owner_id: &str, capability: Capability) -> bool {
        self.user.id == owner_id || self.can(capability)
    }
}

/// Marker types naming the capability a [`RequireCapability`] extractor checks.
pub trait CapabilityMarker {
    const CAPABILITY: Capability;
}

macro_rules! capability_markers {
    ($($name:ident => $cap:ident),* $(,)?) => {
        $(
            pub struct $name;
            impl CapabilityMarker for $name {
                const CAPABILITY: Capability = Capability::$cap;
            }
        )*
    };
}

pub mod cap {
    use super::{Capability, CapabilityMarker};

    capability_markers! {
        ManageRoles => ManageRoles,
        ManageUsers => ManageUsers,
        CreateThreads => CreateThreads,
        Reply => Reply,
    }
}

/// Extractor that requires the caller's role to hold `C::CAPABILITY`.
pub struct RequireCapability<C> {
    pub caller: Caller,
    _capability: PhantomData<C>,
}

#[derive(Debug)]
pub enum AuthError {
    MissingUser,
    UnknownUser,
    MissingCapability(Capability),
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingUser => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, "Unknown user".to_string()),
            AuthError::MissingCapability(cap) => {
                (StatusCode::FORBIDDEN, format!("Missing capability: {cap}"))
            }
            AuthError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("X-Quad-User realm=\"quad\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingUser)?;

        let user = state
            .store
            .get_user(user_id)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to load caller");
                AuthError::InternalError
            })?
            .ok_or(AuthError::UnknownUser)?;

        let role = state
            .store
            .get_role(&user.role_id)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to load caller role");
                AuthError::InternalError
            })?
            .ok_or_else(|| {
                tracing::error!(user_id = %user.id, role_id = %user.role_id, "caller has no role");
                AuthError::InternalError
            })?;

        Ok(Caller { user, role })
    }
}

impl<C> FromRequestParts<Arc<AppState>> for RequireCapability<C>
where
    C: CapabilityMarker + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;

        if !caller.can(C::CAPABILITY) {
            return Err(AuthError::MissingCapability(C::CAPABILITY));
        }

        Ok(RequireCapability {
            caller,
            _capability: PhantomData,
        })
    }
}
