use serde::{Deserialize, Serialize};

use crate::types::{CapabilitySet, Role, User, UserActivityStats};

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub title: String,
    pub content: String,
    pub section: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub capabilities: CapabilitySet,
}

/// Raw page parameters; see [`super::validation::clamp_page`].
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub role: RoleSummary,
    pub stats: UserActivityStats,
}

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl From<&Role> for RoleSummary {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.clone(),
            name: role.name.clone(),
            color: role.color.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}
