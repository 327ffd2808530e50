use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::auth::AccountInfo;
use crate::models::Profile;

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: AccountInfo,
    pub profile: Option<Profile>,
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}
