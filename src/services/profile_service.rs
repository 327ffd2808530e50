use crate::{
    audit::log_audit,
    db::DbPool,
    dto::{
        auth::AccountInfo,
        profile::{MeResponse, UpdateProfileRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Profile, User},
    response::{ApiResponse, Meta},
};

pub async fn get_me(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<MeResponse>> {
    let account: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let account = match account {
        Some(u) => u,
        None => return Err(AppError::Unauthorized),
    };

    let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1")
        .bind(account.id)
        .fetch_optional(pool)
        .await?;

    let roles = vec![account.role.clone()];
    Ok(ApiResponse::success(
        "OK",
        MeResponse {
            user: AccountInfo {
                id: account.id,
                email: account.email,
            },
            profile,
            roles,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let existing: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let full_name = payload.full_name.or(existing.full_name);
    let phone = payload.phone.or(existing.phone);
    let avatar_url = payload.avatar_url.or(existing.avatar_url);

    let profile: Profile = sqlx::query_as(
        r#"
        UPDATE profiles
        SET full_name = $2, phone = $3, avatar_url = $4, updated_at = now()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(full_name)
    .bind(phone)
    .bind(avatar_url)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "profile_update",
        Some("profiles"),
        Some(serde_json::json!({ "profile_id": profile.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Profile updated", profile, Some(Meta::empty())))
}
