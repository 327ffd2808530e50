use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{AccountInfo, AuthResponse, Claims, SignInRequest, SignUpRequest},
    error::{AppError, AppResult},
    models::{Profile, User},
    response::{ApiResponse, Meta},
};

pub async fn sign_up(pool: &DbPool, payload: SignUpRequest) -> AppResult<ApiResponse<AuthResponse>> {
    let SignUpRequest {
        email,
        password,
        username,
        full_name,
    } = payload;

    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if password.len() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".into(),
        ));
    }
    let username = username.trim().to_lowercase();
    if username.len() < 3 || username.len() > 20 {
        return Err(AppError::BadRequest(
            "Username must be between 3 and 20 characters".into(),
        ));
    }
    if full_name.trim().len() < 2 {
        return Err(AppError::BadRequest("Full name is required".into()));
    }

    let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::Conflict("Email is already taken".into()));
    }

    let username_taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM profiles WHERE username = $1")
            .bind(username.as_str())
            .fetch_optional(pool)
            .await?;
    if username_taken.is_some() {
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    // Account and profile land together or not at all.
    let mut txn = pool.begin().await?;

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, 'user') RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(password_hash)
    .fetch_one(&mut *txn)
    .await?;

    let profile: Profile = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, user_id, email, username, full_name)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(email.as_str())
    .bind(username.as_str())
    .bind(full_name.trim())
    .fetch_one(&mut *txn)
    .await?;

    txn.commit().await?;

    let token = issue_token(user.id, &user.role)?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_signup",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let roles = vec![user.role.clone()];
    Ok(ApiResponse::success(
        "Account created",
        AuthResponse {
            token,
            user: AccountInfo {
                id: user.id,
                email: user.email,
            },
            profile: Some(profile),
            roles,
        },
        Some(Meta::empty()),
    ))
}

pub async fn sign_in(pool: &DbPool, payload: SignInRequest) -> AppResult<ApiResponse<AuthResponse>> {
    let SignInRequest { email, password } = payload;
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized);
    }

    let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(pool)
        .await?;

    let token = issue_token(user.id, &user.role)?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_signin",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let roles = vec![user.role.clone()];
    Ok(ApiResponse::success(
        "Signed in",
        AuthResponse {
            token,
            user: AccountInfo {
                id: user.id,
                email: user.email,
            },
            profile,
            roles,
        },
        Some(Meta::empty()),
    ))
}

fn issue_token(user_id: Uuid, role: &str) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
