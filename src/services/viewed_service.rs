use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::viewed::{TrackViewRequest, ViewedItemDto, ViewedList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ProductSummary, ViewedEntry, images_from_json},
    response::{ApiResponse, Meta},
};

/// Most recent entries returned by a history read; older views stay stored
/// but fall off the list.
const VIEWED_HISTORY_LIMIT: i64 = 50;

#[derive(FromRow)]
struct ViewedRow {
    id: Uuid,
    product_id: Uuid,
    viewed_at: DateTime<Utc>,
    name: String,
    price: Decimal,
    images: serde_json::Value,
    category_id: Option<Uuid>,
}

pub async fn list_viewed(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<ViewedList>> {
    let rows = sqlx::query_as::<_, ViewedRow>(
        r#"
        SELECT v.id, v.product_id, v.viewed_at,
               p.name, p.price, p.images, p.category_id
        FROM viewed_history v
        JOIN products p ON p.id = v.product_id
        WHERE v.user_id = $1
        ORDER BY v.viewed_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.user_id)
    .bind(VIEWED_HISTORY_LIMIT)
    .fetch_all(pool)
    .await?;

    let items: Vec<ViewedItemDto> = rows
        .into_iter()
        .map(|row| ViewedItemDto {
            id: row.id,
            product_id: row.product_id,
            viewed_at: row.viewed_at,
            product: ProductSummary {
                id: row.product_id,
                name: row.name,
                price: row.price,
                images: images_from_json(row.images),
                category_id: row.category_id,
            },
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        ViewedList { items },
        Some(Meta::new(1, VIEWED_HISTORY_LIMIT, total)),
    ))
}

pub async fn track_view(
    pool: &DbPool,
    user: &AuthUser,
    payload: TrackViewRequest,
) -> AppResult<ApiResponse<ViewedEntry>> {
    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::BadRequest("Product not found".into()));
    }

    // Repeat views move the timestamp forward instead of duplicating the row.
    let entry: ViewedEntry = sqlx::query_as(
        r#"
        INSERT INTO viewed_history (user_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, product_id) DO UPDATE SET viewed_at = now()
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.product_id)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("OK", entry, None))
}

pub async fn remove_view(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM viewed_history WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from history",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_viewed(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM viewed_history WHERE user_id = $1")
        .bind(user.user_id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success(
        "History cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}
