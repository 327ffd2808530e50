use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::analytics::{
        AnalyticsResponse, OrderStats, OverviewResponse, ProductStats, RevenueStats, TopCategory,
        TopProduct, UserStats,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct TopCategoryRow {
    category_id: Option<Uuid>,
    category_name: String,
    total_quantity: i64,
}

#[derive(FromRow)]
struct TopProductRow {
    product_id: Option<Uuid>,
    product_name: String,
    total_quantity: i64,
}

/// Point-in-time aggregation over the live store. Every figure is computed
/// from scratch at request time; nothing is cached or maintained
/// incrementally.
pub async fn get_analytics(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AnalyticsResponse>> {
    ensure_admin(&state.orm, user).await?;
    let pool = &state.pool;

    let now = Utc::now();
    let last_30d = now - Duration::days(30);
    let last_7d = now - Duration::days(7);
    let abandoned_cutoff = now - Duration::hours(24);

    let orders = OrderStats {
        total: count_scalar(pool, "SELECT COUNT(*) FROM orders", None).await?,
        last_30d: count_scalar(
            pool,
            "SELECT COUNT(*) FROM orders WHERE created_at >= $1",
            Some(last_30d),
        )
        .await?,
        last_7d: count_scalar(
            pool,
            "SELECT COUNT(*) FROM orders WHERE created_at >= $1",
            Some(last_7d),
        )
        .await?,
    };

    // Only completed orders count as revenue.
    let revenue = RevenueStats {
        total: sum_scalar(
            pool,
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = 'completed'",
            None,
        )
        .await?,
        last_30d: sum_scalar(
            pool,
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = 'completed' AND created_at >= $1",
            Some(last_30d),
        )
        .await?,
        last_7d: sum_scalar(
            pool,
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = 'completed' AND created_at >= $1",
            Some(last_7d),
        )
        .await?,
    };

    let users = UserStats {
        total: count_scalar(pool, "SELECT COUNT(*) FROM users", None).await?,
        last_30d: count_scalar(
            pool,
            "SELECT COUNT(*) FROM users WHERE created_at >= $1",
            Some(last_30d),
        )
        .await?,
    };

    let products = ProductStats {
        total: count_scalar(pool, "SELECT COUNT(*) FROM products", None).await?,
        featured: count_scalar(pool, "SELECT COUNT(*) FROM products WHERE is_featured", None)
            .await?,
        out_of_stock: count_scalar(
            pool,
            "SELECT COUNT(*) FROM products WHERE stock_quantity <= 0",
            None,
        )
        .await?,
    };

    let conversion_rate = conversion_rate(orders.total, users.total);

    let top_categories = sqlx::query_as::<_, TopCategoryRow>(
        r#"
        SELECT p.category_id, COALESCE(c.name, 'Unknown') AS category_name,
               SUM(oi.quantity) AS total_quantity
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        LEFT JOIN categories c ON c.id = p.category_id
        GROUP BY p.category_id, c.name
        ORDER BY total_quantity DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| TopCategory {
        category_id: row.category_id,
        category_name: row.category_name,
        total_quantity: row.total_quantity,
    })
    .collect();

    let abandoned_carts = count_scalar(
        pool,
        "SELECT COUNT(*) FROM orders WHERE status = 'pending' AND created_at < $1",
        Some(abandoned_cutoff),
    )
    .await?;

    let data = AnalyticsResponse {
        orders,
        revenue,
        users,
        products,
        conversion_rate,
        top_categories,
        abandoned_carts,
    };

    Ok(ApiResponse::success("Analytics", data, Some(Meta::empty())))
}

pub async fn get_overview(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OverviewResponse>> {
    ensure_admin(&state.orm, user).await?;
    let pool = &state.pool;

    let last_30d = Utc::now() - Duration::days(30);

    let total_users = count_scalar(pool, "SELECT COUNT(*) FROM users", None).await?;
    let total_orders = count_scalar(pool, "SELECT COUNT(*) FROM orders", None).await?;
    let total_products = count_scalar(pool, "SELECT COUNT(*) FROM products", None).await?;
    let total_revenue = sum_scalar(
        pool,
        "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = 'completed'",
        None,
    )
    .await?;
    let recent_orders_30d = count_scalar(
        pool,
        "SELECT COUNT(*) FROM orders WHERE created_at >= $1",
        Some(last_30d),
    )
    .await?;

    // Snapshot names on order items keep deleted products out of the join;
    // fall back to the live name when the product still exists.
    let top_products = sqlx::query_as::<_, TopProductRow>(
        r#"
        SELECT oi.product_id, COALESCE(p.name, 'Unknown') AS product_name,
               SUM(oi.quantity) AS total_quantity
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        GROUP BY oi.product_id, p.name
        ORDER BY total_quantity DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| TopProduct {
        product_id: row.product_id,
        product_name: row.product_name,
        total_quantity: row.total_quantity,
    })
    .collect();

    let data = OverviewResponse {
        total_users,
        total_orders,
        total_products,
        total_revenue,
        recent_orders_30d,
        top_products,
    };

    Ok(ApiResponse::success("Overview", data, Some(Meta::empty())))
}

/// Orders-per-user approximation, rounded to two decimals. Zero users means
/// zero, not a division fault.
pub fn conversion_rate(total_orders: i64, total_users: i64) -> f64 {
    if total_users > 0 {
        let rate = total_orders as f64 / total_users as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    } else {
        0.0
    }
}

async fn count_scalar(
    pool: &DbPool,
    sql: &str,
    since: Option<DateTime<Utc>>,
) -> AppResult<i64> {
    let mut query = sqlx::query_as::<_, (i64,)>(sql);
    if let Some(cutoff) = since {
        query = query.bind(cutoff);
    }
    let row = query.fetch_one(pool).await?;
    Ok(row.0)
}

async fn sum_scalar(
    pool: &DbPool,
    sql: &str,
    since: Option<DateTime<Utc>>,
) -> AppResult<Decimal> {
    let mut query = sqlx::query_as::<_, (Decimal,)>(sql);
    if let Some(cutoff) = since {
        query = query.bind(cutoff);
    }
    let row = query.fetch_one(pool).await?;
    Ok(row.0)
}
