use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use sea_orm::ActiveModelTrait;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admin::{AdminUserDto, AdminUserList, SetAdminRequest, UpdateOrderStatusRequest},
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::order_service::{attach_items, order_from_entity, order_item_from_entity},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(&state.orm, user).await?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = attach_items(&state.orm, orders).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(&state.orm, user).await?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(order_from_entity);
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let data = OrderWithItems { order, items };
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(&state.orm, user).await?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    validate_status_transition(&existing.status, &payload.status)?;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Orders move through a directed set: `pending` may complete or cancel,
/// terminal states accept nothing further.
pub fn validate_status_transition(from: &str, to: &str) -> Result<(), AppError> {
    const VALID: [&str; 3] = ["pending", "completed", "cancelled"];
    if !VALID.contains(&to) {
        return Err(AppError::BadRequest("Invalid order status".into()));
    }
    let allowed = matches!((from, to), ("pending", "completed") | ("pending", "cancelled"));
    if allowed {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Cannot move order from '{}' to '{}'",
            from, to
        )))
    }
}

#[derive(FromRow)]
struct AdminUserRow {
    id: Uuid,
    user_id: Uuid,
    email: String,
    username: String,
    full_name: Option<String>,
    created_at: DateTime<Utc>,
    role: String,
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AdminUserList>> {
    ensure_admin(&state.orm, user).await?;

    let rows = sqlx::query_as::<_, AdminUserRow>(
        r#"
        SELECT pr.id, pr.user_id, pr.email, pr.username, pr.full_name, pr.created_at, u.role
        FROM profiles pr
        JOIN users u ON u.id = pr.user_id
        ORDER BY pr.created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let items: Vec<AdminUserDto> = rows
        .into_iter()
        .map(|row| AdminUserDto {
            id: row.id,
            user_id: row.user_id,
            email: row.email,
            username: row.username,
            full_name: row.full_name,
            created_at: row.created_at,
            roles: vec![row.role],
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Users",
        AdminUserList { items },
        Some(Meta::new(1, total.max(1), total)),
    ))
}

pub async fn set_admin(
    state: &AppState,
    user: &AuthUser,
    target_user_id: Uuid,
    payload: SetAdminRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(&state.orm, user).await?;

    if user.user_id == target_user_id {
        return Err(AppError::BadRequest(
            "You cannot change your own admin role".into(),
        ));
    }

    let role = if payload.is_admin { "admin" } else { "user" };
    let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
        .bind(target_user_id)
        .bind(role)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_role_update",
        Some("users"),
        Some(serde_json::json!({ "target_user_id": target_user_id, "role": role })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Role updated",
        serde_json::json!({ "user_id": target_user_id, "role": role }),
        Some(Meta::empty()),
    ))
}
