use gadget_store_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        admin::UpdateOrderStatusRequest,
        orders::{CreateOrderRequest, OrderItemRequest, PayOrderRequest},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::ShippingAddress,
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, category_service, order_service, product_service},
    state::AppState,
};
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: admin builds the catalog, a user orders against it, the
// snapshot survives a price change, and the admin drives status transitions.
#[tokio::test]
async fn order_create_snapshot_and_status_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "buyer@example.com").await?;
    let other_id = create_user(&state, "user", "other@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_other = AuthUser {
        user_id: other_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Admin creates a category and a product priced 50.00.
    let category = category_service::create_category(
        &state,
        &auth_admin,
        gadget_store_api::dto::categories::CreateCategoryRequest {
            name: "Gadgets".into(),
            slug: None,
            description: None,
            icon: None,
            image_url: None,
            sort_order: 0,
        },
    )
    .await?
    .data
    .unwrap();

    let product = product_service::create_product(
        &state,
        &auth_admin,
        CreateProductRequest {
            name: "Desk Lamp".into(),
            slug: None,
            description: Some("A lamp for testing".into()),
            price: dec!(50.00),
            original_price: None,
            category_id: Some(category.id),
            images: vec![],
            stock: 10,
            featured: false,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(product.slug, "desk-lamp");

    // User orders two units; total is snapshotted from the catalog price.
    let created = order_service::create_order(
        &state,
        &auth_user,
        CreateOrderRequest {
            payment_method: "cod".into(),
            shipping_address: shipping_address(),
            items: vec![OrderItemRequest {
                product_id: product.id,
                quantity: 2,
            }],
        },
    )
    .await?
    .data
    .unwrap();

    let listed = order_service::list_orders(&state, &auth_user, default_order_query())
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    let entry = &listed.items[0];
    assert_eq!(entry.order.id, created.id);
    assert_eq!(entry.order.status, "pending");
    assert_eq!(entry.order.payment_status, "pending");
    assert_eq!(entry.order.total_amount, dec!(100.00));
    assert_eq!(entry.items.len(), 1);
    assert_eq!(entry.items[0].quantity, 2);
    assert_eq!(entry.items[0].unit_price, dec!(50.00));

    // Raising the catalog price must not touch the stored snapshot.
    product_service::update_product(
        &state,
        &auth_admin,
        product.id,
        UpdateProductRequest {
            name: None,
            slug: None,
            description: None,
            price: Some(dec!(150.00)),
            original_price: None,
            category_id: None,
            images: None,
            stock: None,
            featured: None,
            active: None,
        },
    )
    .await?;

    let fetched = order_service::get_order(&state, &auth_user, created.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.items[0].unit_price, dec!(50.00));
    assert_eq!(fetched.order.total_amount, dec!(100.00));

    // Someone else's credentials see the order as absent, not forbidden.
    let err = order_service::get_order(&state, &auth_other, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // An unknown product fails validation before anything is written.
    let err = order_service::create_order(
        &state,
        &auth_user,
        CreateOrderRequest {
            payment_method: "cod".into(),
            shipping_address: shipping_address(),
            items: vec![OrderItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let after_failure = order_service::list_orders(&state, &auth_user, default_order_query())
        .await?
        .data
        .unwrap();
    assert_eq!(after_failure.items.len(), 1, "failed attempt left rows behind");

    // Empty item lists and non-positive quantities are rejected too.
    let err = order_service::create_order(
        &state,
        &auth_user,
        CreateOrderRequest {
            payment_method: "cod".into(),
            shipping_address: shipping_address(),
            items: vec![],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = order_service::create_order(
        &state,
        &auth_user,
        CreateOrderRequest {
            payment_method: "cod".into(),
            shipping_address: shipping_address(),
            items: vec![OrderItemRequest {
                product_id: product.id,
                quantity: 0,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Payment capture is separate from fulfilment status.
    let paid = order_service::pay_order(
        &state,
        &auth_user,
        created.id,
        PayOrderRequest {
            payment_reference: Some("txn-1".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(paid.order.payment_status, "paid");
    assert_eq!(paid.order.status, "pending");
    assert!(paid.order.paid_at.is_some());

    let err = order_service::pay_order(
        &state,
        &auth_user,
        created.id,
        PayOrderRequest {
            payment_reference: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // pending -> completed is allowed; leaving a terminal state is not.
    let updated = admin_service::update_order_status(
        &state,
        &auth_admin,
        created.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.status, "completed");

    let err = admin_service::update_order_status(
        &state,
        &auth_admin,
        created.id,
        UpdateOrderStatusRequest {
            status: "pending".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // A plain user lacks the admin capability regardless of what the token says.
    let forged = AuthUser {
        user_id,
        role: "admin".into(),
    };
    let err = admin_service::update_order_status(
        &state,
        &forged,
        created.id,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Admin sees the order unscoped.
    let all = admin_service::list_all_orders(&state, &auth_admin, default_order_query())
        .await?
        .data
        .unwrap();
    assert!(all.items.iter().any(|o| o.order.id == created.id));

    Ok(())
}

#[test]
fn status_transitions_follow_directed_set() {
    use gadget_store_api::services::admin_service::validate_status_transition;

    assert!(validate_status_transition("pending", "completed").is_ok());
    assert!(validate_status_transition("pending", "cancelled").is_ok());
    assert!(validate_status_transition("completed", "pending").is_err());
    assert!(validate_status_transition("cancelled", "completed").is_err());
    assert!(validate_status_transition("pending", "shipped").is_err());
    assert!(validate_status_transition("pending", "pending").is_err());
}

fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Test Buyer".into(),
        phone: "555-0100".into(),
        address_line1: "1 Main St".into(),
        address_line2: None,
        city: "Springfield".into(),
        state: "IL".into(),
        postal_code: "62701".into(),
        country: "US".into(),
    }
}

fn default_order_query() -> OrderListQuery {
    OrderListQuery {
        pagination: Pagination {
            page: Some(1),
            per_page: Some(20),
        },
        status: None,
        sort_order: None,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, 5).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, wishlist_entries, viewed_history, audit_logs, profiles, products, categories, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    use gadget_store_api::entity::users::ActiveModel as UserActive;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
