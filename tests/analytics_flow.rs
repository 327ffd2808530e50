use gadget_store_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        admin::UpdateOrderStatusRequest,
        categories::CreateCategoryRequest,
        orders::{CreateOrderRequest, OrderItemRequest},
    },
    middleware::auth::AuthUser,
    models::ShippingAddress,
    services::{admin_service, analytics_service, category_service, order_service},
    state::AppState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

#[test]
fn conversion_rate_guards_division_by_zero() {
    use gadget_store_api::services::analytics_service::conversion_rate;

    assert_eq!(conversion_rate(0, 0), 0.0);
    assert_eq!(conversion_rate(5, 0), 0.0);
    assert_eq!(conversion_rate(1, 2), 50.0);
    assert_eq!(conversion_rate(1, 3), 33.33);
}

// Aggregates are computed from live state: revenue counts only completed
// orders, abandoned carts are stale pending orders, rankings follow units
// sold.
#[tokio::test]
async fn analytics_reflect_orders_and_catalog() -> anyhow::Result<()> {
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

    let buyer_id = create_user(&state, "user", "buyer@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let buyer = AuthUser {
        user_id: buyer_id,
        role: "user".into(),
    };
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let audio = create_category(&state, &admin, "Audio").await?;
    let wearables = create_category(&state, &admin, "Wearables").await?;

    let earbuds = create_product(&state, "Earbuds", dec!(10.00), Some(audio), true, 100).await?;
    let band = create_product(&state, "Band", dec!(20.00), Some(wearables), false, 100).await?;
    let _sold_out = create_product(&state, "Sold Out", dec!(5.00), None, false, 0).await?;

    // Completed order: 4 earbuds + 1 band = 60.00 of revenue.
    let completed = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            payment_method: "cod".into(),
            shipping_address: shipping_address(),
            items: vec![
                OrderItemRequest {
                    product_id: earbuds,
                    quantity: 4,
                },
                OrderItemRequest {
                    product_id: band,
                    quantity: 1,
                },
            ],
        },
    )
    .await?
    .data
    .unwrap();
    admin_service::update_order_status(
        &state,
        &admin,
        completed.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await?;

    // Pending order aged past the 24h abandonment cutoff.
    let stale = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            payment_method: "cod".into(),
            shipping_address: shipping_address(),
            items: vec![OrderItemRequest {
                product_id: band,
                quantity: 2,
            }],
        },
    )
    .await?
    .data
    .unwrap();
    sqlx::query("UPDATE orders SET created_at = now() - interval '10 days' WHERE id = $1")
        .bind(stale.id)
        .execute(&state.pool)
        .await?;

    let analytics = analytics_service::get_analytics(&state, &admin)
        .await?
        .data
        .unwrap();

    assert_eq!(analytics.orders.total, 2);
    assert_eq!(analytics.orders.last_30d, 2);
    assert_eq!(analytics.orders.last_7d, 1);
    assert_eq!(analytics.revenue.total, dec!(60.00));
    assert_eq!(analytics.users.total, 2);
    assert_eq!(analytics.products.total, 3);
    assert_eq!(analytics.products.featured, 1);
    assert_eq!(analytics.products.out_of_stock, 1);
    assert_eq!(analytics.conversion_rate, 100.0);
    assert_eq!(analytics.abandoned_carts, 1);

    // Earbuds moved 4 units in Audio, Band moved 3 in Wearables.
    assert_eq!(analytics.top_categories.len(), 2);
    assert_eq!(analytics.top_categories[0].category_id, Some(audio));
    assert_eq!(analytics.top_categories[0].total_quantity, 4);
    assert_eq!(analytics.top_categories[1].category_id, Some(wearables));
    assert_eq!(analytics.top_categories[1].total_quantity, 3);

    let overview = analytics_service::get_overview(&state, &admin)
        .await?
        .data
        .unwrap();
    assert_eq!(overview.total_orders, 2);
    assert_eq!(overview.total_users, 2);
    assert_eq!(overview.total_products, 3);
    assert_eq!(overview.total_revenue, dec!(60.00));
    assert_eq!(overview.top_products[0].product_id, Some(earbuds));
    assert_eq!(overview.top_products[0].total_quantity, 4);

    Ok(())
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

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, 5).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

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

async fn create_category(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
) -> anyhow::Result<Uuid> {
    let category = category_service::create_category(
        state,
        admin,
        CreateCategoryRequest {
            name: name.into(),
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
    Ok(category.id)
}

async fn create_product(
    state: &AppState,
    name: &str,
    price: Decimal,
    category_id: Option<Uuid>,
    featured: bool,
    stock: i32,
) -> anyhow::Result<Uuid> {
    use gadget_store_api::entity::products::ActiveModel as ProductActive;
    use gadget_store_api::models::slugify;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        description: Set(None),
        price: Set(price),
        original_price: Set(None),
        stock_quantity: Set(stock),
        is_active: Set(true),
        is_featured: Set(featured),
        images: Set(serde_json::json!([])),
        category_id: Set(category_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}
