use gadget_store_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::AddToCartRequest,
        viewed::TrackViewRequest,
        wishlist::AddWishlistRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::{cart_service, viewed_service, wishlist_service},
    state::AppState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Wishlist uniqueness, viewed-history upsert with its 50-entry window, and
// the server-side cart in one pass.
#[tokio::test]
async fn wishlist_viewed_and_cart_flow() -> anyhow::Result<()> {
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
    let user_id = create_user(&state, "user", "collector@example.com").await?;
    let user = AuthUser {
        user_id,
        role: "user".into(),
    };

    let first = create_product(&state, "Widget 0", dec!(10.00)).await?;

    // Wishlist: second add of the same pair conflicts and leaves one row.
    wishlist_service::add_to_wishlist(
        &state.pool,
        &user,
        AddWishlistRequest { product_id: first },
    )
    .await?;
    let err = wishlist_service::add_to_wishlist(
        &state.pool,
        &user,
        AddWishlistRequest { product_id: first },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let wishlist = wishlist_service::list_wishlist(&state.pool, &user, default_pagination())
        .await?
        .data
        .unwrap();
    assert_eq!(wishlist.items.len(), 1);

    let err = wishlist_service::add_to_wishlist(
        &state.pool,
        &user,
        AddWishlistRequest {
            product_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    wishlist_service::remove_from_wishlist(&state.pool, &user, first).await?;
    let err = wishlist_service::remove_from_wishlist(&state.pool, &user, first)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Viewed history: a repeat view updates the row instead of duplicating it.
    let tracked = viewed_service::track_view(
        &state.pool,
        &user,
        TrackViewRequest { product_id: first },
    )
    .await?
    .data
    .unwrap();
    let retracked = viewed_service::track_view(
        &state.pool,
        &user,
        TrackViewRequest { product_id: first },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(tracked.id, retracked.id);
    assert!(retracked.viewed_at >= tracked.viewed_at);

    let history = viewed_service::list_viewed(&state.pool, &user).await?.data.unwrap();
    assert_eq!(history.items.len(), 1);

    // The 51st distinct product pushes the oldest view off the returned list.
    for i in 1..=50 {
        let product_id = create_product(&state, &format!("Widget {i}"), dec!(5.00)).await?;
        viewed_service::track_view(&state.pool, &user, TrackViewRequest { product_id }).await?;
    }

    let history = viewed_service::list_viewed(&state.pool, &user).await?.data.unwrap();
    assert_eq!(history.items.len(), 50);
    assert!(
        !history.items.iter().any(|item| item.product_id == first),
        "oldest view should have dropped off the top-50 list"
    );

    viewed_service::clear_viewed(&state.pool, &user).await?;
    let history = viewed_service::list_viewed(&state.pool, &user).await?.data.unwrap();
    assert!(history.items.is_empty());

    // Cart: add is an upsert on (user, product); total covers the whole cart.
    let a = create_product(&state, "Cart Item A", dec!(12.50)).await?;
    let b = create_product(&state, "Cart Item B", dec!(3.25)).await?;

    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: a,
            quantity: 2,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: a,
            quantity: 3,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: b,
            quantity: 1,
        },
    )
    .await?;

    let cart = cart_service::list_cart(&state.pool, &user, default_pagination())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total, dec!(40.75));

    let err = cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: a,
            quantity: 0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    cart_service::remove_from_cart(&state.pool, &user, b).await?;
    cart_service::clear_cart(&state.pool, &user).await?;
    let cart = cart_service::list_cart(&state.pool, &user, default_pagination())
        .await?
        .data
        .unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);

    Ok(())
}

fn default_pagination() -> Pagination {
    Pagination {
        page: Some(1),
        per_page: Some(100),
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

async fn create_product(
    state: &AppState,
    name: &str,
    price: Decimal,
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
        stock_quantity: Set(100),
        is_active: Set(true),
        is_featured: Set(false),
        images: Set(serde_json::json!([])),
        category_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}
