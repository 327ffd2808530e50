use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use gadget_store_api::{config::AppConfig, db::create_pool, models::slugify};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123", "user", "demo-user").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
    username: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    sqlx::query(
        r#"
        INSERT INTO profiles (id, user_id, email, username, full_name)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(email)
    .bind(username)
    .bind(username)
    .execute(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = ["Audio", "Wearables", "Accessories"];
    for name in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, sort_order)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .execute(pool)
        .await?;
    }

    let products: Vec<(&str, &str, Decimal, i32, &str)> = vec![
        ("Neon Earbuds", "Wireless earbuds with glow shell", dec!(59.99), 120, "Audio"),
        ("Pulse Headset", "Over-ear headset with mic", dec!(129.00), 60, "Audio"),
        ("Tracker Band", "Fitness band, 7-day battery", dec!(39.50), 200, "Wearables"),
        ("Cable Trio", "USB-C cable three-pack", dec!(14.99), 500, "Accessories"),
    ];

    for (name, desc, price, stock, category) in products {
        let category_id: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM categories WHERE slug = $1")
                .bind(slugify(category))
                .fetch_optional(pool)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, price, stock_quantity, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(category_id.map(|c| c.0))
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
