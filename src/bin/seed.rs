use axum_booking_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

const DEMO_BUSINESS: &str = "Fade Room";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let owner_id = ensure_user(&pool, "Olivia", "owner@example.com", "owner123", "business").await?;
    let client_id =
        ensure_user(&pool, "Carlos", "client@example.com", "client123", "client").await?;
    let business_id = seed_business(&pool, owner_id).await?;

    println!("Seed completed. Owner ID: {owner_id}, Client ID: {client_id}, Business ID: {business_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_business(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM business_profiles WHERE user_id = $1 AND name = $2")
            .bind(owner_id)
            .bind(DEMO_BUSINESS)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        println!("Business {DEMO_BUSINESS} already seeded");
        return Ok(id);
    }

    let mut tx = pool.begin().await?;
    let business_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO business_profiles (id, user_id, name, about, latitude, longitude, location, phone_number, tag)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(business_id)
    .bind(owner_id)
    .bind(DEMO_BUSINESS)
    .bind("Cuts and shaves since 2019")
    .bind(41.3874)
    .bind(2.1686)
    .bind("Barcelona")
    .bind("+34 600 000 000")
    .bind("barber")
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO business_staff (id, business_id, name) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(business_id)
        .bind("Ana")
        .execute(&mut *tx)
        .await?;

    let category_id = Uuid::new_v4();
    sqlx::query("INSERT INTO service_categories (id, business_id, title) VALUES ($1, $2, $3)")
        .bind(category_id)
        .bind(business_id)
        .bind("Hair")
        .execute(&mut *tx)
        .await?;

    let services = [
        ("Cut", 30, 20_i64, "Classic scissor cut"),
        ("Wash", 10, 5, "Shampoo and conditioner"),
    ];
    for (title, duration, price, description) in services {
        sqlx::query(
            r#"
            INSERT INTO services (id, category_id, title, duration, price, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(title)
        .bind(duration)
        .bind(price)
        .bind(description)
        .execute(&mut *tx)
        .await?;
    }

    for day in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
        sqlx::query(
            r#"
            INSERT INTO business_availability (id, business_id, day, is_closed, open_time, close_time)
            VALUES ($1, $2, $3, FALSE, '09:00', '18:00')
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(business_id)
        .bind(day)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    println!("Seeded business {DEMO_BUSINESS}");
    Ok(business_id)
}
