use nona_market_api::{config::AppConfig, db::create_pool, services::auth_service};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "Nona Admin", "admin@nonamarket.id", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "Siti", "siti@example.com", "user123", "user").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash =
        auth_service::hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
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

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "Pashmina Ceruti Babydoll",
            "Soft ceruti pashmina, non-sheer and easy to style",
            45000_i64,
            120,
            vec!["pashmina-ceruti-1.jpg", "pashmina-ceruti-2.jpg"],
        ),
        (
            "Hijab Segi Empat Voal Premium",
            "Square voal hijab with finished laser-cut edges",
            55000,
            80,
            vec!["segi-empat-voal-1.jpg"],
        ),
        (
            "Bergo Instan Jersey",
            "Instant bergo in premium jersey, ready to wear",
            38000,
            60,
            vec!["bergo-jersey-1.jpg", "bergo-jersey-2.jpg"],
        ),
        (
            "Khimar Dua Layer Syari",
            "Two-layer chest-length khimar in ceruti ultimate",
            98000,
            40,
            vec!["khimar-dua-layer-1.jpg"],
        ),
        (
            "Inner Ninja Antem",
            "Anti-headache inner cap, breathable knit",
            15000,
            200,
            vec!["inner-ninja-1.jpg"],
        ),
    ];

    for (name, desc, price, stock, images) in products {
        let images: Vec<String> = images.into_iter().map(str::to_owned).collect();
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, images)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(serde_json::Value::from(images))
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
