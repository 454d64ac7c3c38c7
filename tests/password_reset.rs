use nona_market_api::{
    db::{create_pool, run_migrations},
    dto::auth::{LoginRequest, RegisterRequest, ResetPasswordRequest},
    error::AppError,
    services::auth_service,
};

// Reset token round trip: a fresh token updates the password, the old
// password stops working, and malformed or too-short inputs are rejected.
#[tokio::test]
async fn reset_token_round_trip_updates_password() -> anyhow::Result<()> {
    // Needs both a database and a signing key.
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
    if std::env::var("JWT_SECRET").is_err() {
        eprintln!("Skipping test: set JWT_SECRET to run the reset token flow.");
        return Ok(());
    }

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind("reset@example.com")
        .execute(&pool)
        .await?;

    let user = auth_service::register_user(
        &pool,
        RegisterRequest {
            username: "reset-case".into(),
            email: "reset@example.com".into(),
            phone: None,
            address: None,
            password: "old-password".into(),
        },
    )
    .await?
    .data
    .unwrap();

    let token = auth_service::issue_reset_token(user.id, &user.role)?;

    let too_short = auth_service::reset_password(
        &pool,
        ResetPasswordRequest {
            token: token.clone(),
            new_password: "short".into(),
        },
    )
    .await;
    assert!(matches!(too_short, Err(AppError::BadRequest(_))));

    auth_service::reset_password(
        &pool,
        ResetPasswordRequest {
            token,
            new_password: "new-password".into(),
        },
    )
    .await?;

    let stale = auth_service::login_user(
        &pool,
        LoginRequest {
            email: "reset@example.com".into(),
            password: "old-password".into(),
        },
    )
    .await;
    assert!(matches!(stale, Err(AppError::BadRequest(_))));

    let fresh = auth_service::login_user(
        &pool,
        LoginRequest {
            email: "reset@example.com".into(),
            password: "new-password".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(fresh.token.starts_with("Bearer "));

    // A garbage token never passes.
    let bogus = auth_service::reset_password(
        &pool,
        ResetPasswordRequest {
            token: "not-a-jwt".into(),
            new_password: "whatever-else".into(),
        },
    )
    .await;
    assert!(matches!(bogus, Err(AppError::BadRequest(_))));

    Ok(())
}
