use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{
        ChangePasswordRequest, Claims, ForgotPasswordRequest, LoginRequest, LoginResponse,
        RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
};

const RESET_PURPOSE: &str = "password_reset";

pub async fn register_user(pool: &DbPool, payload: RegisterRequest) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        phone,
        address,
        password,
    } = payload;

    if username.trim().is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, phone, address, role)
        VALUES ($1, $2, $3, $4, $5, $6, 'user')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username.trim())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(phone)
    .bind(address)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login_user(pool: &DbPool, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    verify_password(&password, &user.password_hash)?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
        purpose: None,
    };

    let token = encode_token(&claims)?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let profile: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    match profile {
        Some(p) => Ok(ApiResponse::success("OK", p, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or(existing.username);
    let phone = payload.phone.or(existing.phone);
    let address = payload.address.or(existing.address);
    let avatar_url = payload.avatar_url.or(existing.avatar_url);

    let updated: User = sqlx::query_as(
        r#"
        UPDATE users
        SET username = $2, phone = $3, address = $4, avatar_url = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(username)
    .bind(phone)
    .bind(address)
    .bind(avatar_url)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Profile updated", updated, None))
}

pub async fn change_password(
    pool: &DbPool,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    verify_password(&payload.current_password, &existing.password_hash)
        .map_err(|_| AppError::BadRequest("Current password is incorrect".into()))?;

    set_password(pool, existing.id, &payload.new_password).await?;

    Ok(ApiResponse::success(
        "Password updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Issue a short-lived single-purpose token for the given user. Delivery is
/// the mail pipeline's problem; the caller decides what to do with it.
pub fn issue_reset_token(user_id: Uuid, role: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(30))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
        purpose: Some(RESET_PURPOSE.to_string()),
    };
    encode_token(&claims)
}

pub async fn forgot_password(
    pool: &DbPool,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user: Option<(Uuid, String)> = sqlx::query_as("SELECT id, role FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(pool)
        .await?;

    // Answer identically whether or not the address is known.
    if let Some((user_id, role)) = user {
        let token = issue_reset_token(user_id, &role)?;
        tracing::info!(%user_id, token, "password reset token issued");
    }

    Ok(ApiResponse::success(
        "If the address is registered, a reset link has been sent",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn reset_password(
    pool: &DbPool,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let secret = jwt_secret()?;
    let decoded = decode::<Claims>(
        &payload.token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::BadRequest("Invalid or expired token".into()))?;

    if decoded.claims.purpose.as_deref() != Some(RESET_PURPOSE) {
        return Err(AppError::BadRequest("Invalid token".into()));
    }

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

    set_password(pool, user_id, &payload.new_password).await?;

    if let Err(err) = log_audit(
        pool,
        Some(user_id),
        "password_reset",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Password updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn set_password(pool: &DbPool, user_id: Uuid, new_password: &str) -> AppResult<()> {
    if new_password.len() < 6 {
        return Err(AppError::BadRequest(
            "password must be at least 6 characters".into(),
        ));
    }
    let password_hash = hash_password(new_password)?;
    let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }
    Ok(())
}

fn jwt_secret() -> AppResult<String> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

fn encode_token(claims: &Claims) -> AppResult<String> {
    let secret = jwt_secret()?;
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
