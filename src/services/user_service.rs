use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::UserQuery,
    services::auth_service::hash_password,
};

fn validate_role(role: &str) -> AppResult<()> {
    if role == "admin" || role == "user" {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid role '{role}'")))
    }
}

pub async fn list_users(
    pool: &DbPool,
    user: &AuthUser,
    query: UserQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let items: Vec<User> = sqlx::query_as(
        r#"
        SELECT * FROM users
        WHERE ($1::text IS NULL OR username ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(query.q.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM users
        WHERE ($1::text IS NULL OR username ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
        "#,
    )
    .bind(query.q.as_deref())
    .fetch_one(pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn create_user(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    validate_role(&payload.role)?;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".into()));
    }

    let password_hash = hash_password(&payload.password)?;

    let created: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, phone, address, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.username)
    .bind(payload.email)
    .bind(password_hash)
    .bind(payload.phone)
    .bind(payload.address)
    .bind(payload.role)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "user_create",
        Some("users"),
        Some(serde_json::json!({ "created_user_id": created.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("User created", created, None))
}

pub async fn update_user(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let role = payload.role.unwrap_or(existing.role);
    validate_role(&role)?;

    let username = payload.username.unwrap_or(existing.username);
    let phone = payload.phone.or(existing.phone);
    let address = payload.address.or(existing.address);
    let avatar_url = payload.avatar_url.or(existing.avatar_url);

    let updated: User = sqlx::query_as(
        r#"
        UPDATE users
        SET username = $2, phone = $3, address = $4, role = $5, avatar_url = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(phone)
    .bind(address)
    .bind(role)
    .bind(avatar_url)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "user_update",
        Some("users"),
        Some(serde_json::json!({ "updated_user_id": updated.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("User updated", updated, None))
}

pub async fn delete_user(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    if id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "deleted_user_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
