use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, normalize_images},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
};

/// Raw row shape; `images` arrives as whatever JSON the column holds and is
/// normalized before leaving this module.
#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    images: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn product_from_row(row: ProductRow) -> Product {
    Product {
        id: row.id,
        name: row.name,
        description: row.description,
        price: row.price,
        stock: row.stock,
        images: normalize_images(&row.images),
        created_at: row.created_at,
    }
}

pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    // Sort fragments come from a closed enum, never from user text.
    let sql = format!(
        r#"
        SELECT * FROM products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
          AND ($2::bigint IS NULL OR price >= $2)
          AND ($3::bigint IS NULL OR price <= $3)
        ORDER BY {} {}
        LIMIT $4 OFFSET $5
        "#,
        sort_by.as_sql(),
        sort_order.as_sql()
    );

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(query.q.as_deref())
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
          AND ($2::bigint IS NULL OR price >= $2)
          AND ($3::bigint IS NULL OR price <= $3)
        "#,
    )
    .bind(query.q.as_deref())
    .bind(query.min_price)
    .bind(query.max_price)
    .fetch_one(pool)
    .await?;

    let items = rows.into_iter().map(product_from_row).collect();
    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", product_from_row(row), None))
}

pub async fn create_product(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let images = serde_json::Value::from(payload.images);
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        INSERT INTO products (id, name, description, price, stock, images)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.stock)
    .bind(images)
    .fetch_one(pool)
    .await?;

    let product = product_from_row(row);

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let existing = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(p) => product_from_row(p),
        None => return Err(AppError::NotFound),
    };

    let name = payload.name.unwrap_or(existing.name);
    let description = payload.description.or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    let stock = payload.stock.unwrap_or(existing.stock);
    // Writes always store an array, retiring the legacy single-string shape.
    let images = serde_json::Value::from(payload.images.unwrap_or(existing.images));

    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, stock = $5, images = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(stock)
    .bind(images)
    .fetch_one(pool)
    .await?;

    let product = product_from_row(row);

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
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
