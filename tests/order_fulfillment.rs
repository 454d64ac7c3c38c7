use nona_market_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{cart::AddToCartRequest, orders::CheckoutRequest},
    entity::{
        order_items::ActiveModel as OrderItemActive,
        orders::{ActiveModel as OrderActive, Entity as Orders},
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::admin::UpdateOrderStatusRequest,
    services::{admin_service, cart_service, order_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Fulfillment flow: confirmation deducts stock exactly once, unknown
// statuses and backward transitions are rejected without side effects, and
// a shortage blocks confirmation while naming the offending lines.
#[tokio::test]
async fn order_fulfillment_deducts_stock_and_rejects_bad_transitions() -> anyhow::Result<()> {
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

    let user_id = create_user(&state, "user", "siti@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@nonamarket.id").await?;
    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let khimar = create_product(&state, "Khimar Dua Layer", 98000, 5).await?;

    // Order 3 of 5 in stock through the normal cart flow.
    let cart_row = cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            product_id: khimar,
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();

    let order = order_service::checkout(
        &state,
        &auth_user,
        CheckoutRequest {
            cart_item_ids: vec![cart_row.id],
            payment_proof_url: "http://localhost/uploads/proof.jpg".into(),
        },
    )
    .await?
    .data
    .unwrap()
    .order;
    assert_eq!(order.status, "pending");

    // Unknown status leaves the order untouched.
    let bogus = admin_service::update_order_status(
        &state,
        &auth_admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "banana".into(),
        },
    )
    .await;
    assert!(matches!(bogus, Err(AppError::BadRequest(_))));
    assert_eq!(order_status(&state, order.id).await?, "pending");
    assert_eq!(product_stock(&state, khimar).await?, 5);

    // The legacy alias "approved" lands as "confirmed" and deducts stock.
    let confirmed = admin_service::update_order_status(
        &state,
        &auth_admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "approved".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(confirmed.status, "confirmed");
    assert_eq!(product_stock(&state, khimar).await?, 2);

    // Backward transition is rejected.
    let backward = admin_service::update_order_status(
        &state,
        &auth_admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "pending".into(),
        },
    )
    .await;
    assert!(matches!(backward, Err(AppError::BadRequest(_))));

    // Forward path still works and never touches stock again.
    for status in ["processing", "shipped", "delivered"] {
        let updated = admin_service::update_order_status(
            &state,
            &auth_admin,
            order.id,
            UpdateOrderStatusRequest {
                status: status.into(),
            },
        )
        .await?
        .data
        .unwrap();
        assert_eq!(updated.status, status);
    }
    assert_eq!(product_stock(&state, khimar).await?, 2);

    // A second order for 3 cannot be confirmed against the remaining 2.
    let short_order = create_pending_order(&state, user_id, khimar, 3, 98000).await?;
    let shortage = admin_service::update_order_status(
        &state,
        &auth_admin,
        short_order,
        UpdateOrderStatusRequest {
            status: "confirmed".into(),
        },
    )
    .await;
    match shortage {
        Err(AppError::InsufficientStock(shortages)) => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].product_name, "Khimar Dua Layer");
            assert_eq!(shortages[0].available, 2);
            assert_eq!(shortages[0].required, 3);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(order_status(&state, short_order).await?, "pending");
    assert_eq!(product_stock(&state, khimar).await?, 2);

    // Rejecting the short order is still allowed and costs no stock.
    let rejected = admin_service::update_order_status(
        &state,
        &auth_admin,
        short_order,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(rejected.status, "rejected");
    assert_eq!(product_stock(&state, khimar).await?, 2);

    // Non-admins cannot touch fulfillment at all.
    let forbidden = admin_service::update_order_status(
        &state,
        &auth_user,
        order.id,
        UpdateOrderStatusRequest {
            status: "delivered".into(),
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    Ok(())
}

async fn order_status(state: &AppState, id: Uuid) -> anyhow::Result<String> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .expect("order exists");
    Ok(order.status)
}

async fn product_stock(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    Ok(product.stock)
}

// Insert a pending order directly so its quantity can exceed what the cart
// flow would allow.
async fn create_pending_order(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: i64,
) -> anyhow::Result<Uuid> {
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_amount: Set(price * quantity as i64),
        status: Set("pending".into()),
        payment_proof_url: Set("http://localhost/uploads/proof.jpg".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    OrderItemActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        price: Set(price),
        subtotal: Set(price * quantity as i64),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(order.id)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(database_url).await?;

    // Clean tables between runs
    sqlx::query(
        "TRUNCATE TABLE order_items, orders, cart_items, wishlist_items, audit_logs, products, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        upload_dir: "uploads".into(),
        public_base_url: "http://localhost".into(),
    };

    Ok(AppState { pool, orm, config })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        phone: NotSet,
        address: NotSet,
        role: Set(role.into()),
        avatar_url: NotSet,
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        stock: Set(stock),
        images: Set(serde_json::json!([])),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}
