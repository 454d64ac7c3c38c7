use nona_market_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddToCartRequest, UpdateCartQuantityRequest},
        orders::CheckoutRequest,
    },
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::{cart_service, order_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Integration flow: repeated adds merge into one cart row, quantities clamp
// to stock, and checkout consumes only the selected rows.
#[tokio::test]
async fn cart_merge_clamp_and_partial_checkout_flow() -> anyhow::Result<()> {
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
    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };

    let pashmina = create_product(&state, "Pashmina Ceruti", 45000, 10).await?;
    let bergo = create_product(&state, "Bergo Jersey", 38000, 8).await?;

    // Two adds for the same product merge into a single row.
    let first = cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            product_id: pashmina,
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();

    let merged = cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            product_id: pashmina,
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 5);

    let bergo_row = cart_service::add_to_cart(
        &state.pool,
        &auth_user,
        AddToCartRequest {
            product_id: bergo,
            quantity: 1,
        },
    )
    .await?
    .data
    .unwrap();

    // Requested quantity above stock is clamped, not rejected.
    let clamped = cart_service::update_quantity(
        &state.pool,
        &auth_user,
        bergo_row.id,
        UpdateCartQuantityRequest { quantity: 20 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(clamped.quantity, 8);

    let cart = cart_service::list_cart(&state.pool, &auth_user, default_page())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 2);

    // Checkout only the pashmina row.
    let checkout = order_service::checkout(
        &state,
        &auth_user,
        CheckoutRequest {
            cart_item_ids: vec![first.id],
            payment_proof_url: "http://localhost/uploads/proof.jpg".into(),
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(checkout.order.status, "pending");
    assert_eq!(checkout.order.total_amount, 5 * 45000);
    assert_eq!(
        checkout.order.payment_proof_url,
        "http://localhost/uploads/proof.jpg"
    );
    assert_eq!(checkout.items.len(), 1);
    assert_eq!(checkout.items[0].product_id, pashmina);
    assert_eq!(checkout.items[0].quantity, 5);
    assert_eq!(checkout.items[0].price, 45000);
    assert_eq!(checkout.items[0].subtotal, 5 * 45000);

    // The unselected bergo row survives checkout.
    let cart = cart_service::list_cart(&state.pool, &auth_user, default_page())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product.id, bergo);

    // Empty selection and missing payment proof are both rejected.
    let empty = order_service::checkout(
        &state,
        &auth_user,
        CheckoutRequest {
            cart_item_ids: vec![],
            payment_proof_url: "http://localhost/uploads/proof.jpg".into(),
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let no_proof = order_service::checkout(
        &state,
        &auth_user,
        CheckoutRequest {
            cart_item_ids: vec![bergo_row.id],
            payment_proof_url: "  ".into(),
        },
    )
    .await;
    assert!(matches!(no_proof, Err(AppError::BadRequest(_))));

    Ok(())
}

fn default_page() -> Pagination {
    Pagination {
        page: None,
        per_page: None,
    }
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
