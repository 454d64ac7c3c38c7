use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{AdminOrderDetail, CustomerInfo, OrderList},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult, StockShortage},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::admin::UpdateOrderStatusRequest,
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = OrderStatus::parse(status)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid order status '{status}'")))?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<AdminOrderDetail>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let customer = Users::find_by_id(order.user_id)
        .one(&state.orm)
        .await?
        .map(|u| CustomerInfo {
            username: u.username,
            email: u.email,
            phone: u.phone,
        })
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let data = AdminOrderDetail {
        order: order_from_entity(order),
        items,
        customer,
    };
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Order fulfillment: validate the requested transition and, when the order
/// is being confirmed, reflect the sale in product stock. The whole thing
/// runs in one transaction with the order and product rows locked, so two
/// admins confirming concurrently cannot both pass the sufficiency check.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid order status '{}'", payload.status)))?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current = OrderStatus::parse(&order.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order {} carries unknown status '{}'",
            order.id,
            order.status
        ))
    })?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot move order from '{}' to '{}'",
            current.as_str(),
            next.as_str()
        )));
    }

    if next.requires_stock() {
        deduct_stock_for_order(&txn, order.id).await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Check every line of the order against current stock and decrement. The
/// check reports all insufficient lines at once; the decrement itself is
/// guarded by `stock >= quantity` so stock can never go negative even for
/// writers that bypass the row lock.
async fn deduct_stock_for_order(
    txn: &sea_orm::DatabaseTransaction,
    order_id: Uuid,
) -> AppResult<()> {
    let lines = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;

    let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .lock(LockType::Update)
        .all(txn)
        .await?;
    let by_id: HashMap<Uuid, _> = products.into_iter().map(|p| (p.id, p)).collect();

    let mut shortages = Vec::new();
    for line in &lines {
        let product = by_id.get(&line.product_id).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "order line references missing product {}",
                line.product_id
            ))
        })?;
        if product.stock < line.quantity {
            shortages.push(StockShortage {
                product_name: product.name.clone(),
                available: product.stock,
                required: line.quantity,
            });
        }
    }
    if !shortages.is_empty() {
        return Err(AppError::InsufficientStock(shortages));
    }

    for line in &lines {
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(
                Condition::all()
                    .add(ProdCol::Id.eq(line.product_id))
                    .add(ProdCol::Stock.gte(line.quantity)),
            )
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            let product = &by_id[&line.product_id];
            return Err(AppError::InsufficientStock(vec![StockShortage {
                product_name: product.name.clone(),
                available: product.stock,
                required: line.quantity,
            }]));
        }
    }

    Ok(())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        status: model.status,
        payment_proof_url: model.payment_proof_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        subtotal: model.subtotal,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
