use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem};

/// The checkout subset: the cart rows the customer ticked, plus the public
/// URL of the uploaded payment proof.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub cart_item_ids: Vec<Uuid>,
    pub payment_proof_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerInfo {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: CustomerInfo,
}
