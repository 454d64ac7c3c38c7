use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Order lifecycle. `approved`, `completed` and `cancelled` are accepted as
/// aliases left over from the storefront's early schema and canonicalized
/// on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Rejected,
}

impl OrderStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" | "approved" => Some(Self::Confirmed),
            "processing" => Some(Self::Processing),
            "shipped" => Some(Self::Shipped),
            "delivered" | "completed" => Some(Self::Delivered),
            "rejected" | "cancelled" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Rejected => "rejected",
        }
    }

    /// Only the transition into `confirmed` reflects the sale in stock.
    pub fn requires_stock(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Rejected)
                | (Self::Confirmed, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
        )
    }
}

/// The products.images column evolved from a single URL string to an array
/// of URLs; both shapes still exist in old rows. Reads always go through
/// here so the rest of the crate only ever sees an array.
pub fn normalize_images(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: i64,
    pub status: String,
    pub payment_proof_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct WishlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parse_accepts_legacy_aliases() {
        assert_eq!(OrderStatus::parse("approved"), Some(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::parse("completed"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::parse("cancelled"), Some(OrderStatus::Rejected));
        assert_eq!(OrderStatus::parse("pending"), Some(OrderStatus::Pending));
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        assert_eq!(OrderStatus::parse("paid"), None);
        assert_eq!(OrderStatus::parse(""), None);
        assert_eq!(OrderStatus::parse("PENDING"), None);
    }

    #[test]
    fn status_transitions_are_forward_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Processing));
        assert!(!Rejected.can_transition_to(Confirmed));
    }

    #[test]
    fn only_confirmed_touches_stock() {
        use OrderStatus::*;
        assert!(Confirmed.requires_stock());
        for status in [Pending, Processing, Shipped, Delivered, Rejected] {
            assert!(!status.requires_stock());
        }
    }

    #[test]
    fn images_single_string_becomes_one_element_list() {
        let value = json!("https://cdn.example.com/hijab.jpg");
        assert_eq!(
            normalize_images(&value),
            vec!["https://cdn.example.com/hijab.jpg".to_string()]
        );
    }

    #[test]
    fn images_array_passes_through() {
        let value = json!(["a.jpg", "b.jpg"]);
        assert_eq!(
            normalize_images(&value),
            vec!["a.jpg".to_string(), "b.jpg".to_string()]
        );
    }

    #[test]
    fn images_other_shapes_yield_empty_list() {
        assert!(normalize_images(&json!(null)).is_empty());
        assert!(normalize_images(&json!(42)).is_empty());
        assert_eq!(normalize_images(&json!(["a.jpg", 7])), vec!["a.jpg".to_string()]);
    }
}
