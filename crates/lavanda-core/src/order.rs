use crate::types::{ClientType, DeliveryType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OrderItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub description: String,
    pub quantity: u32,
    /// Unit price in whole pesos.
    pub unit_price: i64,
}

impl OrderItem {
    pub fn total(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// An order as produced by the intake system. This core never writes orders;
/// it reads them and reacts to their change stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    /// 5-character code the receiver must produce to confirm a home delivery.
    pub dispatch_code: String,
    #[serde(default)]
    pub voucher_number: String,
    pub customer_name: String,
    pub phone: String,
    pub client_type: ClientType,
    /// Present only for dispatch orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub received_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub subtotal: i64,
    pub total: i64,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub express: bool,
    #[serde(default)]
    pub notified: bool,
}

impl Order {
    pub fn is_dispatch(&self) -> bool {
        self.delivery_type == DeliveryType::Dispatch
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
