//! Normalized order model
//!
//! The partner's raw order payloads are heterogeneous; this module defines
//! the normalized shape the rest of the system consumes. Parsing from the
//! wire format lives in the infra crate.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Order fulfilment type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Delivery,
    Takeout,
}

/// Order timing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderTiming {
    #[default]
    Immediate,
    Scheduled,
}

/// Payment method discriminator.
///
/// Methods the partner adds in the future arrive as `Other`; they are
/// preserved with their generic fields rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Cash,
    Pix,
    DigitalWallet,
    Voucher,
    Other(String),
}

impl PaymentMethod {
    /// Classify the wire-format method string.
    #[must_use]
    pub fn from_wire(method: &str) -> Self {
        match method {
            "CREDIT_CARD" => Self::CreditCard,
            "DEBIT_CARD" => Self::DebitCard,
            "CASH" => Self::Cash,
            "PIX" => Self::Pix,
            "DIGITAL_WALLET" => Self::DigitalWallet,
            "VOUCHER" => Self::Voucher,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire-format representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreditCard => "CREDIT_CARD",
            Self::DebitCard => "DEBIT_CARD",
            Self::Cash => "CASH",
            Self::Pix => "PIX",
            Self::DigitalWallet => "DIGITAL_WALLET",
            Self::Voucher => "VOUCHER",
            Self::Other(name) => name,
        }
    }

    /// True for card methods that carry brand/authorization metadata.
    #[must_use]
    pub fn is_card(&self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

impl Serialize for PaymentMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaymentMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// A payment entry attached to an order.
///
/// Method-specific fields are optional; the generic `method`/`value` pair
/// is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub value: f64,
    pub currency: String,

    // Credit/debit card
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediator_cnpj: Option<String>,

    // Cash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_for: Option<f64>,

    // Voucher (MEAL, FOOD, GIFT_CARD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_type: Option<String>,
}

impl Payment {
    /// A payment carrying only the generic fields.
    #[must_use]
    pub fn generic(method: PaymentMethod, value: f64, currency: String) -> Self {
        Self {
            method,
            value,
            currency,
            brand: None,
            authorization_code: None,
            intermediator_cnpj: None,
            change_for: None,
            voucher_type: None,
        }
    }
}

/// Geographic coordinates of a delivery address
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Delivery address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub coordinates: Option<Coordinates>,
}

/// Order customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub document_type: Option<String>,
}

/// Coupon/discount entry.
///
/// `sponsor` attribution (marketplace/store/external) is preserved
/// verbatim; downstream reporting depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub code: Option<String>,
    pub discount: Option<f64>,
    pub sponsor: Option<String>,
}

/// A line item with its selected options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub observations: Option<String>,
    #[serde(default)]
    pub options: Vec<serde_json::Value>,
}

/// Everything beyond the basic order header.
///
/// `scheduled_at` is mandatory output for SCHEDULED orders and
/// `pickup_time` for TAKEOUT orders; omitting either is a certification
/// defect, not a stylistic choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub order_type: OrderType,
    pub timing: OrderTiming,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub customer: Customer,
    pub delivery_address: Option<Address>,
    pub delivery_observations: Option<String>,
    pub pickup_code: Option<String>,
    pub payments: Vec<Payment>,
    pub coupons: Vec<Coupon>,
}

/// Normalized order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: String,
    /// Recomputed from item totals, never trusted from the API
    pub total: f64,
    pub customer: String,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub connector: String,
    pub metadata: OrderMetadata,
}
