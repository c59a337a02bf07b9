use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Simplified internal status of a tracked order.
///
/// Lowercased on purpose so the stored values cannot be confused with the
/// uppercase statuses the processor reports on individual payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    InProgress,
    Paid,
    ChargedBack,
    Cancelled,
    Pending,
    Refunded,
    Unknown,
}

impl OrderStatus {
    /// Storage form, as written to the status column.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Paid => "paid",
            OrderStatus::ChargedBack => "charged_back",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Pending => "pending",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Unknown => "unknown",
        }
    }

    /// Human-readable label for display surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Paid => "Paid",
            OrderStatus::ChargedBack => "Charged back",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Pending => "Pending",
            OrderStatus::Refunded => "Refunded",
            OrderStatus::Unknown => "Unknown",
        }
    }

    /// Reads a stored status column back. Rows written by an older or newer
    /// schema may carry a value outside the current set; those surface as
    /// `Unknown` rather than an error.
    pub fn parse(value: &str) -> Self {
        match value {
            "new" => OrderStatus::New,
            "in_progress" => OrderStatus::InProgress,
            "paid" => OrderStatus::Paid,
            "charged_back" => OrderStatus::ChargedBack,
            "cancelled" => OrderStatus::Cancelled,
            "pending" => OrderStatus::Pending,
            "refunded" => OrderStatus::Refunded,
            _ => OrderStatus::Unknown,
        }
    }

    /// Classifies a free-form processor payment status into the simplified
    /// order status. The payment status itself is stored verbatim; only the
    /// order-level summary goes through this mapping.
    pub fn from_processor(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "NEW" | "STARTED" => OrderStatus::New,
            "AUTHORIZED" | "AUTHENTICATED" => OrderStatus::InProgress,
            "PAID" | "CONFIRMED_PAID" => OrderStatus::Paid,
            "CANCELED" | "CANCELLED" => OrderStatus::Cancelled,
            "CHARGED_BACK" | "CHARGED-BACK" | "CHARGEBACK" => OrderStatus::ChargedBack,
            "REFUNDED" | "CONFIRMED_REFUNDED" => OrderStatus::Refunded,
            "PENDING" | "RISK_CHECK_OK" => OrderStatus::Pending,
            _ => OrderStatus::Unknown,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::New
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked processor order, as seen by consumers of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub merchant_order_id: String,
    pub order_key: String,
    pub status: OrderStatus,
    pub language: String,
    pub total_gross_amount: BigDecimal,
    pub currency: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bank account fields the processor attaches to a direct debit payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectDebitDetails {
    pub holder_name: String,
    pub holder_city: String,
    pub holder_country_code: Option<String>,
    pub iban: String,
    pub bic: String,
}

/// Payment variants. Every payment shares the base fields on [`Payment`];
/// some methods carry extra data as a variant of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentKind {
    Default,
    DirectDebit(DirectDebitDetails),
}

/// One payment the processor reported against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Processor-assigned id. Empty until the processor assigns one.
    pub payment_id: String,
    pub order_id: Uuid,
    /// Stored verbatim. Not an enum: the processor may report statuses
    /// outside any set known at compile time.
    pub status: String,
    pub payment_method: String,
    pub kind: PaymentKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    OrderRegistered,
    StatusReport,
}

impl Notification {
    pub fn new(kind: NotificationKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload,
            created_at: Utc::now(),
        }
    }
}

/// Payload of [`NotificationKind::OrderRegistered`]: an order was initiated
/// with the processor and should be tracked from now on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRegistration {
    pub order_key: String,
    pub merchant_order_id: String,
    pub total_gross_amount: BigDecimal,
    pub currency: String,
    pub language: Option<String>,
    pub country: Option<String>,
}

/// Payload of [`NotificationKind::StatusReport`]: the processor's current
/// view of every payment attempted against one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub order_key: String,
    pub payments: Vec<PaymentReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReport {
    pub payment_id: String,
    pub status: String,
    pub payment_method: String,
    pub direct_debit: Option<DirectDebitDetails>,
}
