use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::StoreError;
use shared::{DirectDebitDetails, Order, OrderStatus, Payment, PaymentKind, PaymentReport};

/// Discriminator values for the payments `kind` column.
pub const KIND_DEFAULT: &str = "default";
pub const KIND_DIRECT_DEBIT: &str = "direct_debit";

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::orders)]
pub struct OrderRow {
    pub id: Uuid,
    pub merchant_order_id: String,
    pub order_key: String,
    pub status: String,
    pub language: String,
    pub total_gross_amount: BigDecimal,
    pub currency: String,
    pub country: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub merchant_order_id: String,
    pub order_key: String,
    pub status: String,
    pub language: String,
    pub total_gross_amount: BigDecimal,
    pub currency: String,
    pub country: Option<String>,
}

impl NewOrder {
    pub fn new(
        order_key: String,
        merchant_order_id: String,
        total_gross_amount: BigDecimal,
        currency: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            merchant_order_id,
            order_key,
            status: OrderStatus::New.as_str().to_string(),
            language: "en".to_string(),
            total_gross_amount,
            currency,
            country: None,
        }
    }
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            merchant_order_id: row.merchant_order_id,
            order_key: row.order_key,
            status: OrderStatus::parse(&row.status),
            language: row.language,
            total_gross_amount: row.total_gross_amount,
            currency: row.currency,
            country: row.country,
            created_at: row.created_at.unwrap_or_else(Utc::now),
            updated_at: row.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

/// A payment as stored: one table for every variant, with the `kind` column
/// discriminating and the bank columns only populated for direct debit rows.
#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::payments)]
pub struct PaymentRow {
    pub payment_id: String,
    pub order_id: Uuid,
    pub kind: String,
    pub status: String,
    pub payment_method: String,
    pub holder_name: Option<String>,
    pub holder_city: Option<String>,
    pub holder_country_code: Option<String>,
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment {
    pub payment_id: String,
    pub order_id: Uuid,
    pub kind: String,
    pub status: String,
    pub payment_method: String,
    pub holder_name: Option<String>,
    pub holder_city: Option<String>,
    pub holder_country_code: Option<String>,
    pub iban: Option<String>,
    pub bic: Option<String>,
}

impl NewPayment {
    pub fn from_report(order_id: Uuid, report: &PaymentReport) -> Self {
        match &report.direct_debit {
            Some(details) => Self {
                payment_id: report.payment_id.clone(),
                order_id,
                kind: KIND_DIRECT_DEBIT.to_string(),
                status: report.status.clone(),
                payment_method: report.payment_method.clone(),
                holder_name: Some(details.holder_name.clone()),
                holder_city: Some(details.holder_city.clone()),
                holder_country_code: details.holder_country_code.clone(),
                iban: Some(details.iban.clone()),
                bic: Some(details.bic.clone()),
            },
            None => Self {
                payment_id: report.payment_id.clone(),
                order_id,
                kind: KIND_DEFAULT.to_string(),
                status: report.status.clone(),
                payment_method: report.payment_method.clone(),
                holder_name: None,
                holder_city: None,
                holder_country_code: None,
                iban: None,
                bic: None,
            },
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let invalid = |reason| StoreError::InvalidPaymentRecord {
            payment_id: row.payment_id.clone(),
            reason,
        };

        let kind = match row.kind.as_str() {
            KIND_DEFAULT => PaymentKind::Default,
            KIND_DIRECT_DEBIT => PaymentKind::DirectDebit(DirectDebitDetails {
                holder_name: row
                    .holder_name
                    .clone()
                    .ok_or_else(|| invalid("missing holder_name"))?,
                holder_city: row
                    .holder_city
                    .clone()
                    .ok_or_else(|| invalid("missing holder_city"))?,
                holder_country_code: row.holder_country_code.clone(),
                iban: row.iban.clone().ok_or_else(|| invalid("missing iban"))?,
                bic: row.bic.clone().ok_or_else(|| invalid("missing bic"))?,
            }),
            _ => return Err(invalid("unrecognized kind discriminator")),
        };

        Ok(Self {
            payment_id: row.payment_id,
            order_id: row.order_id,
            status: row.status,
            payment_method: row.payment_method,
            kind,
            created_at: row.created_at.unwrap_or_else(Utc::now),
            updated_at: row.updated_at.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_debit_details() -> DirectDebitDetails {
        DirectDebitDetails {
            holder_name: "J. Doe".into(),
            holder_city: "Amsterdam".into(),
            holder_country_code: Some("NL".into()),
            iban: "NL91ABNA0417164300".into(),
            bic: "ABNANL2A".into(),
        }
    }

    fn row_from(new: NewPayment) -> PaymentRow {
        PaymentRow {
            payment_id: new.payment_id,
            order_id: new.order_id,
            kind: new.kind,
            status: new.status,
            payment_method: new.payment_method,
            holder_name: new.holder_name,
            holder_city: new.holder_city,
            holder_country_code: new.holder_country_code,
            iban: new.iban,
            bic: new.bic,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn new_order_defaults() {
        let order = NewOrder::new(
            "DD123".into(),
            "M-1".into(),
            "10.00".parse().unwrap(),
            "EUR".into(),
        );
        assert_eq!(order.status, "new");
        assert_eq!(order.language, "en");
        assert_eq!(order.country, None);
    }

    #[test]
    fn order_row_with_unrecognized_status_reads_as_unknown() {
        let row = OrderRow {
            id: Uuid::new_v4(),
            merchant_order_id: "M-1".into(),
            order_key: "DD123".into(),
            status: "changed_back".into(),
            language: "en".into(),
            total_gross_amount: "10.00".parse().unwrap(),
            currency: "EUR".into(),
            country: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        let order = Order::from(row);
        assert_eq!(order.status, OrderStatus::Unknown);
    }

    #[test]
    fn default_payment_row_converts_to_default_kind() {
        let report = PaymentReport {
            payment_id: "P1".into(),
            status: "NEW".into(),
            payment_method: "IDEAL".into(),
            direct_debit: None,
        };
        let new = NewPayment::from_report(Uuid::new_v4(), &report);
        assert_eq!(new.kind, KIND_DEFAULT);
        assert_eq!(new.iban, None);

        let payment = Payment::try_from(row_from(new)).unwrap();
        assert_eq!(payment.kind, PaymentKind::Default);
        assert_eq!(payment.status, "NEW");
    }

    #[test]
    fn direct_debit_row_round_trips_bank_details() {
        let details = direct_debit_details();
        let report = PaymentReport {
            payment_id: "P2".into(),
            status: "AUTHORIZED".into(),
            payment_method: "SEPA_DIRECT_DEBIT".into(),
            direct_debit: Some(details.clone()),
        };
        let new = NewPayment::from_report(Uuid::new_v4(), &report);
        assert_eq!(new.kind, KIND_DIRECT_DEBIT);

        let payment = Payment::try_from(row_from(new)).unwrap();
        assert_eq!(payment.kind, PaymentKind::DirectDebit(details));
    }

    #[test]
    fn direct_debit_row_without_iban_is_rejected() {
        let report = PaymentReport {
            payment_id: "P3".into(),
            status: "NEW".into(),
            payment_method: "SEPA_DIRECT_DEBIT".into(),
            direct_debit: Some(direct_debit_details()),
        };
        let mut new = NewPayment::from_report(Uuid::new_v4(), &report);
        new.iban = None;

        let err = Payment::try_from(row_from(new)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPaymentRecord { .. }));
    }

    #[test]
    fn unrecognized_kind_discriminator_is_rejected() {
        let report = PaymentReport {
            payment_id: "P4".into(),
            status: "NEW".into(),
            payment_method: "IDEAL".into(),
            direct_debit: None,
        };
        let mut new = NewPayment::from_report(Uuid::new_v4(), &report);
        new.kind = "wire_transfer".into();

        assert!(Payment::try_from(row_from(new)).is_err());
    }
}
