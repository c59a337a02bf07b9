use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewOrder, NewPayment, OrderRow, PaymentRow};
use crate::schema::{orders, payments};
use shared::{Order, OrderStatus, Payment};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order key {0:?} is already tracked")]
    DuplicateOrderKey(String),
    #[error("payment {payment_id:?}: {reason}")]
    InvalidPaymentRecord {
        payment_id: String,
        reason: &'static str,
    },
    #[error(transparent)]
    Database(#[from] DieselError),
}

/// Inserts a newly registered order. The unique index on `order_key` turns a
/// second registration of the same processor order into
/// [`StoreError::DuplicateOrderKey`].
pub async fn create_order(
    conn: &mut AsyncPgConnection,
    new_order: NewOrder,
) -> Result<Order, StoreError> {
    let order_key = new_order.order_key.clone();
    let row: OrderRow = diesel::insert_into(orders::table)
        .values(&new_order)
        .get_result(conn)
        .await
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::DuplicateOrderKey(order_key)
            }
            other => StoreError::Database(other),
        })?;
    Ok(row.into())
}

pub async fn find_order(
    conn: &mut AsyncPgConnection,
    order_key: &str,
) -> Result<Option<Order>, StoreError> {
    let row = orders::table
        .filter(orders::order_key.eq(order_key))
        .first::<OrderRow>(conn)
        .await
        .optional()?;
    Ok(row.map(Order::from))
}

pub async fn update_order_status(
    conn: &mut AsyncPgConnection,
    order_key: &str,
    status: OrderStatus,
) -> Result<(), StoreError> {
    diesel::update(orders::table.filter(orders::order_key.eq(order_key)))
        .set((
            orders::status.eq(status.as_str()),
            orders::updated_at.eq(Some(chrono::Utc::now())),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn create_payment(
    conn: &mut AsyncPgConnection,
    new_payment: NewPayment,
) -> Result<Payment, StoreError> {
    let row: PaymentRow = diesel::insert_into(payments::table)
        .values(&new_payment)
        .get_result(conn)
        .await?;
    row.try_into()
}

pub async fn update_payment(
    conn: &mut AsyncPgConnection,
    payment_id: &str,
    status: &str,
    payment_method: &str,
) -> Result<(), StoreError> {
    diesel::update(payments::table.filter(payments::payment_id.eq(payment_id)))
        .set((
            payments::status.eq(status),
            payments::payment_method.eq(payment_method),
            payments::updated_at.eq(Some(chrono::Utc::now())),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn find_payment(
    conn: &mut AsyncPgConnection,
    payment_id: &str,
) -> Result<Option<Payment>, StoreError> {
    let row = payments::table
        .filter(payments::payment_id.eq(payment_id))
        .first::<PaymentRow>(conn)
        .await
        .optional()?;
    row.map(Payment::try_from).transpose()
}

/// Every payment of one order, most recent first. Each row comes back as its
/// concrete variant.
pub async fn payments_for(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<Vec<Payment>, StoreError> {
    let rows = payments::table
        .filter(payments::order_id.eq(order_id))
        .order((payments::created_at.desc(), payments::updated_at.desc()))
        .load::<PaymentRow>(conn)
        .await?;
    rows.into_iter().map(Payment::try_from).collect()
}

/// The most recently created payment of an order, or `None` when the order
/// has no payments yet. An empty result is absence, never an error.
pub async fn latest_payment(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<Option<Payment>, StoreError> {
    let row = payments::table
        .filter(payments::order_id.eq(order_id))
        .order((payments::created_at.desc(), payments::updated_at.desc()))
        .first::<PaymentRow>(conn)
        .await
        .optional()?;
    row.map(Payment::try_from).transpose()
}
