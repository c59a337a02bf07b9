use anyhow::Result;
use diesel_async::{pooled_connection::bb8::Pool, AsyncConnection, AsyncPgConnection};
use futures::StreamExt;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::Message;
use tracing::{error, info, warn};

use crate::models::{NewOrder, NewPayment};
use crate::store::{self, StoreError};
use shared::*;

type DbPool = Pool<AsyncPgConnection>;

pub struct NotificationHandler {
    pool: DbPool,
}

impl NotificationHandler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn run(&self, consumer: StreamConsumer) {
        let mut message_stream = consumer.stream();

        while let Some(message) = message_stream.next().await {
            match message {
                Ok(m) => {
                    if let Some(payload) = m.payload_view::<str>() {
                        match payload {
                            Ok(json_str) => match serde_json::from_str::<Notification>(json_str) {
                                Ok(notification) => {
                                    if let Err(e) = self.handle_notification(notification).await {
                                        error!("Error handling notification: {}", e);
                                    }
                                }
                                Err(e) => warn!("Skipping malformed notification: {}", e),
                            },
                            Err(e) => error!("Error parsing payload: {}", e),
                        }
                    }
                    if let Err(e) =
                        consumer.commit_message(&m, rdkafka::consumer::CommitMode::Async)
                    {
                        error!("Error committing message: {}", e);
                    }
                }
                Err(e) => error!("Error receiving message: {}", e),
            }
        }
    }

    async fn handle_notification(&self, notification: Notification) -> Result<()> {
        let mut conn = self.pool.get().await?;

        match notification.kind {
            NotificationKind::OrderRegistered => {
                let registration: OrderRegistration =
                    serde_json::from_value(notification.payload)?;
                self.handle_order_registered(&mut conn, registration).await
            }
            NotificationKind::StatusReport => {
                let report: StatusReport = serde_json::from_value(notification.payload)?;
                self.handle_status_report(&mut conn, report).await
            }
        }
    }

    async fn handle_order_registered(
        &self,
        conn: &mut AsyncPgConnection,
        registration: OrderRegistration,
    ) -> Result<()> {
        let mut new_order = NewOrder::new(
            registration.order_key,
            registration.merchant_order_id,
            registration.total_gross_amount,
            registration.currency,
        );
        if let Some(language) = registration.language {
            new_order.language = language;
        }
        new_order.country = registration.country;

        match store::create_order(conn, new_order).await {
            Ok(order) => {
                info!("Tracking order {} ({})", order.order_key, order.status);
                Ok(())
            }
            Err(StoreError::DuplicateOrderKey(key)) => {
                // The processor redelivers registrations; the first insert wins.
                warn!("Order {} is already tracked, skipping registration", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn handle_status_report(
        &self,
        conn: &mut AsyncPgConnection,
        report: StatusReport,
    ) -> Result<()> {
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            Box::pin(async move {
                let order = match store::find_order(conn, &report.order_key).await? {
                    Some(order) => order,
                    None => {
                        warn!(
                            "Status report for untracked order {}, dropping",
                            report.order_key
                        );
                        return Ok(());
                    }
                };

                for payment_report in &report.payments {
                    match store::find_payment(conn, &payment_report.payment_id).await? {
                        Some(_) => {
                            store::update_payment(
                                conn,
                                &payment_report.payment_id,
                                &payment_report.status,
                                &payment_report.payment_method,
                            )
                            .await?;
                        }
                        None => {
                            store::create_payment(
                                conn,
                                NewPayment::from_report(order.id, payment_report),
                            )
                            .await?;
                        }
                    }
                }

                // The order-level summary follows the most recent payment.
                if let Some(latest) = store::latest_payment(conn, order.id).await? {
                    let status = OrderStatus::from_processor(&latest.status);
                    if status != order.status {
                        info!(
                            "Order {} status {} -> {}",
                            order.order_key, order.status, status
                        );
                        store::update_order_status(conn, &order.order_key, status).await?;
                    }
                }

                Ok(())
            })
        })
        .await
    }
}
