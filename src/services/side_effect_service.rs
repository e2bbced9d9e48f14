//! Post-transition side effects (invoice + customer SMS).
//!
//! The lifecycle engine enqueues a [`SideEffect`] after the order row has been
//! written; the worker in `tasks` picks it up and runs it with a
//! [`SideEffectRunner`]. Nothing here can fail the triggering transition.

use crate::entities::order_entity;
use crate::error::{AppError, AppResult};
use crate::services::{
    DispatchOutcome, Invoice, InvoiceError, InvoiceProvider, InvoiceRequest,
    NotificationDispatcher,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const PAYMENT_CONFIRMED_MESSAGE: &str = "התשלום עבור ההזמנה שלך התקבל. תודה!";
pub const DELIVERED_MESSAGE: &str = "ההזמנה שלך סופקה. תודה!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// payment_status moved to PAID
    PaymentConfirmed { order_id: Uuid },
    /// status moved to DELIVERED
    Delivered { order_id: Uuid },
}

impl SideEffect {
    pub fn order_id(&self) -> Uuid {
        match self {
            SideEffect::PaymentConfirmed { order_id } | SideEffect::Delivered { order_id } => {
                *order_id
            }
        }
    }
}

/// Sending half of the side-effect channel.
#[derive(Clone)]
pub struct SideEffectQueue {
    tx: mpsc::UnboundedSender<SideEffect>,
}

impl SideEffectQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SideEffect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, effect: SideEffect) {
        if let Err(e) = self.tx.send(effect) {
            log::error!(
                "Side effect dropped, worker not running: order={} effect={:?}",
                effect.order_id(),
                e.0
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Doubled after every failed attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectReport {
    pub invoice: Option<Invoice>,
    pub notification: DispatchOutcome,
}

#[derive(Clone)]
pub struct SideEffectRunner {
    pool: DatabaseConnection,
    dispatcher: NotificationDispatcher,
    invoices: Arc<dyn InvoiceProvider>,
    retry: RetryPolicy,
}

impl SideEffectRunner {
    pub fn new(
        pool: DatabaseConnection,
        dispatcher: NotificationDispatcher,
        invoices: Arc<dyn InvoiceProvider>,
    ) -> Self {
        Self {
            pool,
            dispatcher,
            invoices,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self, effect: SideEffect) -> AppResult<SideEffectReport> {
        let order_id = effect.order_id();
        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;

        match effect {
            SideEffect::PaymentConfirmed { .. } => {
                let invoice = self.ensure_invoice(&order).await;
                let message = payment_message(invoice.as_ref());
                let notification = self.dispatcher.send(&order.customer_phone, &message).await;
                Ok(SideEffectReport {
                    invoice,
                    notification,
                })
            }
            SideEffect::Delivered { .. } => {
                let notification = self
                    .dispatcher
                    .send(&order.customer_phone, DELIVERED_MESSAGE)
                    .await;
                Ok(SideEffectReport {
                    invoice: None,
                    notification,
                })
            }
        }
    }

    /// Returns the order's invoice, creating it once. An order that already
    /// carries an invoice id is never invoiced again.
    async fn ensure_invoice(&self, order: &order_entity::Model) -> Option<Invoice> {
        if let Some(invoice_id) = &order.invoice_id {
            log::info!("Order {} already invoiced ({invoice_id})", order.id);
            return Some(Invoice {
                invoice_id: invoice_id.clone(),
                url: order.invoice_url.clone(),
            });
        }

        let request = InvoiceRequest {
            order_id: order.id,
            total_amount: order.total_amount,
            customer_phone: order.customer_phone.clone(),
            created_at: order.created_at,
        };

        let invoice = match self.create_with_retry(&request).await {
            Ok(invoice) => invoice,
            Err(e) => {
                log::error!("Invoice creation failed for order {}: {e}", order.id);
                return None;
            }
        };

        match self.persist_invoice(order.id, &invoice).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                log::error!("Failed to store invoice {} on order {}: {e}", invoice.invoice_id, order.id);
                Some(invoice)
            }
        }
    }

    async fn create_with_retry(&self, request: &InvoiceRequest) -> Result<Invoice, InvoiceError> {
        let attempts = self.retry.attempts.max(1);
        let mut delay = self.retry.base_delay;
        let mut attempt = 1;
        loop {
            match self.invoices.create_invoice(request).await {
                Ok(invoice) => return Ok(invoice),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    log::warn!(
                        "Invoice attempt {attempt}/{attempts} failed for order {}: {e}",
                        request.order_id
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 仅在 invoice_id 为空时写入，避免并发重复写
    async fn persist_invoice(&self, order_id: Uuid, invoice: &Invoice) -> AppResult<Invoice> {
        let result = order_entity::Entity::update_many()
            .col_expr(
                order_entity::Column::InvoiceId,
                Expr::value(invoice.invoice_id.clone()),
            )
            .col_expr(
                order_entity::Column::InvoiceUrl,
                Expr::value(invoice.url.clone()),
            )
            .filter(order_entity::Column::Id.eq(order_id))
            .filter(order_entity::Column::InvoiceId.is_null())
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 1 {
            return Ok(invoice.clone());
        }

        let stored = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .and_then(|o| {
                o.invoice_id.map(|invoice_id| Invoice {
                    invoice_id,
                    url: o.invoice_url,
                })
            });
        log::warn!("Order {order_id} was invoiced concurrently, keeping the stored invoice");
        Ok(stored.unwrap_or_else(|| invoice.clone()))
    }
}

pub fn payment_message(invoice: Option<&Invoice>) -> String {
    match invoice {
        Some(Invoice {
            invoice_id,
            url: Some(url),
        }) => format!("{PAYMENT_CONFIRMED_MESSAGE}\nמספר קבלה: {invoice_id}\n{url}"),
        Some(Invoice {
            invoice_id,
            url: None,
        }) => format!("{PAYMENT_CONFIRMED_MESSAGE}\nמספר קבלה: {invoice_id}"),
        None => PAYMENT_CONFIRMED_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppEnvironment;
    use crate::test_support::{self, FakeInvoiceProvider, RecordingSms};

    fn no_delay() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::ZERO,
        }
    }

    async fn runner(
        invoices: Arc<FakeInvoiceProvider>,
        sms: Arc<RecordingSms>,
    ) -> (SideEffectRunner, test_support::Fixture) {
        let db = test_support::setup_db().await;
        let fixture = test_support::seed_demo(&db).await;
        let dispatcher = NotificationDispatcher::new(sms, AppEnvironment::Production);
        let runner = SideEffectRunner::new(db, dispatcher, invoices).with_retry(no_delay());
        (runner, fixture)
    }

    #[tokio::test]
    async fn test_payment_confirmed_invoices_and_texts_receipt() {
        let invoices = Arc::new(FakeInvoiceProvider::default());
        let sms = Arc::new(RecordingSms::default());
        let (runner, fx) = runner(invoices.clone(), sms.clone()).await;
        let order = test_support::insert_order(&runner.pool, &fx, fx.area_id).await;

        let report = runner
            .run(SideEffect::PaymentConfirmed { order_id: order.id })
            .await
            .unwrap();

        let invoice = report.invoice.unwrap();
        assert_eq!(invoice.invoice_id, format!("INV-{}", order.id));
        assert_eq!(report.notification, DispatchOutcome::Sent);

        let sent = sms.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+972545555555");
        assert!(sent[0].1.starts_with(PAYMENT_CONFIRMED_MESSAGE));
        assert!(sent[0].1.contains(&invoice.invoice_id));

        let stored = order_entity::Entity::find_by_id(order.id)
            .one(&runner.pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.invoice_id.as_deref(), Some(invoice.invoice_id.as_str()));
    }

    #[tokio::test]
    async fn test_second_payment_effect_reuses_invoice() {
        let invoices = Arc::new(FakeInvoiceProvider::default());
        let sms = Arc::new(RecordingSms::default());
        let (runner, fx) = runner(invoices.clone(), sms.clone()).await;
        let order = test_support::insert_order(&runner.pool, &fx, fx.area_id).await;

        let effect = SideEffect::PaymentConfirmed { order_id: order.id };
        let first = runner.run(effect).await.unwrap();
        let second = runner.run(effect).await.unwrap();

        assert_eq!(invoices.calls(), 1);
        assert_eq!(first.invoice, second.invoice);
    }

    #[tokio::test]
    async fn test_invoice_retried_then_sms_still_sent() {
        let invoices = Arc::new(FakeInvoiceProvider::failing_times(2));
        let sms = Arc::new(RecordingSms::default());
        let (runner, fx) = runner(invoices.clone(), sms.clone()).await;
        let order = test_support::insert_order(&runner.pool, &fx, fx.area_id).await;

        let report = runner
            .run(SideEffect::PaymentConfirmed { order_id: order.id })
            .await
            .unwrap();
        assert_eq!(invoices.calls(), 3);
        assert!(report.invoice.is_some());
    }

    #[tokio::test]
    async fn test_invoice_failure_does_not_block_sms() {
        let invoices = Arc::new(FakeInvoiceProvider::failing_times(10));
        let sms = Arc::new(RecordingSms::default());
        let (runner, fx) = runner(invoices.clone(), sms.clone()).await;
        let order = test_support::insert_order(&runner.pool, &fx, fx.area_id).await;

        let report = runner
            .run(SideEffect::PaymentConfirmed { order_id: order.id })
            .await
            .unwrap();
        assert_eq!(invoices.calls(), 3);
        assert_eq!(report.invoice, None);
        assert_eq!(report.notification, DispatchOutcome::Sent);
        assert_eq!(sms.sent()[0].1, PAYMENT_CONFIRMED_MESSAGE);
    }

    #[tokio::test]
    async fn test_delivered_sends_delivery_message_only() {
        let invoices = Arc::new(FakeInvoiceProvider::default());
        let sms = Arc::new(RecordingSms::default());
        let (runner, fx) = runner(invoices.clone(), sms.clone()).await;
        let order = test_support::insert_order(&runner.pool, &fx, fx.area_id).await;

        let report = runner
            .run(SideEffect::Delivered { order_id: order.id })
            .await
            .unwrap();
        assert_eq!(report.invoice, None);
        assert_eq!(invoices.calls(), 0);
        assert_eq!(sms.sent()[0].1, DELIVERED_MESSAGE);
    }

    #[test]
    fn test_payment_message_variants() {
        let with_url = Invoice {
            invoice_id: "R-1".into(),
            url: Some("https://r/1".into()),
        };
        let msg = payment_message(Some(&with_url));
        assert!(msg.contains("R-1") && msg.ends_with("https://r/1"));
        assert_eq!(payment_message(None), PAYMENT_CONFIRMED_MESSAGE);
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_gone_does_not_panic() {
        let (queue, rx) = SideEffectQueue::channel();
        drop(rx);
        queue.enqueue(SideEffect::Delivered {
            order_id: Uuid::new_v4(),
        });
    }
}
