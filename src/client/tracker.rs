use crate::entities::OrderStatus;
use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, OrderStatusResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "הזמנה התקבלה",
        OrderStatus::Accepted => "ההזמנה בטיפול",
        OrderStatus::InProgress => "מכינים עבורך",
        OrderStatus::OnTheWay => "ההזמנה בדרך אליך",
        OrderStatus::Delivered => "ההזמנה סופקה",
        OrderStatus::Cancelled => "ההזמנה בוטלה",
    }
}

/// Where the tracker reads order status from. `Ok(None)` means the order does not exist.
#[async_trait]
pub trait OrderStatusSource: Send + Sync {
    async fn fetch_status(&self, order_id: Uuid) -> AppResult<Option<OrderStatusResponse>>;
}

/// Reads `GET {base}/api/v1/orders/{id}`.
#[derive(Clone)]
pub struct HttpOrderStatusSource {
    client: Client,
    base_url: String,
}

impl HttpOrderStatusSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn order_url(&self, order_id: Uuid) -> String {
        format!(
            "{}/api/v1/orders/{order_id}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl OrderStatusSource for HttpOrderStatusSource {
    async fn fetch_status(&self, order_id: Uuid) -> AppResult<Option<OrderStatusResponse>> {
        let response = self.client.get(self.order_url(order_id)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let envelope = response.json::<ApiResponse<OrderStatusResponse>>().await?;
                envelope.data.map(Some).ok_or_else(|| {
                    AppError::ExternalApiError("Status response without data".to_string())
                })
            }
            status => Err(AppError::ExternalApiError(format!(
                "Status fetch failed: HTTP {status}"
            ))),
        }
    }
}

/// Why tracking stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEnd {
    Finished(OrderStatusResponse),
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Active(OrderStatusResponse),
    Finished(TrackingEnd),
    /// Transient failure; keep polling.
    Skipped,
}

/// 轮询订单状态：终态或 404 时停止，并清除跟踪的订单号
pub struct OrderTracker<S> {
    source: S,
    interval: Duration,
    tracked: Option<Uuid>,
    last_status: Option<OrderStatus>,
}

impl<S: OrderStatusSource> OrderTracker<S> {
    pub fn new(source: S, order_id: Uuid) -> Self {
        Self {
            source,
            interval: DEFAULT_POLL_INTERVAL,
            tracked: Some(order_id),
            last_status: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn tracked_order(&self) -> Option<Uuid> {
        self.tracked
    }

    pub fn last_status(&self) -> Option<OrderStatus> {
        self.last_status
    }

    /// One fetch. Returns `None` once tracking has already ended.
    pub async fn poll_once(&mut self) -> Option<PollOutcome> {
        let order_id = self.tracked?;
        let outcome = match self.source.fetch_status(order_id).await {
            Ok(None) => {
                log::info!("Tracked order {order_id} not found, clearing");
                self.tracked = None;
                PollOutcome::Finished(TrackingEnd::NotFound)
            }
            Ok(Some(resp)) => {
                self.last_status = Some(resp.status);
                if resp.status.is_terminal() {
                    // 终态保留最后状态，但不再轮询
                    self.tracked = None;
                    PollOutcome::Finished(TrackingEnd::Finished(resp))
                } else {
                    PollOutcome::Active(resp)
                }
            }
            Err(e) => {
                log::warn!("Status polling error for order {order_id}: {e}");
                PollOutcome::Skipped
            }
        };
        Some(outcome)
    }

    /// Polls immediately, then every interval, until the order is terminal or gone.
    pub async fn run<F>(&mut self, mut on_update: F) -> Option<TrackingEnd>
    where
        F: FnMut(&OrderStatusResponse),
    {
        loop {
            match self.poll_once().await? {
                PollOutcome::Active(resp) => on_update(&resp),
                PollOutcome::Finished(end) => {
                    if let TrackingEnd::Finished(resp) = &end {
                        on_update(resp);
                    }
                    return Some(end);
                }
                PollOutcome::Skipped => {}
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
