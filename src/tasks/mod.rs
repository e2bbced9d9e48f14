//! Background workers for the application.
//!
//! Post-transition side effects (invoice + SMS) run here, outside the request
//! that changed the order. Call `spawn_side_effect_worker` once during startup
//! and hand the returned queue to the lifecycle engine.

use crate::services::{SideEffect, SideEffectQueue, SideEffectRunner};
use tokio::sync::mpsc::UnboundedReceiver;

/// Spawn the side-effect worker.
///
/// Notes
/// - Each effect runs in its own task, so a slow invoice provider does not hold up other orders.
/// - This function detaches via `tokio::spawn`; it does not block.
pub fn spawn_side_effect_worker(runner: SideEffectRunner) -> SideEffectQueue {
    let (queue, rx) = SideEffectQueue::channel();
    tokio::spawn(run_worker(runner, rx));
    queue
}

async fn run_worker(runner: SideEffectRunner, mut rx: UnboundedReceiver<SideEffect>) {
    log::info!("Side-effect worker started");
    while let Some(effect) = rx.recv().await {
        let runner = runner.clone();
        tokio::spawn(async move {
            match runner.run(effect).await {
                Ok(report) => log::info!(
                    "Side effect {:?} done: order={} invoice={:?} notification={:?}",
                    effect,
                    effect.order_id(),
                    report.invoice.map(|i| i.invoice_id),
                    report.notification
                ),
                Err(e) => log::error!(
                    "Side effect {:?} failed: order={} error={e:?}",
                    effect,
                    effect.order_id()
                ),
            }
        });
    }
    log::info!("Side-effect worker stopped");
}
