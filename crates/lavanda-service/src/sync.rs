use crate::store::{OrderEvent, OrderStore, TrackingStore};
use lavanda_core::tracking::TrackingRecord;
use lavanda_core::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

/// Keeps the tracking collection lifecycle-linked 1:1 to the order
/// collection: order created → tracking record seeded, order updated →
/// mirror fields refreshed, order removed → tracking record deleted.
///
/// Runs as a managed background task with an explicit stop, never as
/// ambient static state. The change stream is at-least-once, so `apply`
/// is idempotent on re-delivery.
pub struct Synchronizer {
    orders: Arc<dyn OrderStore>,
    tracking: Arc<dyn TrackingStore>,
}

impl Synchronizer {
    pub fn new(orders: Arc<dyn OrderStore>, tracking: Arc<dyn TrackingStore>) -> Self {
        Self { orders, tracking }
    }

    /// Process one order change event. Public so replays and backfills can
    /// drive it directly; the existence check keyed on the shared id makes
    /// re-processing a creation event a no-op.
    pub async fn apply(&self, event: OrderEvent) -> Result<()> {
        match event {
            OrderEvent::Created(order) => {
                if self.tracking.get(&order.id).await?.is_some() {
                    return Ok(());
                }
                self.tracking
                    .create(TrackingRecord::for_order(&order))
                    .await?;
                tracing::info!(order = %order.order_number, "tracking record created");
            }
            OrderEvent::Updated(order) => {
                if let Some(mut record) = self.tracking.get(&order.id).await? {
                    record.refresh_from(&order);
                    self.tracking.put(record).await?;
                    tracing::debug!(order = %order.order_number, "tracking record refreshed");
                }
            }
            OrderEvent::Removed(id) => {
                if self.tracking.delete(&id).await? {
                    tracing::info!(id, "tracking record removed");
                }
            }
        }
        Ok(())
    }

    /// Subscribe to the order change stream and run until stopped.
    pub fn spawn(self) -> SyncHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut events = self.orders.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    event = events.recv() => match event {
                        Ok(event) => {
                            // One failing order must not stop synchronization
                            // for the others.
                            if let Err(err) = self.apply(event).await {
                                tracing::warn!(%err, "order event failed");
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "order stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            tracing::info!("synchronizer stopped");
        });

        SyncHandle {
            shutdown: shutdown_tx,
            handle,
        }
    }
}

// ---------------------------------------------------------------------------
// SyncHandle
// ---------------------------------------------------------------------------

pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SyncHandle {
    /// Signal shutdown and wait for the task to drain.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
