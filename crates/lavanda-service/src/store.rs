use async_trait::async_trait;
use lavanda_core::order::Order;
use lavanda_core::state::OrderState;
use lavanda_core::tracking::TrackingRecord;
use lavanda_core::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// One change in the order collection, as emitted by the intake system's
/// change stream.
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created(Order),
    Updated(Order),
    Removed(String),
}

/// One change in the tracking collection.
#[derive(Debug, Clone)]
pub enum TrackingEvent {
    Created(TrackingRecord),
    Updated(TrackingRecord),
    Removed(String),
}

// ---------------------------------------------------------------------------
// TrackingFilter
// ---------------------------------------------------------------------------

/// Typed query filter over tracking records. An empty state set matches any
/// state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingFilter {
    pub active: Option<bool>,
    pub states: Vec<OrderState>,
}

impl TrackingFilter {
    /// Everything still moving through the pipeline (the operator board).
    pub fn active_orders() -> Self {
        Self {
            active: Some(true),
            states: Vec::new(),
        }
    }

    /// Active orders waiting for or out on home delivery (the driver board).
    pub fn dispatch_board() -> Self {
        Self {
            active: Some(true),
            states: vec![OrderState::ReadyForDispatch, OrderState::Dispatching],
        }
    }

    pub fn matches(&self, record: &TrackingRecord) -> bool {
        if let Some(active) = self.active {
            if record.active != active {
                return false;
            }
        }
        self.states.is_empty() || self.states.contains(&record.state)
    }
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Read-side contract over the externally-owned order collection. This core
/// never writes orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Order>>;

    /// Equality lookup on the human order number.
    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>>;

    /// Subscribe to the full change stream of the collection.
    fn subscribe(&self) -> broadcast::Receiver<OrderEvent>;
}

/// Contract over the tracking collection this core owns.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Insert a fresh record. Fails with `TrackingExists` on an id collision.
    async fn create(&self, record: TrackingRecord) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<TrackingRecord>>;

    /// Replace an existing record as one atomic write, so readers never see
    /// a current state without its matching latest history entry. Fails with
    /// `TrackingNotFound` if the record is gone.
    async fn put(&self, record: TrackingRecord) -> Result<()>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn query(&self, filter: &TrackingFilter) -> Result<Vec<TrackingRecord>>;

    fn subscribe(&self) -> broadcast::Receiver<TrackingEvent>;
}

// ---------------------------------------------------------------------------
// Live queries
// ---------------------------------------------------------------------------

/// Continuous query: yields the current result set for `filter` immediately,
/// then a fresh snapshot whenever the result set changes. The stream ends
/// when the store's event channel closes or the consumer is dropped.
pub fn watch(
    store: Arc<dyn TrackingStore>,
    filter: TrackingFilter,
) -> ReceiverStream<Vec<TrackingRecord>> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        // Subscribe before the initial query so no change can slip between.
        let mut events = store.subscribe();

        let mut last: Option<Vec<TrackingRecord>> = None;
        match store.query(&filter).await {
            Ok(snapshot) => {
                if tx.send(snapshot.clone()).await.is_err() {
                    return;
                }
                last = Some(snapshot);
            }
            Err(err) => tracing::warn!(%err, "live query: initial snapshot failed"),
        }

        loop {
            match events.recv().await {
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "live query lagged; resnapshotting");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            match store.query(&filter).await {
                Ok(snapshot) => {
                    if last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    if tx.send(snapshot.clone()).await.is_err() {
                        break;
                    }
                    last = Some(snapshot);
                }
                Err(err) => tracing::warn!(%err, "live query: snapshot failed"),
            }
        }
    });
    ReceiverStream::new(rx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
