use crate::store::{OrderEvent, OrderStore, TrackingEvent, TrackingFilter, TrackingStore};
use async_trait::async_trait;
use lavanda_core::order::Order;
use lavanda_core::tracking::TrackingRecord;
use lavanda_core::{Result, TrackError};
use std::collections::BTreeMap;
use tokio::sync::{broadcast, RwLock};

// ---------------------------------------------------------------------------
// MemoryOrderStore
// ---------------------------------------------------------------------------

/// In-memory order collection. The mutators stand in for the external intake
/// system: tests and local front-ends drive the change stream through them.
pub struct MemoryOrderStore {
    inner: RwLock<BTreeMap<String, Order>>,
    tx: broadcast::Sender<OrderEvent>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(BTreeMap::new()),
            tx,
        }
    }

    pub async fn insert(&self, order: Order) {
        self.inner
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        let _ = self.tx.send(OrderEvent::Created(order));
    }

    pub async fn update(&self, order: Order) {
        self.inner
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        let _ = self.tx.send(OrderEvent::Updated(order));
    }

    pub async fn remove(&self, id: &str) {
        if self.inner.write().await.remove(id).is_some() {
            let _ = self.tx.send(OrderEvent::Removed(id.to_string()));
        }
    }
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get(&self, id: &str) -> Result<Option<Order>> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        Ok(self
            .inner
            .read()
            .await
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// MemoryTrackingStore
// ---------------------------------------------------------------------------

/// In-memory tracking collection: reference backend and test double. `put`
/// replaces the whole record under the write lock, which gives the atomic
/// state+history commit the service relies on.
pub struct MemoryTrackingStore {
    inner: RwLock<BTreeMap<String, TrackingRecord>>,
    tx: broadcast::Sender<TrackingEvent>,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(BTreeMap::new()),
            tx,
        }
    }
}

impl Default for MemoryTrackingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackingStore for MemoryTrackingStore {
    async fn create(&self, record: TrackingRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.contains_key(&record.id) {
            return Err(TrackError::TrackingExists(record.id));
        }
        inner.insert(record.id.clone(), record.clone());
        drop(inner);
        let _ = self.tx.send(TrackingEvent::Created(record));
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TrackingRecord>> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn put(&self, record: TrackingRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.contains_key(&record.id) {
            return Err(TrackError::TrackingNotFound(record.id));
        }
        inner.insert(record.id.clone(), record.clone());
        drop(inner);
        let _ = self.tx.send(TrackingEvent::Updated(record));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.inner.write().await.remove(id).is_some();
        if removed {
            let _ = self.tx.send(TrackingEvent::Removed(id.to_string()));
        }
        Ok(removed)
    }

    async fn query(&self, filter: &TrackingFilter) -> Result<Vec<TrackingRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
