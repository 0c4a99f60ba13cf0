use crate::notify::{self, Notifier};
use crate::store::{OrderStore, TrackingStore};
use chrono::{Duration, Utc};
use lavanda_core::config::TrackingConfig;
use lavanda_core::normalize;
use lavanda_core::order::Order;
use lavanda_core::state::OrderState;
use lavanda_core::tracking::TrackingRecord;
use lavanda_core::types::{
    Actor, DeliveryType, DispatchIncidentCategory, IncidentCategory, Shift, Worker,
};
use lavanda_core::{Result, TrackError};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// TrackingService
// ---------------------------------------------------------------------------

/// The operations front-ends call to move an order through the pipeline.
/// Every mutation is load → pure record mutation → one whole-record commit;
/// a failed operation leaves the store untouched.
pub struct TrackingService {
    orders: Arc<dyn OrderStore>,
    tracking: Arc<dyn TrackingStore>,
    notifier: Arc<dyn Notifier>,
    config: TrackingConfig,
}

impl TrackingService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        tracking: Arc<dyn TrackingStore>,
        notifier: Arc<dyn Notifier>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            orders,
            tracking,
            notifier,
            config,
        }
    }

    async fn load(&self, id: &str) -> Result<TrackingRecord> {
        self.tracking
            .get(id)
            .await?
            .ok_or_else(|| TrackError::TrackingNotFound(id.to_string()))
    }

    async fn order(&self, id: &str) -> Result<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| TrackError::OrderNotFound(id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Pipeline transitions
    // -----------------------------------------------------------------------

    /// Advance to the next pipeline state, attaching shift and workers when
    /// the target stage is staffed.
    pub async fn advance(
        &self,
        id: &str,
        actor: &Actor,
        shift: Option<Shift>,
        workers: &[Worker],
    ) -> Result<TrackingRecord> {
        let mut record = self.load(id).await?;
        // Only the packing branch consults the order record; every other
        // transition is fixed by the table.
        let delivery = if record.state.branches_on_delivery() {
            self.order(id).await?.delivery_type
        } else {
            DeliveryType::Pickup
        };
        let from = record.state;
        let next = record.advance(delivery, actor, shift, workers)?;
        self.tracking.put(record.clone()).await?;
        tracing::info!(id, from = %from, to = %next, actor = %actor.name, "order advanced");

        self.notify_transition(&record, from, next).await;
        Ok(record)
    }

    pub async fn reverse(&self, id: &str, actor: &Actor) -> Result<TrackingRecord> {
        let mut record = self.load(id).await?;
        let from = record.state;
        let prior = record.reverse(actor)?;
        self.tracking.put(record.clone()).await?;
        tracing::info!(id, from = %from, to = %prior, actor = %actor.name, "order reversed");
        Ok(record)
    }

    pub async fn activate_rework(&self, id: &str, actor: &Actor) -> Result<TrackingRecord> {
        let mut record = self.load(id).await?;
        record.activate_rework(actor);
        self.tracking.put(record.clone()).await?;
        tracing::info!(id, times = record.rework.times, actor = %actor.name, "rework activated");
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    pub async fn start_dispatch(
        &self,
        id: &str,
        driver: &Actor,
        vehicle: &str,
        plate: &str,
    ) -> Result<TrackingRecord> {
        let mut record = self.load(id).await?;
        record.start_dispatch(driver, vehicle, plate)?;
        self.tracking.put(record.clone()).await?;
        tracing::info!(id, driver = %driver.name, plate, "dispatch started");

        if self.config.notifications.enabled {
            let body =
                notify::dispatch_started(&record.order_number, &driver.name, vehicle, plate);
            self.send_to_customer(&record, body).await;
        }
        Ok(record)
    }

    pub async fn confirm_delivery(
        &self,
        id: &str,
        entered_code: &str,
        receiver: &str,
        driver: &Actor,
    ) -> Result<TrackingRecord> {
        let mut record = self.load(id).await?;
        let order = self.order(id).await?;
        record.confirm_delivery(&order, entered_code, receiver, driver)?;
        self.tracking.put(record.clone()).await?;
        tracing::info!(id, receiver, driver = %driver.name, "delivery confirmed");
        Ok(record)
    }

    pub async fn report_dispatch_incident(
        &self,
        id: &str,
        category: DispatchIncidentCategory,
        description: &str,
    ) -> Result<TrackingRecord> {
        let mut record = self.load(id).await?;
        record.report_dispatch_incident(category, description)?;
        self.tracking.put(record.clone()).await?;
        tracing::warn!(id, category = %category, "dispatch incident reported");
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Incidents
    // -----------------------------------------------------------------------

    /// Append a process incident; returns the generated incident id.
    pub async fn report_incident(
        &self,
        id: &str,
        actor: &Actor,
        category: IncidentCategory,
        description: &str,
    ) -> Result<String> {
        let mut record = self.load(id).await?;
        let incident_id = record.report_incident(actor, category, description);
        self.tracking.put(record).await?;
        tracing::warn!(id, incident = %incident_id, category = %category, "incident reported");
        Ok(incident_id)
    }

    /// Mark an incident resolved. Returns `false` when the id matched
    /// nothing, in which case the store is left untouched.
    pub async fn resolve_incident(&self, id: &str, incident_id: &str) -> Result<bool> {
        let mut record = self.load(id).await?;
        if !record.resolve_incident(incident_id) {
            return Ok(false);
        }
        self.tracking.put(record).await?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn tracking(&self, id: &str) -> Result<Option<TrackingRecord>> {
        self.tracking.get(id).await
    }

    /// Customer-facing lookup: order by its human number, joined with the
    /// paired tracking record. `None` when either half is missing.
    pub async fn order_with_tracking(
        &self,
        order_number: &str,
    ) -> Result<Option<(Order, TrackingRecord)>> {
        let Some(order) = self.orders.find_by_number(order_number).await? else {
            return Ok(None);
        };
        let Some(record) = self.tracking.get(&order.id).await? else {
            return Ok(None);
        };
        Ok(Some((order, record)))
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    async fn notify_transition(&self, record: &TrackingRecord, from: OrderState, to: OrderState) {
        if !self.config.notifications.enabled {
            return;
        }
        let body = match (from, to) {
            (OrderState::Pending, OrderState::Washing) => {
                notify::processing_started(&self.config, &record.order_number)
            }
            (_, OrderState::ReadyForPickup) => {
                let deadline = Utc::now()
                    + Duration::days(i64::from(self.config.notifications.pickup_window_days));
                notify::ready_for_pickup(&self.config, &record.order_number, deadline)
            }
            _ => return,
        };
        self.send_to_customer(record, body).await;
    }

    /// Resolve the customer's phone and fire the notification. Any failure
    /// here is logged and dropped; it never surfaces to the caller.
    async fn send_to_customer(&self, record: &TrackingRecord, body: String) {
        match self.orders.get(&record.id).await {
            Ok(Some(order)) => {
                self.notifier.send(&normalize::phone(&order.phone), &body);
            }
            Ok(None) => {
                tracing::warn!(id = %record.id, "notification skipped: order record missing");
            }
            Err(err) => {
                tracing::warn!(id = %record.id, %err, "notification skipped: order lookup failed");
            }
        }
    }
}
