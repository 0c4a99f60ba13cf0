use crate::error::{Result, TrackError};
use crate::order::Order;
use crate::state::OrderState;
use crate::types::{
    Actor, DeliveryType, DispatchIncidentCategory, DispatchState, IncidentCategory, Shift, Worker,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// StateEvent
// ---------------------------------------------------------------------------

/// One entry of the append-only transition history. Insertion order is
/// chronological order; entries are never reordered or edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    pub state: OrderState,
    pub at: DateTime<Utc>,
    pub actor_id: String,
    pub actor_name: String,
    pub shift: Option<Shift>,
    pub comment: String,
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Shift and workers attached to a staffed stage. Written whole on each
/// advance into the stage; a later pass overwrites, never merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub shift: Shift,
    pub workers: Vec<Worker>,
}

// ---------------------------------------------------------------------------
// ReworkRecord
// ---------------------------------------------------------------------------

/// Quality-tracking counters for the re-stain-removal loop. The count and
/// timestamps survive across activations on the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReworkRecord {
    pub active: bool,
    pub times: u32,
    pub last_at: Option<DateTime<Utc>>,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
}

// ---------------------------------------------------------------------------
// DispatchRecord / DispatchIncident
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchIncident {
    pub category: DispatchIncidentCategory,
    pub description: String,
    pub at: DateTime<Utc>,
}

/// Sub-record of the home-delivery workflow. Exists exactly when the order's
/// delivery type is dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub state: DispatchState,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub vehicle: Option<String>,
    pub plate: Option<String>,
    pub departed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub code_verified: bool,
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident: Option<DispatchIncident>,
}

impl DispatchRecord {
    fn pending() -> Self {
        Self {
            state: DispatchState::Pending,
            driver_id: None,
            driver_name: None,
            vehicle: None,
            plate: None,
            departed_at: None,
            delivered_at: None,
            code_verified: false,
            receiver: None,
            incident: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Incident
// ---------------------------------------------------------------------------

/// A non-blocking exception note. Stamped with the main state the record was
/// in when reported; never gates a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub at: DateTime<Utc>,
    pub state: OrderState,
    pub actor_id: String,
    pub actor_name: String,
    pub category: IncidentCategory,
    pub description: String,
    pub resolved: bool,
}

// ---------------------------------------------------------------------------
// TrackingRecord
// ---------------------------------------------------------------------------

/// The mutable per-order record this core owns. Paired 1:1 with an order
/// record by shared id; created, updated and deleted by the synchronizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub id: String,
    /// Denormalized mirror of the order number, refreshed on order updates.
    pub order_number: String,
    pub state: OrderState,
    pub shift: Option<Shift>,
    /// Flips to false when the record reaches the terminal delivered state.
    pub active: bool,
    pub history: Vec<StateEvent>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assignments: BTreeMap<OrderState, Assignment>,
    #[serde(default)]
    pub rework: ReworkRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchRecord>,
    #[serde(default)]
    pub incidents: Vec<Incident>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackingRecord {
    /// Seed a fresh tracking record for a newly created order. History starts
    /// with a single system entry so it is never empty.
    pub fn for_order(order: &Order) -> Self {
        let now = Utc::now();
        let system = Actor::system();
        Self {
            id: order.id.clone(),
            order_number: order.order_number.clone(),
            state: OrderState::Pending,
            shift: None,
            active: true,
            history: vec![StateEvent {
                state: OrderState::Pending,
                at: now,
                actor_id: system.id,
                actor_name: system.name,
                shift: None,
                comment: "order created".to_string(),
            }],
            assignments: BTreeMap::new(),
            rework: ReworkRecord::default(),
            dispatch: order.is_dispatch().then(DispatchRecord::pending),
            incidents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn push_event(&mut self, state: OrderState, actor: &Actor, shift: Option<Shift>, comment: String) {
        let now = Utc::now();
        self.history.push(StateEvent {
            state,
            at: now,
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            shift,
            comment,
        });
        self.state = state;
        self.updated_at = now;
    }

    // -----------------------------------------------------------------------
    // Pipeline transitions
    // -----------------------------------------------------------------------

    /// Advance to the next pipeline state. `delivery` is only consulted for
    /// the packing branch; callers resolve it from the order record.
    ///
    /// Appends exactly one history entry. An assignment entry is written only
    /// when workers are supplied together with a shift and the target state
    /// is a staffed one; an empty worker set simply skips the assignment.
    pub fn advance(
        &mut self,
        delivery: DeliveryType,
        actor: &Actor,
        shift: Option<Shift>,
        workers: &[Worker],
    ) -> Result<OrderState> {
        let from = self.state;
        let next = from.next(delivery).ok_or(TrackError::NoNextState {
            from: from.to_string(),
        })?;

        self.push_event(
            next,
            actor,
            shift,
            format!("advanced from {from} to {next}"),
        );
        if shift.is_some() {
            self.shift = shift;
        }
        if let (Some(shift), false) = (shift, workers.is_empty()) {
            if next.requires_staffing() {
                self.assignments.insert(
                    next,
                    Assignment {
                        shift,
                        workers: workers.to_vec(),
                    },
                );
            }
        }
        if next.is_terminal() {
            self.active = false;
        }
        Ok(next)
    }

    /// Go back to the state immediately prior to the current one, as recorded
    /// by the history itself. The forward table is not invertible (washing is
    /// reached both from pending and from rework), so the second-to-last
    /// history entry is the only correct notion of "previous state".
    ///
    /// The reversal is recorded as a new forward history entry, never as a
    /// truncation.
    pub fn reverse(&mut self, actor: &Actor) -> Result<OrderState> {
        if self.history.len() < 2 {
            return Err(TrackError::NoPriorState);
        }
        let prior = self.history[self.history.len() - 2].state;
        let from = self.state;

        // Leaving rework by reversal deactivates it; the counter stays.
        if from == OrderState::Rework {
            self.rework.active = false;
        }

        let shift = self.shift;
        self.push_event(
            prior,
            actor,
            shift,
            format!("returned from {from} to {prior}"),
        );
        Ok(prior)
    }

    // -----------------------------------------------------------------------
    // Rework
    // -----------------------------------------------------------------------

    /// Send the order into the re-stain-removal loop. Counts activations and
    /// stamps the acting operator; the current shift is preserved.
    pub fn activate_rework(&mut self, actor: &Actor) {
        let shift = self.shift;
        self.push_event(OrderState::Rework, actor, shift, "rework started".to_string());
        let now = Utc::now();
        self.rework.active = true;
        self.rework.times += 1;
        self.rework.last_at = Some(now);
        self.rework.actor_id = Some(actor.id.clone());
        self.rework.actor_name = Some(actor.name.clone());
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn dispatch_mut(&mut self) -> Result<&mut DispatchRecord> {
        let actual = self.state;
        self.dispatch.as_mut().ok_or(TrackError::InvalidState {
            expected: "dispatch order".to_string(),
            actual: actual.to_string(),
        })
    }

    /// Hand the order to a driver: ready-for-dispatch → dispatching, dispatch
    /// sub-record to en-route.
    pub fn start_dispatch(
        &mut self,
        driver: &Actor,
        vehicle: impl Into<String>,
        plate: impl Into<String>,
    ) -> Result<()> {
        if self.state != OrderState::ReadyForDispatch {
            return Err(TrackError::InvalidState {
                expected: OrderState::ReadyForDispatch.to_string(),
                actual: self.state.to_string(),
            });
        }
        let now = Utc::now();
        {
            let dispatch = self.dispatch_mut()?;
            dispatch.state = DispatchState::EnRoute;
            dispatch.driver_id = Some(driver.id.clone());
            dispatch.driver_name = Some(driver.name.clone());
            dispatch.vehicle = Some(vehicle.into());
            dispatch.plate = Some(plate.into());
            dispatch.departed_at = Some(now);
        }
        self.push_event(
            OrderState::Dispatching,
            driver,
            None,
            "dispatch started".to_string(),
        );
        Ok(())
    }

    /// Verify the receiver's code and close out the delivery. The comparison
    /// is case-insensitive. A mismatch fails before any field is touched.
    pub fn confirm_delivery(
        &mut self,
        order: &Order,
        entered_code: &str,
        receiver: impl Into<String>,
        driver: &Actor,
    ) -> Result<()> {
        if self.state != OrderState::Dispatching {
            return Err(TrackError::InvalidState {
                expected: OrderState::Dispatching.to_string(),
                actual: self.state.to_string(),
            });
        }
        if !entered_code.eq_ignore_ascii_case(&order.dispatch_code) {
            return Err(TrackError::CodeMismatch);
        }
        let receiver = receiver.into();
        let now = Utc::now();
        {
            let dispatch = self.dispatch_mut()?;
            dispatch.state = DispatchState::Delivered;
            dispatch.code_verified = true;
            dispatch.receiver = Some(receiver.clone());
            dispatch.delivered_at = Some(now);
        }
        self.push_event(
            OrderState::Delivered,
            driver,
            None,
            format!("delivered to {receiver}"),
        );
        self.active = false;
        Ok(())
    }

    /// Record a failed delivery attempt on the dispatch sub-record. The main
    /// state stays where it is: dispatch outcome and pipeline progression are
    /// tracked independently, pending administrative follow-up.
    pub fn report_dispatch_incident(
        &mut self,
        category: DispatchIncidentCategory,
        description: impl Into<String>,
    ) -> Result<()> {
        let now = Utc::now();
        let dispatch = self.dispatch_mut()?;
        dispatch.state = DispatchState::Failed;
        dispatch.incident = Some(DispatchIncident {
            category,
            description: description.into(),
            at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Incidents
    // -----------------------------------------------------------------------

    /// Append a process incident stamped with the current main state. Returns
    /// the generated incident id. Never changes state and never blocks other
    /// operations; multiple open incidents may coexist.
    pub fn report_incident(
        &mut self,
        actor: &Actor,
        category: IncidentCategory,
        description: impl Into<String>,
    ) -> String {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        self.incidents.push(Incident {
            id: id.clone(),
            at: now,
            state: self.state,
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            category,
            description: description.into(),
            resolved: false,
        });
        self.updated_at = now;
        id
    }

    /// Flip `resolved` on the matching incident. Returns `false` (no-op) if
    /// the id matches nothing; an unknown id is a caller bug, not a fault.
    pub fn resolve_incident(&mut self, incident_id: &str) -> bool {
        match self.incidents.iter_mut().find(|i| i.id == incident_id) {
            Some(incident) => {
                incident.resolved = true;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Synchronizer hooks
    // -----------------------------------------------------------------------

    /// Refresh the denormalized order-number mirror after an order update.
    /// No state logic is replayed.
    pub fn refresh_from(&mut self, order: &Order) {
        self.order_number = order.order_number.clone();
        self.updated_at = Utc::now();
    }

    pub fn open_incidents(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.iter().filter(|i| !i.resolved)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
