use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Shift
// ---------------------------------------------------------------------------

/// One of the two staffing windows a transition can be worked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    A,
    B,
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::A => f.write_str("A"),
            Shift::B => f.write_str("B"),
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryType
// ---------------------------------------------------------------------------

/// How the customer gets the finished order back. Decides the branch taken
/// out of the packing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Pickup,
    Dispatch,
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeliveryType::Pickup => "pickup",
            DeliveryType::Dispatch => "dispatch",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ClientType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Individual,
    Hotel,
    Institution,
    Company,
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClientType::Individual => "individual",
            ClientType::Hotel => "hotel",
            ClientType::Institution => "institution",
            ClientType::Company => "company",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// DispatchState
// ---------------------------------------------------------------------------

/// Sub-state of the home-delivery workflow. Lives on the dispatch sub-record
/// and moves independently of the main order state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Pending,
    EnRoute,
    Delivered,
    Failed,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchState::Pending => "pending",
            DispatchState::EnRoute => "en_route",
            DispatchState::Delivered => "delivered",
            DispatchState::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// IncidentCategory / DispatchIncidentCategory
// ---------------------------------------------------------------------------

/// Category of a process incident reported by an operator on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    DamagedGarment,
    PersistentStain,
    MissingGarment,
    Other,
}

impl fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IncidentCategory::DamagedGarment => "damaged_garment",
            IncidentCategory::PersistentStain => "persistent_stain",
            IncidentCategory::MissingGarment => "missing_garment",
            IncidentCategory::Other => "other",
        };
        f.write_str(s)
    }
}

/// Category of a failed delivery attempt reported by a driver. A different
/// set of causes than floor incidents, so a different enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchIncidentCategory {
    CustomerAbsent,
    WrongAddress,
    VehicleFailure,
    Other,
}

impl fmt::Display for DispatchIncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchIncidentCategory::CustomerAbsent => "customer_absent",
            DispatchIncidentCategory::WrongAddress => "wrong_address",
            DispatchIncidentCategory::VehicleFailure => "vehicle_failure",
            DispatchIncidentCategory::Other => "other",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Actor / Worker
// ---------------------------------------------------------------------------

/// The authenticated user performing a mutation. Identity and role checks
/// happen in the front-end; this core records who acted, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Actor used for machine-generated history entries.
    pub fn system() -> Self {
        Self::new("system", "System")
    }
}

/// A worker assigned to a processing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub name: String,
}

impl Worker {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_display() {
        assert_eq!(Shift::A.to_string(), "A");
        assert_eq!(Shift::B.to_string(), "B");
    }

    #[test]
    fn delivery_type_serde_snake_case() {
        let json = serde_json::to_string(&DeliveryType::Dispatch).unwrap();
        assert_eq!(json, "\"dispatch\"");
        let parsed: DeliveryType = serde_json::from_str("\"pickup\"").unwrap();
        assert_eq!(parsed, DeliveryType::Pickup);
    }

    #[test]
    fn dispatch_state_display() {
        assert_eq!(DispatchState::EnRoute.to_string(), "en_route");
        assert_eq!(DispatchState::Failed.to_string(), "failed");
    }

    #[test]
    fn incident_categories_are_distinct_types() {
        // Both have an Other variant but serialize independently.
        let a = serde_json::to_string(&IncidentCategory::Other).unwrap();
        let b = serde_json::to_string(&DispatchIncidentCategory::VehicleFailure).unwrap();
        assert_eq!(a, "\"other\"");
        assert_eq!(b, "\"vehicle_failure\"");
    }

    #[test]
    fn system_actor() {
        let actor = Actor::system();
        assert_eq!(actor.id, "system");
        assert_eq!(actor.name, "System");
    }
}
