use crate::types::DeliveryType;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// OrderState
// ---------------------------------------------------------------------------

/// Processing state of an order. Orders move through the fixed pipeline
/// intake → wash → dry → press → pack and then branch by delivery type;
/// rework is a side loop that re-enters the pipeline at washing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    Washing,
    Drying,
    Pressing,
    Rework,
    Packing,
    ReadyForPickup,
    ReadyForDispatch,
    Dispatching,
    Delivered,
}

impl OrderState {
    pub fn all() -> &'static [OrderState] {
        &[
            OrderState::Pending,
            OrderState::Washing,
            OrderState::Drying,
            OrderState::Pressing,
            OrderState::Rework,
            OrderState::Packing,
            OrderState::ReadyForPickup,
            OrderState::ReadyForDispatch,
            OrderState::Dispatching,
            OrderState::Delivered,
        ]
    }

    /// The next state in the pipeline, or `None` from the terminal state.
    ///
    /// Packing is the single transition that depends on external data: it
    /// branches on the order's delivery type, which lives on the order
    /// record, not on the tracking record.
    pub fn next(self, delivery: DeliveryType) -> Option<OrderState> {
        match self {
            OrderState::Pending => Some(OrderState::Washing),
            OrderState::Washing => Some(OrderState::Drying),
            OrderState::Drying => Some(OrderState::Pressing),
            OrderState::Pressing => Some(OrderState::Packing),
            // Rework always re-enters the main flow at washing.
            OrderState::Rework => Some(OrderState::Washing),
            OrderState::Packing => match delivery {
                DeliveryType::Pickup => Some(OrderState::ReadyForPickup),
                DeliveryType::Dispatch => Some(OrderState::ReadyForDispatch),
            },
            OrderState::ReadyForPickup => Some(OrderState::Delivered),
            OrderState::ReadyForDispatch => Some(OrderState::Dispatching),
            OrderState::Dispatching => Some(OrderState::Delivered),
            OrderState::Delivered => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == OrderState::Delivered
    }

    /// States that take a shift + worker assignment when entered.
    pub fn requires_staffing(self) -> bool {
        matches!(
            self,
            OrderState::Washing
                | OrderState::Drying
                | OrderState::Pressing
                | OrderState::Rework
                | OrderState::Packing
        )
    }

    /// True for the one state whose outgoing transition needs the order
    /// record's delivery type.
    pub fn branches_on_delivery(self) -> bool {
        self == OrderState::Packing
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Washing => "washing",
            OrderState::Drying => "drying",
            OrderState::Pressing => "pressing",
            OrderState::Rework => "rework",
            OrderState::Packing => "packing",
            OrderState::ReadyForPickup => "ready_for_pickup",
            OrderState::ReadyForDispatch => "ready_for_dispatch",
            OrderState::Dispatching => "dispatching",
            OrderState::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = crate::error::TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderState::Pending),
            "washing" => Ok(OrderState::Washing),
            "drying" => Ok(OrderState::Drying),
            "pressing" => Ok(OrderState::Pressing),
            "rework" => Ok(OrderState::Rework),
            "packing" => Ok(OrderState::Packing),
            "ready_for_pickup" => Ok(OrderState::ReadyForPickup),
            "ready_for_dispatch" => Ok(OrderState::ReadyForDispatch),
            "dispatching" => Ok(OrderState::Dispatching),
            "delivered" => Ok(OrderState::Delivered),
            _ => Err(crate::error::TrackError::InvalidStateName(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
