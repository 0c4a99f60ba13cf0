pub mod memory;
pub mod notify;
pub mod service;
pub mod store;
pub mod sync;

pub use service::TrackingService;
pub use sync::{SyncHandle, Synchronizer};
