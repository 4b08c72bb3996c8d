pub mod locks;
pub mod manager;

pub use locks::{FlightGuard, FlightLocks};
pub use manager::{InventoryError, InventoryManager};
