pub mod models;
pub mod seatmap;
pub mod repository;
pub mod settings;

pub use models::{Flight, FlightDetails, FlightSummary, FlightUpdate, NewFlight, Seat, SeatStatus};
pub use repository::{FlightFilter, FlightStore, StoreError};
pub use seatmap::{build_seat_map, parse_seat_label};
pub use settings::InventoryConfig;
