use async_trait::async_trait;
use uuid::Uuid;
use crate::models::Flight;

/// Which flights a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightFilter {
    #[default]
    All,
    WithAvailableSeats,
}

impl FlightFilter {
    pub fn matches(&self, flight: &Flight) -> bool {
        match self {
            FlightFilter::All => true,
            FlightFilter::WithAvailableSeats => flight.available_seats > 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Flight {0} was modified concurrently")]
    Conflict(Uuid),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt flight record: {0}")]
    Corrupt(String),
}

/// Persistence for flights and their seat maps.
///
/// A flight and its seats are loaded, saved and deleted as one unit.
#[async_trait]
pub trait FlightStore: Send + Sync {
    /// Consistent snapshot of one flight, seats in position order.
    async fn load_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError>;

    /// Insert when `flight.version == 0`, otherwise replace the stored record
    /// only if its version still equals `flight.version`. Returns the
    /// committed flight carrying its new version.
    async fn save_flight(&self, flight: Flight) -> Result<Flight, StoreError>;

    /// Remove a flight together with its seats.
    async fn delete_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError>;

    async fn list_flights(&self, filter: FlightFilter) -> Result<Vec<Flight>, StoreError>;
}
