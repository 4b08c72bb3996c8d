use std::future::Future;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use seatline_core::{
    parse_seat_label, Flight, FlightDetails, FlightFilter, FlightStore, FlightSummary, FlightUpdate,
    InventoryConfig, NewFlight, StoreError,
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::locks::{FlightGuard, FlightLocks};

/// Seat inventory for all flights in a store.
///
/// Book, cancel, update and delete hold the flight's lock for the whole
/// load -> transition -> save span. Reads work on store snapshots without
/// locking. The availability counter is recomputed from the seat map on
/// every transition, never taken from input.
pub struct InventoryManager {
    store: Arc<dyn FlightStore>,
    locks: FlightLocks,
    config: InventoryConfig,
}

impl InventoryManager {
    pub fn new(store: Arc<dyn FlightStore>, config: InventoryConfig) -> Self {
        Self {
            store,
            locks: FlightLocks::new(),
            config,
        }
    }

    /// Create a flight with a fresh seat map, every seat AVAILABLE
    pub async fn add_flight(&self, input: NewFlight) -> Result<Flight, InventoryError> {
        info!("Adding new flight: {} {} -> {}", input.airline, input.origin, input.destination);
        validate_schedule(
            &input.airline,
            &input.origin,
            &input.destination,
            input.departure_time,
            input.arrival_time,
            input.price_amount,
        )?;

        let flight = Flight::new(Uuid::new_v4(), input);
        let saved = self.with_store_timeout("save flight", self.store.save_flight(flight)).await?;

        info!("Flight created with ID: {} ({} seats)", saved.id, saved.total_seats);
        Ok(saved)
    }

    /// Replace schedule and pricing. The seat map is untouched.
    ///
    /// An unknown flight is reported before the input is validated.
    pub async fn update_flight(&self, flight_id: Uuid, update: FlightUpdate) -> Result<Flight, InventoryError> {
        info!("Updating flight with ID: {}", flight_id);

        let (saved, ()) = self
            .mutate(flight_id, |flight| {
                validate_schedule(
                    &update.airline,
                    &update.origin,
                    &update.destination,
                    update.departure_time,
                    update.arrival_time,
                    update.price_amount,
                )?;
                flight.apply_update(update.clone());
                Ok(())
            })
            .await?;

        Ok(saved)
    }

    /// Delete a flight and its seats, returning the removed record
    pub async fn delete_flight(&self, flight_id: Uuid) -> Result<Flight, InventoryError> {
        info!("Deleting flight with ID: {}", flight_id);
        let _guard = self.lock_flight(flight_id).await?;

        let deleted = self
            .with_store_timeout("delete flight", self.store.delete_flight(flight_id))
            .await?
            .ok_or_else(|| {
                warn!("Flight not found with ID: {}", flight_id);
                InventoryError::FlightNotFound(flight_id)
            })?;

        Ok(deleted)
    }

    /// Full record including the seat map
    pub async fn get_flight(&self, flight_id: Uuid) -> Result<Flight, InventoryError> {
        self.load(flight_id).await
    }

    pub async fn list_flights(&self, filter: FlightFilter) -> Result<Vec<FlightSummary>, InventoryError> {
        debug!("Listing flights ({:?})", filter);
        let flights = self
            .with_store_timeout("list flights", self.store.list_flights(filter))
            .await?;
        Ok(flights.iter().map(Flight::summary).collect())
    }

    /// True iff the flight exists and has at least one AVAILABLE seat
    pub async fn check_availability(&self, flight_id: Uuid) -> Result<bool, InventoryError> {
        debug!("Checking seat availability for flight ID: {}", flight_id);
        let flight = self
            .with_store_timeout("load flight", self.store.load_flight(flight_id))
            .await?;
        Ok(flight.is_some_and(|f| f.has_available_seat()))
    }

    /// Book the first AVAILABLE seat in seat-map order
    pub async fn book_seat(&self, flight_id: Uuid) -> Result<FlightDetails, InventoryError> {
        info!("Booking a seat on flight ID: {}", flight_id);

        let (flight, label) = self
            .mutate(flight_id, |flight| {
                flight.book_first_available().ok_or_else(|| {
                    warn!("No available seats in flight ID: {}", flight_id);
                    InventoryError::NoSeatsAvailable(flight_id)
                })
            })
            .await?;

        info!("Seat {} booked on flight {} ({} left)", label, flight_id, flight.available_seats);
        Ok(flight.booking_details(&label))
    }

    /// Return a BOOKED seat to AVAILABLE
    pub async fn cancel_seat(&self, flight_id: Uuid, seat_label: &str) -> Result<(), InventoryError> {
        info!("Cancelling seat {} on flight ID: {}", seat_label, flight_id);

        let (flight, ()) = self
            .mutate(flight_id, |flight| {
                if flight.release_seat(seat_label) {
                    Ok(())
                } else if parse_seat_label(seat_label).is_none() {
                    warn!("Malformed seat label {:?} for flight ID: {}", seat_label, flight_id);
                    Err(InventoryError::SeatNotCancellable {
                        flight_id,
                        seat_label: seat_label.to_string(),
                    })
                } else {
                    warn!("Seat {} not found or already available on flight ID: {}", seat_label, flight_id);
                    Err(InventoryError::SeatNotCancellable {
                        flight_id,
                        seat_label: seat_label.to_string(),
                    })
                }
            })
            .await?;

        info!("Seat {} cancelled on flight {} ({} available)", seat_label, flight_id, flight.available_seats);
        Ok(())
    }

    /// Route, schedule and price without a seat
    pub async fn get_flight_details(&self, flight_id: Uuid) -> Result<FlightDetails, InventoryError> {
        debug!("Fetching flight details for ID: {}", flight_id);
        Ok(self.load(flight_id).await?.details())
    }

    /// Load -> apply -> save under the flight's lock.
    ///
    /// `apply` runs against a private copy; an Err from it, or from the
    /// store, leaves the stored flight as it was. A version conflict (another
    /// writer outside this process) reloads and re-applies.
    async fn mutate<T, F>(&self, flight_id: Uuid, mut apply: F) -> Result<(Flight, T), InventoryError>
    where
        F: FnMut(&mut Flight) -> Result<T, InventoryError>,
    {
        let _guard = self.lock_flight(flight_id).await?;
        let mut conflicts = 0;

        loop {
            let mut flight = self.load(flight_id).await?;
            if !flight.is_consistent() {
                warn!(
                    "Flight {} loaded with counter {} but {} available seats",
                    flight_id,
                    flight.available_seats,
                    flight.count_available()
                );
            }

            let outcome = apply(&mut flight)?;

            match self.with_store_timeout("save flight", self.store.save_flight(flight)).await {
                Ok(saved) => return Ok((saved, outcome)),
                Err(InventoryError::Store(StoreError::Conflict(_))) if conflicts < self.config.max_conflict_retries => {
                    conflicts += 1;
                    debug!("Version conflict on flight {}, retry {}", flight_id, conflicts);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn load(&self, flight_id: Uuid) -> Result<Flight, InventoryError> {
        self.with_store_timeout("load flight", self.store.load_flight(flight_id))
            .await?
            .ok_or_else(|| {
                warn!("Flight not found with ID: {}", flight_id);
                InventoryError::FlightNotFound(flight_id)
            })
    }

    async fn lock_flight(&self, flight_id: Uuid) -> Result<FlightGuard<'_>, InventoryError> {
        self.locks
            .acquire(flight_id, self.config.lock_timeout())
            .await
            .ok_or_else(|| {
                warn!("Timed out waiting for lock on flight {}", flight_id);
                InventoryError::Timeout { operation: "flight lock" }
            })
    }

    async fn with_store_timeout<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T, InventoryError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout(), fut).await {
            Ok(result) => result.map_err(InventoryError::from),
            Err(_) => {
                warn!("Store call timed out: {}", operation);
                Err(InventoryError::Timeout { operation })
            }
        }
    }
}

fn validate_schedule(
    airline: &str,
    origin: &str,
    destination: &str,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    price_amount: i32,
) -> Result<(), InventoryError> {
    if airline.trim().is_empty() {
        return Err(InventoryError::InvalidFlight("airline is required".to_string()));
    }
    if origin.trim().is_empty() || destination.trim().is_empty() {
        return Err(InventoryError::InvalidFlight("origin and destination are required".to_string()));
    }
    if origin.trim().eq_ignore_ascii_case(destination.trim()) {
        return Err(InventoryError::InvalidFlight(format!("origin and destination are both {}", origin)));
    }
    if arrival_time <= departure_time {
        return Err(InventoryError::InvalidFlight("arrival must be after departure".to_string()));
    }
    if price_amount < 0 {
        return Err(InventoryError::InvalidFlight(format!("negative price: {}", price_amount)));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Flight not found: {0}")]
    FlightNotFound(Uuid),

    #[error("No available seats on flight {0}")]
    NoSeatsAvailable(Uuid),

    #[error("Seat {seat_label} on flight {flight_id} not found or already available")]
    SeatNotCancellable {
        flight_id: Uuid,
        seat_label: String,
    },

    #[error("Invalid flight: {0}")]
    InvalidFlight(String),

    #[error("Timed out waiting for {operation}")]
    Timeout {
        operation: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl InventoryError {
    /// Worth retrying: the request itself was fine but the store was not.
    /// A timed-out `book_seat` may still have committed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InventoryError::Timeout { .. }
                | InventoryError::Store(StoreError::Unavailable(_))
                | InventoryError::Store(StoreError::Conflict(_))
        )
    }
}
