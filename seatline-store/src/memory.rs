use async_trait::async_trait;
use seatline_core::{Flight, FlightFilter, FlightStore, StoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Process-local flight store.
///
/// Flights are cloned in and out, so callers only ever see committed
/// snapshots. Saves follow the same version rules as the Postgres store.
#[derive(Default)]
pub struct InMemoryFlightStore {
    flights: RwLock<HashMap<Uuid, Flight>>,
}

impl InMemoryFlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.flights.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flights.read().await.is_empty()
    }
}

#[async_trait]
impl FlightStore for InMemoryFlightStore {
    async fn load_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        Ok(self.flights.read().await.get(&id).cloned())
    }

    async fn save_flight(&self, mut flight: Flight) -> Result<Flight, StoreError> {
        let mut flights = self.flights.write().await;

        let stored_version = flights.get(&flight.id).map(|f| f.version);
        match (flight.version, stored_version) {
            (0, None) => {}
            (expected, Some(current)) if expected != 0 && expected == current => {}
            _ => return Err(StoreError::Conflict(flight.id)),
        }

        flight.version += 1;
        debug!("Stored flight {} at version {}", flight.id, flight.version);
        flights.insert(flight.id, flight.clone());
        Ok(flight)
    }

    async fn delete_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        Ok(self.flights.write().await.remove(&id))
    }

    async fn list_flights(&self, filter: FlightFilter) -> Result<Vec<Flight>, StoreError> {
        let flights = self.flights.read().await;
        let mut matching: Vec<Flight> = flights
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.departure_time.cmp(&b.departure_time).then(a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use seatline_core::NewFlight;

    fn flight(total_seats: u32) -> Flight {
        let departure_time = Utc::now() + Duration::days(7);
        Flight::new(
            Uuid::new_v4(),
            NewFlight {
                airline: "Altair Air".to_string(),
                origin: "SFO".to_string(),
                destination: "NRT".to_string(),
                departure_time,
                arrival_time: departure_time + Duration::hours(11),
                price_amount: 98000,
                price_currency: "USD".to_string(),
                total_seats,
            },
        )
    }

    #[tokio::test]
    async fn test_insert_then_update_bumps_version() {
        let store = InMemoryFlightStore::new();

        let saved = store.save_flight(flight(6)).await.unwrap();
        assert_eq!(saved.version, 1);

        let mut loaded = store.load_flight(saved.id).await.unwrap().unwrap();
        loaded.book_first_available();
        let saved = store.save_flight(loaded).await.unwrap();
        assert_eq!(saved.version, 2);
        assert_eq!(saved.available_seats, 5);
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let store = InMemoryFlightStore::new();
        let saved = store.save_flight(flight(6)).await.unwrap();

        let mut first = saved.clone();
        let mut second = saved.clone();
        first.book_first_available();
        second.book_first_available();

        store.save_flight(first).await.unwrap();
        let err = store.save_flight(second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == saved.id));

        let current = store.load_flight(saved.id).await.unwrap().unwrap();
        assert_eq!(current.available_seats, 5);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = InMemoryFlightStore::new();
        let new = flight(6);
        store.save_flight(new.clone()).await.unwrap();
        assert!(matches!(store.save_flight(new).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_filter_and_delete() {
        let store = InMemoryFlightStore::new();
        let open = store.save_flight(flight(6)).await.unwrap();
        let empty = store.save_flight(flight(0)).await.unwrap();

        assert_eq!(store.list_flights(FlightFilter::All).await.unwrap().len(), 2);
        let available = store.list_flights(FlightFilter::WithAvailableSeats).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, open.id);

        let deleted = store.delete_flight(empty.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, empty.id);
        assert!(store.delete_flight(empty.id).await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }
}
