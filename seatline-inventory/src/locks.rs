use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type FlightMutex = Arc<AsyncMutex<()>>;

/// One async mutex per flight.
///
/// The registry map is only held while a flight's handle is fetched,
/// created or dropped, never across an await, so flights never wait on
/// each other. An entry lives only while someone holds or waits on it.
#[derive(Default)]
pub struct FlightLocks {
    locks: Mutex<HashMap<Uuid, FlightMutex>>,
}

/// Exclusive access to one flight. Dropping it releases the flight and
/// removes the registry entry if nobody else is holding or waiting.
pub struct FlightGuard<'a> {
    registry: &'a FlightLocks,
    flight_id: Uuid,
    handle: FlightMutex,
    guard: Option<OwnedMutexGuard<()>>,
}

impl FlightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, FlightMutex>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, flight_id: Uuid) -> FlightMutex {
        self.registry().entry(flight_id).or_default().clone()
    }

    /// Wait up to `timeout` for exclusive access to a flight.
    /// Returns None if the wait timed out.
    pub async fn acquire(&self, flight_id: Uuid, timeout: Duration) -> Option<FlightGuard<'_>> {
        let handle = self.handle(flight_id);
        match tokio::time::timeout(timeout, handle.clone().lock_owned()).await {
            Ok(guard) => Some(FlightGuard {
                registry: self,
                flight_id,
                handle,
                guard: Some(guard),
            }),
            Err(_) => {
                self.release(flight_id, handle);
                None
            }
        }
    }

    /// Drop our reference to `handle` and remove the entry if the registry
    /// holds the last one.
    fn release(&self, flight_id: Uuid, handle: FlightMutex) {
        let mut locks = self.registry();
        drop(handle);
        if let Some(entry) = locks.get(&flight_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(&flight_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so the handle is the only reference this guard owns
        drop(self.guard.take());
        let handle = std::mem::take(&mut self.handle);
        self.registry.release(self.flight_id, handle);
    }
}
