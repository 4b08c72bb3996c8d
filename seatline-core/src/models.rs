use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::seatmap::build_seat_map;

/// Seat status in the booking lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Booked,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Booked => "BOOKED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AVAILABLE" => Some(SeatStatus::Available),
            "BOOKED" => Some(SeatStatus::Booked),
            _ => None,
        }
    }
}

/// A single seat. Belongs to exactly one flight, referenced by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub flight_id: Uuid,
    pub label: String,
    /// 1-based generation index; fixes seat-sequence order
    pub position: u32,
    pub status: SeatStatus,
}

impl Seat {
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}

/// Input for creating a flight. Availability is derived, never supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_amount: i32,
    #[serde(default = "default_currency")]
    pub price_currency: String,
    pub total_seats: u32,
}

/// Administrative changes to a flight's schedule and pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightUpdate {
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_amount: i32,
    #[serde(default = "default_currency")]
    pub price_currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// A flight and the seat map it owns.
///
/// `available_seats` is a cached count of AVAILABLE seats. Every seat
/// transition goes through this type and recomputes it from `seats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_amount: i32,
    pub price_currency: String,
    pub total_seats: u32,
    pub available_seats: u32,
    /// Optimistic concurrency version; 0 until first committed save
    pub version: u64,
    pub seats: Vec<Seat>,
}

impl Flight {
    pub fn new(id: Uuid, input: NewFlight) -> Self {
        let seats = build_seat_map(id, input.total_seats);
        Self {
            id,
            airline: input.airline,
            origin: input.origin,
            destination: input.destination,
            departure_time: input.departure_time,
            arrival_time: input.arrival_time,
            price_amount: input.price_amount,
            price_currency: input.price_currency,
            total_seats: input.total_seats,
            available_seats: input.total_seats,
            version: 0,
            seats,
        }
    }

    pub fn count_available(&self) -> u32 {
        self.seats.iter().filter(|s| s.is_available()).count() as u32
    }

    pub fn is_consistent(&self) -> bool {
        self.available_seats == self.count_available()
            && self.total_seats as usize == self.seats.len()
    }

    pub fn has_available_seat(&self) -> bool {
        self.seats.iter().any(Seat::is_available)
    }

    pub fn seat(&self, label: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.label == label)
    }

    /// AVAILABLE -> BOOKED on the first available seat in sequence order.
    /// Returns the booked label, or None when the flight is full.
    pub fn book_first_available(&mut self) -> Option<String> {
        let seat = self.seats.iter_mut().find(|s| s.is_available())?;
        seat.status = SeatStatus::Booked;
        let label = seat.label.clone();
        self.recount_available();
        Some(label)
    }

    /// BOOKED -> AVAILABLE. Returns false, leaving the flight untouched, if
    /// no BOOKED seat carries `label`.
    pub fn release_seat(&mut self, label: &str) -> bool {
        let Some(seat) = self
            .seats
            .iter_mut()
            .find(|s| s.label == label && s.status == SeatStatus::Booked)
        else {
            return false;
        };

        seat.status = SeatStatus::Available;
        self.recount_available();
        true
    }

    pub fn apply_update(&mut self, update: FlightUpdate) {
        self.airline = update.airline;
        self.origin = update.origin;
        self.destination = update.destination;
        self.departure_time = update.departure_time;
        self.arrival_time = update.arrival_time;
        self.price_amount = update.price_amount;
        self.price_currency = update.price_currency;
        self.recount_available();
    }

    /// Flight-level details, no seat
    pub fn details(&self) -> FlightDetails {
        self.details_with_seat(None)
    }

    /// Details describing one booked seat
    pub fn booking_details(&self, seat_label: &str) -> FlightDetails {
        self.details_with_seat(Some(seat_label.to_string()))
    }

    pub fn summary(&self) -> FlightSummary {
        FlightSummary {
            id: self.id,
            airline: self.airline.clone(),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            available_seats: self.available_seats,
            total_seats: self.total_seats,
            price_amount: self.price_amount,
            price_currency: self.price_currency.clone(),
        }
    }

    fn details_with_seat(&self, seat_label: Option<String>) -> FlightDetails {
        FlightDetails {
            airline: self.airline.clone(),
            seat_label,
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            amount_paid: self.price_amount,
            currency: self.price_currency.clone(),
        }
    }

    fn recount_available(&mut self) {
        self.available_seats = self.count_available();
    }
}

/// Read-model returned by booking and detail lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlightDetails {
    pub airline: String,
    pub seat_label: Option<String>,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub amount_paid: i32,
    pub currency: String,
}

/// Listing row for flight catalogues
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlightSummary {
    pub id: Uuid,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: u32,
    pub total_seats: u32,
    pub price_amount: i32,
    pub price_currency: String,
}
