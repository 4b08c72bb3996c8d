use uuid::Uuid;
use crate::models::{Seat, SeatStatus};

/// Seats per cabin row (columns A-F)
pub const SEATS_PER_ROW: u32 = 6;

const FIRST_COLUMN: u8 = b'A';

/// Label of the k-th seat (1-based) in generation order, e.g. 9 -> "2C"
pub fn seat_label(position: u32) -> String {
    let index = position.saturating_sub(1);
    let row = 1 + index / SEATS_PER_ROW;
    let column = (FIRST_COLUMN + (index % SEATS_PER_ROW) as u8) as char;
    format!("{}{}", row, column)
}

/// Split a label into (row, column). Returns None for anything the builder
/// could not have produced.
pub fn parse_seat_label(label: &str) -> Option<(u32, char)> {
    let column = label.chars().last()?;
    if !('A'..='F').contains(&column) {
        return None;
    }

    let digits = &label[..label.len() - 1];
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let row = digits.parse::<u32>().ok()?;
    Some((row, column))
}

/// Generate the seat map for a new flight.
///
/// Produces exactly `total_seats` seats, all AVAILABLE, laid out in rows of
/// six. The last row may be partial. Output depends only on the inputs.
pub fn build_seat_map(flight_id: Uuid, total_seats: u32) -> Vec<Seat> {
    (1..=total_seats)
        .map(|position| Seat {
            flight_id,
            label: seat_label(position),
            position,
            status: SeatStatus::Available,
        })
        .collect()
}
