//! Seat-map layout, reservation validation, and seat-state application.
//!
//! Everything in this module is pure: it reads and transforms in-memory seat
//! state only. Persisting the result atomically is the job of
//! [`crate::inventory`].

use std::collections::HashSet;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

pub const SEATS_PER_ROW: usize = 6;

/// Largest seat map the `A1`..`Z6` labeling scheme can express.
pub const MAX_TOTAL_SEATS: i32 = 26 * SEATS_PER_ROW as i32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub seat_number: String,
    pub is_booked: bool,
}

/// Ordered seat records for one trip, stored as a JSONB column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct SeatMap(pub Vec<Seat>);

/// Seat numbers recorded on a booking, stored as a JSONB column. Cancellation
/// and refund release exactly this list, never a re-derived one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct SelectedSeats(pub Vec<String>);

/// Why a seat selection was rejected, with the offending seats attached.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SeatSelectionError {
    #[error("trip is not available for booking")]
    TripNotBookable,

    #[error("not enough seats available: requested {requested}, available {available}")]
    InsufficientSeats { requested: usize, available: i32 },

    #[error("invalid seat numbers: {}", .0.join(", "))]
    InvalidSeatNumbers(Vec<String>),

    #[error("seats already booked: {}", .0.join(", "))]
    SeatsAlreadyBooked(Vec<String>),

    #[error("duplicate seat selection: {}", .0.join(", "))]
    DuplicateSeatSelection(Vec<String>),
}

impl From<SeatSelectionError> for AppError {
    fn from(err: SeatSelectionError) -> Self {
        match err {
            SeatSelectionError::TripNotBookable => AppError::Validation(err.to_string()),
            SeatSelectionError::InsufficientSeats {
                requested,
                available,
            } => AppError::InsufficientSeats {
                requested,
                available,
            },
            SeatSelectionError::InvalidSeatNumbers(_) => AppError::Validation(err.to_string()),
            SeatSelectionError::SeatsAlreadyBooked(_) => AppError::Conflict(err.to_string()),
            SeatSelectionError::DuplicateSeatSelection(_) => AppError::Conflict(err.to_string()),
        }
    }
}

/// Lay out `total_seats` seats in rows of [`SEATS_PER_ROW`], labeled
/// `A1`..`A6`, `B1`.. and so on, all unbooked. Deterministic for a given
/// seat count.
pub fn generate_seat_map(total_seats: i32) -> SeatMap {
    let total = total_seats.max(0) as usize;
    let mut seats = Vec::with_capacity(total);

    'rows: for row in 0.. {
        let row_letter = (b'A' + row as u8) as char;
        for column in 1..=SEATS_PER_ROW {
            if seats.len() == total {
                break 'rows;
            }
            seats.push(Seat {
                seat_number: format!("{}{}", row_letter, column),
                is_booked: false,
            });
        }
    }

    SeatMap(seats)
}

impl SeatMap {
    pub fn available_count(&self) -> i32 {
        self.0.iter().filter(|s| !s.is_booked).count() as i32
    }

    pub fn contains(&self, seat_number: &str) -> bool {
        self.0.iter().any(|s| s.seat_number == seat_number)
    }

    pub fn is_booked(&self, seat_number: &str) -> bool {
        self.0
            .iter()
            .any(|s| s.seat_number == seat_number && s.is_booked)
    }

    /// Mark every listed seat booked. Callers must have validated the
    /// selection first; unknown seat numbers are ignored here.
    pub fn mark_booked(&mut self, seat_numbers: &[String]) {
        for seat in &mut self.0 {
            if seat_numbers.contains(&seat.seat_number) {
                seat.is_booked = true;
            }
        }
    }

    /// Inverse of [`SeatMap::mark_booked`]. Safe to apply to an already
    /// released seat: the available counter is always recomputed from the
    /// map, never incremented independently.
    pub fn release(&mut self, seat_numbers: &[String]) {
        for seat in &mut self.0 {
            if seat_numbers.contains(&seat.seat_number) {
                seat.is_booked = false;
            }
        }
    }
}

/// Decide whether `requested` can be reserved on a trip in the given state.
///
/// Checks run in a fixed order and the first failure wins: bookable status,
/// seat count, seat existence, seat occupancy, duplicates within the request.
pub fn validate_selection(
    bookable: bool,
    available_seats: i32,
    seat_map: &SeatMap,
    requested: &[String],
) -> Result<(), SeatSelectionError> {
    if !bookable {
        return Err(SeatSelectionError::TripNotBookable);
    }

    if available_seats < requested.len() as i32 {
        return Err(SeatSelectionError::InsufficientSeats {
            requested: requested.len(),
            available: available_seats,
        });
    }

    let unknown: Vec<String> = requested
        .iter()
        .filter(|s| !seat_map.contains(s))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(SeatSelectionError::InvalidSeatNumbers(unknown));
    }

    let taken: Vec<String> = requested
        .iter()
        .filter(|s| seat_map.is_booked(s))
        .cloned()
        .collect();
    if !taken.is_empty() {
        return Err(SeatSelectionError::SeatsAlreadyBooked(taken));
    }

    let mut seen = HashSet::new();
    let duplicates: Vec<String> = requested
        .iter()
        .filter(|s| !seen.insert(s.as_str()))
        .cloned()
        .collect();
    if !duplicates.is_empty() {
        return Err(SeatSelectionError::DuplicateSeatSelection(duplicates));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(nums: &[&str]) -> Vec<String> {
        nums.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generate_layout_rows_of_six() {
        let map = generate_seat_map(8);
        let numbers: Vec<&str> = map.0.iter().map(|s| s.seat_number.as_str()).collect();
        assert_eq!(numbers, ["A1", "A2", "A3", "A4", "A5", "A6", "B1", "B2"]);
        assert!(map.0.iter().all(|s| !s.is_booked));
        assert_eq!(map.available_count(), 8);
    }

    #[test]
    fn test_generate_exact_row_boundary() {
        let map = generate_seat_map(6);
        assert_eq!(map.0.len(), 6);
        assert_eq!(map.0.last().unwrap().seat_number, "A6");

        let map = generate_seat_map(12);
        assert_eq!(map.0.last().unwrap().seat_number, "B6");
    }

    #[test]
    fn test_mark_and_release_round_trip() {
        let mut map = generate_seat_map(4);
        let picked = seats(&["A1", "A3"]);

        map.mark_booked(&picked);
        assert!(map.is_booked("A1"));
        assert!(map.is_booked("A3"));
        assert!(!map.is_booked("A2"));
        assert_eq!(map.available_count(), 2);

        map.release(&picked);
        assert_eq!(map.available_count(), 4);
        assert_eq!(map, generate_seat_map(4));
    }

    #[test]
    fn test_double_release_does_not_drift_counter() {
        let mut map = generate_seat_map(4);
        let picked = seats(&["A2"]);
        map.mark_booked(&picked);
        map.release(&picked);
        map.release(&picked);
        // Derived counter cannot exceed the seat count.
        assert_eq!(map.available_count(), 4);
    }

    #[test]
    fn test_validate_rejects_unbookable_trip_first() {
        let map = generate_seat_map(4);
        // Even a nonsense request reports the trip status first.
        let err = validate_selection(false, 4, &map, &seats(&["Z99", "Z99"])).unwrap_err();
        assert_eq!(err, SeatSelectionError::TripNotBookable);
    }

    #[test]
    fn test_validate_insufficient_seats() {
        let mut map = generate_seat_map(4);
        map.mark_booked(&seats(&["A1", "A2", "A3"]));
        let err =
            validate_selection(true, map.available_count(), &map, &seats(&["A4", "A1"]))
                .unwrap_err();
        assert_eq!(
            err,
            SeatSelectionError::InsufficientSeats {
                requested: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_validate_unknown_seat_numbers() {
        let map = generate_seat_map(4);
        let err = validate_selection(true, 4, &map, &seats(&["A1", "Z99"])).unwrap_err();
        assert_eq!(
            err,
            SeatSelectionError::InvalidSeatNumbers(seats(&["Z99"]))
        );
    }

    #[test]
    fn test_validate_already_booked() {
        let mut map = generate_seat_map(4);
        map.mark_booked(&seats(&["A2"]));
        let err = validate_selection(true, 3, &map, &seats(&["A1", "A2"])).unwrap_err();
        assert_eq!(err, SeatSelectionError::SeatsAlreadyBooked(seats(&["A2"])));
    }

    #[test]
    fn test_validate_duplicate_selection() {
        let map = generate_seat_map(4);
        let err = validate_selection(true, 4, &map, &seats(&["A1", "A1"])).unwrap_err();
        assert_eq!(
            err,
            SeatSelectionError::DuplicateSeatSelection(seats(&["A1"]))
        );
    }

    #[test]
    fn test_stale_snapshot_loses_to_committed_booking() {
        // Two requests validated against the same snapshot both pass; after
        // one commits, re-validation against the fresh map rejects the other
        // with the exact intersecting seats.
        let mut map = generate_seat_map(4);
        let first = seats(&["A1", "A2"]);
        let second = seats(&["A2", "A3"]);

        assert!(validate_selection(true, 4, &map, &first).is_ok());
        assert!(validate_selection(true, 4, &map, &second).is_ok());

        map.mark_booked(&first);

        let err = validate_selection(true, map.available_count(), &map, &second).unwrap_err();
        assert_eq!(err, SeatSelectionError::SeatsAlreadyBooked(seats(&["A2"])));
    }
}
