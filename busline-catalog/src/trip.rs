use busline_core::{Actor, RatingScale};
use busline_shared::RatingAddedEvent;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::inventory::{InventoryError, SeatInventory};

/// Input for scheduling a new trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrip {
    pub price_cents: i32,
    pub departure: String,
    pub departure_date: NaiveDate,
    pub arrival: String,
    pub arrival_date: NaiveDate,
    pub total_seats: u32,
}

/// Partial update for a trip. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripPatch {
    pub price_cents: Option<i32>,
    pub departure: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub arrival: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub total_seats: Option<u32>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    pub fn changed_fields(&self) -> Vec<String> {
        [
            ("price_cents", self.price_cents.is_some()),
            ("departure", self.departure.is_some()),
            ("departure_date", self.departure_date.is_some()),
            ("arrival", self.arrival.is_some()),
            ("arrival_date", self.arrival_date.is_some()),
            ("total_seats", self.total_seats.is_some()),
        ]
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// A scheduled journey: seat inventory, ratings, and the tickets issued for it.
///
/// Fields are read through accessors; schedule changes go through
/// [`Trip::apply_patch`] so the id stays fixed and every edit is validated.
#[derive(Debug, Clone, Serialize)]
pub struct Trip {
    id: Uuid,
    price_cents: i32,
    departure: String,
    departure_date: NaiveDate,
    arrival: String,
    arrival_date: NaiveDate,
    inventory: SeatInventory,
    ratings: Vec<f64>,
    issued_tickets: BTreeSet<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(new_trip: NewTrip) -> Result<Self, TripError> {
        validate_schedule(
            new_trip.price_cents,
            &new_trip.departure,
            new_trip.departure_date,
            &new_trip.arrival,
            new_trip.arrival_date,
        )?;
        if new_trip.total_seats == 0 {
            return Err(TripError::InvalidTrip(
                "total seats must be at least 1".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            price_cents: new_trip.price_cents,
            departure: new_trip.departure,
            departure_date: new_trip.departure_date,
            arrival: new_trip.arrival,
            arrival_date: new_trip.arrival_date,
            inventory: SeatInventory::new(new_trip.total_seats),
            ratings: Vec::new(),
            issued_tickets: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn price_cents(&self) -> i32 {
        self.price_cents
    }

    pub fn departure(&self) -> &str {
        &self.departure
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_date
    }

    pub fn arrival(&self) -> &str {
        &self.arrival
    }

    pub fn arrival_date(&self) -> NaiveDate {
        self.arrival_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn inventory(&self) -> &SeatInventory {
        &self.inventory
    }

    pub fn total_seats(&self) -> u32 {
        self.inventory.total_seats()
    }

    pub fn sold_seats(&self) -> u32 {
        self.inventory.sold_seats()
    }

    pub fn available_seats(&self) -> u32 {
        self.inventory.available_seats()
    }

    /// Price of `seats` seats at the current fare, or `None` on overflow.
    pub fn quote(&self, seats: u32) -> Option<i32> {
        i32::try_from(seats)
            .ok()
            .and_then(|seats| self.price_cents.checked_mul(seats))
    }

    pub fn sell_seats(&mut self, amount: u32) -> Result<(), InventoryError> {
        self.inventory.sell_seats(amount)?;
        self.touch();
        Ok(())
    }

    /// Record a newly issued ticket and hold its seats.
    pub fn issue_ticket(&mut self, ticket_id: Uuid, seats: u32) -> Result<(), InventoryError> {
        self.inventory.hold(seats)?;
        self.issued_tickets.insert(ticket_id);
        self.touch();
        Ok(())
    }

    pub fn has_issued(&self, ticket_id: &Uuid) -> bool {
        self.issued_tickets.contains(ticket_id)
    }

    pub fn issued_tickets(&self) -> impl Iterator<Item = &Uuid> {
        self.issued_tickets.iter()
    }

    pub fn commit_seats(&mut self, amount: u32) -> Result<(), InventoryError> {
        self.inventory.commit(amount)?;
        self.touch();
        Ok(())
    }

    pub fn reopen_seats(&mut self, amount: u32) -> Result<(), InventoryError> {
        self.inventory.reopen(amount)?;
        self.touch();
        Ok(())
    }

    /// Record a score. Scores outside `scale` are rejected.
    pub fn add_rating(
        &mut self,
        scorer: &Actor,
        score: f64,
        scale: &RatingScale,
    ) -> Result<RatingAddedEvent, TripError> {
        if !scale.contains(score) {
            return Err(TripError::InvalidRating {
                score,
                min: scale.min,
                max: scale.max,
            });
        }

        self.ratings.push(score);
        tracing::info!(trip = %self.id, scorer = %scorer.id, score, "Rating added");

        Ok(RatingAddedEvent {
            trip_id: self.id,
            scorer_id: scorer.id,
            score,
            timestamp: Utc::now().timestamp(),
        })
    }

    pub fn ratings(&self) -> &[f64] {
        &self.ratings
    }

    pub fn average_rating(&self) -> Result<f64, TripError> {
        if self.ratings.is_empty() {
            return Err(TripError::NoRatings(self.id));
        }
        Ok(self.ratings.iter().sum::<f64>() / self.ratings.len() as f64)
    }

    /// Apply a partial update. Nothing changes unless the whole patch is valid.
    pub fn apply_patch(&mut self, patch: TripPatch) -> Result<Vec<String>, TripError> {
        let changed = patch.changed_fields();

        let price_cents = patch.price_cents.unwrap_or(self.price_cents);
        let departure = patch.departure.unwrap_or_else(|| self.departure.clone());
        let departure_date = patch.departure_date.unwrap_or(self.departure_date);
        let arrival = patch.arrival.unwrap_or_else(|| self.arrival.clone());
        let arrival_date = patch.arrival_date.unwrap_or(self.arrival_date);
        validate_schedule(price_cents, &departure, departure_date, &arrival, arrival_date)?;

        let mut inventory = self.inventory;
        if let Some(total_seats) = patch.total_seats {
            if total_seats == 0 {
                return Err(TripError::InvalidTrip(
                    "total seats must be at least 1".to_string(),
                ));
            }
            inventory.resize(total_seats)?;
        }

        self.price_cents = price_cents;
        self.departure = departure;
        self.departure_date = departure_date;
        self.arrival = arrival;
        self.arrival_date = arrival_date;
        self.inventory = inventory;
        self.touch();

        Ok(changed)
    }

    pub fn summary(&self) -> TripSummary {
        TripSummary {
            id: self.id,
            departure: self.departure.clone(),
            departure_date: self.departure_date,
            arrival: self.arrival.clone(),
            arrival_date: self.arrival_date,
            price_cents: self.price_cents,
            available_seats: self.available_seats(),
            total_seats: self.total_seats(),
            average_rating: self.average_rating().ok(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_schedule(
    price_cents: i32,
    departure: &str,
    departure_date: NaiveDate,
    arrival: &str,
    arrival_date: NaiveDate,
) -> Result<(), TripError> {
    if price_cents < 0 {
        return Err(TripError::InvalidTrip(format!(
            "price must not be negative, got {price_cents}"
        )));
    }
    if departure.trim().is_empty() || arrival.trim().is_empty() {
        return Err(TripError::InvalidTrip(
            "departure and arrival must be named".to_string(),
        ));
    }
    if arrival_date < departure_date {
        return Err(TripError::InvalidTrip(format!(
            "arrival {arrival_date} is before departure {departure_date}"
        )));
    }
    Ok(())
}

/// Listing row for a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub id: Uuid,
    pub departure: String,
    pub departure_date: NaiveDate,
    pub arrival: String,
    pub arrival_date: NaiveDate,
    pub price_cents: i32,
    pub available_seats: u32,
    pub total_seats: u32,
    pub average_rating: Option<f64>,
}

impl fmt::Display for TripSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) -> {} ({}) | {}.{:02} | {}/{} seats",
            self.departure,
            self.departure_date,
            self.arrival,
            self.arrival_date,
            self.price_cents / 100,
            self.price_cents % 100,
            self.available_seats,
            self.total_seats,
        )?;
        match self.average_rating {
            Some(rating) => write!(f, " | rating {rating:.2}"),
            None => write!(f, " | unrated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TripError {
    #[error("Invalid trip: {0}")]
    InvalidTrip(String),

    #[error("Rating {score} is outside {min}..={max}")]
    InvalidRating { score: f64, min: f64, max: f64 },

    #[error("Trip {0} has no ratings")]
    NoRatings(Uuid),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::Role;

    fn kyiv_poltava() -> NewTrip {
        NewTrip {
            price_cents: 14880,
            departure: "Kyiv".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 6, 7).unwrap(),
            arrival: "Poltava".to_string(),
            arrival_date: NaiveDate::from_ymd_opt(2026, 6, 8).unwrap(),
            total_seats: 15,
        }
    }

    #[test]
    fn test_new_trip_validation() {
        let trip = Trip::new(kyiv_poltava()).unwrap();
        assert_eq!(trip.available_seats(), 15);
        assert_eq!(trip.sold_seats(), 0);
        assert_eq!(trip.quote(2), Some(29760));
        assert_eq!(trip.quote(u32::MAX), None);

        let mut negative = kyiv_poltava();
        negative.price_cents = -1;
        assert!(matches!(Trip::new(negative), Err(TripError::InvalidTrip(_))));

        let mut empty = kyiv_poltava();
        empty.total_seats = 0;
        assert!(matches!(Trip::new(empty), Err(TripError::InvalidTrip(_))));

        let mut backwards = kyiv_poltava();
        backwards.arrival_date = NaiveDate::from_ymd_opt(2026, 6, 6).unwrap();
        assert!(matches!(Trip::new(backwards), Err(TripError::InvalidTrip(_))));
    }

    #[test]
    fn test_sell_seats_on_trip() {
        let mut trip = Trip::new(kyiv_poltava()).unwrap();
        let before = trip.updated_at();

        assert_eq!(
            trip.sell_seats(0),
            Err(InventoryError::InvalidAmount(0))
        );

        trip.sell_seats(15).unwrap();
        assert_eq!(trip.sold_seats(), 15);
        assert_eq!(trip.available_seats(), 0);
        assert!(trip.updated_at() >= before);
        assert!(trip.updated_at() >= trip.created_at());

        let touched = trip.updated_at();
        assert_eq!(
            trip.sell_seats(1),
            Err(InventoryError::InsufficientInventory {
                requested: 1,
                available: 0,
            })
        );
        assert_eq!(trip.sold_seats(), 15);
        assert_eq!(trip.updated_at(), touched);
    }

    #[test]
    fn test_average_rating() {
        let mut trip = Trip::new(kyiv_poltava()).unwrap();
        let rider = Actor::new("Dwayne", "dwayne@example.com", Role::Authorized);
        let scale = RatingScale::default();

        assert_eq!(trip.average_rating(), Err(TripError::NoRatings(trip.id())));

        trip.add_rating(&rider, 4.9, &scale).unwrap();
        let event = trip.add_rating(&rider, 4.1, &scale).unwrap();
        assert_eq!(event.trip_id, trip.id());
        assert_eq!(event.scorer_id, rider.id);

        let average = trip.average_rating().unwrap();
        assert!((average - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_rating_out_of_scale_is_rejected() {
        let mut trip = Trip::new(kyiv_poltava()).unwrap();
        let guest = Actor::new("John", "john@example.com", Role::Guest);
        let scale = RatingScale::default();

        let err = trip.add_rating(&guest, 7.5, &scale).unwrap_err();
        assert_eq!(
            err,
            TripError::InvalidRating {
                score: 7.5,
                min: 0.0,
                max: 5.0,
            }
        );
        assert!(trip.add_rating(&guest, f64::NAN, &scale).is_err());
        assert!(trip.ratings().is_empty());
    }

    #[test]
    fn test_apply_patch_is_all_or_nothing() {
        let mut trip = Trip::new(kyiv_poltava()).unwrap();

        let bad = TripPatch {
            price_cents: Some(9900),
            arrival_date: Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            ..Default::default()
        };
        assert!(trip.apply_patch(bad).is_err());
        assert_eq!(trip.price_cents(), 14880);

        let good = TripPatch {
            price_cents: Some(9900),
            total_seats: Some(20),
            ..Default::default()
        };
        let changed = trip.apply_patch(good).unwrap();
        assert_eq!(changed, vec!["price_cents", "total_seats"]);
        assert_eq!(trip.price_cents(), 9900);
        assert_eq!(trip.total_seats(), 20);
    }

    #[test]
    fn test_patch_cannot_shrink_below_committed() {
        let mut trip = Trip::new(kyiv_poltava()).unwrap();
        trip.issue_ticket(Uuid::new_v4(), 5).unwrap();
        trip.sell_seats(5).unwrap();

        let patch = TripPatch {
            total_seats: Some(8),
            ..Default::default()
        };
        let err = trip.apply_patch(patch).unwrap_err();
        assert!(matches!(
            err,
            TripError::Inventory(InventoryError::CapacityBelowCommitted { .. })
        ));
        assert_eq!(trip.total_seats(), 15);
    }

    #[test]
    fn test_patch_deserializes_from_partial_json() {
        let patch: TripPatch = serde_json::from_str(r#"{ "arrival": "Lubny" }"#).unwrap();
        assert_eq!(patch.changed_fields(), vec!["arrival"]);
        assert!(!patch.is_empty());
        assert!(TripPatch::default().is_empty());
    }

    #[test]
    fn test_summary_display() {
        let trip = Trip::new(kyiv_poltava()).unwrap();
        let line = trip.summary().to_string();
        assert_eq!(
            line,
            "Kyiv (2026-06-07) -> Poltava (2026-06-08) | 148.80 | 15/15 seats | unrated"
        );
    }
}
