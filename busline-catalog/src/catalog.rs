use busline_core::{Actor, BookingPolicy, Capability, CoreError};
use busline_shared::{RatingAddedEvent, TripCreatedEvent, TripDeletedEvent, TripUpdatedEvent};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use crate::search::{list_trips, SortBy};
use crate::trip::{NewTrip, Trip, TripError, TripPatch, TripSummary};

/// In-memory trip store. Trips are listed in the order they were created.
pub struct TripCatalog {
    trips: HashMap<Uuid, Trip>,
    order: Vec<Uuid>,
    policy: BookingPolicy,
}

impl TripCatalog {
    pub fn new() -> Self {
        Self::with_policy(BookingPolicy::default())
    }

    pub fn with_policy(policy: BookingPolicy) -> Self {
        Self {
            trips: HashMap::new(),
            order: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub fn create_trip(
        &mut self,
        actor: &Actor,
        new_trip: NewTrip,
    ) -> Result<TripCreatedEvent, CatalogError> {
        actor.require(Capability::ManageTrips)?;

        let trip = Trip::new(new_trip)?;
        let event = TripCreatedEvent {
            trip_id: trip.id(),
            created_by: actor.id,
            departure: trip.departure().to_string(),
            departure_date: trip.departure_date(),
            arrival: trip.arrival().to_string(),
            total_seats: trip.total_seats(),
            timestamp: Utc::now().timestamp(),
        };

        tracing::info!(
            trip = %trip.id(),
            actor = %actor.id,
            "Trip {} -> {} scheduled with {} seats",
            trip.departure(),
            trip.arrival(),
            trip.total_seats()
        );
        self.order.push(trip.id());
        self.trips.insert(trip.id(), trip);

        Ok(event)
    }

    pub fn update_trip(
        &mut self,
        actor: &Actor,
        trip_id: &Uuid,
        patch: TripPatch,
    ) -> Result<TripUpdatedEvent, CatalogError> {
        actor.require(Capability::ManageTrips)?;

        let trip = self.get_trip_mut(trip_id)?;
        let changed_fields = trip.apply_patch(patch)?;
        tracing::info!(trip = %trip_id, actor = %actor.id, fields = ?changed_fields, "Trip updated");

        Ok(TripUpdatedEvent {
            trip_id: *trip_id,
            updated_by: actor.id,
            changed_fields,
            timestamp: Utc::now().timestamp(),
        })
    }

    /// Remove a trip. The returned trip still lists the tickets it issued so
    /// the caller can void them.
    pub fn delete_trip(
        &mut self,
        actor: &Actor,
        trip_id: &Uuid,
    ) -> Result<(Trip, TripDeletedEvent), CatalogError> {
        actor.require(Capability::ManageTrips)?;

        let trip = self
            .trips
            .remove(trip_id)
            .ok_or(CatalogError::NotFound(*trip_id))?;
        self.order.retain(|id| id != trip_id);

        let issued_tickets = trip.issued_tickets().count();
        if issued_tickets > 0 {
            tracing::warn!(trip = %trip_id, issued_tickets, "Deleting trip with issued tickets");
        }
        tracing::info!(trip = %trip_id, actor = %actor.id, "Trip deleted");

        let event = TripDeletedEvent {
            trip_id: *trip_id,
            deleted_by: actor.id,
            issued_tickets,
            timestamp: Utc::now().timestamp(),
        };
        Ok((trip, event))
    }

    /// Any actor may rate a trip.
    pub fn rate_trip(
        &mut self,
        actor: &Actor,
        trip_id: &Uuid,
        score: f64,
    ) -> Result<RatingAddedEvent, CatalogError> {
        let scale = self.policy.rating_scale;
        let trip = self.get_trip_mut(trip_id)?;
        Ok(trip.add_rating(actor, score, &scale)?)
    }

    pub fn get(&self, trip_id: &Uuid) -> Option<&Trip> {
        self.trips.get(trip_id)
    }

    pub fn get_mut(&mut self, trip_id: &Uuid) -> Option<&mut Trip> {
        self.trips.get_mut(trip_id)
    }

    pub fn trips(&self) -> Vec<&Trip> {
        self.order
            .iter()
            .filter_map(|id| self.trips.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn list(
        &self,
        actor: &Actor,
        sort_by: Option<SortBy>,
    ) -> Result<Vec<TripSummary>, CatalogError> {
        Ok(list_trips(actor, self.trips(), sort_by)?)
    }

    fn get_trip_mut(&mut self, trip_id: &Uuid) -> Result<&mut Trip, CatalogError> {
        self.trips
            .get_mut(trip_id)
            .ok_or(CatalogError::NotFound(*trip_id))
    }
}

impl Default for TripCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Trip not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Trip(#[from] TripError),

    #[error(transparent)]
    Access(#[from] CoreError),
}
