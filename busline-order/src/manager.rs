use crate::events::{TicketAction, TicketEvent};
use crate::models::{Ticket, TicketStatus};
use busline_catalog::{InventoryError, Trip};
use busline_core::{Actor, BookingPolicy, Capability, CoreError};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Issues tickets and drives them through their lifecycle.
///
/// ```text
/// create -> AVAILABLE -> request -> REQUESTED -> approve -> APPROVED -> sell -> SOLD
///              ^                                                               |
///              +------------------------------ refund -------------------------+
/// ```
///
/// Each operation checks the caller's capability first, then the ticket's
/// status, then touches the trip's inventory. A failed call changes nothing.
pub struct TicketDesk {
    tickets: HashMap<Uuid, Ticket>,
    policy: BookingPolicy,
}

impl TicketDesk {
    pub fn new() -> Self {
        Self::with_policy(BookingPolicy::default())
    }

    pub fn with_policy(policy: BookingPolicy) -> Self {
        Self {
            tickets: HashMap::new(),
            policy,
        }
    }

    /// Issue a ticket for `trip`, holding `seats_amount` of its seats.
    pub fn create_ticket(
        &mut self,
        actor: &Actor,
        trip: &mut Trip,
        seats_amount: u32,
        price_cents: i32,
    ) -> Result<TicketEvent, TicketError> {
        actor.require(Capability::ManageTrips)?;

        if price_cents < 0 {
            return Err(TicketError::InvalidPrice(price_cents));
        }
        if seats_amount == 0 {
            return Err(TicketError::InvalidSeatCount(seats_amount));
        }

        let ticket = Ticket::new(trip.id(), seats_amount, price_cents);
        trip.issue_ticket(ticket.id, seats_amount)?;

        let event = record(actor, &ticket, TicketAction::Created, None);
        self.tickets.insert(ticket.id, ticket);
        Ok(event)
    }

    /// Transition: Available → Requested
    pub fn request_ticket(
        &mut self,
        actor: &Actor,
        trip: &Trip,
        ticket_id: &Uuid,
    ) -> Result<TicketEvent, TicketError> {
        actor.require(Capability::RequestTicket)?;

        let ticket = self.get_ticket_mut(ticket_id)?;
        if ticket.trip_id != trip.id() {
            return Err(TicketError::WrongTrip {
                ticket: *ticket_id,
                expected: ticket.trip_id,
                actual: trip.id(),
            });
        }
        if ticket.status != TicketStatus::Available {
            return Err(TicketError::NotAvailable {
                ticket: *ticket_id,
                status: ticket.status,
            });
        }

        let from = ticket.status;
        ticket.update_status(TicketStatus::Requested);
        ticket.requested_by = Some(actor.id);
        Ok(record(actor, ticket, TicketAction::Requested, Some(from)))
    }

    /// Transition: Requested → Approved. Seats are not re-checked here.
    pub fn approve_ticket(
        &mut self,
        actor: &Actor,
        ticket_id: &Uuid,
    ) -> Result<TicketEvent, TicketError> {
        actor.require(Capability::ManageTrips)?;

        let ticket = self.get_ticket_mut(ticket_id)?;
        ensure_status(ticket, TicketStatus::Requested, TicketStatus::Approved)?;

        ticket.update_status(TicketStatus::Approved);
        Ok(record(
            actor,
            ticket,
            TicketAction::Approved,
            Some(TicketStatus::Requested),
        ))
    }

    /// Transition: Approved → Sold. The ticket's held seats become sold.
    pub fn sell_ticket(
        &mut self,
        actor: &Actor,
        trip: &mut Trip,
        ticket_id: &Uuid,
    ) -> Result<TicketEvent, TicketError> {
        actor.require(Capability::SellTicket)?;

        let ticket = self.get_ticket_mut(ticket_id)?;
        ensure_owned(trip, ticket)?;
        ensure_status(ticket, TicketStatus::Approved, TicketStatus::Sold)?;

        trip.commit_seats(ticket.seats_amount)?;
        ticket.update_status(TicketStatus::Sold);
        ticket.sold_by = Some(actor.id);
        Ok(record(
            actor,
            ticket,
            TicketAction::Sold,
            Some(TicketStatus::Approved),
        ))
    }

    /// Transition: Sold → Available, judged against today's date.
    pub fn refund_ticket(
        &mut self,
        actor: &Actor,
        trip: &mut Trip,
        ticket_id: &Uuid,
    ) -> Result<TicketEvent, TicketError> {
        let today = Utc::now().date_naive();
        self.refund_ticket_on(actor, trip, ticket_id, today)
    }

    /// Transition: Sold → Available, as of `today`.
    ///
    /// The trip must depart strictly after `today` (plus the policy's cutoff).
    /// Sold seats go back to being held by the ticket, which can then be
    /// requested again.
    pub fn refund_ticket_on(
        &mut self,
        actor: &Actor,
        trip: &mut Trip,
        ticket_id: &Uuid,
        today: NaiveDate,
    ) -> Result<TicketEvent, TicketError> {
        actor.require(Capability::RefundTicket)?;

        let policy = self.policy;
        let ticket = self.get_ticket_mut(ticket_id)?;
        ensure_owned(trip, ticket)?;
        ensure_status(ticket, TicketStatus::Sold, TicketStatus::Available)?;

        if !policy.refund_allowed(trip.departure_date(), today) {
            return Err(TicketError::TripAlreadyOccurred {
                trip: trip.id(),
                departure_date: trip.departure_date(),
            });
        }

        trip.reopen_seats(ticket.seats_amount)?;
        ticket.update_status(TicketStatus::Available);
        ticket.requested_by = None;
        ticket.sold_by = None;
        Ok(record(
            actor,
            ticket,
            TicketAction::Refunded,
            Some(TicketStatus::Sold),
        ))
    }

    pub fn get(&self, ticket_id: &Uuid) -> Option<&Ticket> {
        self.tickets.get(ticket_id)
    }

    pub fn tickets_for_trip(&self, trip_id: &Uuid) -> Vec<&Ticket> {
        let mut tickets: Vec<&Ticket> = self
            .tickets
            .values()
            .filter(|t| t.trip_id == *trip_id)
            .collect();
        tickets.sort_by_key(|t| (t.created_at, t.id));
        tickets
    }

    /// Drop every ticket issued for a deleted trip. Returns how many were dropped.
    pub fn discard_trip(&mut self, trip: &Trip) -> usize {
        let before = self.tickets.len();
        self.tickets
            .retain(|id, ticket| ticket.trip_id != trip.id() && !trip.has_issued(id));

        let discarded = before - self.tickets.len();
        if discarded > 0 {
            tracing::info!(trip = %trip.id(), discarded, "Discarded tickets of deleted trip");
        }
        discarded
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    fn get_ticket_mut(&mut self, ticket_id: &Uuid) -> Result<&mut Ticket, TicketError> {
        self.tickets
            .get_mut(ticket_id)
            .ok_or(TicketError::NotFound(*ticket_id))
    }
}

impl Default for TicketDesk {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_owned(trip: &Trip, ticket: &Ticket) -> Result<(), TicketError> {
    if ticket.trip_id != trip.id() || !trip.has_issued(&ticket.id) {
        return Err(TicketError::NotOwned {
            ticket: ticket.id,
            trip: trip.id(),
        });
    }
    Ok(())
}

fn ensure_status(
    ticket: &Ticket,
    expected: TicketStatus,
    to: TicketStatus,
) -> Result<(), TicketError> {
    if ticket.status != expected {
        return Err(TicketError::InvalidTransition {
            ticket: ticket.id,
            from: ticket.status,
            to,
        });
    }
    Ok(())
}

fn record(
    actor: &Actor,
    ticket: &Ticket,
    action: TicketAction,
    from: Option<TicketStatus>,
) -> TicketEvent {
    tracing::info!(
        ticket = %ticket.id,
        trip = %ticket.trip_id,
        actor = %actor.id,
        seats = ticket.seats_amount,
        "Ticket {:?}: {} -> {}",
        action,
        from.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        ticket.status
    );

    TicketEvent {
        ticket_id: ticket.id,
        trip_id: ticket.trip_id,
        actor_id: actor.id,
        action,
        from,
        to: ticket.status,
        seats: ticket.seats_amount,
        timestamp: ticket.updated_at.timestamp(),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket price must not be negative, got {0}")]
    InvalidPrice(i32),

    #[error("Ticket must cover at least 1 seat, got {0}")]
    InvalidSeatCount(u32),

    #[error("Ticket not found: {0}")]
    NotFound(Uuid),

    #[error("Ticket {ticket} belongs to trip {expected}, not {actual}")]
    WrongTrip {
        ticket: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    #[error("Ticket {ticket} was not issued by trip {trip}")]
    NotOwned {
        ticket: Uuid,
        trip: Uuid,
    },

    #[error("Ticket {ticket} is {status}, not available")]
    NotAvailable {
        ticket: Uuid,
        status: TicketStatus,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        ticket: Uuid,
        from: TicketStatus,
        to: TicketStatus,
    },

    #[error("Trip {trip} departs on {departure_date}; refunds are closed")]
    TripAlreadyOccurred {
        trip: Uuid,
        departure_date: NaiveDate,
    },

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Access(#[from] CoreError),
}
