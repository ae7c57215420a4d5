use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Ticket status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Available,
    Requested,
    Approved,
    Sold,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TicketStatus::Available => "AVAILABLE",
            TicketStatus::Requested => "REQUESTED",
            TicketStatus::Approved => "APPROVED",
            TicketStatus::Sold => "SOLD",
        };
        f.write_str(label)
    }
}

/// A reservation against a trip. The trip is referenced by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seats_amount: u32,
    pub price_cents: i32,
    pub status: TicketStatus,
    pub requested_by: Option<Uuid>,
    pub sold_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(trip_id: Uuid, seats_amount: u32, price_cents: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trip_id,
            seats_amount,
            price_cents,
            status: TicketStatus::Available,
            requested_by: None,
            sold_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn update_status(&mut self, new_status: TicketStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket {} [{}] trip {} | {} seat(s) | {}.{:02}",
            self.id,
            self.status,
            self.trip_id,
            self.seats_amount,
            self.price_cents / 100,
            self.price_cents % 100,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_is_available() {
        let trip_id = Uuid::new_v4();
        let ticket = Ticket::new(trip_id, 2, 29760);

        assert_eq!(ticket.status, TicketStatus::Available);
        assert_eq!(ticket.trip_id, trip_id);
        assert!(ticket.requested_by.is_none());
        assert!(ticket.sold_by.is_none());
        assert!(ticket.to_string().contains("[AVAILABLE]"));
        assert!(ticket.to_string().ends_with("2 seat(s) | 297.60"));
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&TicketStatus::Requested).unwrap();
        assert_eq!(json, "\"REQUESTED\"");
    }
}
