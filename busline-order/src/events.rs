use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::TicketStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketAction {
    Created,
    Requested,
    Approved,
    Sold,
    Refunded,
}

/// Emitted for every successful ticket transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketEvent {
    pub ticket_id: Uuid,
    pub trip_id: Uuid,
    pub actor_id: Uuid,
    pub action: TicketAction,
    /// `None` when the ticket was just created.
    pub from: Option<TicketStatus>,
    pub to: TicketStatus,
    pub seats: u32,
    pub timestamp: i64,
}
