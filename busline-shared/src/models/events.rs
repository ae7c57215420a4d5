use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct TripCreatedEvent {
    pub trip_id: Uuid,
    pub created_by: Uuid,
    pub departure: String,
    pub departure_date: NaiveDate,
    pub arrival: String,
    pub total_seats: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct TripUpdatedEvent {
    pub trip_id: Uuid,
    pub updated_by: Uuid,
    pub changed_fields: Vec<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct TripDeletedEvent {
    pub trip_id: Uuid,
    pub deleted_by: Uuid,
    pub issued_tickets: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct RatingAddedEvent {
    pub trip_id: Uuid,
    pub scorer_id: Uuid,
    pub score: f64,
    pub timestamp: i64,
}
