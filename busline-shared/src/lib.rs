pub mod models;
pub mod pii;

pub use models::events::{RatingAddedEvent, TripCreatedEvent, TripDeletedEvent, TripUpdatedEvent};
pub use pii::Masked;
