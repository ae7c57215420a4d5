pub mod models;
pub mod events;
pub mod manager;

pub use models::{Ticket, TicketStatus};
pub use events::{TicketAction, TicketEvent};
pub use manager::{TicketDesk, TicketError};
