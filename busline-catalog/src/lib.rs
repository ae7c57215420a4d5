pub mod inventory;
pub mod trip;
pub mod catalog;
pub mod search;

pub use inventory::{InventoryError, SeatInventory};
pub use trip::{NewTrip, Trip, TripError, TripPatch, TripSummary};
pub use catalog::{CatalogError, TripCatalog};
pub use search::{list_trips, sort_trips, SortBy};
