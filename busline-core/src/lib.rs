pub mod identity;
pub mod policy;

pub use identity::{Actor, Capability, CapabilitySet, Role};
pub use policy::{BookingPolicy, RatingScale};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Actor {actor} is not allowed to {capability}")]
    Forbidden {
        actor: uuid::Uuid,
        capability: Capability,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
