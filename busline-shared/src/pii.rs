use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps contact details so they never show up in `Debug` or `Display` output.
///
/// Serialization still writes the real value; masking only guards log macros
/// such as `tracing::info!("{:?}", actor)`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }
}
