use serde::{Deserialize, Serialize};

/// Seat counters for a single trip.
///
/// Seats are either free, held by an issued ticket that has not been paid for,
/// or sold. `sold_seats + held_seats <= total_seats` holds after every call,
/// and deserialized counters are checked against the same bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSeatInventory")]
pub struct SeatInventory {
    total_seats: u32,
    sold_seats: u32,
    held_seats: u32,
}

impl SeatInventory {
    pub fn new(total_seats: u32) -> Self {
        Self {
            total_seats,
            sold_seats: 0,
            held_seats: 0,
        }
    }

    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    pub fn sold_seats(&self) -> u32 {
        self.sold_seats
    }

    pub fn held_seats(&self) -> u32 {
        self.held_seats
    }

    pub fn available_seats(&self) -> u32 {
        self.total_seats
            .saturating_sub(self.sold_seats)
            .saturating_sub(self.held_seats)
    }

    /// Sell free seats directly, without a ticket holding them first.
    pub fn sell_seats(&mut self, amount: u32) -> Result<(), InventoryError> {
        self.ensure_available(amount)?;
        self.sold_seats += amount;
        Ok(())
    }

    /// Hold free seats for a freshly issued ticket.
    pub fn hold(&mut self, amount: u32) -> Result<(), InventoryError> {
        self.ensure_available(amount)?;
        self.held_seats += amount;
        Ok(())
    }

    /// Move held seats to sold (ticket paid).
    pub fn commit(&mut self, amount: u32) -> Result<(), InventoryError> {
        if amount == 0 {
            return Err(InventoryError::InvalidAmount(amount));
        }
        if self.held_seats < amount {
            return Err(InventoryError::InsufficientHeld {
                requested: amount,
                held: self.held_seats,
            });
        }

        self.held_seats -= amount;
        self.sold_seats += amount;
        Ok(())
    }

    /// Move sold seats back to held (ticket refunded and offered again).
    pub fn reopen(&mut self, amount: u32) -> Result<(), InventoryError> {
        if amount == 0 {
            return Err(InventoryError::InvalidAmount(amount));
        }
        if self.sold_seats < amount {
            return Err(InventoryError::InsufficientSold {
                requested: amount,
                sold: self.sold_seats,
            });
        }

        self.sold_seats -= amount;
        self.held_seats += amount;
        Ok(())
    }

    /// Change the trip capacity. Cannot drop below what is already sold or held.
    pub fn resize(&mut self, total_seats: u32) -> Result<(), InventoryError> {
        let committed = self.committed_seats();
        if total_seats < committed {
            return Err(InventoryError::CapacityBelowCommitted {
                requested: total_seats,
                committed,
            });
        }

        self.total_seats = total_seats;
        Ok(())
    }

    fn committed_seats(&self) -> u32 {
        // Bounded by `total_seats`, so this cannot overflow.
        self.sold_seats + self.held_seats
    }

    fn ensure_available(&self, amount: u32) -> Result<(), InventoryError> {
        if amount == 0 {
            return Err(InventoryError::InvalidAmount(amount));
        }

        let available = self.available_seats();
        if available < amount {
            return Err(InventoryError::InsufficientInventory {
                requested: amount,
                available,
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawSeatInventory {
    total_seats: u32,
    sold_seats: u32,
    held_seats: u32,
}

impl TryFrom<RawSeatInventory> for SeatInventory {
    type Error = InventoryError;

    fn try_from(raw: RawSeatInventory) -> Result<Self, Self::Error> {
        let committed = raw
            .sold_seats
            .checked_add(raw.held_seats)
            .filter(|committed| *committed <= raw.total_seats);
        match committed {
            Some(_) => Ok(Self {
                total_seats: raw.total_seats,
                sold_seats: raw.sold_seats,
                held_seats: raw.held_seats,
            }),
            None => Err(InventoryError::Overcommitted {
                total: raw.total_seats,
                sold: raw.sold_seats,
                held: raw.held_seats,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Seat amount must be at least 1, got {0}")]
    InvalidAmount(u32),

    #[error("Insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        requested: u32,
        available: u32,
    },

    #[error("Insufficient held seats: requested {requested}, held {held}")]
    InsufficientHeld {
        requested: u32,
        held: u32,
    },

    #[error("Insufficient sold seats: requested {requested}, sold {sold}")]
    InsufficientSold {
        requested: u32,
        sold: u32,
    },

    #[error("Capacity {requested} is below committed seats {committed}")]
    CapacityBelowCommitted {
        requested: u32,
        committed: u32,
    },

    #[error("Sold {sold} and held {held} seats exceed capacity {total}")]
    Overcommitted { total: u32, sold: u32, held: u32 },
}
