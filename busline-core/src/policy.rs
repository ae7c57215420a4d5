use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Inclusive bounds for rating scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl RatingScale {
    pub fn new(min: f64, max: f64) -> CoreResult<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(CoreError::ValidationError(format!(
                "rating scale must satisfy min < max, got {min}..{max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// NaN is never in range.
    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 0.0, max: 5.0 }
    }
}

/// Business rules applied by the catalog and the ticket desk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookingPolicy {
    pub rating_scale: RatingScale,
    /// Refunds close this many days before departure. Zero means a refund is
    /// possible up to the day before the trip.
    pub refund_cutoff_days: i64,
}

impl BookingPolicy {
    pub fn new(rating_scale: RatingScale, refund_cutoff_days: i64) -> CoreResult<Self> {
        if refund_cutoff_days < 0 {
            return Err(CoreError::ValidationError(format!(
                "refund cutoff must not be negative, got {refund_cutoff_days}"
            )));
        }
        Ok(Self {
            rating_scale,
            refund_cutoff_days,
        })
    }

    /// A refund needs the departure date strictly after `today` plus the cutoff.
    pub fn refund_allowed(&self, departure_date: NaiveDate, today: NaiveDate) -> bool {
        today
            .checked_add_signed(Duration::days(self.refund_cutoff_days))
            .map(|limit| departure_date > limit)
            .unwrap_or(false)
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            rating_scale: RatingScale::default(),
            refund_cutoff_days: 0,
        }
    }
}
