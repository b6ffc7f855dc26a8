use crate::BandId;
use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::Serialize;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Band {0} does not exist")]
    NotFound(BandId),
    #[error("Invalid search range: {0}")]
    InvalidRange(#[from] RangeError),
    #[error("Availability data could not be loaded: {0}")]
    DataUnavailable(#[source] Box<dyn StdError + Send + Sync>),
}

impl SuggestError {
    pub fn data_unavailable<E>(error: E) -> SuggestError
    where
        E: StdError + Send + Sync + 'static,
    {
        SuggestError::DataUnavailable(Box::new(error))
    }

    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            SuggestError::NotFound(_) => "BAND_NOT_FOUND",
            SuggestError::InvalidRange(_) => "INVALID_RANGE",
            SuggestError::DataUnavailable(_) => "DATA_UNAVAILABLE",
        }
    }
}

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum RangeError {
    #[error("search starts on {from} but ends on {to}")]
    Reversed { from: NaiveDate, to: NaiveDate },
    #[error("rehearsal duration must be positive")]
    NonPositiveDuration,
    #[error("search covers {days} days, at most {max} are allowed")]
    HorizonExceeded { days: i64, max: u32 },
}
