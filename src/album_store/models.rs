//! Album catalog models.
//!
//! Prices are fixed-point values held as integer cents so that the amounts
//! written to and read from the store compare exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest amount a `NUMERIC(10, 2)` column can hold, in cents.
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

const CENTS_PER_UNIT: i64 = 100;
const MAX_INTEGER_DIGITS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("empty price")]
    Empty,

    #[error("invalid price {0:?}: expected digits with up to two fractional digits")]
    Malformed(String),

    #[error("price {0:?} has more than two fractional digits")]
    TooPrecise(String),

    #[error("price {0:?} does not fit NUMERIC(10, 2)")]
    OutOfRange(String),
}

/// Monetary amount with exactly two fractional digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price(i64);

impl Price {
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if !(0..=MAX_PRICE_CENTS).contains(&cents) {
            return Err(PriceError::OutOfRange(cents.to_string()));
        }
        Ok(Price(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / CENTS_PER_UNIT,
            self.0 % CENTS_PER_UNIT
        )
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        let malformed = || PriceError::Malformed(s.to_string());

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) if !fraction.is_empty() => (whole, fraction),
            Some(_) => return Err(malformed()),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if fraction.len() > 2 {
            return Err(PriceError::TooPrecise(s.to_string()));
        }

        let significant = whole.trim_start_matches('0');
        if significant.len() > MAX_INTEGER_DIGITS {
            return Err(PriceError::OutOfRange(s.to_string()));
        }
        let units: i64 = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|_| malformed())?
        };
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| malformed())? * 10,
            _ => fraction.parse().map_err(|_| malformed())?,
        };

        Price::from_cents(units * CENTS_PER_UNIT + cents)
    }
}

impl TryFrom<String> for Price {
    type Error = PriceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

/// A stored album.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Surrogate key assigned by the store.
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub price: Price,
}

/// Candidate for insertion; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    pub artist: String,
    pub price: Price,
}

impl NewAlbum {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, price: Price) -> Self {
        NewAlbum {
            title: title.into(),
            artist: artist.into(),
            price,
        }
    }
}
