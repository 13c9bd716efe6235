//! Translation between store rows and [`Album`] values.
//!
//! Both backends select the columns in the fixed order `id, title, artist,
//! price`, with price as decimal text, so one mapping serves them both.

use super::models::{Album, Price, PriceError};

/// Raw column values of one album row.
#[derive(Debug)]
pub(crate) struct AlbumRow {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub price: String,
}

impl AlbumRow {
    pub fn from_sqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(AlbumRow {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            price: row.get(3)?,
        })
    }

    pub fn from_postgres(row: &postgres::Row) -> Result<Self, postgres::Error> {
        Ok(AlbumRow {
            id: row.try_get(0)?,
            title: row.try_get(1)?,
            artist: row.try_get(2)?,
            price: row.try_get(3)?,
        })
    }
}

impl TryFrom<AlbumRow> for Album {
    type Error = PriceError;

    fn try_from(row: AlbumRow) -> Result<Self, Self::Error> {
        let price = row.price.parse::<Price>()?;
        Ok(Album {
            id: row.id,
            title: row.title,
            artist: row.artist,
            price,
        })
    }
}

/// Price as the parameter text bound on insert, always two fractional digits.
pub(crate) fn encode_price(price: Price) -> String {
    price.to_string()
}
