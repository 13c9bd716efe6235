//! Table definitions for the album catalog and their DDL per SQL dialect.
//!
//! All statements are `IF NOT EXISTS`, so running them against an already
//! initialized store changes nothing.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlDialect {
    Postgres,
    Sqlite,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    /// Store-generated integer primary key that is never reused.
    SurrogateKey,
    Text,
    Decimal { precision: u8, scale: u8 },
}

impl SqlType {
    fn render(&self, dialect: SqlDialect) -> String {
        match (self, dialect) {
            (SqlType::SurrogateKey, SqlDialect::Postgres) => "BIGSERIAL PRIMARY KEY".to_string(),
            (SqlType::SurrogateKey, SqlDialect::Sqlite) => {
                "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
            }
            (SqlType::Text, _) => "TEXT".to_string(),
            (SqlType::Decimal { precision, scale }, SqlDialect::Postgres) => {
                format!("NUMERIC({}, {})", precision, scale)
            }
            // SQLite has no exact decimal type; canonical decimal text keeps
            // every digit.
            (SqlType::Decimal { .. }, SqlDialect::Sqlite) => "TEXT".to_string(),
        }
    }
}

macro_rules! sql_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                non_null: false,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub non_null: bool,
}

pub struct Index {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [Index],
}

impl Table {
    /// DDL statements creating the table and its indices when missing.
    pub fn create_statements(&self, dialect: SqlDialect) -> Vec<String> {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut sql = format!("{} {}", column.name, column.sql_type.render(dialect));
                if column.non_null {
                    sql.push_str(" NOT NULL");
                }
                sql
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name, columns
        )];
        for index in self.indices {
            statements.push(format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                if index.unique { "UNIQUE " } else { "" },
                index.name,
                self.name,
                index.columns.join(", ")
            ));
        }
        statements
    }

    /// All statements joined into a single batch.
    pub fn create_batch(&self, dialect: SqlDialect) -> String {
        self.create_statements(dialect)
            .into_iter()
            .map(|statement| statement + ";")
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Albums table. The unique `(title, artist)` index is what makes
/// insert-if-absent atomic.
pub const ALBUM_TABLE: Table = Table {
    name: "album",
    columns: &[
        sql_column!("id", &SqlType::SurrogateKey),
        sql_column!("title", &SqlType::Text, non_null = true),
        sql_column!("artist", &SqlType::Text, non_null = true),
        sql_column!(
            "price",
            &SqlType::Decimal {
                precision: 10,
                scale: 2
            },
            non_null = true
        ),
    ],
    indices: &[
        Index {
            name: "album_title_artist_key",
            columns: &["title", "artist"],
            unique: true,
        },
        Index {
            name: "album_artist_idx",
            columns: &["artist"],
            unique: false,
        },
    ],
};
