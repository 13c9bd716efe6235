//! Errors returned by album store operations.

use std::fmt;
use thiserror::Error;

/// Failure of an album store operation.
///
/// Every variant names the operation and its key input so the message alone
/// is enough to tell which call failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op}: cannot reach store: {message}")]
    Connection { op: &'static str, message: String },

    #[error("{op}: schema error: {message}")]
    Schema { op: &'static str, message: String },

    #[error("{op} {key}: {message}")]
    Query {
        op: &'static str,
        key: String,
        message: String,
    },

    #[error("{op} {key}: cannot decode row: {message}")]
    Decode {
        op: &'static str,
        key: String,
        message: String,
    },

    #[error("album_by_id {id}: no such album")]
    NotFound { id: i64 },

    #[error("add_album {title:?} by {artist:?}: album already exists with ID {id}")]
    AlreadyExists {
        id: i64,
        title: String,
        artist: String,
    },

    #[error("{op} {key}: failed to insert album: {message}")]
    Insert {
        op: &'static str,
        key: String,
        message: String,
    },

    #[error("{op} {key}: cancelled")]
    Cancelled { op: &'static str, key: String },

    #[error("{op} {key}: deadline exceeded")]
    DeadlineExceeded { op: &'static str, key: String },
}

/// Discriminant of [`StoreError`], for callers that branch on the kind only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Schema,
    Query,
    Decode,
    NotFound,
    AlreadyExists,
    Insert,
    Cancelled,
    DeadlineExceeded,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Connection { .. } => ErrorKind::Connection,
            StoreError::Schema { .. } => ErrorKind::Schema,
            StoreError::Query { .. } => ErrorKind::Query,
            StoreError::Decode { .. } => ErrorKind::Decode,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StoreError::Insert { .. } => ErrorKind::Insert,
            StoreError::Cancelled { .. } => ErrorKind::Cancelled,
            StoreError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The surrogate key of the album that blocked an insertion, if any.
    pub fn existing_id(&self) -> Option<i64> {
        match self {
            StoreError::AlreadyExists { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Operation name plus formatted key input, used to build [`StoreError`]s.
#[derive(Clone, Debug)]
pub(crate) struct OpLabel {
    op: &'static str,
    key: String,
}

impl OpLabel {
    pub fn new(op: &'static str, key: impl Into<String>) -> Self {
        OpLabel {
            op,
            key: key.into(),
        }
    }

    /// Label for a string key, quoted the way it appears in messages.
    pub fn quoted(op: &'static str, key: &str) -> Self {
        Self::new(op, format!("{:?}", key))
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn connection(&self, err: impl fmt::Display) -> StoreError {
        StoreError::Connection {
            op: self.op,
            message: err.to_string(),
        }
    }

    pub fn schema(&self, err: impl fmt::Display) -> StoreError {
        StoreError::Schema {
            op: self.op,
            message: err.to_string(),
        }
    }

    pub fn query(&self, err: impl fmt::Display) -> StoreError {
        StoreError::Query {
            op: self.op,
            key: self.key.clone(),
            message: err.to_string(),
        }
    }

    pub fn decode(&self, err: impl fmt::Display) -> StoreError {
        StoreError::Decode {
            op: self.op,
            key: self.key.clone(),
            message: err.to_string(),
        }
    }

    pub fn insert(&self, err: impl fmt::Display) -> StoreError {
        StoreError::Insert {
            op: self.op,
            key: self.key.clone(),
            message: err.to_string(),
        }
    }

    pub fn cancelled(&self) -> StoreError {
        StoreError::Cancelled {
            op: self.op,
            key: self.key.clone(),
        }
    }

    pub fn deadline_exceeded(&self) -> StoreError {
        StoreError::DeadlineExceeded {
            op: self.op,
            key: self.key.clone(),
        }
    }
}
