//! Core types for the message feed.

use crate::error::{FeedError, Result};
use crate::store::columns;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store-assigned identity of a record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single message as seen by the client.
///
/// A `Record` is a snapshot: mutating a copy changes nothing in the store.
/// Updates go through [`crate::StoreGateway::set_favorite`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier (assigned by store).
    pub id: RecordId,

    /// Message body.
    pub text: String,

    /// Display name of the author.
    pub author: String,

    /// Whether the message is marked as a favorite.
    pub favorite: bool,
}

impl Record {
    pub fn new(id: RecordId, text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            author: author.into(),
            favorite: false,
        }
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    /// Two records are the same logical entity when their ids match.
    pub fn same_entity(&self, other: &Record) -> bool {
        self.id == other.id
    }

    /// Decode a raw store row.
    ///
    /// Fails when a column is missing, has the wrong type, or the favorite
    /// flag is anything other than 0 or 1.
    pub fn from_row(row: &Row) -> Result<Self> {
        let id = row.integer(columns::ID)?;
        let text = row.text(columns::TEXT)?;
        let author = row.text(columns::AUTHOR)?;
        let favorite = match row.integer(columns::FAVORITE)? {
            0 => false,
            1 => true,
            other => {
                return Err(FeedError::malformed(
                    columns::FAVORITE,
                    format!("expected 0 or 1, got {}", other),
                ))
            }
        };

        Ok(Self {
            id: RecordId(id),
            text,
            author,
            favorite,
        })
    }

    /// Encode as a store row.
    pub fn to_row(&self) -> Row {
        Row::new()
            .with(columns::ID, Value::Integer(self.id.0))
            .with(columns::TEXT, Value::Text(self.text.clone()))
            .with(columns::AUTHOR, Value::Text(self.author.clone()))
            .with(columns::FAVORITE, Value::Integer(self.favorite as i64))
    }
}

/// A single cell in a store row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Text(String),
    Null,
}

/// Raw result row, keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column.
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    fn column(&self, column: &str) -> Result<&Value> {
        self.columns
            .get(column)
            .ok_or_else(|| FeedError::malformed(column, "missing column"))
    }

    fn integer(&self, column: &str) -> Result<i64> {
        match self.column(column)? {
            Value::Integer(v) => Ok(*v),
            other => Err(FeedError::malformed(
                column,
                format!("expected integer, got {:?}", other),
            )),
        }
    }

    fn text(&self, column: &str) -> Result<String> {
        match self.column(column)? {
            Value::Text(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            other => Err(FeedError::malformed(
                column,
                format!("expected text, got {:?}", other),
            )),
        }
    }
}
