//! Error taxonomy shared by the data layer.
//!
//! Business-rule results (already linked, id in use, not linked, ...) are not
//! errors; they are returned as outcome enums by [`crate::mutation`] and
//! [`crate::comparison`]. The types here cover failures that abort a single
//! command.

use thiserror::Error;

/// Failures raised by a [`crate::sheet::Table`] implementation.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table unreachable: {0}")]
    Connection(String),
    #[error("table access denied: {0}")]
    Auth(String),
    #[error("cell at row {row}, column {column} is outside the table")]
    OutOfRange { row: usize, column: usize },
}

/// A cell whose text cannot be read as a number.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot interpret '{text}' as a number")]
pub struct ParseError {
    pub text: String,
}

impl ParseError {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("no column matches '{0}'")]
    FieldNotFound(String),
    #[error("no column matches category '{0}'")]
    CategoryNotFound(String),
    #[error("row {row} changed while it was being updated")]
    StaleRow { row: usize },
    #[error("identity must not be blank")]
    BlankIdentity,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("chart rendering failed: {0}")]
pub struct RenderError(pub String);
