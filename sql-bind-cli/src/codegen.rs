pub mod go;
pub mod json;

use std::{error::Error, fmt::Display};

use chrono::{DateTime, Utc};
use sql_bind_core::GeneratedUnit;

#[derive(Debug)]
pub enum EmitError {
    EmptyResultSet { query: String },
    NameCollision { name: String, query: String },
    Json(serde_json::Error),
    Render(std::fmt::Error),
}

impl Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitError::EmptyResultSet { query } => write!(
                f,
                "{query} describes no result columns, an accessor needs at least one value to return"
            ),
            EmitError::NameCollision { name, query } => {
                write!(f, "{query} declares {name}, which is already declared")
            }
            EmitError::Json(err) => write!(f, "Serializing queries failed: {err}"),
            EmitError::Render(err) => write!(f, "Rendering queries failed: {err}"),
        }
    }
}

impl Error for EmitError {}

impl From<serde_json::Error> for EmitError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<std::fmt::Error> for EmitError {
    fn from(value: std::fmt::Error) -> Self {
        Self::Render(value)
    }
}

/// Collects generated units in push order and renders them as one artifact.
pub trait CodeGen {
    fn push(&mut self, unit: GeneratedUnit) -> Result<(), EmitError>;

    fn finalize(&self, timestamp: DateTime<Utc>) -> Result<String, EmitError>;
}
