use std::fmt;

use serde::{Deserialize, Serialize};

/// Target-language category a database-reported type collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappedType {
    String,
    Int,
    Bool,
    /// Escape hatch for engine types without a dedicated category (dates, decimals, binary...).
    Any,
}

impl MappedType {
    /// Literal returned in place of a value when the generated accessor fails.
    pub fn zero_value(&self) -> &'static str {
        match self {
            MappedType::String => "\"\"",
            MappedType::Int => "0",
            MappedType::Bool => "false",
            MappedType::Any => "nil",
        }
    }
}

impl fmt::Display for MappedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappedType::String => write!(f, "string"),
            MappedType::Int => write!(f, "int"),
            MappedType::Bool => write!(f, "bool"),
            MappedType::Any => write!(f, "any"),
        }
    }
}

// Case-sensitive substring checks; "varchar" must win over "int".
fn map_common(sql_type_name: &str) -> Option<MappedType> {
    if sql_type_name.contains("varchar") {
        Some(MappedType::String)
    } else if sql_type_name.contains("int") {
        Some(MappedType::Int)
    } else {
        None
    }
}

/// Parameters never resolve to [`MappedType::Bool`].
pub fn map_parameter_type(sql_type_name: &str) -> MappedType {
    map_common(sql_type_name).unwrap_or(MappedType::Any)
}

pub fn map_result_type(sql_type_name: &str) -> MappedType {
    match map_common(sql_type_name) {
        Some(mapped) => mapped,
        None if sql_type_name == "bit" => MappedType::Bool,
        None => MappedType::Any,
    }
}
