use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::backend::Dialect;
use crate::ident::to_identifier;
use crate::inference::datatypes::MappedType;
use crate::inference::{ParameterDescriptor, ResultColumnDescriptor};

/// `<name> <type>` in the accessor signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormalParameter {
    pub ident: String,
    pub mapped_type: MappedType,
}

/// One argument following the query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    /// `sql.Named("<name>", <local>)`, keyed by the placeholder name as written in the query.
    Named { name: String, ident: String },
    /// `<local>`, bound to `$n` by its position.
    Positional { ident: String },
}

impl Argument {
    pub fn is_named(&self) -> bool {
        matches!(self, Argument::Named { .. })
    }
}

/// `&<local>` receiving one column of the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    pub ident: String,
}

impl Display for FormalParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ident, self.mapped_type)
    }
}

impl Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Named { name, ident } => write!(f, "sql.Named({name:?}, {ident})"),
            Argument::Positional { ident } => write!(f, "{ident}"),
        }
    }
}

impl Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.ident)
    }
}

/// Positionally aligned binding artifacts of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pub formal_parameters: Vec<FormalParameter>,
    pub arguments: Vec<Argument>,
    pub result_types: Vec<MappedType>,
    pub scan_targets: Vec<ScanTarget>,
}

fn local_ident(name: &str) -> String {
    // names were validated while describing, the fallback only keeps this total
    to_identifier(name).unwrap_or_else(|| "_".to_string())
}

impl Bindings {
    /// Parameters of a `Dialect::Postgres` query are expected in `$n` order.
    pub fn synthesize(
        parameters: &[ParameterDescriptor],
        results: &[ResultColumnDescriptor],
        dialect: Dialect,
    ) -> Self {
        let mut formal_parameters = Vec::with_capacity(parameters.len());
        let mut arguments = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let ident = local_ident(&parameter.name);
            formal_parameters.push(FormalParameter {
                ident: ident.clone(),
                mapped_type: parameter.mapped_type,
            });
            arguments.push(match dialect {
                Dialect::SqlServer => Argument::Named {
                    name: parameter.name.clone(),
                    ident,
                },
                Dialect::Postgres => Argument::Positional { ident },
            });
        }
        let result_types = results.iter().map(|column| column.mapped_type).collect();
        let scan_targets = results
            .iter()
            .map(|column| ScanTarget {
                ident: local_ident(&column.name),
            })
            .collect();
        Self {
            formal_parameters,
            arguments,
            result_types,
            scan_targets,
        }
    }

    pub fn formal_parameter_list(&self) -> String {
        join(&self.formal_parameters)
    }

    pub fn argument_list(&self) -> String {
        join(&self.arguments)
    }

    pub fn result_type_list(&self) -> String {
        join(&self.result_types)
    }

    pub fn scan_target_list(&self) -> String {
        join(&self.scan_targets)
    }
}

pub fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
