pub mod datatypes;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ident::{is_reserved, to_identifier};
use crate::inference::datatypes::{MappedType, map_parameter_type, map_result_type};

pub type BackendError = Box<dyn Error + Send + Sync>;

/// Sigil SQL placeholders carry, e.g. `@id`.
pub const PARAMETER_SIGIL: char = '@';

/// One row of `describe_parameters`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub name: String,
    pub suggested_type_name: String,
}

/// One row of `describe_first_result_set_columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub name: String,
    pub type_name: String,
}

/// Engine metadata service, asked to describe a query without running it.
#[allow(async_fn_in_trait)]
pub trait Introspect {
    async fn describe_parameters(&mut self, sql: &str) -> Result<Vec<ParameterRow>, BackendError>;

    async fn describe_first_result_set_columns(
        &mut self,
        sql: &str,
    ) -> Result<Vec<ColumnRow>, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub sql_type_name: String,
    pub mapped_type: MappedType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultColumnDescriptor {
    pub name: String,
    pub sql_type_name: String,
    pub mapped_type: MappedType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryDescription {
    pub parameters: Box<[ParameterDescriptor]>,
    pub results: Box<[ResultColumnDescriptor]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Parameter,
    ResultColumn,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Parameter => write!(f, "parameter"),
            NameKind::ResultColumn => write!(f, "result column"),
        }
    }
}

#[derive(Debug)]
pub enum DescribeError {
    MetadataQuery {
        query: String,
        source: BackendError,
    },
    NameCollision {
        query: String,
        kind: NameKind,
        name: String,
        clashes_with: String,
    },
    UnnamedColumn {
        query: String,
        position: usize,
    },
}

impl fmt::Display for DescribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescribeError::MetadataQuery { query, source } => {
                write!(f, "Describing {query} failed: {source}")
            }
            DescribeError::NameCollision {
                query,
                kind,
                name,
                clashes_with,
            } => write!(
                f,
                "{kind} {name} in {query} collides with {clashes_with} in the generated function"
            ),
            DescribeError::UnnamedColumn { query, position } => write!(
                f,
                "Result column {position} of {query} has no name, add an alias to it"
            ),
        }
    }
}

impl Error for DescribeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DescribeError::MetadataQuery { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Asks the engine for the parameters and first result set of `sql`.
///
/// `query` only names the query in errors.
pub async fn describe<I: Introspect>(
    introspector: &mut I,
    query: &str,
    sql: &str,
) -> Result<QueryDescription, DescribeError> {
    let metadata_error = |source| DescribeError::MetadataQuery {
        query: query.to_string(),
        source,
    };
    let parameter_rows = introspector
        .describe_parameters(sql)
        .await
        .map_err(metadata_error)?;
    let column_rows = introspector
        .describe_first_result_set_columns(sql)
        .await
        .map_err(metadata_error)?;

    let parameters: Box<[ParameterDescriptor]> = parameter_rows
        .into_iter()
        .map(|row| ParameterDescriptor {
            name: row.name.replace(PARAMETER_SIGIL, ""),
            mapped_type: map_parameter_type(&row.suggested_type_name),
            sql_type_name: row.suggested_type_name,
        })
        .collect();
    let results: Box<[ResultColumnDescriptor]> = column_rows
        .into_iter()
        .map(|row| ResultColumnDescriptor {
            mapped_type: map_result_type(&row.type_name),
            name: row.name,
            sql_type_name: row.type_name,
        })
        .collect();
    debug!(
        "{query}: {} parameter(s), {} result column(s)",
        parameters.len(),
        results.len()
    );

    let description = QueryDescription {
        parameters,
        results,
    };
    check_names(query, &description)?;
    Ok(description)
}

/// Every parameter and result column becomes a local of the same Go function, so their
/// identifiers have to be distinct from each other and from every name the body refers to.
fn check_names(query: &str, description: &QueryDescription) -> Result<(), DescribeError> {
    let names = description
        .parameters
        .iter()
        .map(|param| (NameKind::Parameter, param.name.as_str()))
        .chain(
            description
                .results
                .iter()
                .map(|column| (NameKind::ResultColumn, column.name.as_str())),
        );

    let mut seen: HashMap<String, (NameKind, &str)> = HashMap::new();
    for (position, (kind, name)) in names.enumerate() {
        let Some(ident) = to_identifier(name) else {
            return Err(match kind {
                NameKind::ResultColumn => DescribeError::UnnamedColumn {
                    query: query.to_string(),
                    position: position - description.parameters.len() + 1,
                },
                NameKind::Parameter => DescribeError::NameCollision {
                    query: query.to_string(),
                    kind,
                    name: name.to_string(),
                    clashes_with: "the parameter sigil".to_string(),
                },
            });
        };
        if is_reserved(&ident) {
            return Err(DescribeError::NameCollision {
                query: query.to_string(),
                kind,
                name: name.to_string(),
                clashes_with: format!("the Go name {ident}"),
            });
        }
        if let Some((other_kind, other_name)) = seen.get(&ident) {
            return Err(DescribeError::NameCollision {
                query: query.to_string(),
                kind,
                name: name.to_string(),
                clashes_with: format!("{other_kind} {other_name}"),
            });
        }
        seen.insert(ident, (kind, name));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::{
        BackendError, ColumnRow, DescribeError, Introspect, NameKind, ParameterRow, describe,
    };
    use crate::inference::datatypes::MappedType;

    /// Replays canned metadata, keyed by query text.
    #[derive(Default)]
    pub(crate) struct CannedIntrospector {
        pub parameters: HashMap<String, Vec<(&'static str, &'static str)>>,
        pub columns: HashMap<String, Vec<(&'static str, &'static str)>>,
    }

    impl CannedIntrospector {
        pub fn with_query(
            mut self,
            sql: &str,
            parameters: &[(&'static str, &'static str)],
            columns: &[(&'static str, &'static str)],
        ) -> Self {
            self.parameters.insert(sql.to_string(), parameters.to_vec());
            self.columns.insert(sql.to_string(), columns.to_vec());
            self
        }
    }

    impl Introspect for CannedIntrospector {
        async fn describe_parameters(
            &mut self,
            sql: &str,
        ) -> Result<Vec<ParameterRow>, BackendError> {
            let rows = self.parameters.get(sql).ok_or("Incorrect syntax")?;
            Ok(rows
                .iter()
                .map(|(name, type_name)| ParameterRow {
                    name: name.to_string(),
                    suggested_type_name: type_name.to_string(),
                })
                .collect())
        }

        async fn describe_first_result_set_columns(
            &mut self,
            sql: &str,
        ) -> Result<Vec<ColumnRow>, BackendError> {
            let rows = self.columns.get(sql).ok_or("Incorrect syntax")?;
            Ok(rows
                .iter()
                .map(|(name, type_name)| ColumnRow {
                    name: name.to_string(),
                    type_name: type_name.to_string(),
                })
                .collect())
        }
    }

    const GET_USER: &str = "SELECT @id AS UserId, Name FROM Users WHERE Id = @id";

    #[tokio::test]
    async fn strips_sigil_and_maps_types() {
        let mut introspector = CannedIntrospector::default().with_query(
            GET_USER,
            &[("@id", "int")],
            &[("UserId", "int"), ("Name", "varchar(50)")],
        );
        let description = describe(&mut introspector, "GetUser", GET_USER)
            .await
            .unwrap();

        assert_eq!(description.parameters.len(), 1);
        assert_eq!(description.parameters[0].name, "id");
        assert_eq!(description.parameters[0].sql_type_name, "int");
        assert_eq!(description.parameters[0].mapped_type, MappedType::Int);

        let columns: Vec<_> = description
            .results
            .iter()
            .map(|column| (column.name.as_str(), column.mapped_type))
            .collect();
        assert_eq!(
            columns,
            vec![("UserId", MappedType::Int), ("Name", MappedType::String)]
        );
    }

    #[tokio::test]
    async fn keeps_engine_order() {
        let sql = "select c, a, b from t where x = @z and y = @a";
        let mut introspector = CannedIntrospector::default().with_query(
            sql,
            &[("@z", "bit"), ("@a", "nvarchar(10)")],
            &[("c", "bit"), ("a_", "date"), ("b", "bigint")],
        );
        let description = describe(&mut introspector, "q", sql).await.unwrap();
        let params: Vec<_> = description
            .parameters
            .iter()
            .map(|param| (param.name.as_str(), param.mapped_type))
            .collect();
        assert_eq!(
            params,
            vec![("z", MappedType::Any), ("a", MappedType::String)]
        );
        let columns: Vec<_> = description
            .results
            .iter()
            .map(|column| (column.name.as_str(), column.mapped_type))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("c", MappedType::Bool),
                ("a_", MappedType::Any),
                ("b", MappedType::Int)
            ]
        );
    }

    #[tokio::test]
    async fn no_parameters_is_legal() {
        let sql = "select Name from Users";
        let mut introspector =
            CannedIntrospector::default().with_query(sql, &[], &[("Name", "varchar")]);
        let description = describe(&mut introspector, "AllNames", sql).await.unwrap();
        assert!(description.parameters.is_empty());
        assert_eq!(description.results.len(), 1);
    }

    #[tokio::test]
    async fn no_result_columns_is_left_to_the_emitter() {
        let sql = "delete from Users where Id = @id";
        let mut introspector =
            CannedIntrospector::default().with_query(sql, &[("@id", "int")], &[]);
        let description = describe(&mut introspector, "DeleteUser", sql).await.unwrap();
        assert!(description.results.is_empty());
    }

    #[tokio::test]
    async fn introspection_failure_names_the_query() {
        let mut introspector = CannedIntrospector::default();
        let err = describe(&mut introspector, "Broken", "selec 1")
            .await
            .unwrap_err();
        assert!(matches!(err, DescribeError::MetadataQuery { ref query, .. } if query == "Broken"));
        assert_eq!(err.to_string(), "Describing Broken failed: Incorrect syntax");
    }

    #[tokio::test]
    async fn duplicate_parameter_names_collide() {
        let sql = "select Name from Users where Id = @id or Id = @id";
        let mut introspector = CannedIntrospector::default().with_query(
            sql,
            &[("@id", "int"), ("@id", "int")],
            &[("Name", "varchar")],
        );
        let err = describe(&mut introspector, "q", sql).await.unwrap_err();
        assert!(matches!(
            err,
            DescribeError::NameCollision { kind: NameKind::Parameter, ref name, .. } if name == "id"
        ));
    }

    #[tokio::test]
    async fn duplicate_result_columns_collide() {
        let sql = "select a.Id, b.Id from a join b on a.x = b.x";
        let mut introspector = CannedIntrospector::default().with_query(
            sql,
            &[],
            &[("Id", "int"), ("Id", "int")],
        );
        let err = describe(&mut introspector, "q", sql).await.unwrap_err();
        assert!(matches!(
            err,
            DescribeError::NameCollision { kind: NameKind::ResultColumn, .. }
        ));
    }

    #[tokio::test]
    async fn parameter_and_column_share_scope() {
        let sql = "select @id as id";
        let mut introspector =
            CannedIntrospector::default().with_query(sql, &[("@id", "int")], &[("id", "int")]);
        let err = describe(&mut introspector, "q", sql).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "result column id in q collides with parameter id in the generated function"
        );
    }

    #[tokio::test]
    async fn reserved_locals_collide() {
        let sql = "select 1 as err";
        let mut introspector =
            CannedIntrospector::default().with_query(sql, &[], &[("err", "int")]);
        let err = describe(&mut introspector, "q", sql).await.unwrap_err();
        assert!(matches!(err, DescribeError::NameCollision { .. }));
    }

    #[tokio::test]
    async fn unnamed_column_is_rejected() {
        let sql = "select Name, count(*) from Users group by Name";
        let mut introspector = CannedIntrospector::default().with_query(
            sql,
            &[],
            &[("Name", "varchar"), ("", "int")],
        );
        let err = describe(&mut introspector, "q", sql).await.unwrap_err();
        assert!(matches!(err, DescribeError::UnnamedColumn { position: 2, .. }));
    }

    #[tokio::test]
    async fn predeclared_go_names_collide() {
        let sql = "select Name, 1 as _, null as nil from Users where Kind = @string";
        let cases: [(&[(&'static str, &'static str)], &[(&'static str, &'static str)], &str); 3] = [
            (&[("@string", "varchar(10)")], &[("Name", "varchar")], "string"),
            (&[], &[("Name", "varchar"), ("_", "int")], "_"),
            (&[], &[("Name", "varchar"), ("nil", "bit")], "nil"),
        ];
        for (params, columns, offender) in cases {
            let mut introspector = CannedIntrospector::default().with_query(sql, params, columns);
            let err = describe(&mut introspector, "q", sql).await.unwrap_err();
            assert_eq!(
                err.to_string(),
                format!(
                    "{} {offender} in q collides with the Go name {offender} in the generated function",
                    match params.is_empty() {
                        true => "result column",
                        false => "parameter",
                    }
                )
            );
        }
    }
}
