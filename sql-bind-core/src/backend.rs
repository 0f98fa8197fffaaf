pub mod postgres;
pub mod sqlserver;

use std::fmt;

use serde::Serialize;

use crate::inference::{BackendError, ColumnRow, Introspect, ParameterRow};

pub use postgres::PgIntrospector;
pub use sqlserver::MssqlIntrospector;

/// Introspection session picked from the shape of the connection string.
pub enum Backend {
    Postgres(PgIntrospector),
    SqlServer(MssqlIntrospector),
}

/// How the engine spells placeholders, which decides how generated code binds arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// `@name`, bound with `sql.Named`.
    #[default]
    SqlServer,
    /// `$n`, bound by position.
    Postgres,
}

impl Dialect {
    /// `postgres://` URLs name a PostgreSQL server, anything else a SQL Server one.
    pub fn of(connection_string: &str) -> Self {
        match connection_string.starts_with("postgres://")
            || connection_string.starts_with("postgresql://")
        {
            true => Dialect::Postgres,
            false => Dialect::SqlServer,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl Backend {
    pub async fn connect(connection_string: &str) -> Result<Self, BackendError> {
        Ok(match Dialect::of(connection_string) {
            Dialect::Postgres => Self::Postgres(PgIntrospector::connect(connection_string).await?),
            Dialect::SqlServer => {
                Self::SqlServer(MssqlIntrospector::connect(connection_string).await?)
            }
        })
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Backend::Postgres(_) => Dialect::Postgres,
            Backend::SqlServer(_) => Dialect::SqlServer,
        }
    }

    pub async fn close(self) {
        match self {
            Backend::Postgres(introspector) => introspector.close().await,
            Backend::SqlServer(introspector) => introspector.close().await,
        }
    }
}

impl Introspect for Backend {
    async fn describe_parameters(&mut self, sql: &str) -> Result<Vec<ParameterRow>, BackendError> {
        match self {
            Backend::Postgres(introspector) => introspector.describe_parameters(sql).await,
            Backend::SqlServer(introspector) => introspector.describe_parameters(sql).await,
        }
    }

    async fn describe_first_result_set_columns(
        &mut self,
        sql: &str,
    ) -> Result<Vec<ColumnRow>, BackendError> {
        match self {
            Backend::Postgres(introspector) => {
                introspector.describe_first_result_set_columns(sql).await
            }
            Backend::SqlServer(introspector) => {
                introspector.describe_first_result_set_columns(sql).await
            }
        }
    }
}
