use sqlx::postgres::PgPoolOptions;
use sqlx::{Column, Either, Executor, Pool, Postgres, Statement, TypeInfo};

use crate::inference::{BackendError, ColumnRow, Introspect, PARAMETER_SIGIL, ParameterRow};
use crate::placeholders::{ParametrizedQuery, parse_into_postgres};

/// Describes queries by preparing them, PostgreSQL has no undeclared-parameter procedure.
///
/// `@name` placeholders are rewritten to `$n` before preparing, so the reported parameters
/// line up with the names in the query file.
pub struct PgIntrospector {
    pool: Pool<Postgres>,
}

impl PgIntrospector {
    pub async fn connect(db_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

// sqlx reports upper-case names, the catalog (pg_type.typname) spells them in lower case.
fn engine_type_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Pairs the placeholder names, in `$n` order, with the types the server inferred for them.
fn parameter_rows<'a>(
    params: Vec<String>,
    type_names: impl IntoIterator<Item = &'a str>,
) -> Vec<ParameterRow> {
    params
        .into_iter()
        .zip(type_names)
        .map(|(name, type_name)| ParameterRow {
            name: format!("{PARAMETER_SIGIL}{name}"),
            suggested_type_name: engine_type_name(type_name),
        })
        .collect()
}

impl Introspect for PgIntrospector {
    async fn describe_parameters(&mut self, sql: &str) -> Result<Vec<ParameterRow>, BackendError> {
        let ParametrizedQuery { raw_query, params } = parse_into_postgres(sql)?;
        let prepared = self.pool.prepare(&raw_query).await?;
        /*
        PgStatement::<'_>::parameters is defined as following:
        Some(Either::Left(&self.metadata.parameters))
        */
        let Some(Either::Left(types)) = prepared.parameters() else {
            return Err("PostgreSQL did not report parameter types".into());
        };
        Ok(parameter_rows(
            params,
            types.iter().map(|type_info| type_info.name()),
        ))
    }

    async fn describe_first_result_set_columns(
        &mut self,
        sql: &str,
    ) -> Result<Vec<ColumnRow>, BackendError> {
        let ParametrizedQuery { raw_query, .. } = parse_into_postgres(sql)?;
        let prepared = self.pool.prepare(&raw_query).await?;
        Ok(prepared
            .columns()
            .iter()
            .map(|column| ColumnRow {
                name: column.name().to_string(),
                type_name: engine_type_name(column.type_info().name()),
            })
            .collect())
    }
}
