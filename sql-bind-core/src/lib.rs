use serde::Serialize;

use crate::backend::Dialect;
use crate::bindings::Bindings;
use crate::inference::{
    DescribeError, Introspect, ParameterDescriptor, QueryDescription, ResultColumnDescriptor,
};
use crate::placeholders::parse_into_postgres;

pub mod backend;
pub mod bindings;
pub mod ident;
pub mod inference;
pub mod placeholders;

/// One query file, read once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryUnit {
    pub identifier: String,
    /// File name without its extension, as found on disk.
    pub file_stem: String,
    pub raw_text: String,
}

impl QueryUnit {
    /// Derives the identifier from the file stem, `None` when nothing usable is left.
    pub fn new(stem: &str, raw_text: String) -> Option<Self> {
        Some(Self {
            identifier: ident::to_identifier(stem)?,
            file_stem: stem.to_string(),
            raw_text,
        })
    }
}

/// Everything the emitters need to render one accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedUnit {
    pub identifier: String,
    /// Set when the query runs exactly as written in its file, `query` is inlined otherwise.
    pub embedded_source_path: Option<String>,
    pub query: String,
    pub parameters: Box<[ParameterDescriptor]>,
    pub results: Box<[ResultColumnDescriptor]>,
    #[serde(skip)]
    pub bindings: Bindings,
}

#[must_use]
pub struct SqlBindBuilder {
    embed_dir: String,
    extension: String,
    dialect: Dialect,
}

impl Default for SqlBindBuilder {
    fn default() -> Self {
        Self {
            embed_dir: "sql".to_string(),
            extension: "sql".to_string(),
            dialect: Dialect::default(),
        }
    }
}

impl SqlBindBuilder {
    /// Directory the generated code embeds query files from, relative to the output file.
    pub fn embed_dir(&mut self, embed_dir: impl Into<String>) -> &mut Self {
        self.embed_dir = embed_dir.into();
        self
    }

    pub fn extension(&mut self, extension: impl Into<String>) -> &mut Self {
        self.extension = extension.into();
        self
    }

    pub fn dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.dialect = dialect;
        self
    }

    pub fn build(self) -> SqlBind {
        SqlBind {
            embed_dir: self.embed_dir,
            extension: self.extension,
            dialect: self.dialect,
        }
    }
}

pub struct SqlBind {
    embed_dir: String,
    extension: String,
    dialect: Dialect,
}

impl SqlBind {
    pub async fn describe<I: Introspect>(
        &self,
        introspector: &mut I,
        unit: &QueryUnit,
    ) -> Result<QueryDescription, DescribeError> {
        inference::describe(introspector, &unit.identifier, &unit.raw_text).await
    }

    pub async fn generate<I: Introspect>(
        &self,
        introspector: &mut I,
        unit: QueryUnit,
    ) -> Result<GeneratedUnit, DescribeError> {
        let QueryDescription {
            parameters,
            results,
        } = self.describe(introspector, &unit).await?;
        let bindings = Bindings::synthesize(&parameters, &results, self.dialect);
        let rewritten = match self.dialect {
            Dialect::SqlServer => None,
            Dialect::Postgres => {
                let rewritten = parse_into_postgres(&unit.raw_text)
                    .map_err(|err| DescribeError::MetadataQuery {
                        query: unit.identifier.clone(),
                        source: err.into(),
                    })?
                    .raw_query;
                Some(rewritten).filter(|rewritten| *rewritten != unit.raw_text)
            }
        };
        let embedded_source_path = match rewritten {
            Some(_) => None,
            None => Some(format!(
                "{}/{}.{}",
                self.embed_dir, unit.file_stem, self.extension
            )),
        };
        Ok(GeneratedUnit {
            embedded_source_path,
            identifier: unit.identifier,
            query: rewritten.unwrap_or(unit.raw_text),
            parameters,
            results,
            bindings,
        })
    }
}
