use chrono::{DateTime, Utc};
use serde::Serialize;
use sql_bind_core::GeneratedUnit;

use super::{CodeGen, EmitError};

#[derive(Default)]
pub struct JsonCodeGen {
    queries: Vec<GeneratedUnit>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    generated_at: DateTime<Utc>,
    queries: &'a [GeneratedUnit],
}

impl CodeGen for JsonCodeGen {
    fn push(&mut self, unit: GeneratedUnit) -> Result<(), EmitError> {
        if self
            .queries
            .iter()
            .any(|query| query.identifier == unit.identifier)
        {
            return Err(EmitError::NameCollision {
                name: unit.identifier.clone(),
                query: unit.identifier,
            });
        }
        self.queries.push(unit);
        Ok(())
    }

    fn finalize(&self, timestamp: DateTime<Utc>) -> Result<String, EmitError> {
        Ok(serde_json::to_string_pretty(&JsonOutput {
            generated_at: timestamp,
            queries: &self.queries,
        })?)
    }
}
