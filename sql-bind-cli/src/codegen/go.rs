use std::{collections::HashSet, fmt::Write};

use chrono::{DateTime, Utc};
use sql_bind_core::{GeneratedUnit, bindings::Argument};

use super::{CodeGen, EmitError};

/// Taken by the preamble of every generated file: its declarations, the pool field the
/// methods share a namespace with, and the blank identifier.
const RESERVED_DECLARATIONS: &[&str] = &["Queries", "New", "db", "_"];

const PREAMBLE: &str = r#"// Queries runs the embedded queries against a shared connection pool.
type Queries struct {
	db *sqlx.DB
}

func New(db *sqlx.DB) *Queries {
	return &Queries{db: db}
}
"#;

fn query_var(identifier: &str) -> String {
    format!("{identifier}Query")
}

fn quoted(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for c in text.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if c.is_control() => literal.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// Raw string literal unless the text holds a backquote or a control character Go would drop.
fn string_literal(text: &str) -> String {
    let raw = text
        .chars()
        .all(|c| c != '`' && (!c.is_control() || c == '\n' || c == '\t'));
    match raw {
        true => format!("`{text}`"),
        false => quoted(text),
    }
}

fn embed_pattern(path: &str) -> String {
    match path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_-./".contains(c))
    {
        true => path.to_string(),
        false => quoted(path),
    }
}

/// Renders one `database/sql` accessor method per query.
pub struct GoCodeGen {
    units: Vec<GeneratedUnit>,
    declared: HashSet<String>,
    package: String,
    context: bool,
}

impl GoCodeGen {
    pub fn new(package: impl Into<String>, context: bool) -> Self {
        Self {
            units: vec![],
            declared: RESERVED_DECLARATIONS.iter().map(ToString::to_string).collect(),
            package: package.into(),
            context,
        }
    }

    fn header(&self, timestamp: DateTime<Utc>) -> String {
        let mut imports = vec![];
        if !self.units.is_empty() {
            imports.push("\"context\"");
        }
        if self
            .units
            .iter()
            .any(|unit| unit.bindings.arguments.iter().any(Argument::is_named))
        {
            imports.push("\"database/sql\"");
        }
        if self
            .units
            .iter()
            .any(|unit| unit.embedded_source_path.is_some())
        {
            imports.push("_ \"embed\"");
        }
        if !self.units.is_empty() {
            imports.push("\"fmt\"");
        }
        let mut header = format!(
            "// Code generated by sql-bind; DO NOT EDIT.\n\
             // This file was generated by robots at\n\
             // {}\n\
             package {}\n\nimport (\n",
            timestamp.to_rfc3339(),
            self.package
        );
        for import in imports {
            header.push_str(&format!("\t{import}\n"));
        }
        if !self.units.is_empty() {
            header.push('\n');
        }
        header.push_str("\t\"github.com/jmoiron/sqlx\"\n)\n\n");
        header.push_str(PREAMBLE);
        header
    }

    fn accessor(&self, unit: &GeneratedUnit) -> Result<String, std::fmt::Error> {
        let name = &unit.identifier;
        let bindings = &unit.bindings;

        let mut formal_parameters = vec![];
        if self.context {
            formal_parameters.push("ctx context.Context".to_string());
        }
        if !bindings.formal_parameters.is_empty() {
            formal_parameters.push(bindings.formal_parameter_list());
        }
        let outputs = format!("bool, {}, error", bindings.result_type_list());
        let zeros = bindings
            .result_types
            .iter()
            .map(|mapped_type| mapped_type.zero_value())
            .collect::<Vec<_>>()
            .join(", ");
        let values = bindings
            .scan_targets
            .iter()
            .map(|target| target.ident.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut arguments = vec!["ctx".to_string(), query_var(name)];
        if !bindings.arguments.is_empty() {
            arguments.push(bindings.argument_list());
        }

        let mut code = String::new();
        writeln!(code)?;
        match &unit.embedded_source_path {
            Some(path) => {
                writeln!(code, "//go:embed {}", embed_pattern(path))?;
                writeln!(code, "var {} string", query_var(name))?;
            }
            None => writeln!(
                code,
                "var {} = {}",
                query_var(name),
                string_literal(&unit.query)
            )?,
        }
        writeln!(code)?;
        writeln!(
            code,
            "func (q *Queries) {name}({}) ({outputs}) {{",
            formal_parameters.join(", ")
        )?;
        if !self.context {
            writeln!(code, "\tctx := context.Background()")?;
        }
        writeln!(code, "\tconn, err := q.db.Connx(ctx)")?;
        writeln!(code, "\tif err != nil {{")?;
        writeln!(
            code,
            "\t\treturn false, {zeros}, fmt.Errorf(\"{name}: failed to open connection: %w\", err)"
        )?;
        writeln!(code, "\t}}")?;
        writeln!(code, "\tdefer conn.Close()")?;
        writeln!(code)?;
        for (target, mapped_type) in bindings.scan_targets.iter().zip(&bindings.result_types) {
            writeln!(code, "\tvar {} {mapped_type}", target.ident)?;
        }
        writeln!(code)?;
        writeln!(
            code,
            "\terr = conn.QueryRowxContext({}).Scan({})",
            arguments.join(", "),
            bindings.scan_target_list()
        )?;
        writeln!(code, "\tif err != nil {{")?;
        writeln!(
            code,
            "\t\treturn false, {zeros}, fmt.Errorf(\"{name}: failed to scan row: %w\", err)"
        )?;
        writeln!(code, "\t}}")?;
        writeln!(code)?;
        writeln!(code, "\treturn true, {values}, nil")?;
        writeln!(code, "}}")?;
        Ok(code)
    }
}

impl CodeGen for GoCodeGen {
    fn push(&mut self, unit: GeneratedUnit) -> Result<(), EmitError> {
        let declarations = [unit.identifier.clone(), query_var(&unit.identifier)];
        for name in &declarations {
            if self.declared.contains(name) {
                return Err(EmitError::NameCollision {
                    name: name.clone(),
                    query: unit.identifier,
                });
            }
        }
        self.declared.extend(declarations);
        self.units.push(unit);
        Ok(())
    }

    fn finalize(&self, timestamp: DateTime<Utc>) -> Result<String, EmitError> {
        if let Some(unit) = self.units.iter().find(|unit| unit.results.is_empty()) {
            return Err(EmitError::EmptyResultSet {
                query: unit.identifier.clone(),
            });
        }
        let mut code = self.header(timestamp);
        for unit in &self.units {
            code.push_str(&self.accessor(unit)?);
        }
        Ok(code)
    }
}
