use std::{
    error::Error,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use clap::Parser;
use sql_bind_core::{
    QueryUnit, SqlBind, SqlBindBuilder,
    backend::{Backend, Dialect},
    inference::Introspect,
};

use crate::{
    codegen::{CodeGen, go::GoCodeGen, json::JsonCodeGen},
    config::{self, CodeGenerator, ConfigError, SqlBindConfig, TomlConfig},
};

#[derive(Parser, Debug, Clone)]
#[command(about = "Generate accessors for a directory of query files", long_about = None)]
#[must_use]
pub struct Generate {
    #[arg(long, help = "Directory holding the query files")]
    dir: PathBuf,
    #[arg(long, help = "Configuration file, sql-bind.toml is used when present")]
    config: Option<PathBuf>,
    #[arg(long, help = "Show debug information")]
    debug: bool,
}

impl Generate {
    pub fn run(self) -> Result<(), Box<dyn Error>> {
        super::init_logging(self.debug)?;
        let toml_config = TomlConfig::load(self.config.as_deref())?;
        let config = SqlBindConfig::from_toml_config(self.dir, toml_config);

        let units = read_query_units(&config.source, &config.extension)?;
        tracing::info!(
            "Found {} query file(s) in {}",
            units.len(),
            config.source.display()
        );
        let connection_string = config::connection_string()?;

        let mut sql_bind = SqlBindBuilder::default();
        sql_bind
            .embed_dir(config.embed_dir.as_str())
            .extension(config.extension.as_str())
            .dialect(Dialect::of(&connection_string));
        let sql_bind = sql_bind.build();

        let mut codegen: Box<dyn CodeGen> = match &config.mode {
            CodeGenerator::Json => Box::new(JsonCodeGen::default()),
            CodeGenerator::Go { package, context } => {
                Box::new(GoCodeGen::new(package.as_str(), *context))
            }
        };

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(generate_with_connection(
            &connection_string,
            &sql_bind,
            units,
            codegen.as_mut(),
            &config.target,
        ))?;
        tracing::info!("Written {}", config.target.display());
        Ok(())
    }
}

async fn generate_with_connection(
    connection_string: &str,
    sql_bind: &SqlBind,
    units: Vec<QueryUnit>,
    codegen: &mut dyn CodeGen,
    target: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut backend = Backend::connect(connection_string)
        .await
        .map_err(|err| format!("Connecting to the database failed: {err}"))?;
    tracing::debug!("Connected to {}", backend.dialect());
    let result = generate(&mut backend, sql_bind, units, codegen, target, Utc::now()).await;
    backend.close().await;
    result
}

/// Regular files of `dir` carrying `extension`, ordered by file name.
pub fn read_query_units(dir: &Path, extension: &str) -> Result<Vec<QueryUnit>, ConfigError> {
    let unreadable_directory = |source| ConfigError::UnreadableDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = vec![];
    for entry in std::fs::read_dir(dir).map_err(unreadable_directory)? {
        let path = entry.map_err(unreadable_directory)?.path();
        if !path.is_file() {
            tracing::info!("Skipping {path:?} as it is not a file.");
            continue;
        }
        if path.extension().is_none_or(|ext| ext != extension) {
            tracing::info!("Skipping {path:?} as it is not a .{extension} file.");
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        let raw_text = std::fs::read_to_string(&path).map_err(|source| {
            ConfigError::UnreadableFile {
                path: path.clone(),
                source,
            }
        })?;
        let unit = path
            .file_stem()
            .and_then(|stem| QueryUnit::new(&stem.to_string_lossy(), raw_text));
        let Some(unit) = unit else {
            return Err(ConfigError::InvalidFileName { path });
        };
        units.push(unit);
    }
    Ok(units)
}

/// Describes every unit, renders them and only then writes `target`.
pub async fn generate<I: Introspect>(
    introspector: &mut I,
    sql_bind: &SqlBind,
    units: Vec<QueryUnit>,
    codegen: &mut dyn CodeGen,
    target: &Path,
    timestamp: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    for unit in units {
        let identifier = unit.identifier.clone();
        let generated = match sql_bind.generate(introspector, unit).await {
            Ok(generated) => generated,
            Err(err) => {
                tracing::error!("Check for {identifier} failed\n {err}");
                return Err(err.into());
            }
        };
        tracing::info!("Check for {identifier} successful!");
        codegen.push(generated)?;
    }
    let code = codegen.finalize(timestamp)?;
    std::fs::write(target, code)?;
    Ok(())
}
