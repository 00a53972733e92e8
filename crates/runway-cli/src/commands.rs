//! File handling and rendering behind each subcommand.

use std::fs;
use std::path::{Path, PathBuf};

use runway_core::diagram::to_diagram;
use runway_core::{accept, AllowedColumns, DataModel, ModelDocument, ModelHistory};
use runway_cypher::{IngestionExporter, IngestionStrategy};

use crate::config::RunwayConfig;
use crate::error::{CliError, Result};

/// What an export subcommand prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Export {
    Constraints,
    Script,
    LoaderConfig,
    Document,
    Diagram,
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read allowed columns: a JSON array, or an object of file name to array.
pub fn read_columns(path: &Path) -> Result<AllowedColumns> {
    serde_json::from_str(&read_file(path)?).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a model document and build it.
pub fn read_model(path: &Path) -> Result<DataModel> {
    let doc = ModelDocument::from_json(&read_file(path)?).map_err(|source| CliError::InvalidModel {
        path: path.to_path_buf(),
        source,
    })?;
    DataModel::from_document(&doc).map_err(|source| CliError::InvalidModel {
        path: path.to_path_buf(),
        source,
    })
}

/// Open a saved history, or start an empty one when there is none yet.
pub fn open_history(path: Option<&Path>) -> Result<ModelHistory> {
    match path {
        Some(path) if path.exists() => {
            let history = ModelHistory::load_json(path)?;
            tracing::debug!(path = %path.display(), versions = history.len(), "Opened history");
            Ok(history)
        }
        _ => Ok(ModelHistory::new()),
    }
}

/// Validate each model file in order and append it as a new version.
///
/// Stops at the first model with violations; earlier models stay appended.
pub fn append_models(
    history: &mut ModelHistory,
    models: &[PathBuf],
    columns: Option<&AllowedColumns>,
) -> Result<()> {
    if models.is_empty() {
        return Ok(());
    }
    let columns =
        columns.ok_or_else(|| CliError::Usage("--columns is required with --model".to_string()))?;

    for path in models {
        let model = read_model(path)?;
        let validated = accept(model, columns).map_err(|violations| CliError::Rejected {
            path: path.clone(),
            violations,
        })?;
        history.append(validated);
    }
    Ok(())
}

/// Render one version of the history.
pub fn render(
    export: Export,
    history: &ModelHistory,
    version: i64,
    strategy: IngestionStrategy,
    config: &RunwayConfig,
) -> Result<String> {
    let exporter = IngestionExporter::for_version(history, version)?;

    let text = match export {
        Export::Constraints => exporter.export_constraints(),
        Export::Script => exporter.export_ingestion_script(strategy, config.batch_sizes)?,
        Export::LoaderConfig => exporter
            .export_loader_config(strategy, &config.loader_options())?
            .to_yaml()?,
        Export::Document => history.to_structured_document(version)?.to_json_pretty()?,
        Export::Diagram => serde_json::to_string_pretty(&to_diagram(exporter.model()))? + "\n",
    };
    Ok(text)
}
