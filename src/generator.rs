use crate::error::GenerationError;
use crate::openapi::OPENAPI_PLUGIN_NAME;
use log::debug;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Documents are kept out of the scanned directory: their names may end in `-config.yaml` too.
const SPECS_DIR: &str = "specs";

/// Turns specification documents into a configuration directory an engine can load.
pub trait SpecificationAdapter: Send + Sync {
    fn generate_config(
        &self,
        specification_files: &[PathBuf],
    ) -> Result<GeneratedConfig, GenerationError>;
}

/// A configuration directory produced by a [`SpecificationAdapter`].
///
/// Temporary directories are deleted when the `GeneratedConfig` is dropped: the launcher
/// hands it over to the [`MockEngine`](crate::MockEngine), so the directory lives exactly as
/// long as the engine serving it.
pub struct GeneratedConfig {
    path: PathBuf,
    _temporary: Option<TempDir>,
}

impl GeneratedConfig {
    /// A directory removed, with its content, when the `GeneratedConfig` is dropped.
    pub fn temporary(dir: TempDir) -> Self {
        Self {
            path: dir.path().to_path_buf(),
            _temporary: Some(dir),
        }
    }

    /// A directory left untouched when the `GeneratedConfig` is dropped.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _temporary: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for GeneratedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedConfig")
            .field("path", &self.path)
            .field("temporary", &self._temporary.is_some())
            .finish()
    }
}

/// The default [`SpecificationAdapter`].
///
/// It copies each OpenAPI/Swagger document into the `specs` sub-directory of a fresh temporary
/// directory, and writes an `openapi` plugin configuration file pointing at it:
///
/// ```json
/// { "plugin": "openapi", "specFile": "specs/petstore.yaml" }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenApiConfigGenerator;

impl SpecificationAdapter for OpenApiConfigGenerator {
    fn generate_config(
        &self,
        specification_files: &[PathBuf],
    ) -> Result<GeneratedConfig, GenerationError> {
        let dir = tempfile::Builder::new()
            .prefix("mockboot-")
            .tempdir()
            .map_err(|source| GenerationError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        let specs_dir = dir.path().join(SPECS_DIR);
        std::fs::create_dir(&specs_dir).map_err(|source| GenerationError::Io {
            path: specs_dir.clone(),
            source,
        })?;

        let mut taken_documents = HashSet::new();
        let mut taken_configs = HashSet::new();
        for specification_file in specification_files {
            check_document(specification_file)?;

            // Documents with the same name may come from different directories.
            let file_name = file_name(specification_file)?;
            let file_name = claim(&mut taken_documents, file_name.clone(), |attempt| {
                format!("{}-{}", attempt, file_name)
            });
            // `petstore.yaml` and `petstore.json` share a stem.
            let stem = file_name
                .rsplit_once('.')
                .map_or(file_name.as_str(), |(stem, _)| stem)
                .to_string();
            let stem = claim(&mut taken_configs, stem.clone(), |attempt| {
                format!("{}-{}", stem, attempt)
            });

            let target = specs_dir.join(&file_name);
            std::fs::copy(specification_file, &target).map_err(|source| GenerationError::Io {
                path: specification_file.clone(),
                source,
            })?;

            let config_file = dir.path().join(format!("{}-config.json", stem));
            let config = json!({
                "plugin": OPENAPI_PLUGIN_NAME,
                "specFile": format!("{}/{}", SPECS_DIR, file_name),
            });
            std::fs::write(&config_file, serde_json::to_vec_pretty(&config)?).map_err(
                |source| GenerationError::Io {
                    path: config_file.clone(),
                    source,
                },
            )?;
            debug!(
                "Generated {} for {}.",
                config_file.display(),
                specification_file.display()
            );
        }

        Ok(GeneratedConfig::temporary(dir))
    }
}

/// `name` if nobody took it yet, the first free `rename(attempt)` otherwise.
fn claim(taken: &mut HashSet<String>, name: String, rename: impl Fn(usize) -> String) -> String {
    if taken.insert(name.clone()) {
        return name;
    }
    let mut attempt = 1;
    loop {
        let candidate = rename(attempt);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        attempt += 1;
    }
}

fn file_name(path: &Path) -> Result<String, GenerationError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| GenerationError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
}

/// Reject documents that are not readable YAML or JSON before the engine gets to see them.
fn check_document(path: &Path) -> Result<(), GenerationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let is_json = match extension.as_deref() {
        Some("json") => true,
        Some("yaml") | Some("yml") => false,
        _ => {
            return Err(GenerationError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let raw = std::fs::read_to_string(path).map_err(|source| GenerationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = if is_json {
        serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<Value>(&raw).map_err(|e| e.to_string())
    };
    parsed.map(|_| ()).map_err(|reason| GenerationError::Malformed {
        path: path.to_path_buf(),
        reason,
    })
}
