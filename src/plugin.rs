use crate::error::{EngineStartError, PluginError};
use crate::respond::Respond;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE_SUFFIXES: [&str; 3] = ["-config.json", "-config.yaml", "-config.yml"];

/// A plugin decides how a running engine answers requests, given the configuration files found
/// in the engine's configuration directories.
///
/// Each configuration file names the plugin it is meant for (the `plugin` key): when the engine
/// starts, every plugin gets the configuration files carrying its [`name`](Plugin::name).
///
/// ### Example:
/// ```rust
/// use mockboot::{Plugin, PluginConfig, PluginError, Request, Respond, ResponseTemplate};
/// use std::collections::HashMap;
///
/// /// Answers every request with the status code found in its configuration.
/// struct StatusPlugin;
///
/// impl Plugin for StatusPlugin {
///     fn name(&self) -> &str {
///         "status"
///     }
///
///     fn configure(
///         &self,
///         configs: Vec<PluginConfig>,
///         _args: &HashMap<String, String>,
///     ) -> Result<Box<dyn Respond>, PluginError> {
///         let status = configs[0]
///             .extra
///             .get("status")
///             .and_then(|s| s.as_u64())
///             .ok_or_else(|| PluginError::Invalid("missing `status`".into()))?;
///         let status = status as u16;
///         Ok(Box::new(move |_: &Request| Some(ResponseTemplate::new(status))))
///     }
/// }
/// ```
pub trait Plugin: Send + Sync + 'static {
    /// The value of the `plugin` key in the configuration files meant for this plugin.
    fn name(&self) -> &str;

    /// Turn the configuration files meant for this plugin into a responder.
    ///
    /// `configs` is never empty.
    fn configure(
        &self,
        configs: Vec<PluginConfig>,
        args: &HashMap<String, String>,
    ) -> Result<Box<dyn Respond>, PluginError>;
}

/// The content of a plugin configuration file, e.g. `petstore-config.json`:
///
/// ```json
/// { "plugin": "openapi", "specFile": "petstore.yaml" }
/// ```
///
/// Keys other than `plugin` and `specFile` are kept in [`extra`](PluginConfig::extra).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    pub plugin: String,
    #[serde(default)]
    pub spec_file: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    dir: PathBuf,
}

impl PluginConfig {
    /// The directory the configuration file was found in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The location of `specFile`, resolved against the configuration directory.
    pub fn spec_file_path(&self) -> Option<PathBuf> {
        self.spec_file.as_ref().map(|file| self.dir.join(file))
    }

    /// Load all plugin configuration files from the given directories, in directory order and
    /// then by file name.
    pub(crate) fn load_all(dirs: &[PathBuf]) -> Result<Vec<PluginConfig>, EngineStartError> {
        let mut configs = vec![];
        for dir in dirs {
            let invalid = |reason: String| EngineStartError::Configuration {
                path: dir.clone(),
                reason,
            };
            let mut files = std::fs::read_dir(dir)
                .map_err(|e| invalid(e.to_string()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| invalid(e.to_string()))?;
            files.sort();

            for file in files.into_iter().filter(|f| is_config_file(f)) {
                debug!("Loading plugin configuration {}.", file.display());
                let mut config = parse_config_file(&file)?;
                config.dir = dir.clone();
                configs.push(config);
            }
        }
        Ok(configs)
    }
}

fn is_config_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| {
                CONFIG_FILE_SUFFIXES
                    .iter()
                    .any(|suffix| name.ends_with(suffix))
            })
}

fn parse_config_file(path: &Path) -> Result<PluginConfig, EngineStartError> {
    let invalid = |reason: String| EngineStartError::Configuration {
        path: path.to_path_buf(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))
    } else {
        serde_yaml::from_str(&raw).map_err(|e| invalid(e.to_string()))
    }
}
