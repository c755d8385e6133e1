use crate::error::SetupError;
use crate::plugin::Plugin;
use crate::port::allocate_port;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Engines only ever listen on the loopback interface.
pub(crate) const HOST: &str = "127.0.0.1";

/// Everything an [`EngineRuntime`](crate::EngineRuntime) needs to know to start an engine.
///
/// A fresh `EngineConfiguration` is assembled for every launch and handed over to the runtime
/// by value: there is no process-wide configuration that two launches could step on.
#[derive(Clone)]
pub struct EngineConfiguration {
    host: String,
    listen_port: u16,
    plugins: Vec<Arc<dyn Plugin>>,
    plugin_args: HashMap<String, String>,
    config_dirs: Vec<PathBuf>,
}

impl EngineConfiguration {
    /// Assemble the configuration of a new engine: loopback host, a freshly allocated port,
    /// the selected plugin and the absolute location of each configuration directory.
    pub(crate) fn assemble(
        plugin: Arc<dyn Plugin>,
        configuration_dirs: &[PathBuf],
    ) -> Result<Self, SetupError> {
        let listen_port = allocate_port(HOST).map_err(SetupError::PortAllocation)?;
        let config_dirs = configuration_dirs
            .iter()
            .map(|dir| resolve_configuration_dir(dir))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            host: HOST.to_string(),
            listen_port,
            plugins: vec![plugin],
            plugin_args: HashMap::new(),
            config_dirs,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port the engine must listen on.
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn plugin_args(&self) -> &HashMap<String, String> {
        &self.plugin_args
    }

    /// Absolute paths of the directories holding the plugin configuration files.
    pub fn config_dirs(&self) -> &[PathBuf] {
        &self.config_dirs
    }
}

impl fmt::Debug for EngineConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfiguration")
            .field("host", &self.host)
            .field("listen_port", &self.listen_port)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("plugin_args", &self.plugin_args)
            .field("config_dirs", &self.config_dirs)
            .finish()
    }
}

fn resolve_configuration_dir(dir: &Path) -> Result<PathBuf, SetupError> {
    let resolution_error = |source| SetupError::ConfigurationResolution {
        path: dir.to_path_buf(),
        source,
    };
    let resolved = dir.canonicalize().map_err(resolution_error)?;
    if !resolved.is_dir() {
        return Err(resolution_error(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a directory",
        )));
    }
    Ok(resolved)
}
