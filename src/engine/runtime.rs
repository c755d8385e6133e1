use super::hyper::{run_server, Responders};
use super::{Completion, Deployment, EngineRuntime};
use crate::config::EngineConfiguration;
use crate::error::EngineStartError;
use crate::plugin::PluginConfig;
use log::debug;
use std::sync::{mpsc, Arc};
use std::thread::ThreadId;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

// How long dropping an engine waits for its server loop to wind down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The default [`EngineRuntime`]: each engine gets a dedicated thread running a single-threaded
/// `tokio` runtime, so engines work regardless of the async runtime (if any) of the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct HyperRuntime;

impl EngineRuntime for HyperRuntime {
    fn deploy(
        &self,
        configuration: EngineConfiguration,
        completion: Completion,
    ) -> Result<(), std::io::Error> {
        std::thread::Builder::new()
            .name(format!("mockboot-engine-{}", configuration.listen_port()))
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => return completion.fail(EngineStartError::Runtime(e)),
                };
                runtime.block_on(boot(configuration, completion))
            })?;
        Ok(())
    }
}

/// Load the plugins, bind the listener and report back before serving requests.
async fn boot(configuration: EngineConfiguration, completion: Completion) {
    let responders = match load_responders(&configuration) {
        Ok(responders) => responders,
        Err(e) => return completion.fail(e),
    };
    if completion.is_abandoned() {
        debug!("Nobody is waiting for the engine anymore, not starting it.");
        return;
    }

    let host = configuration.host();
    let port = configuration.listen_port();
    let listener = match TcpListener::bind((host, port)).await {
        Ok(listener) => listener,
        Err(e) => return completion.fail(EngineStartError::bind(host, port, e)),
    };
    let address = match listener.local_addr() {
        Ok(address) => address,
        Err(e) => return completion.fail(EngineStartError::bind(host, port, e)),
    };
    debug!("Mock engine listening on {}.", address);

    let (shutdown_trigger, shutdown_receiver) = oneshot::channel();
    let (stopped_sender, stopped_receiver) = mpsc::channel();
    let guard = ShutdownGuard {
        trigger: Some(shutdown_trigger),
        stopped: stopped_receiver,
        engine_thread: std::thread::current().id(),
    };
    completion.succeed(Deployment::new(address, guard));

    run_server(listener, Arc::new(responders), shutdown_receiver).await;
    // The listener is gone: the port is free again.
    drop(stopped_sender);
}

/// Stops the server when dropped, and waits for it to release its port.
struct ShutdownGuard {
    trigger: Option<oneshot::Sender<()>>,
    stopped: mpsc::Receiver<()>,
    engine_thread: ThreadId,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        // Dropping the sender half of the channel triggers the graceful shutdown of the server.
        self.trigger.take();
        // The guard is dropped on the engine thread itself if nobody was waiting for the
        // engine to start: the server loop has not even started yet.
        if std::thread::current().id() != self.engine_thread {
            let _ = self.stopped.recv_timeout(SHUTDOWN_TIMEOUT);
        }
    }
}

fn load_responders(configuration: &EngineConfiguration) -> Result<Responders, EngineStartError> {
    let configs = PluginConfig::load_all(configuration.config_dirs())?;

    let mut responders = Responders::new();
    for plugin in configuration.plugins() {
        let plugin_configs = configs
            .iter()
            .filter(|config| config.plugin == plugin.name())
            .cloned()
            .collect::<Vec<_>>();
        if plugin_configs.is_empty() {
            return Err(EngineStartError::NoConfiguration {
                plugin: plugin.name().to_string(),
            });
        }

        debug!(
            "Configuring plugin `{}` with {} configuration file(s).",
            plugin.name(),
            plugin_configs.len()
        );
        let responder = plugin
            .configure(plugin_configs, configuration.plugin_args())
            .map_err(|source| EngineStartError::Plugin {
                plugin: plugin.name().to_string(),
                source,
            })?;
        responders.push(responder);
    }
    Ok(responders)
}
