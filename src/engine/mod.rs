//! All bits and pieces concerning the runtime that actually serves a mock engine.
//!
//! The launcher only ever talks to an [`EngineRuntime`]: it submits an [`EngineConfiguration`]
//! and waits for exactly one signal on the [`Completion`] it handed over alongside it.
//!
//! [`HyperRuntime`], the default runtime, runs each engine on a dedicated thread with its own
//! single-threaded `tokio` runtime, serving HTTP with `hyper` - see the `hyper` sub-module.
//!
//! [`EngineConfiguration`]: crate::EngineConfiguration
mod hyper;
mod runtime;

pub use runtime::HyperRuntime;

use crate::config::EngineConfiguration;
use crate::error::EngineStartError;
use std::any::Any;
use std::fmt;
use std::net::SocketAddr;
use tokio::sync::oneshot;

pub(crate) type CompletionReceiver = oneshot::Receiver<Result<Deployment, EngineStartError>>;

/// The execution substrate mock engines run on.
pub trait EngineRuntime: Send + Sync {
    /// Start an engine described by `configuration`.
    ///
    /// Startup happens asynchronously: the runtime must report its outcome, once, through
    /// `completion`. Dropping `completion` without resolving it is reported to the caller as
    /// [`EngineStartError::Abandoned`].
    ///
    /// An `Err` is only returned if the runtime cannot even accept the deployment (e.g. it
    /// failed to spawn a worker) - `completion` is dropped in that case.
    fn deploy(
        &self,
        configuration: EngineConfiguration,
        completion: Completion,
    ) -> Result<(), std::io::Error>;
}

/// The single-use channel an [`EngineRuntime`] reports the outcome of a deployment through.
///
/// Both [`succeed`](Completion::succeed) and [`fail`](Completion::fail) consume the
/// `Completion`: an outcome can be reported at most once.
pub struct Completion(oneshot::Sender<Result<Deployment, EngineStartError>>);

impl Completion {
    pub(crate) fn channel() -> (Self, CompletionReceiver) {
        let (sender, receiver) = oneshot::channel();
        (Self(sender), receiver)
    }

    /// The engine is up and listening.
    ///
    /// If nobody is waiting for the outcome anymore, `deployment` is dropped right away,
    /// shutting the engine down.
    pub fn succeed(self, deployment: Deployment) {
        if self.0.send(Ok(deployment)).is_err() {
            log::debug!("Nobody is waiting for the engine anymore, shutting it down.");
        }
    }

    /// The engine could not start.
    pub fn fail(self, error: EngineStartError) {
        log::debug!("Engine failed to start: {}", error);
        let _ = self.0.send(Err(error));
    }

    /// `true` if the party waiting for the outcome has gone away.
    pub fn is_abandoned(&self) -> bool {
        self.0.is_closed()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// A successfully started engine, as reported by its [`EngineRuntime`].
///
/// The engine keeps running as long as its `Deployment` is alive: dropping it drops the
/// runtime-provided guard, which must trigger the engine shutdown.
pub struct Deployment {
    address: SocketAddr,
    _guard: Box<dyn Any + Send>,
}

impl Deployment {
    /// `address` is the socket address the engine is listening on; `guard` is dropped when the
    /// engine must shut down.
    pub fn new(address: SocketAddr, guard: impl Any + Send) -> Self {
        Self {
            address,
            _guard: Box::new(guard),
        }
    }

    pub fn address(&self) -> &SocketAddr {
        &self.address
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
