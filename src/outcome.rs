use crate::engine::CompletionReceiver;
use crate::error::EngineStartError;
use crate::generator::GeneratedConfig;
use crate::handle::EngineHandle;
use crate::mock_engine::MockEngine;
use log::info;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// The pending result of [`MockEngineBuilder::start`](crate::MockEngineBuilder::start).
///
/// It resolves once, when the engine runtime reports whether the engine started: to a running
/// [`MockEngine`] on success, to an [`EngineStartError`] otherwise.
///
/// The engine starts whether or not the outcome is awaited; dropping the `StartOutcome` shuts
/// the engine down as soon as it is up.
///
/// It is runtime-agnostic: await it from `tokio`, `async-std` or any other executor, or block
/// on it with [`wait`](StartOutcome::wait).
#[must_use = "the engine is shut down as soon as it starts if its `StartOutcome` is dropped"]
#[derive(Debug)]
pub struct StartOutcome {
    completion: CompletionReceiver,
    pending: Option<PendingEngine>,
}

/// What we know about the engine before the runtime reports back.
#[derive(Debug)]
struct PendingEngine {
    host: String,
    port: u16,
    config_dirs: Vec<PathBuf>,
    generated: Option<GeneratedConfig>,
}

impl StartOutcome {
    pub(crate) fn new(
        completion: CompletionReceiver,
        host: String,
        port: u16,
        config_dirs: Vec<PathBuf>,
        generated: Option<GeneratedConfig>,
    ) -> Self {
        Self {
            completion,
            pending: Some(PendingEngine {
                host,
                port,
                config_dirs,
                generated,
            }),
        }
    }

    /// Block the current thread until the engine runtime reports back.
    ///
    /// Do not call it from within an async task: `.await` the `StartOutcome` instead.
    pub fn wait(self) -> Result<MockEngine, EngineStartError> {
        futures::executor::block_on(self)
    }
}

impl Future for StartOutcome {
    type Output = Result<MockEngine, EngineStartError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let completion = ready!(Pin::new(&mut this.completion).poll(cx));
        let pending = this
            .pending
            .take()
            .expect("`StartOutcome` polled after completion");

        let deployment = match completion {
            Ok(Ok(deployment)) => deployment,
            Ok(Err(e)) => return Poll::Ready(Err(e)),
            // The runtime dropped the `Completion` without using it.
            Err(_) => return Poll::Ready(Err(EngineStartError::Abandoned)),
        };

        let handle = EngineHandle::new(pending.host, pending.port);
        info!(
            "Started mock engine\n  Specification UI: {}\n  Config dir(s): {:?}",
            handle.specification_ui_url(),
            pending.config_dirs
        );
        Poll::Ready(Ok(MockEngine::new(handle, deployment, pending.generated)))
    }
}
