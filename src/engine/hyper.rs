use crate::request::Request;
use crate::respond::Respond;
use crate::response_template::ResponseTemplate;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use log::{debug, warn};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The responders produced by the configured plugins, asked in order.
pub(super) type Responders = Vec<Box<dyn Respond>>;

/// The actual HTTP server answering incoming requests according to the configured plugins.
pub(super) async fn run_server(
    listener: TcpListener,
    responders: Arc<Responders>,
    mut shutdown_signal: tokio::sync::oneshot::Receiver<()>,
) {
    let request_handler = move |request: hyper::Request<Incoming>| {
        let responders = responders.clone();
        async move { Ok::<_, Infallible>(handle_request(&responders, request).await) }
    };

    loop {
        let (stream, _) = tokio::select! {
            biased;
            // This future resolves when either:
            // - the sender half of the channel gets dropped (i.e. the `MockEngine` is dropped)
            // - the sender is used, therefore sending a poison pill willingly as a shutdown signal
            _ = &mut shutdown_signal => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept an incoming connection: {}", e);
                    continue;
                }
            },
        };

        let io = TokioIo::new(stream);
        let request_handler = request_handler.clone();
        tokio::task::spawn(async move {
            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(io, service_fn(request_handler))
                .await
            {
                warn!("Failed to serve an incoming connection: {}", e);
            }
        });
    }
    debug!("Mock engine shut down.");
}

async fn handle_request(
    responders: &Responders,
    request: hyper::Request<Incoming>,
) -> hyper::Response<Full<Bytes>> {
    let request = match Request::from_hyper(request).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to read an incoming request: {}", e);
            return ResponseTemplate::new(StatusCode::BAD_REQUEST).generate_response();
        }
    };
    debug!("Handling request:\n{}", request);

    let template = responders
        .iter()
        .find_map(|responder| responder.respond(&request))
        .unwrap_or_else(|| {
            debug!("No responder answered {} {}.", request.method, request.url);
            ResponseTemplate::new(StatusCode::NOT_FOUND)
        });
    template.generate_response()
}
