use crate::{Request, ResponseTemplate};

/// Anything that implements `Respond` can answer incoming requests on behalf of a running engine.
///
/// [`Plugin`]s turn their configuration into a `Respond` implementation when the engine starts.
/// For every incoming request the engine asks each responder, in order: the first one returning
/// `Some` wins. If nobody answers, the engine returns a `404`.
///
/// Anonymous functions that take a reference to a [`Request`] as input and return an
/// `Option<ResponseTemplate>` automatically implement `Respond`.
///
/// ```rust
/// use mockboot::{Request, Respond, ResponseTemplate};
///
/// let health_check = |request: &Request| {
///     (request.url.path() == "/health").then(|| ResponseTemplate::new(204))
/// };
/// let request = Request {
///     url: "http://localhost/health".parse().unwrap(),
///     method: http::Method::GET,
///     headers: Default::default(),
///     body: vec![],
/// };
/// assert_eq!(health_check.respond(&request).unwrap().status_code(), 204);
/// ```
///
/// [`Plugin`]: crate::Plugin
pub trait Respond: Send + Sync {
    /// Given a reference to a [`Request`] return the [`ResponseTemplate`] that will be used
    /// as blueprint for the response returned to the client, or `None` to let other responders
    /// have a go.
    fn respond(&self, request: &Request) -> Option<ResponseTemplate>;
}

impl<F> Respond for F
where
    F: Fn(&Request) -> Option<ResponseTemplate>,
    F: Send + Sync,
{
    fn respond(&self, request: &Request) -> Option<ResponseTemplate> {
        self(request)
    }
}
