use std::fmt;

use http::{HeaderMap, Method};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use url::Url;

pub(crate) type DynError = Box<dyn std::error::Error + Send + Sync>;

/// An incoming request to a running mock engine.
///
/// Each [`Respond`](crate::Respond) implementation gets an immutable reference to a `Request`
/// in its [`respond`](crate::Respond::respond) method.
///
/// ### Implementation notes:
/// We can't hand `hyper::Request` to responders directly: reading its body consumes it.
/// We perform the extraction once when the request arrives, store the result and pass an
/// immutable reference to it to each responder in turn.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Request {
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub(crate) async fn from_hyper(
        request: hyper::Request<hyper::body::Incoming>,
    ) -> Result<Request, DynError> {
        let (parts, body) = request.into_parts();
        let url = match parts.uri.authority() {
            Some(_) => parts.uri.to_string(),
            None => format!("http://localhost{}", parts.uri),
        }
        .parse()?;

        let body = body.collect().await?.to_bytes();

        Ok(Self {
            url,
            method: parts.method,
            headers: parts.headers,
            body: body.to_vec(),
        })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.method, self.url)?;
        for name in self.headers.keys() {
            let values = self
                .headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<_>>();
            writeln!(f, "{}: {}", name, values.join(","))?;
        }
        if let Ok(body) = std::str::from_utf8(&self.body) {
            writeln!(f, "{}", body)
        } else {
            writeln!(
                f,
                "Body is likely binary (invalid utf-8) size is {} bytes",
                self.body.len()
            )
        }
    }
}
