use super::document::{base_path, resolve};
use crate::error::PluginError;
use crate::{Request, ResponseTemplate};
use http::{HeaderName, HeaderValue, Method, StatusCode};
use regex::Regex;
use serde_json::{Map, Value};

const OPERATIONS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];
const JSON: &str = "application/json";
const TEXT: &str = "text/plain";

/// An operation declared in a specification document, with the response it is mocked with.
#[derive(Debug)]
pub(super) struct Route {
    method: Method,
    pattern: Regex,
    placeholders: usize,
    response: ResponseTemplate,
}

impl Route {
    pub(super) fn matches(&self, request: &Request) -> bool {
        request.method == self.method && self.pattern.is_match(request.url.path())
    }

    pub(super) fn response(&self) -> ResponseTemplate {
        self.response.clone()
    }

    /// How many path parameters the route template has.
    pub(super) fn placeholders(&self) -> usize {
        self.placeholders
    }
}

/// Build a route for each operation of `document`, in declaration order.
pub(super) fn routes(document: &Value) -> Result<Vec<Route>, PluginError> {
    let placeholder = Regex::new(r"\{[^/{}]+\}").map_err(invalid)?;
    let base_path = base_path(document);

    let mut routes = vec![];
    let paths = document.get("paths").and_then(Value::as_object);
    for (template, item) in paths.into_iter().flatten() {
        let item = resolve(document, item);
        let pattern = path_pattern(&placeholder, &base_path, template)?;
        for operation in OPERATIONS {
            let Some(operation_spec) = item.get(operation) else {
                continue;
            };
            let method = Method::from_bytes(operation.to_ascii_uppercase().as_bytes())
                .map_err(invalid)?;
            routes.push(Route {
                method,
                pattern: pattern.clone(),
                placeholders: placeholder.find_iter(template).count(),
                response: mock_response(document, operation_spec)?,
            });
        }
    }
    Ok(routes)
}

fn invalid(e: impl std::fmt::Display) -> PluginError {
    PluginError::Invalid(e.to_string())
}

fn path_pattern(
    placeholder: &Regex,
    base_path: &str,
    template: &str,
) -> Result<Regex, PluginError> {
    let mut pattern = format!("^{}", regex::escape(base_path));
    let mut last = 0;
    for m in placeholder.find_iter(template) {
        pattern.push_str(&regex::escape(&template[last..m.start()]));
        pattern.push_str("[^/]+");
        last = m.end();
    }
    pattern.push_str(&regex::escape(template[last..].trim_end_matches('/')));
    pattern.push_str("/?$");
    Regex::new(&pattern).map_err(invalid)
}

/// The response of the lowest declared 2xx status (`default` counts as 200), with the first
/// example we can find as body.
fn mock_response(document: &Value, operation: &Value) -> Result<ResponseTemplate, PluginError> {
    let operation = resolve(document, operation);
    let responses = operation.get("responses").and_then(Value::as_object);

    let selected = responses.and_then(|responses| {
        let lowest_success = responses
            .iter()
            .filter_map(|(status, response)| Some((status.parse::<u16>().ok()?, response)))
            .filter(|(status, _)| (200..300).contains(status))
            .min_by_key(|(status, _)| *status);
        lowest_success.or_else(|| responses.get("default").map(|response| (200, response)))
    });
    let Some((status, response)) = selected else {
        return Ok(ResponseTemplate::new(StatusCode::OK));
    };

    let status = StatusCode::from_u16(status).map_err(invalid)?;
    let response = resolve(document, response);
    let example = if document.get("swagger").is_some() {
        swagger_example(document, operation, response)
    } else {
        openapi_example(document, response)
    };

    let template = response_headers(document, response)
        .into_iter()
        .fold(ResponseTemplate::new(status), |template, (name, value)| {
            template.insert_header(name, value)
        });
    Ok(match example {
        Some((mime, body)) if mime == JSON => template.set_body_json(body),
        Some((mime, Value::String(body))) if mime == TEXT => template.set_body_string(body),
        Some((mime, Value::String(body))) if !is_json(&mime) => {
            template.set_body_raw(body, &mime)
        }
        Some((mime, body)) => {
            let body = serde_json::to_vec(&body).map_err(invalid)?;
            template.set_body_raw(body, &mime)
        }
        None => template,
    })
}

/// The declared response headers we have an example (or a default) for.
///
/// Names or values that are not valid HTTP are skipped.
fn response_headers(document: &Value, response: &Value) -> Vec<(HeaderName, HeaderValue)> {
    let Some(headers) = response.get("headers").and_then(Value::as_object) else {
        return vec![];
    };
    headers
        .iter()
        .filter_map(|(name, header)| {
            let header = resolve(document, header);
            let example = header
                .get("example")
                .or_else(|| schema_example(document, header.get("schema")?))
                .or_else(|| header.get("default"))?;
            let value = match example {
                Value::String(value) => value.clone(),
                other => other.to_string(),
            };
            Some((
                HeaderName::from_bytes(name.as_bytes()).ok()?,
                HeaderValue::from_str(&value).ok()?,
            ))
        })
        .collect()
}

fn openapi_example(document: &Value, response: &Value) -> Option<(String, Value)> {
    let content = response.get("content")?.as_object()?;
    let (mime, media) = preferred_media_type(content)?;
    let media = resolve(document, media);

    let example = media
        .get("example")
        .or_else(|| {
            let (_, first) = media.get("examples")?.as_object()?.iter().next()?;
            resolve(document, first).get("value")
        })
        .or_else(|| schema_example(document, media.get("schema")?))?;
    Some((mime, example.clone()))
}

fn swagger_example(
    document: &Value,
    operation: &Value,
    response: &Value,
) -> Option<(String, Value)> {
    if let Some(examples) = response.get("examples").and_then(Value::as_object) {
        if let Some((mime, example)) = preferred_media_type(examples) {
            return Some((mime, example.clone()));
        }
    }

    let mime = operation
        .get("produces")
        .or_else(|| document.get("produces"))
        .and_then(Value::as_array)
        .and_then(|produces| {
            let produces = produces.iter().filter_map(Value::as_str);
            produces
                .clone()
                .find(|mime| *mime == JSON)
                .or_else(|| produces.clone().next())
        })
        .unwrap_or(JSON);
    let example = schema_example(document, response.get("schema")?)?;
    Some((mime.to_string(), example.clone()))
}

/// `application/json` if declared, the first declared media type otherwise.
fn preferred_media_type(by_media_type: &Map<String, Value>) -> Option<(String, &Value)> {
    match by_media_type.get(JSON) {
        Some(value) => Some((JSON.to_string(), value)),
        None => by_media_type
            .iter()
            .next()
            .map(|(mime, value)| (mime.clone(), value)),
    }
}

fn schema_example<'a>(document: &'a Value, schema: &'a Value) -> Option<&'a Value> {
    resolve(document, schema).get("example")
}

fn is_json(mime: &str) -> bool {
    mime == JSON || mime.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(method: Method, path: &str) -> Request {
        Request {
            url: format!("http://localhost{}", path).parse().unwrap(),
            method,
            headers: Default::default(),
            body: vec![],
        }
    }

    #[test]
    fn parameters_match_exactly_one_segment() {
        let placeholder = Regex::new(r"\{[^/{}]+\}").unwrap();
        let pattern = path_pattern(&placeholder, "/v1", "/pets/{petId}/toys/{toyId}").unwrap();

        assert!(pattern.is_match("/v1/pets/1/toys/ball"));
        assert!(pattern.is_match("/v1/pets/1/toys/ball/"));
        assert!(!pattern.is_match("/pets/1/toys/ball"));
        assert!(!pattern.is_match("/v1/pets/1/toys"));
        assert!(!pattern.is_match("/v1/pets/1/2/toys/ball"));
    }

    #[test]
    fn template_characters_are_matched_literally() {
        let placeholder = Regex::new(r"\{[^/{}]+\}").unwrap();
        let pattern = path_pattern(&placeholder, "", "/files/{name}.json").unwrap();

        assert!(pattern.is_match("/files/report.json"));
        assert!(!pattern.is_match("/files/report-json"));
    }

    #[test]
    fn the_lowest_success_status_is_picked() {
        let document = json!({
            "openapi": "3.0.0",
            "paths": {
                "/things": {
                    "put": {
                        "responses": {
                            "400": { "description": "bad" },
                            "204": { "description": "updated" },
                            "201": {
                                "description": "created",
                                "content": {
                                    "text/plain": { "example": "done" }
                                }
                            }
                        }
                    }
                }
            }
        });

        let routes = routes(&document).unwrap();

        assert_eq!(routes.len(), 1);
        assert!(routes[0].matches(&request(Method::PUT, "/things")));
        assert!(!routes[0].matches(&request(Method::GET, "/things")));
        assert_eq!(routes[0].response().status_code(), StatusCode::CREATED);
    }

    #[test]
    fn default_responses_count_as_ok() {
        let document = json!({
            "swagger": "2.0",
            "paths": {
                "/health": {
                    "get": { "responses": { "default": { "description": "fine" } } }
                }
            }
        });

        let routes = routes(&document).unwrap();

        assert_eq!(routes[0].response().status_code(), StatusCode::OK);
    }
}
