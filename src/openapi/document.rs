use crate::error::PluginError;
use serde_json::{Map, Value};
use std::path::Path;
use url::Url;

// Enough for any sane chain of references, low enough to bail out of cycles.
const MAX_REF_DEPTH: usize = 32;

/// Load an OpenAPI 3 or Swagger 2 document, in YAML or JSON.
pub(super) fn load(path: &Path) -> Result<Value, PluginError> {
    let parse_error = |reason: String| PluginError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|source| PluginError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document: Value = if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_str(&raw).map_err(|e| parse_error(e.to_string()))?
    } else {
        serde_yaml::from_str(&raw).map_err(|e| parse_error(e.to_string()))?
    };

    if document.get("openapi").is_none() && document.get("swagger").is_none() {
        return Err(parse_error(
            "not an OpenAPI or Swagger document: `openapi`/`swagger` version is missing".into(),
        ));
    }
    if !document.get("paths").map_or(false, Value::is_object) {
        return Err(parse_error("`paths` must be an object".into()));
    }
    Ok(document)
}

/// Merge all documents into a single one.
///
/// A single document is returned as is. Otherwise paths and reusable components of later
/// documents are added to the first one; on clashes the first definition wins.
pub(super) fn combine(documents: &[Value]) -> Value {
    let (first, others) = match documents.split_first() {
        Some((first, [])) => return first.clone(),
        Some(split) => split,
        None => return Value::Object(Map::new()),
    };

    let mut combined = first.clone();
    for document in others {
        merge_object(&mut combined, document, &["paths"]);
        merge_object(&mut combined, document, &["definitions"]);
        if let Some(Value::Object(components)) = document.get("components") {
            for kind in components.keys() {
                merge_object(&mut combined, document, &["components", kind.as_str()]);
            }
        }
    }
    if let Some(info) = combined.get_mut("info").and_then(Value::as_object_mut) {
        info.insert("title".into(), Value::from("Combined specification"));
    }
    combined
}

fn merge_object(target: &mut Value, source: &Value, keys: &[&str]) {
    let Some(source) = keys
        .iter()
        .try_fold(source, |value, key| value.get(*key))
        .and_then(Value::as_object)
    else {
        return;
    };

    let mut target = target;
    for key in keys {
        target = match target {
            Value::Object(object) => object
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }
    if let Some(target) = target.as_object_mut() {
        for (key, value) in source {
            target.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// Follow local `$ref`s (e.g. `#/components/schemas/Pet`) until a concrete value is reached.
///
/// Unresolvable or remote references resolve to the referencing value itself.
pub(super) fn resolve<'a>(root: &'a Value, value: &'a Value) -> &'a Value {
    let mut current = value;
    for _ in 0..MAX_REF_DEPTH {
        let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
            return current;
        };
        match reference
            .strip_prefix('#')
            .and_then(|pointer| root.pointer(pointer))
        {
            Some(target) => current = target,
            None => return current,
        }
    }
    current
}

/// The path prefix every operation of the document is served under.
///
/// Swagger 2 uses `basePath`, OpenAPI 3 the path of the first `servers` entry.
/// The prefix never ends with a `/`: the root prefix is the empty string.
pub(super) fn base_path(document: &Value) -> String {
    let raw = if document.get("swagger").is_some() {
        document
            .get("basePath")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    } else {
        document
            .pointer("/servers/0")
            .map(server_path)
            .unwrap_or_default()
    };
    raw.trim_end_matches('/').to_string()
}

/// The path component of an OpenAPI 3 server, with its variables set to their default.
///
/// e.g. `{scheme}://api.example.com/{version}` with `version` defaulting to `v1` is `/v1`.
fn server_path(server: &Value) -> String {
    let Some(url) = server.get("url").and_then(Value::as_str) else {
        return String::new();
    };
    let variables = server.get("variables");
    let mut expanded = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(start) = rest.find('{') {
        let Some(length) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + length];
        expanded.push_str(&rest[..start]);
        let default = variables
            .and_then(|variables| variables.pointer(&format!("/{}/default", name)))
            .and_then(Value::as_str);
        // A scheme or host without a default still leaves a usable path behind.
        expanded.push_str(default.unwrap_or("unknown"));
        rest = &rest[start + length + 1..];
    }
    expanded.push_str(rest);

    if expanded.starts_with('/') {
        return expanded;
    }
    match Url::parse(&expanded) {
        Ok(url) => url.path().to_string(),
        // Relative server urls, e.g. `v1`, are relative to the root.
        Err(_) => format!("/{}", expanded),
    }
}
