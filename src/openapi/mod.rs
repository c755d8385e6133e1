//! The `openapi` plugin: mock the operations declared in OpenAPI 3 or Swagger 2 documents.
//!
//! For every operation the engine answers with the lowest declared 2xx status and, as body,
//! the first example found for it. The plugin also serves the specification itself:
//! - the combined document, as JSON, on [`EngineHandle::combined_specification_url`];
//! - a Swagger UI page over it, on [`EngineHandle::specification_ui_url`].
//!
//! [`EngineHandle::combined_specification_url`]: crate::EngineHandle::combined_specification_url
//! [`EngineHandle::specification_ui_url`]: crate::EngineHandle::specification_ui_url
mod document;
mod routes;
mod ui;

use crate::error::PluginError;
use crate::handle::{COMBINED_SPECIFICATION_PATH, SPECIFICATION_UI_PATH};
use crate::plugin::{Plugin, PluginConfig};
use crate::{Request, Respond, ResponseTemplate};
use http::{Method, StatusCode};
use log::debug;
use routes::Route;
use std::collections::HashMap;

pub(crate) const OPENAPI_PLUGIN_NAME: &str = "openapi";

/// Mock the operations of OpenAPI/Swagger specification documents.
///
/// Configuration files meant for this plugin must point to a specification document:
///
/// ```yaml
/// plugin: openapi
/// specFile: petstore.yaml
/// ```
///
/// It is the plugin used by [`MockEngineBuilder`](crate::MockEngineBuilder) unless
/// you select another one.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenApiPlugin;

impl Plugin for OpenApiPlugin {
    fn name(&self) -> &str {
        OPENAPI_PLUGIN_NAME
    }

    fn configure(
        &self,
        configs: Vec<PluginConfig>,
        _args: &HashMap<String, String>,
    ) -> Result<Box<dyn Respond>, PluginError> {
        let mut documents = vec![];
        for config in &configs {
            let spec_file = config.spec_file_path().ok_or_else(|| {
                PluginError::Invalid(format!(
                    "a configuration file in {} has no `specFile`",
                    config.dir().display()
                ))
            })?;
            debug!("Loading specification {}.", spec_file.display());
            documents.push(document::load(&spec_file)?);
        }

        let mut routes = vec![];
        for document in &documents {
            routes.extend(routes::routes(document)?);
        }
        // Across all documents, routes with fewer path parameters come first:
        // `/pets/mine` wins over `/pets/{petId}`.
        routes.sort_by_key(Route::placeholders);
        let combined = document::combine(&documents);
        let specification_ui = ui::render(&combined);
        let combined_json = serde_json::to_vec_pretty(&combined)
            .map_err(|e| PluginError::Invalid(e.to_string()))?;

        Ok(Box::new(OpenApiResponder {
            routes,
            combined_json,
            specification_ui,
        }))
    }
}

struct OpenApiResponder {
    routes: Vec<Route>,
    combined_json: Vec<u8>,
    specification_ui: String,
}

impl Respond for OpenApiResponder {
    fn respond(&self, request: &Request) -> Option<ResponseTemplate> {
        if request.method == Method::GET {
            let path = request.url.path();
            if path == COMBINED_SPECIFICATION_PATH {
                return Some(
                    ResponseTemplate::new(StatusCode::OK)
                        .set_body_raw(self.combined_json.clone(), "application/json"),
                );
            }
            if path == SPECIFICATION_UI_PATH || path == SPECIFICATION_UI_PATH.trim_end_matches('/')
            {
                return Some(
                    ResponseTemplate::new(StatusCode::OK)
                        .set_body_raw(self.specification_ui.clone(), "text/html; charset=utf-8"),
                );
            }
        }

        self.routes
            .iter()
            .find(|route| route.matches(request))
            .map(Route::response)
    }
}
