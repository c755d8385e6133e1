use crate::handle::COMBINED_SPECIFICATION_PATH;
use serde_json::Value;
use std::env;

const DEFAULT_ASSETS: &str = "https://unpkg.com/swagger-ui-dist@5";

/// A Swagger UI page browsing the combined specification.
///
/// The page loads its assets from `MOCKBOOT_SPEC_UI_ASSETS` if set, e.g. to point at a local
/// mirror on machines without internet access.
pub(super) fn render(combined: &Value) -> String {
    let assets = env::var("MOCKBOOT_SPEC_UI_ASSETS").unwrap_or_else(|_| DEFAULT_ASSETS.into());
    let assets = assets.trim_end_matches('/');
    let title = combined
        .pointer("/info/title")
        .and_then(Value::as_str)
        .unwrap_or("Specification");

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="{assets}/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="{assets}/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: "{spec}", dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>
"##,
        title = escape_html(title),
        assets = assets,
        spec = COMBINED_SPECIFICATION_PATH,
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
