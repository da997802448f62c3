//! The dashboard UI resource served to hosts.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::warn;

/// URI every tool result points at.
pub const RESOURCE_URI: &str = "ui://netwatch/health-dashboard.html";
/// MIME type hosts use to recognise an embeddable app.
pub const MIME_TYPE: &str = "text/html;profile=mcp-app";

/// The HTML bundle for the interactive dashboard.
#[derive(Debug, Clone)]
pub struct UiResource {
    path: PathBuf,
}

impl UiResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The bundle contents, or a placeholder page if it has not been built.
    pub async fn html(&self) -> String {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(html) => html,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Dashboard bundle unavailable");
                fallback_page(&self.path)
            }
        }
    }

    /// Entry for `resources/list`.
    pub fn descriptor(&self) -> Value {
        json!({
            "uri": RESOURCE_URI,
            "name": "health-dashboard",
            "title": "Network Health Dashboard",
            "mimeType": MIME_TYPE,
        })
    }

    /// Result for `resources/read`.
    pub async fn contents(&self) -> Value {
        let html = self.html().await;
        json!({
            "contents": [{
                "uri": RESOURCE_URI,
                "mimeType": MIME_TYPE,
                "text": html,
            }]
        })
    }
}

/// `_meta` block attached to tool descriptors and results.
pub fn ui_meta(app_only: bool) -> Value {
    let mut ui = json!({ "resourceUri": RESOURCE_URI });
    if app_only {
        ui["visibility"] = json!(["app"]);
    }
    json!({
        "ui": ui,
        "ui/resourceUri": RESOURCE_URI,
    })
}

fn fallback_page(path: &Path) -> String {
    format!(
        "<!DOCTYPE html>
<html>
<head><title>Dashboard Not Built</title></head>
<body>
<h1>Dashboard UI Not Found</h1>
<p>The dashboard HTML file was not found at: {}</p>
<p>Build the UI bundle or set UI_HTML_PATH.</p>
</body>
</html>",
        html_escape(&path.display().to_string())
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_serves_bundle_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body>dash</body></html>").unwrap();

        let resource = UiResource::new(file.path());
        assert_eq!(resource.html().await, "<html><body>dash</body></html>");

        let contents = resource.contents().await;
        assert_eq!(contents["contents"][0]["uri"], RESOURCE_URI);
        assert_eq!(contents["contents"][0]["mimeType"], MIME_TYPE);
        assert_eq!(contents["contents"][0]["text"], "<html><body>dash</body></html>");
    }

    #[tokio::test]
    async fn test_missing_bundle_falls_back() {
        let resource = UiResource::new("/nonexistent/<dash>.html");
        let html = resource.html().await;
        assert!(html.contains("Dashboard Not Built"));
        assert!(html.contains("&lt;dash&gt;"));
    }

    #[test]
    fn test_ui_meta() {
        assert_eq!(ui_meta(true)["ui"]["visibility"][0], "app");
        assert!(ui_meta(false)["ui"].get("visibility").is_none());
        assert_eq!(ui_meta(false)["ui/resourceUri"], RESOURCE_URI);
    }
}
