//! Web root — per-tool pages and startup bootstrap

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::path::Path as FsPath;
use tracing::{debug, info};

use crate::server::AppState;

pub const DEFAULT_INDEX_HTML: &str = include_str!("../assets/index.html");

/// `GET /tools/<name>` → `<web_root>/tools/<name>.html`
pub async fn tool_page(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if !is_plain_name(&name) {
        debug!("Rejected tool page name {name:?}");
        return StatusCode::NOT_FOUND.into_response();
    }

    let page = state.web_root.join("tools").join(format!("{name}.html"));
    match tokio::fs::read(&page).await {
        Ok(bytes) => Html(bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Single path component with no traversal or hidden-file tricks
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

/// Make sure the web root has a `tools/` directory and an `index.html`
pub fn prepare_web_root(root: &FsPath) -> Result<()> {
    let tools_dir = root.join("tools");
    std::fs::create_dir_all(&tools_dir)
        .with_context(|| format!("Failed to create {}", tools_dir.display()))?;

    let index = root.join("index.html");
    if !index.exists() {
        std::fs::write(&index, DEFAULT_INDEX_HTML)
            .with_context(|| format!("Failed to write {}", index.display()))?;
        info!("Created default {}", index.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::{self, FixedProbe, ScriptedRunner};
    use std::sync::Arc;

    async fn spawn_with_root(root: &FsPath) -> (crate::server::Server, String) {
        prepare_web_root(root).unwrap();
        let state = test_support::state(
            root,
            Arc::new(ScriptedRunner::default()),
            Arc::new(FixedProbe::default()),
        );
        test_support::spawn(state).await
    }

    #[test]
    fn test_plain_names() {
        assert!(is_plain_name("nmap"));
        assert!(is_plain_name("aircrack-ng"));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name(".hidden"));
        assert!(!is_plain_name("../secret"));
        assert!(!is_plain_name("a\\b"));
    }

    #[test]
    fn test_prepare_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        prepare_web_root(dir.path()).unwrap();
        assert!(dir.path().join("tools").is_dir());
        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(index, DEFAULT_INDEX_HTML);
    }

    #[test]
    fn test_prepare_keeps_existing_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>custom</h1>").unwrap();
        prepare_web_root(dir.path()).unwrap();
        prepare_web_root(dir.path()).unwrap();
        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert_eq!(index, "<h1>custom</h1>");
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        let (_server, base) = spawn_with_root(dir.path()).await;

        let response = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), DEFAULT_INDEX_HTML);
    }

    #[tokio::test]
    async fn test_static_asset_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('progour');").unwrap();
        let (_server, base) = spawn_with_root(dir.path()).await;

        let response = reqwest::get(format!("{base}/app.js")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .contains("javascript"));

        let missing = reqwest::get(format!("{base}/nope.css")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_page_served_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let (_server, base) = spawn_with_root(dir.path()).await;
        std::fs::write(dir.path().join("tools/nmap.html"), "<h1>Nmap</h1>").unwrap();

        let response = reqwest::get(format!("{base}/tools/nmap")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert_eq!(response.text().await.unwrap(), "<h1>Nmap</h1>");

        let missing = reqwest::get(format!("{base}/tools/hydra")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_page_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("www");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.html"), "secret").unwrap();
        let (_server, base) = spawn_with_root(&root).await;

        let response = reqwest::get(format!("{base}/tools/..%2F..%2Fsecret"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
