//! REST handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde_json::{Value, json};

use crate::content::FileContent;
use crate::tree::FileNode;

use super::ServerState;
use super::error::ApiError;

/// `GET /api/files`
pub async fn list_files(State(state): State<ServerState>) -> Result<Json<FileNode>, ApiError> {
    let tree = state.indexer.build_tree_async().await?;
    Ok(Json(tree))
}

/// `GET /api/file/{*path}`
///
/// The path parameter arrives percent-decoded.
pub async fn get_file(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<Json<FileContent>, ApiError> {
    let resolved = state.guard.resolve(&path)?;
    let content = state.accessor.read_file(&resolved).await?;
    Ok(Json(content))
}

/// `GET /api/file/`: the root itself, which is never a document.
pub async fn get_root_file(state: State<ServerState>) -> Result<Json<FileContent>, ApiError> {
    get_file(state, Path(String::new())).await
}

/// `GET /api/asset/{*path}`
pub async fn get_asset(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let resolved = state.guard.resolve(&path)?;
    let asset = state.accessor.read_asset(&resolved).await?;
    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.bytes).into_response())
}

/// `GET /api/asset/`
pub async fn get_root_asset(state: State<ServerState>) -> Result<Response, ApiError> {
    get_asset(state, Path(String::new())).await
}

/// `GET /api/health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Fallback when no front-end bundle is configured.
pub async fn index_page() -> impl IntoResponse {
    (StatusCode::OK, Html(INDEX_HTML))
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>mdview</title>
<style>
body { font-family: system-ui, sans-serif; margin: 2rem; display: flex; gap: 2rem; }
nav { min-width: 16rem; }
nav a { display: block; cursor: pointer; }
pre { white-space: pre-wrap; }
</style>
</head>
<body>
<nav id="tree"></nav>
<main><pre id="content">Select a document.</pre></main>
<script>
let current = null;
function walk(node, out) {
  for (const child of node.children || []) {
    if (child.type === "file") out.push(child.path); else walk(child, out);
  }
  return out;
}
async function loadTree() {
  const tree = await (await fetch("/api/files")).json();
  const nav = document.getElementById("tree");
  nav.replaceChildren(...walk(tree, []).map(path => {
    const a = document.createElement("a");
    a.textContent = path;
    a.onclick = () => open(path);
    return a;
  }));
}
async function open(path) {
  current = path;
  const res = await fetch("/api/file/" + path.split("/").map(encodeURIComponent).join("/"));
  const body = await res.json();
  document.getElementById("content").textContent = res.ok ? body.content : body.message;
}
const ws = new WebSocket((location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/ws");
ws.onmessage = msg => {
  const event = JSON.parse(msg.data);
  if (event.type !== "file-changed") loadTree();
  if (event.path === current) {
    if (event.type === "file-removed") document.getElementById("content").textContent = "Removed.";
    else open(current);
  }
};
loadTree();
</script>
</body>
</html>
"#;
