//! Local preview server for an exported mirror
//!
//! Serves the mirror directory over HTTP using the same URL-to-path
//! mapping the exporter wrote it with, so a rewritten site previews
//! exactly as it was crawled. Successive ports are tried when the chosen
//! one is bound.

use crate::{Result, SiterakeError};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// How many successive ports to try when the requested one is in use.
const PORT_RETRIES: u16 = 5;

/// Serves `dir` on 127.0.0.1, starting at `port`. Blocks until the server
/// stops.
pub async fn run(dir: PathBuf, port: u16, open_browser: bool) -> Result<()> {
    if !dir.is_dir() {
        return Err(SiterakeError::Serve(format!(
            "directory '{}' does not exist. Run 'siterake export' first",
            dir.display()
        )));
    }

    let mut listener = None;
    let mut bound_addr = String::new();
    for offset in 0..PORT_RETRIES {
        let addr = format!("127.0.0.1:{}", port + offset);
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(l) => {
                listener = Some(l);
                bound_addr = addr;
                break;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::warn!("port {} is in use, trying next port", port + offset);
            }
            Err(e) => return Err(SiterakeError::Io(e)),
        }
    }
    let Some(listener) = listener else {
        return Err(SiterakeError::Serve(format!(
            "could not find an available port after {} retries starting from {}",
            PORT_RETRIES, port
        )));
    };

    let url = format!("http://{}", bound_addr);
    println!("Serving static files from {} on {}", dir.display(), url);

    if open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!("could not open browser: {}", e);
        }
    }

    let app = Router::new().fallback(serve_file).with_state(dir);

    axum::serve(listener, app)
        .await
        .map_err(|e| SiterakeError::Serve(e.to_string()))?;
    Ok(())
}

async fn serve_file(State(root): State<PathBuf>, uri: Uri) -> Response {
    let Some(path) = resolve(&root, uri.path()) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(body) => {
            let content_type = content_type_for(&path);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                Body::from(body),
            )
                .into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Maps a request path onto the mirror, mirroring the exporter's layout:
/// directory-style URLs resolve to their `index.html`.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8_lossy();

    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        // No escaping the mirror root.
        if segment == ".." {
            return None;
        }
        path.push(segment);
    }

    let last = decoded.rsplit('/').next().unwrap_or("");
    if decoded.ends_with('/') || !last.contains('.') {
        path.push("index.html");
    }
    Some(path)
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
