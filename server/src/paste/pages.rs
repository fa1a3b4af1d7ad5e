//! Browser-facing HTML pages.
//!
//! GET  /  new paste form
//! POST /  create with a generated key, redirect to it
//! GET  /{key}  latest content plus a form to append a version
//! POST /{key}  create-or-append under `key`, redirect back

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::error::PasteError;
use crate::paste::{keys, run_blocking};
use crate::state::AppState;

/// Shown in place of content that the current server key cannot decrypt.
pub const DECRYPTION_FAILED_NOTICE: &str = "[DECRYPTION FAILED: Wrong server encryption key]";

#[derive(Debug, Deserialize)]
pub struct PasteForm {
    pub content: Option<String>,
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #1a1a2e; color: #e0e0e0; max-width: 900px; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ color: #fff; }}
        a {{ color: #7fb3ff; }}
        textarea {{ width: 100%; min-height: 320px; background: #16213e; color: #e0e0e0; border: 1px solid #0f3460; border-radius: 8px; padding: 12px; font-family: monospace; font-size: 0.95rem; box-sizing: border-box; }}
        .btn {{ background: #0f3460; color: #fff; border: none; padding: 10px 28px; border-radius: 8px; font-size: 1rem; margin-top: 0.75rem; cursor: pointer; }}
        .btn:hover {{ background: #1a4a7a; }}
        .key {{ font-family: monospace; background: #0f3460; padding: 4px 8px; border-radius: 4px; }}
        .notice {{ color: #ff8080; }}
    </style>
</head>
<body>
{body}
</body>
</html>"#,
        title = html_escape(title),
        body = body,
    )
}

fn index_page() -> String {
    layout(
        "New paste",
        r#"    <h1>New paste</h1>
    <form method="post" action="/">
        <textarea name="content" placeholder="Paste your text here" autofocus></textarea>
        <button class="btn" type="submit">Save</button>
    </form>"#,
    )
}

fn paste_page(key: &str, content: &str, notice: Option<&str>) -> String {
    let escaped_key = html_escape(key);
    let notice_html = notice
        .map(|n| format!("    <p class=\"notice\">{}</p>\n", html_escape(n)))
        .unwrap_or_default();
    let body = format!(
        r#"    <h1>Paste <span class="key">{key}</span></h1>
{notice}    <form method="post" action="/{key}">
        <textarea name="content">{content}</textarea>
        <button class="btn" type="submit">Save new version</button>
    </form>
    <p><a href="/">New paste</a> · <a href="/api/get/{key}">JSON</a></p>"#,
        key = escaped_key,
        notice = notice_html,
        content = html_escape(content),
    );
    layout(&format!("Paste {}", key), &body)
}

/// GET /
pub async fn index() -> Html<String> {
    Html(index_page())
}

/// POST /
///
/// Blank content re-renders the empty form.
pub async fn create_paste(State(state): State<AppState>, Form(form): Form<PasteForm>) -> Response {
    let content = form.content.unwrap_or_default();
    let store = state.store.clone();

    match run_blocking(move || store.create_with_generated_key(&content)).await {
        Ok(key) => {
            tracing::info!("Created paste {}", key);
            Redirect::to(&format!("/{}", key)).into_response()
        }
        Err(PasteError::EmptyContent) => Html(index_page()).into_response(),
        Err(e) => error_page(e),
    }
}

/// GET /{key}
///
/// An unknown key still renders an (empty) editor so that the first POST can
/// claim it, but with a 404 status.
pub async fn view_paste(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    if !keys::is_valid_key(&key) {
        return error_page(PasteError::NotFound { key });
    }

    let store = state.store.clone();
    let lookup_key = key.clone();
    match run_blocking(move || store.get_latest(&lookup_key)).await {
        Ok(content) => Html(paste_page(&key, &content, None)).into_response(),
        Err(PasteError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Html(paste_page(
                &key,
                "",
                Some("This paste does not exist yet. Saving will create it."),
            )),
        )
            .into_response(),
        Err(e @ PasteError::Decode(_)) => (
            e.status_code(),
            Html(paste_page(&key, DECRYPTION_FAILED_NOTICE, Some(e.public_message()))),
        )
            .into_response(),
        Err(e) => error_page(e),
    }
}

/// POST /{key}
///
/// Blank content is ignored and the current view is shown again.
pub async fn append_paste(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Form(form): Form<PasteForm>,
) -> Response {
    if !keys::is_valid_key(&key) {
        return error_page(PasteError::NotFound { key });
    }

    let content = form.content.unwrap_or_default();
    let store = state.store.clone();
    let write_key = key.clone();
    match run_blocking(move || store.create_or_append(&write_key, &content)).await {
        Ok(()) | Err(PasteError::EmptyContent) => Redirect::to(&format!("/{}", key)).into_response(),
        Err(e) => error_page(e),
    }
}

fn error_page(e: PasteError) -> Response {
    if let PasteError::StorageUnavailable(detail) = &e {
        tracing::error!("Storage failure: {}", detail);
    }
    let body = format!(
        "    <h1>{}</h1>\n    <p><a href=\"/\">New paste</a></p>",
        html_escape(e.public_message())
    );
    (e.status_code(), Html(layout("Error", &body))).into_response()
}
