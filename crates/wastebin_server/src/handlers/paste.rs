//! Paste HTTP handlers.

use crate::{error::HttpError, naming, AppError, AppState, Database};
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use wastebin_core::PasteStore;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Wastebin</title>
</head>
<body>
    <form action="/make" method="post">
        <textarea name="contents" rows="30" cols="120">"#;

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub load: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MakeForm {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub prefix: Option<String>,
}

/// Run a storage operation on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, HttpError>
where
    F: FnOnce(&Database) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || op(&db))
        .await
        .map_err(|err| AppError::StorageUnavailable(format!("Storage task failed: {}", err)))?
        .map_err(HttpError::from)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn render_page(contents: &str, name: &str) -> String {
    format!(
        "{head}{contents}</textarea><br />\n        \
         <input type=\"text\" name=\"name\" placeholder=\"url name\" value=\"{name}\" /><br />\n        \
         <input type=\"submit\" value=\"Go\">\n    </form>\n</body>\n</html>\n",
        head = PAGE_HEAD,
        contents = escape_html(contents),
        name = escape_html(name),
    )
}

/// Render the edit form, optionally pre-filled with an existing paste.
///
/// # Errors
/// `400` for an invalid `load` name, `404` when it does not exist.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, HttpError> {
    let Some(name) = query.load.filter(|name| !name.is_empty()) else {
        return Ok(Html(render_page("", "")));
    };
    naming::validate_name(&name)?;

    let lookup = name.clone();
    let contents = run_blocking(&state, move |db| db.read(&lookup)).await?;
    Ok(Html(render_page(&contents, &name)))
}

/// Local path for a paste. A leading `/` is percent-encoded so the
/// `Location` header never starts with `//`, which clients read as a host.
fn paste_location(name: &str) -> String {
    match name.strip_prefix('/') {
        Some(rest) => format!("/%2F{}", rest),
        None => format!("/{}", name),
    }
}

/// Create or replace a paste from the form and redirect to it.
pub async fn make_paste(
    State(state): State<AppState>,
    Form(form): Form<MakeForm>,
) -> Result<Redirect, HttpError> {
    naming::validate_name(&form.name)?;

    let MakeForm { name, contents } = form;
    let target = paste_location(&name);
    run_blocking(&state, move |db| db.write(&name, &contents)).await?;
    tracing::debug!("Stored paste at {}", target);
    Ok(Redirect::to(&target))
}

/// Newline-separated names starting with `prefix`.
pub async fn search_pastes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<String, HttpError> {
    let prefix = query.prefix.unwrap_or_default();
    let names = run_blocking(&state, move |db| db.list(&prefix)).await?;
    Ok(names.join("\n"))
}

/// Raw content of a paste.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<String, HttpError> {
    run_blocking(&state, move |db| db.read(&name)).await
}

/// Delete a paste.
pub async fn delete_paste(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<&'static str, HttpError> {
    run_blocking(&state, move |db| db.delete(&name)).await?;
    Ok("OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_location_stays_on_this_host() {
        assert_eq!(paste_location("foo/bar"), "/foo/bar");
        assert_eq!(paste_location("/abc"), "/%2Fabc");
        assert_eq!(paste_location("//abc"), "/%2F/abc");
        assert!(!paste_location("/").starts_with("//"));
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn render_page_embeds_escaped_contents_and_name() {
        let page = render_page("</textarea><b>", "notes/today");
        assert!(page.contains("&lt;/textarea&gt;&lt;b&gt;</textarea>"));
        assert!(page.contains("value=\"notes/today\""));
        assert!(page.contains("action=\"/make\""));
    }
}
