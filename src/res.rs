use axum::{http::StatusCode, response::{Html, IntoResponse, Response}};

use crate::AppResult;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// 404 page. Used both for missing things and things you aren't allowed to see.
pub fn sorry(what: &str) -> AppResult<Response> {
    Ok((
        StatusCode::NOT_FOUND,
        Html(include_res!(str, "/pages/sorry.html").replace("{what}", &text(what))),
    ).into_response())
}

/// HTML-escaped text for a page slot. Template braces are encoded too so
/// user text can never open another `{placeholder}`.
pub fn text(raw: &str) -> String {
    neuter_braces(&html_escape::encode_safe(raw))
}

/// Like [`text`], for the inside of a double-quoted attribute.
pub fn attribute(raw: &str) -> String {
    neuter_braces(&html_escape::encode_double_quoted_attribute(raw))
}

fn neuter_braces(escaped: &str) -> String {
    escaped.replace('{', "&#123;").replace('}', "&#125;")
}
