//! HTML front end (Askama templates + HTMX partials)

pub mod handlers;
