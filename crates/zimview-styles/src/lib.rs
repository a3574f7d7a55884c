//! zimview Stylesheets
//!
//! One-shot stylesheet handling for an article, run once before first paint:
//! find the `<link rel="stylesheet">` tags, resolve the archived ones through
//! the store in parallel, and inline them in document order.

mod extract;
mod resolve;

pub use extract::{StylesheetOrigin, StylesheetRef, extract_stylesheets, is_stylesheet_link, strip_stylesheet_links};
pub use resolve::{ResolvedStylesheet, inline_stylesheets, resolve_stylesheets};
