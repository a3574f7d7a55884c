//! Parallel stylesheet resolution

use smol::LocalExecutor;
use zimview_archive::{ArchiveError, Resource, ResourceStore, fetch};

use crate::extract::{StylesheetOrigin, StylesheetRef, strip_stylesheet_links};

/// A stylesheet after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedStylesheet {
    /// Read from the archive
    Archived { href: String, title: String, css: String },
    /// Not in the archive; kept as a link
    External { href: String },
    /// In the archive namespace but could not be read
    Missing { href: String, title: String },
}

impl ResolvedStylesheet {
    pub fn href(&self) -> &str {
        match self {
            ResolvedStylesheet::Archived { href, .. }
            | ResolvedStylesheet::External { href }
            | ResolvedStylesheet::Missing { href, .. } => href,
        }
    }

    /// Markup placed in the document head; empty for missing sheets
    pub fn to_html(&self) -> String {
        match self {
            ResolvedStylesheet::Archived { href, css, .. } => {
                format!("<style data-archive-href=\"{}\">\n{}\n</style>", escape_attr(href), css)
            }
            ResolvedStylesheet::External { href } => {
                format!("<link rel=\"stylesheet\" href=\"{}\">", escape_attr(href))
            }
            ResolvedStylesheet::Missing { .. } => String::new(),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Resolve every archived stylesheet concurrently.
///
/// The result has one entry per reference, in the order of `refs`, whatever
/// order the reads finish in. A sheet that cannot be read becomes
/// [`ResolvedStylesheet::Missing`]; nothing here fails as a whole.
pub async fn resolve_stylesheets<S: ResourceStore + ?Sized>(
    store: &S,
    refs: &[StylesheetRef],
) -> Vec<ResolvedStylesheet> {
    let mut slots: Vec<Option<Result<Resource, ArchiveError>>> = refs.iter().map(|_| None).collect();
    let pending = refs.iter().filter(|r| r.is_archived()).count();
    tracing::debug!("Resolving {} of {} stylesheet(s) from the archive", pending, refs.len());

    let executor = LocalExecutor::new();
    let (tx, rx) = smol::channel::unbounded::<(usize, Result<Resource, ArchiveError>)>();

    executor
        .run(async {
            for (index, stylesheet) in refs.iter().enumerate() {
                let StylesheetOrigin::Archive { title } = &stylesheet.origin else {
                    continue;
                };
                let tx = tx.clone();
                executor
                    .spawn(async move {
                        let result = fetch(store, title).await;
                        let _ = tx.send((index, result)).await;
                    })
                    .detach();
            }

            for _ in 0..pending {
                match rx.recv().await {
                    Ok((index, result)) => slots[index] = Some(result),
                    Err(_) => break,
                }
            }
        })
        .await;

    let resolved: Vec<ResolvedStylesheet> = refs
        .iter()
        .zip(slots)
        .map(|(stylesheet, slot)| {
            let href = stylesheet.href.clone();
            match (&stylesheet.origin, slot) {
                (StylesheetOrigin::External, _) => ResolvedStylesheet::External { href },
                (StylesheetOrigin::Archive { title }, Some(Ok(resource))) => ResolvedStylesheet::Archived {
                    href,
                    title: title.clone(),
                    css: resource.text(),
                },
                (StylesheetOrigin::Archive { title }, Some(Err(err))) => {
                    tracing::warn!("Could not find stylesheet {}: {}", title, err);
                    ResolvedStylesheet::Missing { href, title: title.clone() }
                }
                (StylesheetOrigin::Archive { title }, None) => ResolvedStylesheet::Missing { href, title: title.clone() },
            }
        })
        .collect();

    tracing::info!("All CSS resolved");
    resolved
}

/// Replace the stylesheet links of `html` with the resolved sheets.
///
/// The sheets go just before `</head>`, or at the top when there is no head.
pub fn inline_stylesheets(html: &str, resolved: &[ResolvedStylesheet]) -> String {
    let stripped = strip_stylesheet_links(html);
    let block: String = resolved
        .iter()
        .map(ResolvedStylesheet::to_html)
        .filter(|markup| !markup.is_empty())
        .map(|markup| format!("\n{}", markup))
        .collect();
    if block.is_empty() {
        return stripped;
    }

    let block = format!("{}\n", block);
    match stripped.to_ascii_lowercase().find("</head>") {
        Some(at) => {
            let mut out = String::with_capacity(stripped.len() + block.len());
            out.push_str(&stripped[..at]);
            out.push_str(&block);
            out.push_str(&stripped[at..]);
            out
        }
        None => format!("{}{}", block, stripped),
    }
}
