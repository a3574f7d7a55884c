//! Embedded reference decoding
//!
//! Documents reference archive resources with relative or root-relative URLs
//! (`../I/m/Sine.png`, `/-/s/style.css?v=2`). Those are resolved against the
//! referencing article's location inside a private URL space, then
//! percent-decoded into a store title.

use percent_encoding::percent_decode_str;
use url::Url;

const ARCHIVE_SCHEME: &str = "zim";
const ARCHIVE_HOST: &str = "archive";

/// Namespace prefix of article titles
pub const ARTICLE_NAMESPACE: &str = "A/";

/// Store title referenced by `reference` from inside `article_title`.
///
/// Returns `None` for references that leave the archive (absolute URLs with
/// another scheme, protocol-relative URLs, `data:` URIs) or that resolve to an
/// empty title. Query strings and fragments are dropped.
pub fn resolve_reference(article_title: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let root = Url::parse(&format!("{}://{}/", ARCHIVE_SCHEME, ARCHIVE_HOST)).ok()?;
    let base = root.join(article_title).ok()?;
    let resolved = base.join(reference).ok()?;
    if resolved.scheme() != ARCHIVE_SCHEME || resolved.host_str() != Some(ARCHIVE_HOST) {
        return None;
    }

    let path = resolved.path().trim_start_matches('/');
    let title = percent_decode_str(path).decode_utf8().ok()?;
    if title.is_empty() || title.ends_with('/') {
        None
    } else {
        Some(title.into_owned())
    }
}

/// Is `title` inside the given namespace prefix
pub fn in_namespace(title: &str, namespace: &str) -> bool {
    title.starts_with(namespace)
}
