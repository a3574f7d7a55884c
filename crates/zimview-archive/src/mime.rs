//! Mime type inference from titles

use crate::title::{ARTICLE_NAMESPACE, in_namespace};

/// Generic fallback type
pub const OCTET_STREAM: &str = "application/octet-stream";

/// True when `mime_type` names a concrete `type/subtype`
pub fn is_specific(mime_type: &str) -> bool {
    match mime_type.split_once('/') {
        Some((kind, sub)) => !kind.is_empty() && !sub.is_empty() && mime_type != OCTET_STREAM,
        None => false,
    }
}

/// Lower-cased extension of a title, ignoring query and fragment
pub fn extension(title: &str) -> Option<String> {
    let path = title.split(['?', '#']).next().unwrap_or(title);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Guess a mime type for any archive title
pub fn guess(title: &str) -> String {
    let Some(ext) = extension(title) else {
        // Articles are stored without an extension
        if in_namespace(title, ARTICLE_NAMESPACE) {
            return "text/html".to_string();
        }
        return OCTET_STREAM.to_string();
    };

    match ext.as_str() {
        "html" | "htm" => "text/html".to_string(),
        "css" => "text/css".to_string(),
        "js" | "mjs" => "application/javascript".to_string(),
        "json" => "application/json".to_string(),
        "txt" => "text/plain".to_string(),
        "woff" => "font/woff".to_string(),
        "woff2" => "font/woff2".to_string(),
        "ttf" => "font/ttf".to_string(),
        "otf" => "font/otf".to_string(),
        _ => image(title),
    }
}

/// Mime type for an image title.
///
/// Short extensions map onto `image/<ext>` with the usual aliases.
pub fn image(title: &str) -> String {
    match extension(title).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("tif") | Some("tiff") => "image/tiff".to_string(),
        Some("ico") => "image/x-icon".to_string(),
        Some("svg") => "image/svg+xml".to_string(),
        Some(ext) if (2..=4).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("image/{}", ext)
        }
        _ => OCTET_STREAM.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("I/m/Sine.svg.png"), Some("png".to_string()));
        assert_eq!(extension("-/s/style.css?v=3"), Some("css".to_string()));
        assert_eq!(extension("I/m/archive.d/noext"), None);
        assert_eq!(extension("I/m/trailing."), None);
    }

    #[test]
    fn test_image_aliases() {
        assert_eq!(image("I/a.JPG"), "image/jpeg");
        assert_eq!(image("I/a.tif"), "image/tiff");
        assert_eq!(image("I/favicon.ico"), "image/x-icon");
        assert_eq!(image("I/m/formula.svg"), "image/svg+xml");
        assert_eq!(image("I/m/photo.webp"), "image/webp");
        assert_eq!(image("I/m/blob"), OCTET_STREAM);
    }

    #[test]
    fn test_guess() {
        assert_eq!(guess("A/Sine.html"), "text/html");
        assert_eq!(guess("-/s/style.css"), "text/css");
        assert_eq!(guess("I/m/x.png"), "image/png");
        assert_eq!(guess("A/Sine"), "text/html");
        assert_eq!(guess("M/Counter"), OCTET_STREAM);
    }

    #[test]
    fn test_is_specific() {
        assert!(is_specific("image/png"));
        assert!(!is_specific(""));
        assert!(!is_specific("image"));
        assert!(!is_specific("image/"));
        assert!(!is_specific(OCTET_STREAM));
    }
}
