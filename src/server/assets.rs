//! Embedded static assets using rust-embed.

use rust_embed::Embed;

/// Static assets embedded in the binary.
#[derive(Embed)]
#[folder = "src/assets/"]
pub struct StaticAssets;

/// Get the content type for a file based on its extension.
pub fn content_type(path: &str) -> &'static str {
    if path.ends_with(".css") {
        "text/css; charset=utf-8"
    } else if path.ends_with(".js") {
        "application/javascript; charset=utf-8"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else if path.ends_with(".ico") {
        "image/x-icon"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_assets_contains_styles() {
        assert!(StaticAssets::get("styles.css").is_some());
    }

    #[test]
    fn test_static_assets_contains_scripts() {
        assert!(StaticAssets::get("app.js").is_some());
        assert!(StaticAssets::get("share.js").is_some());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("styles.css"), "text/css; charset=utf-8");
        assert_eq!(
            content_type("app.js"),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(content_type("favicon.svg"), "image/svg+xml");
        assert_eq!(content_type("unknown.xyz"), "application/octet-stream");
    }
}
