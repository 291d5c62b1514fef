//! MIME helpers shared by the receiver, the artifact route and the client.

use std::path::Path;

/// Strip parameters (`; charset=...`) and surrounding whitespace, then lowercase.
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Whether `content_type` is in `allowed` after normalization of both sides.
pub fn is_allowed(content_type: &str, allowed: &[String]) -> bool {
    let normalized = normalize_mime_type(content_type);
    !normalized.is_empty() && allowed.iter().any(|ct| normalize_mime_type(ct) == normalized)
}

/// Content type for a file name, inferred from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_parameters() {
        assert_eq!(normalize_mime_type("Image/PNG; charset=binary"), "image/png");
        assert_eq!(normalize_mime_type("  video/mp4 "), "video/mp4");
    }

    #[test]
    fn test_is_allowed() {
        let allowed = vec!["image/png".to_string(), "application/pdf".to_string()];
        assert!(is_allowed("image/png", &allowed));
        assert!(is_allowed("IMAGE/PNG;q=1", &allowed));
        assert!(!is_allowed("application/x-executable", &allowed));
        assert!(!is_allowed("", &allowed));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("photo-1-2.JPG"), "image/jpeg");
        assert_eq!(content_type_for("clip.mov"), "video/quicktime");
        assert_eq!(content_type_for("archive.tar.gz"), "application/gzip");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
