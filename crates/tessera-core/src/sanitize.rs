//! Filename sanitization for assembled artifacts.

use rand::Rng;

/// Maximum length of the base name (extension and suffix excluded)
pub const MAX_BASE_NAME_LENGTH: usize = 50;

/// Longest extension kept, dot included; longer ones are treated as part of the base
pub const MAX_EXTENSION_LENGTH: usize = 16;

const FALLBACK_BASE_NAME: &str = "file";

/// Produce a filesystem-safe, collision-resistant name from a client-supplied filename.
///
/// The result has the form `{base}-{unix_millis}-{random}{ext}`, where `base` only holds
/// `[a-z0-9_.-]` and `ext` is the final extension of the original name. The output never
/// contains `..` and stays well under common file name limits.
pub fn sanitize_and_unique(original: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = rand::rng().random_range(0..1_000_000_000u32);
    sanitize_with_suffix(original, millis, random)
}

/// Deterministic core of [`sanitize_and_unique`].
pub fn sanitize_with_suffix(original: &str, millis: i64, random: u32) -> String {
    let cleaned = clean(original, true);

    let extension = match extension_of(&cleaned) {
        "" => clean(extension_of(original), true),
        ext => ext.to_string(),
    };
    let extension = if extension.len() > 1 && extension.len() <= MAX_EXTENSION_LENGTH {
        extension
    } else {
        String::new()
    };

    let mut base = cleaned
        .strip_suffix(extension.as_str())
        .unwrap_or(&cleaned)
        .trim_matches('.')
        .to_string();
    if base.is_empty() {
        let original_stem = original
            .strip_suffix(extension_of(original))
            .unwrap_or(original);
        base = clean(original_stem, false);
    }
    if base.is_empty() {
        base = FALLBACK_BASE_NAME.to_string();
    }

    let base: String = base.chars().take(MAX_BASE_NAME_LENGTH).collect();
    format!("{}-{}-{}{}", base, millis, random, extension)
}

/// Lowercase, collapse whitespace runs into `_` and dot runs into one `.`, and drop
/// anything outside the allow-list.
fn clean(name: &str, keep_dots: bool) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.to_lowercase().chars() {
        if c == '.' && out.ends_with('.') {
            continue;
        }
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        let allowed = c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || c == '_'
            || c == '-'
            || (keep_dots && c == '.');
        if allowed {
            out.push(c);
        }
    }
    out
}

/// Final extension including the dot, ignoring a leading dot and any directory part.
fn extension_of(name: &str) -> &str {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if file_name.chars().all(|c| c == '.') {
        return "";
    }
    match file_name.rfind('.') {
        Some(0) | None => "",
        Some(pos) => &file_name[pos..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_name() {
        assert_eq!(
            sanitize_with_suffix("My Photo.JPG", 1700000000000, 42),
            "my_photo-1700000000000-42.jpg"
        );
    }

    #[test]
    fn test_multi_dot_extension_keeps_last() {
        assert_eq!(
            sanitize_with_suffix("archive.tar.gz", 1, 2),
            "archive.tar-1-2.gz"
        );
    }

    #[test]
    fn test_strips_disallowed_characters() {
        assert_eq!(
            sanitize_with_suffix("../../etc/pa$$wd?.txt", 1, 2),
            "etcpawd-1-2.txt"
        );
        assert_eq!(
            sanitize_with_suffix("Résumé (final)   v2.pdf", 1, 2),
            "rsum_final_v2-1-2.pdf"
        );
    }

    #[test]
    fn test_extension_falls_back_to_original() {
        assert_eq!(sanitize_with_suffix("файл.pdf", 5, 6), "file-5-6.pdf");
    }

    #[test]
    fn test_no_extension_and_trailing_dot() {
        assert_eq!(sanitize_with_suffix("README", 1, 2), "readme-1-2");
        assert_eq!(sanitize_with_suffix("notes.", 1, 2), "notes-1-2");
        assert_eq!(sanitize_with_suffix(".env", 1, 2), "env-1-2");
        assert_eq!(sanitize_with_suffix("", 1, 2), "file-1-2");
    }

    #[test]
    fn test_truncates_long_base_name() {
        let long = format!("{}.png", "a".repeat(200));
        let result = sanitize_with_suffix(&long, 1, 2);
        assert_eq!(result, format!("{}-1-2.png", "a".repeat(MAX_BASE_NAME_LENGTH)));
    }

    #[test]
    fn test_dot_runs_collapse() {
        assert_eq!(
            sanitize_with_suffix("v1..final.pdf", 1, 2),
            "v1.final-1-2.pdf"
        );
        assert_eq!(sanitize_with_suffix("a...b....png", 1, 2), "a.b-1-2.png");
        assert_eq!(sanitize_with_suffix("notes..", 1, 2), "notes-1-2");
        for name in ["a..b.pdf", "x . . y.png", "..hidden..", "a.$.b.pdf", "...."] {
            assert!(!sanitize_and_unique(name).contains(".."), "{}", name);
        }
    }

    #[test]
    fn test_overlong_extension_is_dropped() {
        let name = format!("a.{}", "x".repeat(300));
        let result = sanitize_with_suffix(&name, 1700000000000, 999_999_999);
        assert_eq!(
            result,
            format!("a.{}-1700000000000-999999999", "x".repeat(MAX_BASE_NAME_LENGTH - 2))
        );
        assert!(result.len() < 255);

        // Bounded extensions are kept
        let ext = "m".repeat(MAX_EXTENSION_LENGTH - 1);
        let name = format!("clip.{}", ext);
        assert_eq!(sanitize_with_suffix(&name, 1, 2), format!("clip-1-2.{}", ext));
    }

    #[test]
    fn test_output_length_is_bounded() {
        for name in [
            "b".repeat(1000),
            format!("{}.{}", "c".repeat(400), "d".repeat(400)),
            format!("{}.pdf", ".".repeat(500)),
        ] {
            let result = sanitize_and_unique(&name);
            assert!(result.len() <= MAX_BASE_NAME_LENGTH + 40 + MAX_EXTENSION_LENGTH);
        }
    }

    #[test]
    fn test_output_is_filesystem_safe() {
        for name in ["a b/c\\d.png", "..", "con:nul|*.exe", "tab\tname.mov"] {
            let result = sanitize_and_unique(name);
            assert!(!result.contains('/'));
            assert!(!result.contains('\\'));
            assert!(!result.starts_with('.'));
            assert!(result
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-.".contains(c)));
        }
    }

    #[test]
    fn test_same_name_twice_differs() {
        let first = sanitize_with_suffix("report.pdf", 1000, 1);
        let second = sanitize_with_suffix("report.pdf", 1001, 1);
        assert_ne!(first, second);
        assert!(first.ends_with(".pdf") && second.ends_with(".pdf"));

        let a = sanitize_and_unique("report.pdf");
        let b = sanitize_and_unique("report.pdf");
        assert_ne!(a, b);
    }
}
