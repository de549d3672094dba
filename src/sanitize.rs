//! Project identifier sanitization.
//!
//! The caller-supplied project id names both the staging directory and the
//! published preview directory, so it must only ever be usable as a single
//! path segment. Sanitization is the sole gate preventing path traversal or
//! absolute-path injection through the identifier.

/// Fallback token used when the caller supplies no usable identifier.
const DEFAULT_PROJECT_ID: &str = "project";

/// Maximum length of a sanitized identifier.
const MAX_PROJECT_ID_LEN: usize = 60;

/// Normalizes an arbitrary caller-supplied project id into a safe token.
///
/// Every character outside `[A-Za-z0-9_-]` is replaced with `_`, the result
/// is truncated to [`MAX_PROJECT_ID_LEN`] characters, and an absent or empty
/// id becomes `"project"`. Always succeeds; the output matches
/// `^[A-Za-z0-9_-]{1,60}$`.
pub fn sanitize_project_id(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => DEFAULT_PROJECT_ID,
    };

    raw.chars()
        .take(MAX_PROJECT_ID_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_safe_identifiers() {
        assert_eq!(sanitize_project_id(Some("my-app_01")), "my-app_01");
    }

    #[test]
    fn replaces_unsafe_characters() {
        assert_eq!(sanitize_project_id(Some("my app!")), "my_app_");
        assert_eq!(sanitize_project_id(Some("a/b\\c")), "a_b_c");
        assert_eq!(sanitize_project_id(Some("héllo")), "h_llo");
    }

    #[test]
    fn traversal_sequences_become_inert() {
        let id = sanitize_project_id(Some("../../etc"));
        assert_eq!(id, "______etc");
        assert!(!id.contains('/'));
        assert!(!id.contains('.'));
    }

    #[test]
    fn absent_or_empty_yields_default() {
        assert_eq!(sanitize_project_id(None), "project");
        assert_eq!(sanitize_project_id(Some("")), "project");
    }

    #[test]
    fn truncates_to_sixty_characters() {
        let long = "x".repeat(200);
        let id = sanitize_project_id(Some(&long));
        assert_eq!(id.len(), 60);
    }

    #[test]
    fn output_always_matches_allowlist() {
        for input in ["", "ok", "päth/../x", "\0\n\t", "名前"] {
            let id = sanitize_project_id(Some(input));
            assert!(!id.is_empty());
            assert!(id.len() <= 60);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }
}
