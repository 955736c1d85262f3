//! Local path rules
//!
//! Remote names are free-form; local paths are built from sanitized names
//! joined with `/`. Uniqueness inside one tree download is enforced by
//! [`PathDeduplicator`], which renames collisions to `<base>_<n><ext>`.

use std::collections::HashMap;

/// Punctuation kept by [`sanitize_name`] in addition to ASCII letters,
/// digits and space
const ALLOWED_PUNCTUATION: &str = "!@#$%^&()-_=+[]{}';.,`~";

/// Replacement for segments that would be empty or navigate the tree
const PLACEHOLDER_SEGMENT: &str = "_";

/// Strips every character outside the allow-list
///
/// The allow-list is ASCII letters, ASCII digits, space and
/// ``!@#$%^&()-_=+[]{}';.,`~``. The result is also the primary sort key for
/// siblings.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || ALLOWED_PUNCTUATION.contains(*c))
        .collect()
}

/// Sanitizes a name for use as one path segment
///
/// Names that sanitize to `""`, `"."` or `".."` become `"_"`.
pub fn path_segment(name: &str) -> String {
    let sanitized = sanitize_name(name);
    match sanitized.as_str() {
        "" | "." | ".." => PLACEHOLDER_SEGMENT.to_string(),
        _ => sanitized,
    }
}

/// Joins a parent path and a child segment
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

/// Splits `path` into `(base, extension)`
///
/// The extension starts at the last `.` of the final segment; a path whose
/// final segment has no dot has an empty extension.
pub fn split_extension(path: &str) -> (&str, &str) {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].rfind('.') {
        Some(dot) => path.split_at(segment_start + dot),
        None => (path, ""),
    }
}

/// Occurrence counter that hands out unique paths
///
/// Owned by the single producer of a tree download; not shared.
#[derive(Debug, Default)]
pub struct PathDeduplicator {
    seen: HashMap<String, u32>,
}

impl PathDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `path` or, if already used, the first free `<base>_<n><ext>`
    ///
    /// Every candidate (including renamed ones) is counted, so a renamed
    /// path that collides with an earlier real name is renamed again.
    pub fn claim(&mut self, path: String) -> String {
        let mut candidate = path;
        loop {
            let count = self.seen.entry(candidate.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                return candidate;
            }
            let n = *count;
            let (base, ext) = split_extension(&candidate);
            candidate = format!("{base}_{n}{ext}");
        }
    }

    /// Number of distinct paths handed out or reserved so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use proptest::prelude::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Report: Q1/Q2 *final*?"), "Report Q1Q2 final");
        assert_eq!(sanitize_name("a!@#$%^&()-_=+[]{}';.,`~z"), "a!@#$%^&()-_=+[]{}';.,`~z");
        assert_eq!(sanitize_name("café <draft>"), "caf draft");
        assert_eq!(sanitize_name("日本語"), "");
    }

    #[test]
    fn test_path_segment_placeholders() {
        assert_eq!(path_segment("日本語"), "_");
        assert_eq!(path_segment("."), "_");
        assert_eq!(path_segment(".."), "_");
        assert_eq!(path_segment("../etc"), "..etc");
        assert_eq!(path_segment("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "R"), "R");
        assert_eq!(join_path("R", "A.txt"), "R/A.txt");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("R/Doc"), ("R/Doc", ""));
        assert_eq!(split_extension("R/Doc.docx"), ("R/Doc", ".docx"));
        assert_eq!(split_extension("R/archive.tar.gz"), ("R/archive.tar", ".gz"));
        assert_eq!(split_extension("R.d/Doc"), ("R.d/Doc", ""));
        assert_eq!(split_extension("R/.hidden"), ("R/", ".hidden"));
    }

    #[test]
    fn test_claim_siblings_with_same_name() {
        let mut dedup = PathDeduplicator::new();

        assert_eq!(dedup.claim("R/Doc".into()), "R/Doc");
        assert_eq!(dedup.claim("R/Doc".into()), "R/Doc_2");
        assert_eq!(dedup.claim("R/Doc".into()), "R/Doc_3");
    }

    #[test]
    fn test_claim_keeps_extension() {
        let mut dedup = PathDeduplicator::new();

        assert_eq!(dedup.claim("R/Doc.docx".into()), "R/Doc.docx");
        assert_eq!(dedup.claim("R/Doc.docx".into()), "R/Doc_2.docx");
    }

    #[test]
    fn test_claim_rechecks_renamed_path() {
        let mut dedup = PathDeduplicator::new();

        assert_eq!(dedup.claim("R/Doc_2".into()), "R/Doc_2");
        assert_eq!(dedup.claim("R/Doc".into()), "R/Doc");
        // "Doc_2" is taken by a real file, so the rename is renamed again
        assert_eq!(dedup.claim("R/Doc".into()), "R/Doc_2_2");
        assert_eq!(dedup.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_claimed_paths_are_unique(
            names in prop::collection::vec("[ab_2]{1,3}(\\.x)?", 1..40)
        ) {
            let mut dedup = PathDeduplicator::new();
            let mut claimed = HashSet::new();
            for name in names {
                let path = dedup.claim(format!("R/{name}"));
                prop_assert!(claimed.insert(path));
            }
        }
    }
}
