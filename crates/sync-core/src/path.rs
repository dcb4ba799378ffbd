//! Dotted-path helpers shared by the schema converter and the statement builder.
//!
//! A path is an ordered list of segments from a document (or schema) root.
//! Externally paths are written dotted (`addresses.address.zip`); internally
//! they are kept as `Vec<String>` so prefix checks never confuse `addr` with
//! `address`.

use std::collections::HashMap;

/// Returns true when `path` begins with every segment of `prefix`.
///
/// An empty prefix matches every path, and a path always starts with itself.
pub fn array_starts_with<T: PartialEq>(path: &[T], prefix: &[T]) -> bool {
    path.len() >= prefix.len() && path.iter().zip(prefix).all(|(a, b)| a == b)
}

/// Split a dotted path into its segments.
///
/// An empty string yields an empty path (the root).
pub fn parse_path(dotted: &str) -> Vec<String> {
    if dotted.is_empty() {
        return Vec::new();
    }
    dotted.split('.').map(str::to_string).collect()
}

/// Join path segments with `.`.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

/// Parent segments of a path (everything but the last segment).
pub fn parent_path<T>(path: &[T]) -> &[T] {
    match path.split_last() {
        Some((_, parent)) => parent,
        None => path,
    }
}

/// Returns true when any segment of the dotted path is an array index.
///
/// `foo.0.bar` has a numeric segment; `foo.bar` and `foo0.bar` do not.
pub fn has_numeric_segment(dotted: &str) -> bool {
    dotted
        .split('.')
        .skip(1)
        .any(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}

/// Dotted representation of every path that occurs more than once.
///
/// Results are reported once each, in order of first repetition.
pub fn find_duplicate_paths<'a, I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen: HashMap<&'a [String], usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for path in paths {
        let count = seen.entry(path).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(join_path(path));
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_array_starts_with() {
        assert!(array_starts_with(&[1, 2, 3], &[1, 2]));
        assert!(array_starts_with(&[1, 2, 3], &[1, 2, 3]));
        assert!(array_starts_with(&[1, 2, 3], &[]));
        assert!(!array_starts_with(&[1, 2], &[1, 2, 3]));
        assert!(!array_starts_with(&[1, 3, 3], &[1, 2]));
    }

    #[test]
    fn test_array_starts_with_segment_boundaries() {
        let path = segs(&["addresses", "street"]);
        assert!(!array_starts_with(&path, &segs(&["addr"])));
        assert!(array_starts_with(&path, &segs(&["addresses"])));
    }

    #[test]
    fn test_parse_and_join_path() {
        assert_eq!(parse_path("a.b.c"), segs(&["a", "b", "c"]));
        assert_eq!(parse_path("a"), segs(&["a"]));
        assert!(parse_path("").is_empty());
        assert_eq!(join_path(&segs(&["a", "b", "c"])), "a.b.c");
        assert_eq!(join_path::<String>(&[]), "");
    }

    #[test]
    fn test_parent_path() {
        let path = segs(&["a", "b", "c"]);
        assert_eq!(parent_path(&path), &path[..2]);
        assert!(parent_path(&segs(&["a"])).is_empty());
        assert!(parent_path::<String>(&[]).is_empty());
    }

    #[test]
    fn test_has_numeric_segment() {
        assert!(has_numeric_segment("foo.0.bar"));
        assert!(has_numeric_segment("foo.12"));
        assert!(!has_numeric_segment("foo.bar.baz"));
        assert!(!has_numeric_segment("foo.b4r"));
        assert!(!has_numeric_segment("foo"));
    }

    #[test]
    fn test_find_duplicate_paths() {
        let paths = [
            segs(&["name"]),
            segs(&["description"]),
            segs(&["name"]),
            segs(&["a", "b"]),
            segs(&["a", "b"]),
            segs(&["name"]),
        ];
        let dups = find_duplicate_paths(paths.iter().map(Vec::as_slice));
        assert_eq!(dups, vec!["name".to_string(), "a.b".to_string()]);
    }

    #[test]
    fn test_find_duplicate_paths_none() {
        let paths = [segs(&["a"]), segs(&["a", "b"]), segs(&["b"])];
        assert!(find_duplicate_paths(paths.iter().map(Vec::as_slice)).is_empty());
    }
}
