//! URL to local path mapping with prefix stripping.
//!
//! Each URL's path component becomes a relative on-disk path. Configured
//! prefixes, plus an optionally auto-detected longest common prefix, are
//! stripped segment-wise so `/foo/bar` and `/foobar/baz` never falsely
//! share `/foo`. Resolution is a batch operation because auto-detection
//! needs every path in the run up front.

use std::path::PathBuf;

use tracing::{debug, warn};
use url::Url;

/// Result of mapping one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// Relative destination path, no leading separator.
    Relative(PathBuf),
    /// The URL cannot be mapped; non-fatal, the caller decides whether to
    /// skip.
    Unmappable {
        /// Why the URL has no usable path.
        reason: String,
    },
}

impl ResolvedPath {
    fn unmappable(reason: impl Into<String>) -> Self {
        Self::Unmappable {
            reason: reason.into(),
        }
    }
}

/// Batch URL-to-path resolver.
///
/// Owns only the per-run prefix decision; construct one per batch.
#[derive(Debug, Clone)]
pub struct PathMapper {
    /// Effective prefix set: explicit prefixes plus the auto-detected one,
    /// each as a list of path segments.
    prefixes: Vec<Vec<String>>,
}

impl PathMapper {
    /// Resolves every URL in the batch to a relative path, in input order.
    ///
    /// `explicit_prefixes` and the auto-detected prefix compose: the auto
    /// prefix joins the effective set and the longest leading-segment match
    /// wins, so explicit configuration is never overridden, merely joined.
    /// Empty prefix strings are no-ops.
    #[must_use]
    pub fn resolve(
        urls: &[String],
        explicit_prefixes: &[String],
        auto_detect: bool,
    ) -> Vec<ResolvedPath> {
        let mut prefixes: Vec<Vec<String>> = explicit_prefixes
            .iter()
            .map(|p| segments(p))
            .filter(|segs| !segs.is_empty())
            .collect();

        if auto_detect {
            let auto = auto_prefix(urls);
            if auto.is_empty() {
                debug!("no common prefix detected");
            } else {
                debug!(prefix = %auto.join("/"), "auto-detected common prefix");
                prefixes.push(auto);
            }
        }

        let mapper = Self { prefixes };
        urls.iter().map(|url| mapper.resolve_one(url)).collect()
    }

    /// Resolves a single URL against the effective prefix set.
    fn resolve_one(&self, url: &str) -> ResolvedPath {
        let Some(path_segments) = url_path_segments(url) else {
            warn!(url, "URL has no parseable path");
            return ResolvedPath::unmappable(format!("no parseable path in URL: {url}"));
        };
        if path_segments.is_empty() {
            warn!(url, "URL path has no segments");
            return ResolvedPath::unmappable(format!("URL path has no segments: {url}"));
        }

        // Apply only the longest matching prefix, never more than one, so
        // overlapping prefixes cannot double-strip.
        let stripped = self
            .prefixes
            .iter()
            .filter(|prefix| is_leading_match(prefix.as_slice(), &path_segments))
            .max_by_key(|prefix| prefix.len())
            .map_or(&path_segments[..], |longest| {
                &path_segments[longest.len()..]
            });

        // Stripping everything still maps to a deterministic filename: the
        // final original segment.
        let remaining: &[String] = if stripped.is_empty() {
            std::slice::from_ref(&path_segments[path_segments.len() - 1])
        } else {
            stripped
        };

        ResolvedPath::Relative(remaining.iter().collect())
    }
}

/// Longest common segment-wise prefix across all parseable URL paths.
///
/// Empty when the batch has fewer than 2 URLs or when no leading segment is
/// shared by every path.
fn auto_prefix(urls: &[String]) -> Vec<String> {
    let paths: Vec<Vec<String>> = urls.iter().filter_map(|u| url_path_segments(u)).collect();
    // A prefix shared by fewer than 2 paths is meaningless; this also
    // covers single-URL batches.
    if paths.len() < 2 {
        return Vec::new();
    }
    let first = &paths[0];

    let mut common = first.len();
    for path in &paths[1..] {
        common = common
            .min(path.len())
            .min(count_shared(first, path));
        if common == 0 {
            return Vec::new();
        }
    }
    first[..common].to_vec()
}

/// Number of leading segments `a` and `b` share.
fn count_shared(a: &[String], b: &[String]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Whether `prefix` is a leading-segment match of `path`.
fn is_leading_match(prefix: &[String], path: &[String]) -> bool {
    prefix.len() <= path.len() && count_shared(prefix, path) == prefix.len()
}

/// Splits a path-like string into non-empty segments.
fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The path segments of a URL, or `None` when the URL does not parse as an
/// absolute URL with a host.
fn url_path_segments(url: &str) -> Option<Vec<String>> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str()?;
    Some(segments(parsed.path()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn strings(list: &[&str]) -> Vec<String> {
        urls(list)
    }

    fn relative(path: &str) -> ResolvedPath {
        ResolvedPath::Relative(PathBuf::from(path))
    }

    // ==================== Basic Resolution Tests ====================

    #[test]
    fn test_resolve_no_prefixes_uses_full_path() {
        let result = PathMapper::resolve(
            &urls(&["https://api.epa.gov/easey/bulk-files/data.csv"]),
            &[],
            false,
        );
        assert_eq!(result, vec![relative("easey/bulk-files/data.csv")]);
    }

    #[test]
    fn test_resolve_empty_batch() {
        let result = PathMapper::resolve(&[], &[], true);
        assert!(result.is_empty());
    }

    #[test]
    fn test_resolve_preserves_input_order() {
        let result = PathMapper::resolve(
            &urls(&[
                "https://example.com/b.csv",
                "https://example.com/a.csv",
            ]),
            &[],
            false,
        );
        assert_eq!(result, vec![relative("b.csv"), relative("a.csv")]);
    }

    #[test]
    fn test_resolve_never_produces_leading_separator() {
        let result = PathMapper::resolve(
            &urls(&["https://example.com/a/b/c.csv", "https://example.com/a/d.csv"]),
            &strings(&["/a"]),
            true,
        );
        for resolved in result {
            let ResolvedPath::Relative(path) = resolved else {
                panic!("expected mappable path");
            };
            assert!(path.is_relative(), "path {} must be relative", path.display());
        }
    }

    // ==================== Explicit Prefix Tests ====================

    #[test]
    fn test_explicit_prefix_stripped() {
        let result = PathMapper::resolve(
            &urls(&["https://example.com/bulk/2024/data.csv"]),
            &strings(&["bulk"]),
            false,
        );
        assert_eq!(result, vec![relative("2024/data.csv")]);
    }

    #[test]
    fn test_explicit_prefix_leading_slash_equivalent() {
        let result = PathMapper::resolve(
            &urls(&["https://example.com/bulk/2024/data.csv"]),
            &strings(&["/bulk/"]),
            false,
        );
        assert_eq!(result, vec![relative("2024/data.csv")]);
    }

    #[test]
    fn test_longest_matching_prefix_wins() {
        // ["a", "a/b"] against /a/b/c strips a/b, not a then b.
        let result = PathMapper::resolve(
            &urls(&["https://example.com/a/b/c"]),
            &strings(&["a", "a/b"]),
            false,
        );
        assert_eq!(result, vec![relative("c")]);
    }

    #[test]
    fn test_prefix_is_segment_wise_not_character_wise() {
        let result = PathMapper::resolve(
            &urls(&["https://example.com/foobar/baz.csv"]),
            &strings(&["foo"]),
            false,
        );
        assert_eq!(result, vec![relative("foobar/baz.csv")]);
    }

    #[test]
    fn test_empty_prefix_string_is_noop() {
        let result = PathMapper::resolve(
            &urls(&["https://example.com/a/b.csv"]),
            &strings(&["", "/"]),
            false,
        );
        assert_eq!(result, vec![relative("a/b.csv")]);
    }

    #[test]
    fn test_non_matching_prefix_not_stripped() {
        let result = PathMapper::resolve(
            &urls(&["https://example.com/a/b.csv"]),
            &strings(&["x/y"]),
            false,
        );
        assert_eq!(result, vec![relative("a/b.csv")]);
    }

    // ==================== Auto-Detection Tests ====================

    #[test]
    fn test_auto_prefix_shared_by_all() {
        let result = PathMapper::resolve(
            &urls(&[
                "https://example.com/easey/bulk/a.csv",
                "https://example.com/easey/bulk/sub/b.csv",
            ]),
            &[],
            true,
        );
        assert_eq!(result, vec![relative("a.csv"), relative("sub/b.csv")]);
    }

    #[test]
    fn test_auto_prefix_single_url_is_empty() {
        let result = PathMapper::resolve(
            &urls(&["https://example.com/easey/bulk/a.csv"]),
            &[],
            true,
        );
        assert_eq!(result, vec![relative("easey/bulk/a.csv")]);
    }

    #[test]
    fn test_auto_prefix_divergent_paths_is_empty() {
        let result = PathMapper::resolve(
            &urls(&[
                "https://example.com/foo/bar.csv",
                "https://example.com/foobar/baz.csv",
            ]),
            &[],
            true,
        );
        assert_eq!(
            result,
            vec![relative("foo/bar.csv"), relative("foobar/baz.csv")]
        );
    }

    #[test]
    fn test_auto_prefix_identical_paths_falls_back_to_filename() {
        // The shared prefix is the whole path; stripping everything falls
        // back to the final original segment.
        let result = PathMapper::resolve(
            &urls(&[
                "https://example.com/a/b/file.csv",
                "https://mirror.example.org/a/b/file.csv",
            ]),
            &[],
            true,
        );
        assert_eq!(result, vec![relative("file.csv"), relative("file.csv")]);
    }

    #[test]
    fn test_auto_and_explicit_prefixes_compose() {
        // Auto prefix (easey) joins explicit (easey/bulk); longest wins.
        let result = PathMapper::resolve(
            &urls(&[
                "https://example.com/easey/bulk/a.csv",
                "https://example.com/easey/archive/b.csv",
            ]),
            &strings(&["easey/bulk"]),
            true,
        );
        assert_eq!(result, vec![relative("a.csv"), relative("archive/b.csv")]);
    }

    // ==================== Unmappable Tests ====================

    #[test]
    fn test_unmappable_invalid_url() {
        let result = PathMapper::resolve(&urls(&["not a url"]), &[], false);
        assert!(matches!(result[0], ResolvedPath::Unmappable { .. }));
    }

    #[test]
    fn test_unmappable_no_path_segments() {
        let result = PathMapper::resolve(&urls(&["https://example.com/"]), &[], false);
        assert!(matches!(result[0], ResolvedPath::Unmappable { .. }));
    }

    #[test]
    fn test_unmappable_does_not_poison_batch() {
        let result = PathMapper::resolve(
            &urls(&["not a url", "https://example.com/ok.csv"]),
            &[],
            false,
        );
        assert!(matches!(result[0], ResolvedPath::Unmappable { .. }));
        assert_eq!(result[1], relative("ok.csv"));
    }
}
