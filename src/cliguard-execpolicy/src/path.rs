//! Path confinement.
//!
//! Every path-like argument is resolved against the filesystem (symlinks
//! followed, `.` and `..` collapsed) and must land inside the root directory.
//! A path that cannot be resolved is treated as an escape.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::Violation;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("Invalid URL regex"));

/// Returns `true` for `http://` and `https://` URLs, which are exempt from
/// confinement.
pub fn is_url(token: &str) -> bool {
    URL_PATTERN.is_match(token)
}

/// Returns `true` if `token` should be treated as a filesystem path.
///
/// That is: it contains a separator, is `.` or `..`, starts with `~`, or is
/// absolute.
pub fn is_path_like(token: &str) -> bool {
    token.contains('/')
        || token.contains('\\')
        || token == "."
        || token == ".."
        || token.starts_with('~')
        || Path::new(token).is_absolute()
}

/// Resolves path arguments and checks they stay under a root.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    root: &'a Path,
}

impl<'a> PathResolver<'a> {
    /// `root` must already be canonical.
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Resolves `token` to its canonical form, or returns it unchanged if it
    /// is a URL.
    pub fn resolve(&self, token: &str) -> Result<String, Violation> {
        if is_url(token) {
            debug!(token, "URL argument passed through");
            return Ok(token.to_string());
        }

        let resolved = self.resolve_path(token)?;
        resolved
            .into_os_string()
            .into_string()
            .map_err(|_| Violation::PathEscape {
                path: token.to_string(),
                reason: "resolves to a path that is not valid UTF-8".to_string(),
            })
    }

    /// Whether `token`, taken relative to the root, names a symlink.
    ///
    /// Bare names are not path-like, but a symlink in the root still leads
    /// wherever it points.
    pub fn names_symlink(&self, token: &str) -> bool {
        std::fs::symlink_metadata(self.root.join(token))
            .is_ok_and(|meta| meta.file_type().is_symlink())
    }

    /// Canonicalizes `token` and checks confinement.
    ///
    /// Relative paths are joined to the root first. `~` is never expanded.
    pub fn resolve_path(&self, token: &str) -> Result<PathBuf, Violation> {
        let candidate = Path::new(token);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let canonical = std::fs::canonicalize(&joined).map_err(|e| Violation::PathEscape {
            path: token.to_string(),
            reason: format!("cannot be resolved: {e}"),
        })?;

        // Component-wise, so `/srv/root-evil` is not inside `/srv/root`.
        if !canonical.starts_with(self.root) {
            debug!(
                token,
                resolved = %canonical.display(),
                root = %self.root.display(),
                "path escapes root"
            );
            return Err(Violation::PathEscape {
                path: token.to_string(),
                reason: format!(
                    "is outside of allowed directory: {}",
                    self.root.display()
                ),
            });
        }

        Ok(canonical)
    }
}
