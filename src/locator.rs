//! Script path resolution.
//!
//! Hook scripts may be named without an extension ("verify"); the locator
//! then probes each registered extension in registration order.

use std::path::{Path, PathBuf};

use crate::interpreter::InterpreterRegistry;

/// Append `.ext` to `path`, keeping any existing extension.
pub fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut candidate = path.as_os_str().to_owned();
    candidate.push(".");
    candidate.push(ext);
    PathBuf::from(candidate)
}

/// Finds script files for an [`InterpreterRegistry`].
pub struct ScriptLocator<'a> {
    registry: &'a InterpreterRegistry,
}

impl<'a> ScriptLocator<'a> {
    /// Create a locator probing the extensions of `registry`.
    pub fn new(registry: &'a InterpreterRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a script named relative to `basedir`.
    ///
    /// Returns `None` when `name` is `None` (nothing to run). Otherwise
    /// returns `basedir/name` if it exists, else the first existing
    /// `basedir/name.<ext>`, else the unmodified, non-existent
    /// `basedir/name`.
    pub fn resolve_by_name(&self, basedir: &Path, name: Option<&str>) -> Option<PathBuf> {
        let script_file = basedir.join(name?);
        if script_file.exists() {
            return Some(script_file);
        }

        let found = self
            .registry
            .extensions()
            .map(|ext| with_extension(&script_file, ext))
            .find(|candidate| candidate.exists());

        Some(found.unwrap_or(script_file))
    }

    /// Resolve an explicitly given script file. No extension probing is done.
    pub fn resolve_by_path(&self, script_file: &Path) -> PathBuf {
        script_file.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_with_extension() {
        assert_eq!(
            with_extension(Path::new("it/verify"), "lua"),
            PathBuf::from("it/verify.lua")
        );
        assert_eq!(
            with_extension(Path::new("it/verify.v2"), "rhai"),
            PathBuf::from("it/verify.v2.rhai")
        );
    }

    #[test]
    fn test_no_name_means_nothing_to_run() {
        let registry = InterpreterRegistry::new();
        let locator = ScriptLocator::new(&registry);
        assert_eq!(locator.resolve_by_name(Path::new("."), None), None);
    }

    #[test]
    fn test_exact_name_wins() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("verify"), "return true").unwrap();
        fs::write(dir.path().join("verify.lua"), "return true").unwrap();

        let registry = InterpreterRegistry::new();
        let locator = ScriptLocator::new(&registry);
        assert_eq!(
            locator.resolve_by_name(dir.path(), Some("verify")),
            Some(dir.path().join("verify"))
        );
    }

    #[test]
    fn test_each_registered_extension_is_found() {
        let registry = InterpreterRegistry::new();
        let locator = ScriptLocator::new(&registry);

        for ext in registry.extensions() {
            let dir = tempdir().unwrap();
            let expected = dir.path().join(format!("verify.{ext}"));
            fs::write(&expected, "").unwrap();

            assert_eq!(
                locator.resolve_by_name(dir.path(), Some("verify")),
                Some(expected)
            );
        }
    }

    #[test]
    fn test_probing_follows_registration_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("verify.rhai"), "true").unwrap();
        fs::write(dir.path().join("verify.lua"), "return true").unwrap();

        let registry = InterpreterRegistry::new();
        let locator = ScriptLocator::new(&registry);
        assert_eq!(
            locator.resolve_by_name(dir.path(), Some("verify")),
            Some(dir.path().join("verify.lua"))
        );
    }

    #[test]
    fn test_missing_script_returns_unmodified_path() {
        let dir = tempdir().unwrap();
        let registry = InterpreterRegistry::new();
        let locator = ScriptLocator::new(&registry);

        let resolved = locator.resolve_by_name(dir.path(), Some("verify")).unwrap();
        assert_eq!(resolved, dir.path().join("verify"));
        assert!(!resolved.exists());
    }

    #[test]
    fn test_resolve_by_path_does_not_probe() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("verify.lua"), "return true").unwrap();

        let registry = InterpreterRegistry::new();
        let locator = ScriptLocator::new(&registry);
        let explicit = dir.path().join("verify");
        assert_eq!(locator.resolve_by_path(&explicit), explicit);
    }
}
