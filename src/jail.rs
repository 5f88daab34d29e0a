//! Resolves client-supplied paths against the base directory and refuses
//! anything that canonicalizes outside it. Canonicalization-then-prefix-check
//! is the jail: checking the raw input string is not enough, since `..`
//! components only reveal themselves once the filesystem resolves them.

use std::path::{Path, PathBuf};

use crate::error::JailError;

/// Resolves `user_input` (as given on the wire, e.g. to `CWD`/`LIST`/`RETR`)
/// against `base` and the session's current virtual directory `cwd`.
pub fn resolve(base: &Path, cwd: &str, user_input: &str) -> Result<PathBuf, JailError> {
    // `base.join("..")` canonicalizes to base's *parent*, not base itself —
    // `fs::canonicalize` only no-ops on `/..` when base is the real OS root.
    // `..` from virtual `/` must stay at `/` regardless of where `base` lives
    // on the host filesystem, so short-circuit before touching the disk.
    if cwd == "/" && user_input == ".." {
        return Ok(base.to_path_buf());
    }

    let candidate = if let Some(rest) = user_input.strip_prefix('/') {
        base.join(rest)
    } else {
        base.join(cwd.trim_start_matches('/')).join(user_input)
    };

    let canonical = std::fs::canonicalize(&candidate).map_err(|_| JailError::NotFound)?;

    // `Path::starts_with` compares whole components, so this cannot be
    // fooled by a sibling directory that merely shares a string prefix
    // (e.g. `/base-evil` vs `/base`).
    if canonical == base || canonical.starts_with(base) {
        Ok(canonical)
    } else {
        Err(JailError::Escaped)
    }
}

/// Projects a host path known to be inside the jail back into the client's
/// virtual namespace: strip the base prefix, ensure a leading `/`, and
/// append a trailing `/` for directories.
pub fn project_into_cwd(base: &Path, host_path: &Path) -> String {
    let relative = host_path.strip_prefix(base).unwrap_or(host_path);
    let mut virtual_path = String::from("/");
    virtual_path.push_str(&relative.to_string_lossy());

    if host_path.is_dir() && !virtual_path.ends_with('/') {
        virtual_path.push('/');
    }
    virtual_path
}
