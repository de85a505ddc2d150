//! SQLite DSN helpers.

use std::io;
use std::path::{Path, PathBuf};

/// Returns true for DSNs that open a private in-memory database.
pub fn is_memory_dsn(dsn: &str) -> bool {
    let lower = dsn.to_ascii_lowercase();
    lower == "sqlite::memory:"
        || lower == "sqlite://:memory:"
        || lower.contains("mode=memory")
}

/// Ensure parent directories of a file DSN exist.
///
/// Memory DSNs and URI forms (`sqlite:file:...`) are returned unchanged.
pub fn prepare_sqlite_path(dsn: &str, create_dirs: bool) -> io::Result<String> {
    if !create_dirs || is_memory_dsn(dsn) {
        return Ok(dsn.to_string());
    }

    if let Some(path) = file_path_from_dsn(dsn) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    Ok(dsn.to_string())
}

/// Rewrite a relative `sqlite://` file DSN to an absolute one rooted at `base_dir`.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> io::Result<String> {
    if is_memory_dsn(dsn) {
        return Ok(dsn.to_string());
    }

    let Some(rest) = dsn.strip_prefix("sqlite://") else {
        return Ok(dsn.to_string());
    };

    let (path_str, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty SQLite path in DSN",
        ));
    }

    let mut p = PathBuf::from(path_str);
    if p.is_relative() {
        p = base_dir.join(p);
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

fn file_path_from_dsn(dsn: &str) -> Option<PathBuf> {
    let raw = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))?;
    if raw.starts_with("file:") {
        return None;
    }
    let raw = raw.split('?').next().unwrap_or(raw);
    (!raw.is_empty()).then(|| PathBuf::from(raw))
}
