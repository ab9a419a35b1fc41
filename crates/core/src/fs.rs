//! Filesystem utilities

use std::fs;
use std::io;
use std::path::Path;

use log::info;

/// Create a directory and all parent directories if they don't exist.
///
/// Returns true when the directory had to be created.
pub fn create_dir_all(path: &Path) -> io::Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    info!("Created directory: {}", path.display());
    Ok(true)
}

/// Write `contents` to `path`, creating the parent directory first
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    info!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Turn free text (a city name, a date) into something safe for a file name.
///
/// Alphanumerics and `-` are kept, everything else collapses into a single `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() || c == '-' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_all_reports_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");

        assert!(create_dir_all(&nested).unwrap());
        assert!(!create_dir_all(&nested).unwrap());
    }

    #[test]
    fn test_write_file_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("reports").join("x.md");

        write_file(&target, "hello").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("São Paulo"), "São_Paulo");
        assert_eq!(sanitize_file_name(" Rio de Janeiro, RJ "), "Rio_de_Janeiro_RJ");
        assert_eq!(sanitize_file_name("2024-05-01"), "2024-05-01");
        assert_eq!(sanitize_file_name("../etc/passwd"), "etc_passwd");
    }
}
