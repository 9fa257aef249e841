use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads the whole file. Fails on missing files and on non-UTF-8 content.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Replaces the file behind `path` with `contents`. Symlinks are followed, the
/// new contents go to a temp file next to the resolved file and are renamed
/// over it. Fails without touching anything if the file is not writable.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    let resolved = fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve file: {}", path.display()))?;

    OpenOptions::new()
        .write(true)
        .open(&resolved)
        .with_context(|| format!("File is not writable: {}", resolved.display()))?;

    let metadata = fs::metadata(&resolved)
        .with_context(|| format!("Failed to read metadata: {}", resolved.display()))?;

    let dir = resolved.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in: {}", dir.display()))?;

    temp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write temp file: {}", temp.path().display()))?;

    // Temp files are created owner-only; keep the target's original mode
    temp.as_file()
        .set_permissions(metadata.permissions())
        .with_context(|| format!("Failed to copy permissions from: {}", resolved.display()))?;

    temp.as_file()
        .sync_all()
        .context("Failed to flush temp file to disk")?;

    temp.persist(&resolved)
        .with_context(|| format!("Failed to replace file: {}", resolved.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auth.js");
        fs::write(&path, "old").unwrap();

        write_text(&path, "new contents\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "new contents\n");

        // Only the target remains, the temp file was renamed away
        let entries = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.js");

        let err = read_text(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
        assert!(err.to_string().contains("missing.js"));
    }

    #[test]
    fn test_read_rejects_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("binary.js");
        fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        assert!(read_text(&path).is_err());
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no-such-dir").join("auth.js");

        assert!(write_text(&path, "x").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auth.js");

        assert!(write_text(&path, "x").is_err());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_follows_symlink() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real.js");
        let link = temp_dir.path().join("auth.js");
        fs::write(&real, "old").unwrap();
        symlink(&real, &link).unwrap();

        write_text(&link, "new").unwrap();

        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_read_only_file_fails() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auth.js");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        // Privileged users can open 0444 files for writing
        if OpenOptions::new().write(true).open(&path).is_ok() {
            return;
        }

        let err = write_text(&path, "new").unwrap_err();
        assert!(err.to_string().contains("File is not writable"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("auth.js");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_text(&path, "new").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
