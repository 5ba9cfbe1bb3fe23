//! File system utilities for staging.
//!
//! Provides file operations with automatic directory creation and
//! path-carrying errors.

use crate::packager::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::{fs, io::AsyncWriteExt};

/// UTF-8 byte order mark.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Creates all of the directories of the specified path.
///
/// Succeeds when the directory already exists.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Copies a regular file, overwriting the destination and creating its
/// parent directories as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to).await.fs_context("copying file", to)?;
    Ok(())
}

/// True when both paths resolve to the same existing file.
pub async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Removes a file if it exists.
pub async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(Error::Fs {
            context: "removing file",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Write file with UTF-8 BOM, replacing any existing file.
///
/// Windows PowerShell 5.1 decodes BOM-less scripts with the ANSI code page,
/// so generated scripts always carry the BOM (EF BB BF).
pub async fn write_utf8_bom(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::File::create(path)
        .await
        .fs_context("creating script file", path)?;

    file.write_all(&UTF8_BOM)
        .await
        .fs_context("writing UTF-8 BOM", path)?;
    file.write_all(content.as_bytes())
        .await
        .fs_context("writing script content", path)?;
    file.flush().await.fs_context("flushing script file", path)?;

    Ok(())
}

/// Reads a text file, dropping a leading UTF-8 BOM.
pub async fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).await.fs_context("reading file", path)?;
    let body = bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(&bytes[..]);
    Ok(String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bom_written_and_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detect.ps1");
        write_utf8_bom(&path, "exit 0").await.unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..3], &UTF8_BOM);
        assert_eq!(read_text(&path).await.unwrap(), "exit 0");
    }

    #[tokio::test]
    async fn copy_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("setup.msi");
        let dst = dir.path().join("staging").join("setup.msi");
        std::fs::write(&src, b"new").unwrap();
        std::fs::create_dir_all(dst.parent().unwrap()).unwrap();
        std::fs::write(&dst, b"old contents").unwrap();

        copy_file(&src, &dst).await.unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"new");
    }

    #[tokio::test]
    async fn same_file_sees_through_relative_segments() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("agent.msi");
        std::fs::write(&file, b"msi").unwrap();
        std::fs::create_dir(dir.path().join("staging")).unwrap();

        let dotted = dir.path().join("staging").join("..").join("agent.msi");
        assert!(is_same_file(&file, &dotted).await);
        assert!(!is_same_file(&file, &dir.path().join("other.msi")).await);
    }

    #[tokio::test]
    async fn copy_rejects_missing_source_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.msi");
        assert!(copy_file(&missing, &dir.path().join("x")).await.is_err());
        remove_file_if_exists(&missing).await.unwrap();
    }
}
