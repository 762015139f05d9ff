//! Atomic file operations to prevent corrupted cache files

use std::io;
use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Write data to a file atomically by writing to a temporary file and renaming
///
/// The file is created readable and writable by its owner only. Readers never
/// observe a partially written file: they see either the previous content or
/// the new one.
pub async fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid file path {}: no parent directory", path.display()),
        )
    })?;

    fs::create_dir_all(parent).await?;

    // Temporary file lives in the same directory so the rename stays atomic
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    if let Err(e) = write_owner_only(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}

async fn write_owner_only(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(())
}
