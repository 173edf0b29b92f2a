use std::io;
use std::path::{Path, PathBuf};

/// Suffixed names tried before giving up on a crowded directory.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Deletes a file when dropped unless [`RemoveOnDrop::keep`] is called.
///
/// Covers every early return between creating a dump/scratch file and
/// deciding its fate.
pub struct RemoveOnDrop {
    path: PathBuf,
    armed: bool,
}

impl RemoveOnDrop {
    pub const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Create a fresh file in `dir` under the first name `name_for(seq)` that
    /// does not exist yet, and guard it.
    ///
    /// Existing files are never opened, so a collision can neither truncate
    /// nor later delete somebody else's artifact.
    pub async fn create_new(
        dir: &Path,
        name_for: impl Fn(u32) -> String,
    ) -> io::Result<(Self, String, tokio::fs::File)> {
        for seq in 0..MAX_NAME_ATTEMPTS {
            let name = name_for(seq);
            let path = dir.join(&name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((Self::new(path), name, file)),
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "name taken; trying the next one");
                }
                Err(error) => return Err(error),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name in {}", dir.display()),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file on disk.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }

    /// Delete the file now and log anything other than "already gone".
    pub fn remove(mut self) {
        self.armed = false;
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed file"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "failed to remove file");
            }
        }
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
