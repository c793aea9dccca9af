//! Prompt files in, session artifacts out.

use crate::constants::PUBLIC_OUTPUT_FILE;
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Reads system prompts relative to a base directory.
#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub async fn load(&self, name: &str) -> io::Result<String> {
        let path = self.path_of(name);
        debug!(path = %path.display(), "Loading prompt");
        fs::read_to_string(&path).await
    }
}

/// Writes artifacts under `<dir>/<session_id>/`.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.dir.join(session_id)
    }

    pub fn public_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(PUBLIC_OUTPUT_FILE)
    }

    /// Write `public.json` for the session, creating directories as needed.
    pub async fn save_public(&self, session_id: &str, contents: &str) -> io::Result<PathBuf> {
        self.save(session_id, PUBLIC_OUTPUT_FILE, contents).await
    }

    pub async fn save(&self, session_id: &str, file: &str, contents: &str) -> io::Result<PathBuf> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir).await?;
        let path = dir.join(file);
        fs::write(&path, contents).await?;
        info!(path = %path.display(), "Saved output");
        Ok(path)
    }
}
