use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Result;

pub const DEFAULT_DISPLAY_LIMIT: usize = 10;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;
pub const DEFAULT_STATE_DIR: &str = "standings.state";

#[derive(Clone)]
pub struct StandingsConfig {
    pub state_dir: PathBuf,
    pub label: String,
    /// Entries returned by the default display surface.
    pub display_limit: usize,
    pub rebuild_progress_interval: u64,
}

impl StandingsConfig {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            label: "dev".to_string(),
            display_limit: DEFAULT_DISPLAY_LIMIT,
            rebuild_progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn table_path(&self) -> PathBuf {
        self.state_dir.join("standings.json")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir)?;
        }
        Ok(())
    }
}
