use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settings for one benchmark run. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Tags the run and names its scratch directory.
    pub run_id: Uuid,
    /// Directory the scratch directory is created in.
    pub workdir: PathBuf,
    pub num_files: usize,
    pub small_size: usize,
    pub large_size: usize,
    /// Repetitions of the read-only metadata operations.
    pub iterations: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workdir: std::env::temp_dir(),
            num_files: 100,
            small_size: 1024,
            large_size: 10 * 1024 * 1024,
            iterations: 100,
        }
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.workdir.join(format!("dualfs-bench-{}", self.run_id))
    }
}
