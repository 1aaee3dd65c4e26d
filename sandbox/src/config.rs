// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use serde::Deserialize;
use softref_lanes::asset_lane::ThreadedLoaderConfig;
use std::{fs, path::Path, path::PathBuf, time::Duration};

/// Settings of a sandbox run, read from a RON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Directory resource paths are resolved against.
    pub asset_root: PathBuf,
    /// Resource paths to load. When empty, every file directly below
    /// `asset_root` is loaded.
    pub assets: Vec<String>,
    /// How many references are created for each asset.
    pub references_per_asset: usize,
    /// Where the uid index is read from and written back to.
    pub uid_index: Option<PathBuf>,
    /// Worker threads of the background loader.
    pub worker_threads: usize,
    /// Bound on queued background loads, `None` for unbounded.
    pub queue_capacity: Option<usize>,
    /// Time budget of one frame, in milliseconds.
    pub frame_interval_ms: u64,
    /// Frames to run before giving up on unfinished loads.
    pub max_frames: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let loader = ThreadedLoaderConfig::default();
        Self {
            asset_root: PathBuf::from("assets"),
            assets: Vec::new(),
            references_per_asset: 3,
            uid_index: None,
            worker_threads: loader.worker_threads,
            queue_capacity: loader.queue_capacity,
            frame_interval_ms: 16,
            max_frames: 600,
        }
    }
}

impl SandboxConfig {
    /// Reads a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading sandbox config {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("parsing sandbox config {}", path.display()))
    }

    /// Parses a configuration from RON text. Missing fields keep their defaults.
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// The background loader settings, with at least one worker.
    pub fn loader_config(&self) -> ThreadedLoaderConfig {
        ThreadedLoaderConfig {
            worker_threads: self.worker_threads.max(1),
            queue_capacity: self.queue_capacity,
        }
    }

    /// The time budget of one frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// The resource paths to load, listing `asset_root` when none are configured.
    pub fn resource_paths(&self) -> Result<Vec<String>> {
        if !self.assets.is_empty() {
            return Ok(self.assets.clone());
        }
        let entries = fs::read_dir(&self.asset_root)
            .with_context(|| format!("listing {}", self.asset_root.display()))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            paths.push(format!("res://{name}"));
        }
        paths.sort();
        Ok(paths)
    }
}
