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

// Soft reference sandbox
// Loads every configured asset through several references at once and
// reports how the requests were coalesced.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::SandboxConfig;
use softref_agents::{LoaderServices, SoftRef, SoftRefLoader};
use softref_lanes::{
    asset_lane::{BytesAsset, BytesDecoder, FileSystemLoader, ThreadedLoader},
    frame_lane::FrameLoop,
    uid_lane::UidRegistry,
};
use std::{fs, path::PathBuf, sync::Arc};

#[derive(Debug, Parser)]
#[command(version, about = "Coalesced background loading through soft references")]
struct Cli {
    /// RON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured asset root.
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Overrides how many references are created for each asset.
    #[arg(short, long)]
    references: Option<usize>,
}

fn load_registry(config: &SandboxConfig) -> Result<UidRegistry> {
    match &config.uid_index {
        Some(index) if index.exists() => {
            let bytes = fs::read(index).with_context(|| format!("reading {}", index.display()))?;
            let registry = UidRegistry::from_index_bytes(&bytes)?;
            log::info!("Loaded {} uid(s) from {}.", registry.len(), index.display());
            Ok(registry)
        }
        _ => Ok(UidRegistry::new()),
    }
}

fn save_registry(config: &SandboxConfig, registry: &UidRegistry) -> Result<()> {
    if let Some(index) = &config.uid_index {
        fs::write(index, registry.to_index_bytes()?)
            .with_context(|| format!("writing {}", index.display()))?;
        log::info!("Wrote {} uid(s) to {}.", registry.len(), index.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SandboxConfig::from_file(path)?,
        None => SandboxConfig::default(),
    };
    if let Some(root) = cli.assets {
        config.asset_root = root;
    }
    if let Some(references) = cli.references {
        config.references_per_asset = references;
    }

    let paths = config.resource_paths()?;
    if paths.is_empty() {
        log::warn!("No assets found below {}.", config.asset_root.display());
        return Ok(());
    }

    let mut registry = load_registry(&config)?;
    let uids: Vec<String> = paths
        .iter()
        .map(|path| registry.register(path).to_text())
        .collect();
    save_registry(&config, &registry)?;

    let inline: Arc<FileSystemLoader<BytesAsset, BytesDecoder>> =
        Arc::new(FileSystemLoader::new(&config.asset_root, BytesDecoder));
    let threaded = Arc::new(ThreadedLoader::new(inline.clone(), config.loader_config()));
    let frames = Arc::new(FrameLoop::new());
    let loader = SoftRefLoader::new(
        LoaderServices::new(Arc::new(registry), inline, threaded.clone()),
        frames.clone(),
    );

    // One reference per asset goes through the deferred uid request, the rest
    // share its load by path.
    let mut refs: Vec<SoftRef<BytesAsset>> = Vec::new();
    for (path, uid) in paths.iter().zip(&uids) {
        refs.push(loader.request_load_from_uid(uid));
        for _ in 1..config.references_per_asset {
            let soft_ref = SoftRef::with_path(path, loader.resolver());
            soft_ref.load_async(&loader);
            refs.push(soft_ref);
        }
    }
    log::info!(
        "Requested {} reference(s) to {} asset(s): {} background load(s) in flight.",
        refs.len(),
        paths.len(),
        loader.pending_count()
    );

    let frames_run = frames.run_until(config.frame_interval(), config.max_frames, || {
        frames.frame_count() > 0 && loader.pending_count() == 0
    });
    log::info!("Loads settled after {frames_run} frame(s).");

    for soft_ref in &refs {
        let size = soft_ref.get().map_or(0, |asset| asset.0.len());
        log::info!("{} {} ({} bytes)", soft_ref, soft_ref.path(), size);
    }

    frames.shutdown();
    threaded.shutdown();
    Ok(())
}
