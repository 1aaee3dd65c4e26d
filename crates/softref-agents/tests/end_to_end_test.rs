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

//! End-to-end loading of files through the threaded loader and a frame loop.

use anyhow::Result;
use softref_agents::{LoadState, LoaderServices, SoftRef, SoftRefLoader};
use softref_core::asset::{AssetHandle, ThreadLoadStatus, ThreadedResourceLoader};
use softref_lanes::{
    asset_lane::{FileSystemLoader, TextAsset, TextDecoder, ThreadedLoader, ThreadedLoaderConfig},
    frame_lane::FrameLoop,
    uid_lane::UidRegistry,
};
use std::{
    fs,
    path::Path,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use tempfile::tempdir;

const FRAME: Duration = Duration::from_millis(1);
const MAX_FRAMES: u64 = 5_000;

struct Stack {
    frames: Arc<FrameLoop>,
    threaded: Arc<ThreadedLoader<TextAsset>>,
    loader: SoftRefLoader<TextAsset>,
}

fn stack(root: &Path, registry: UidRegistry) -> Stack {
    let inline: Arc<FileSystemLoader<TextAsset, TextDecoder>> =
        Arc::new(FileSystemLoader::new(root, TextDecoder));
    let threaded = Arc::new(ThreadedLoader::new(
        inline.clone(),
        ThreadedLoaderConfig::default(),
    ));
    let frames = Arc::new(FrameLoop::new());
    let services = LoaderServices::new(Arc::new(registry), inline, threaded.clone());
    let loader = SoftRefLoader::new(services, frames.clone());
    Stack {
        frames,
        threaded,
        loader,
    }
}

fn settled(refs: &[SoftRef<TextAsset>]) -> bool {
    refs.iter().all(|soft_ref| !soft_ref.is_pending())
}

#[test]
fn test_coalesced_references_load_a_file_once() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("res"))?;
    fs::write(dir.path().join("res/greeting.txt"), "hello")?;
    let s = stack(dir.path(), UidRegistry::new());

    let refs: Vec<SoftRef<TextAsset>> = (0..4)
        .map(|_| SoftRef::with_path("/res/greeting.txt", s.loader.resolver()))
        .collect();
    for soft_ref in &refs {
        soft_ref.load_async(&s.loader);
    }
    assert_eq!(s.loader.pending_count(), 1);
    assert_eq!(s.threaded.tracked_count(), 1);

    s.frames.run_until(FRAME, MAX_FRAMES, || settled(&refs));

    let first = refs[0].get().expect("file loaded");
    assert_eq!(first.0, "hello");
    for soft_ref in &refs {
        assert_eq!(soft_ref.load_state(), LoadState::Loaded);
        assert!(AssetHandle::ptr_eq(&soft_ref.get().unwrap(), &first));
    }
    assert_eq!(s.loader.pending_count(), 0);
    assert_eq!(s.threaded.tracked_count(), 0);
    Ok(())
}

#[test]
fn test_missing_and_undecodable_files_fail() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("empty.txt"), "")?;
    let s = stack(dir.path(), UidRegistry::new());

    let missing = SoftRef::with_path("res://absent.txt", s.loader.resolver());
    let empty = SoftRef::with_path("res://empty.txt", s.loader.resolver());
    let receiver = missing.subscribe();
    missing.load_async(&s.loader);
    empty.load_async(&s.loader);

    let refs = [missing.clone(), empty.clone()];
    s.frames.run_until(FRAME, MAX_FRAMES, || settled(&refs));

    assert!(missing.is_failed());
    assert!(empty.is_failed());
    assert_eq!(receiver.try_iter().count(), 1);
    Ok(())
}

#[test]
fn test_load_by_uid_through_a_persisted_index() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("level.txt"), "level one")?;

    let mut registry = UidRegistry::new();
    let uid = registry.register("/level.txt");
    let index = dir.path().join("uids.bin");
    fs::write(&index, registry.to_index_bytes()?)?;

    let restored = UidRegistry::from_index_bytes(&fs::read(&index)?)?;
    let s = stack(dir.path(), restored);

    let soft_ref = s.loader.request_load_from_uid(&uid.to_text());
    assert_eq!(soft_ref.path(), "/level.txt");

    let refs = [soft_ref.clone()];
    s.frames.run_until(FRAME, MAX_FRAMES, || {
        refs.iter().all(|r| r.is_loaded() || r.is_failed())
    });

    assert_eq!(soft_ref.get().map(|text| text.0.clone()).as_deref(), Some("level one"));
    Ok(())
}

#[test]
fn test_load_sync_while_pending_blocks_for_the_result() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "alpha")?;
    let s = stack(dir.path(), UidRegistry::new());

    let waiting = SoftRef::with_path("/a.txt", s.loader.resolver());
    let forced = SoftRef::with_path("/a.txt", s.loader.resolver());
    waiting.load_async(&s.loader);
    forced.load_async(&s.loader);

    let text = forced.load_sync(&s.loader).expect("completed in place");
    assert_eq!(text.0, "alpha");
    assert!(waiting.is_loaded());
    assert_eq!(s.loader.pending_count(), 0);
    assert_eq!(s.threaded.tracked_count(), 0);
    Ok(())
}

#[test]
fn test_shut_down_frame_loop_fails_new_requests() -> Result<()> {
    let dir = tempdir()?;
    let s = stack(dir.path(), UidRegistry::new());
    s.frames.shutdown();

    let soft_ref = SoftRef::with_path("/a.txt", s.loader.resolver());
    soft_ref.load_async(&s.loader);
    assert!(soft_ref.is_failed());

    let deferred = s.loader.request_load_from_path("/a.txt");
    assert!(deferred.is_failed());
    Ok(())
}

#[test]
fn test_failed_path_is_retried_on_the_next_request() -> Result<()> {
    let dir = tempdir()?;
    let s = stack(dir.path(), UidRegistry::new());

    let soft_ref = SoftRef::with_path("/late.txt", s.loader.resolver());
    soft_ref.load_async(&s.loader);
    let refs = [soft_ref.clone()];
    s.frames.run_until(FRAME, MAX_FRAMES, || settled(&refs));
    assert!(soft_ref.is_failed());
    assert_eq!(s.threaded.tracked_count(), 0);

    fs::write(dir.path().join("late.txt"), "finally")?;
    soft_ref.load_async(&s.loader);
    s.frames.run_until(FRAME, MAX_FRAMES, || settled(&refs));

    assert!(soft_ref.is_loaded());
    assert_eq!(soft_ref.get().map(|text| text.0.clone()).as_deref(), Some("finally"));
    Ok(())
}

#[test]
fn test_abandoned_load_is_not_replayed_to_a_later_request() -> Result<()> {
    let dir = tempdir()?;
    let s = stack(dir.path(), UidRegistry::new());

    let abandoned = SoftRef::with_path("/late.txt", s.loader.resolver());
    abandoned.load_async(&s.loader);
    let deadline = Instant::now() + Duration::from_secs(5);
    while s.threaded.status("/late.txt") == ThreadLoadStatus::InProgress
        && Instant::now() < deadline
    {
        thread::sleep(FRAME);
    }
    abandoned.reset();
    s.frames.tick();
    assert_eq!(s.loader.pending_count(), 0);
    assert_eq!(s.threaded.tracked_count(), 0, "abandoned result discarded");

    fs::write(dir.path().join("late.txt"), "fresh")?;
    let fresh = SoftRef::with_path("/late.txt", s.loader.resolver());
    fresh.load_async(&s.loader);
    let refs = [fresh.clone()];
    s.frames.run_until(FRAME, MAX_FRAMES, || settled(&refs));

    assert!(fresh.is_loaded());
    assert_eq!(fresh.get().map(|text| text.0.clone()).as_deref(), Some("fresh"));
    assert_eq!(abandoned.load_state(), LoadState::Empty);
    Ok(())
}

#[test]
fn test_load_abandoned_in_flight_is_reloaded_on_request() -> Result<()> {
    let dir = tempdir()?;
    let s = stack(dir.path(), UidRegistry::new());

    let abandoned = SoftRef::with_path("/slow.txt", s.loader.resolver());
    abandoned.load_async(&s.loader);
    abandoned.reset();
    s.frames.tick();
    assert_eq!(s.loader.pending_count(), 0);

    // Whether or not the backend concluded before the entry was dropped, a
    // new request must read the file as it is now.
    let deadline = Instant::now() + Duration::from_secs(5);
    while s.threaded.status("/slow.txt") == ThreadLoadStatus::InProgress
        && Instant::now() < deadline
    {
        thread::sleep(FRAME);
    }
    fs::write(dir.path().join("slow.txt"), "now present")?;

    let fresh = SoftRef::with_path("/slow.txt", s.loader.resolver());
    fresh.load_async(&s.loader);
    let refs = [fresh.clone()];
    s.frames.run_until(FRAME, MAX_FRAMES, || settled(&refs));

    assert!(fresh.is_loaded());
    assert_eq!(s.threaded.tracked_count(), 0);
    Ok(())
}
