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

//! # SoftRef Lanes
//!
//! Concrete, host-side implementations of the collaborators described in
//! `softref-core`: blocking and threaded loaders, a uid registry, and a frame
//! loop that drives per-tick callbacks and deferred calls.

#![warn(missing_docs)]

pub mod asset_lane;
pub mod frame_lane;
pub mod uid_lane;
