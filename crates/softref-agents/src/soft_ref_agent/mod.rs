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

//! Acts as the **[A]gent** for soft references.
//!
//! A [`SoftRef`] names a resource that may or may not be loaded yet. It can be
//! loaded inline with [`SoftRef::load_sync`], or in the background with
//! [`SoftRef::load_async`], which hands it to a [`SoftRefLoader`].
//!
//! The loader is the only component that moves a reference out of
//! [`LoadState::Pending`]. It keeps one in-flight load per distinct path, so
//! any number of references requesting the same path before it concludes
//! share a single background load. Once per frame it polls every in-flight
//! load and delivers each concluded result to all of its listeners, in the
//! order they registered.
//!
//! Everything here runs on one logical thread. Only the collaborators in
//! [`LoaderServices`] do real concurrent work.

mod loader;
mod pending;
mod services;
mod soft_ref;
mod state;

pub use loader::SoftRefLoader;
pub use services::LoaderServices;
pub use soft_ref::SoftRef;
pub use state::{LoadFinished, LoadState};
