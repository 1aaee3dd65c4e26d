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

//! Provides the foundational traits and primitive types for the asset side of
//! soft references.
//!
//! This module defines the "common language" shared by the loader agent and
//! the concrete loading lanes. It contains the core contracts that other crates
//! implement or use, but it has no knowledge of how assets are loaded or stored.
//!
//! The key components are:
//! - The [`Asset`] trait: A marker for all types that can be treated as assets.
//! - [`ResourceUid`] and [`ResourceId`]: the two halves of a resource locator.
//! - The collaborator traits ([`ResourceResolver`], [`ResourceLoader`],
//!   [`ThreadedResourceLoader`]) the loader agent drives.

mod error;
mod handle;
mod identifier;
mod loader;
mod uid;

pub use error::*;
pub use handle::*;
pub use identifier::*;
pub use loader::*;
pub use uid::*;

/// A marker trait for types that can be managed by the asset system.
///
/// The supertraits enforce critical safety guarantees:
/// - `Send` + `Sync`: The asset type can be safely shared and sent between threads.
///   This is essential for background loading.
/// - `'static`: The asset type does not contain any non-static references, ensuring
///   it can be stored for the lifetime of the application.
///
/// # Examples
///
/// ```
/// use softref_core::asset::Asset;
///
/// // A simple struct representing a texture.
/// struct Texture {
///     // ... fields
/// }
///
/// // By implementing Asset, `Texture` can now be used by the asset system.
/// impl Asset for Texture {}
/// ```
pub trait Asset: Send + Sync + 'static {}
