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

use softref_core::asset::Asset;
use std::error::Error;

/// A trait for types that can decode a specific kind of asset from a byte slice.
///
/// This represents the "Data Plane" part of loading. Implementors are
/// responsible for the potentially CPU-intensive work of turning raw file data
/// into a usable asset. They never see paths, threads, or load states.
///
/// Each `AssetDecoder` is specialized for a single asset type `A`.
pub trait AssetDecoder<A: Asset>: Send + Sync {
    /// Parses a byte slice and converts it into an instance of the asset `A`.
    ///
    /// # Returns
    /// A `Result` containing the decoded asset on success, or a boxed dynamic
    /// error on failure. The error must be thread-safe.
    fn decode(&self, bytes: &[u8]) -> Result<A, Box<dyn Error + Send + Sync>>;
}

/// Errors produced by the built-in decoders.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not valid UTF-8.
    #[error("resource is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// The resource has no content.
    #[error("resource is empty")]
    Empty,
}

/// An asset holding the raw bytes of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesAsset(pub Vec<u8>);

impl Asset for BytesAsset {}

/// Decodes any resource into a [`BytesAsset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesDecoder;

impl AssetDecoder<BytesAsset> for BytesDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<BytesAsset, Box<dyn Error + Send + Sync>> {
        Ok(BytesAsset(bytes.to_vec()))
    }
}

/// An asset holding a UTF-8 text resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAsset(pub String);

impl Asset for TextAsset {}

/// Decodes non-empty UTF-8 resources into a [`TextAsset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl AssetDecoder<TextAsset> for TextDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<TextAsset, Box<dyn Error + Send + Sync>> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty.into());
        }
        let text = String::from_utf8(bytes.to_vec()).map_err(DecodeError::from)?;
        Ok(TextAsset(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_decoder_accepts_utf8() {
        let asset = TextDecoder.decode("hello".as_bytes()).unwrap();
        assert_eq!(asset, TextAsset("hello".to_string()));
    }

    #[test]
    fn text_decoder_rejects_invalid_input() {
        let err = TextDecoder.decode(&[0xff, 0xfe]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
        let err = TextDecoder.decode(&[]).unwrap_err();
        assert_eq!(err.to_string(), "resource is empty");
    }
}
