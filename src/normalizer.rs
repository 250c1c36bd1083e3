// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Normalization of raw content parts.
//!
//! Export content parts come in several shapes: bare strings, transcribed
//! audio, single asset pointers and real-time voice/video bundles. This
//! module maps each of them onto a [`NormalizedPart`] so the renderer only
//! has to deal with three cases.

use crate::parser::{AssetPointer, RawContentPart, StructuredPart};

/// A content part in the uniform shape consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedPart {
    /// Plain message text.
    Text(String),

    /// Text transcribed from an audio recording. May be empty.
    Transcript(String),

    /// A reference to media stored outside the export.
    Asset(AssetRef),
}

/// An opaque handle to an exported asset.
///
/// The asset is never fetched or decoded; only its identifying fields are
/// carried along.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetRef {
    /// Kind of asset, when the export names one.
    pub content_type: Option<String>,

    /// Asset URI, when the export provides one.
    pub pointer: Option<String>,
}

impl AssetRef {
    /// Wraps a whole `*_asset_pointer` part.
    fn from_part(part: &StructuredPart) -> Self {
        Self {
            content_type: Some(part.content_type.clone()),
            pointer: part.asset_pointer.clone(),
        }
    }
}

impl From<&AssetPointer> for AssetRef {
    fn from(pointer: &AssetPointer) -> Self {
        Self {
            content_type: pointer.content_type.clone(),
            pointer: pointer.asset_pointer.clone(),
        }
    }
}

/// Normalizes a message's content parts.
///
/// Non-empty text always wins over the part's content type. Parts with an
/// unrecognized content type are dropped, so the output may be shorter than
/// the input; its order follows the input.
///
/// # Example
///
/// ```
/// use gpt2md::normalizer::{normalize, NormalizedPart};
/// use gpt2md::parser::RawContentPart;
///
/// let parts = normalize(&[RawContentPart::Text("Hello".into())]);
/// assert_eq!(parts, vec![NormalizedPart::Text("Hello".into())]);
/// ```
#[must_use]
pub fn normalize(parts: &[RawContentPart]) -> Vec<NormalizedPart> {
    let mut result = Vec::with_capacity(parts.len());

    for part in parts {
        let text = part.text();
        if !text.is_empty() {
            result.push(NormalizedPart::Text(text.to_owned()));
            continue;
        }

        let RawContentPart::Structured(part) = part else {
            continue;
        };

        match part.content_type.as_str() {
            "audio_transcription" => result.push(NormalizedPart::Transcript(part.text.clone())),
            "audio_asset_pointer" | "image_asset_pointer" | "video_container_asset_pointer" => {
                result.push(NormalizedPart::Asset(AssetRef::from_part(part)));
            }
            "real_time_user_audio_video_asset_pointer" => {
                let pointers = part
                    .audio_asset_pointer
                    .iter()
                    .chain(&part.video_container_asset_pointer)
                    .chain(part.frame_asset_pointers.iter().flatten());
                result.extend(pointers.map(|p| NormalizedPart::Asset(p.into())));
            }
            _ => {}
        }
    }

    result
}
