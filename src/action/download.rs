//! Chapter download action.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ActionKind, Ticket, ValidationError, check_enumerated, decode, whitelisted_fields};
use crate::request::{ChapterDownloadRequest, Request};

const FIELDS: &[&str] = &[
    "downloadDir",
    "chapter",
    "convert",
    "keepPostConversion",
    "quality",
    "id",
];

const REQUIRED: &[&str] = &["id", "chapter"];

/// Post-download packaging format.
///
/// Carried on the action for a later conversion stage; the pipeline itself
/// only saves raw pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conversion {
    /// Bundle pages into a PDF.
    Pdf,
    /// Bundle pages into a comic book archive.
    Cbz,
    /// Keep raw page images.
    #[default]
    None,
}

impl Conversion {
    /// Every accepted value, in wire form.
    pub const VALUES: &'static [&'static str] = &["pdf", "cbz", "none"];

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Cbz => "cbz",
            Self::None => "none",
        }
    }
}

/// Download one chapter (by zero-based index) of one manga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DownloadAction {
    /// Adapter-specific manga identifier.
    pub id: String,
    /// Zero-based chapter index into the manga's chapter list.
    pub chapter: u32,
    /// Root directory for saved pages. Falls back to the pipeline's
    /// configured download root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
    /// Packaging format.
    #[serde(default)]
    pub convert: Conversion,
    /// Keep raw pages after conversion.
    #[serde(default)]
    pub keep_post_conversion: bool,
    /// Adapter-specific image quality hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl DownloadAction {
    /// Creates a download with every optional field at its default.
    #[must_use]
    pub fn new(id: impl Into<String>, chapter: u32) -> Self {
        Self {
            id: id.into(),
            chapter,
            download_dir: None,
            convert: Conversion::None,
            keep_post_conversion: false,
            quality: None,
        }
    }

    /// Sets the download root.
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.download_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets the packaging format.
    #[must_use]
    pub fn with_conversion(mut self, convert: Conversion, keep_post_conversion: bool) -> Self {
        self.convert = convert;
        self.keep_post_conversion = keep_post_conversion;
        self
    }

    /// Sets the quality hint.
    #[must_use]
    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    /// Builds a download from an untyped, camelCase field map.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for unknown keys, a missing `id` or
    /// `chapter`, a `convert` value outside its allowed set, or badly typed
    /// values (including negative chapter indices).
    pub fn from_fields(fields: &Value) -> Result<Self, ValidationError> {
        let action = ActionKind::Download;
        let map = whitelisted_fields(action, fields, FIELDS)?;

        if let Some(field) = REQUIRED
            .iter()
            .copied()
            .find(|field| !map.contains_key(*field))
        {
            return Err(ValidationError::MissingField { action, field });
        }
        check_enumerated(action, &map, "convert", Conversion::VALUES)?;

        decode(action, map)
    }

    /// Expands into exactly one chapter-download request.
    ///
    /// Conversion settings stay on the action.
    #[must_use]
    pub fn to_requests(&self, ticket: Ticket) -> Vec<Request> {
        vec![Request::StartChapterDownload(ChapterDownloadRequest {
            ticket,
            manga_id: self.id.clone(),
            chapter: self.chapter,
            download_dir: self.download_dir.clone(),
        })]
    }
}
