//! On-disk layout for saved pages.
//!
//! Pages land at `{root}/{sanitized manga id}/{chapter}/{page}.{ext}`.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::adapter::ImageRef;

/// Extension used when the image URL path carries none.
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Makes an adapter-supplied identifier safe to use as one path segment.
///
/// Replaces `/ \ : * ? " < > |` and control characters with `_`. A result
/// that would still resolve to `.`, `..` or a root has its dots replaced
/// too. Empty input becomes `_`.
#[must_use]
pub fn sanitize_path_segment(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Lowercase extension (without the dot) of the last URL path segment.
#[must_use]
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index + 1..];
    if ext.is_empty() || ext.len() > 11 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Directory holding every page of one chapter.
#[must_use]
pub fn chapter_dir(root: &Path, manga_id: &str, chapter: u32) -> PathBuf {
    root.join(sanitize_path_segment(manga_id))
        .join(chapter.to_string())
}

/// File name for one page, e.g. `3.png`.
#[must_use]
pub fn page_file_name(image: &ImageRef) -> String {
    let ext = extension_from_url(&image.url).unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
    format!("{}.{ext}", image.page)
}

/// Full destination path for one page.
#[must_use]
pub fn page_destination(root: &Path, manga_id: &str, chapter: u32, image: &ImageRef) -> PathBuf {
    chapter_dir(root, manga_id, chapter).join(page_file_name(image))
}
