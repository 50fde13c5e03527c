//! Shared fixtures for integration tests: an in-memory adapter with
//! scripted responses and a downloader that writes the URL as the page body.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use manga_pipeline::action::SearchParams;
use manga_pipeline::adapter::{
    Adapter, AdapterError, AdapterInfo, Capability, ChapterInfo, ImageRef, MangaMetadata,
    SearchSummary,
};
use manga_pipeline::download::{DownloadError, Downloader};
use wiremock::MockServer;

/// Adapter whose responses are fixed up front.
pub struct ScriptedAdapter {
    info: AdapterInfo,
    search_results: Vec<SearchSummary>,
    search_supported: bool,
    manga: HashMap<String, MangaMetadata>,
    images: HashMap<String, Vec<ImageRef>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    pub fn new(id: &str) -> Self {
        Self {
            info: AdapterInfo::new(id, format!("{id} site")).unwrap(),
            search_results: Vec::new(),
            search_supported: true,
            manga: HashMap::new(),
            images: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_search_results(mut self, results: Vec<SearchSummary>) -> Self {
        self.search_results = results;
        self
    }

    pub fn without_search(mut self) -> Self {
        self.search_supported = false;
        self
    }

    /// Registers a manga whose chapter `n` has native id `{id}-c{n}` and
    /// `pages` images.
    pub fn with_manga(mut self, id: &str, chapters: usize, pages: u32) -> Self {
        let metadata = manga(id, chapters);
        for chapter in &metadata.chapters {
            self.images
                .insert(chapter.native_id.clone(), page_refs(&chapter.native_id, pages));
        }
        self.manga.insert(id.to_string(), metadata);
        self
    }

    pub fn with_metadata(mut self, metadata: MangaMetadata) -> Self {
        self.manga.insert(metadata.id.clone(), metadata);
        self
    }

    /// Every adapter call so far, e.g. `search`, `info:berserk`,
    /// `images:berserk-c0`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Adapter for ScriptedAdapter {
    fn info(&self) -> &AdapterInfo {
        &self.info
    }

    async fn search(&self, _params: &SearchParams) -> Result<Vec<SearchSummary>, AdapterError> {
        self.record("search".to_string());
        if !self.search_supported {
            return Err(AdapterError::not_implemented(
                self.info.id(),
                Capability::Search,
            ));
        }
        Ok(self.search_results.clone())
    }

    async fn fetch_manga_info(&self, id: &str) -> Result<MangaMetadata, AdapterError> {
        self.record(format!("info:{id}"));
        self.manga
            .get(id)
            .cloned()
            .ok_or_else(|| AdapterError::failed(self.info.id(), format!("unknown manga {id}")))
    }

    async fn fetch_chapter_images(
        &self,
        native_chapter_id: &str,
    ) -> Result<Vec<ImageRef>, AdapterError> {
        self.record(format!("images:{native_chapter_id}"));
        self.images.get(native_chapter_id).cloned().ok_or_else(|| {
            AdapterError::failed(
                self.info.id(),
                format!("unknown chapter {native_chapter_id}"),
            )
        })
    }
}

/// Downloader that writes each URL as the file body and records calls.
#[derive(Default)]
pub struct RecordingDownloader {
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes downloads of `url` fail with HTTP 404.
    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for RecordingDownloader {
    async fn download_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));
        if self.failing.contains(url) {
            return Err(DownloadError::http_status(url, 404));
        }
        tokio::fs::write(dest, url.as_bytes())
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        Ok(url.len() as u64)
    }
}

/// Metadata with `chapters` chapters named `Chapter n`.
pub fn manga(id: &str, chapters: usize) -> MangaMetadata {
    let chapters = (0..chapters)
        .map(|n| ChapterInfo {
            name: format!("Chapter {n}"),
            native_id: format!("{id}-c{n}"),
            language: "en".to_string(),
            date: None,
        })
        .collect();
    MangaMetadata::new(id, id.to_uppercase(), chapters)
}

/// Page references `1..=pages` under a fake image host.
pub fn page_refs(native_chapter_id: &str, pages: u32) -> Vec<ImageRef> {
    (1..=pages)
        .map(|page| {
            ImageRef::new(
                page,
                format!("https://img.example.com/{native_chapter_id}/{page}.png"),
            )
        })
        .collect()
}

pub fn summary(id: &str, title: &str) -> SearchSummary {
    SearchSummary {
        title: title.to_string(),
        author: None,
        cover_image: None,
        opaque_id: id.to_string(),
    }
}

/// Starts a mock server, or returns `None` when localhost sockets are
/// unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        let required = std::env::var("MANGA_PIPELINE_REQUIRE_SOCKET_TESTS")
            .is_ok_and(|v| matches!(v.as_str(), "1" | "true" | "yes"));
        assert!(!required, "[socket-bound-test] cannot bind localhost socket");
        eprintln!("[socket-bound-test] cannot bind localhost socket. Skipping test.");
        return None;
    }
    Some(MockServer::start().await)
}
