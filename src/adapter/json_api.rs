//! Adapter for sites that expose a small JSON API.
//!
//! Routes, relative to the configured base URL:
//!
//! - `GET {base}/search?name=..&sort=..` returns `[SearchSummary]`
//! - `GET {base}/manga/{id}` returns `MangaMetadata`
//! - `GET {base}/chapters/{native_id}/images` returns `[ImageRef]`

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::{Adapter, AdapterError, AdapterInfo, Capability, ImageRef, MangaMetadata, SearchSummary};
use crate::action::SearchParams;
use crate::http::{HttpTimeouts, build_client};

/// [`Adapter`] backed by a JSON HTTP API.
#[derive(Clone)]
pub struct HttpJsonAdapter {
    info: AdapterInfo,
    base_url: String,
    client: Client,
    search_enabled: bool,
}

impl HttpJsonAdapter {
    /// Creates an adapter for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidMetadata`] if `base_url` is not an
    /// absolute http(s) URL, or [`AdapterError::Network`] if the HTTP client
    /// cannot be built.
    pub fn new(info: AdapterInfo, base_url: &str) -> Result<Self, AdapterError> {
        Self::with_timeouts(info, base_url, HttpTimeouts::default())
    }

    /// Creates an adapter with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    #[tracing::instrument(skip(info, timeouts), fields(adapter = %info.id()))]
    pub fn with_timeouts(
        info: AdapterInfo,
        base_url: &str,
        timeouts: HttpTimeouts,
    ) -> Result<Self, AdapterError> {
        let parsed = Url::parse(base_url).map_err(|e| AdapterError::InvalidMetadata {
            field: "base_url",
            reason: format!("'{base_url}' is not a valid URL ({e})"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AdapterError::InvalidMetadata {
                field: "base_url",
                reason: format!("'{base_url}' must use http or https"),
            });
        }

        let client = build_client(timeouts).map_err(|e| AdapterError::Network {
            adapter: info.id().to_string(),
            url: base_url.to_string(),
            message: format!("HTTP client construction failed: {e}"),
        })?;

        Ok(Self {
            info,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            search_enabled: true,
        })
    }

    /// Disables the search route. [`Adapter::search`] then reports
    /// [`AdapterError::NotImplemented`].
    #[must_use]
    pub fn without_search(mut self) -> Self {
        self.search_enabled = false;
        self
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, params: &SearchParams) -> Result<Url, AdapterError> {
        let raw = format!("{}/search", self.base_url);
        let mut url = Url::parse(&raw)
            .map_err(|e| AdapterError::decode(self.info.id(), &raw, e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(name) = &params.name {
                query.append_pair("name", name);
            }
            if let Some(id) = &params.id {
                query.append_pair("id", id);
            }
            if let Some(author) = &params.author {
                query.append_pair("author", author);
            }
            if let Some(range) = &params.date {
                if let Some(start) = range.start {
                    query.append_pair("dateStart", &start.to_string());
                }
                if let Some(end) = range.end {
                    query.append_pair("dateEnd", &end.to_string());
                }
            }
            for genre in params.genre_include.iter().flatten() {
                query.append_pair("genreInclude", genre);
            }
            for genre in params.genre_exclude.iter().flatten() {
                query.append_pair("genreExclude", genre);
            }
            query.append_pair("sort", params.sort.as_str());
            query.append_pair("sortOrder", params.sort_order.as_str());
            query.append_pair("language", &params.language);
            for status in &params.status {
                query.append_pair("status", status.as_str());
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AdapterError> {
        let adapter = self.info.id();
        debug!(url, "requesting");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "adapter request failed");
            AdapterError::from_reqwest(adapter, url, &e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "adapter request returned error status");
            return Err(AdapterError::HttpStatus {
                adapter: adapter.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AdapterError::from_reqwest(adapter, url, &e))?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(url, error = %e, "unexpected response format");
            AdapterError::decode(adapter, url, e.to_string())
        })
    }
}

impl std::fmt::Debug for HttpJsonAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJsonAdapter")
            .field("id", &self.info.id())
            .field("base_url", &self.base_url)
            .field("search_enabled", &self.search_enabled)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Adapter for HttpJsonAdapter {
    fn info(&self) -> &AdapterInfo {
        &self.info
    }

    #[tracing::instrument(skip(self, params), fields(adapter = %self.info.id()))]
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchSummary>, AdapterError> {
        if !self.search_enabled {
            return Err(AdapterError::not_implemented(
                self.info.id(),
                Capability::Search,
            ));
        }
        let url = self.search_url(params)?;
        self.get_json(url.as_str()).await
    }

    #[tracing::instrument(skip(self), fields(adapter = %self.info.id()))]
    async fn fetch_manga_info(&self, id: &str) -> Result<MangaMetadata, AdapterError> {
        let url = format!("{}/manga/{}", self.base_url, urlencoding::encode(id));
        let metadata: MangaMetadata = self.get_json(&url).await?;
        Ok(metadata.normalized())
    }

    #[tracing::instrument(skip(self), fields(adapter = %self.info.id()))]
    async fn fetch_chapter_images(
        &self,
        native_chapter_id: &str,
    ) -> Result<Vec<ImageRef>, AdapterError> {
        let url = format!(
            "{}/chapters/{}/images",
            self.base_url,
            urlencoding::encode(native_chapter_id)
        );
        let mut images: Vec<ImageRef> = self.get_json(&url).await?;
        images.sort_by_key(|image| image.page);
        Ok(images)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::action::{SortKey, SortOrder};
    use crate::test_support::start_mock_server_or_skip;

    fn adapter(base: &str) -> HttpJsonAdapter {
        HttpJsonAdapter::new(AdapterInfo::new("json", "JSON site").unwrap(), base).unwrap()
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let info = AdapterInfo::new("json", "JSON site").unwrap();
        let err = HttpJsonAdapter::new(info.clone(), "ftp://example.com").unwrap_err();
        assert!(matches!(err, AdapterError::InvalidMetadata { field: "base_url", .. }));
        assert!(HttpJsonAdapter::new(info, "not a url").is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(adapter("http://localhost:1/api/").base_url(), "http://localhost:1/api");
    }

    #[test]
    fn test_search_url_carries_parameters() {
        let params = SearchParams {
            name: Some("one piece".to_string()),
            genre_include: Some(vec!["action".to_string(), "comedy".to_string()]),
            sort: SortKey::Top,
            sort_order: SortOrder::Asc,
            ..SearchParams::default()
        };
        let url = adapter("http://localhost:1").search_url(&params).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/search");
        assert!(pairs.contains(&("name".to_string(), "one piece".to_string())));
        assert!(pairs.contains(&("genreInclude".to_string(), "comedy".to_string())));
        assert!(pairs.contains(&("sort".to_string(), "top".to_string())));
        assert!(pairs.contains(&("sortOrder".to_string(), "asc".to_string())));
        assert_eq!(pairs.iter().filter(|(k, _)| k == "status").count(), 2);
    }

    #[tokio::test]
    async fn test_search_disabled_is_not_implemented() {
        let adapter = adapter("http://localhost:1").without_search();
        let err = adapter.search(&SearchParams::default()).await.unwrap_err();
        assert_eq!(err, AdapterError::not_implemented("json", Capability::Search));
    }

    #[tokio::test]
    async fn test_search_decodes_results() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "berserk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"title": "Berserk", "author": "Miura", "opaqueId": "b-1"}
            ])))
            .mount(&mock_server)
            .await;

        let results = adapter(&mock_server.uri())
            .search(&SearchParams::by_name("berserk"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].opaque_id, "b-1");
        assert_eq!(results[0].author.as_deref(), Some("Miura"));
    }

    #[tokio::test]
    async fn test_manga_id_is_percent_encoded() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/manga/a%2Fb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "a/b",
                "title": "Slashed",
                "chapters": [{"name": "1", "nativeId": "x"}]
            })))
            .mount(&mock_server)
            .await;

        let meta = adapter(&mock_server.uri()).fetch_manga_info("a/b").await.unwrap();
        assert_eq!(meta.id, "a/b");
        assert_eq!(meta.chapter_count, 1);
    }

    #[tokio::test]
    async fn test_chapter_images_sorted_by_page() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/chapters/c-9/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"page": 3, "url": "http://img/3.png"},
                {"page": 1, "url": "http://img/1.png"},
                {"page": 2, "url": "http://img/2.png"}
            ])))
            .mount(&mock_server)
            .await;

        let images = adapter(&mock_server.uri())
            .fetch_chapter_images("c-9")
            .await
            .unwrap();
        let pages: Vec<u32> = images.iter().map(|i| i.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_error_status_maps_to_http_status() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = adapter(&mock_server.uri()).fetch_manga_info("missing").await.unwrap_err();
        assert!(matches!(err, AdapterError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_decode() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
            .mount(&mock_server)
            .await;

        let err = adapter(&mock_server.uri())
            .fetch_chapter_images("c")
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Decode { .. }));
    }
}
