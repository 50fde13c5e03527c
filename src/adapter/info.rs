//! Adapter identity and descriptive metadata.

use std::fmt;

use super::AdapterError;

/// Description used when an adapter does not supply one.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";
/// Author used when an adapter does not supply one.
pub const DEFAULT_AUTHOR: &str = "Anonymous";
/// Version used when an adapter does not supply one.
pub const DEFAULT_VERSION: &str = "Unknown version";
/// Language used when an adapter does not supply one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Operational traits of a site that callers may want to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterTag {
    /// Pages need a real browser to render.
    HeadlessBrowser,
    /// The site actively blocks automated traffic.
    AntiBot,
    /// Only a subset of search parameters is honoured.
    LimitedSearch,
    /// The site throttles aggressive clients.
    RateLimited,
}

impl AdapterTag {
    /// Returns the kebab-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeadlessBrowser => "headless-browser",
            Self::AntiBot => "anti-bot",
            Self::LimitedSearch => "limited-search",
            Self::RateLimited => "rate-limited",
        }
    }
}

impl fmt::Display for AdapterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an adapter.
///
/// `id` and `name` are mandatory; everything else has a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    id: String,
    name: String,
    description: String,
    author: String,
    version: String,
    language: String,
    tags: Vec<AdapterTag>,
}

impl AdapterInfo {
    /// Creates metadata with defaults for every optional field.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidMetadata`] if `id` or `name` is blank.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, AdapterError> {
        let id = id.into().trim().to_string();
        let name = name.into().trim().to_string();
        if id.is_empty() {
            return Err(AdapterError::InvalidMetadata {
                field: "id",
                reason: "must not be empty".to_string(),
            });
        }
        if name.is_empty() {
            return Err(AdapterError::InvalidMetadata {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            id,
            name,
            description: DEFAULT_DESCRIPTION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            version: DEFAULT_VERSION.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            tags: Vec::new(),
        })
    }

    /// Sets the description. Blank input keeps the default.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        set_non_blank(&mut self.description, description.into());
        self
    }

    /// Sets the author. Blank input keeps the default.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        set_non_blank(&mut self.author, author.into());
        self
    }

    /// Sets the version. Blank input keeps the default.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        set_non_blank(&mut self.version, version.into());
        self
    }

    /// Sets the language. Blank input keeps the default.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        set_non_blank(&mut self.language, language.into());
        self
    }

    /// Adds a tag. Duplicates are ignored.
    #[must_use]
    pub fn with_tag(mut self, tag: AdapterTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn tags(&self) -> &[AdapterTag] {
        &self.tags
    }

    /// Returns true if the adapter carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: AdapterTag) -> bool {
        self.tags.contains(&tag)
    }
}

fn set_non_blank(slot: &mut String, value: String) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        *slot = trimmed.to_string();
    }
}
