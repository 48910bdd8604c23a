use pubkv_core::{PubKvError, Result};

/// Connection settings for a Redis server or a Sentinel deployment.
///
/// When `sentinel_urls` is non-empty the config describes a
/// high-availability target and `url` is ignored.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_urls: Vec<String>,
    /// Group (master name) to resolve through the sentinels
    pub sentinel_group: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            sentinel_urls: Vec::new(),
            sentinel_group: None,
        }
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Config resolving `group` through the given sentinels
    pub fn sentinel<I, S>(urls: I, group: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default()
            .with_sentinel_urls(urls)
            .with_sentinel_group(group)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_sentinel_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sentinel_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sentinel_group(mut self, group: impl Into<String>) -> Self {
        self.sentinel_group = Some(group.into());
        self
    }

    pub fn is_sentinel(&self) -> bool {
        !self.sentinel_urls.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_sentinel() {
            if self.sentinel_urls.iter().any(|url| url.is_empty()) {
                return Err(PubKvError::configuration("sentinel url cannot be empty"));
            }
            if self.sentinel_group.as_deref().map_or(true, str::is_empty) {
                return Err(PubKvError::configuration(
                    "a sentinel group name is required when sentinel urls are set",
                ));
            }
        } else if self.url.is_empty() {
            return Err(PubKvError::configuration("redis url cannot be empty"));
        }
        Ok(())
    }
}
