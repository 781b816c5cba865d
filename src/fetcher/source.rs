//! Producers of the initial wallpaper list for a run.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::FetchError;
use crate::api::{ApiClient, ApiError, SearchQuery, Sorting};
use crate::wallpaper::{Category, Purity, Wallpaper};

/// Something that yields the wallpapers a run operates on.
///
/// Uses `async_trait` so sources can be passed as `&dyn WallpaperSource`.
#[async_trait]
pub trait WallpaperSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Collects the wallpaper handles, in order.
    async fn collect(&self, api: &ApiClient) -> Result<Vec<Wallpaper>, FetchError>;
}

/// Fixed list of wallpaper ids, each wrapped in a stub.
#[derive(Debug, Clone, Default)]
pub struct IdSource {
    ids: Vec<String>,
}

impl IdSource {
    /// Trims ids, drops blank ones and removes duplicates keeping first occurrence.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let ids = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self { ids }
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

#[async_trait]
impl WallpaperSource for IdSource {
    fn describe(&self) -> String {
        format!("{} id(s)", self.ids.len())
    }

    async fn collect(&self, _api: &ApiClient) -> Result<Vec<Wallpaper>, FetchError> {
        Ok(self.ids.iter().map(Wallpaper::stub).collect())
    }
}

/// Latest uploads, one search request per page, sorted by date added.
#[derive(Debug, Clone)]
pub struct LatestSource {
    pages: Vec<u32>,
    purity: Purity,
    categories: Category,
}

impl LatestSource {
    #[must_use]
    pub fn new(pages: Vec<u32>, purity: Purity, categories: Category) -> Self {
        Self {
            pages,
            purity,
            categories,
        }
    }

    #[must_use]
    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    fn query(&self, page: u32) -> SearchQuery {
        SearchQuery::new()
            .purity(self.purity)
            .categories(self.categories)
            .sorting(Sorting::DateAdded)
            .page(page)
    }
}

#[async_trait]
impl WallpaperSource for LatestSource {
    fn describe(&self) -> String {
        format!(
            "latest {} page(s), purity {}, categories {}",
            self.pages.len(),
            self.purity,
            self.categories
        )
    }

    async fn collect(&self, api: &ApiClient) -> Result<Vec<Wallpaper>, FetchError> {
        let mut wallpapers = Vec::new();
        for &page in &self.pages {
            let query = self.query(page);
            query.validate()?;

            match api.search(&query).await {
                Ok(found) => {
                    debug!(page, count = found.len(), "search page collected");
                    wallpapers.extend(found);
                }
                Err(ApiError::InvalidQuery(error)) => return Err(error.into()),
                Err(error) => warn!(page, %error, "skipping search page"),
            }
        }
        info!(count = wallpapers.len(), "collected latest wallpapers");
        Ok(wallpapers)
    }
}
