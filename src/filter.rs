//! Chainable selection over a set of wallpapers.
//!
//! Each [`Filter::by`] call narrows the collection along one dimension.
//! Wallpapers missing the filtered attribute are excluded: range filters
//! substitute a value outside any plausible range and mask filters treat the
//! value as an empty mask.
//!
//! ```
//! use wallfetch_core::filter::{By, Filter};
//! use wallfetch_core::wallpaper::{Category, Purity};
//!
//! let selection = Filter::new(Vec::new())
//!     .by(By::Purity(Purity::SFW))
//!     .by(By::Category(Category::GENERAL | Category::ANIME))
//!     .by(By::ratio(1.5, 2.0));
//! assert!(selection.is_empty());
//! ```

use chrono::NaiveDate;
use tracing::debug;

use crate::cache::Cache;
use crate::wallpaper::{Category, Purity, Wallpaper};

/// Date substituted for wallpapers without an upload date.
const MISSING_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1899, 12, 31) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

const DEFAULT_AFTER: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

const DEFAULT_BEFORE: NaiveDate = match NaiveDate::from_ymd_opt(2099, 12, 31) {
    Some(date) => date,
    None => NaiveDate::MAX,
};

/// A single selection predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum By {
    /// Aspect ratio within `[min, max]`.
    Ratio { min: f64, max: f64 },
    /// Purity intersects the mask.
    Purity(Purity),
    /// Category intersects the mask.
    Category(Category),
    /// Upload date within `[after, before]`.
    CreatedDate { after: NaiveDate, before: NaiveDate },
}

impl By {
    #[must_use]
    pub fn ratio(min: f64, max: f64) -> Self {
        Self::Ratio { min, max }
    }

    /// Date range with open ends replaced by the default bounds.
    #[must_use]
    pub fn created_date(after: Option<NaiveDate>, before: Option<NaiveDate>) -> Self {
        Self::CreatedDate {
            after: after.unwrap_or(DEFAULT_AFTER),
            before: before.unwrap_or(DEFAULT_BEFORE),
        }
    }

    /// Whether `wallpaper` passes this predicate.
    #[must_use]
    pub fn matches(&self, wallpaper: &Wallpaper) -> bool {
        match *self {
            Self::Ratio { min, max } => wallpaper
                .ratio()
                .is_some_and(|ratio| (min..=max).contains(&ratio)),
            Self::Purity(mask) => wallpaper.purity().unwrap_or(Purity::NONE).intersects(mask),
            Self::Category(mask) => wallpaper
                .category()
                .unwrap_or(Category::NONE)
                .intersects(mask),
            Self::CreatedDate { after, before } => {
                let date = wallpaper.created_date().unwrap_or(MISSING_DATE);
                (after..=before).contains(&date)
            }
        }
    }
}

/// An owned, narrowed collection of wallpapers.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    wallpapers: Vec<Wallpaper>,
}

impl Filter {
    #[must_use]
    pub fn new(wallpapers: Vec<Wallpaper>) -> Self {
        Self { wallpapers }
    }

    /// Starts from every cached wallpaper, ordered by id.
    #[must_use]
    pub fn from_cache(cache: &Cache) -> Self {
        Self::new(cache.wallpapers())
    }

    /// Starts from the cached wallpapers with the given ids, in the given order.
    #[must_use]
    pub fn from_ids<I, S>(cache: &Cache, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wallpapers = ids
            .into_iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let found = cache.wallpaper(id);
                if found.is_none() {
                    debug!(id, "id not in cache, skipping");
                }
                found
            })
            .collect();
        Self::new(wallpapers)
    }

    /// Keeps only the wallpapers matching `by`.
    #[must_use]
    pub fn by(self, by: By) -> Self {
        let before = self.wallpapers.len();
        let wallpapers: Vec<Wallpaper> = self
            .wallpapers
            .into_iter()
            .filter(|wallpaper| by.matches(wallpaper))
            .collect();
        debug!(?by, before, after = wallpapers.len(), "filter applied");
        Self { wallpapers }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wallpapers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wallpapers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wallpaper> {
        self.wallpapers.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Wallpaper> {
        self.wallpapers.get(index)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Wallpaper> {
        self.wallpapers
    }
}

impl IntoIterator for Filter {
    type Item = Wallpaper;
    type IntoIter = std::vec::IntoIter<Wallpaper>;

    fn into_iter(self) -> Self::IntoIter {
        self.wallpapers.into_iter()
    }
}
