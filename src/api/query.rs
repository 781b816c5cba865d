//! Search filter construction and validation.
//!
//! [`SearchQuery`] collects the optional filters accepted by the search
//! endpoint. [`SearchQuery::to_query_pairs`] validates them and renders the
//! query string parameters; malformed input is rejected here, before any
//! request is sent.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::wallpaper::{Category, Purity};

/// `<width>x<height>` dimension strings.
#[allow(clippy::expect_used)]
static DIMENSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+x[0-9]+$").expect("dimension regex is valid") // Static pattern, safe to panic
});

/// Ratio keywords accepted besides `<w>x<h>`.
const RATIO_KEYWORDS: &[&str] = &["landscape", "portrait"];

/// Colour codes accepted by the `colors` filter.
pub const COLOR_PALETTE: &[&str] = &[
    "660000", "990000", "cc0000", "cc3333", "ea4c88", "993399", "663399", "333399", "0066cc",
    "0099cc", "66cccc", "77cc33", "669900", "336600", "666600", "999900", "cccc33", "ffff00",
    "ffcc33", "ff9900", "ff6600", "cc6633", "996633", "663300", "000000", "999999", "cccccc",
    "ffffff", "424153",
];

/// Search filter validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A dimension string does not match `<int>x<int>`.
    #[error("'{value}' is not a valid {field} value (expected <width>x<height>)")]
    InvalidDimension {
        /// The filter name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// `top_range` was supplied without `sorting = toplist`.
    #[error("top_range must be used with sorting = toplist")]
    TopRangeWithoutToplist,

    /// A colour code outside the supported palette.
    #[error("'{0}' is not a supported color code")]
    UnknownColor(String),

    /// A keyword that does not name any variant.
    #[error("'{value}' is not a valid {field}")]
    UnknownKeyword {
        /// The filter name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Query string value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = QueryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(QueryError::UnknownKeyword {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

keyword_enum!(
    /// Result ordering key.
    Sorting, "sorting" {
        DateAdded => "date_added",
        Relevance => "relevance",
        Random => "random",
        Views => "views",
        Favorites => "favorites",
        Toplist => "toplist",
    }
);

keyword_enum!(
    /// Sort direction.
    SortingOrder, "order" {
        Desc => "desc",
        Asc => "asc",
    }
);

keyword_enum!(
    /// Time window for `sorting = toplist`.
    TopRange, "top range" {
        OneDay => "1d",
        ThreeDays => "3d",
        OneWeek => "1w",
        OneMonth => "1M",
        ThreeMonths => "3M",
        SixMonths => "6M",
        OneYear => "1y",
    }
);

/// A colour from the search palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(&'static str);

impl Color {
    /// Hex code without the leading `#`.
    #[must_use]
    pub fn as_hex(self) -> &'static str {
        self.0
    }
}

impl FromStr for Color {
    type Err = QueryError;

    /// Accepts `"336600"` or `"#336600"`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().trim_start_matches('#').to_ascii_lowercase();
        COLOR_PALETTE
            .iter()
            .find(|candidate| **candidate == code)
            .map(|candidate| Self(*candidate))
            .ok_or_else(|| QueryError::UnknownColor(s.to_string()))
    }
}

/// Optional filters for the search endpoint.
///
/// # Example
///
/// ```
/// use wallfetch_core::api::{SearchQuery, Sorting};
/// use wallfetch_core::wallpaper::{Category, Purity};
///
/// let query = SearchQuery::new()
///     .purity(Purity::SFW | Purity::SKETCHY)
///     .categories(Category::ALL)
///     .sorting(Sorting::DateAdded)
///     .page(3);
/// let pairs = query.to_query_pairs().unwrap();
/// assert!(pairs.contains(&("purity", "110".to_string())));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub categories: Option<Category>,
    pub purity: Option<Purity>,
    pub sorting: Option<Sorting>,
    pub order: Option<SortingOrder>,
    pub top_range: Option<TopRange>,
    /// Minimum resolution (`1920x1080`).
    pub atleast: Option<String>,
    /// Exact resolutions (`1920x1080`), comma-joined on the wire.
    pub resolutions: Option<Vec<String>>,
    /// Aspect ratios (`16x9`, `landscape`), comma-joined on the wire.
    pub ratios: Option<Vec<String>>,
    pub colors: Option<Color>,
    pub page: Option<u32>,
    /// Seed returned by `sorting = random` to page without repeats.
    pub seed: Option<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    #[must_use]
    pub fn categories(mut self, categories: Category) -> Self {
        self.categories = Some(categories);
        self
    }

    #[must_use]
    pub fn purity(mut self, purity: Purity) -> Self {
        self.purity = Some(purity);
        self
    }

    #[must_use]
    pub fn sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = Some(sorting);
        self
    }

    #[must_use]
    pub fn order(mut self, order: SortingOrder) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn top_range(mut self, top_range: TopRange) -> Self {
        self.top_range = Some(top_range);
        self
    }

    #[must_use]
    pub fn atleast(mut self, atleast: impl Into<String>) -> Self {
        self.atleast = Some(atleast.into());
        self
    }

    #[must_use]
    pub fn resolutions<I, S>(mut self, resolutions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolutions = Some(resolutions.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn ratios<I, S>(mut self, ratios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ratios = Some(ratios.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn colors(mut self, colors: Color) -> Self {
        self.colors = Some(colors);
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Checks the filter combination without rendering it.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] for a `top_range` without toplist sorting or a
    /// malformed dimension string.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.top_range.is_some() && self.sorting != Some(Sorting::Toplist) {
            return Err(QueryError::TopRangeWithoutToplist);
        }

        if let Some(atleast) = &self.atleast {
            verify_dimension("atleast", atleast)?;
        }
        for resolution in self.resolutions.iter().flatten() {
            verify_dimension("resolutions", resolution)?;
        }
        for ratio in self.ratios.iter().flatten() {
            if !RATIO_KEYWORDS.contains(&ratio.as_str()) {
                verify_dimension("ratios", ratio)?;
            }
        }
        Ok(())
    }

    /// Validates and renders the query string parameters.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate).
    pub fn to_query_pairs(&self) -> Result<Vec<(&'static str, String)>, QueryError> {
        self.validate()?;

        let mut pairs = Vec::new();
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(categories) = self.categories {
            pairs.push(("categories", categories.to_string()));
        }
        if let Some(purity) = self.purity {
            pairs.push(("purity", purity.to_string()));
        }
        if let Some(sorting) = self.sorting {
            pairs.push(("sorting", sorting.as_str().to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        if let Some(top_range) = self.top_range {
            pairs.push(("topRange", top_range.as_str().to_string()));
        }
        if let Some(atleast) = &self.atleast {
            pairs.push(("atleast", atleast.clone()));
        }
        if let Some(resolutions) = &self.resolutions {
            pairs.push(("resolutions", resolutions.join(",")));
        }
        if let Some(ratios) = &self.ratios {
            pairs.push(("ratios", ratios.join(",")));
        }
        if let Some(colors) = self.colors {
            pairs.push(("colors", colors.as_hex().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(seed) = &self.seed {
            pairs.push(("seed", seed.clone()));
        }
        Ok(pairs)
    }
}

fn verify_dimension(field: &'static str, value: &str) -> Result<(), QueryError> {
    if DIMENSION_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(QueryError::InvalidDimension {
            field,
            value: value.to_string(),
        })
    }
}
