//! Wallpaper entity model.
//!
//! A [`Wallpaper`] is an immutable id plus a loosely structured attribute bag
//! ([`Payload`]) merged from successive partial payloads: search rows are
//! sparse, detail payloads are comprehensive. Typed accessors parse on demand
//! and return `None` when a field is missing or malformed; they never fail.

mod mask;
mod tags;

use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;

pub use mask::{Category, MaskParseError, Purity};
pub use tags::{Tag, Tags};

/// Raw attribute bag as returned by the catalog API.
pub type Payload = Map<String, Value>;

/// Sentinel stored in `path` when the detail fetch for a wallpaper failed.
pub const ERROR_PATH: &str = "ERROR";

/// Timestamp format used by the catalog (`2024-05-01 08:15:00`).
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors constructing a [`Wallpaper`] from a payload.
#[derive(Debug, Error)]
pub enum WallpaperError {
    /// The payload has no string `id` member.
    #[error("wallpaper payload has no string 'id' field")]
    MissingId,
}

/// A remotely hosted wallpaper identified by a stable id.
///
/// Equality and hashing use the id only.
#[derive(Debug, Clone)]
pub struct Wallpaper {
    id: String,
    attributes: Payload,
}

impl Wallpaper {
    /// Creates a minimal id-only wallpaper awaiting enrichment.
    #[must_use]
    pub fn stub(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut attributes = Payload::new();
        attributes.insert("id".to_string(), Value::String(id.clone()));
        Self { id, attributes }
    }

    /// Creates a wallpaper from a search row or detail payload.
    ///
    /// # Errors
    ///
    /// Returns [`WallpaperError::MissingId`] when the payload lacks a string `id`.
    pub fn from_payload(attributes: Payload) -> Result<Self, WallpaperError> {
        let id = attributes
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(WallpaperError::MissingId)?
            .to_string();
        Ok(Self { id, attributes })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw attribute bag.
    #[must_use]
    pub fn attributes(&self) -> &Payload {
        &self.attributes
    }

    /// Shallow-merges `payload` into this wallpaper.
    ///
    /// Keys present in `payload` overwrite existing values; keys absent from it
    /// are kept. A conflicting `id` is ignored.
    pub fn merge(&mut self, payload: &Payload) {
        for (key, value) in payload {
            if key == "id" {
                continue;
            }
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    /// Marks the wallpaper's remote path with the [`ERROR_PATH`] sentinel.
    pub fn mark_error(&mut self) {
        self.attributes
            .insert("path".to_string(), Value::String(ERROR_PATH.to_string()));
    }

    /// Whether the remote path is the [`ERROR_PATH`] sentinel.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.path() == Some(ERROR_PATH)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    fn u64_field(&self, key: &str) -> Option<u64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Direct URL of the full-size image file.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.str_field("path")
    }

    /// Catalog page URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    #[must_use]
    pub fn short_url(&self) -> Option<&str> {
        self.str_field("short_url")
    }

    /// Original source reported by the uploader, when any.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.str_field("source").filter(|s| !s.is_empty())
    }

    /// MIME type of the image file (`image/jpeg`).
    #[must_use]
    pub fn file_type(&self) -> Option<&str> {
        self.str_field("file_type")
    }

    /// File size in bytes.
    #[must_use]
    pub fn file_size(&self) -> Option<u64> {
        self.u64_field("file_size")
            .or_else(|| self.u64_field("filesize"))
    }

    /// Width and height in pixels.
    #[must_use]
    pub fn resolution(&self) -> Option<(u32, u32)> {
        if let Some(parsed) = self.str_field("resolution").and_then(parse_dimensions) {
            return Some(parsed);
        }
        let width = u32::try_from(self.u64_field("dimension_x")?).ok()?;
        let height = u32::try_from(self.u64_field("dimension_y")?).ok()?;
        Some((width, height))
    }

    /// Aspect ratio (width / height).
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        let ratio: f64 = match self.attributes.get("ratio")? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        ratio.is_finite().then_some(ratio)
    }

    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.str_field("category").and_then(Category::from_name)
    }

    #[must_use]
    pub fn purity(&self) -> Option<Purity> {
        self.str_field("purity").and_then(Purity::from_name)
    }

    /// Tag set; only present after a detail fetch.
    #[must_use]
    pub fn tags(&self) -> Option<Tags> {
        self.attributes
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| Tags::from_json(items))
    }

    /// Dominant colours as hex strings (`#336600`).
    #[must_use]
    pub fn colors(&self) -> Option<Vec<String>> {
        let items = self.attributes.get("colors")?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    #[must_use]
    pub fn views(&self) -> Option<u64> {
        self.u64_field("views")
    }

    #[must_use]
    pub fn favorites(&self) -> Option<u64> {
        self.u64_field("favorites")
    }

    /// Upload timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.str_field("created_at")
            .and_then(|raw| NaiveDateTime::parse_from_str(raw.trim(), CREATED_AT_FORMAT).ok())
    }

    /// Upload date (the date part of [`created_at`](Self::created_at)).
    #[must_use]
    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at().map(|at| at.date())
    }
}

impl PartialEq for Wallpaper {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Wallpaper {}

impl Hash for Wallpaper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Parses a `<width>x<height>` string.
#[must_use]
pub fn parse_dimensions(raw: &str) -> Option<(u32, u32)> {
    let (width, height) = raw.trim().split_once('x')?;
    Some((width.parse().ok()?, height.parse().ok()?))
}
