//! Tag set attached to a wallpaper detail payload.

use std::collections::BTreeMap;

use serde_json::Value;

use super::Purity;

/// A single tag as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub alias: Option<String>,
    pub category: Option<String>,
    pub purity: Option<Purity>,
}

/// Tags keyed by their numeric id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags {
    tags: BTreeMap<u64, Tag>,
}

impl Tags {
    /// Builds the tag set from the raw `tags` array. Entries without a numeric
    /// `id` or a string `name` are skipped.
    #[must_use]
    pub fn from_json(items: &[Value]) -> Self {
        let tags = items
            .iter()
            .filter_map(|item| {
                let id = item.get("id")?.as_u64()?;
                let name = item.get("name")?.as_str()?.to_string();
                let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
                Some((
                    id,
                    Tag {
                        id,
                        name,
                        alias: text("alias").filter(|alias| !alias.is_empty()),
                        category: text("category"),
                        purity: text("purity").and_then(|p| Purity::from_name(&p)),
                    },
                ))
            })
            .collect();
        Self { tags }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Looks up by numeric id when `key` is all digits, else by
    /// case-insensitive tag name.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let key = key.trim();
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            return key.parse::<u64>().is_ok_and(|id| self.tags.contains_key(&id));
        }
        self.tags
            .values()
            .any(|tag| tag.name.eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// Tag names in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.values().map(|tag| tag.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }
}
