//! Content catalog: the collection, its filters, and the active selection.

use std::collections::HashSet;

use thiserror::Error;

use cue_types::{ContentError, ContentId, ContentItem, ContentKind};

/// Conjunctive filter over the catalog. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub pillar: Option<String>,
    pub kind: Option<ContentKind>,
    /// Case-insensitive substring of the title.
    pub text_query: Option<String>,
}

impl ContentFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pillar(mut self, pillar: impl Into<String>) -> Self {
        self.pillar = Some(pillar.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.text_query = Some(query.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pillar.is_none() && self.kind.is_none() && self.query().is_none()
    }

    #[must_use]
    pub fn matches(&self, item: &ContentItem) -> bool {
        if let Some(pillar) = &self.pillar
            && item.pillar_id() != pillar
        {
            return false;
        }
        if let Some(kind) = self.kind
            && item.kind() != kind
        {
            return false;
        }
        match self.query() {
            Some(query) => item.title().to_lowercase().contains(&query.to_lowercase()),
            None => true,
        }
    }

    fn query(&self) -> Option<&str> {
        self.text_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Result of asking the catalog to make an item active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A different item is now active; engagement state must be rebuilt.
    Changed { previous: Option<ContentId> },
    /// The item was already active.
    Unchanged,
    /// No such id; the active item is untouched.
    NotFound,
}

/// A record that did not survive validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub index: usize,
    pub id: Option<String>,
    pub error: ContentError,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog must be a JSON array of content records: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct Catalog {
    items: Vec<ContentItem>,
    active: Option<usize>,
    rejected: Vec<RejectedRecord>,
}

impl Catalog {
    /// Build from validated items. Later duplicates of an id are rejected.
    #[must_use]
    pub fn new(items: Vec<ContentItem>) -> Self {
        let mut catalog = Self::default();
        for (index, item) in items.into_iter().enumerate() {
            catalog.push(index, item);
        }
        catalog
    }

    /// Build from a JSON array. Each record is validated on its own; bad
    /// records are skipped and listed in [`rejected`](Self::rejected).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for (index, record) in records.into_iter().enumerate() {
            let id = record
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);
            match ContentItem::from_value(record) {
                Ok(item) => catalog.push(index, item),
                Err(error) => {
                    tracing::warn!(index, id = ?id, "rejected content record: {error}");
                    catalog.rejected.push(RejectedRecord { index, id, error });
                }
            }
        }
        Ok(catalog)
    }

    fn push(&mut self, index: usize, item: ContentItem) {
        if self.items.iter().any(|existing| existing.id() == item.id()) {
            let id = item.id().to_string();
            tracing::warn!(index, id = %id, "duplicate content id");
            self.rejected.push(RejectedRecord {
                index,
                id: Some(id.clone()),
                error: ContentError::Malformed(format!("duplicate id {id}")),
            });
            return;
        }
        self.items.push(item);
    }

    #[must_use]
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.id().as_str() == id)
    }

    /// Matching items in catalog order.
    #[must_use]
    pub fn filter(&self, filter: &ContentFilter) -> Vec<&ContentItem> {
        self.items.iter().filter(|item| filter.matches(item)).collect()
    }

    /// Distinct pillar ids in first-seen order.
    #[must_use]
    pub fn pillars(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(ContentItem::pillar_id)
            .filter(|pillar| seen.insert(*pillar))
            .collect()
    }

    pub fn select(&mut self, id: &str) -> Selection {
        let Some(index) = self.items.iter().position(|item| item.id().as_str() == id) else {
            tracing::debug!(id, "selection ignored: unknown content id");
            return Selection::NotFound;
        };
        if self.active == Some(index) {
            return Selection::Unchanged;
        }
        let previous = self.active().map(|item| item.id().clone());
        self.active = Some(index);
        Selection::Changed { previous }
    }

    #[must_use]
    pub fn active(&self) -> Option<&ContentItem> {
        self.active.and_then(|index| self.items.get(index))
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }
}
