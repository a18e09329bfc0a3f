use serde::Serialize;
use std::fmt;

use super::lock::SyncClass;
use crate::store::StoreError;

/// An item that could not be published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub error: StoreError,
}

/// Outcome of one category or recipe sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub class: SyncClass,
    pub restaurant_id: String,
    /// Another run of this class was in flight; nothing was done.
    pub coalesced: bool,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    /// Creates that lost a race to another writer. The item is published.
    pub conflicts: Vec<String>,
    /// Orphans removed from the public mirror.
    pub pruned: Vec<String>,
    /// Private documents that could not be decoded.
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

impl SyncReport {
    pub fn new(class: SyncClass, restaurant_id: impl Into<String>) -> Self {
        Self {
            class,
            restaurant_id: restaurant_id.into(),
            coalesced: false,
            created: Vec::new(),
            updated: Vec::new(),
            conflicts: Vec::new(),
            pruned: Vec::new(),
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn coalesced(class: SyncClass, restaurant_id: impl Into<String>) -> Self {
        Self {
            coalesced: true,
            ..Self::new(class, restaurant_id)
        }
    }

    /// Items now present in the public mirror.
    pub fn published(&self) -> usize {
        self.created.len() + self.updated.len() + self.conflicts.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coalesced {
            return write!(f, "{}: already in progress, skipped", self.class);
        }
        write!(
            f,
            "{}: {} published ({} created, {} updated, {} conflicts), {} pruned",
            self.class,
            self.published(),
            self.created.len(),
            self.updated.len(),
            self.conflicts.len(),
            self.pruned.len()
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        for failure in &self.failures {
            write!(f, "\n  failed {}: {}", failure.id, failure.error)?;
        }
        Ok(())
    }
}

/// Outcome of syncing both categories and recipes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullSyncReport {
    pub restaurant_id: String,
    pub coalesced: bool,
    pub categories: Option<SyncReport>,
    pub recipes: Option<SyncReport>,
}

impl FullSyncReport {
    pub fn coalesced(restaurant_id: impl Into<String>) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            coalesced: true,
            categories: None,
            recipes: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.categories.iter().chain(&self.recipes).all(SyncReport::is_clean)
    }
}

impl fmt::Display for FullSyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coalesced {
            return write!(f, "all: already in progress, skipped");
        }
        let reports: Vec<String> = self
            .categories
            .iter()
            .chain(&self.recipes)
            .map(ToString::to_string)
            .collect();
        write!(f, "{}", reports.join("\n"))
    }
}
