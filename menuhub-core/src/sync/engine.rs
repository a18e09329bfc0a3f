//! Republishes private catalog collections into the public mirror.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SyncError;
use super::lock::{SyncClass, SyncLocks, SyncStatus};
use super::report::{FullSyncReport, ItemFailure, SyncReport};
use crate::codec::{decode, Document, Fields};
use crate::models::{CatalogKind, Category, Recipe};
use crate::store::{Credential, DocumentStore, StoreError};

/// What happens to public items whose private counterpart is gone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retention {
    /// Delete this restaurant's public items that are no longer private.
    #[default]
    Prune,
    /// Leave them; the mirror only grows or updates.
    Retain,
}

impl Retention {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "prune" => Some(Retention::Prune),
            "retain" => Some(Retention::Retain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Retention::Prune => "prune",
            Retention::Retain => "retain",
        }
    }
}

/// Result of publishing one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
    /// The create raced another writer; the item is already published.
    AlreadyExists,
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Sync engine for one store.
///
/// Each run reads a restaurant's whole private collection and upserts every
/// item into the public one. Runs of the same class coalesce: a run started
/// while another is in flight returns at once with `coalesced` set.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn DocumentStore>,
    locks: Arc<SyncLocks>,
    retention: Retention,
    clock: Clock,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("locks", &self.locks)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_locks(store, Arc::new(SyncLocks::new()))
    }

    pub fn with_locks(store: Arc<dyn DocumentStore>, locks: Arc<SyncLocks>) -> Self {
        Self {
            store,
            locks,
            retention: Retention::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Replaces the time source used for `updatedAt`.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn locks(&self) -> &Arc<SyncLocks> {
        &self.locks
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn status(&self) -> SyncStatus {
        self.locks.status()
    }

    pub async fn sync_categories(
        &self,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<SyncReport, SyncError> {
        self.sync_kind(CatalogKind::Categories, restaurant_id, credential)
            .await
    }

    pub async fn sync_recipes(
        &self,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<SyncReport, SyncError> {
        self.sync_kind(CatalogKind::Recipes, restaurant_id, credential)
            .await
    }

    /// Syncs categories, then recipes. Recipes are not started when the
    /// category run fails. When recipes fail, the published categories are
    /// returned inside [`SyncError::Incomplete`].
    pub async fn sync_all(
        &self,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<FullSyncReport, SyncError> {
        let Some(_guard) = self.locks.try_acquire(SyncClass::All) else {
            tracing::warn!(restaurant_id, "Full sync already in progress, skipping");
            return Ok(FullSyncReport::coalesced(restaurant_id));
        };

        let categories = self.sync_categories(restaurant_id, credential).await?;
        let recipes = match self.sync_recipes(restaurant_id, credential).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(restaurant_id, categories = %categories, error = %e, "Full sync stopped at recipes");
                return Err(SyncError::Incomplete {
                    completed: Box::new(categories),
                    source: Box::new(e),
                });
            }
        };
        tracing::info!(restaurant_id, "Synced all data to public collections");

        Ok(FullSyncReport {
            restaurant_id: restaurant_id.to_string(),
            coalesced: false,
            categories: Some(categories),
            recipes: Some(recipes),
        })
    }

    pub async fn sync_kind(
        &self,
        kind: CatalogKind,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<SyncReport, SyncError> {
        let class = class_for(kind);
        let Some(_guard) = self.locks.try_acquire(class) else {
            tracing::warn!(restaurant_id, "{} sync already in progress, skipping", kind);
            return Ok(SyncReport::coalesced(class, restaurant_id));
        };

        let collection = kind.private_collection(restaurant_id);
        let documents = self
            .store
            .get_collection(&collection, credential)
            .await
            .map_err(|source| SyncError::Source {
                collection: collection.clone(),
                source,
            })?;

        let now = (self.clock)();
        let mut report = SyncReport::new(class, restaurant_id);
        let mut private_ids = HashSet::new();

        for doc in &documents {
            // Ids of undecodable documents still count, so their public
            // copies survive the prune
            if let Some(id) = doc.id() {
                private_ids.insert(id.to_string());
            }

            let Some((id, fields)) = public_projection(kind, doc, restaurant_id, now) else {
                tracing::warn!(name = ?doc.name, "Skipping {} that could not be decoded", kind.singular());
                report.skipped += 1;
                continue;
            };

            match self.publish_one(kind, &id, &fields, credential).await {
                Ok(Upsert::Created) => report.created.push(id),
                Ok(Upsert::Updated) => report.updated.push(id),
                Ok(Upsert::AlreadyExists) => {
                    tracing::debug!(%id, "Public {} already exists", kind.singular());
                    report.conflicts.push(id);
                }
                Err(error) => {
                    tracing::error!(%id, %error, "Error syncing {}", kind.singular());
                    report.failures.push(ItemFailure { id, error });
                }
            }
        }

        if self.retention == Retention::Prune {
            self.prune_orphans(kind, restaurant_id, &private_ids, credential, &mut report)
                .await;
        }

        tracing::info!(
            restaurant_id,
            created = report.created.len(),
            updated = report.updated.len(),
            pruned = report.pruned.len(),
            failed = report.failures.len(),
            "Synced {} {} to public collection",
            documents.len(),
            kind
        );
        Ok(report)
    }

    /// Upserts one item into the public mirror: update when it exists,
    /// otherwise create it under the same id.
    pub async fn publish_one(
        &self,
        kind: CatalogKind,
        id: &str,
        fields: &Fields,
        credential: &Credential,
    ) -> Result<Upsert, StoreError> {
        let path = kind.public_document(id);

        match self.store.get_document(&path, credential).await {
            Ok(_) => {
                self.store
                    .update_document(&path, fields, credential)
                    .await?;
                tracing::debug!(%path, "Updated public document");
                Ok(Upsert::Updated)
            }
            Err(e) if e.is_not_found() => {
                match self
                    .store
                    .create_document(kind.public_collection(), fields, credential, Some(id))
                    .await
                {
                    Ok(_) => {
                        tracing::debug!(%path, "Created public document");
                        Ok(Upsert::Created)
                    }
                    Err(e) if e.is_already_exists() => Ok(Upsert::AlreadyExists),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes this restaurant's public items that are not in `keep`.
    async fn prune_orphans(
        &self,
        kind: CatalogKind,
        restaurant_id: &str,
        keep: &HashSet<String>,
        credential: &Credential,
        report: &mut SyncReport,
    ) {
        let collection = kind.public_collection();
        let documents = match self.store.get_collection(collection, credential).await {
            Ok(documents) => documents,
            Err(error) => {
                tracing::error!(%error, "Could not list {} for pruning", collection);
                report.failures.push(ItemFailure {
                    id: collection.to_string(),
                    error,
                });
                return;
            }
        };

        for record in documents.iter().filter_map(decode) {
            let Some(id) = record.id.as_deref() else {
                continue;
            };
            if record.get_str("restaurantId") != Some(restaurant_id) || keep.contains(id) {
                continue;
            }

            match self
                .store
                .delete_document(&kind.public_document(id), credential)
                .await
            {
                Ok(()) => {
                    tracing::debug!(%id, "Pruned orphaned public {}", kind.singular());
                    report.pruned.push(id.to_string());
                }
                Err(error) => {
                    tracing::error!(%id, %error, "Could not prune public {}", kind.singular());
                    report.failures.push(ItemFailure {
                        id: id.to_string(),
                        error,
                    });
                }
            }
        }
    }
}

fn class_for(kind: CatalogKind) -> SyncClass {
    match kind {
        CatalogKind::Categories => SyncClass::Categories,
        CatalogKind::Recipes => SyncClass::Recipes,
    }
}

/// Decodes a private document and builds its public field set.
fn public_projection(
    kind: CatalogKind,
    doc: &Document,
    restaurant_id: &str,
    now: DateTime<Utc>,
) -> Option<(String, Fields)> {
    let record = decode(doc)?;
    match kind {
        CatalogKind::Categories => {
            let category = Category::from_record(&record)?;
            let fields = category.public_fields(restaurant_id, now);
            Some((category.id, fields))
        }
        CatalogKind::Recipes => {
            let recipe = Recipe::from_record(&record)?;
            let fields = recipe.public_fields(restaurant_id, now);
            Some((recipe.id, fields))
        }
    }
}
