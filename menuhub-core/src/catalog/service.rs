use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::error::CatalogError;
use super::validate::{validate_name, validate_optional_image, validate_recipe};
use crate::codec::{decode, Document, Fields, Record, Value};
use crate::media::{ImageUpload, MediaHost, UploadedImage};
use crate::models::{CatalogKind, Category, CategoryChanges, NewCategory, Recipe, RecipeInput};
use crate::store::{Credential, DocumentStore, ErrorCode};
use crate::sync::{SyncEngine, SyncReport};

/// Whether a mutation reached the public mirror.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Publish {
    /// The sync ran. A coalesced report means another run was in flight.
    Synced(SyncReport),
    /// The sync failed; the public mirror catches up on the next run.
    Lagging { reason: String },
}

/// A catalog item whose image is no longer served by the media host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingImage {
    pub id: String,
    pub name: String,
    pub image_public_id: String,
}

/// A successful private write and how its publication went.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mutation<T> {
    pub value: T,
    pub publish: Publish,
}

/// Admin writes to a restaurant's private catalog.
///
/// Every successful write is followed by a sync of the affected kind. The
/// sync outcome is reported but never fails the mutation.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
    media: Arc<dyn MediaHost>,
    engine: SyncEngine,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>, media: Arc<dyn MediaHost>, engine: SyncEngine) -> Self {
        Self {
            store,
            media,
            engine,
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub async fn list_categories(
        &self,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Category>, CatalogError> {
        let records = self
            .list(CatalogKind::Categories, restaurant_id, credential)
            .await?;
        Ok(records.iter().filter_map(Category::from_record).collect())
    }

    pub async fn list_recipes(
        &self,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Recipe>, CatalogError> {
        let records = self
            .list(CatalogKind::Recipes, restaurant_id, credential)
            .await?;
        Ok(records.iter().filter_map(Recipe::from_record).collect())
    }

    pub async fn add_category(
        &self,
        restaurant_id: &str,
        credential: &Credential,
        new: NewCategory,
    ) -> Result<Mutation<Category>, CatalogError> {
        validate_name(&new.name)?;
        validate_optional_image(new.image.as_ref())?;
        let kind = CatalogKind::Categories;
        let record = self
            .create(kind, restaurant_id, credential, new.private_fields(), new.image)
            .await?;
        let category = Category::from_record(&record).ok_or(CatalogError::MissingId("category"))?;

        let publish = self.publish(kind, restaurant_id, credential).await;
        Ok(Mutation {
            value: category,
            publish,
        })
    }

    pub async fn update_category(
        &self,
        restaurant_id: &str,
        credential: &Credential,
        id: &str,
        changes: CategoryChanges,
    ) -> Result<Mutation<Category>, CatalogError> {
        validate_name(&changes.name)?;
        validate_optional_image(changes.image.as_ref())?;
        let kind = CatalogKind::Categories;
        let record = self
            .update(kind, restaurant_id, credential, id, changes.private_fields(), changes.image)
            .await?;
        let category = Category::from_record(&record).ok_or(CatalogError::MissingId("category"))?;

        let publish = self.publish(kind, restaurant_id, credential).await;
        Ok(Mutation {
            value: category,
            publish,
        })
    }

    /// Deletes a category. Its recipes are left in place.
    pub async fn delete_category(
        &self,
        restaurant_id: &str,
        credential: &Credential,
        id: &str,
    ) -> Result<Mutation<String>, CatalogError> {
        self.delete(CatalogKind::Categories, restaurant_id, credential, id)
            .await
    }

    pub async fn add_recipe(
        &self,
        restaurant_id: &str,
        credential: &Credential,
        new: RecipeInput,
    ) -> Result<Mutation<Recipe>, CatalogError> {
        validate_recipe(&new)?;
        let kind = CatalogKind::Recipes;
        let record = self
            .create(kind, restaurant_id, credential, new.private_fields(), new.image)
            .await?;
        let recipe = Recipe::from_record(&record).ok_or(CatalogError::MissingId("recipe"))?;

        let publish = self.publish(kind, restaurant_id, credential).await;
        Ok(Mutation {
            value: recipe,
            publish,
        })
    }

    pub async fn update_recipe(
        &self,
        restaurant_id: &str,
        credential: &Credential,
        id: &str,
        changes: RecipeInput,
    ) -> Result<Mutation<Recipe>, CatalogError> {
        validate_recipe(&changes)?;
        let kind = CatalogKind::Recipes;
        let record = self
            .update(kind, restaurant_id, credential, id, changes.private_fields(), changes.image)
            .await?;
        let recipe = Recipe::from_record(&record).ok_or(CatalogError::MissingId("recipe"))?;

        let publish = self.publish(kind, restaurant_id, credential).await;
        Ok(Mutation {
            value: recipe,
            publish,
        })
    }

    pub async fn delete_recipe(
        &self,
        restaurant_id: &str,
        credential: &Credential,
        id: &str,
    ) -> Result<Mutation<String>, CatalogError> {
        self.delete(CatalogKind::Recipes, restaurant_id, credential, id)
            .await
    }

    /// Items of `kind` whose image the media host no longer has.
    pub async fn missing_images(
        &self,
        kind: CatalogKind,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<Vec<MissingImage>, CatalogError> {
        let records = self.list(kind, restaurant_id, credential).await?;
        let mut missing = Vec::new();
        for record in &records {
            let public_id = record.str_or_empty("imagePublicId");
            if public_id.is_empty() || self.media.exists(&public_id).await {
                continue;
            }
            missing.push(MissingImage {
                id: record.id.clone().unwrap_or_default(),
                name: record.str_or_empty("name"),
                image_public_id: public_id,
            });
        }
        if !missing.is_empty() {
            tracing::warn!(restaurant_id, count = missing.len(), "Found {} with missing images", kind);
        }
        Ok(missing)
    }

    async fn list(
        &self,
        kind: CatalogKind,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Record>, CatalogError> {
        let documents = self
            .store
            .get_collection(&kind.private_collection(restaurant_id), credential)
            .await?;
        Ok(documents.iter().filter_map(decode).collect())
    }

    async fn create(
        &self,
        kind: CatalogKind,
        restaurant_id: &str,
        credential: &Credential,
        mut fields: Fields,
        image: Option<ImageUpload>,
    ) -> Result<Record, CatalogError> {
        let uploaded = self.upload(image).await?;
        let (url, public_id) = uploaded
            .as_ref()
            .map(|image| (image.url.clone(), image.public_id.clone()))
            .unwrap_or_default();
        fields.insert("imageUrl".to_string(), Value::String(url));
        fields.insert("imagePublicId".to_string(), Value::String(public_id));
        fields.insert("createdAt".to_string(), Value::timestamp(Utc::now()));

        let created = self
            .store
            .create_document(&kind.private_collection(restaurant_id), &fields, credential, None)
            .await;

        match created {
            Ok(doc) => {
                tracing::debug!(name = ?doc.name, "Created {}", kind.singular());
                record_of(&doc, kind)
            }
            Err(e) => {
                self.discard(uploaded).await;
                Err(e.into())
            }
        }
    }

    async fn update(
        &self,
        kind: CatalogKind,
        restaurant_id: &str,
        credential: &Credential,
        id: &str,
        mut fields: Fields,
        image: Option<ImageUpload>,
    ) -> Result<Record, CatalogError> {
        let path = kind.private_document(restaurant_id, id);
        let current = self.current(kind, &path, id, credential).await?;
        let old_public_id = current.str_or_empty("imagePublicId");

        let uploaded = self.upload(image).await?;
        if let Some(image) = &uploaded {
            fields.insert("imageUrl".to_string(), Value::string(&image.url));
            fields.insert("imagePublicId".to_string(), Value::string(&image.public_id));
        }
        fields.insert("updatedAt".to_string(), Value::timestamp(Utc::now()));

        let doc = match self.store.update_document(&path, &fields, credential).await {
            Ok(doc) => doc,
            Err(e) => {
                self.discard(uploaded).await;
                return Err(e.into());
            }
        };

        // The old image goes only once nothing references it
        if let Some(image) = &uploaded {
            if !old_public_id.is_empty() && old_public_id != image.public_id {
                self.media.delete(&old_public_id).await;
            }
        }

        record_of(&doc, kind)
    }

    async fn delete(
        &self,
        kind: CatalogKind,
        restaurant_id: &str,
        credential: &Credential,
        id: &str,
    ) -> Result<Mutation<String>, CatalogError> {
        let path = kind.private_document(restaurant_id, id);
        let current = self.current(kind, &path, id, credential).await?;

        self.store.delete_document(&path, credential).await?;
        tracing::debug!(%path, "Deleted {}", kind.singular());

        let public_id = current.str_or_empty("imagePublicId");
        if !public_id.is_empty() {
            self.media.delete(&public_id).await;
        }

        let publish = self.publish(kind, restaurant_id, credential).await;
        Ok(Mutation {
            value: id.to_string(),
            publish,
        })
    }

    /// Reads the current private document.
    async fn current(
        &self,
        kind: CatalogKind,
        path: &str,
        id: &str,
        credential: &Credential,
    ) -> Result<Record, CatalogError> {
        let doc = self
            .store
            .get_document(path, credential)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CatalogError::NotFound {
                        kind: kind.singular(),
                        id: id.to_string(),
                    }
                } else {
                    e.into()
                }
            })?;
        Ok(decode(&doc).unwrap_or_else(|| Record::new(id, Fields::new())))
    }

    async fn upload(&self, image: Option<ImageUpload>) -> Result<Option<UploadedImage>, CatalogError> {
        match image {
            Some(image) => Ok(Some(self.media.upload(image).await?)),
            None => Ok(None),
        }
    }

    /// Removes an image uploaded for a write that then failed.
    async fn discard(&self, uploaded: Option<UploadedImage>) {
        if let Some(image) = uploaded {
            self.media.delete(&image.public_id).await;
        }
    }

    async fn publish(&self, kind: CatalogKind, restaurant_id: &str, credential: &Credential) -> Publish {
        match self.engine.sync_kind(kind, restaurant_id, credential).await {
            Ok(report) => Publish::Synced(report),
            Err(e) => {
                if e.code() == ErrorCode::AlreadyExists {
                    tracing::warn!(
                        restaurant_id,
                        "{} already exists in public collection, skipping sync",
                        kind.singular()
                    );
                } else {
                    tracing::warn!(
                        restaurant_id,
                        error = %e,
                        "Failed to sync {} to public collection",
                        kind
                    );
                }
                Publish::Lagging {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn record_of(doc: &Document, kind: CatalogKind) -> Result<Record, CatalogError> {
    decode(doc)
        .filter(|record| record.id.is_some())
        .ok_or(CatalogError::MissingId(kind.singular()))
}
